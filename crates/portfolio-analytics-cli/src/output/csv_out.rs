use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// Frontier results become one row per sample; risk results one row per
/// asset; anything else a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(samples) = result.get("samples").and_then(Value::as_array) {
        write_samples_csv(&mut wtr, result, samples);
    } else if let Some(metrics) = result.get("metrics").and_then(Value::as_array) {
        write_record_csv(&mut wtr, metrics);
    } else if let Value::Object(map) = result {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in map {
            let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
        }
    } else {
        let _ = wtr.write_record([&format_csv_value(result)]);
    }

    let _ = wtr.flush();
}

fn write_samples_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, result: &Value, samples: &[Value]) {
    let asset_names: Vec<String> = result
        .get("asset_names")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .map(|n| n.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut headers = vec![
        "expected_return".to_string(),
        "volatility".to_string(),
        "sharpe_ratio".to_string(),
    ];
    headers.extend(asset_names.iter().map(|n| format!("weight_{n}")));
    let _ = wtr.write_record(&headers);

    for sample in samples {
        let mut row = vec![
            format_csv_value(sample.get("expected_return").unwrap_or(&Value::Null)),
            format_csv_value(sample.get("volatility").unwrap_or(&Value::Null)),
            format_csv_value(sample.get("sharpe_ratio").unwrap_or(&Value::Null)),
        ];
        if let Some(weights) = sample.get("weights").and_then(Value::as_array) {
            row.extend(weights.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&row);
    }
}

fn write_record_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, records: &[Value]) {
    let Some(Value::Object(first)) = records.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for record in records {
        if let Value::Object(map) = record {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

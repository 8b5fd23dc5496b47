use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// The result envelope's scalar fields go into a field/value table;
/// per-asset record arrays and matrices get tables of their own. The raw
/// Monte Carlo sample set is summarized rather than printed (use the
/// json output for the full set).
pub fn print_table(value: &Value) {
    let Some(envelope) = value.as_object() else {
        println!("{}", value);
        return;
    };
    let Some(result) = envelope.get("result").and_then(Value::as_object) else {
        print_flat_object(value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in result {
        match val {
            Value::Array(arr) if key == "samples" => {
                builder.push_record([key.as_str(), &format!("{} portfolios sampled", arr.len())]);
            }
            Value::Array(_) if is_matrix(val) || is_record_array(val) => {
                // Rendered separately below.
            }
            Value::Object(map) => {
                for (inner_key, inner_val) in map {
                    builder.push_record([
                        format!("{key}.{inner_key}").as_str(),
                        &format_value(inner_val),
                    ]);
                }
            }
            _ => builder.push_record([key.as_str(), &format_value(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (key, val) in result {
        if key == "samples" {
            continue;
        }
        if is_record_array(val) {
            println!("\n{}:", key);
            print_record_table(val.as_array().unwrap());
        } else if is_matrix(val) {
            println!("\n{}:", key);
            print_matrix(val.as_array().unwrap());
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}

fn is_matrix(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|arr| !arr.is_empty() && arr.iter().all(|row| row.is_array()))
}

fn is_record_array(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|arr| !arr.is_empty() && arr.iter().all(|item| item.is_object()))
}

fn print_record_table(records: &[Value]) {
    let Some(Value::Object(first)) = records.first() else {
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for record in records {
        if let Value::Object(map) = record {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_matrix(rows: &[Value]) {
    let mut builder = Builder::default();
    for row in rows {
        if let Value::Array(cells) = row {
            builder.push_record(cells.iter().map(format_value));
        }
    }
    println!("{}", Table::from(builder));
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

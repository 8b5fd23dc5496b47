use serde_json::Value;

/// Print just the key answer value from the output.
///
/// For a frontier result that is the optimal portfolio's Sharpe ratio;
/// otherwise the first well-known scalar found in the result object.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Frontier output: report the max-Sharpe portfolio.
    if let Some(optimal) = result.get("optimal") {
        if let Some(sharpe) = optimal.get("sharpe_ratio") {
            println!("{}", format_minimal(sharpe));
            return;
        }
    }

    let priority_keys = [
        "sharpe_ratio",
        "annualized_volatility",
        "annualized_return",
        "periods_per_year",
        "observations",
    ];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

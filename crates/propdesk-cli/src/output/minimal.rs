use serde_json::Value;

use super::format_scalar;

/// Fields printed by `--output minimal`, most important first.
const PRIORITY_KEYS: [&str; 8] = [
    "monthly_payment",
    "payment",
    "balance",
    "occupancy_rate_pct",
    "net_cash_flow",
    "total_interest",
    "total_monthly_outlay",
    "updated",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val));
            return;
        }
    }

    println!("{}", format_scalar(result_obj));
}

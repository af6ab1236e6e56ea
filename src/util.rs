use std::env;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

pub(crate) fn env_required(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    let value = env::var(name).unwrap_or_default();
    if value.trim().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("Missing {name}")).into());
    }
    Ok(value)
}

pub(crate) fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn env_u64(name: &str, default: u64) -> Result<u64, Box<dyn std::error::Error>> {
    match env_optional(name) {
        Some(value) => Ok(value
            .parse::<u64>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid {name}")))?),
        None => Ok(default),
    }
}

pub(crate) fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Numeric telemetry sometimes arrives as a JSON string ("14.0"); accept both.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Render a JSON value for user-facing message text: strings without quotes,
/// everything else in its JSON form.
pub(crate) fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_as_f64_accepts_numbers_and_strings() {
        assert_eq!(value_as_f64(&json!(14)), Some(14.0));
        assert_eq!(value_as_f64(&json!(14.5)), Some(14.5));
        assert_eq!(value_as_f64(&json!("14.0")), Some(14.0));
        assert_eq!(value_as_f64(&json!(" 3 ")), Some(3.0));
        assert_eq!(value_as_f64(&json!("n/a")), None);
        assert_eq!(value_as_f64(&json!(null)), None);
        assert_eq!(value_as_f64(&json!([1, 2])), None);
    }

    #[test]
    fn test_plain_text_unquotes_strings() {
        assert_eq!(plain_text(&json!("low")), "low");
        assert_eq!(plain_text(&json!(3)), "3");
        assert_eq!(plain_text(&json!({"a": 1})), "{\"a\":1}");
    }
}

use chrono::{Local, TimeZone};
use serde_json::Value;

/// Best-effort decode of values that are themselves JSON encoded as a string.
/// Strings are strict-parsed; the parsed structure replaces them on success
/// and a malformed JSON-looking string is preserved verbatim. Non-strings
/// pass through unchanged. Never fails.
pub(crate) fn clean(value: Value) -> Value {
    match value {
        Value::String(text) => match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(text),
        },
        other => other,
    }
}

/// Epoch milliseconds to local time as `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn format_timestamp(epoch_ms: i64) -> String {
    match Local.timestamp_millis_opt(epoch_ms).earliest() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => epoch_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use serde_json::json;

    // ── clean ───────────────────────────────────────────────────────

    #[test]
    fn test_clean_parses_json_strings() {
        let cleaned = clean(json!("{\"cameras\": [\"cam1\", \"cam2\"], \"online\": 2}"));
        assert_eq!(cleaned, json!({"cameras": ["cam1", "cam2"], "online": 2}));

        assert_eq!(clean(json!("[1, 2, 3]")), json!([1, 2, 3]));
        assert_eq!(clean(json!("42")), json!(42));
        assert_eq!(clean(json!("true")), json!(true));
        assert_eq!(clean(json!("\"quoted\"")), json!("quoted"));
    }

    #[test]
    fn test_clean_keeps_plain_strings() {
        assert_eq!(clean(json!("hello world")), json!("hello world"));
        assert_eq!(clean(json!("{not json")), json!("{not json"));
        assert_eq!(clean(json!("")), json!(""));
    }

    #[test]
    fn test_clean_passes_non_strings_through() {
        assert_eq!(clean(json!(7)), json!(7));
        assert_eq!(clean(json!(2.5)), json!(2.5));
        assert_eq!(clean(json!(null)), json!(null));
        assert_eq!(clean(json!({"a": 1})), json!({"a": 1}));
        assert_eq!(clean(json!([1, "2"])), json!([1, "2"]));
    }

    // ── format_timestamp ────────────────────────────────────────────

    #[test]
    fn test_format_timestamp_shape() {
        let formatted = format_timestamp(1_700_000_000_000);
        assert_eq!(formatted.len(), 19);
        assert!(NaiveDateTime::parse_from_str(&formatted, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn test_format_timestamp_deterministic() {
        let ts = 1_700_000_000_123;
        assert_eq!(format_timestamp(ts), format_timestamp(ts));
    }

    #[test]
    fn test_format_timestamp_second_resolution() {
        // Sub-second precision is dropped, not rounded into view.
        assert_eq!(format_timestamp(1_700_000_000_000), format_timestamp(1_700_000_000_999));
    }
}

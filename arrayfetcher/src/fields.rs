//! Tolerant field access over raw vendor records.
//!
//! The management API serializes most scalars as strings, and older firmware
//! omits fields freely. Every accessor takes a per-field default instead of
//! failing on a shape mismatch.

use serde_json::Value;

/// String field with a default for missing or non-string values.
pub fn str_field(record: &Value, key: &str, default: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Integer field tolerant of string-encoded numbers.
pub fn int_field(record: &Value, key: &str, default: i64) -> i64 {
    record
        .get(key)
        .and_then(as_i64)
        .unwrap_or(default)
}

/// Raw value passed through to the sink unchanged, defaulting when absent.
pub fn raw_field(record: &Value, key: &str, default: Value) -> Value {
    record.get(key).cloned().unwrap_or(default)
}

/// Identifier field in string form; numeric ids are stringified, anything
/// else becomes the empty string.
pub fn id_field(record: &Value, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Lenient integer coercion: numbers as-is, strings parsed.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_str_field_defaults() {
        let record = json!({"NAME": "pool0", "ID": 7});
        assert_eq!(str_field(&record, "NAME", "-"), "pool0");
        assert_eq!(str_field(&record, "MISSING", "-"), "-");
        // Non-string values fall back to the default too.
        assert_eq!(str_field(&record, "ID", "-"), "-");
    }

    #[test]
    fn test_int_field_parses_strings() {
        let record = json!({"SECTORSIZE": "512", "MEMORYSIZE": 4096, "BAD": "x"});
        assert_eq!(int_field(&record, "SECTORSIZE", 0), 512);
        assert_eq!(int_field(&record, "MEMORYSIZE", 0), 4096);
        assert_eq!(int_field(&record, "BAD", 9), 9);
        assert_eq!(int_field(&record, "MISSING", 512), 512);
    }

    #[test]
    fn test_raw_field_passes_value_through() {
        let record = json!({"ISADD2HOSTGROUP": "true"});
        assert_eq!(
            raw_field(&record, "ISADD2HOSTGROUP", json!(0)),
            json!("true")
        );
        assert_eq!(raw_field(&record, "MISSING", json!(0)), json!(0));
    }

    #[test]
    fn test_id_field_stringifies_numbers() {
        let record = json!({"ID": 7, "NAME": "ctrl0A"});
        assert_eq!(id_field(&record, "ID"), "7");
        assert_eq!(id_field(&record, "NAME"), "ctrl0A");
        assert_eq!(id_field(&record, "MISSING"), "");
    }

    #[test]
    fn test_as_i64_trims_whitespace() {
        assert_eq!(as_i64(&json!(" 42 ")), Some(42));
        assert_eq!(as_i64(&json!(42.9)), Some(42));
        assert_eq!(as_i64(&json!(true)), None);
    }
}

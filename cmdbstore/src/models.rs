//! Response envelope and record identity types.

use serde_json::Value;

/// Uniform response envelope: `{code, data, message}`.
///
/// A missing `code` counts as -1 (failed), matching the sink's behavior of
/// omitting the field on some error paths; the field itself arrives as a
/// number or a numeric string depending on the gateway.
#[derive(Debug)]
pub struct Envelope {
    pub code: i64,
    pub data: Value,
    pub message: Option<String>,
}

impl Envelope {
    pub fn from_value(value: Value) -> Self {
        let code = value.get("code").and_then(coerce_i64).unwrap_or(-1);
        let data = value.get("data").cloned().unwrap_or(Value::Null);
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(String::from);
        Self {
            code,
            data,
            message,
        }
    }
}

/// Identity triple of a sink record, as `_search` returns it.
#[derive(Debug, Clone)]
pub struct InstanceRef {
    pub name: String,
    pub instance_id: String,
    pub object_id: String,
}

impl InstanceRef {
    /// `None` when any of the three identity fields is missing; such
    /// records cannot be addressed and are skipped by cleanup.
    pub fn from_record(record: &Value) -> Option<Self> {
        Some(Self {
            name: record.get("name")?.as_str()?.to_string(),
            instance_id: instance_id_of(record)?,
            object_id: record.get("_object_id")?.as_str()?.to_string(),
        })
    }
}

/// Instance id in URL form; the sink serializes it as string or number.
pub fn instance_id_of(record: &Value) -> Option<String> {
    match record.get("instanceId")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_missing_code_counts_as_failed() {
        let envelope = Envelope::from_value(json!({"data": {"list": []}}));
        assert_eq!(envelope.code, -1);
    }

    #[test]
    fn test_envelope_string_code_is_coerced() {
        let envelope = Envelope::from_value(json!({"code": "0", "data": []}));
        assert_eq!(envelope.code, 0);
        let envelope = Envelope::from_value(json!({"code": 13, "message": "denied"}));
        assert_eq!(envelope.code, 13);
        assert_eq!(envelope.message.as_deref(), Some("denied"));
    }

    #[test]
    fn test_instance_ref_requires_all_identity_fields() {
        let full = json!({"name": "a_1", "instanceId": "i-1", "_object_id": "LUN"});
        assert!(InstanceRef::from_record(&full).is_some());

        let missing_object = json!({"name": "a_1", "instanceId": "i-1"});
        assert!(InstanceRef::from_record(&missing_object).is_none());
    }

    #[test]
    fn test_numeric_instance_id_becomes_url_form() {
        let record = json!({"instanceId": 42});
        assert_eq!(instance_id_of(&record).as_deref(), Some("42"));
    }
}

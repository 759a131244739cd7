use std::collections::BTreeMap;

use {
    serde::{Deserialize, Serialize, Serializer},
    serde_yaml::Value,
};

use crate::timestamp::Timestamp;

/// One control change in structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredControl {
    pub controller: i32,
    pub value: i32,
    /// Symbol-table topic for `controller`. Annotation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// The human-readable rendering of a message.
///
/// `meaning`, `channel_label` and each control's `topic` are looked up from the
/// symbol table when converting and ignored when converting back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub sender: String,
    pub recipient: String,
    pub timestamp: Timestamp,
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
    pub channel: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_label: Option<String>,
    pub intensity: i32,
    #[serde(default)]
    pub controls: Vec<StructuredControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_readable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Unrecognised symbolic keys, nested rather than flattened so they can't
    /// collide with structured field names. Map keys that are not strings
    /// are written as their YAML text.
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        serialize_with = "serialize_extra"
    )]
    pub extra: BTreeMap<String, Value>,
}

fn serialize_extra<S: Serializer>(
    extra: &BTreeMap<String, Value>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(extra.iter().map(|(k, v)| (k, to_json(v))))
}

/// JSON rendering of a YAML value. JSON objects only take string keys, so
/// other keys are stringified.
fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(u) = n.as_u64() {
                u.into()
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
        },
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Sequence(items) => items.iter().map(to_json).collect(),
        Value::Mapping(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (key_text(k), to_json(v))).collect(),
        ),
        Value::Tagged(tagged) => to_json(&tagged.value),
    }
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".into(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// Free-form conversational context attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl Context {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intent.is_none() && self.tone.is_none() && self.topic.is_none()
    }
}

/// A message in symbolic notation, as agents write it into their outbox:
///
/// ```yaml
/// message_id: kai_0001
/// from: Kai
/// to: Claude
/// timestamp: 2025-06-01T12:30:00Z
/// note: 62
/// channel: 1
/// velocity: 110
/// cc: [[1, 64]]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub from: String,
    pub to: String,
    pub timestamp: Timestamp,
    /// Note code, looked up in the symbol table's `notes`.
    pub note: i32,
    pub channel: i32,
    /// Intensity of the note.
    pub velocity: i32,
    /// Control changes as `[controller, value]` pairs, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<(i32, i32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Context::is_empty")]
    pub context: Context,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_readable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Keys this version does not know about, carried through untouched.
    /// Values are arbitrary YAML, including maps with non-string keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl SymbolicMessage {
    /// A bare message with only the required fields set.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        timestamp: Timestamp,
        note: i32,
        channel: i32,
        velocity: i32,
    ) -> Self {
        Self {
            message_id: None,
            from: from.into(),
            to: to.into(),
            timestamp,
            note,
            channel,
            velocity,
            cc: Vec::new(),
            group_id: None,
            context: Context::default(),
            human_readable: None,
            reply_to: None,
            extra: BTreeMap::new(),
        }
    }
}

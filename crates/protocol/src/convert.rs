//! Field-for-field mapping between symbolic and structured messages.
//!
//! `to_symbolic(&to_structured(m, table)) == m` for every message `m`; the
//! annotations added by [`to_structured`] are derived from the table and
//! dropped again on the way back.

use midex_config::SymbolTable;

use crate::{
    message::{Context, SymbolicMessage},
    structured::{StructuredControl, StructuredMessage},
};

#[must_use]
pub fn to_structured(msg: &SymbolicMessage, symbols: &SymbolTable) -> StructuredMessage {
    StructuredMessage {
        message_id: msg.message_id.clone(),
        sender: msg.from.clone(),
        recipient: msg.to.clone(),
        timestamp: msg.timestamp,
        code: msg.note,
        meaning: symbols.note_name(msg.note).map(str::to_string),
        channel: msg.channel,
        channel_label: symbols.channel_label(msg.channel).map(str::to_string),
        intensity: msg.velocity,
        controls: msg
            .cc
            .iter()
            .map(|&(controller, value)| StructuredControl {
                controller,
                value,
                topic: symbols.cc_topic(controller).map(str::to_string),
            })
            .collect(),
        group_id: msg.group_id.clone(),
        intent: msg.context.intent.clone(),
        tone: msg.context.tone.clone(),
        topic: msg.context.topic.clone(),
        human_readable: msg.human_readable.clone(),
        reply_to: msg.reply_to.clone(),
        extra: msg.extra.clone(),
    }
}

#[must_use]
pub fn to_symbolic(msg: &StructuredMessage) -> SymbolicMessage {
    SymbolicMessage {
        message_id: msg.message_id.clone(),
        from: msg.sender.clone(),
        to: msg.recipient.clone(),
        timestamp: msg.timestamp,
        note: msg.code,
        channel: msg.channel,
        velocity: msg.intensity,
        cc: msg.controls.iter().map(|c| (c.controller, c.value)).collect(),
        group_id: msg.group_id.clone(),
        context: Context {
            intent: msg.intent.clone(),
            tone: msg.tone.clone(),
            topic: msg.topic.clone(),
        },
        human_readable: msg.human_readable.clone(),
        reply_to: msg.reply_to.clone(),
        extra: msg.extra.clone(),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::Timestamp, midex_config::Bounds};

    fn table() -> SymbolTable {
        let mut t = SymbolTable::with_notes([(60, "intent"), (64, "question")], Bounds::default());
        t.channels.insert(2, "Claude".into());
        t.cc.insert(1, "topic_ethics".into());
        t
    }

    fn full_message() -> SymbolicMessage {
        let mut m = SymbolicMessage::new(
            "Claude",
            "Kai",
            "2025-06-01T14:30:00.250+02:00".parse().unwrap(),
            64,
            2,
            100,
        );
        m.message_id = Some("claude_0007".into());
        m.cc = vec![(1, 64), (9, 3)];
        m.group_id = Some("UMP_GROUP_001".into());
        m.context.intent = Some("inquiry".into());
        m.context.topic = Some("ethics".into());
        m.human_readable = Some("What do you think?".into());
        m.reply_to = Some("kai_0006".into());
        m.extra.insert(
            "weights".into(),
            serde_yaml::from_str("1: 0.5\n2: 0.25\n").unwrap(),
        );
        m
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let m = full_message();
        let back = to_symbolic(&to_structured(&m, &table()));
        assert_eq!(back, m);
        assert_eq!(back.timestamp.encode(), m.timestamp.encode());
    }

    #[test]
    fn round_trip_minimal_message() {
        let m = SymbolicMessage::new("Kai", "Grok", Timestamp::now(), 61, 0, 0);
        assert_eq!(to_symbolic(&to_structured(&m, &SymbolTable::default())), m);
    }

    #[test]
    fn structured_form_is_annotated() {
        let s = to_structured(&full_message(), &table());
        assert_eq!(s.meaning.as_deref(), Some("question"));
        assert_eq!(s.channel_label.as_deref(), Some("Claude"));
        assert_eq!(s.controls[0].topic.as_deref(), Some("topic_ethics"));
        assert_eq!(s.controls[1].topic, None);
        assert_eq!(s.intent.as_deref(), Some("inquiry"));
        assert_eq!(s.tone, None);
    }

    #[test]
    fn annotations_do_not_leak_back() {
        let mut s = to_structured(&full_message(), &table());
        s.meaning = Some("something else".into());
        s.controls[0].topic = Some("edited".into());
        assert_eq!(to_symbolic(&s), full_message());
    }
}

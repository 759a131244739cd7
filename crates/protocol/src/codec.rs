//! Text encodings for the two message forms.
//!
//! Symbolic messages are YAML documents, structured messages are pretty JSON.
//! Decoding failures of either kind surface as [`Error::MalformedRecord`].

use std::path::Path;

use crate::{
    error::{Error, Result},
    message::SymbolicMessage,
    structured::StructuredMessage,
};

/// Which encoding a file holds, judged by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.yaml` / `.yml`
    Symbolic,
    /// `.json`
    Structured,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Symbolic),
            Some("json") => Ok(Self::Structured),
            other => Err(Error::UnsupportedFormat {
                ext: other.unwrap_or_default().to_string(),
            }),
        }
    }

    /// Extension written for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Symbolic => "yaml",
            Self::Structured => "json",
        }
    }

    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Symbolic => Self::Structured,
            Self::Structured => Self::Symbolic,
        }
    }
}

pub fn decode_symbolic(raw: &str) -> Result<SymbolicMessage> {
    if raw.trim().is_empty() {
        return Err(Error::malformed("empty document"));
    }
    serde_yaml::from_str(raw).map_err(Error::malformed)
}

pub fn encode_symbolic(msg: &SymbolicMessage) -> Result<String> {
    serde_yaml::to_string(msg).map_err(|e| Error::Encode {
        message: e.to_string(),
    })
}

pub fn decode_structured(raw: &str) -> Result<StructuredMessage> {
    serde_json::from_str(raw).map_err(Error::malformed)
}

pub fn encode_structured(msg: &StructuredMessage) -> Result<String> {
    let mut text = serde_json::to_string_pretty(msg).map_err(|e| Error::Encode {
        message: e.to_string(),
    })?;
    text.push('\n');
    Ok(text)
}

/// Read and decode a symbolic message file.
pub fn read_symbolic(path: &Path) -> Result<SymbolicMessage> {
    decode_symbolic(&read(path)?).map_err(|e| with_path(e, path))
}

/// Read and decode a structured message file.
pub fn read_structured(path: &Path) -> Result<StructuredMessage> {
    decode_structured(&read(path)?).map_err(|e| with_path(e, path))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| midex_common::Error::io(path, e).into())
}

fn with_path(err: Error, path: &Path) -> Error {
    match err {
        Error::MalformedRecord { reason } => Error::MalformedRecord {
            reason: format!("{}: {reason}", path.display()),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    const SAMPLE: &str = "\
message_id: kai_0001
from: Kai
to: Claude
timestamp: 2025-06-01T12:30:00Z
note: 62
channel: 1
velocity: 110
cc:
  - [1, 64]
  - [3, 10]
context:
  intent: reflection
mood: curious
";

    #[test]
    fn decodes_symbolic_document() {
        let m = decode_symbolic(SAMPLE).unwrap();
        assert_eq!(m.from, "Kai");
        assert_eq!(m.note, 62);
        assert_eq!(m.cc, vec![(1, 64), (3, 10)]);
        assert_eq!(m.context.intent.as_deref(), Some("reflection"));
        assert_eq!(m.timestamp.encode(), "2025-06-01T12:30:00Z");
        assert_eq!(m.extra["mood"].as_str(), Some("curious"));
    }

    #[test]
    fn symbolic_text_round_trip() {
        let raw = SAMPLE.replace("12:30:00Z", "14:30:00.250+02:00");
        let m = decode_symbolic(&raw).unwrap();
        let text = encode_symbolic(&m).unwrap();
        let again = decode_symbolic(&text).unwrap();
        assert_eq!(again, m);
        assert_eq!(again.timestamp.encode(), "2025-06-01T14:30:00.250+02:00");
        assert_eq!(encode_symbolic(&again).unwrap(), text);
    }

    #[test]
    fn unknown_keys_may_hold_integer_keyed_maps() {
        let raw = format!("{SAMPLE}weights:\n  1: 0.5\n  2: 0.25\n");
        let m = decode_symbolic(&raw).unwrap();
        assert_eq!(m.note, 62);
        let weights = m.extra["weights"].as_mapping().unwrap();
        let one = serde_yaml::Value::Number(1.into());
        assert_eq!(weights.get(&one).and_then(serde_yaml::Value::as_f64), Some(0.5));

        let s = crate::to_structured(&m, &midex_config::SymbolTable::seed());
        let json = encode_structured(&s).unwrap();
        assert!(json.contains("\"1\": 0.5"));
        assert_eq!(crate::to_symbolic(&s), m);
    }

    #[test]
    fn structured_text_round_trip() {
        let m = decode_symbolic(SAMPLE).unwrap();
        let s = crate::to_structured(&m, &midex_config::SymbolTable::seed());
        let text = encode_structured(&s).unwrap();
        assert!(text.contains("\"intensity\": 110"));
        assert!(text.contains("\"meaning\": \"reflection\""));
        let back = decode_structured(&text).unwrap();
        assert_eq!(back, s);
        assert_eq!(back.timestamp.encode(), s.timestamp.encode());
    }

    #[rstest]
    #[case::missing_note("from: Kai\nto: Claude\ntimestamp: 2025-06-01T12:30:00Z\nchannel: 1\nvelocity: 1\n")]
    #[case::cc_not_pairs("from: Kai\nto: Claude\ntimestamp: 2025-06-01T12:30:00Z\nnote: 60\nchannel: 1\nvelocity: 1\ncc: [1, 2, 3]\n")]
    #[case::cc_triple("from: Kai\nto: Claude\ntimestamp: 2025-06-01T12:30:00Z\nnote: 60\nchannel: 1\nvelocity: 1\ncc: [[1, 2, 3]]\n")]
    #[case::naive_timestamp("from: Kai\nto: Claude\ntimestamp: 2025-06-01T12:30:00\nnote: 60\nchannel: 1\nvelocity: 1\n")]
    #[case::not_a_map("- 1\n- 2\n")]
    #[case::empty("  \n")]
    fn rejects_malformed_symbolic(#[case] raw: &str) {
        let err = decode_symbolic(raw).unwrap_err();
        assert!(err.is_malformed(), "{err}");
    }

    #[test]
    fn rejects_structured_controls_of_wrong_shape() {
        let raw = r#"{"sender":"Kai","recipient":"Claude","timestamp":"2025-06-01T12:30:00Z",
            "code":60,"channel":1,"intensity":5,"controls":[5, 6]}"#;
        assert!(decode_structured(raw).unwrap_err().is_malformed());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a.yml")).unwrap(), Format::Symbolic);
        assert_eq!(Format::from_path(Path::new("a.json")).unwrap(), Format::Structured);
        assert!(Format::from_path(Path::new("a.txt")).is_err());
        assert_eq!(Format::Symbolic.other().extension(), "json");
    }

    #[test]
    fn read_reports_path_in_malformed_reason() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "from: Kai\n").unwrap();
        let err = read_symbolic(&path).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }
}

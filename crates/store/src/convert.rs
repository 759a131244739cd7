use std::path::{Path, PathBuf};

use {
    midex_config::SymbolTable,
    midex_protocol::{Format, codec, to_structured, to_symbolic},
    tracing::info,
};

use crate::{
    error::{Error, Result},
    relocate::free_name,
    write::write_atomic,
};

/// Convert one message file into the other encoding.
///
/// `.yaml`/`.yml` input becomes structured JSON, `.json` input becomes a
/// symbolic document. Without `output` the result lands next to the input
/// with the other extension, taking a `-N` suffix if that name is in use.
/// An explicit `output` that already exists is refused. Existing files are
/// never overwritten. Returns the written path.
pub fn convert_file(input: &Path, output: Option<&Path>, symbols: &SymbolTable) -> Result<PathBuf> {
    let from = Format::from_path(input)?;
    let output = match output {
        Some(path) if path.exists() => {
            return Err(Error::AlreadyExists {
                path: path.to_path_buf(),
            });
        },
        Some(path) => path.to_path_buf(),
        None => {
            let sibling = input.with_extension(from.other().extension());
            let dir = sibling.parent().unwrap_or_else(|| Path::new("."));
            let name = sibling
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::message(format!("not a file path: {}", input.display())))?;
            free_name(dir, name)?
        },
    };
    let text = match from {
        Format::Symbolic => {
            let msg = codec::read_symbolic(input)?;
            codec::encode_structured(&to_structured(&msg, symbols))?
        },
        Format::Structured => {
            let msg = codec::read_structured(input)?;
            codec::encode_symbolic(&to_symbolic(&msg))?
        },
    };
    write_atomic(&output, text.as_bytes())?;
    info!(from = %input.display(), to = %output.display(), "converted message");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        midex_protocol::{SymbolicMessage, Timestamp},
        std::fs,
    };

    fn sample() -> SymbolicMessage {
        let ts: Timestamp = "2025-06-01T12:30:00+02:00".parse().unwrap();
        let mut msg = SymbolicMessage::new("Kai", "Claude", ts, 60, 1, 95);
        msg.cc = vec![(1, 64)];
        msg.message_id = Some("kai_0001".into());
        msg
    }

    #[test]
    fn yaml_to_json_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let symbols = SymbolTable::seed();
        let input = dir.path().join("kai_0001.yaml");
        fs::write(&input, codec::encode_symbolic(&sample()).unwrap()).unwrap();

        let json = convert_file(&input, None, &symbols).unwrap();
        assert_eq!(json, dir.path().join("kai_0001.json"));
        let structured = codec::read_structured(&json).unwrap();
        assert_eq!(structured.sender, "Kai");
        assert_eq!(structured.code, 60);

        let back = dir.path().join("back.yaml");
        assert_eq!(convert_file(&json, Some(&back), &symbols).unwrap(), back);
        assert_eq!(codec::read_symbolic(&back).unwrap(), sample());
    }

    #[test]
    fn existing_sibling_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let symbols = SymbolTable::seed();
        let yaml = dir.path().join("kai_0001.yaml");
        let original = codec::encode_symbolic(&sample()).unwrap();
        fs::write(&yaml, &original).unwrap();

        let mut other = sample();
        other.note = 64;
        let json = dir.path().join("kai_0001.json");
        fs::write(
            &json,
            codec::encode_structured(&to_structured(&other, &symbols)).unwrap(),
        )
        .unwrap();

        let written = convert_file(&json, None, &symbols).unwrap();
        assert_eq!(written, dir.path().join("kai_0001-1.yaml"));
        assert_eq!(fs::read_to_string(&yaml).unwrap(), original);
        assert_eq!(codec::read_symbolic(&written).unwrap().note, 64);

        let err = convert_file(&json, Some(&yaml), &symbols).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(fs::read_to_string(&yaml).unwrap(), original);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("note.txt");
        fs::write(&input, "x").unwrap();
        assert!(convert_file(&input, None, &SymbolTable::seed()).is_err());
        assert!(!dir.path().join("note.json").exists());
    }

    #[test]
    fn malformed_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.yaml");
        fs::write(&input, "from: Kai\nnote: high\n").unwrap();
        let err = convert_file(&input, None, &SymbolTable::seed()).unwrap_err();
        assert!(matches!(err, Error::Protocol(ref e) if e.is_malformed()));
        assert!(!dir.path().join("bad.json").exists());
    }
}

use std::{collections::BTreeMap, path::Path};

use {
    chrono::{DateTime, Utc},
    serde_json::json,
};

use crate::{
    error::{Error, Result},
    layout::{MessageStore, list_messages},
};

/// Message count and newest modification time of one folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderStatus {
    pub count: usize,
    pub latest: Option<DateTime<Utc>>,
}

impl FolderStatus {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "count": self.count,
            "latest": self.latest.map(|t| t.to_rfc3339()),
        })
    }
}

/// Status of a single folder. Missing or empty folders report zero.
pub fn folder_status(dir: &Path) -> Result<FolderStatus> {
    let files = list_messages(dir)?;
    let mut latest: Option<DateTime<Utc>> = None;
    for file in &files {
        let modified = std::fs::metadata(file)
            .and_then(|m| m.modified())
            .map_err(|e| Error::io(file, e))?;
        let modified = DateTime::<Utc>::from(modified);
        latest = Some(latest.map_or(modified, |l| l.max(modified)));
    }
    Ok(FolderStatus {
        count: files.len(),
        latest,
    })
}

/// Status of every folder, keyed `inbox/<Agent>`, `outbox/<Agent>`, `archive/<Agent>`.
///
/// Read-only: never creates or touches anything in the store.
pub fn status(store: &MessageStore) -> Result<BTreeMap<String, FolderStatus>> {
    store
        .folders()?
        .into_iter()
        .map(|(folder, agent, path)| Ok((format!("{folder}/{agent}"), folder_status(&path)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use {super::*, std::fs};

    #[test]
    fn empty_folder_is_zero_without_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(folder_status(dir.path()).unwrap(), FolderStatus::default());
        assert_eq!(
            folder_status(&dir.path().join("missing")).unwrap(),
            FolderStatus {
                count: 0,
                latest: None
            }
        );
    }

    #[test]
    fn counts_messages_and_reports_newest() {
        let dir = tempfile::tempdir().unwrap();
        let base = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        for (i, name) in ["a.yaml", "b.yaml", "c.yml"].iter().enumerate() {
            let path = dir.path().join(name);
            fs::write(&path, "x").unwrap();
            let when = base + std::time::Duration::from_secs(60 * i as u64);
            fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(when)
                .unwrap();
        }
        fs::write(dir.path().join(".tmp-d.yaml"), "x").unwrap();

        let st = folder_status(dir.path()).unwrap();
        assert_eq!(st.count, 3);
        assert_eq!(
            st.latest.unwrap(),
            DateTime::<Utc>::from(base + std::time::Duration::from_secs(120))
        );
    }

    #[test]
    fn store_status_covers_every_folder_and_stays_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("exchange");
        let store = MessageStore::new(&root, vec!["Kai".into(), "Claude".into()]);

        let report = status(&store).unwrap();
        assert_eq!(report.len(), 6);
        assert!(report.values().all(|s| s.count == 0 && s.latest.is_none()));
        assert!(report.contains_key("outbox/Kai"));
        assert!(!root.exists());
    }

    #[test]
    fn json_rendering() {
        let v = FolderStatus::default().to_json();
        assert_eq!(v["count"], 0);
        assert!(v["latest"].is_null());
    }
}

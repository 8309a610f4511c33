use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::StoreError;
use crate::scrape::ProductRecord;

/// Last-known state of the listing page, keyed by product link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: HashMap<String, ProductRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Snapshot::default()
    }

    /// Rebuild the keyed map from the persisted list. A duplicated
    /// link keeps the later record, matching how observations fold in.
    pub fn from_records(records: Vec<ProductRecord>) -> Self {
        let mut snapshot = Snapshot::new();
        for record in records {
            snapshot.insert(record);
        }
        snapshot
    }

    /// Flatten to the on-disk list form, sorted by link so the file is
    /// stable across saves of the same state.
    pub fn to_records(&self) -> Vec<ProductRecord> {
        let mut records: Vec<ProductRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.link.cmp(&b.link));
        records
    }

    pub fn insert(&mut self, record: ProductRecord) -> Option<ProductRecord> {
        self.records.insert(record.link.clone(), record)
    }

    pub fn get(&self, link: &str) -> Option<&ProductRecord> {
        self.records.get(link)
    }

    pub fn contains(&self, link: &str) -> bool {
        self.records.contains_key(link)
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// File-backed snapshot store. One JSON file holding the record list.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Store under the platform data dir
    /// (~/.local/share/dropwatch/products.json or equivalent).
    pub fn open_default() -> Result<Self, StoreError> {
        let data_dir = directories::ProjectDirs::from("", "", "dropwatch")
            .ok_or(StoreError::DataDir)?
            .data_dir()
            .to_path_buf();

        fs::create_dir_all(&data_dir).map_err(|source| StoreError::CreateDir {
            path: data_dir.clone(),
            source,
        })?;

        Ok(SnapshotStore {
            path: data_dir.join("products.json"),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        SnapshotStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted snapshot. A missing file is a normal first
    /// run; an unreadable or corrupt file is logged and treated as
    /// empty rather than killing the monitor.
    pub fn load(&self) -> Snapshot {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Snapshot::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "snapshot file unreadable, starting empty");
                return Snapshot::new();
            }
        };

        match serde_json::from_str::<Vec<ProductRecord>>(&text) {
            Ok(records) => Snapshot::from_records(records),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "snapshot file corrupt, starting empty");
                Snapshot::new()
            }
        }
    }

    /// Persist the snapshot. Writes to a temp file in the same
    /// directory and renames over the target, so a crash mid-write
    /// leaves the previous file intact.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&snapshot.to_records())?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        tmp.write_all(json.as_bytes())
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        tmp.persist(&self.path).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e.error,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(link: &str, name: &str, price: &str) -> ProductRecord {
        ProductRecord {
            link: link.to_string(),
            name: name.to_string(),
            price: price.to_string(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::at(dir.path().join("products.json"));

        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SnapshotStore::at(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn round_trip_preserves_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::at(dir.path().join("products.json"));

        let snapshot = Snapshot::from_records(vec![
            record("https://shop.example/products/b", "B", "R$ 20,00"),
            record("https://shop.example/products/a", "A", "R$ 10,00"),
        ]);

        store.save(&snapshot).unwrap();
        assert_eq!(store.load(), snapshot);
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::at(dir.path().join("products.json"));

        let mut snapshot = Snapshot::new();
        snapshot.insert(record("https://shop.example/products/a", "A", "1"));
        store.save(&snapshot).unwrap();

        let mut replacement = Snapshot::new();
        replacement.insert(record("https://shop.example/products/b", "B", "2"));
        store.save(&replacement).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("https://shop.example/products/b"));
    }

    #[test]
    fn persisted_form_is_a_record_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::at(dir.path().join("products.json"));

        let mut snapshot = Snapshot::new();
        snapshot.insert(record("https://shop.example/products/a", "A", "1"));
        store.save(&snapshot).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        let parsed: Vec<ProductRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn duplicate_links_in_file_keep_last_record() {
        let snapshot = Snapshot::from_records(vec![
            record("https://shop.example/products/a", "A", "old"),
            record("https://shop.example/products/a", "A", "new"),
        ]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.get("https://shop.example/products/a").unwrap().price,
            "new"
        );
    }
}

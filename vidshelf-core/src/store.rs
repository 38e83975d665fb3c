/* This file is part of the vidshelf project
*
*  Copyright (C) 2025 vidshelf contributors
*
*  This program is free software: you can redistribute it and/or modify
*  it under the terms of the GNU Affero General Public License as published by
*  the Free Software Foundation, either version 3 of the License, or
*  (at your option) any later version.
*
*  This program is distributed in the hope that it will be useful,
*  but WITHOUT ANY WARRANTY; without even the implied warranty of
*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*  GNU Affero General Public License for more details.
*
*  You should have received a copy of the GNU Affero General Public License
*  along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use std::{fs::{self, File}, io::{self, BufReader, BufWriter, Write}, path::{Path, PathBuf}, sync::Mutex};

use cloneable_errors::{anyhow, ErrorContext, ResContext};
use log::debug;

use crate::types::StoredItem;

type Result<T> = std::result::Result<T, ErrorContext>;

/// Somewhere to persist the item list
///
/// Implementations are synchronous and idempotent: saving the same list twice leaves the same
/// state behind.
pub trait ItemStore: Send + Sync {
    /// Returns `None` if nothing was ever saved
    fn load(&self) -> Result<Option<Vec<StoredItem>>>;
    fn save(&self, items: &[StoredItem]) -> Result<()>;
}

/// Stores items as a pretty-printed JSON array, replacing the file atomically on every save
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> JsonFileStore {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ItemStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<StoredItem>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to open {}", self.path.display())),
        };
        let items: Vec<StoredItem> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to deserialize the contents of {}", self.path.display()))?;
        debug!("Loaded {} items from {}", items.len(), self.path.display());
        Ok(Some(items))
    }

    fn save(&self, items: &[StoredItem]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path).with_context(|| format!("Failed to create {}", temp_path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, items).context("Failed to serialize the item list")?;
            writer.flush().with_context(|| format!("Failed to write {}", temp_path.display()))?;
        }
        fs::rename(&temp_path, &self.path).with_context(|| format!("Failed to replace {}", self.path.display()))?;
        debug!("Saved {} items to {}", items.len(), self.path.display());
        Ok(())
    }
}

/// Keeps items in memory only, for instances without a data file
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<Option<Vec<StoredItem>>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl ItemStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<StoredItem>>> {
        Ok(self.items.lock().map_err(|_| anyhow!("Failed to acquire the MemoryStore lock"))?.clone())
    }

    fn save(&self, items: &[StoredItem]) -> Result<()> {
        *self.items.lock().map_err(|_| anyhow!("Failed to acquire the MemoryStore lock"))? = Some(items.to_vec());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ItemCollection, VideoMetadata};

    #[test]
    fn missing_file_means_first_run() {
        let dir = tempfile::tempdir().expect("should be able to create a temp dir");
        let store = JsonFileStore::new(dir.path().join("items.json"));
        assert!(store.load().expect("load should succeed").is_none());
    }

    #[test]
    fn json_store_persists_items() {
        let dir = tempfile::tempdir().expect("should be able to create a temp dir");
        let store = JsonFileStore::new(dir.path().join("nested").join("items.json"));

        let mut items = ItemCollection::new();
        let id = items.add("https://youtu.be/abc123").expect("add should succeed").id.clone();
        items.merge_metadata(&id, VideoMetadata { title: "Title".to_owned(), ..Default::default() });
        store.save(&items.to_vec()).expect("save should succeed");
        store.save(&items.to_vec()).expect("second save should succeed");

        let loaded = store.load().expect("load should succeed").expect("file should exist");
        assert_eq!(loaded, items.to_vec());
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn corrupt_files_are_reported() {
        let dir = tempfile::tempdir().expect("should be able to create a temp dir");
        let path = dir.path().join("items.json");
        fs::write(&path, "{ not json").expect("should be able to write the file");
        assert!(JsonFileStore::new(path).load().is_err());
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().expect("load should succeed").is_none());
        store.save(&[]).expect("save should succeed");
        assert_eq!(store.load().expect("load should succeed"), Some(vec![]));
    }
}

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

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use cloneable_errors::{ErrorContext, ResContext};
use indexmap::IndexMap;
use log::{info, warn};
use serde_json::Value;

use crate::{canonicalize, errors::AddError, types::*, CanonicalUrl};

/// Links added to a fresh collection, and by the "add samples" action
pub const SAMPLE_URLS: &[&str] = &[
    "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    "https://youtu.be/9bZkp7q19f0",
    "https://www.youtube.com/shorts/aqz-KE-bpKQ",
    "https://vimeo.com/76979871",
    "https://www.youtube.com/watch?v=3JZ_D3ELwOQ",
    "https://youtu.be/tVj0ZTS4WF4",
    "https://www.youtube.com/embed/kXYiU_JCYtU",
    "https://vimeo.com/1084537",
    "https://www.youtube.com/watch?v=oHg5SJYRHA0",
    "https://www.dailymotion.com/video/x7u5g1g",
];

/// The user's stored items, newest first
///
/// Every item has a unique [`CanonicalUrl`]; all insertion paths enforce this.
#[derive(Debug, Clone, Default)]
pub struct ItemCollection {
    items: IndexMap<ItemId, StoredItem>,
    urls: HashMap<CanonicalUrl, ItemId>,
}

/// Summary of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub invalid: usize,
    pub duplicates: usize,
}

impl ItemCollection {
    pub fn new() -> ItemCollection {
        ItemCollection::default()
    }

    /// Builds a collection from previously stored items, keeping their order
    ///
    /// Returns the collection and the number of dropped duplicate entries.
    pub fn from_items(items: Vec<StoredItem>) -> (ItemCollection, usize) {
        let mut collection = ItemCollection::new();
        let mut duplicates = 0;
        for item in items {
            if collection.urls.contains_key(&item.url) || collection.items.contains_key(&item.id) {
                warn!("Dropping stored item {} - {} is already stored", item.id, item.url);
                duplicates += 1;
                continue;
            }
            collection.urls.insert(item.url.clone(), item.id.clone());
            collection.items.insert(item.id.clone(), item);
        }
        (collection, duplicates)
    }

    pub fn with_samples() -> ItemCollection {
        ItemCollection::from_items(sample_items()).0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredItem> {
        self.items.values()
    }

    pub fn to_vec(&self) -> Vec<StoredItem> {
        self.items.values().cloned().collect()
    }

    pub fn get(&self, id: &ItemId) -> Option<&StoredItem> {
        self.items.get(id)
    }

    /// Canonicalizes `raw` and stores it as the newest item
    pub fn add(&mut self, raw: &str) -> Result<&StoredItem, AddError> {
        let url = canonicalize(raw)?;
        if let Some(existing) = self.urls.get(&url) {
            return Err(AddError::Duplicate { url, existing: existing.clone() });
        }
        let item = StoredItem::new(url);
        let id = item.id.clone();
        self.urls.insert(item.url.clone(), id.clone());
        self.items.shift_insert(0, id.clone(), item);
        Ok(&self.items[&id])
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<StoredItem> {
        let item = self.items.shift_remove(id)?;
        self.urls.remove(&item.url);
        Some(item)
    }

    /// Returns the new pinned state
    pub fn toggle_pin(&mut self, id: &ItemId) -> Option<bool> {
        let item = self.items.get_mut(id)?;
        item.pinned = !item.pinned;
        Some(item.pinned)
    }

    pub fn update(&mut self, id: &ItemId, patch: ItemPatch) -> Option<&StoredItem> {
        let item = self.items.get_mut(id)?;
        item.apply_patch(patch);
        Some(item)
    }

    /// Merges resolved metadata onto an item
    ///
    /// Returns `false` without doing anything if the item is gone.
    pub fn merge_metadata(&mut self, id: &ItemId, metadata: VideoMetadata) -> bool {
        match self.items.get_mut(id) {
            Some(item) => {
                item.merge_metadata(metadata);
                true
            },
            None => false,
        }
    }

    /// Items lacking both a title and a thumbnail, in stored order
    pub fn needing_metadata(&self) -> Vec<(ItemId, CanonicalUrl)> {
        self.items.values()
            .filter(|item| item.needs_metadata())
            .map(|item| (item.id.clone(), item.url.clone()))
            .collect()
    }

    /// Replaces the whole collection with the sample items
    pub fn reset_to_samples(&mut self) {
        *self = ItemCollection::with_samples();
    }

    /// Replaces the whole collection with the items from a JSON export
    ///
    /// Entries are sanitized one by one. Entries with an invalid URL, or with a URL that is
    /// already present earlier in the import, are skipped.
    pub fn import_json(&mut self, json: &str) -> Result<ImportReport, ErrorContext> {
        let entries: Vec<Value> = serde_json::from_str(json).context("Failed to parse the import file - expected a JSON array")?;
        let now = Utc::now();
        let mut report = ImportReport::default();
        let mut sanitized = Vec::with_capacity(entries.len());
        for entry in &entries {
            match sanitize_entry(entry, now) {
                Ok(item) => sanitized.push(item),
                Err(err) => {
                    warn!("Skipping imported entry: {err}");
                    report.invalid += 1;
                },
            }
        }
        let (collection, duplicates) = ItemCollection::from_items(sanitized);
        report.duplicates = duplicates;
        report.imported = collection.len();
        *self = collection;
        info!("Imported {} items ({} invalid, {} duplicates)", report.imported, report.invalid, report.duplicates);
        Ok(report)
    }
}

pub fn sample_items() -> Vec<StoredItem> {
    let now = Utc::now();
    SAMPLE_URLS.iter()
        .filter_map(|url| canonicalize(url).ok())
        .map(|url| StoredItem::with_time(url, now))
        .collect()
}

fn sanitize_entry(entry: &Value, now: DateTime<Utc>) -> Result<StoredItem, ErrorContext> {
    let raw_url = entry.get("url").and_then(Value::as_str).unwrap_or_default();
    let url = canonicalize(raw_url).context("Imported entry has an invalid URL")?;
    let id = entry.get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map_or_else(ItemId::generate, ItemId::from);
    let created_at = entry.get("createdAt")
        .and_then(Value::as_str)
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map_or(now, |t| t.with_timezone(&Utc));
    let string_field = |name: &str| entry.get(name).and_then(Value::as_str).unwrap_or_default().to_owned();
    let tags = match entry.get("tags") {
        Some(Value::Array(tags)) => tags.iter().filter_map(Value::as_str).take(MAX_TAGS).map(ToOwned::to_owned).collect(),
        _ => Vec::new(),
    };

    Ok(StoredItem {
        id,
        url,
        created_at,
        pinned: entry.get("pinned").is_some_and(is_truthy),
        title: string_field("title"),
        author: string_field("author"),
        thumbnail: string_field("thumbnail"),
        provider: string_field("provider"),
        tags,
        note: string_field("note"),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0. && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(..) | Value::Object(..) => true,
    }
}

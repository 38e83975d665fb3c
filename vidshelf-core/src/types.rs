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

use std::{fmt::Display, sync::Arc};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CanonicalUrl;

pub const MAX_TAGS: usize = 10;

/// Display metadata for a video, as reported by a metadata provider
///
/// Every field may be empty independently - a partial result is still a valid result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    pub title: String,
    pub author: String,
    pub provider: String,
    pub thumbnail: String,
}

impl VideoMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.author.is_empty() && self.provider.is_empty() && self.thumbnail.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Arc<str>);

impl ItemId {
    /// Generates a new random id
    pub fn generate() -> ItemId {
        let mut buffer = [0u8; 12];
        getrandom::fill(&mut buffer).expect("the OS random number generator should be available");
        ItemId(URL_SAFE_NO_PAD.encode(buffer).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.into())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        ItemId(value.into())
    }
}

/// A video link in the user's collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredItem {
    pub id: ItemId,
    pub url: CanonicalUrl,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub note: String,
}

impl StoredItem {
    pub fn new(url: CanonicalUrl) -> StoredItem {
        StoredItem::with_time(url, Utc::now())
    }

    pub fn with_time(url: CanonicalUrl, created_at: DateTime<Utc>) -> StoredItem {
        StoredItem {
            id: ItemId::generate(),
            url,
            created_at,
            pinned: false,
            title: String::new(),
            author: String::new(),
            thumbnail: String::new(),
            provider: String::new(),
            tags: Vec::new(),
            note: String::new(),
        }
    }

    /// Items with neither a title nor a thumbnail get picked up by resolution passes
    pub fn needs_metadata(&self) -> bool {
        self.title.is_empty() && self.thumbnail.is_empty()
    }

    pub fn metadata(&self) -> VideoMetadata {
        VideoMetadata {
            title: self.title.clone(),
            author: self.author.clone(),
            provider: self.provider.clone(),
            thumbnail: self.thumbnail.clone(),
        }
    }

    /// Merges resolved metadata onto this item
    ///
    /// Only the four metadata fields are touched, and empty values never erase known ones.
    pub fn merge_metadata(&mut self, metadata: VideoMetadata) {
        let VideoMetadata { title, author, provider, thumbnail } = metadata;
        for (field, value) in [
            (&mut self.title, title),
            (&mut self.author, author),
            (&mut self.provider, provider),
            (&mut self.thumbnail, thumbnail),
        ] {
            if !value.is_empty() {
                *field = value;
            }
        }
    }

    pub fn apply_patch(&mut self, patch: ItemPatch) {
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(note) = patch.note {
            self.note = note;
        }
    }
}

/// User-editable fields of an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemPatch {
    pub tags: Option<Vec<String>>,
    pub note: Option<String>,
}

/// Trims tags, drops empty ones and keeps at most [`MAX_TAGS`]
pub fn normalize_tags<I>(tags: I) -> Vec<String>
where I: IntoIterator,
      I::Item: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_owned())
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .collect()
}

/// Parses a comma separated tag list, as typed in by the user
pub fn parse_tags(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}

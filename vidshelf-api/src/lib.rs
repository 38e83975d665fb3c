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

use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Default, Debug)]
#[serde(default)]
pub struct StatusResponse {
    // collection stats
    pub items: usize,
    pub pinned: usize,
    pub needing_metadata: usize,
    // resolution passes
    pub pass_running: bool,
    pub last_pass: Option<PassSummary>,
    // general server data
    pub server_version: Option<Arc<str>>,
    pub server_startup_timestamp: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct PassSummary {
    pub attempted: usize,
    pub resolved: usize,
    pub empty: usize,
    pub finished_at: i64,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Default, Debug)]
#[serde(default)]
pub struct ApiMetadata {
    pub title: Arc<str>,
    pub author: Arc<str>,
    pub provider: Arc<str>,
    pub thumbnail: Arc<str>,
}
#[cfg(feature = "vidshelf-core")]
impl From<&vidshelf_core::VideoMetadata> for ApiMetadata {
    fn from(value: &vidshelf_core::VideoMetadata) -> Self {
        Self {
            title: value.title.as_str().into(),
            author: value.author.as_str().into(),
            provider: value.provider.as_str().into(),
            thumbnail: value.thumbnail.as_str().into(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct ApiItem {
    pub id: Arc<str>,
    pub url: Arc<str>,
    pub created_at: i64,
    pub pinned: bool,
    #[serde(flatten)]
    pub metadata: ApiMetadata,
    pub tags: Vec<Arc<str>>,
    pub note: Arc<str>,
    pub needs_metadata: bool,
}
#[cfg(feature = "vidshelf-core")]
impl From<&vidshelf_core::StoredItem> for ApiItem {
    fn from(value: &vidshelf_core::StoredItem) -> Self {
        Self {
            id: value.id.as_str().into(),
            url: value.url.as_str().into(),
            created_at: value.created_at.timestamp_millis(),
            pinned: value.pinned,
            metadata: (&value.metadata()).into(),
            tags: value.tags.iter().map(|t| t.as_str().into()).collect(),
            note: value.note.as_str().into(),
            needs_metadata: value.needs_metadata(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct AddItemRequest {
    pub url: String,
}

/// Partial update of the user-editable fields
///
/// `tags` is the comma separated list as typed in by the user.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Default, Debug)]
#[serde(default)]
pub struct UpdateItemRequest {
    pub tags: Option<String>,
    pub note: Option<String>,
}
#[cfg(feature = "vidshelf-core")]
impl From<UpdateItemRequest> for vidshelf_core::ItemPatch {
    fn from(value: UpdateItemRequest) -> Self {
        Self {
            tags: value.tags.as_deref().map(vidshelf_core::parse_tags),
            note: value.note,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct PinResponse {
    pub pinned: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ImportResponse {
    pub imported: usize,
    pub invalid: usize,
    pub duplicates: usize,
}
#[cfg(feature = "vidshelf-core")]
impl From<vidshelf_core::ImportReport> for ImportResponse {
    fn from(value: vidshelf_core::ImportReport) -> Self {
        Self {
            imported: value.imported,
            invalid: value.invalid,
            duplicates: value.duplicates,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct CanonicalizeResponse {
    pub canonical: Arc<str>,
    pub video_id: Option<Arc<str>>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct ResolveResponse {
    pub canonical: Arc<str>,
    /// Provider that produced the metadata, `None` if nothing was found
    pub source: Option<Arc<str>>,
    pub metadata: Option<ApiMetadata>,
}

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

use cloneable_errors::ErrorContext;
use futures::future::BoxFuture;
use reqwest::Client;
use url::Url;
use vidshelf_core::VideoMetadata;

mod microlink;
mod noembed;
mod oembed;

pub use microlink::{MicrolinkMetadata, MicrolinkScreenshot};
pub use noembed::Noembed;
pub use oembed::{NativeOEmbed, Platform};

/// Identifies the step of the fallback chain a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    #[strum(serialize = "oembed")]
    NativeOEmbed,
    Noembed,
    Microlink,
    MicrolinkScreenshot,
    /// Anything not shipped with this crate
    Custom,
}

/// Result of asking a single provider
#[derive(Debug, Clone)]
pub enum ProviderOutcome {
    /// The provider produced usable metadata, ending the chain
    Found(VideoMetadata),
    /// The provider doesn't handle this kind of link
    NotApplicable,
    /// The provider answered, but had nothing usable
    Absent(&'static str),
    /// The request or response decoding failed
    Failed(ErrorContext),
}

/// One step of the metadata fallback chain
pub trait MetadataProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn try_fetch<'a>(&'a self, client: &'a Client, target: &'a Url) -> BoxFuture<'a, ProviderOutcome>;
}

/// Builds a `<endpoint>?[format=json&]url=<target>` request URL
fn endpoint_with_target(endpoint: &Url, target: &Url, json_format: bool) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        if json_format {
            query.append_pair("format", "json");
        }
        query.append_pair("url", target.as_str());
    }
    url
}

/// Fields shared by oEmbed-style responses
///
/// Anything missing or of an unexpected type maps to an empty string.
#[serde_with::serde_as]
#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct OEmbedFields {
    #[serde_as(as = "serde_with::DefaultOnError")]
    title: Option<String>,
    #[serde_as(as = "serde_with::DefaultOnError")]
    author_name: Option<String>,
    #[serde_as(as = "serde_with::DefaultOnError")]
    provider_name: Option<String>,
    #[serde_as(as = "serde_with::DefaultOnError")]
    thumbnail_url: Option<String>,
}

impl From<OEmbedFields> for VideoMetadata {
    fn from(value: OEmbedFields) -> Self {
        VideoMetadata {
            title: value.title.unwrap_or_default(),
            author: value.author_name.unwrap_or_default(),
            provider: value.provider_name.unwrap_or_default(),
            thumbnail: value.thumbnail_url.unwrap_or_default(),
        }
    }
}

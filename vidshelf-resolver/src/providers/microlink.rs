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

use cloneable_errors::ResContext;
use futures::{future::BoxFuture, FutureExt};
use reqwest::Client;
use serde::Deserialize;
use serde_with::{serde_as, DefaultOnError};
use url::Url;
use vidshelf_core::VideoMetadata;

use super::{MetadataProvider, ProviderKind, ProviderOutcome};
use crate::http::get_json;

#[derive(Deserialize)]
struct MicrolinkResponse<T> {
    #[serde(default)]
    data: Option<T>,
}

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(default)]
struct Asset {
    #[serde_as(as = "DefaultOnError")]
    url: Option<String>,
}

impl Asset {
    fn into_url(self) -> Option<String> {
        self.url.filter(|u| !u.is_empty())
    }
}

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(default)]
struct MetaData {
    #[serde_as(as = "DefaultOnError")]
    title: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    author: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    publisher: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    lang: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    image: Option<Asset>,
    #[serde_as(as = "DefaultOnError")]
    logo: Option<Asset>,
}

impl MetaData {
    fn into_metadata(self) -> Option<VideoMetadata> {
        let title = self.title.unwrap_or_default();
        let thumbnail = self.image.and_then(Asset::into_url)
            .or_else(|| self.logo.and_then(Asset::into_url))
            .unwrap_or_default();
        if title.is_empty() && thumbnail.is_empty() {
            return None;
        }
        let author = self.author.unwrap_or_default();
        let provider = [self.publisher.as_deref(), Some(author.as_str()), self.lang.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_owned();
        Some(VideoMetadata { title, author, provider, thumbnail })
    }
}

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(default)]
struct ScreenshotData {
    #[serde_as(as = "DefaultOnError")]
    screenshot: Option<Asset>,
}

fn request_url(endpoint: &Url, target: &Url, screenshot: bool) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        if screenshot {
            query.append_pair("screenshot", "true");
            query.append_pair("meta", "false");
            query.append_pair("embed", "screenshot.url");
        }
        query.append_pair("url", target.as_str());
    }
    url
}

/// Page metadata extraction through microlink
pub struct MicrolinkMetadata {
    endpoint: Url,
}

impl MicrolinkMetadata {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }
}

impl MetadataProvider for MicrolinkMetadata {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Microlink
    }

    fn try_fetch<'a>(&'a self, client: &'a Client, target: &'a Url) -> BoxFuture<'a, ProviderOutcome> {
        async move {
            let request = request_url(&self.endpoint, target, false);
            match get_json::<MicrolinkResponse<MetaData>>(client, request).await.context("microlink request failed") {
                Ok(response) => match response.data.and_then(MetaData::into_metadata) {
                    Some(metadata) => ProviderOutcome::Found(metadata),
                    None => ProviderOutcome::Absent("no title or image in extracted metadata"),
                },
                Err(err) => ProviderOutcome::Failed(err),
            }
        }.boxed()
    }
}

/// Last resort: a screenshot of the page as the thumbnail
pub struct MicrolinkScreenshot {
    endpoint: Url,
}

impl MicrolinkScreenshot {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }
}

impl MetadataProvider for MicrolinkScreenshot {
    fn kind(&self) -> ProviderKind {
        ProviderKind::MicrolinkScreenshot
    }

    fn try_fetch<'a>(&'a self, client: &'a Client, target: &'a Url) -> BoxFuture<'a, ProviderOutcome> {
        async move {
            let request = request_url(&self.endpoint, target, true);
            let response = match get_json::<MicrolinkResponse<ScreenshotData>>(client, request).await.context("microlink screenshot request failed") {
                Ok(r) => r,
                Err(err) => return ProviderOutcome::Failed(err),
            };
            match response.data.and_then(|d| d.screenshot).and_then(Asset::into_url) {
                Some(thumbnail) => ProviderOutcome::Found(VideoMetadata {
                    thumbnail,
                    provider: target.host_str().unwrap_or_default().to_owned(),
                    ..Default::default()
                }),
                None => ProviderOutcome::Absent("no screenshot URL"),
            }
        }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(json: serde_json::Value) -> Option<VideoMetadata> {
        serde_json::from_value::<MetaData>(json).unwrap().into_metadata()
    }

    #[test]
    fn provider_precedence() {
        let m = meta(serde_json::json!({"title": "A", "author": "B", "publisher": "C", "lang": "en"})).unwrap();
        assert_eq!(m.provider, "C");
        assert_eq!(m.author, "B");
        let m = meta(serde_json::json!({"title": "A", "author": "B", "publisher": ""})).unwrap();
        assert_eq!(m.provider, "B");
        let m = meta(serde_json::json!({"title": "A", "lang": "en"})).unwrap();
        assert_eq!(m.provider, "en");
    }

    #[test]
    fn image_preferred_over_logo() {
        let m = meta(serde_json::json!({"image": {"url": "https://i/1.png"}, "logo": {"url": "https://i/logo.png"}})).unwrap();
        assert_eq!(m.thumbnail, "https://i/1.png");
        assert!(m.title.is_empty());
        let m = meta(serde_json::json!({"image": null, "logo": {"url": "https://i/logo.png"}})).unwrap();
        assert_eq!(m.thumbnail, "https://i/logo.png");
    }

    #[test]
    fn rejects_useless_metadata() {
        assert!(meta(serde_json::json!({"author": "B", "publisher": "C"})).is_none());
        assert!(meta(serde_json::json!({"title": 42, "image": "not an object"})).is_none());
    }

    #[test]
    fn screenshot_request_url() {
        let endpoint = Url::parse("https://api.microlink.io/").unwrap();
        let target = Url::parse("https://example.com/v").unwrap();
        assert_eq!(
            request_url(&endpoint, &target, true).as_str(),
            "https://api.microlink.io/?screenshot=true&meta=false&embed=screenshot.url&url=https%3A%2F%2Fexample.com%2Fv",
        );
    }
}

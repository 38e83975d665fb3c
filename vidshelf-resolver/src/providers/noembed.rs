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
use url::Url;
use vidshelf_core::VideoMetadata;

use super::{endpoint_with_target, MetadataProvider, OEmbedFields, ProviderKind, ProviderOutcome};
use crate::http::get_json;

#[derive(Deserialize)]
struct NoembedResponse {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(flatten)]
    fields: OEmbedFields,
}

/// Generic oEmbed aggregator lookup
pub struct Noembed {
    endpoint: Url,
}

impl Noembed {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }
}

impl MetadataProvider for Noembed {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Noembed
    }

    fn try_fetch<'a>(&'a self, client: &'a Client, target: &'a Url) -> BoxFuture<'a, ProviderOutcome> {
        async move {
            let request = endpoint_with_target(&self.endpoint, target, false);
            match get_json::<NoembedResponse>(client, request).await.context("noembed request failed") {
                Ok(NoembedResponse { error: Some(_), .. }) => ProviderOutcome::Absent("noembed reported an error"),
                Ok(response) => match VideoMetadata::from(response.fields) {
                    metadata if metadata.is_empty() => ProviderOutcome::Absent("empty noembed response"),
                    metadata => ProviderOutcome::Found(metadata),
                },
                Err(err) => ProviderOutcome::Failed(err),
            }
        }.boxed()
    }
}

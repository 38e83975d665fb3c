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
use log::debug;
use reqwest::Client;
use url::Url;
use vidshelf_core::VideoMetadata;

use super::{endpoint_with_target, MetadataProvider, OEmbedFields, ProviderKind, ProviderOutcome};
use crate::http::{get_json, host_matches_any};

/// A platform with its own oEmbed endpoint
#[derive(Debug, Clone)]
pub struct Platform {
    pub name: &'static str,
    pub domains: &'static [&'static str],
    pub endpoint: Url,
    /// Whether the endpoint wants an explicit `format=json` parameter
    pub json_format: bool,
}

impl Platform {
    pub fn youtube(endpoint: Url) -> Self {
        Self { name: "YouTube", domains: &["youtube.com", "youtu.be"], endpoint, json_format: true }
    }

    pub fn vimeo(endpoint: Url) -> Self {
        Self { name: "Vimeo", domains: &["vimeo.com"], endpoint, json_format: false }
    }

    pub fn dailymotion(endpoint: Url) -> Self {
        Self { name: "Dailymotion", domains: &["dailymotion.com", "dai.ly"], endpoint, json_format: true }
    }

    pub fn handles(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|host| host_matches_any(host, self.domains))
    }
}

/// Queries the platform's own oEmbed endpoint, for links on platforms that have one
pub struct NativeOEmbed {
    platforms: Vec<Platform>,
}

impl NativeOEmbed {
    pub fn new(platforms: Vec<Platform>) -> Self {
        Self { platforms }
    }

    fn platform_for(&self, url: &Url) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.handles(url))
    }
}

impl MetadataProvider for NativeOEmbed {
    fn kind(&self) -> ProviderKind {
        ProviderKind::NativeOEmbed
    }

    fn try_fetch<'a>(&'a self, client: &'a Client, target: &'a Url) -> BoxFuture<'a, ProviderOutcome> {
        async move {
            let Some(platform) = self.platform_for(target) else {
                return ProviderOutcome::NotApplicable;
            };
            debug!("Querying {} oEmbed for {target}", platform.name);
            let request = endpoint_with_target(&platform.endpoint, target, platform.json_format);
            match get_json::<OEmbedFields>(client, request).await.with_context(|| format!("{} oEmbed request failed", platform.name)) {
                Ok(fields) => {
                    let metadata: VideoMetadata = fields.into();
                    if metadata.is_empty() {
                        ProviderOutcome::Absent("empty oEmbed response")
                    } else {
                        ProviderOutcome::Found(metadata)
                    }
                },
                Err(err) => ProviderOutcome::Failed(err),
            }
        }.boxed()
    }
}

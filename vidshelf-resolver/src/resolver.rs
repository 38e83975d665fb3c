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

use log::{debug, info, warn};
use reqwest::Client;
use url::Url;
use vidshelf_core::{CanonicalUrl, VideoMetadata};

use crate::{
    constants::{DAILYMOTION_OEMBED_URL, MICROLINK_URL, NOEMBED_URL, UNSHORTEN_URL, VIMEO_OEMBED_URL, YOUTUBE_OEMBED_URL},
    expand::expand_short_link,
    providers::{MetadataProvider, MicrolinkMetadata, MicrolinkScreenshot, NativeOEmbed, Noembed, Platform, ProviderKind, ProviderOutcome},
};

/// Base URLs of every external service the resolver talks to
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub unshorten: Url,
    pub youtube_oembed: Url,
    pub vimeo_oembed: Url,
    pub dailymotion_oembed: Url,
    pub noembed: Url,
    pub microlink: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            unshorten: UNSHORTEN_URL.clone(),
            youtube_oembed: YOUTUBE_OEMBED_URL.clone(),
            vimeo_oembed: VIMEO_OEMBED_URL.clone(),
            dailymotion_oembed: DAILYMOTION_OEMBED_URL.clone(),
            noembed: NOEMBED_URL.clone(),
            microlink: MICROLINK_URL.clone(),
        }
    }
}

impl Endpoints {
    /// The default provider chain, in priority order
    pub fn providers(&self) -> Vec<Box<dyn MetadataProvider>> {
        vec![
            Box::new(NativeOEmbed::new(vec![
                Platform::youtube(self.youtube_oembed.clone()),
                Platform::vimeo(self.vimeo_oembed.clone()),
                Platform::dailymotion(self.dailymotion_oembed.clone()),
            ])),
            Box::new(Noembed::new(self.noembed.clone())),
            Box::new(MicrolinkMetadata::new(self.microlink.clone())),
            Box::new(MicrolinkScreenshot::new(self.microlink.clone())),
        ]
    }
}

#[derive(Debug, Clone)]
pub enum ResolutionOutcome {
    Resolved {
        metadata: VideoMetadata,
        source: ProviderKind,
    },
    /// Every provider came up empty, the caller may try again later
    Empty,
}

impl ResolutionOutcome {
    pub fn into_metadata(self) -> Option<VideoMetadata> {
        match self {
            Self::Resolved { metadata, .. } => Some(metadata),
            Self::Empty => None,
        }
    }
}

pub struct MetadataResolver {
    client: Client,
    unshorten: Url,
    providers: Vec<Box<dyn MetadataProvider>>,
}

impl MetadataResolver {
    pub fn new(client: Client) -> Self {
        Self::with_endpoints(client, &Endpoints::default())
    }

    pub fn with_endpoints(client: Client, endpoints: &Endpoints) -> Self {
        Self::with_providers(client, endpoints.unshorten.clone(), endpoints.providers())
    }

    pub fn with_providers(client: Client, unshorten: Url, providers: Vec<Box<dyn MetadataProvider>>) -> Self {
        Self { client, unshorten, providers }
    }

    /// Finds metadata for a canonical URL
    ///
    /// Short links are expanded first. Providers are tried in order until one of them
    /// returns something. Never fails: network and decoding errors just move on to the next provider.
    pub async fn resolve(&self, url: &CanonicalUrl) -> ResolutionOutcome {
        let target = expand_short_link(&self.client, &self.unshorten, url.as_url()).await;
        for provider in &self.providers {
            let kind = provider.kind();
            match provider.try_fetch(&self.client, &target).await {
                ProviderOutcome::Found(metadata) => {
                    debug!("{kind} returned metadata for {target}");
                    return ResolutionOutcome::Resolved { metadata, source: kind };
                },
                ProviderOutcome::NotApplicable => {
                    debug!("{kind} does not handle {target}, skipping");
                },
                ProviderOutcome::Absent(reason) => {
                    debug!("{kind} had nothing for {target}: {reason}");
                },
                ProviderOutcome::Failed(err) => {
                    warn!("{kind} failed for {target}: {err}");
                    debug!("{err:?}");
                },
            }
        }
        info!("No metadata found for {url}");
        ResolutionOutcome::Empty
    }
}

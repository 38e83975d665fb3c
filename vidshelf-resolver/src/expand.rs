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

use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use serde_with::{serde_as, DefaultOnError};
use url::Url;
use vidshelf_core::is_valid_http_url;

use crate::{constants::SHORTENER_HOSTS, http::{get_json, host_matches_any}};

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(default)]
struct UnshortenResponse {
    #[serde_as(as = "DefaultOnError")]
    resolved_url: Option<String>,
}

pub fn is_short_link(url: &Url) -> bool {
    url.host_str().is_some_and(|host| host_matches_any(host, SHORTENER_HOSTS))
}

/// Expands links from known URL shorteners using an unshorten.me-compatible endpoint
///
/// Makes at most one request. Any failure leaves the link as-is.
pub async fn expand_short_link(client: &Client, endpoint: &Url, url: &Url) -> Url {
    if !is_short_link(url) {
        return url.clone();
    }

    let mut request_url = endpoint.clone();
    match request_url.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().push(url.as_str());
        },
        Err(()) => {
            debug!("Unshorten endpoint {endpoint} cannot have path segments, not expanding {url}");
            return url.clone();
        },
    }

    let response: UnshortenResponse = match get_json(client, request_url).await {
        Ok(r) => r,
        Err(err) => {
            debug!("Failed to expand {url}: {err:?}");
            return url.clone();
        },
    };

    let expanded = response.resolved_url
        .filter(|u| is_valid_http_url(u))
        .and_then(|u| Url::parse(u.trim()).ok());
    match expanded {
        Some(expanded) => {
            info!("Expanded {url} to {expanded}");
            expanded
        },
        None => {
            debug!("Unshorten endpoint returned no usable URL for {url}");
            url.clone()
        },
    }
}

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

use cloneable_errors::{ErrorContext, ResContext};
use reqwest::{header::ACCEPT, Client};
use serde::de::DeserializeOwned;
use url::Url;

/// Sends a GET request and deserializes the JSON response
///
/// Non-success status codes are errors.
pub async fn get_json<R>(client: &Client, url: Url) -> Result<R, ErrorContext>
where R: DeserializeOwned,
{
    client
        .get(url)
        .header(ACCEPT, "application/json")
        .send().await.context("Failed to send the request")?
        .error_for_status().context("The server returned an error status")?
        .json().await.context("Failed to deserialize response")
}

/// Checks whether `host` is `domain` or one of its subdomains
pub fn host_matches(host: &str, domain: &str) -> bool {
    host.strip_suffix(domain)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
}

pub fn host_matches_any(host: &str, domains: &[&str]) -> bool {
    domains.iter().any(|domain| host_matches(host, domain))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_matching_respects_label_boundaries() {
        assert!(host_matches("t.co", "t.co"));
        assert!(host_matches("www.vimeo.com", "vimeo.com"));
        assert!(!host_matches("xt.co", "t.co"));
        assert!(!host_matches("vimeo.com.evil.example", "vimeo.com"));
        assert!(host_matches_any("player.vimeo.com", &["youtube.com", "vimeo.com"]));
    }
}

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

use std::{borrow::Cow, fmt::Display, str::Utf8Error, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::errors::InvalidUrlError;

static YOUTUBE_HOST_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(^|\.)youtube\.com$|(^|\.)youtu\.be$").expect("YOUTUBE_HOST_REGEX should be valid"));
static SHARED_URL_REGEX:   LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").expect("SHARED_URL_REGEX should be valid"));
static YOUTUBE_WATCH_URL:  LazyLock<Url>   = LazyLock::new(|| Url::parse("https://www.youtube.com/watch").expect("should be able to parse the youtube watch URL"));

/// A validated, normalized absolute http(s) URL
///
/// This is the identity of a stored item: two items with equal `CanonicalUrl`s are the same item.
/// The only way to obtain one is through [`canonicalize`], deserialization included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl Display for CanonicalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CanonicalUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CanonicalUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Cow::<'de, str>::deserialize(deserializer)?;
        canonicalize(&raw).map_err(serde::de::Error::custom)
    }
}

/// Turns an untrusted string into the canonical form of the URL it contains
///
/// Recognized youtube links are rewritten into `https://www.youtube.com/watch?v=<id>`,
/// everything else only gets its scheme and host lower-cased.
pub fn canonicalize(raw: &str) -> Result<CanonicalUrl, InvalidUrlError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|reason| InvalidUrlError::Malformed { input: raw.into(), reason })?;
    ensure_http(&url, raw)?;

    // the url crate already lower-cases the scheme and the host of http(s) URLs
    let canonical = match youtube_video_id(&url) {
        Some(video_id) => youtube_watch_url(&video_id),
        None => url,
    };
    ensure_http(&canonical, raw)?;

    Ok(CanonicalUrl(canonical))
}

fn ensure_http(url: &Url, raw: &str) -> Result<(), InvalidUrlError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(InvalidUrlError::UnsupportedScheme { input: raw.into(), scheme: scheme.into() }),
    }
}

/// Whether `value` parses as an absolute http(s) URL, without normalizing it
pub fn is_valid_http_url(value: &str) -> bool {
    Url::parse(value.trim()).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Extracts the video id from youtube links
///
/// Playlist links (anything with a `list` query parameter) never yield an id, regardless of the
/// host or path shape.
pub fn youtube_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if !YOUTUBE_HOST_REGEX.is_match(host) {
        return None;
    }
    if url.query_pairs().any(|(key, _)| key == "list") {
        return None;
    }

    let path = url.path();
    let id = if host.ends_with("youtu.be") {
        let segment = url.path_segments()?.find(|s| !s.is_empty())?;
        url_decode(segment).ok()?.into_owned()
    } else if path.starts_with("/watch") {
        url.query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?
    } else if path.starts_with("/shorts/") || path.starts_with("/embed/") {
        let segment = path.split('/').nth(2)?;
        url_decode(segment).ok()?.into_owned()
    } else {
        return None;
    };

    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

fn youtube_watch_url(video_id: &str) -> Url {
    let mut url = YOUTUBE_WATCH_URL.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("v", video_id);
    url
}

fn url_decode(input: &str) -> Result<Cow<'_, str>, Utf8Error> {
    percent_encoding::percent_decode_str(input).decode_utf8()
}

/// Picks the link to add out of a web share target request
///
/// An explicit `url` wins, otherwise the first http(s) link found in the shared text is used.
pub fn extract_shared_url<'a>(url: Option<&'a str>, text: Option<&'a str>) -> Option<&'a str> {
    if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
        return Some(url);
    }
    text.and_then(|t| SHARED_URL_REGEX.find(t)).map(|m| m.as_str())
}


#[cfg(test)]
mod tests {
    use super::*;

    const WATCH: &str = "https://www.youtube.com/watch?v=abc123";

    fn canon(raw: &str) -> String {
        canonicalize(raw).expect("input should canonicalize").as_str().to_owned()
    }

    #[test]
    fn youtube_shapes_collapse_to_one_key() {
        for input in [
            "https://youtu.be/abc123",
            "https://www.youtube.com/watch?v=abc123",
            "https://www.youtube.com/shorts/abc123",
            "https://www.youtube.com/embed/abc123",
            "http://m.youtube.com/watch?feature=share&v=abc123#t=42",
            "  HTTPS://WWW.YOUTUBE.COM/embed/abc123?autoplay=1  ",
            "https://youtu.be/abc123?si=tracking",
        ] {
            assert_eq!(canon(input), WATCH, "input: {input}");
        }
    }

    #[test]
    fn canonicalize_is_idempotent() {
        for input in [
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/aqz-KE-bpKQ",
            "https://youtu.be/dQw4w9WgXcQ?list=PL123",
            "HTTPS://Example.COM/Some/Path?Q=A#Frag",
            "https://vimeo.com/76979871",
            "http://example.com",
            "https://youtu.be/a%20b",
        ] {
            let once = canon(input);
            assert_eq!(canon(&once), once, "input: {input}");
        }
    }

    #[test]
    fn playlists_are_not_rewritten() {
        assert_eq!(
            canon("https://www.youtube.com/watch?v=abc123&list=PL1"),
            "https://www.youtube.com/watch?v=abc123&list=PL1",
        );
        assert_eq!(
            canon("HTTP://WWW.YouTube.com/watch?v=abc123&list=PL1"),
            "http://www.youtube.com/watch?v=abc123&list=PL1",
        );
    }

    #[test]
    fn short_alias_playlists_fall_back_to_generic_form() {
        assert_eq!(
            canon("https://youtu.be/dQw4w9WgXcQ?list=PL123"),
            "https://youtu.be/dQw4w9WgXcQ?list=PL123",
        );
    }

    #[test]
    fn generic_urls_only_lowercase_scheme_and_host() {
        assert_eq!(canon("  HTTPS://Example.COM/Some/Path?Q=A#Frag "), "https://example.com/Some/Path?Q=A#Frag");
        assert_eq!(canon("https://vimeo.com/76979871"), "https://vimeo.com/76979871");
        assert_eq!(canon("https://notyoutube.com/watch?v=abc123"), "https://notyoutube.com/watch?v=abc123");
    }

    #[test]
    fn youtube_urls_without_an_id_are_kept() {
        assert_eq!(canon("https://www.youtube.com/watch?v="), "https://www.youtube.com/watch?v=");
        assert_eq!(canon("https://youtu.be/"), "https://youtu.be/");
        assert_eq!(canon("https://www.youtube.com/@someone/videos"), "https://www.youtube.com/@someone/videos");
        assert_eq!(canon("https://www.youtube.com/shorts/"), "https://www.youtube.com/shorts/");
    }

    #[test]
    fn short_alias_id_is_percent_decoded() {
        assert_eq!(canon("https://youtu.be/abc%2D123"), "https://www.youtube.com/watch?v=abc-123");
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        assert!(matches!(
            canonicalize("ftp://example.com/x"),
            Err(InvalidUrlError::UnsupportedScheme { ref scheme, .. }) if &**scheme == "ftp"
        ));
        assert!(matches!(canonicalize("javascript:alert(1)"), Err(InvalidUrlError::UnsupportedScheme { .. })));
    }

    #[test]
    fn malformed_input_is_rejected() {
        for input in ["", "   ", "not a url", "example.com/watch", "http://"] {
            assert!(matches!(canonicalize(input), Err(InvalidUrlError::Malformed { .. })), "input: {input:?}");
        }
    }

    #[test]
    fn http_url_validation() {
        assert!(is_valid_http_url(" https://example.com "));
        assert!(is_valid_http_url("http://example.com/x"));
        assert!(!is_valid_http_url("mailto:someone@example.com"));
        assert!(!is_valid_http_url(""));
    }

    #[test]
    fn shared_url_extraction() {
        assert_eq!(extract_shared_url(Some(" https://a.example/x "), Some("https://b.example")), Some("https://a.example/x"));
        assert_eq!(extract_shared_url(Some(""), Some("look at this https://youtu.be/abc123 !")), Some("https://youtu.be/abc123"));
        assert_eq!(extract_shared_url(None, Some("no links here")), None);
        assert_eq!(extract_shared_url(None, None), None);
    }

    #[test]
    fn deserialization_canonicalizes() {
        let url: CanonicalUrl = serde_json::from_str("\"https://youtu.be/abc123\"").expect("should deserialize");
        assert_eq!(url.as_str(), WATCH);
        assert!(serde_json::from_str::<CanonicalUrl>("\"ftp://example.com\"").is_err());
    }
}

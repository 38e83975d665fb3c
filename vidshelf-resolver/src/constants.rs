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
use std::sync::LazyLock;

use url::Url;

// Short-link expansion

/// Hosts whose links get expanded before looking for metadata
pub const SHORTENER_HOSTS: &[&str] = &["naver.me", "bit.ly", "goo.gl", "t.co", "is.gd", "tinyurl.com"];

// Default service endpoints

pub static UNSHORTEN_URL:          LazyLock<Url> = LazyLock::new(|| Url::parse("https://unshorten.me/json/").expect("should be able to parse the unshorten.me URL"));
pub static YOUTUBE_OEMBED_URL:     LazyLock<Url> = LazyLock::new(|| Url::parse("https://www.youtube.com/oembed").expect("should be able to parse the youtube oembed URL"));
pub static VIMEO_OEMBED_URL:       LazyLock<Url> = LazyLock::new(|| Url::parse("https://vimeo.com/api/oembed.json").expect("should be able to parse the vimeo oembed URL"));
pub static DAILYMOTION_OEMBED_URL: LazyLock<Url> = LazyLock::new(|| Url::parse("https://www.dailymotion.com/services/oembed").expect("should be able to parse the dailymotion oembed URL"));
pub static NOEMBED_URL:            LazyLock<Url> = LazyLock::new(|| Url::parse("https://noembed.com/embed").expect("should be able to parse the noembed URL"));
pub static MICROLINK_URL:          LazyLock<Url> = LazyLock::new(|| Url::parse("https://api.microlink.io/").expect("should be able to parse the microlink URL"));

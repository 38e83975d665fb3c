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

use std::{fmt::Display, sync::Arc};

use crate::types::ItemId;
use crate::CanonicalUrl;

/// Why a raw string couldn't be turned into a [`CanonicalUrl`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidUrlError {
    Malformed {
        input: Arc<str>,
        reason: url::ParseError,
    },
    UnsupportedScheme {
        input: Arc<str>,
        scheme: Arc<str>,
    },
}

impl std::error::Error for InvalidUrlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InvalidUrlError::Malformed { reason, .. } => Some(reason),
            InvalidUrlError::UnsupportedScheme { .. } => None,
        }
    }
}

impl Display for InvalidUrlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidUrlError::Malformed { input, reason } => write!(f, "Invalid URL: \"{input}\" is not an absolute URL ({reason})"),
            InvalidUrlError::UnsupportedScheme { input, scheme } => write!(f, "Invalid URL: \"{input}\" uses the unsupported scheme '{scheme}', only http and https are allowed"),
        }
    }
}

/// Errors returned by [`crate::ItemCollection::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddError {
    InvalidUrl(InvalidUrlError),
    Duplicate {
        url: CanonicalUrl,
        existing: ItemId,
    },
}

impl std::error::Error for AddError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AddError::InvalidUrl(err) => Some(err),
            AddError::Duplicate { .. } => None,
        }
    }
}

impl Display for AddError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddError::InvalidUrl(err) => Display::fmt(err, f),
            AddError::Duplicate { url, existing } => write!(f, "Duplicate URL: {url} is already stored as item {existing}"),
        }
    }
}

impl From<InvalidUrlError> for AddError {
    fn from(value: InvalidUrlError) -> Self {
        AddError::InvalidUrl(value)
    }
}

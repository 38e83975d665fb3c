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

use std::fmt::{Debug, Display};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use cloneable_errors::{ErrContext, ErrorContext, IntoErrorIterator};
use vidshelf_core::{AddError, InvalidUrlError};

use crate::errors::extensions::status::{ResponseCodeExt, BAD_REQUEST, CONFLICT};

pub mod extensions;

pub enum Error {
    #[allow(clippy::enum_variant_names)]
    ErrorContext(ErrorContext),
    EmptyStatus(StatusCode),
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ErrorContext(ref err) => Debug::fmt(err, f),
            Error::EmptyStatus(status) => f.debug_tuple("Error::EmptyStatus").field(status).finish(),
        }
    }
}
impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ErrorContext(ref err) => Display::fmt(err, f),
            Error::EmptyStatus(status) => write!(f, "{status}"),
        }
    }
}
impl From<ErrorContext> for Error {
    fn from(value: ErrorContext) -> Self {
        Error::ErrorContext(value)
    }
}
impl From<InvalidUrlError> for Error {
    fn from(value: InvalidUrlError) -> Self {
        Error::ErrorContext(value.context("The provided URL was rejected").with_extension(BAD_REQUEST.clone()))
    }
}
impl From<AddError> for Error {
    fn from(value: AddError) -> Self {
        match value {
            AddError::InvalidUrl(err) => err.into(),
            err @ AddError::Duplicate { .. } => Error::ErrorContext(err.context("Failed to add the item").with_extension(CONFLICT.clone())),
        }
    }
}
impl std::error::Error for Error {}
impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::ErrorContext(err) => err.find_extension::<ResponseCodeExt>().map_or(StatusCode::INTERNAL_SERVER_ERROR, |ext| ext.0),
            Error::EmptyStatus(status) => *status,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            Error::ErrorContext(err) => builder.json(err.serializable_copy()),
            Error::EmptyStatus(..) => builder.finish(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::body::to_bytes;
    use cloneable_errors::{anyhow, ResContext, ResExtensions};

    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let invalid = vidshelf_core::canonicalize("ftp://example.com/x").unwrap_err();
        assert_eq!(Error::from(invalid.clone()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::from(AddError::InvalidUrl(invalid)).status_code(), StatusCode::BAD_REQUEST);

        let mut items = vidshelf_core::ItemCollection::new();
        items.add("https://youtu.be/abc123").unwrap();
        let duplicate = items.add("https://www.youtube.com/shorts/abc123").unwrap_err();
        assert_eq!(Error::from(duplicate).status_code(), StatusCode::CONFLICT);

        assert_eq!(Error::from(anyhow!("boom")).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Error::EmptyStatus(StatusCode::GONE).status_code(), StatusCode::GONE);
    }

    #[test]
    fn status_survives_added_context() {
        let result: std::result::Result<(), ErrorContext> = Err(anyhow!("missing", extend: Arc::new(ResponseCodeExt(StatusCode::NOT_FOUND))));
        let err = Error::from(result.context("Failed to look up the item").unwrap_err());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let result: std::result::Result<(), ErrorContext> = Err(anyhow!("not json"));
        let err = Error::from(result.extend(BAD_REQUEST.clone()).unwrap_err());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn error_body_is_the_serialized_context() {
        let err = Error::from(AddError::InvalidUrl(vidshelf_core::canonicalize("mailto:someone@example.com").unwrap_err()));
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let serialized: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(serialized.to_string().contains("The provided URL was rejected"));

        let empty = Error::EmptyStatus(StatusCode::NOT_FOUND).error_response();
        assert!(to_bytes(empty.into_body()).await.unwrap().is_empty());
    }
}

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

//! Metadata lookup for canonical video links
//!
//! Links from known URL shorteners are expanded first, then a chain of providers is queried:
//! the platform's own oEmbed endpoint, the noembed aggregator, microlink page metadata and
//! finally a microlink screenshot.

mod constants;
mod expand;
mod http;
pub mod pass;
pub mod providers;
mod resolver;

pub use expand::{expand_short_link, is_short_link};
pub use pass::{start_pass, MetadataSink, PassHandle, PassOutcome, PassReport};
pub use providers::{MetadataProvider, ProviderKind, ProviderOutcome};
pub use resolver::{Endpoints, MetadataResolver, ResolutionOutcome};

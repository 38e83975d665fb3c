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
use std::{path::PathBuf, sync::{Arc, Mutex, RwLock, RwLockReadGuard}};

use actix_web::{rt::spawn, web};
use chrono::{DateTime, Utc};
use cloneable_errors::{anyhow, ErrorContext, ResContext};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use vidshelf_api::PassSummary;
use vidshelf_core::{CanonicalUrl, ItemCollection, ItemId, ItemStore, VideoMetadata};
use vidshelf_resolver::{start_pass, MetadataResolver, PassHandle, PassOutcome};

use crate::errors::Error;

pub type LibraryLock = web::Data<LibraryState>;
pub type SchedulerData = web::Data<PassScheduler>;
pub type ResolverData = web::Data<MetadataResolver>;

pub const LIBRARY_READ_ERR:  &str = "Failed to acquire the item collection for reading";
pub const LIBRARY_WRITE_ERR: &str = "Failed to acquire the item collection for writing";
pub const PASS_LOCK_ERR:     &str = "Failed to acquire the resolution pass state";

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listen: ListenConfig,
    /// Where the collection is stored, keeping it in memory only if unset
    pub data_path: Option<PathBuf>,
    pub seed_samples_on_first_run: bool,
    pub resolve_on_startup: bool,
    pub reqwest_timeout_secs: f64,
    pub user_agent: String,
    #[serde(skip)]
    pub startup_timestamp: DateTime<Utc>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            data_path: Some(PathBuf::from("./data/items.json")),
            seed_samples_on_first_run: true,
            resolve_on_startup: true,
            reqwest_timeout_secs: 20.,
            user_agent: concat!("vidshelf/", env!("CARGO_PKG_VERSION")).to_owned(),
            startup_timestamp: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ListenConfig {
    pub tcp: Option<(String, u16)>,
    pub unix: Option<String>,
    pub unix_mode: Option<u32>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            tcp: Some(("127.0.0.1".to_owned(), 9393)),
            unix: None,
            unix_mode: None,
        }
    }
}

/// The item collection together with the store backing it
///
/// Every successful mutation is written to the store before the lock is released. A mutation
/// that can't be saved is not applied.
pub struct LibraryState {
    items: RwLock<ItemCollection>,
    store: Arc<dyn ItemStore>,
}

impl LibraryState {
    pub fn new(items: ItemCollection, store: Arc<dyn ItemStore>) -> LibraryState {
        LibraryState { items: RwLock::new(items), store }
    }

    /// Loads the collection from the store
    ///
    /// On first run, the collection starts out with the sample items if `seed_samples` is set.
    pub fn load(store: Arc<dyn ItemStore>, seed_samples: bool) -> Result<LibraryState, ErrorContext> {
        let items = match store.load().context("Failed to load the stored items")? {
            Some(items) => {
                let (items, duplicates) = ItemCollection::from_items(items);
                if duplicates > 0 {
                    warn!("Dropped {duplicates} stored items with duplicate URLs");
                }
                info!("Loaded {} items", items.len());
                items
            },
            None if seed_samples => {
                info!("No stored items found, seeding the sample items");
                let items = ItemCollection::with_samples();
                store.save(&items.to_vec()).context("Failed to save the sample items")?;
                items
            },
            None => {
                info!("No stored items found, starting with an empty collection");
                ItemCollection::new()
            },
        };
        Ok(LibraryState::new(items, store))
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, ItemCollection>, ErrorContext> {
        self.items.read().map_err(|_| anyhow!(LIBRARY_READ_ERR))
    }

    /// Runs `f` on a copy of the collection, which replaces the current one once it's saved
    pub fn modify<T, E>(&self, f: impl FnOnce(&mut ItemCollection) -> Result<T, E>) -> Result<T, Error>
    where Error: From<E>,
    {
        let mut items = self.items.write().map_err(|_| anyhow!(LIBRARY_WRITE_ERR))?;
        let mut updated = items.clone();
        let value = f(&mut updated)?;
        self.store.save(&updated.to_vec()).context("Failed to save the item collection")?;
        *items = updated;
        Ok(value)
    }

    pub fn needing_metadata(&self) -> Result<Vec<(ItemId, CanonicalUrl)>, ErrorContext> {
        Ok(self.read()?.needing_metadata())
    }

    pub fn url_of(&self, id: &ItemId) -> Result<Option<CanonicalUrl>, ErrorContext> {
        Ok(self.read()?.get(id).map(|item| item.url.clone()))
    }

    /// Merges resolved metadata into an item, if it still exists
    pub fn apply_metadata(&self, id: &ItemId, metadata: VideoMetadata) {
        let result = self.modify(|items| {
            if items.merge_metadata(id, metadata) {
                Ok(())
            } else {
                Err(Error::EmptyStatus(actix_web::http::StatusCode::NOT_FOUND))
            }
        });
        match result {
            Ok(()) => debug!("Stored metadata for item {id}"),
            Err(Error::EmptyStatus(_)) => debug!("Item {id} was removed before its metadata arrived"),
            Err(err) => warn!("Failed to store metadata for item {id}: {err:?}"),
        }
    }
}

#[derive(Default)]
struct PassState {
    generation: u64,
    current: Option<PassHandle>,
    last: Option<PassSummary>,
}

/// Keeps at most one resolution pass running
pub struct PassScheduler {
    resolver: Arc<MetadataResolver>,
    library: LibraryLock,
    state: Arc<Mutex<PassState>>,
}

impl PassScheduler {
    pub fn new(resolver: Arc<MetadataResolver>, library: LibraryLock) -> PassScheduler {
        PassScheduler { resolver, library, state: Arc::default() }
    }

    /// Cancels the running pass, if any, and starts a new one over the items still lacking metadata
    ///
    /// Returns `false` if there was nothing to resolve.
    pub fn restart(&self) -> Result<bool, ErrorContext> {
        let targets = self.library.needing_metadata()?;
        let mut state = self.state.lock().map_err(|_| anyhow!(PASS_LOCK_ERR))?;
        if let Some(previous) = state.current.take() {
            debug!("Cancelling the previous resolution pass");
            previous.cancel();
        }
        // results of older passes are discarded from here on
        state.generation += 1;
        if targets.is_empty() {
            debug!("No items need metadata, not starting a resolution pass");
            return Ok(false);
        }

        let generation = state.generation;
        let library = self.library.clone();
        let pass_state = self.state.clone();
        let (handle, pass) = start_pass(
            self.resolver.clone(),
            targets,
            move |id: &ItemId, metadata: VideoMetadata| apply_if_current(&pass_state, &library, generation, id, metadata),
        );
        state.current = Some(handle);
        drop(state);

        let state = self.state.clone();
        spawn(async move {
            let outcome = pass.await;
            let Ok(mut state) = state.lock() else {
                warn!("{PASS_LOCK_ERR}");
                return;
            };
            if state.generation != generation {
                return;
            }
            state.current = None;
            if let PassOutcome::Completed(report) = outcome {
                state.last = Some(PassSummary {
                    attempted: report.attempted,
                    resolved: report.resolved,
                    empty: report.empty,
                    finished_at: Utc::now().timestamp_millis(),
                });
            }
        });
        Ok(true)
    }

    /// Like [`PassScheduler::restart`], but only logs failures
    pub fn restart_logged(&self) {
        if let Err(err) = self.restart() {
            warn!("Failed to start a resolution pass: {err:?}");
        }
    }

    pub fn is_running(&self) -> Result<bool, ErrorContext> {
        Ok(self.state.lock().map_err(|_| anyhow!(PASS_LOCK_ERR))?.current.is_some())
    }

    pub fn last_pass(&self) -> Result<Option<PassSummary>, ErrorContext> {
        Ok(self.state.lock().map_err(|_| anyhow!(PASS_LOCK_ERR))?.last)
    }
}

/// Merges a pass result unless a newer pass has replaced the one that produced it
///
/// The pass state stays locked during the merge, so a restart either waits for it to finish or
/// turns it into a no-op.
fn apply_if_current(state: &Mutex<PassState>, library: &LibraryState, generation: u64, id: &ItemId, metadata: VideoMetadata) {
    let Ok(state) = state.lock() else {
        warn!("{PASS_LOCK_ERR}");
        return;
    };
    if state.generation != generation {
        debug!("Discarding metadata for item {id} from a superseded pass");
        return;
    }
    library.apply_metadata(id, metadata);
}

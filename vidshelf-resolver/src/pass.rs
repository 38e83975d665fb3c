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

use std::{future::Future, sync::Arc};

use futures::{future::{AbortHandle, Abortable, Aborted}, FutureExt};
use log::{debug, info};
use vidshelf_core::{CanonicalUrl, ItemId, VideoMetadata};

use crate::resolver::{MetadataResolver, ResolutionOutcome};

/// Receives the results of a resolution pass
pub trait MetadataSink: Send + Sync {
    fn apply(&self, id: &ItemId, metadata: VideoMetadata);
}

impl<F> MetadataSink for F
where F: Fn(&ItemId, VideoMetadata) + Send + Sync,
{
    fn apply(&self, id: &ItemId, metadata: VideoMetadata) {
        self(id, metadata);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub attempted: usize,
    pub resolved: usize,
    pub empty: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed(PassReport),
    Cancelled,
}

/// Owned handle to a running resolution pass
///
/// Dropping the handle cancels the pass.
#[derive(Debug)]
pub struct PassHandle {
    abort: AbortHandle,
}

impl PassHandle {
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

impl Drop for PassHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Prepares a pass resolving `targets` one at a time, in order
///
/// The returned future does nothing until polled. Once the handle is cancelled, the in-flight
/// request is dropped and no further results reach the sink. A cancel issued from another thread
/// can still race with a result that already passed the check, so sinks shared between passes
/// have to tell stale results apart themselves.
pub fn start_pass<S>(
    resolver: Arc<MetadataResolver>,
    targets: Vec<(ItemId, CanonicalUrl)>,
    sink: S,
) -> (PassHandle, impl Future<Output = PassOutcome> + Send + 'static)
where S: MetadataSink + 'static,
{
    let (abort, registration) = AbortHandle::new_pair();
    let cancelled = abort.clone();
    let work = async move {
        info!("Resolution pass started for {} items", targets.len());
        let mut report = PassReport::default();
        for (id, url) in targets {
            report.attempted += 1;
            let outcome = resolver.resolve(&url).await;
            if cancelled.is_aborted() {
                debug!("Discarding result for {id}, pass was cancelled");
                return None;
            }
            match outcome {
                ResolutionOutcome::Resolved { metadata, .. } => {
                    sink.apply(&id, metadata);
                    report.resolved += 1;
                },
                ResolutionOutcome::Empty => report.empty += 1,
            }
        }
        Some(report)
    };
    let pass = Abortable::new(work, registration).map(|result| match result {
        Ok(Some(report)) => {
            info!("Resolution pass finished: {report:?}");
            PassOutcome::Completed(report)
        },
        Ok(None) | Err(Aborted) => {
            info!("Resolution pass cancelled");
            PassOutcome::Cancelled
        },
    });
    (PassHandle { abort }, pass)
}

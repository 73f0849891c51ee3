//! Batch store with atomic replacement and last-write-wins publication.
//!
//! Readers take an `Arc` snapshot and keep it until they finish; a refresh
//! builds a complete new batch and swaps it in. Views computed from a batch
//! that has since been replaced are discarded on publish.

use std::sync::Arc;

use campaign_core::Record;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::index::RecordIndex;

/// An immutable batch plus the generation it was installed as.
#[derive(Debug)]
pub struct Batch {
    pub generation: u64,
    pub index: RecordIndex,
    pub loaded_at: DateTime<Utc>,
}

pub struct BatchStore {
    current: RwLock<Arc<Batch>>,
}

impl BatchStore {
    /// Create a store holding an empty generation-0 batch.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Batch {
                generation: 0,
                index: RecordIndex::default(),
                loaded_at: Utc::now(),
            })),
        }
    }

    /// Build a new batch from `records` and install it. The index is built
    /// before the lock is taken.
    pub fn replace(&self, records: Vec<Record>) -> Arc<Batch> {
        let index = RecordIndex::new(records);
        let mut current = self.current.write();
        let batch = Arc::new(Batch {
            generation: current.generation + 1,
            index,
            loaded_at: Utc::now(),
        });
        *current = batch.clone();

        info!(
            generation = batch.generation,
            rows = batch.index.len(),
            anchor = ?batch.index.anchor(),
            "Batch replaced"
        );
        batch
    }

    pub fn snapshot(&self) -> Arc<Batch> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Run `f` only if `generation` is still current, holding the store's
    /// read lock so no `replace` can land until `f` returns.
    pub fn with_current<R>(&self, generation: u64, f: impl FnOnce() -> R) -> Option<R> {
        let current = self.current.read();
        if current.generation != generation {
            return None;
        }
        Some(f())
    }
}

impl Default for BatchStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A computed view tagged with the batch generation it came from.
#[derive(Debug, Clone)]
pub struct Published<T> {
    pub generation: u64,
    pub value: T,
}

/// Latest published result of one view.
pub struct ViewSlot<T> {
    latest: RwLock<Option<Arc<Published<T>>>>,
}

impl<T> ViewSlot<T> {
    pub fn new() -> Self {
        Self {
            latest: RwLock::new(None),
        }
    }

    /// Publish `value` computed from batch `generation`. Returns `false` and
    /// drops the value when the store has moved past that generation or a
    /// newer result is already published.
    pub fn publish(&self, store: &BatchStore, generation: u64, value: T) -> bool {
        let outcome = store.with_current(generation, || {
            let mut latest = self.latest.write();
            if latest.as_ref().is_some_and(|p| p.generation > generation) {
                debug!(generation, "Discarding result older than published view");
                return false;
            }
            *latest = Some(Arc::new(Published { generation, value }));
            true
        });

        outcome.unwrap_or_else(|| {
            debug!(generation, "Discarding result from superseded batch");
            false
        })
    }

    pub fn latest(&self) -> Option<Arc<Published<T>>> {
        self.latest.read().clone()
    }
}

impl<T> Default for ViewSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

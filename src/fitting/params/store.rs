//! Versioned single-owner store for published parameter records.
//!
//! A [`ParamStore`] holds the current record of one parameter family behind
//! an `Arc`. Each [`ParamStore::publish`] replaces the record with a new
//! immutable value; readers that kept an older `Arc` keep a consistent view
//! and compare versions to detect staleness.
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Lifecycle of a parameter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreState {
    /// Nothing published yet.
    Uninitialized,
    /// Built-in defaults published.
    Default,
    /// At least one override merged since the defaults.
    Active,
}

/// `ParamStore` — current record, lifecycle state and version counter.
#[derive(Debug, Clone)]
pub struct ParamStore<T> {
    state: StoreState,
    current: Option<Arc<T>>,
    version: u64,
}

impl<T> ParamStore<T> {
    pub fn new() -> ParamStore<T> {
        ParamStore { state: StoreState::Uninitialized, current: None, version: 0 }
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Number of records published so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_deref()
    }

    /// Shared handle to the current record.
    pub fn snapshot(&self) -> Option<Arc<T>> {
        self.current.clone()
    }

    /// Publish `record` and advance the lifecycle. Returns the new version.
    pub fn publish(&mut self, record: T) -> u64 {
        self.state = match self.state {
            StoreState::Uninitialized => StoreState::Default,
            StoreState::Default | StoreState::Active => StoreState::Active,
        };
        self.current = Some(Arc::new(record));
        self.version += 1;
        self.version
    }
}

impl<T> Default for ParamStore<T> {
    fn default() -> ParamStore<T> {
        ParamStore::new()
    }
}

// src/catalog.rs
//! Published catalog snapshots.
//!
//! A [`Catalog`] is immutable once built. [`CatalogStore`] holds an
//! `Arc<Catalog>` behind a lock that is only ever held long enough to clone or
//! replace that `Arc`, so a refresh never stalls readers and a reader never
//! sees records from two different refreshes.

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

use crate::ingest::types::{ProgramRecord, RefreshReport};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    version: u64,
    refreshed_at: Option<DateTime<Utc>>,
    programs: Vec<ProgramRecord>,
    report: RefreshReport,
}

impl Catalog {
    /// Version 0, never refreshed. What readers see before the first publish.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Unpublished catalog over `programs`; handy for recommendation tests.
    pub fn from_programs(programs: Vec<ProgramRecord>) -> Self {
        Self {
            programs,
            ..Self::default()
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn programs(&self) -> &[ProgramRecord] {
        &self.programs
    }

    pub fn report(&self) -> &RefreshReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// Single-writer, multi-reader handle to the current snapshot.
#[derive(Clone, Debug)]
pub struct CatalogStore {
    inner: Arc<RwLock<Arc<Catalog>>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(Catalog::empty()))),
        }
    }

    /// The snapshot current at the time of the call. Later publishes do not
    /// affect it.
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.inner.read().expect("catalog lock poisoned"))
    }

    /// Replace the current snapshot wholesale. The new version is one past
    /// the snapshot it replaces.
    pub fn publish(&self, programs: Vec<ProgramRecord>, report: RefreshReport) -> Arc<Catalog> {
        let refreshed_at = Utc::now();
        let mut guard = self.inner.write().expect("catalog lock poisoned");
        let next = Arc::new(Catalog {
            version: guard.version + 1,
            refreshed_at: Some(refreshed_at),
            programs,
            report,
        });
        *guard = Arc::clone(&next);
        next
    }
}

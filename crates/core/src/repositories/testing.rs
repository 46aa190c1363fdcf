//! Store wrappers for exercising failure paths in tests.

use crate::error::{StoreError, StoreResult};
use crate::store::{Record, Store, Table, TableStore};
use crate::RecordId;
use std::collections::HashSet;

/// Delegates to a [`TableStore`] but rejects writes to selected tables.
#[derive(Debug)]
pub(crate) struct FlakyStore {
    pub(crate) inner: TableStore,
    failing_inserts: HashSet<Table>,
    failing_updates: HashSet<Table>,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: TableStore::in_memory(),
            failing_inserts: HashSet::new(),
            failing_updates: HashSet::new(),
        }
    }

    pub(crate) fn fail_inserts(mut self, table: Table) -> Self {
        self.failing_inserts.insert(table);
        self
    }

    pub(crate) fn fail_updates(mut self, table: Table) -> Self {
        self.failing_updates.insert(table);
        self
    }

    fn refuse(table: Table) -> StoreError {
        StoreError::Rejected(format!("{table} is read-only in this test"))
    }
}

impl Store for FlakyStore {
    fn select_all<R: Record>(&self) -> StoreResult<Vec<R>> {
        self.inner.select_all()
    }

    fn insert<R: Record>(&self, row: R) -> StoreResult<R> {
        if self.failing_inserts.contains(&R::TABLE) {
            return Err(Self::refuse(R::TABLE));
        }
        self.inner.insert(row)
    }

    fn update<R, F>(&self, id: RecordId, patch: F) -> StoreResult<R>
    where
        R: Record,
        F: FnOnce(&mut R) -> StoreResult<()>,
    {
        if self.failing_updates.contains(&R::TABLE) {
            return Err(Self::refuse(R::TABLE));
        }
        self.inner.update(id, patch)
    }

    fn insert_with<R, F>(&self, build: F) -> StoreResult<R>
    where
        R: Record,
        F: FnOnce(&[R]) -> StoreResult<R>,
    {
        if self.failing_inserts.contains(&R::TABLE) {
            return Err(Self::refuse(R::TABLE));
        }
        self.inner.insert_with(build)
    }
}

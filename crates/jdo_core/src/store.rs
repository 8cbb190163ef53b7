//! Datastore seam used by the runtime to load and flush field values.

use crate::error::{LifecycleError, LifecycleResult};
use crate::types::{FieldNumber, FieldValue, ObjectId};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Row storage behind a [`Session`](crate::Session).
///
/// A row is the full list of field values of one instance, in field-number
/// order. The datastore knows nothing about lifecycle states; the runtime
/// decides what to write from the state flags at flush time.
///
/// # Invariants
///
/// - `insert` fails for an ID that already has a row
/// - `fetch`, `update` and `delete` fail for an ID without a row
/// - Implementations must be `Send + Sync` so a store can be shared
pub trait Datastore: Send + Sync {
    /// Returns the row of `id`.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` if there is no row for `id`.
    fn fetch(&self, id: ObjectId) -> LifecycleResult<Vec<FieldValue>>;

    /// Inserts a new row.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateObject` if a row for `id` already exists.
    fn insert(&self, id: ObjectId, values: Vec<FieldValue>) -> LifecycleResult<()>;

    /// Overwrites the listed fields of an existing row.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` if there is no row for `id`.
    fn update(&self, id: ObjectId, changes: &[(FieldNumber, FieldValue)]) -> LifecycleResult<()>;

    /// Removes a row.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` if there is no row for `id`.
    fn delete(&self, id: ObjectId) -> LifecycleResult<()>;
}

/// A datastore holding rows in memory.
///
/// Suitable for tests, benchmarks and the CLI simulator. Thread-safe; the
/// rows sit behind a read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    rows: RwLock<BTreeMap<ObjectId, Vec<FieldValue>>>,
}

impl InMemoryDatastore {
    /// Creates an empty datastore.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Whether the datastore holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Whether a row exists for `id`.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.rows.read().contains_key(&id)
    }

    /// Returns a copy of the row of `id`, if any.
    #[must_use]
    pub fn row(&self, id: ObjectId) -> Option<Vec<FieldValue>> {
        self.rows.read().get(&id).cloned()
    }
}

impl Datastore for InMemoryDatastore {
    fn fetch(&self, id: ObjectId) -> LifecycleResult<Vec<FieldValue>> {
        self.row(id)
            .ok_or(LifecycleError::ObjectNotFound { object: id })
    }

    fn insert(&self, id: ObjectId, values: Vec<FieldValue>) -> LifecycleResult<()> {
        let mut rows = self.rows.write();
        if rows.contains_key(&id) {
            return Err(LifecycleError::DuplicateObject { object: id });
        }
        rows.insert(id, values);
        Ok(())
    }

    fn update(&self, id: ObjectId, changes: &[(FieldNumber, FieldValue)]) -> LifecycleResult<()> {
        let mut rows = self.rows.write();
        let row = rows
            .get_mut(&id)
            .ok_or(LifecycleError::ObjectNotFound { object: id })?;
        for (number, value) in changes {
            if *number >= row.len() {
                row.resize(number + 1, FieldValue::Null);
            }
            row[*number] = value.clone();
        }
        Ok(())
    }

    fn delete(&self, id: ObjectId) -> LifecycleResult<()> {
        self.rows
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(LifecycleError::ObjectNotFound { object: id })
    }
}

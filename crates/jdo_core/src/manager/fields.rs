//! Per-instance field cache.

use crate::types::{FieldNumber, FieldValue};

/// Values, loaded flags and dirty flags of one instance, plus an optional
/// snapshot for rollback.
///
/// The cache does not know about primary keys or fetch plans; the
/// [`StateManager`](super::StateManager) decides which fields to touch.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCache {
    values: Vec<FieldValue>,
    loaded: Vec<bool>,
    dirty: Vec<bool>,
    saved: Option<Snapshot>,
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    values: Vec<FieldValue>,
    loaded: Vec<bool>,
    dirty: Vec<bool>,
}

impl FieldCache {
    /// Creates a cache of `count` unloaded fields.
    #[must_use]
    pub fn unloaded(count: usize) -> Self {
        Self {
            values: vec![FieldValue::Null; count],
            loaded: vec![false; count],
            dirty: vec![false; count],
            saved: None,
        }
    }

    /// Creates a cache with every field loaded and clean.
    #[must_use]
    pub fn with_values(values: Vec<FieldValue>) -> Self {
        let count = values.len();
        Self {
            values,
            loaded: vec![true; count],
            dirty: vec![false; count],
            saved: None,
        }
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the cache has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Current value of field `n`; `Null` when unloaded.
    #[must_use]
    pub fn value(&self, n: FieldNumber) -> &FieldValue {
        &self.values[n]
    }

    /// All current values in field-number order.
    #[must_use]
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Whether field `n` holds a loaded value.
    #[must_use]
    pub fn is_loaded(&self, n: FieldNumber) -> bool {
        self.loaded[n]
    }

    /// Whether field `n` was written since the last flush.
    #[must_use]
    pub fn is_dirty(&self, n: FieldNumber) -> bool {
        self.dirty[n]
    }

    /// Whether a rollback snapshot is held.
    #[must_use]
    pub fn has_saved(&self) -> bool {
        self.saved.is_some()
    }

    /// Stores a value written by the application: loaded and dirty.
    pub fn set(&mut self, n: FieldNumber, value: FieldValue) {
        self.values[n] = value;
        self.loaded[n] = true;
        self.dirty[n] = true;
    }

    /// Stores a value read from the datastore: loaded and clean.
    pub fn load(&mut self, n: FieldNumber, value: FieldValue) {
        self.values[n] = value;
        self.loaded[n] = true;
        self.dirty[n] = false;
    }

    /// Drops the value of field `n`.
    pub fn unload(&mut self, n: FieldNumber) {
        self.values[n] = FieldValue::Null;
        self.loaded[n] = false;
        self.dirty[n] = false;
    }

    /// Marks field `n` unloaded but keeps its value.
    pub fn mark_unloaded(&mut self, n: FieldNumber) {
        self.loaded[n] = false;
    }

    /// Marks every field loaded, as held by a plain value.
    pub fn mark_all_loaded(&mut self) {
        self.loaded.fill(true);
    }

    /// Field numbers currently loaded.
    #[must_use]
    pub fn loaded_fields(&self) -> Vec<FieldNumber> {
        self.positions(&self.loaded, true)
    }

    /// Field numbers currently unloaded.
    #[must_use]
    pub fn unloaded_fields(&self) -> Vec<FieldNumber> {
        self.positions(&self.loaded, false)
    }

    /// Dirty fields with their values, for an update.
    #[must_use]
    pub fn dirty_fields(&self) -> Vec<(FieldNumber, FieldValue)> {
        self.positions(&self.dirty, true)
            .into_iter()
            .map(|n| (n, self.values[n].clone()))
            .collect()
    }

    /// Clears every dirty flag after a flush.
    pub fn clear_dirty(&mut self) {
        self.dirty.fill(false);
    }

    /// Takes a rollback snapshot, replacing any previous one.
    pub fn save(&mut self) {
        self.saved = Some(Snapshot {
            values: self.values.clone(),
            loaded: self.loaded.clone(),
            dirty: self.dirty.clone(),
        });
    }

    /// Restores and discards the snapshot. Returns `false` when there was
    /// none.
    pub fn restore(&mut self) -> bool {
        match self.saved.take() {
            Some(snapshot) => {
                self.values = snapshot.values;
                self.loaded = snapshot.loaded;
                self.dirty = snapshot.dirty;
                true
            }
            None => false,
        }
    }

    /// Discards the snapshot.
    pub fn clear_saved(&mut self) {
        self.saved = None;
    }

    fn positions(&self, flags: &[bool], wanted: bool) -> Vec<FieldNumber> {
        flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag == wanted)
            .map(|(n, _)| n)
            .collect()
    }
}

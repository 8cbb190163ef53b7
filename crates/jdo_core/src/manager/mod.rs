//! Runtime owner of one managed instance.
//!
//! [`StateManager`] is the concrete [`InstanceController`]: it holds the
//! field cache and the current lifecycle state, forwards every lifecycle
//! operation to that state and applies the side effects the state asks for
//! against a [`Datastore`].

mod fields;

pub use fields::FieldCache;

use crate::error::{LifecycleError, LifecycleResult};
use crate::metadata::{ClassMetadata, FetchPlan};
use crate::state::{InstanceController, LifecycleState, Operation, StateType, TransitionRequest};
use crate::store::Datastore;
use crate::transaction::{LocalTransaction, Transaction};
use crate::types::{FieldNumber, FieldValue, ObjectId};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Controller of one managed instance.
///
/// The current state is only ever replaced by the value a transition
/// returns. A failed transition leaves both the state and the field cache
/// as they were, except for fields already loaded from the datastore.
pub struct StateManager {
    id: ObjectId,
    class: Arc<ClassMetadata>,
    tx: Arc<LocalTransaction>,
    store: Arc<dyn Datastore>,
    fetch_plan: FetchPlan,
    fields: FieldCache,
    state: &'static LifecycleState,
    enlisted: bool,
    connected: bool,
}

impl StateManager {
    /// Manages a new transient value with every field set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadata` when `values` does not hold exactly one
    /// value per declared field.
    pub fn transient(
        class: Arc<ClassMetadata>,
        tx: Arc<LocalTransaction>,
        store: Arc<dyn Datastore>,
        values: Vec<FieldValue>,
    ) -> LifecycleResult<Self> {
        if values.len() != class.field_count() {
            return Err(LifecycleError::invalid_metadata(
                class.name(),
                format!(
                    "expected {} field values, got {}",
                    class.field_count(),
                    values.len()
                ),
            ));
        }
        Ok(Self {
            id: ObjectId::new(),
            class,
            tx,
            store,
            fetch_plan: FetchPlan::default(),
            fields: FieldCache::with_values(values),
            state: StateType::Transient.state(),
            enlisted: false,
            connected: true,
        })
    }

    /// Manages the datastore row `id` as a hollow instance: primary key
    /// fields loaded, everything else unloaded.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` when the datastore has no row for `id`.
    pub fn hollow(
        id: ObjectId,
        class: Arc<ClassMetadata>,
        tx: Arc<LocalTransaction>,
        store: Arc<dyn Datastore>,
    ) -> LifecycleResult<Self> {
        let row = store.fetch(id)?;
        let mut fields = FieldCache::unloaded(class.field_count());
        for n in class.primary_key_fields() {
            fields.load(n, row.get(n).cloned().unwrap_or_default());
        }
        Ok(Self {
            id,
            class,
            tx,
            store,
            fetch_plan: FetchPlan::default(),
            fields,
            state: StateType::Hollow.state(),
            enlisted: false,
            connected: true,
        })
    }

    /// Identity of the instance.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> &'static LifecycleState {
        self.state
    }

    /// Identifier of the current lifecycle state.
    #[must_use]
    pub fn state_type(&self) -> StateType {
        self.state.state_type()
    }

    /// Class metadata of the instance.
    #[must_use]
    pub fn class(&self) -> &Arc<ClassMetadata> {
        &self.class
    }

    /// The field cache.
    #[must_use]
    pub fn fields(&self) -> &FieldCache {
        &self.fields
    }

    /// Active fetch plan.
    #[must_use]
    pub fn fetch_plan(&self) -> &FetchPlan {
        &self.fetch_plan
    }

    /// Replaces the active fetch plan.
    pub fn set_fetch_plan(&mut self, plan: FetchPlan) {
        self.fetch_plan = plan;
    }

    /// Whether the instance is registered with the current transaction.
    #[must_use]
    pub fn is_enlisted(&self) -> bool {
        self.enlisted
    }

    /// Whether the instance is still managed; false once it became a
    /// plain transient value.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Runs `request` against the current state and installs the result.
    ///
    /// # Errors
    ///
    /// Returns whatever the transition raises; the state is unchanged then.
    pub fn apply(&mut self, request: &TransitionRequest) -> LifecycleResult<StateType> {
        let tx = Arc::clone(&self.tx);
        let current = self.state;
        let next = current.apply(self, tx.as_ref(), request)?;
        self.state = next;
        Ok(next.state_type())
    }

    /// Makes a transient instance persistent.
    pub fn make_persistent(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::MakePersistent)
    }

    /// Deletes the instance at the next flush.
    pub fn delete_persistent(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::DeletePersistent)
    }

    /// Enlists the instance in the current transaction.
    pub fn make_transactional(&mut self, refresh_fields: bool) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::MakeTransactional { refresh_fields })
    }

    /// Removes the instance from transaction bookkeeping.
    pub fn make_nontransactional(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::MakeNontransactional)
    }

    /// Turns the instance into a plain value.
    pub fn make_transient(&mut self, use_fetch_plan: bool) -> LifecycleResult<StateType> {
        let detach_all_on_commit = self.tx.options().detach_all_on_commit;
        self.apply(&TransitionRequest::MakeTransient {
            use_fetch_plan,
            detach_all_on_commit,
        })
    }

    /// Reloads the fetch plan from the datastore.
    pub fn refresh(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::Refresh)
    }

    /// Drops cached values.
    pub fn evict(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::Evict)
    }

    /// Loads the active fetch plan, or every field when `fg_only` is false.
    pub fn retrieve(&mut self, fg_only: bool) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::Retrieve { fg_only })
    }

    /// Loads the fields selected by `plan`.
    pub fn retrieve_with(&mut self, plan: &FetchPlan) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::RetrieveWith(plan.clone()))
    }

    /// Detaches the instance.
    ///
    /// Inside a transaction a persistent instance with pending changes is
    /// refused, since rollback could no longer undo them once detached.
    /// Outside a transaction the changes of a `P_NONTRANS_DIRTY` instance
    /// are written through first so the detached copy matches the
    /// datastore.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for a dirty instance in an active
    /// transaction, or whatever the flush or the transition raises.
    pub fn detach(&mut self) -> LifecycleResult<StateType> {
        let pending =
            self.state.is_persistent() && self.state.is_dirty() && !self.state.is_deleted();
        if pending {
            if self.tx.is_active() {
                return Err(LifecycleError::invalid_operation(
                    self.id,
                    self.state.state_type(),
                    Operation::Detach,
                    "pending changes must be committed before detaching",
                ));
            }
            self.flush()?;
        }
        self.apply(&TransitionRequest::Detach)
    }

    /// Reattaches a detached instance.
    pub fn attach(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::Attach)
    }

    /// Prepares the instance for serialization.
    pub fn serialize(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::Serialize)
    }

    pub(crate) fn begin(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::Begin)
    }

    pub(crate) fn commit(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::Commit)
    }

    pub(crate) fn rollback(&mut self) -> LifecycleResult<StateType> {
        self.apply(&TransitionRequest::Rollback)
    }

    /// Reads field `n`, loading it from the datastore when the state allows
    /// the read but the value is not cached.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for an undeclared field, or whatever the read
    /// transition or the load raises.
    pub fn read_field(&mut self, n: FieldNumber) -> LifecycleResult<FieldValue> {
        self.check_field(n)?;
        let is_loaded = self.fields.is_loaded(n);
        self.apply(&TransitionRequest::ReadField { is_loaded })?;
        if !self.fields.is_loaded(n) && self.connected && self.state.is_persistent() {
            self.load_fields(&[n])?;
        }
        Ok(self.fields.value(n).clone())
    }

    /// Reads a field by name.
    pub fn read_field_named(&mut self, name: &str) -> LifecycleResult<FieldValue> {
        let n = self.class.require_field(name)?;
        self.read_field(n)
    }

    /// Writes field `n`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for an undeclared field, `InvalidOperation`
    /// when changing the primary key of a stored instance, or whatever the
    /// write transition raises.
    pub fn write_field(&mut self, n: FieldNumber, value: FieldValue) -> LifecycleResult<()> {
        self.check_field(n)?;
        if self.class.is_primary_key(n) && self.state.is_persistent() && !self.state.is_new() {
            return Err(LifecycleError::invalid_operation(
                self.id,
                self.state.state_type(),
                Operation::WriteField,
                "primary key fields of a stored instance are immutable",
            ));
        }
        self.apply(&TransitionRequest::WriteField)?;
        self.fields.set(n, value);
        Ok(())
    }

    /// Writes a field by name.
    pub fn write_field_named(&mut self, name: &str, value: FieldValue) -> LifecycleResult<()> {
        let n = self.class.require_field(name)?;
        self.write_field(n, value)
    }

    /// Writes pending changes to the datastore according to the state
    /// flags: new instances are inserted, deleted ones removed, dirty ones
    /// updated. An instance made persistent and deleted in the same
    /// transaction never reaches the datastore.
    ///
    /// # Errors
    ///
    /// Returns the datastore error; dirty flags are kept then.
    pub fn flush(&mut self) -> LifecycleResult<()> {
        let state = self.state;
        if !state.is_persistent() {
            return Ok(());
        }

        match (state.is_new(), state.is_deleted()) {
            (true, true) => {}
            (true, false) => self.store.insert(self.id, self.fields.values().to_vec())?,
            (false, true) => self.store.delete(self.id)?,
            (false, false) => {
                let changes = self.fields.dirty_fields();
                if state.is_dirty() && !changes.is_empty() {
                    self.store.update(self.id, &changes)?;
                }
            }
        }

        trace!(object = %self.id, state = %state, "flushed");
        self.fields.clear_dirty();
        Ok(())
    }

    fn check_field(&self, n: FieldNumber) -> LifecycleResult<()> {
        if n < self.class.field_count() {
            Ok(())
        } else {
            Err(LifecycleError::unknown_field(self.class.name(), n))
        }
    }

    fn non_primary_key_fields(&self) -> Vec<FieldNumber> {
        (0..self.class.field_count())
            .filter(|n| !self.class.is_primary_key(*n))
            .collect()
    }

    fn unloaded_in(&self, numbers: Vec<FieldNumber>) -> Vec<FieldNumber> {
        numbers
            .into_iter()
            .filter(|n| !self.fields.is_loaded(*n))
            .collect()
    }

    fn load_fields(&mut self, numbers: &[FieldNumber]) -> LifecycleResult<()> {
        if numbers.is_empty() {
            return Ok(());
        }
        let row = self.store.fetch(self.id)?;
        for &n in numbers {
            self.fields.load(n, row.get(n).cloned().unwrap_or_default());
        }
        trace!(object = %self.id, fields = ?numbers, "loaded fields");
        Ok(())
    }
}

impl InstanceController for StateManager {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn class_metadata(&self) -> &ClassMetadata {
        &self.class
    }

    fn transaction(&self) -> &dyn Transaction {
        self.tx.as_ref()
    }

    fn save_fields(&mut self) {
        trace!(object = %self.id, "save fields");
        self.fields.save();
    }

    fn restore_fields(&mut self) {
        let restored = self.fields.restore();
        trace!(object = %self.id, restored, "restore fields");
    }

    fn clear_saved_fields(&mut self) {
        self.fields.clear_saved();
    }

    fn clear_non_primary_key_fields(&mut self) {
        for n in self.non_primary_key_fields() {
            self.fields.unload(n);
        }
    }

    fn clear_loaded_flags(&mut self) {
        for n in self.non_primary_key_fields() {
            self.fields.mark_unloaded(n);
        }
    }

    fn unload_non_fetch_plan_fields(&mut self) {
        let in_plan = self.class.fetch_plan_fields(&self.fetch_plan);
        for n in 0..self.class.field_count() {
            if !in_plan.contains(&n) {
                self.fields.unload(n);
            }
        }
    }

    fn load_unloaded_fields(&mut self) -> LifecycleResult<()> {
        let numbers = self.fields.unloaded_fields();
        self.load_fields(&numbers)
    }

    fn load_unloaded_fields_in_fetch_plan(&mut self) -> LifecycleResult<()> {
        let numbers = self.unloaded_in(self.class.fetch_plan_fields(&self.fetch_plan));
        self.load_fields(&numbers)
    }

    fn load_unloaded_fields_in_plan(&mut self, plan: &FetchPlan) -> LifecycleResult<()> {
        let numbers = self.unloaded_in(self.class.fetch_plan_fields(plan));
        self.load_fields(&numbers)
    }

    fn refresh_loaded_fields(&mut self) -> LifecycleResult<()> {
        let numbers = self.fields.loaded_fields();
        self.load_fields(&numbers)
    }

    fn refresh_fields_in_fetch_plan(&mut self) -> LifecycleResult<()> {
        let numbers = self.class.fetch_plan_fields(&self.fetch_plan);
        self.load_fields(&numbers)
    }

    fn enlist_in_transaction(&mut self) {
        self.enlisted = true;
    }

    fn evict_from_transaction(&mut self) {
        self.enlisted = false;
    }

    fn disconnect(&mut self) {
        self.fields.mark_all_loaded();
        self.connected = false;
    }
}

impl fmt::Debug for StateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("id", &self.id)
            .field("class", &self.class.name())
            .field("state", &self.state.state_type())
            .field("enlisted", &self.enlisted)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

//! Persistence context: one transaction, one datastore, the managed
//! instances.

use crate::config::TransactionOptions;
use crate::error::{LifecycleError, LifecycleResult};
use crate::manager::StateManager;
use crate::metadata::ClassMetadata;
use crate::state::{StateType, TransitionRequest};
use crate::store::{Datastore, InMemoryDatastore};
use crate::transaction::LocalTransaction;
use crate::types::{FieldValue, ObjectId, TransactionId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A persistence context.
///
/// The session owns the [`StateManager`] of every instance it manages and
/// drives them through transaction boundaries:
///
/// - `begin` notifies every instance (nontransactional dirty instances
///   snapshot and enlist)
/// - `commit` flushes the enlisted instances, then applies the commit
///   transition to each of them
/// - `rollback` applies the rollback transition without flushing
///
/// # Example
///
/// ```rust
/// use jdo_core::{ClassMetadata, FieldMetadata, Session, StateType, TransactionOptions};
/// use std::sync::Arc;
///
/// let class = Arc::new(
///     ClassMetadata::builder("Note")
///         .field(FieldMetadata::primary_key("id"))
///         .field(FieldMetadata::new("text"))
///         .build()
///         .unwrap(),
/// );
/// let mut session = Session::in_memory(TransactionOptions::default());
/// session.begin().unwrap();
/// let id = session.persist(&class, vec![1_i64.into(), "hello".into()]).unwrap();
/// session.commit().unwrap();
/// assert_eq!(session.object(id).unwrap().state_type(), StateType::Hollow);
/// ```
pub struct Session {
    tx: Arc<LocalTransaction>,
    store: Arc<dyn Datastore>,
    objects: BTreeMap<ObjectId, StateManager>,
}

impl Session {
    /// Creates a session over `store`.
    pub fn new(options: TransactionOptions, store: Arc<dyn Datastore>) -> Self {
        Self {
            tx: Arc::new(LocalTransaction::new(options)),
            store,
            objects: BTreeMap::new(),
        }
    }

    /// Creates a session over a fresh in-memory datastore.
    pub fn in_memory(options: TransactionOptions) -> Self {
        Self::new(options, Arc::new(InMemoryDatastore::new()))
    }

    /// The session's transaction.
    #[must_use]
    pub fn transaction(&self) -> &LocalTransaction {
        &self.tx
    }

    /// Transaction options.
    #[must_use]
    pub fn options(&self) -> &TransactionOptions {
        self.tx.options()
    }

    /// The datastore.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Datastore> {
        &self.store
    }

    /// Number of managed instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no instance is managed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// IDs of the managed instances.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Begins a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionAlreadyActive` when a transaction is open, or the
    /// first error raised by an instance's begin transition.
    pub fn begin(&mut self) -> LifecycleResult<TransactionId> {
        let id = self.tx.begin()?;
        info!(txn = %id, "transaction begin");
        for sm in self.objects.values_mut() {
            sm.begin()?;
        }
        Ok(id)
    }

    /// Commits the transaction.
    ///
    /// Enlisted instances are flushed first. With `detach_all_on_commit`,
    /// every surviving persistent instance then loads its fetch plan and
    /// detaches; the remaining enlisted instances get the commit
    /// transition.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotActive` outside a transaction. A flush error
    /// leaves the transaction open so the caller can roll back.
    pub fn commit(&mut self) -> LifecycleResult<TransactionId> {
        self.tx.ensure_active()?;
        let id = self.tx.id();

        for sm in self.objects.values_mut().filter(|sm| sm.is_enlisted()) {
            sm.flush()?;
        }

        // Already flushed, so detach through the bare transition.
        if self.tx.options().detach_all_on_commit {
            for sm in self.objects.values_mut() {
                let state = sm.state();
                if state.is_persistent() && !state.is_deleted() {
                    sm.retrieve(true)?;
                    sm.apply(&TransitionRequest::Detach)?;
                }
            }
        }

        for sm in self.objects.values_mut().filter(|sm| sm.is_enlisted()) {
            sm.commit()?;
        }

        self.tx.finish()?;
        info!(txn = %id, "transaction commit");
        Ok(id)
    }

    /// Rolls the transaction back. Nothing reaches the datastore.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotActive` outside a transaction.
    pub fn rollback(&mut self) -> LifecycleResult<TransactionId> {
        self.tx.ensure_active()?;
        let id = self.tx.id();

        for sm in self.objects.values_mut().filter(|sm| sm.is_enlisted()) {
            sm.rollback()?;
        }

        self.tx.finish()?;
        info!(txn = %id, "transaction rollback");
        Ok(id)
    }

    /// Makes a new instance of `class` persistent with the given field
    /// values. The row is inserted at the next commit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadata` when `values` does not match the class.
    pub fn persist(
        &mut self,
        class: &Arc<ClassMetadata>,
        values: Vec<FieldValue>,
    ) -> LifecycleResult<ObjectId> {
        let mut sm = StateManager::transient(
            Arc::clone(class),
            Arc::clone(&self.tx),
            Arc::clone(&self.store),
            values,
        )?;
        sm.make_persistent()?;
        let id = sm.id();
        debug!(object = %id, class = class.name(), "persist");
        self.objects.insert(id, sm);
        Ok(id)
    }

    /// Manages the stored row `id` as a hollow instance of `class`. An
    /// instance that is already managed is returned as is.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` when the datastore has no row for `id`.
    pub fn find(&mut self, class: &Arc<ClassMetadata>, id: ObjectId) -> LifecycleResult<ObjectId> {
        if self.objects.contains_key(&id) {
            return Ok(id);
        }
        let sm = StateManager::hollow(
            id,
            Arc::clone(class),
            Arc::clone(&self.tx),
            Arc::clone(&self.store),
        )?;
        self.objects.insert(id, sm);
        Ok(id)
    }

    /// The managed instance `id`.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` when the session does not manage `id`.
    pub fn object(&self, id: ObjectId) -> LifecycleResult<&StateManager> {
        self.objects
            .get(&id)
            .ok_or(LifecycleError::ObjectNotFound { object: id })
    }

    /// The managed instance `id`, mutably.
    ///
    /// # Errors
    ///
    /// Returns `ObjectNotFound` when the session does not manage `id`.
    pub fn object_mut(&mut self, id: ObjectId) -> LifecycleResult<&mut StateManager> {
        self.objects
            .get_mut(&id)
            .ok_or(LifecycleError::ObjectNotFound { object: id })
    }

    /// Current state of instance `id`.
    pub fn state_of(&self, id: ObjectId) -> LifecycleResult<StateType> {
        self.object(id).map(StateManager::state_type)
    }

    /// Evicts every instance that holds clean cached values. Dirty,
    /// deleted and unmanaged instances are left alone.
    ///
    /// # Errors
    ///
    /// Returns the first eviction error.
    pub fn evict_all(&mut self) -> LifecycleResult<()> {
        for sm in self.objects.values_mut() {
            let state = sm.state();
            if state.is_persistent() && !state.is_dirty() {
                sm.evict()?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tx", &self.tx)
            .field("objects", &self.objects)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FieldMetadata;
    use crate::transaction::Transaction;

    fn account() -> Arc<ClassMetadata> {
        Arc::new(
            ClassMetadata::builder("Account")
                .field(FieldMetadata::primary_key("number"))
                .field(FieldMetadata::new("balance"))
                .build()
                .unwrap(),
        )
    }

    fn values(number: &str, balance: i64) -> Vec<FieldValue> {
        vec![number.into(), FieldValue::Integer(balance)]
    }

    #[test]
    fn commit_inserts_new_instances() {
        let class = account();
        let mut session = Session::in_memory(TransactionOptions::default());
        session.begin().unwrap();
        let id = session.persist(&class, values("A-1", 10)).unwrap();
        assert_eq!(session.state_of(id).unwrap(), StateType::PersistentNew);

        session.commit().unwrap();
        assert_eq!(session.state_of(id).unwrap(), StateType::Hollow);
        assert!(session.store().fetch(id).is_ok());
        assert!(!session.transaction().is_active());
    }

    #[test]
    fn rollback_forgets_new_instances() {
        let class = account();
        let mut session = Session::in_memory(TransactionOptions::default());
        session.begin().unwrap();
        let id = session.persist(&class, values("A-1", 10)).unwrap();
        session.rollback().unwrap();

        assert_eq!(session.state_of(id).unwrap(), StateType::Transient);
        assert!(session.store().fetch(id).is_err());
    }

    #[test]
    fn commit_requires_active_transaction() {
        let mut session = Session::in_memory(TransactionOptions::default());
        assert!(matches!(
            session.commit(),
            Err(LifecycleError::TransactionNotActive)
        ));
        session.begin().unwrap();
        assert!(matches!(
            session.begin(),
            Err(LifecycleError::TransactionAlreadyActive)
        ));
    }

    #[test]
    fn delete_removes_row_on_commit() {
        let class = account();
        let mut session = Session::in_memory(TransactionOptions::default());
        session.begin().unwrap();
        let id = session.persist(&class, values("A-1", 10)).unwrap();
        session.commit().unwrap();

        session.begin().unwrap();
        let sm = session.object_mut(id).unwrap();
        sm.delete_persistent().unwrap();
        assert_eq!(sm.state_type(), StateType::PersistentDeleted);
        session.commit().unwrap();

        assert_eq!(session.state_of(id).unwrap(), StateType::Transient);
        assert!(session.store().fetch(id).is_err());
    }

    #[test]
    fn retain_values_keeps_cached_fields() {
        let class = account();
        let options = TransactionOptions::default()
            .retain_values(true)
            .nontransactional_read(true);
        let mut session = Session::in_memory(options);
        session.begin().unwrap();
        let id = session.persist(&class, values("A-1", 10)).unwrap();
        session.commit().unwrap();

        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.state_type(), StateType::PersistentNontransactional);
        assert_eq!(sm.read_field(1).unwrap(), FieldValue::Integer(10));
    }

    #[test]
    fn find_missing_row_fails() {
        let class = account();
        let mut session = Session::in_memory(TransactionOptions::default());
        let err = session.find(&class, ObjectId::new()).unwrap_err();
        assert!(matches!(err, LifecycleError::ObjectNotFound { .. }));
        assert!(session.is_empty());
    }

    #[test]
    fn detach_all_on_commit_detaches_with_fetch_plan() {
        let class = account();
        let options = TransactionOptions::default().detach_all_on_commit(true);
        let mut session = Session::in_memory(options);
        session.begin().unwrap();
        let id = session.persist(&class, values("A-1", 10)).unwrap();
        session.commit().unwrap();

        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.state_type(), StateType::DetachedClean);
        assert_eq!(sm.read_field(1).unwrap(), FieldValue::Integer(10));
    }

    #[test]
    fn evict_all_hollows_clean_instances() {
        let class = account();
        let options = TransactionOptions::default().retain_values(true);
        let mut session = Session::in_memory(options);
        session.begin().unwrap();
        let id = session.persist(&class, values("A-1", 10)).unwrap();
        session.commit().unwrap();

        session.evict_all().unwrap();
        let sm = session.object(id).unwrap();
        assert_eq!(sm.state_type(), StateType::Hollow);
        assert!(!sm.fields().is_loaded(1));
    }
}

//! Object lifecycle state machine.
//!
//! Every managed instance is in exactly one of the states enumerated by
//! [`StateType`]. Each state is a `'static` [`LifecycleState`] holding its
//! flags and a [`Transitions`] table with one function per operation. The
//! instance's [`InstanceController`] keeps a reference to the current state
//! and replaces it with whatever a transition returns.
//!
//! ## State flags
//!
//! | State | persistent | transactional | dirty | new | deleted |
//! |---|---|---|---|---|---|
//! | `TRANSIENT` | | | | | |
//! | `T_CLEAN` | | x | | | |
//! | `T_DIRTY` | | x | x | | |
//! | `P_NEW` | x | x | x | x | |
//! | `P_CLEAN` | x | x | | | |
//! | `P_DIRTY` | x | x | x | | |
//! | `HOLLOW` | x | | | | |
//! | `P_NEW_DELETED` | x | x | x | x | x |
//! | `P_DELETED` | x | x | x | | x |
//! | `P_NONTRANS` | x | | | | |
//! | `P_NONTRANS_DIRTY` | x | | x | | |
//! | `DETACHED_CLEAN` | | | | | |
//! | `DETACHED_DIRTY` | | | x | | |
//!
//! Flags are a capability query only. `HOLLOW` and `P_NONTRANS` share flags
//! but answer reads differently, so legality is always decided by the table
//! of the state itself.
//!
//! ## Side effects of a state change
//!
//! Moving from a transactional to a non-transactional state evicts the
//! instance from its transaction; the reverse enlists it. Entering
//! `TRANSIENT` disconnects the instance from its controller.

mod common;
mod controller;
mod operation;
mod recording;

mod detached_clean;
mod detached_dirty;
mod hollow;
mod persistent_clean;
mod persistent_deleted;
mod persistent_dirty;
mod persistent_new;
mod persistent_new_deleted;
mod persistent_nontransactional;
mod persistent_nontransactional_dirty;
mod transient;
mod transient_clean;
mod transient_dirty;

pub use controller::InstanceController;
pub use operation::{Operation, TransitionRequest};
pub use recording::{ControllerCall, RecordingController};

use crate::error::{LifecycleError, LifecycleResult};
use crate::metadata::FetchPlan;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Outcome of a transition: the state that becomes current.
pub type Transition = LifecycleResult<&'static LifecycleState>;

type Plain = fn(&'static LifecycleState, &mut dyn InstanceController) -> Transition;
type WithFlag = fn(&'static LifecycleState, &mut dyn InstanceController, bool) -> Transition;
type WithFlags =
    fn(&'static LifecycleState, &mut dyn InstanceController, bool, bool) -> Transition;
type WithTx =
    fn(&'static LifecycleState, &mut dyn InstanceController, &dyn Transaction) -> Transition;
type WithPlan =
    fn(&'static LifecycleState, &mut dyn InstanceController, &FetchPlan) -> Transition;

/// Identifier of a lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateType {
    /// Not managed.
    #[serde(rename = "TRANSIENT")]
    Transient,
    /// Transient, enlisted in the transaction, unmodified.
    #[serde(rename = "T_CLEAN")]
    TransientClean,
    /// Transient, enlisted in the transaction, modified.
    #[serde(rename = "T_DIRTY")]
    TransientDirty,
    /// Made persistent in the current transaction.
    #[serde(rename = "P_NEW")]
    PersistentNew,
    /// Persistent and transactional, unmodified.
    #[serde(rename = "P_CLEAN")]
    PersistentClean,
    /// Persistent and transactional, modified.
    #[serde(rename = "P_DIRTY")]
    PersistentDirty,
    /// Persistent with no field values loaded.
    #[serde(rename = "HOLLOW")]
    Hollow,
    /// Made persistent and deleted in the current transaction.
    #[serde(rename = "P_NEW_DELETED")]
    PersistentNewDeleted,
    /// Deleted in the current transaction.
    #[serde(rename = "P_DELETED")]
    PersistentDeleted,
    /// Persistent, values cached outside any transaction.
    #[serde(rename = "P_NONTRANS")]
    PersistentNontransactional,
    /// Persistent, modified outside any transaction.
    #[serde(rename = "P_NONTRANS_DIRTY")]
    PersistentNontransactionalDirty,
    /// Detached copy, unmodified.
    #[serde(rename = "DETACHED_CLEAN")]
    DetachedClean,
    /// Detached copy, modified.
    #[serde(rename = "DETACHED_DIRTY")]
    DetachedDirty,
}

impl StateType {
    /// All states in declaration order.
    pub const ALL: [StateType; 13] = [
        StateType::Transient,
        StateType::TransientClean,
        StateType::TransientDirty,
        StateType::PersistentNew,
        StateType::PersistentClean,
        StateType::PersistentDirty,
        StateType::Hollow,
        StateType::PersistentNewDeleted,
        StateType::PersistentDeleted,
        StateType::PersistentNontransactional,
        StateType::PersistentNontransactionalDirty,
        StateType::DetachedClean,
        StateType::DetachedDirty,
    ];

    /// Short code, e.g. `P_CLEAN`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            StateType::Transient => "TRANSIENT",
            StateType::TransientClean => "T_CLEAN",
            StateType::TransientDirty => "T_DIRTY",
            StateType::PersistentNew => "P_NEW",
            StateType::PersistentClean => "P_CLEAN",
            StateType::PersistentDirty => "P_DIRTY",
            StateType::Hollow => "HOLLOW",
            StateType::PersistentNewDeleted => "P_NEW_DELETED",
            StateType::PersistentDeleted => "P_DELETED",
            StateType::PersistentNontransactional => "P_NONTRANS",
            StateType::PersistentNontransactionalDirty => "P_NONTRANS_DIRTY",
            StateType::DetachedClean => "DETACHED_CLEAN",
            StateType::DetachedDirty => "DETACHED_DIRTY",
        }
    }

    /// The behavior object for this state.
    #[must_use]
    pub fn state(self) -> &'static LifecycleState {
        match self {
            StateType::Transient => &transient::STATE,
            StateType::TransientClean => &transient_clean::STATE,
            StateType::TransientDirty => &transient_dirty::STATE,
            StateType::PersistentNew => &persistent_new::STATE,
            StateType::PersistentClean => &persistent_clean::STATE,
            StateType::PersistentDirty => &persistent_dirty::STATE,
            StateType::Hollow => &hollow::STATE,
            StateType::PersistentNewDeleted => &persistent_new_deleted::STATE,
            StateType::PersistentDeleted => &persistent_deleted::STATE,
            StateType::PersistentNontransactional => &persistent_nontransactional::STATE,
            StateType::PersistentNontransactionalDirty => {
                &persistent_nontransactional_dirty::STATE
            }
            StateType::DetachedClean => &detached_clean::STATE,
            StateType::DetachedDirty => &detached_dirty::STATE,
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StateType {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        StateType::ALL
            .into_iter()
            .find(|state| state.code() == normalized)
            .ok_or_else(|| ParseNameError::new("state", s))
    }
}

/// Error returned when parsing a state or operation name fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseNameError {
    kind: &'static str,
    value: String,
}

impl ParseNameError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// One function per lifecycle operation.
///
/// Every state spells out all entries; there is no inherited default, so a
/// new operation forces a decision in each state.
pub(crate) struct Transitions {
    pub make_persistent: Plain,
    pub delete_persistent: Plain,
    pub make_transactional: WithFlag,
    pub make_nontransactional: Plain,
    pub make_transient: WithFlags,
    pub commit: WithTx,
    pub rollback: WithTx,
    pub refresh: Plain,
    pub evict: Plain,
    pub read_field: WithFlag,
    pub write_field: Plain,
    pub retrieve: WithFlag,
    pub retrieve_fetch_plan: WithPlan,
    pub detach: Plain,
    pub attach: Plain,
    pub serialize: Plain,
    pub begin: WithTx,
}

/// Immutable behavior object for one lifecycle state.
///
/// There is exactly one instance per [`StateType`], obtained through
/// [`StateType::state`]. Two references are equal when they name the same
/// state.
pub struct LifecycleState {
    state_type: StateType,
    persistent: bool,
    transactional: bool,
    dirty: bool,
    new: bool,
    deleted: bool,
    transitions: Transitions,
}

impl LifecycleState {
    /// Returns the state identifier.
    #[must_use]
    pub fn state_type(&self) -> StateType {
        self.state_type
    }

    /// Whether the instance is backed by a datastore row.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Whether the instance is enlisted in the current transaction.
    #[must_use]
    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    /// Whether in-memory values differ from the last clean snapshot.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the instance was made persistent in the current transaction.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.new
    }

    /// Whether deletion was requested in the current transaction.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Makes a transient instance persistent.
    pub fn transition_make_persistent(
        &'static self,
        ctl: &mut dyn InstanceController,
    ) -> Transition {
        (self.transitions.make_persistent)(self, ctl)
    }

    /// Requests deletion of a persistent instance.
    pub fn transition_delete_persistent(
        &'static self,
        ctl: &mut dyn InstanceController,
    ) -> Transition {
        (self.transitions.delete_persistent)(self, ctl)
    }

    /// Enlists the instance in the current transaction, optionally
    /// reloading its loaded fields first.
    pub fn transition_make_transactional(
        &'static self,
        ctl: &mut dyn InstanceController,
        refresh_fields: bool,
    ) -> Transition {
        (self.transitions.make_transactional)(self, ctl, refresh_fields)
    }

    /// Removes the instance from transaction bookkeeping.
    pub fn transition_make_nontransactional(
        &'static self,
        ctl: &mut dyn InstanceController,
    ) -> Transition {
        (self.transitions.make_nontransactional)(self, ctl)
    }

    /// Detaches the instance from persistence entirely.
    pub fn transition_make_transient(
        &'static self,
        ctl: &mut dyn InstanceController,
        use_fetch_plan: bool,
        detach_all_on_commit: bool,
    ) -> Transition {
        (self.transitions.make_transient)(self, ctl, use_fetch_plan, detach_all_on_commit)
    }

    /// Applies end-of-transaction commit policy.
    pub fn transition_commit(
        &'static self,
        ctl: &mut dyn InstanceController,
        tx: &dyn Transaction,
    ) -> Transition {
        (self.transitions.commit)(self, ctl, tx)
    }

    /// Applies end-of-transaction rollback policy.
    pub fn transition_rollback(
        &'static self,
        ctl: &mut dyn InstanceController,
        tx: &dyn Transaction,
    ) -> Transition {
        (self.transitions.rollback)(self, ctl, tx)
    }

    /// Reloads fetch plan fields and drops the rest.
    pub fn transition_refresh(&'static self, ctl: &mut dyn InstanceController) -> Transition {
        (self.transitions.refresh)(self, ctl)
    }

    /// Drops cached values so the next access reloads them.
    pub fn transition_evict(&'static self, ctl: &mut dyn InstanceController) -> Transition {
        (self.transitions.evict)(self, ctl)
    }

    /// Gates a field read; `is_loaded` tells whether the field being read
    /// is already in the cache.
    pub fn transition_read_field(
        &'static self,
        ctl: &mut dyn InstanceController,
        is_loaded: bool,
    ) -> Transition {
        (self.transitions.read_field)(self, ctl, is_loaded)
    }

    /// Gates a field write.
    pub fn transition_write_field(&'static self, ctl: &mut dyn InstanceController) -> Transition {
        (self.transitions.write_field)(self, ctl)
    }

    /// Loads unloaded fields: the active fetch plan when `fg_only`,
    /// otherwise every field.
    pub fn transition_retrieve(
        &'static self,
        ctl: &mut dyn InstanceController,
        fg_only: bool,
    ) -> Transition {
        (self.transitions.retrieve)(self, ctl, fg_only)
    }

    /// Loads unloaded fields selected by `plan`.
    pub fn transition_retrieve_fetch_plan(
        &'static self,
        ctl: &mut dyn InstanceController,
        plan: &FetchPlan,
    ) -> Transition {
        (self.transitions.retrieve_fetch_plan)(self, ctl, plan)
    }

    /// Detaches the instance.
    pub fn transition_detach(&'static self, ctl: &mut dyn InstanceController) -> Transition {
        (self.transitions.detach)(self, ctl)
    }

    /// Reattaches a detached instance.
    pub fn transition_attach(&'static self, ctl: &mut dyn InstanceController) -> Transition {
        (self.transitions.attach)(self, ctl)
    }

    /// Prepares the instance for serialization.
    pub fn transition_serialize(&'static self, ctl: &mut dyn InstanceController) -> Transition {
        (self.transitions.serialize)(self, ctl)
    }

    /// Notifies the instance that a transaction began.
    pub fn transition_begin(
        &'static self,
        ctl: &mut dyn InstanceController,
        tx: &dyn Transaction,
    ) -> Transition {
        (self.transitions.begin)(self, ctl, tx)
    }

    /// Invokes the transition named by `request`.
    ///
    /// `tx` is passed to commit, rollback and begin; the other operations
    /// read the transaction through the controller.
    pub fn apply(
        &'static self,
        ctl: &mut dyn InstanceController,
        tx: &dyn Transaction,
        request: &TransitionRequest,
    ) -> Transition {
        match request {
            TransitionRequest::MakePersistent => self.transition_make_persistent(ctl),
            TransitionRequest::DeletePersistent => self.transition_delete_persistent(ctl),
            TransitionRequest::MakeTransactional { refresh_fields } => {
                self.transition_make_transactional(ctl, *refresh_fields)
            }
            TransitionRequest::MakeNontransactional => self.transition_make_nontransactional(ctl),
            TransitionRequest::MakeTransient {
                use_fetch_plan,
                detach_all_on_commit,
            } => self.transition_make_transient(ctl, *use_fetch_plan, *detach_all_on_commit),
            TransitionRequest::Commit => self.transition_commit(ctl, tx),
            TransitionRequest::Rollback => self.transition_rollback(ctl, tx),
            TransitionRequest::Refresh => self.transition_refresh(ctl),
            TransitionRequest::Evict => self.transition_evict(ctl),
            TransitionRequest::ReadField { is_loaded } => {
                self.transition_read_field(ctl, *is_loaded)
            }
            TransitionRequest::WriteField => self.transition_write_field(ctl),
            TransitionRequest::Retrieve { fg_only } => self.transition_retrieve(ctl, *fg_only),
            TransitionRequest::RetrieveWith(plan) => {
                self.transition_retrieve_fetch_plan(ctl, plan)
            }
            TransitionRequest::Detach => self.transition_detach(ctl),
            TransitionRequest::Attach => self.transition_attach(ctl),
            TransitionRequest::Serialize => self.transition_serialize(ctl),
            TransitionRequest::Begin => self.transition_begin(ctl, tx),
        }
    }

    /// Moves to `to`, enlisting, evicting or disconnecting the instance as
    /// the transactional flag of the two states requires. Leaving
    /// `P_NONTRANS_DIRTY` always evicts, since `begin` enlists it.
    pub(crate) fn change_state(
        &'static self,
        ctl: &mut dyn InstanceController,
        to: StateType,
    ) -> Transition {
        let next = to.state();
        debug!(
            object = %ctl.object_id(),
            from = %self.state_type,
            to = %to,
            "lifecycle state change"
        );

        if self.transactional && !next.transactional {
            ctl.evict_from_transaction();
        } else if !self.transactional && next.transactional {
            ctl.enlist_in_transaction();
        } else if self.state_type == StateType::PersistentNontransactionalDirty
            && to != self.state_type
        {
            // Enlisted by begin while staying nontransactional.
            ctl.evict_from_transaction();
        }

        if to == StateType::Transient {
            ctl.disconnect();
        }

        Ok(next)
    }

    /// Fails with `NotReadable` when the transaction is inactive and
    /// nontransactional read is disabled.
    pub(crate) fn ensure_readable(&self, ctl: &dyn InstanceController) -> LifecycleResult<()> {
        let tx = ctl.transaction();
        if !tx.is_active() && !tx.nontransactional_read() {
            return Err(LifecycleError::not_readable(
                ctl.object_id(),
                self.state_type,
                "no active transaction and nontransactional read is disabled",
            ));
        }
        Ok(())
    }

    /// Fails with `NotWritable` when the transaction is inactive and
    /// nontransactional write is disabled.
    pub(crate) fn ensure_writable(&self, ctl: &dyn InstanceController) -> LifecycleResult<()> {
        let tx = ctl.transaction();
        if !tx.is_active() && !tx.nontransactional_write() {
            return Err(LifecycleError::not_writable(
                ctl.object_id(),
                self.state_type,
                "no active transaction and nontransactional write is disabled",
            ));
        }
        Ok(())
    }

    pub(crate) fn illegal(&self, ctl: &dyn InstanceController, operation: Operation) -> Transition {
        Err(LifecycleError::illegal_transition(
            ctl.object_id(),
            self.state_type,
            operation,
        ))
    }

    pub(crate) fn invalid(
        &self,
        ctl: &dyn InstanceController,
        operation: Operation,
        reason: &str,
    ) -> Transition {
        Err(LifecycleError::invalid_operation(
            ctl.object_id(),
            self.state_type,
            operation,
            reason,
        ))
    }
}

impl PartialEq for LifecycleState {
    fn eq(&self, other: &Self) -> bool {
        self.state_type == other.state_type
    }
}

impl Eq for LifecycleState {}

impl fmt::Debug for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleState")
            .field("state_type", &self.state_type)
            .field("persistent", &self.persistent)
            .field("transactional", &self.transactional)
            .field("dirty", &self.dirty)
            .field("new", &self.new)
            .field("deleted", &self.deleted)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.state_type, f)
    }
}

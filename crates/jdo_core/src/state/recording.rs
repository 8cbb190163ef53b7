//! A controller that records side effects instead of performing them.
//!
//! Used to exercise the transition tables in isolation: a test drives a
//! state with a [`RecordingController`] and then asserts on the returned
//! state and on [`RecordingController::calls`]. The CLI `matrix` command
//! uses it the same way.

use super::InstanceController;
use crate::config::TransactionOptions;
use crate::error::{LifecycleError, LifecycleResult};
use crate::metadata::{ClassMetadata, FetchPlan};
use crate::transaction::{LocalTransaction, Transaction};
use crate::types::ObjectId;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "call", content = "plan")]
pub enum ControllerCall {
    /// [`InstanceController::save_fields`].
    SaveFields,
    /// [`InstanceController::restore_fields`].
    RestoreFields,
    /// [`InstanceController::clear_saved_fields`].
    ClearSavedFields,
    /// [`InstanceController::clear_non_primary_key_fields`].
    ClearNonPrimaryKeyFields,
    /// [`InstanceController::clear_loaded_flags`].
    ClearLoadedFlags,
    /// [`InstanceController::unload_non_fetch_plan_fields`].
    UnloadNonFetchPlanFields,
    /// [`InstanceController::load_unloaded_fields`].
    LoadUnloadedFields,
    /// [`InstanceController::load_unloaded_fields_in_fetch_plan`].
    LoadUnloadedFieldsInFetchPlan,
    /// [`InstanceController::load_unloaded_fields_in_plan`], with the
    /// plan's group names.
    LoadUnloadedFieldsInPlan(Vec<String>),
    /// [`InstanceController::refresh_loaded_fields`].
    RefreshLoadedFields,
    /// [`InstanceController::refresh_fields_in_fetch_plan`].
    RefreshFieldsInFetchPlan,
    /// [`InstanceController::enlist_in_transaction`].
    EnlistInTransaction,
    /// [`InstanceController::evict_from_transaction`].
    EvictFromTransaction,
    /// [`InstanceController::disconnect`].
    Disconnect,
}

impl fmt::Display for ControllerCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SaveFields => f.write_str("save_fields"),
            Self::RestoreFields => f.write_str("restore_fields"),
            Self::ClearSavedFields => f.write_str("clear_saved_fields"),
            Self::ClearNonPrimaryKeyFields => f.write_str("clear_non_primary_key_fields"),
            Self::ClearLoadedFlags => f.write_str("clear_loaded_flags"),
            Self::UnloadNonFetchPlanFields => f.write_str("unload_non_fetch_plan_fields"),
            Self::LoadUnloadedFields => f.write_str("load_unloaded_fields"),
            Self::LoadUnloadedFieldsInFetchPlan => {
                f.write_str("load_unloaded_fields_in_fetch_plan")
            }
            Self::LoadUnloadedFieldsInPlan(groups) => {
                write!(f, "load_unloaded_fields_in_plan({})", groups.join(","))
            }
            Self::RefreshLoadedFields => f.write_str("refresh_loaded_fields"),
            Self::RefreshFieldsInFetchPlan => f.write_str("refresh_fields_in_fetch_plan"),
            Self::EnlistInTransaction => f.write_str("enlist_in_transaction"),
            Self::EvictFromTransaction => f.write_str("evict_from_transaction"),
            Self::Disconnect => f.write_str("disconnect"),
        }
    }
}

/// [`InstanceController`] that logs every call and never touches a
/// datastore.
#[derive(Debug)]
pub struct RecordingController {
    object_id: ObjectId,
    class: ClassMetadata,
    tx: Arc<LocalTransaction>,
    calls: Vec<ControllerCall>,
    fail_loads: bool,
}

impl RecordingController {
    /// Creates a controller for an instance of `class` governed by `tx`.
    pub fn new(class: ClassMetadata, tx: Arc<LocalTransaction>) -> Self {
        Self {
            object_id: ObjectId::new(),
            class,
            tx,
            calls: Vec::new(),
            fail_loads: false,
        }
    }

    /// Creates a controller with its own transaction, active or not.
    pub fn with_options(class: ClassMetadata, options: TransactionOptions, active: bool) -> Self {
        let tx = if active {
            LocalTransaction::active(options)
        } else {
            LocalTransaction::new(options)
        };
        Self::new(class, Arc::new(tx))
    }

    /// Makes every load and refresh fail with `ObjectNotFound`, as if the
    /// row had been removed behind the instance's back.
    #[must_use]
    pub fn failing_loads(mut self) -> Self {
        self.fail_loads = true;
        self
    }

    /// Calls recorded so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[ControllerCall] {
        &self.calls
    }

    /// Returns and clears the recorded calls.
    pub fn take_calls(&mut self) -> Vec<ControllerCall> {
        std::mem::take(&mut self.calls)
    }

    /// Whether `call` was recorded.
    #[must_use]
    pub fn called(&self, call: &ControllerCall) -> bool {
        self.calls.contains(call)
    }

    /// Shared handle to the transaction, for beginning or finishing it
    /// between transitions.
    #[must_use]
    pub fn transaction_handle(&self) -> Arc<LocalTransaction> {
        Arc::clone(&self.tx)
    }

    fn load(&mut self, call: ControllerCall) -> LifecycleResult<()> {
        if self.fail_loads {
            return Err(LifecycleError::ObjectNotFound {
                object: self.object_id,
            });
        }
        self.calls.push(call);
        Ok(())
    }
}

impl InstanceController for RecordingController {
    fn object_id(&self) -> ObjectId {
        self.object_id
    }

    fn class_metadata(&self) -> &ClassMetadata {
        &self.class
    }

    fn transaction(&self) -> &dyn Transaction {
        self.tx.as_ref()
    }

    fn save_fields(&mut self) {
        self.calls.push(ControllerCall::SaveFields);
    }

    fn restore_fields(&mut self) {
        self.calls.push(ControllerCall::RestoreFields);
    }

    fn clear_saved_fields(&mut self) {
        self.calls.push(ControllerCall::ClearSavedFields);
    }

    fn clear_non_primary_key_fields(&mut self) {
        self.calls.push(ControllerCall::ClearNonPrimaryKeyFields);
    }

    fn clear_loaded_flags(&mut self) {
        self.calls.push(ControllerCall::ClearLoadedFlags);
    }

    fn unload_non_fetch_plan_fields(&mut self) {
        self.calls.push(ControllerCall::UnloadNonFetchPlanFields);
    }

    fn load_unloaded_fields(&mut self) -> LifecycleResult<()> {
        self.load(ControllerCall::LoadUnloadedFields)
    }

    fn load_unloaded_fields_in_fetch_plan(&mut self) -> LifecycleResult<()> {
        self.load(ControllerCall::LoadUnloadedFieldsInFetchPlan)
    }

    fn load_unloaded_fields_in_plan(&mut self, plan: &FetchPlan) -> LifecycleResult<()> {
        let groups = plan.groups().map(str::to_string).collect();
        self.load(ControllerCall::LoadUnloadedFieldsInPlan(groups))
    }

    fn refresh_loaded_fields(&mut self) -> LifecycleResult<()> {
        self.load(ControllerCall::RefreshLoadedFields)
    }

    fn refresh_fields_in_fetch_plan(&mut self) -> LifecycleResult<()> {
        self.load(ControllerCall::RefreshFieldsInFetchPlan)
    }

    fn enlist_in_transaction(&mut self) {
        self.calls.push(ControllerCall::EnlistInTransaction);
    }

    fn evict_from_transaction(&mut self) {
        self.calls.push(ControllerCall::EvictFromTransaction);
    }

    fn disconnect(&mut self) {
        self.calls.push(ControllerCall::Disconnect);
    }
}

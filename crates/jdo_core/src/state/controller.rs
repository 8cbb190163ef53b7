//! The contract between lifecycle states and the runtime object they govern.

use crate::error::LifecycleResult;
use crate::metadata::{ClassMetadata, FetchPlan};
use crate::transaction::Transaction;
use crate::types::ObjectId;

/// Runtime controller of one managed instance.
///
/// A controller owns the instance's field cache and its current
/// [`LifecycleState`](super::LifecycleState). States call back into it for
/// every side effect of a transition; they never touch the field cache
/// directly. The methods below are the complete set of effects a transition
/// may have.
///
/// Controllers are driven by one logical thread at a time, so the trait
/// takes `&mut self` and requires no internal locking.
pub trait InstanceController {
    /// Identity of the managed instance.
    fn object_id(&self) -> ObjectId;

    /// Metadata of the instance's class.
    fn class_metadata(&self) -> &ClassMetadata;

    /// Transaction of the persistence context owning the instance.
    fn transaction(&self) -> &dyn Transaction;

    /// Snapshots current field values and loaded flags for rollback.
    fn save_fields(&mut self);

    /// Restores the snapshot taken by [`save_fields`](Self::save_fields)
    /// and discards it. Does nothing when no snapshot exists.
    fn restore_fields(&mut self);

    /// Discards the snapshot without restoring it.
    fn clear_saved_fields(&mut self);

    /// Drops the values of every non-primary-key field and marks them
    /// unloaded.
    fn clear_non_primary_key_fields(&mut self);

    /// Marks every non-primary-key field unloaded, keeping the values.
    fn clear_loaded_flags(&mut self);

    /// Marks fields outside the active fetch plan unloaded.
    fn unload_non_fetch_plan_fields(&mut self);

    /// Loads every unloaded field from the datastore.
    fn load_unloaded_fields(&mut self) -> LifecycleResult<()>;

    /// Loads unloaded fields of the active fetch plan.
    fn load_unloaded_fields_in_fetch_plan(&mut self) -> LifecycleResult<()>;

    /// Loads unloaded fields selected by `plan`.
    fn load_unloaded_fields_in_plan(&mut self, plan: &FetchPlan) -> LifecycleResult<()>;

    /// Reloads the fields that are currently loaded.
    fn refresh_loaded_fields(&mut self) -> LifecycleResult<()>;

    /// Reloads every field of the active fetch plan.
    fn refresh_fields_in_fetch_plan(&mut self) -> LifecycleResult<()>;

    /// Registers the instance with the current transaction.
    fn enlist_in_transaction(&mut self);

    /// Removes the instance from the current transaction.
    fn evict_from_transaction(&mut self);

    /// Releases the instance from management; it becomes a plain value.
    fn disconnect(&mut self);
}

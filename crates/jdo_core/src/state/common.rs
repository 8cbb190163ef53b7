//! Transition bodies shared by several states.

use super::{InstanceController, LifecycleState, StateType, Transition};
use crate::metadata::FetchPlan;
use crate::transaction::Transaction;

pub(super) fn unchanged(
    state: &'static LifecycleState,
    _: &mut dyn InstanceController,
) -> Transition {
    Ok(state)
}

pub(super) fn unchanged_flag(
    state: &'static LifecycleState,
    _: &mut dyn InstanceController,
    _: bool,
) -> Transition {
    Ok(state)
}

pub(super) fn unchanged_flags(
    state: &'static LifecycleState,
    _: &mut dyn InstanceController,
    _: bool,
    _: bool,
) -> Transition {
    Ok(state)
}

pub(super) fn unchanged_tx(
    state: &'static LifecycleState,
    _: &mut dyn InstanceController,
    _: &dyn Transaction,
) -> Transition {
    Ok(state)
}

pub(super) fn unchanged_plan(
    state: &'static LifecycleState,
    _: &mut dyn InstanceController,
    _: &FetchPlan,
) -> Transition {
    Ok(state)
}

/// Readability gate with no state change.
pub(super) fn read_in_place(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    _is_loaded: bool,
) -> Transition {
    state.ensure_readable(ctl)?;
    Ok(state)
}

/// Writability gate with no state change.
pub(super) fn write_in_place(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    state.ensure_writable(ctl)?;
    Ok(state)
}

/// Deletion of a persistent, not yet deleted instance.
pub(super) fn delete_to_deleted(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    ctl.clear_loaded_flags();
    state.change_state(ctl, StateType::PersistentDeleted)
}

/// Commit of a clean, dirty or new persistent instance.
pub(super) fn commit_to_nontransactional_or_hollow(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    tx: &dyn Transaction,
) -> Transition {
    ctl.clear_saved_fields();
    if tx.retain_values() {
        return state.change_state(ctl, StateType::PersistentNontransactional);
    }
    ctl.clear_non_primary_key_fields();
    state.change_state(ctl, StateType::Hollow)
}

/// Rollback of an instance that existed in the datastore before the
/// transaction.
pub(super) fn rollback_to_nontransactional_or_hollow(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    tx: &dyn Transaction,
) -> Transition {
    if tx.restore_values() {
        ctl.restore_fields();
        return state.change_state(ctl, StateType::PersistentNontransactional);
    }
    ctl.clear_non_primary_key_fields();
    ctl.clear_saved_fields();
    state.change_state(ctl, StateType::Hollow)
}

/// End of transaction for a deleted instance.
pub(super) fn commit_deleted(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    tx: &dyn Transaction,
) -> Transition {
    if !tx.retain_values() {
        ctl.clear_non_primary_key_fields();
    }
    ctl.clear_saved_fields();
    state.change_state(ctl, StateType::Transient)
}

/// Drops the snapshot, reloads the fetch plan and unloads everything else.
pub(super) fn reload_fetch_plan(ctl: &mut dyn InstanceController) -> crate::LifecycleResult<()> {
    ctl.clear_saved_fields();
    ctl.refresh_fields_in_fetch_plan()?;
    ctl.unload_non_fetch_plan_fields();
    Ok(())
}

/// Clears cached values and falls back to hollow.
pub(super) fn evict_to_hollow(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    ctl.clear_non_primary_key_fields();
    ctl.clear_saved_fields();
    state.change_state(ctl, StateType::Hollow)
}

/// Loads fields for a retrieve: the active fetch plan or everything.
pub(super) fn load_for_retrieve(
    ctl: &mut dyn InstanceController,
    fg_only: bool,
) -> crate::LifecycleResult<()> {
    if fg_only {
        ctl.load_unloaded_fields_in_fetch_plan()
    } else {
        ctl.load_unloaded_fields()
    }
}

/// Retrieve that loads fields and keeps the state.
pub(super) fn retrieve_in_place(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    fg_only: bool,
) -> Transition {
    load_for_retrieve(ctl, fg_only)?;
    Ok(state)
}

/// Retrieve of an explicit plan that keeps the state.
pub(super) fn retrieve_plan_in_place(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    plan: &FetchPlan,
) -> Transition {
    ctl.load_unloaded_fields_in_plan(plan)?;
    Ok(state)
}

/// Make-transient of an instance with nothing to lose.
pub(super) fn make_transient_clean(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    use_fetch_plan: bool,
    _detach_all_on_commit: bool,
) -> Transition {
    if use_fetch_plan {
        ctl.load_unloaded_fields_in_fetch_plan()?;
    }
    state.change_state(ctl, StateType::Transient)
}

/// Make-transient of a dirty or new instance: only when the context
/// detaches on commit, otherwise the pending changes would be lost.
pub(super) fn make_transient_dirty(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    use_fetch_plan: bool,
    detach_all_on_commit: bool,
) -> Transition {
    if !detach_all_on_commit {
        return state.invalid(
            ctl,
            super::Operation::MakeTransient,
            "instance has uncommitted changes",
        );
    }
    make_transient_clean(state, ctl, use_fetch_plan, detach_all_on_commit)
}

/// Make-nontransactional of an instance with uncommitted changes.
pub(super) fn refuse_make_nontransactional(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    state.invalid(
        ctl,
        super::Operation::MakeNontransactional,
        "instance has uncommitted changes",
    )
}

pub(super) fn detach_clean(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    state.change_state(ctl, StateType::DetachedClean)
}

/// Upgrade to persistent-clean inside a pessimistic transaction so the
/// serialized image is consistent.
pub(super) fn serialize_in_pessimistic_tx(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    if ctl.transaction().is_pessimistic_active() {
        return state.change_state(ctl, StateType::PersistentClean);
    }
    Ok(state)
}

/// Reads of a detached copy see only the fields that were detached with it.
pub(super) fn read_detached(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    is_loaded: bool,
) -> Transition {
    if is_loaded {
        return Ok(state);
    }
    Err(crate::error::LifecycleError::not_readable(
        ctl.object_id(),
        state.state_type(),
        "field was not detached",
    ))
}

/// Make-persistent from one of the transient states. A rollback with
/// `restore_values` goes back to the values held at this point, or to the
/// snapshot a `T_DIRTY` instance already carries.
pub(super) fn make_persistent_new(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    if ctl.transaction().restore_values() && !state.is_dirty() {
        ctl.save_fields();
    }
    state.change_state(ctl, StateType::PersistentNew)
}

/// Rejections shared by both deleted states.
pub(super) mod deleted {
    use super::super::{InstanceController, LifecycleState, Operation, Transition};
    use crate::error::LifecycleError;

    pub(in crate::state) fn delete(
        state: &'static LifecycleState,
        ctl: &mut dyn InstanceController,
    ) -> Transition {
        state.invalid(ctl, Operation::DeletePersistent, "instance is already deleted")
    }

    pub(in crate::state) fn make_nontransactional(
        state: &'static LifecycleState,
        ctl: &mut dyn InstanceController,
    ) -> Transition {
        state.invalid(
            ctl,
            Operation::MakeNontransactional,
            "instance is deleted in the current transaction",
        )
    }

    pub(in crate::state) fn make_transient(
        state: &'static LifecycleState,
        ctl: &mut dyn InstanceController,
        _use_fetch_plan: bool,
        _detach_all_on_commit: bool,
    ) -> Transition {
        state.invalid(
            ctl,
            Operation::MakeTransient,
            "instance is deleted in the current transaction",
        )
    }

    pub(in crate::state) fn read_field(
        state: &'static LifecycleState,
        ctl: &mut dyn InstanceController,
        _is_loaded: bool,
    ) -> Transition {
        Err(LifecycleError::not_readable(
            ctl.object_id(),
            state.state_type(),
            "instance is deleted",
        ))
    }

    pub(in crate::state) fn write_field(
        state: &'static LifecycleState,
        ctl: &mut dyn InstanceController,
    ) -> Transition {
        Err(LifecycleError::not_writable(
            ctl.object_id(),
            state.state_type(),
            "instance is deleted",
        ))
    }

    pub(in crate::state) fn evict(
        state: &'static LifecycleState,
        ctl: &mut dyn InstanceController,
    ) -> Transition {
        state.invalid(ctl, Operation::Evict, "instance is deleted")
    }

    pub(in crate::state) fn detach(
        state: &'static LifecycleState,
        ctl: &mut dyn InstanceController,
    ) -> Transition {
        state.invalid(ctl, Operation::Detach, "instance is deleted")
    }
}

/// Rejections shared by the three transient states.
pub(super) fn delete_transient(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    state.invalid(
        ctl,
        super::Operation::DeletePersistent,
        "instance is not persistent",
    )
}

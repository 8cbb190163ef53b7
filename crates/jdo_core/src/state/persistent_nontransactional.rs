//! `P_NONTRANS`: persistent, values cached outside any transaction.
//!
//! Shares its flags with `HOLLOW` but, unlike it, holds loaded values that
//! may be stale. A read inside a pessimistic transaction reloads them.

use super::{
    common, InstanceController, LifecycleState, Operation, StateType, Transition, Transitions,
};
use crate::metadata::FetchPlan;
use crate::transaction::Transaction;

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::PersistentNontransactional,
    persistent: true,
    transactional: false,
    dirty: false,
    new: false,
    deleted: false,
    transitions: Transitions {
        make_persistent: common::unchanged,
        delete_persistent: common::delete_to_deleted,
        make_transactional,
        make_nontransactional: common::unchanged,
        make_transient: common::make_transient_clean,
        commit,
        rollback,
        refresh,
        evict: common::evict_to_hollow,
        read_field,
        write_field,
        retrieve,
        retrieve_fetch_plan,
        detach: common::detach_clean,
        attach: common::unchanged,
        serialize: common::serialize_in_pessimistic_tx,
        begin: common::unchanged_tx,
    },
};

fn make_transactional(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    refresh_fields: bool,
) -> Transition {
    if refresh_fields {
        ctl.refresh_loaded_fields()?;
    }
    state.change_state(ctl, StateType::PersistentClean)
}

fn commit(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    _tx: &dyn Transaction,
) -> Transition {
    state.illegal(ctl, Operation::Commit)
}

fn rollback(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    _tx: &dyn Transaction,
) -> Transition {
    state.illegal(ctl, Operation::Rollback)
}

fn refresh(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    common::reload_fetch_plan(ctl)?;
    Ok(state)
}

fn read_field(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    _is_loaded: bool,
) -> Transition {
    state.ensure_readable(ctl)?;
    if !ctl.transaction().is_pessimistic_active() {
        return Ok(state);
    }

    // Cached values predate the transaction.
    ctl.save_fields();
    ctl.refresh_loaded_fields()?;
    state.change_state(ctl, StateType::PersistentClean)
}

fn write_field(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    state.ensure_writable(ctl)?;

    ctl.save_fields();
    if ctl.transaction().is_active() {
        state.change_state(ctl, StateType::PersistentDirty)
    } else {
        state.change_state(ctl, StateType::PersistentNontransactionalDirty)
    }
}

fn retrieve(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    fg_only: bool,
) -> Transition {
    let upgrade = snapshot_for_retrieve(ctl);
    common::load_for_retrieve(ctl, fg_only)?;
    finish_retrieve(state, ctl, upgrade)
}

fn retrieve_fetch_plan(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    plan: &FetchPlan,
) -> Transition {
    let upgrade = snapshot_for_retrieve(ctl);
    ctl.load_unloaded_fields_in_plan(plan)?;
    finish_retrieve(state, ctl, upgrade)
}

/// Snapshots fields when a transaction is active. Returns whether the
/// retrieve upgrades the instance to `P_CLEAN`.
fn snapshot_for_retrieve(ctl: &mut dyn InstanceController) -> bool {
    let tx = ctl.transaction();
    let active = tx.is_active();
    let pessimistic = tx.is_pessimistic_active();
    // TODO: an optimistic transaction stays in P_NONTRANS, so a second
    // retrieve overwrites the snapshot taken by the first one.
    if active {
        ctl.save_fields();
    }
    pessimistic
}

fn finish_retrieve(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    upgrade: bool,
) -> Transition {
    if upgrade {
        state.change_state(ctl, StateType::PersistentClean)
    } else {
        Ok(state)
    }
}

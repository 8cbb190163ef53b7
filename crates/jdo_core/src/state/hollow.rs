//! `HOLLOW`: persistent, not enlisted, no field values loaded beyond the
//! primary key. The next access decides whether the instance becomes
//! transactional or nontransactional.

use super::{
    common, InstanceController, LifecycleState, Operation, StateType, Transition, Transitions,
};
use crate::error::LifecycleError;
use crate::metadata::{FetchPlan, IdentityType};
use crate::transaction::Transaction;

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::Hollow,
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
        evict: common::unchanged,
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

// A hollow instance was never enlisted, so it cannot take part in a
// transaction outcome.
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
    is_loaded: bool,
) -> Transition {
    state.ensure_readable(ctl)?;

    let tx = ctl.transaction();
    let active = tx.is_active();
    let pessimistic = tx.is_pessimistic_active();

    // Nondurable instances cannot be located again, so an unloaded field has
    // nowhere to come from once the transaction is over.
    let nondurable = ctl.class_metadata().identity_type() == IdentityType::Nondurable;
    if nondurable && !active && !is_loaded {
        return Err(LifecycleError::not_readable(
            ctl.object_id(),
            state.state_type(),
            "unloaded field of a nondurable instance read outside a transaction",
        ));
    }

    if pessimistic {
        state.change_state(ctl, StateType::PersistentClean)
    } else {
        state.change_state(ctl, StateType::PersistentNontransactional)
    }
}

fn write_field(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    state.ensure_writable(ctl)?;

    let tx = ctl.transaction();
    let active = tx.is_active();
    if tx.restore_values() {
        ctl.save_fields();
    }

    if active {
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
    state.ensure_readable(ctl)?;
    common::load_for_retrieve(ctl, fg_only)?;
    after_retrieve(state, ctl)
}

fn retrieve_fetch_plan(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    plan: &FetchPlan,
) -> Transition {
    state.ensure_readable(ctl)?;
    ctl.load_unloaded_fields_in_plan(plan)?;
    after_retrieve(state, ctl)
}

/// Loaded values never stay in a hollow instance.
fn after_retrieve(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    if ctl.transaction().is_pessimistic_active() {
        state.change_state(ctl, StateType::PersistentClean)
    } else {
        state.change_state(ctl, StateType::PersistentNontransactional)
    }
}

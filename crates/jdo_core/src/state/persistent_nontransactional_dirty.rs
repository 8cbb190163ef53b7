//! `P_NONTRANS_DIRTY`: persistent, modified outside a transaction.
//!
//! The pending changes are flushed by the next transaction the instance
//! joins. Beginning a transaction snapshots the values and enlists the
//! instance without changing its state. Every transition out of the state
//! evicts it again.

use super::{common, InstanceController, LifecycleState, StateType, Transition, Transitions};
use crate::transaction::Transaction;

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::PersistentNontransactionalDirty,
    persistent: true,
    transactional: false,
    dirty: true,
    new: false,
    deleted: false,
    transitions: Transitions {
        make_persistent: common::unchanged,
        delete_persistent: common::delete_to_deleted,
        make_transactional: common::unchanged_flag,
        make_nontransactional: common::unchanged,
        make_transient: common::make_transient_dirty,
        commit,
        rollback,
        refresh,
        evict: common::unchanged,
        read_field: common::read_in_place,
        write_field: common::write_in_place,
        retrieve: common::retrieve_in_place,
        retrieve_fetch_plan: common::retrieve_plan_in_place,
        detach: common::detach_clean,
        attach: common::unchanged,
        serialize: common::unchanged,
        begin,
    },
};

fn begin(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    _tx: &dyn Transaction,
) -> Transition {
    ctl.save_fields();
    ctl.enlist_in_transaction();
    Ok(state)
}

fn commit(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    _tx: &dyn Transaction,
) -> Transition {
    ctl.clear_saved_fields();
    state.change_state(ctl, StateType::PersistentNontransactional)
}

fn rollback(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    tx: &dyn Transaction,
) -> Transition {
    common::rollback_to_nontransactional_or_hollow(state, ctl, tx)
}

fn refresh(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    common::reload_fetch_plan(ctl)?;
    state.change_state(ctl, StateType::PersistentNontransactional)
}

//! `T_DIRTY`: transient, enlisted, modified in the current transaction.

use super::{common, InstanceController, LifecycleState, StateType, Transition, Transitions};
use crate::transaction::Transaction;

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::TransientDirty,
    persistent: false,
    transactional: true,
    dirty: true,
    new: false,
    deleted: false,
    transitions: Transitions {
        make_persistent: common::make_persistent_new,
        delete_persistent: common::delete_transient,
        make_transactional: common::unchanged_flag,
        make_nontransactional: common::refuse_make_nontransactional,
        make_transient: common::unchanged_flags,
        commit,
        rollback,
        refresh: common::unchanged,
        evict: common::unchanged,
        read_field: common::unchanged_flag,
        write_field: common::unchanged,
        retrieve: common::unchanged_flag,
        retrieve_fetch_plan: common::unchanged_plan,
        detach: common::unchanged,
        attach: common::unchanged,
        serialize: common::unchanged,
        begin: common::unchanged_tx,
    },
};

fn commit(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    _tx: &dyn Transaction,
) -> Transition {
    ctl.clear_saved_fields();
    state.change_state(ctl, StateType::TransientClean)
}

/// Transient values are always restored; the restore-values option only
/// governs persistent instances.
fn rollback(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    _tx: &dyn Transaction,
) -> Transition {
    ctl.restore_fields();
    state.change_state(ctl, StateType::TransientClean)
}

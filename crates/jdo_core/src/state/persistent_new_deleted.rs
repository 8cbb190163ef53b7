//! `P_NEW_DELETED`: made persistent and deleted within the same
//! transaction. Either outcome of the transaction leaves a transient value.

use super::common::{self, deleted};
use super::{InstanceController, LifecycleState, StateType, Transition, Transitions};
use crate::transaction::Transaction;

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::PersistentNewDeleted,
    persistent: true,
    transactional: true,
    dirty: true,
    new: true,
    deleted: true,
    transitions: Transitions {
        make_persistent: common::unchanged,
        delete_persistent: deleted::delete,
        make_transactional: common::unchanged_flag,
        make_nontransactional: deleted::make_nontransactional,
        make_transient: deleted::make_transient,
        commit: common::commit_deleted,
        rollback,
        refresh: common::unchanged,
        evict: deleted::evict,
        read_field: deleted::read_field,
        write_field: deleted::write_field,
        retrieve: common::unchanged_flag,
        retrieve_fetch_plan: common::unchanged_plan,
        detach: deleted::detach,
        attach: common::unchanged,
        serialize: common::unchanged,
        begin: common::unchanged_tx,
    },
};

fn rollback(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    tx: &dyn Transaction,
) -> Transition {
    if tx.restore_values() {
        ctl.restore_fields();
    } else {
        ctl.clear_saved_fields();
    }
    state.change_state(ctl, StateType::Transient)
}

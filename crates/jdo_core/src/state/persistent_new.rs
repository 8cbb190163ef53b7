//! `P_NEW`: made persistent in the current transaction and not yet
//! committed. The datastore has no row for it until flush.

use super::{common, InstanceController, LifecycleState, StateType, Transition, Transitions};
use crate::transaction::Transaction;

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::PersistentNew,
    persistent: true,
    transactional: true,
    dirty: true,
    new: true,
    deleted: false,
    transitions: Transitions {
        make_persistent: common::unchanged,
        delete_persistent,
        make_transactional: common::unchanged_flag,
        make_nontransactional: common::refuse_make_nontransactional,
        make_transient: common::make_transient_dirty,
        commit: common::commit_to_nontransactional_or_hollow,
        rollback,
        refresh: common::unchanged,
        evict: common::unchanged,
        read_field: common::read_in_place,
        write_field: common::write_in_place,
        retrieve: common::unchanged_flag,
        retrieve_fetch_plan: common::unchanged_plan,
        detach: common::detach_clean,
        attach: common::unchanged,
        serialize: common::unchanged,
        begin: common::unchanged_tx,
    },
};

fn delete_persistent(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    ctl.clear_loaded_flags();
    state.change_state(ctl, StateType::PersistentNewDeleted)
}

/// The instance never reached the datastore, so rolling back returns it to
/// a plain transient value.
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

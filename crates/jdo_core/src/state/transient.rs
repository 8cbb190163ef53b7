//! `TRANSIENT`: a plain value with no persistence management.

use super::{common, InstanceController, LifecycleState, StateType, Transition, Transitions};

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::Transient,
    persistent: false,
    transactional: false,
    dirty: false,
    new: false,
    deleted: false,
    transitions: Transitions {
        make_persistent: common::make_persistent_new,
        delete_persistent: common::delete_transient,
        make_transactional,
        make_nontransactional: common::unchanged,
        make_transient: common::unchanged_flags,
        commit: common::unchanged_tx,
        rollback: common::unchanged_tx,
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

fn make_transactional(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
    _refresh_fields: bool,
) -> Transition {
    state.change_state(ctl, StateType::TransientClean)
}

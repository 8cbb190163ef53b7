//! `T_CLEAN`: transient, enlisted, unmodified.

use super::{common, InstanceController, LifecycleState, StateType, Transition, Transitions};

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::TransientClean,
    persistent: false,
    transactional: true,
    dirty: false,
    new: false,
    deleted: false,
    transitions: Transitions {
        make_persistent: common::make_persistent_new,
        delete_persistent: common::delete_transient,
        make_transactional: common::unchanged_flag,
        make_nontransactional,
        make_transient: common::unchanged_flags,
        commit: common::unchanged_tx,
        rollback: common::unchanged_tx,
        refresh: common::unchanged,
        evict: common::unchanged,
        read_field: common::unchanged_flag,
        write_field,
        retrieve: common::unchanged_flag,
        retrieve_fetch_plan: common::unchanged_plan,
        detach: common::unchanged,
        attach: common::unchanged,
        serialize: common::unchanged,
        begin: common::unchanged_tx,
    },
};

fn make_nontransactional(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    state.change_state(ctl, StateType::Transient)
}

/// Outside a transaction the write is untracked.
fn write_field(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    if !ctl.transaction().is_active() {
        return Ok(state);
    }
    ctl.save_fields();
    state.change_state(ctl, StateType::TransientDirty)
}

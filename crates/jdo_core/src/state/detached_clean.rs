//! `DETACHED_CLEAN`: a detached copy with no changes since detaching.

use super::{common, InstanceController, LifecycleState, StateType, Transition, Transitions};

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::DetachedClean,
    persistent: false,
    transactional: false,
    dirty: false,
    new: false,
    deleted: false,
    transitions: Transitions {
        make_persistent: common::unchanged,
        delete_persistent: common::unchanged,
        make_transactional: common::unchanged_flag,
        make_nontransactional: common::unchanged,
        make_transient: common::unchanged_flags,
        commit: common::unchanged_tx,
        rollback: common::unchanged_tx,
        refresh: common::unchanged,
        evict: common::unchanged,
        read_field: common::read_detached,
        write_field,
        retrieve: common::unchanged_flag,
        retrieve_fetch_plan: common::unchanged_plan,
        detach: common::unchanged,
        attach,
        serialize: common::unchanged,
        begin: common::unchanged_tx,
    },
};

fn write_field(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    state.change_state(ctl, StateType::DetachedDirty)
}

fn attach(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    state.change_state(ctl, StateType::PersistentClean)
}

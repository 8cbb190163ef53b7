//! `P_DIRTY`: persistent, enlisted, modified in the current transaction.

use super::{common, InstanceController, LifecycleState, StateType, Transition, Transitions};

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::PersistentDirty,
    persistent: true,
    transactional: true,
    dirty: true,
    new: false,
    deleted: false,
    transitions: Transitions {
        make_persistent: common::unchanged,
        delete_persistent: common::delete_to_deleted,
        make_transactional: common::unchanged_flag,
        make_nontransactional: common::refuse_make_nontransactional,
        make_transient: common::make_transient_dirty,
        commit: common::commit_to_nontransactional_or_hollow,
        rollback: common::rollback_to_nontransactional_or_hollow,
        refresh,
        evict: common::unchanged,
        read_field: common::read_in_place,
        write_field: common::write_in_place,
        retrieve: common::retrieve_in_place,
        retrieve_fetch_plan: common::retrieve_plan_in_place,
        detach: common::detach_clean,
        attach: common::unchanged,
        serialize: common::unchanged,
        begin: common::unchanged_tx,
    },
};

/// Refreshing discards the pending changes, so the instance is clean
/// afterwards.
fn refresh(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    common::reload_fetch_plan(ctl)?;
    if ctl.transaction().is_pessimistic_active() {
        state.change_state(ctl, StateType::PersistentClean)
    } else {
        state.change_state(ctl, StateType::PersistentNontransactional)
    }
}

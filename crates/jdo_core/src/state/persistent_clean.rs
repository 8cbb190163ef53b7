//! `P_CLEAN`: persistent, enlisted, unmodified.

use super::{common, InstanceController, LifecycleState, StateType, Transition, Transitions};

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::PersistentClean,
    persistent: true,
    transactional: true,
    dirty: false,
    new: false,
    deleted: false,
    transitions: Transitions {
        make_persistent: common::unchanged,
        delete_persistent: common::delete_to_deleted,
        make_transactional: common::unchanged_flag,
        make_nontransactional,
        make_transient: common::make_transient_clean,
        commit: common::commit_to_nontransactional_or_hollow,
        rollback: common::rollback_to_nontransactional_or_hollow,
        refresh,
        evict: common::evict_to_hollow,
        read_field: common::read_in_place,
        write_field,
        retrieve: common::retrieve_in_place,
        retrieve_fetch_plan: common::retrieve_plan_in_place,
        detach: common::detach_clean,
        attach: common::unchanged,
        serialize: common::unchanged,
        begin: common::unchanged_tx,
    },
};

fn make_nontransactional(
    state: &'static LifecycleState,
    ctl: &mut dyn InstanceController,
) -> Transition {
    ctl.clear_saved_fields();
    state.change_state(ctl, StateType::PersistentNontransactional)
}

fn refresh(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    common::reload_fetch_plan(ctl)?;
    if ctl.transaction().is_active() {
        Ok(state)
    } else {
        state.change_state(ctl, StateType::PersistentNontransactional)
    }
}

fn write_field(state: &'static LifecycleState, ctl: &mut dyn InstanceController) -> Transition {
    state.ensure_writable(ctl)?;
    if ctl.transaction().restore_values() {
        ctl.save_fields();
    }
    state.change_state(ctl, StateType::PersistentDirty)
}

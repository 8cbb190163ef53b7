//! `P_DELETED`: an instance that existed before the transaction and has
//! been deleted in it.

use super::common::{self, deleted};
use super::{LifecycleState, StateType, Transitions};

pub(super) static STATE: LifecycleState = LifecycleState {
    state_type: StateType::PersistentDeleted,
    persistent: true,
    transactional: true,
    dirty: true,
    new: false,
    deleted: true,
    transitions: Transitions {
        make_persistent: common::unchanged,
        delete_persistent: deleted::delete,
        make_transactional: common::unchanged_flag,
        make_nontransactional: deleted::make_nontransactional,
        make_transient: deleted::make_transient,
        commit: common::commit_deleted,
        rollback: common::rollback_to_nontransactional_or_hollow,
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

//! Property-based test generators using proptest.
//!
//! Provides strategies for transaction options, states and transition
//! requests, so properties can be checked over the whole state table.

use jdo_core::{FetchPlan, Operation, StateType, TransactionOptions, TransitionRequest};
use proptest::prelude::*;

/// Strategy for arbitrary transaction options.
pub fn transaction_options_strategy() -> impl Strategy<Value = TransactionOptions> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(optimistic, ntr, ntw, retain, restore, detach)| {
            TransactionOptions::default()
                .optimistic(optimistic)
                .nontransactional_read(ntr)
                .nontransactional_write(ntw)
                .retain_values(retain)
                .restore_values(restore)
                .detach_all_on_commit(detach)
        })
}

/// Strategy for any lifecycle state.
pub fn state_type_strategy() -> impl Strategy<Value = StateType> {
    prop::sample::select(StateType::ALL.to_vec())
}

/// Strategy for any operation name.
pub fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

/// Strategy for fetch plans built from the groups of
/// [`person_class`](crate::person_class).
pub fn fetch_plan_strategy() -> impl Strategy<Value = FetchPlan> {
    prop::sample::subsequence(vec![FetchPlan::DEFAULT, FetchPlan::ALL, "media"], 0..=3).prop_map(
        |groups| {
            groups
                .into_iter()
                .fold(FetchPlan::empty(), |plan, group| plan.with_group(group))
        },
    )
}

/// Strategy for transition requests with arbitrary arguments.
pub fn transition_request_strategy() -> impl Strategy<Value = TransitionRequest> {
    prop_oneof![
        Just(TransitionRequest::MakePersistent),
        Just(TransitionRequest::DeletePersistent),
        any::<bool>().prop_map(|refresh_fields| TransitionRequest::MakeTransactional {
            refresh_fields
        }),
        Just(TransitionRequest::MakeNontransactional),
        (any::<bool>(), any::<bool>()).prop_map(|(use_fetch_plan, detach_all_on_commit)| {
            TransitionRequest::MakeTransient {
                use_fetch_plan,
                detach_all_on_commit,
            }
        }),
        Just(TransitionRequest::Commit),
        Just(TransitionRequest::Rollback),
        Just(TransitionRequest::Refresh),
        Just(TransitionRequest::Evict),
        any::<bool>().prop_map(|is_loaded| TransitionRequest::ReadField { is_loaded }),
        Just(TransitionRequest::WriteField),
        any::<bool>().prop_map(|fg_only| TransitionRequest::Retrieve { fg_only }),
        fetch_plan_strategy().prop_map(TransitionRequest::RetrieveWith),
        Just(TransitionRequest::Detach),
        Just(TransitionRequest::Attach),
        Just(TransitionRequest::Serialize),
        Just(TransitionRequest::Begin),
    ]
}

/// A state, transaction setup and request to drive through the table.
#[derive(Debug, Clone)]
pub struct TransitionCase {
    /// Starting state.
    pub state: StateType,
    /// Transaction options.
    pub options: TransactionOptions,
    /// Whether the transaction is active.
    pub active: bool,
    /// Request to apply.
    pub request: TransitionRequest,
}

/// Strategy for complete transition cases.
pub fn transition_case_strategy() -> impl Strategy<Value = TransitionCase> {
    (
        state_type_strategy(),
        transaction_options_strategy(),
        any::<bool>(),
        transition_request_strategy(),
    )
        .prop_map(|(state, options, active, request)| TransitionCase {
            state,
            options,
            active,
            request,
        })
}

/// One request a test sends through a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// Begin a transaction.
    Begin,
    /// Commit the transaction.
    Commit,
    /// Roll the transaction back.
    Rollback,
    /// Read the `name` field.
    Read,
    /// Write the `name` field.
    Write,
    /// Apply a lifecycle operation to the instance.
    Apply(Operation),
}

/// Strategy for session steps. Only operations a caller can request
/// directly are applied; attach and the transaction boundaries come from
/// their own steps.
pub fn session_step_strategy() -> impl Strategy<Value = SessionStep> {
    prop_oneof![
        2 => Just(SessionStep::Begin),
        2 => Just(SessionStep::Commit),
        2 => Just(SessionStep::Rollback),
        2 => Just(SessionStep::Read),
        3 => Just(SessionStep::Write),
        4 => prop::sample::select(vec![
            Operation::MakePersistent,
            Operation::DeletePersistent,
            Operation::MakeTransactional,
            Operation::MakeNontransactional,
            Operation::MakeTransient,
            Operation::Refresh,
            Operation::Evict,
            Operation::Retrieve,
            Operation::Detach,
        ])
        .prop_map(SessionStep::Apply),
    ]
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn requests_name_a_known_operation(request in transition_request_strategy()) {
            prop_assert!(Operation::ALL.contains(&request.operation()));
        }

        #[test]
        fn fetch_plans_use_known_groups(plan in fetch_plan_strategy()) {
            for group in plan.groups() {
                prop_assert!([FetchPlan::DEFAULT, FetchPlan::ALL, "media"].contains(&group));
            }
        }

        #[test]
        fn state_codes_parse_back(state in state_type_strategy()) {
            prop_assert_eq!(state.code().parse::<StateType>().unwrap(), state);
        }
    }
}

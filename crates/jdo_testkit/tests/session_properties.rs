//! Properties of whole sessions under random request sequences.

use jdo_core::{LifecycleError, LifecycleResult, ObjectId, Operation, Transaction};
use jdo_testkit::prelude::*;
use proptest::prelude::*;

fn apply_step(session: &mut TestSession, id: ObjectId, step: SessionStep) -> LifecycleResult<()> {
    match step {
        SessionStep::Begin => session.begin().map(drop),
        SessionStep::Commit => session.commit().map(drop),
        SessionStep::Rollback => session.rollback().map(drop),
        SessionStep::Read => session.object_mut(id)?.read_field(person::NAME).map(drop),
        SessionStep::Write => session
            .object_mut(id)?
            .write_field(person::NAME, "Renamed".into()),
        SessionStep::Apply(operation) => {
            let sm = session.object_mut(id)?;
            match operation {
                Operation::MakePersistent => sm.make_persistent(),
                Operation::DeletePersistent => sm.delete_persistent(),
                Operation::MakeTransactional => sm.make_transactional(false),
                Operation::MakeNontransactional => sm.make_nontransactional(),
                Operation::MakeTransient => sm.make_transient(false),
                Operation::Refresh => sm.refresh(),
                Operation::Evict => sm.evict(),
                Operation::Retrieve => sm.retrieve(true),
                Operation::Detach => sm.detach(),
                _ => Ok(sm.state_type()),
            }
            .map(drop)
        }
    }
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn transactions_end_from_every_reachable_state(
        options in transaction_options_strategy(),
        steps in prop::collection::vec(session_step_strategy(), 1..40),
    ) {
        let mut session = TestSession::new(options);
        let id = session.stored_person("Ada").unwrap();

        for step in steps {
            let was_active = session.transaction().is_active();
            let result = apply_step(&mut session, id, step);

            match step {
                SessionStep::Commit => prop_assert!(
                    !matches!(result, Err(LifecycleError::IllegalTransition { .. })),
                    "commit from {}: {:?}",
                    session.state_of(id).unwrap(),
                    result
                ),
                SessionStep::Rollback if was_active => prop_assert!(
                    result.is_ok(),
                    "rollback from {}: {:?}",
                    session.state_of(id).unwrap(),
                    result
                ),
                _ => {}
            }

            if matches!(step, SessionStep::Commit | SessionStep::Rollback) && result.is_ok() {
                prop_assert!(!session.transaction().is_active());
                let sm = session.object(id).unwrap();
                prop_assert_eq!(sm.is_enlisted(), sm.state().is_transactional());
            }
        }

        if session.transaction().is_active() {
            prop_assert!(session.rollback().is_ok());
        }
        let sm = session.object(id).unwrap();
        prop_assert_eq!(sm.is_enlisted(), sm.state().is_transactional());
    }
}

//! End-to-end lifecycle scenarios through a session and an in-memory
//! datastore.

use jdo_core::{FieldValue, LifecycleError, StateType, Transaction};
use jdo_testkit::prelude::*;

#[test]
fn persist_commit_and_reload_in_second_session() {
    let mut first = TestSession::new(pessimistic());
    first.begin().unwrap();
    let id = first.persist_person("Ada").unwrap();
    first.commit().unwrap();
    assert_eq!(first.state_of(id).unwrap(), StateType::Hollow);

    let mut second = TestSession::with_store(pessimistic(), first.memory_store().clone());
    let class = second.person_class().clone();
    second.find(&class, id).unwrap();
    second.begin().unwrap();

    let sm = second.object_mut(id).unwrap();
    assert_eq!(sm.read_field(person::NAME).unwrap(), FieldValue::from("Ada"));
    assert_eq!(sm.state_type(), StateType::PersistentClean);
    second.commit().unwrap();
}

#[test]
fn update_reaches_the_datastore_on_commit_only() {
    with_session(pessimistic(), |session| {
        let id = session.stored_person("Grace").unwrap();
        session.begin().unwrap();

        let sm = session.object_mut(id).unwrap();
        sm.write_field(person::EMAIL, "grace@navy.mil".into()).unwrap();
        assert_eq!(sm.state_type(), StateType::PersistentDirty);
        let row = session.memory_store().row(id).unwrap();
        assert_eq!(row[person::EMAIL], FieldValue::from("grace@example.com"));

        session.commit().unwrap();
        let row = session.memory_store().row(id).unwrap();
        assert_eq!(row[person::EMAIL], FieldValue::from("grace@navy.mil"));
        assert_eq!(row[person::NAME], FieldValue::from("Grace"));
    });
}

#[test]
fn rollback_without_restore_hollows_and_rereads() {
    with_session(pessimistic(), |session| {
        let id = session.stored_person("Linus").unwrap();
        session.begin().unwrap();
        session
            .object_mut(id)
            .unwrap()
            .write_field(person::NAME, "Torvalds".into())
            .unwrap();
        session.rollback().unwrap();
        assert_eq!(session.state_of(id).unwrap(), StateType::Hollow);

        session.begin().unwrap();
        let name = session.object_mut(id).unwrap().read_field(person::NAME).unwrap();
        assert_eq!(name, FieldValue::from("Linus"));
    });
}

#[test]
fn rollback_with_restore_keeps_snapshot() {
    with_session(retaining(), |session| {
        let id = session.stored_person("Barbara").unwrap();
        session.begin().unwrap();
        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.read_field(person::NAME).unwrap(), FieldValue::from("Barbara"));
        sm.write_field(person::NAME, "Liskov".into()).unwrap();
        session.rollback().unwrap();

        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.state_type(), StateType::PersistentNontransactional);
        assert_eq!(sm.read_field(person::NAME).unwrap(), FieldValue::from("Barbara"));
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::NAME],
            FieldValue::from("Barbara")
        );
    });
}

#[test]
fn nontransactional_write_is_flushed_by_next_transaction() {
    with_session(nontransactional(), |session| {
        let id = session.stored_person("Edsger").unwrap();

        let sm = session.object_mut(id).unwrap();
        sm.write_field(person::BIO, "goto considered harmful".into())
            .unwrap();
        assert_eq!(sm.state_type(), StateType::PersistentNontransactionalDirty);
        assert!(!sm.is_enlisted());

        session.begin().unwrap();
        assert!(session.object(id).unwrap().is_enlisted());
        session.commit().unwrap();

        assert_eq!(
            session.state_of(id).unwrap(),
            StateType::PersistentNontransactional
        );
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::BIO],
            FieldValue::from("goto considered harmful")
        );
    });
}

#[test]
fn optimistic_reads_stay_nontransactional() {
    with_session(optimistic(), |session| {
        let id = session.stored_person("Alan").unwrap();
        session.begin().unwrap();
        let sm = session.object_mut(id).unwrap();
        sm.read_field(person::NAME).unwrap();
        assert_eq!(sm.state_type(), StateType::PersistentNontransactional);
        assert!(!sm.is_enlisted());

        sm.retrieve(false).unwrap();
        assert!(sm.fields().is_loaded(person::BIO));
        assert!(sm.fields().has_saved());
        session.commit().unwrap();
    });
}

#[test]
fn delete_then_commit_removes_row() {
    with_session(pessimistic(), |session| {
        let id = session.stored_person("Ken").unwrap();
        session.begin().unwrap();
        let sm = session.object_mut(id).unwrap();
        sm.delete_persistent().unwrap();

        let err = sm.read_field(person::NAME).unwrap_err();
        assert!(matches!(err, LifecycleError::NotReadable { .. }));

        session.commit().unwrap();
        assert_eq!(session.state_of(id).unwrap(), StateType::Transient);
        assert!(!session.memory_store().contains(id));
    });
}

#[test]
fn persist_and_delete_in_one_transaction_never_reaches_store() {
    with_session(pessimistic(), |session| {
        session.begin().unwrap();
        let id = session.persist_person("Dennis").unwrap();
        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.delete_persistent().unwrap(), StateType::PersistentNewDeleted);
        session.commit().unwrap();

        assert_eq!(session.state_of(id).unwrap(), StateType::Transient);
        assert!(session.memory_store().is_empty());
    });
}

#[test]
fn detached_changes_are_written_after_attach() {
    with_session(pessimistic(), |session| {
        let id = session.stored_person("Margaret").unwrap();
        session.begin().unwrap();
        let sm = session.object_mut(id).unwrap();
        sm.retrieve(true).unwrap();
        assert_eq!(sm.detach().unwrap(), StateType::DetachedClean);
        session.commit().unwrap();

        let sm = session.object_mut(id).unwrap();
        sm.write_field(person::EMAIL, "mh@nasa.gov".into()).unwrap();
        assert_eq!(sm.state_type(), StateType::DetachedDirty);
        let err = sm.read_field(person::PHOTO).unwrap_err();
        assert!(matches!(err, LifecycleError::NotReadable { .. }));

        session.begin().unwrap();
        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.attach().unwrap(), StateType::PersistentDirty);
        session.commit().unwrap();

        assert_eq!(
            session.memory_store().row(id).unwrap()[person::EMAIL],
            FieldValue::from("mh@nasa.gov")
        );
    });
}

#[test]
fn make_transient_needs_detach_on_commit_for_dirty_instances() {
    with_session(pessimistic(), |session| {
        let id = session.stored_person("Frances").unwrap();
        session.begin().unwrap();
        let sm = session.object_mut(id).unwrap();
        sm.write_field(person::NAME, "Allen".into()).unwrap();

        let err = sm.make_transient(false).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidOperation { .. }));
        assert_eq!(sm.state_type(), StateType::PersistentDirty);
        session.rollback().unwrap();
    });

    let options = pessimistic().detach_all_on_commit(true);
    with_session(options, |session| {
        let id = session.stored_person("Frances").unwrap();
        session.begin().unwrap();
        let sm = session.object_mut(id).unwrap();
        sm.write_field(person::NAME, "Allen".into()).unwrap();
        assert_eq!(sm.make_transient(true).unwrap(), StateType::Transient);
        assert!(!sm.is_connected());
        assert_eq!(sm.read_field(person::NAME).unwrap(), FieldValue::from("Allen"));
        session.commit().unwrap();
    });
}

#[test]
fn evict_all_drops_clean_values_only() {
    let options = nontransactional();
    with_session(options, |session| {
        let clean = session.stored_person("Niklaus").unwrap();
        let dirty = session.stored_person("Tony").unwrap();
        session.object_mut(clean).unwrap().read_field(person::NAME).unwrap();
        session
            .object_mut(dirty)
            .unwrap()
            .write_field(person::NAME, "Hoare".into())
            .unwrap();

        session.evict_all().unwrap();
        assert_eq!(session.state_of(clean).unwrap(), StateType::Hollow);
        assert_eq!(
            session.state_of(dirty).unwrap(),
            StateType::PersistentNontransactionalDirty
        );
    });
}

#[test]
fn refresh_drops_nontransactional_changes_mid_transaction() {
    with_session(nontransactional(), |session| {
        let id = session.stored_person("Edsger").unwrap();
        session
            .object_mut(id)
            .unwrap()
            .write_field(person::NAME, "Dijkstra".into())
            .unwrap();
        session.begin().unwrap();

        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.refresh().unwrap(), StateType::PersistentNontransactional);
        assert!(!sm.is_enlisted());
        session.commit().unwrap();
        assert!(!session.transaction().is_active());

        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.read_field(person::NAME).unwrap(), FieldValue::from("Edsger"));
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::NAME],
            FieldValue::from("Edsger")
        );
    });

    with_session(nontransactional(), |session| {
        let id = session.stored_person("Edsger").unwrap();
        session
            .object_mut(id)
            .unwrap()
            .write_field(person::NAME, "Dijkstra".into())
            .unwrap();
        session.begin().unwrap();
        session.object_mut(id).unwrap().refresh().unwrap();
        session.rollback().unwrap();
        assert_eq!(
            session.state_of(id).unwrap(),
            StateType::PersistentNontransactional
        );
    });
}

#[test]
fn evict_keeps_nontransactional_changes_for_commit() {
    with_session(nontransactional(), |session| {
        let id = session.stored_person("Butler").unwrap();
        session
            .object_mut(id)
            .unwrap()
            .write_field(person::NAME, "Lampson".into())
            .unwrap();
        session.begin().unwrap();

        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.evict().unwrap(), StateType::PersistentNontransactionalDirty);
        assert!(sm.is_enlisted());
        session.commit().unwrap();

        assert_eq!(
            session.state_of(id).unwrap(),
            StateType::PersistentNontransactional
        );
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::NAME],
            FieldValue::from("Lampson")
        );
    });
}

#[test]
fn make_transient_of_enlisted_nontransactional_changes() {
    with_session(nontransactional(), |session| {
        let id = session.stored_person("Ken").unwrap();
        session
            .object_mut(id)
            .unwrap()
            .write_field(person::NAME, "Thompson".into())
            .unwrap();
        session.begin().unwrap();

        let err = session.object_mut(id).unwrap().make_transient(false).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidOperation { .. }));
        session.rollback().unwrap();
        assert_eq!(session.state_of(id).unwrap(), StateType::Hollow);
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::NAME],
            FieldValue::from("Ken")
        );
    });

    let options = nontransactional().detach_all_on_commit(true);
    with_session(options, |session| {
        let id = session.stored_person("Ken").unwrap();
        session
            .object_mut(id)
            .unwrap()
            .write_field(person::NAME, "Thompson".into())
            .unwrap();
        session.begin().unwrap();

        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.make_transient(false).unwrap(), StateType::Transient);
        assert!(!sm.is_enlisted());
        assert!(!sm.is_connected());
        session.commit().unwrap();
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::NAME],
            FieldValue::from("Ken")
        );
    });
}

#[test]
fn detach_refuses_pending_changes_until_commit() {
    with_session(nontransactional(), |session| {
        let id = session.stored_person("Dennis").unwrap();
        session
            .object_mut(id)
            .unwrap()
            .write_field(person::NAME, "Ritchie".into())
            .unwrap();
        session.begin().unwrap();

        let err = session.object_mut(id).unwrap().detach().unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidOperation { .. }));
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::NAME],
            FieldValue::from("Dennis")
        );
        session.rollback().unwrap();
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::NAME],
            FieldValue::from("Dennis")
        );
    });

    with_session(pessimistic(), |session| {
        let id = session.stored_person("Dennis").unwrap();
        session.begin().unwrap();
        let sm = session.object_mut(id).unwrap();
        sm.write_field(person::NAME, "Ritchie".into()).unwrap();
        assert!(sm.detach().is_err());
        session.commit().unwrap();

        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.detach().unwrap(), StateType::DetachedClean);
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::NAME],
            FieldValue::from("Ritchie")
        );
    });
}

#[test]
fn detach_on_commit_releases_nontransactional_changes() {
    let options = nontransactional().detach_all_on_commit(true);
    with_session(options, |session| {
        let id = session.stored_person("Niklaus").unwrap();
        session
            .object_mut(id)
            .unwrap()
            .write_field(person::NAME, "Wirth".into())
            .unwrap();
        session.begin().unwrap();
        session.commit().unwrap();

        let sm = session.object(id).unwrap();
        assert_eq!(sm.state_type(), StateType::DetachedClean);
        assert!(!sm.is_enlisted());
        assert_eq!(
            session.memory_store().row(id).unwrap()[person::NAME],
            FieldValue::from("Wirth")
        );
    });
}

#[test]
fn rollback_restores_values_of_new_instance() {
    with_session(retaining(), |session| {
        session.begin().unwrap();
        let id = session.persist_person("Ada").unwrap();
        session
            .object_mut(id)
            .unwrap()
            .write_field(person::NAME, "Lovelace".into())
            .unwrap();
        session.rollback().unwrap();

        let sm = session.object_mut(id).unwrap();
        assert_eq!(sm.state_type(), StateType::Transient);
        assert_eq!(sm.read_field(person::NAME).unwrap(), FieldValue::from("Ada"));
        assert!(!session.memory_store().contains(id));
    });
}

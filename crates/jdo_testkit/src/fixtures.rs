//! Test fixtures: sample classes, option presets and sessions.

use jdo_core::{
    ClassMetadata, FieldMetadata, FieldValue, IdentityType, InMemoryDatastore, LifecycleResult,
    ObjectId, RecordingController, Session, TransactionOptions,
};
use std::sync::Arc;

/// Field numbers of [`person_class`].
pub mod person {
    use jdo_core::FieldNumber;

    /// Primary key.
    pub const ID: FieldNumber = 0;
    /// Default fetch group.
    pub const NAME: FieldNumber = 1;
    /// Default fetch group.
    pub const EMAIL: FieldNumber = 2;
    /// Lazy, in the `media` group.
    pub const PHOTO: FieldNumber = 3;
    /// Lazy, in no named group.
    pub const BIO: FieldNumber = 4;
}

/// A `Person` class with application identity: `id` (key), `name`,
/// `email`, a lazy `photo` in the `media` group and a lazy `bio`.
pub fn person_class() -> Arc<ClassMetadata> {
    let class = ClassMetadata::builder("Person")
        .field(FieldMetadata::primary_key("id"))
        .field(FieldMetadata::new("name"))
        .field(FieldMetadata::new("email"))
        .field(FieldMetadata::lazy("photo").in_group("media"))
        .field(FieldMetadata::lazy("bio"))
        .build()
        .expect("person metadata is valid");
    Arc::new(class)
}

/// A class with nondurable identity and no key.
pub fn scratch_class() -> Arc<ClassMetadata> {
    let class = ClassMetadata::builder("Scratch")
        .identity(IdentityType::Nondurable)
        .field(FieldMetadata::new("value"))
        .field(FieldMetadata::lazy("detail"))
        .build()
        .expect("scratch metadata is valid");
    Arc::new(class)
}

/// Field values for a person.
pub fn person_values(id: i64, name: &str) -> Vec<FieldValue> {
    vec![
        FieldValue::Integer(id),
        name.into(),
        format!("{}@example.com", name.to_lowercase()).into(),
        FieldValue::Bytes(vec![0xFF, 0xD8]),
        format!("{name} has no biography yet").into(),
    ]
}

/// Pessimistic transaction, nothing retained or restored.
pub fn pessimistic() -> TransactionOptions {
    TransactionOptions::default()
}

/// Optimistic transaction with nontransactional read.
pub fn optimistic() -> TransactionOptions {
    TransactionOptions::default()
        .optimistic(true)
        .nontransactional_read(true)
}

/// Nontransactional read and write, values retained across commits.
pub fn nontransactional() -> TransactionOptions {
    TransactionOptions::default()
        .nontransactional_read(true)
        .nontransactional_write(true)
        .retain_values(true)
}

/// Retains values on commit and restores them on rollback.
pub fn retaining() -> TransactionOptions {
    TransactionOptions::default()
        .nontransactional_read(true)
        .retain_values(true)
        .restore_values(true)
}

/// A recording controller for a person instance.
pub fn recording(options: TransactionOptions, active: bool) -> RecordingController {
    RecordingController::with_options(person_class().as_ref().clone(), options, active)
}

/// A session over an in-memory datastore the test can inspect.
pub struct TestSession {
    /// The session.
    pub session: Session,
    store: Arc<InMemoryDatastore>,
    person: Arc<ClassMetadata>,
    next_id: i64,
}

impl TestSession {
    /// Creates a test session.
    pub fn new(options: TransactionOptions) -> Self {
        Self::with_store(options, Arc::new(InMemoryDatastore::new()))
    }

    /// Creates a test session over an existing datastore, as a second
    /// persistence context would see it.
    pub fn with_store(options: TransactionOptions, store: Arc<InMemoryDatastore>) -> Self {
        Self {
            session: Session::new(options, store.clone()),
            store,
            person: person_class(),
            next_id: 1,
        }
    }

    /// The datastore, for direct inspection.
    pub fn memory_store(&self) -> &Arc<InMemoryDatastore> {
        &self.store
    }

    /// The person class used by the helpers.
    pub fn person_class(&self) -> &Arc<ClassMetadata> {
        &self.person
    }

    /// Persists a new person through the session.
    pub fn persist_person(&mut self, name: &str) -> LifecycleResult<ObjectId> {
        let values = person_values(self.next_id, name);
        self.next_id += 1;
        let class = Arc::clone(&self.person);
        self.session.persist(&class, values)
    }

    /// Writes a person row straight into the datastore and manages it as
    /// a hollow instance.
    pub fn stored_person(&mut self, name: &str) -> LifecycleResult<ObjectId> {
        use jdo_core::Datastore;

        let id = ObjectId::new();
        self.store.insert(id, person_values(self.next_id, name))?;
        self.next_id += 1;
        let class = Arc::clone(&self.person);
        self.session.find(&class, id)
    }
}

impl std::ops::Deref for TestSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl std::ops::DerefMut for TestSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

/// Runs a test with a fresh session.
///
/// # Example
///
/// ```rust
/// use jdo_testkit::{pessimistic, with_session};
///
/// with_session(pessimistic(), |session| {
///     assert!(session.is_empty());
/// });
/// ```
pub fn with_session<F, R>(options: TransactionOptions, f: F) -> R
where
    F: FnOnce(&mut TestSession) -> R,
{
    let mut session = TestSession::new(options);
    f(&mut session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_values_match_class() {
        let class = person_class();
        assert_eq!(person_values(1, "Ada").len(), class.field_count());
        assert_eq!(class.field_number("photo"), Some(person::PHOTO));
    }

    #[test]
    fn stored_person_is_hollow() {
        with_session(pessimistic(), |session| {
            let id = session.stored_person("Grace").unwrap();
            assert_eq!(
                session.state_of(id).unwrap(),
                jdo_core::StateType::Hollow
            );
            assert_eq!(session.memory_store().len(), 1);
        });
    }

    #[test]
    fn presets_differ() {
        assert!(optimistic().optimistic);
        assert!(!pessimistic().optimistic);
        assert!(nontransactional().nontransactional_write);
        assert!(retaining().restore_values);
    }
}

//! Benchmark utilities.

use jdo_core::{
    ClassMetadata, Datastore, FieldMetadata, FieldValue, InMemoryDatastore, LifecycleResult,
    ObjectId, Session, TransactionOptions, TransitionRequest,
};
use rand::Rng;
use std::sync::Arc;

/// Number of fields of [`bench_class`].
pub const FIELD_COUNT: usize = 6;

/// A class with a key, four default fields and one lazy field.
pub fn bench_class() -> LifecycleResult<Arc<ClassMetadata>> {
    let mut builder = ClassMetadata::builder("Row").field(FieldMetadata::primary_key("id"));
    for name in ["a", "b", "c", "d"] {
        builder = builder.field(FieldMetadata::new(name));
    }
    let class = builder.field(FieldMetadata::lazy("blob")).build()?;
    Ok(Arc::new(class))
}

/// Random field values for a row with primary key `key`.
pub fn random_values(key: i64) -> Vec<FieldValue> {
    let mut rng = rand::thread_rng();
    let mut values = vec![FieldValue::Integer(key)];
    values.extend((1..FIELD_COUNT - 1).map(|_| FieldValue::Integer(rng.gen())));
    values.push(FieldValue::Bytes((0..64).map(|_| rng.gen()).collect()));
    values
}

/// A random mix of field reads and writes, the hot path of an application.
pub fn random_accesses(count: usize) -> Vec<TransitionRequest> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            if rng.gen_bool(0.8) {
                TransitionRequest::ReadField {
                    is_loaded: rng.gen(),
                }
            } else {
                TransitionRequest::WriteField
            }
        })
        .collect()
}

/// A session over a datastore pre-populated with `count` rows, all managed
/// as hollow instances.
pub fn stored_session(
    options: TransactionOptions,
    count: usize,
) -> LifecycleResult<(Session, Vec<ObjectId>)> {
    let class = bench_class()?;
    let store = Arc::new(InMemoryDatastore::new());
    let mut session = Session::new(options, store.clone());
    let mut ids = Vec::with_capacity(count);
    for key in 0..count {
        let id = ObjectId::new();
        store.insert(id, random_values(key as i64))?;
        ids.push(session.find(&class, id)?);
    }
    Ok((session, ids))
}

//! # JDO Core
//!
//! Object lifecycle engine for a JDO-style persistence layer.
//!
//! This crate provides:
//! - The lifecycle state machine: one static [`LifecycleState`] per
//!   [`StateType`], each with a complete transition table
//! - The [`InstanceController`] and [`Transaction`] seams the states call
//! - Class metadata and fetch plans
//! - A runtime ([`StateManager`], [`Session`]) that owns the current state
//!   of each instance and flushes changes to a [`Datastore`]
//!
//! ## Example
//!
//! ```rust
//! use jdo_core::{ClassMetadata, FieldMetadata, RecordingController, StateType, TransactionOptions};
//!
//! let class = ClassMetadata::builder("Person")
//!     .field(FieldMetadata::primary_key("id"))
//!     .field(FieldMetadata::new("name"))
//!     .build()
//!     .unwrap();
//! let mut ctl = RecordingController::with_options(class, TransactionOptions::default(), true);
//!
//! let next = StateType::Hollow.state().transition_read_field(&mut ctl, false).unwrap();
//! assert_eq!(next.state_type(), StateType::PersistentClean);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod manager;
mod metadata;
mod session;
mod state;
mod store;
mod transaction;
mod types;

pub use config::TransactionOptions;
pub use error::{LifecycleError, LifecycleResult};
pub use manager::{FieldCache, StateManager};
pub use metadata::{ClassMetadata, ClassMetadataBuilder, FetchPlan, FieldMetadata, IdentityType};
pub use session::Session;
pub use state::{
    ControllerCall, InstanceController, LifecycleState, Operation, ParseNameError,
    RecordingController, StateType, Transition, TransitionRequest,
};
pub use store::{Datastore, InMemoryDatastore};
pub use transaction::{LocalTransaction, Transaction};
pub use types::{FieldNumber, FieldValue, ObjectId, TransactionId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

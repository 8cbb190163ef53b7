//! # JDO Testkit
//!
//! Test utilities for the JDO lifecycle engine.
//!
//! This crate provides:
//! - Sample class metadata and transaction option presets
//! - Session fixtures over an in-memory datastore
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use jdo_testkit::prelude::*;
//!
//! with_session(pessimistic(), |session| {
//!     session.begin().unwrap();
//!     let id = session.persist_person("Ada").unwrap();
//!     session.commit().unwrap();
//!     assert!(session.memory_store().contains(id));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;

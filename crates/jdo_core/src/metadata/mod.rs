//! Class metadata read by the lifecycle runtime.
//!
//! Only the slice of object/relational metadata that lifecycle handling
//! needs is modelled here: identity type, the field list with primary key
//! flags and fetch group membership.

mod class;
mod fetch;

pub use class::{ClassMetadata, ClassMetadataBuilder, FieldMetadata, IdentityType};
pub use fetch::FetchPlan;

//! Error types for the lifecycle engine.

use crate::state::{Operation, StateType};
use crate::types::ObjectId;
use thiserror::Error;

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors raised by state transitions and the managed-instance runtime.
///
/// None of these are retried internally. A transition that fails leaves the
/// instance in the state it was in before the call.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The transition is impossible from the current state (for example
    /// committing a hollow instance that was never enlisted).
    #[error("illegal state transition: cannot {operation} {object} in state {state}")]
    IllegalTransition {
        /// Instance the transition was requested on.
        object: ObjectId,
        /// State the instance was in.
        state: StateType,
        /// Requested operation.
        operation: Operation,
    },

    /// A field read was attempted outside the transactional context the
    /// current state requires.
    #[error("fields of {object} are not readable in state {state}: {reason}")]
    NotReadable {
        /// Instance that was read.
        object: ObjectId,
        /// State the instance was in.
        state: StateType,
        /// Why the read was refused.
        reason: String,
    },

    /// A field write was attempted outside the transactional context the
    /// current state requires.
    #[error("fields of {object} are not writable in state {state}: {reason}")]
    NotWritable {
        /// Instance that was written.
        object: ObjectId,
        /// State the instance was in.
        state: StateType,
        /// Why the write was refused.
        reason: String,
    },

    /// The operation is forbidden for the persistence, dirty or deletion
    /// status of the instance.
    #[error("cannot {operation} {object} in state {state}: {reason}")]
    InvalidOperation {
        /// Instance the operation was requested on.
        object: ObjectId,
        /// State the instance was in.
        state: StateType,
        /// Requested operation.
        operation: Operation,
        /// Why the operation is forbidden.
        reason: String,
    },

    /// The datastore has no row for the instance.
    #[error("object not found in datastore: {object}")]
    ObjectNotFound {
        /// Missing instance.
        object: ObjectId,
    },

    /// The datastore already holds a row for the instance.
    #[error("object already exists in datastore: {object}")]
    DuplicateObject {
        /// Conflicting instance.
        object: ObjectId,
    },

    /// A field was addressed that the class does not declare.
    #[error("class {class} has no field {field}")]
    UnknownField {
        /// Class name.
        class: String,
        /// Field name or number as given by the caller.
        field: String,
    },

    /// Class metadata failed validation.
    #[error("invalid metadata for class {class}: {message}")]
    InvalidMetadata {
        /// Class name.
        class: String,
        /// Description of the problem.
        message: String,
    },

    /// A transaction boundary was requested while no transaction is active.
    #[error("transaction is not active")]
    TransactionNotActive,

    /// `begin` was requested while a transaction is already active.
    #[error("transaction is already active")]
    TransactionAlreadyActive,
}

impl LifecycleError {
    /// Creates an illegal transition error.
    pub fn illegal_transition(object: ObjectId, state: StateType, operation: Operation) -> Self {
        Self::IllegalTransition {
            object,
            state,
            operation,
        }
    }

    /// Creates a not-readable error.
    pub fn not_readable(object: ObjectId, state: StateType, reason: impl Into<String>) -> Self {
        Self::NotReadable {
            object,
            state,
            reason: reason.into(),
        }
    }

    /// Creates a not-writable error.
    pub fn not_writable(object: ObjectId, state: StateType, reason: impl Into<String>) -> Self {
        Self::NotWritable {
            object,
            state,
            reason: reason.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(
        object: ObjectId,
        state: StateType,
        operation: Operation,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOperation {
            object,
            state,
            operation,
            reason: reason.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(class: impl Into<String>, field: impl ToString) -> Self {
        Self::UnknownField {
            class: class.into(),
            field: field.to_string(),
        }
    }

    /// Creates an invalid metadata error.
    pub fn invalid_metadata(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            class: class.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for the read/write access violations.
    #[must_use]
    pub fn is_access_violation(&self) -> bool {
        matches!(self, Self::NotReadable { .. } | Self::NotWritable { .. })
    }

    /// Returns the state the failing instance was in, when the error came
    /// from a state transition.
    #[must_use]
    pub fn state(&self) -> Option<StateType> {
        match self {
            Self::IllegalTransition { state, .. }
            | Self::NotReadable { state, .. }
            | Self::NotWritable { state, .. }
            | Self::InvalidOperation { state, .. } => Some(*state),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_state_and_operation() {
        let id = ObjectId::from_bytes([0; 16]);
        let err = LifecycleError::illegal_transition(id, StateType::Hollow, Operation::Commit);
        let text = err.to_string();
        assert!(text.contains("commit"));
        assert!(text.contains("HOLLOW"));
    }

    #[test]
    fn access_violation_classification() {
        let id = ObjectId::new();
        assert!(LifecycleError::not_readable(id, StateType::PersistentDeleted, "deleted")
            .is_access_violation());
        assert!(!LifecycleError::invalid_operation(
            id,
            StateType::PersistentNew,
            Operation::MakeNontransactional,
            "dirty"
        )
        .is_access_violation());
        assert_eq!(LifecycleError::TransactionNotActive.state(), None);
    }
}

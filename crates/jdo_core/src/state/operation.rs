//! Lifecycle operation names and requests.

use super::ParseNameError;
use crate::metadata::FetchPlan;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A lifecycle operation, used to label errors, logs and requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Make a transient instance persistent.
    MakePersistent,
    /// Delete a persistent instance.
    DeletePersistent,
    /// Enlist an instance in the current transaction.
    MakeTransactional,
    /// Remove an instance from transaction bookkeeping.
    MakeNontransactional,
    /// Detach an instance from persistence entirely.
    MakeTransient,
    /// End-of-transaction commit.
    Commit,
    /// End-of-transaction rollback.
    Rollback,
    /// Reload fields from the datastore.
    Refresh,
    /// Drop cached field values.
    Evict,
    /// Read a field.
    ReadField,
    /// Write a field.
    WriteField,
    /// Force-load unloaded fields.
    Retrieve,
    /// Detach a copy for use outside the persistence context.
    Detach,
    /// Reattach a detached instance.
    Attach,
    /// Serialize the instance.
    Serialize,
    /// Transaction begin notification.
    Begin,
}

impl Operation {
    /// All operations in declaration order.
    pub const ALL: [Operation; 16] = [
        Operation::MakePersistent,
        Operation::DeletePersistent,
        Operation::MakeTransactional,
        Operation::MakeNontransactional,
        Operation::MakeTransient,
        Operation::Commit,
        Operation::Rollback,
        Operation::Refresh,
        Operation::Evict,
        Operation::ReadField,
        Operation::WriteField,
        Operation::Retrieve,
        Operation::Detach,
        Operation::Attach,
        Operation::Serialize,
        Operation::Begin,
    ];

    /// Kebab-case name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::MakePersistent => "make-persistent",
            Operation::DeletePersistent => "delete-persistent",
            Operation::MakeTransactional => "make-transactional",
            Operation::MakeNontransactional => "make-nontransactional",
            Operation::MakeTransient => "make-transient",
            Operation::Commit => "commit",
            Operation::Rollback => "rollback",
            Operation::Refresh => "refresh",
            Operation::Evict => "evict",
            Operation::ReadField => "read-field",
            Operation::WriteField => "write-field",
            Operation::Retrieve => "retrieve",
            Operation::Detach => "detach",
            Operation::Attach => "attach",
            Operation::Serialize => "serialize",
            Operation::Begin => "begin",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().replace('-', " "))
    }
}

impl FromStr for Operation {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| ParseNameError::new("operation", s))
    }
}

/// An operation together with its arguments, for callers that drive the
/// state machine generically (property tests, the CLI matrix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionRequest {
    /// `transition_make_persistent`.
    MakePersistent,
    /// `transition_delete_persistent`.
    DeletePersistent,
    /// `transition_make_transactional`.
    MakeTransactional {
        /// Reload loaded fields before enlisting.
        refresh_fields: bool,
    },
    /// `transition_make_nontransactional`.
    MakeNontransactional,
    /// `transition_make_transient`.
    MakeTransient {
        /// Load fetch plan fields before detaching.
        use_fetch_plan: bool,
        /// Whether the context detaches all instances on commit.
        detach_all_on_commit: bool,
    },
    /// `transition_commit`.
    Commit,
    /// `transition_rollback`.
    Rollback,
    /// `transition_refresh`.
    Refresh,
    /// `transition_evict`.
    Evict,
    /// `transition_read_field`.
    ReadField {
        /// Whether the field being read is already loaded.
        is_loaded: bool,
    },
    /// `transition_write_field`.
    WriteField,
    /// `transition_retrieve`.
    Retrieve {
        /// Load only the active fetch plan instead of every field.
        fg_only: bool,
    },
    /// `transition_retrieve_fetch_plan`.
    RetrieveWith(FetchPlan),
    /// `transition_detach`.
    Detach,
    /// `transition_attach`.
    Attach,
    /// `transition_serialize`.
    Serialize,
    /// `transition_begin`.
    Begin,
}

impl TransitionRequest {
    /// The operation this request invokes.
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::MakePersistent => Operation::MakePersistent,
            Self::DeletePersistent => Operation::DeletePersistent,
            Self::MakeTransactional { .. } => Operation::MakeTransactional,
            Self::MakeNontransactional => Operation::MakeNontransactional,
            Self::MakeTransient { .. } => Operation::MakeTransient,
            Self::Commit => Operation::Commit,
            Self::Rollback => Operation::Rollback,
            Self::Refresh => Operation::Refresh,
            Self::Evict => Operation::Evict,
            Self::ReadField { .. } => Operation::ReadField,
            Self::WriteField => Operation::WriteField,
            Self::Retrieve { .. } | Self::RetrieveWith(_) => Operation::Retrieve,
            Self::Detach => Operation::Detach,
            Self::Attach => Operation::Attach,
            Self::Serialize => Operation::Serialize,
            Self::Begin => Operation::Begin,
        }
    }

    /// Request for `operation` with plain default arguments: no refresh,
    /// no fetch plan preload, unloaded field, fetch-group-only retrieve.
    #[must_use]
    pub fn with_defaults(operation: Operation, detach_all_on_commit: bool) -> Self {
        match operation {
            Operation::MakePersistent => Self::MakePersistent,
            Operation::DeletePersistent => Self::DeletePersistent,
            Operation::MakeTransactional => Self::MakeTransactional {
                refresh_fields: false,
            },
            Operation::MakeNontransactional => Self::MakeNontransactional,
            Operation::MakeTransient => Self::MakeTransient {
                use_fetch_plan: false,
                detach_all_on_commit,
            },
            Operation::Commit => Self::Commit,
            Operation::Rollback => Self::Rollback,
            Operation::Refresh => Self::Refresh,
            Operation::Evict => Self::Evict,
            Operation::ReadField => Self::ReadField { is_loaded: false },
            Operation::WriteField => Self::WriteField,
            Operation::Retrieve => Self::Retrieve { fg_only: true },
            Operation::Detach => Self::Detach,
            Operation::Attach => Self::Attach,
            Operation::Serialize => Self::Serialize,
            Operation::Begin => Self::Begin,
        }
    }
}

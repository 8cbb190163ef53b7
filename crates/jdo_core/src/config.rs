//! Transaction configuration.

use serde::{Deserialize, Serialize};

/// Options governing how a transaction treats its managed instances.
///
/// These are the flags the lifecycle states consult when picking the next
/// state. `detach_all_on_commit` is a persistence-context setting rather than
/// a transaction flag, but it is carried here so a session has one place to
/// read it from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionOptions {
    /// Optimistic transactions do not lock instances on read.
    pub optimistic: bool,

    /// Allow reading fields while no transaction is active.
    pub nontransactional_read: bool,

    /// Allow writing fields while no transaction is active.
    pub nontransactional_write: bool,

    /// Keep field values after commit instead of hollowing instances.
    pub retain_values: bool,

    /// Restore saved field values on rollback.
    pub restore_values: bool,

    /// Instances are detached when the transaction commits.
    pub detach_all_on_commit: bool,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            optimistic: false,
            nontransactional_read: false,
            nontransactional_write: false,
            retain_values: false,
            restore_values: false,
            detach_all_on_commit: false,
        }
    }
}

impl TransactionOptions {
    /// Creates options with default values (pessimistic, nothing retained).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets optimistic mode.
    #[must_use]
    pub const fn optimistic(mut self, value: bool) -> Self {
        self.optimistic = value;
        self
    }

    /// Sets whether fields can be read outside a transaction.
    #[must_use]
    pub const fn nontransactional_read(mut self, value: bool) -> Self {
        self.nontransactional_read = value;
        self
    }

    /// Sets whether fields can be written outside a transaction.
    #[must_use]
    pub const fn nontransactional_write(mut self, value: bool) -> Self {
        self.nontransactional_write = value;
        self
    }

    /// Sets whether values survive commit.
    #[must_use]
    pub const fn retain_values(mut self, value: bool) -> Self {
        self.retain_values = value;
        self
    }

    /// Sets whether values are restored on rollback.
    #[must_use]
    pub const fn restore_values(mut self, value: bool) -> Self {
        self.restore_values = value;
        self
    }

    /// Sets whether instances detach on commit.
    #[must_use]
    pub const fn detach_all_on_commit(mut self, value: bool) -> Self {
        self.detach_all_on_commit = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = TransactionOptions::default();
        assert!(!options.optimistic);
        assert!(!options.nontransactional_read);
        assert!(!options.retain_values);
        assert!(!options.detach_all_on_commit);
    }

    #[test]
    fn builder_pattern() {
        let options = TransactionOptions::new()
            .optimistic(true)
            .retain_values(true)
            .nontransactional_read(true);

        assert!(options.optimistic);
        assert!(options.retain_values);
        assert!(options.nontransactional_read);
        assert!(!options.restore_values);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let options: TransactionOptions =
            serde_json::from_str(r#"{"optimistic": true}"#).unwrap();
        assert!(options.optimistic);
        assert!(!options.retain_values);
    }
}

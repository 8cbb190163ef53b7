//! In-process transaction.

use super::Transaction;
use crate::config::TransactionOptions;
use crate::error::{LifecycleError, LifecycleResult};
use crate::types::TransactionId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A transaction local to one persistence context.
///
/// The options are fixed at construction. The active flag and the current
/// cycle ID are atomics so the transaction can be shared behind an `Arc`
/// between the session and its state managers.
#[derive(Debug)]
pub struct LocalTransaction {
    /// Flags consulted by the lifecycle states.
    options: TransactionOptions,
    /// Whether a cycle is open.
    active: AtomicBool,
    /// ID of the current (or last) cycle; 0 before the first begin.
    current: AtomicU64,
}

impl LocalTransaction {
    /// Creates an inactive transaction.
    pub fn new(options: TransactionOptions) -> Self {
        Self {
            options,
            active: AtomicBool::new(false),
            current: AtomicU64::new(0),
        }
    }

    /// Creates a transaction that is already active.
    pub fn active(options: TransactionOptions) -> Self {
        let tx = Self::new(options);
        tx.active.store(true, Ordering::SeqCst);
        tx.current.store(1, Ordering::SeqCst);
        tx
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &TransactionOptions {
        &self.options
    }

    /// Returns the ID of the current (or last) cycle.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        TransactionId::new(self.current.load(Ordering::SeqCst))
    }

    /// Opens a new cycle.
    pub fn begin(&self) -> LifecycleResult<TransactionId> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(LifecycleError::TransactionAlreadyActive);
        }
        let id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TransactionId::new(id))
    }

    /// Closes the current cycle.
    pub fn finish(&self) -> LifecycleResult<TransactionId> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Err(LifecycleError::TransactionNotActive);
        }
        Ok(self.id())
    }

    /// Fails unless a cycle is open.
    pub fn ensure_active(&self) -> LifecycleResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(LifecycleError::TransactionNotActive)
        }
    }
}

impl Default for LocalTransaction {
    fn default() -> Self {
        Self::new(TransactionOptions::default())
    }
}

impl Transaction for LocalTransaction {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn optimistic(&self) -> bool {
        self.options.optimistic
    }

    fn nontransactional_read(&self) -> bool {
        self.options.nontransactional_read
    }

    fn nontransactional_write(&self) -> bool {
        self.options.nontransactional_write
    }

    fn retain_values(&self) -> bool {
        self.options.retain_values
    }

    fn restore_values(&self) -> bool {
        self.options.restore_values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transaction_is_inactive() {
        let tx = LocalTransaction::default();
        assert!(!tx.is_active());
        assert_eq!(tx.id().as_u64(), 0);
    }

    #[test]
    fn begin_and_finish_cycle() {
        let tx = LocalTransaction::default();
        let first = tx.begin().unwrap();
        assert!(tx.is_active());
        assert_eq!(tx.finish().unwrap(), first);
        assert!(!tx.is_active());

        let second = tx.begin().unwrap();
        assert!(second > first);
    }

    #[test]
    fn double_begin_is_rejected() {
        let tx = LocalTransaction::default();
        tx.begin().unwrap();
        assert!(matches!(
            tx.begin(),
            Err(LifecycleError::TransactionAlreadyActive)
        ));
    }

    #[test]
    fn finish_without_begin_is_rejected() {
        let tx = LocalTransaction::default();
        assert!(matches!(
            tx.finish(),
            Err(LifecycleError::TransactionNotActive)
        ));
        assert!(tx.ensure_active().is_err());
    }

    #[test]
    fn flags_follow_options() {
        let tx = LocalTransaction::active(TransactionOptions::new().optimistic(true));
        assert!(tx.is_active());
        assert!(tx.optimistic());
        assert!(!tx.is_pessimistic_active());
        assert!(!tx.retain_values());
    }
}

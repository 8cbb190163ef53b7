//! Transaction view consumed by the lifecycle states.
//!
//! The state machine never drives a transaction; it only reads the flags
//! below to choose the next state. [`LocalTransaction`] is the
//! implementation used by [`Session`](crate::Session).

mod local;

pub use local::LocalTransaction;

/// Read-only flags of the transaction owning a managed instance.
pub trait Transaction {
    /// Whether a begin/commit cycle is currently open.
    fn is_active(&self) -> bool;

    /// Whether the transaction runs in optimistic mode.
    fn optimistic(&self) -> bool;

    /// Whether fields may be read while the transaction is inactive.
    fn nontransactional_read(&self) -> bool;

    /// Whether fields may be written while the transaction is inactive.
    fn nontransactional_write(&self) -> bool;

    /// Whether field values survive commit.
    fn retain_values(&self) -> bool;

    /// Whether saved field values are restored on rollback.
    fn restore_values(&self) -> bool;

    /// Active and not optimistic.
    fn is_pessimistic_active(&self) -> bool {
        self.is_active() && !self.optimistic()
    }
}

//! CLI command implementations.

pub mod matrix;
pub mod simulate;
pub mod states;

use clap::Args;
use jdo_core::{ClassMetadata, FieldMetadata, LifecycleError, LifecycleResult, TransactionOptions};
use std::path::PathBuf;

/// Transaction flags shared by `matrix` and `simulate`.
#[derive(Debug, Args)]
pub struct TxArgs {
    /// Start with an active transaction
    #[arg(long)]
    pub active: bool,

    /// Optimistic transaction
    #[arg(long)]
    pub optimistic: bool,

    /// Allow reads outside a transaction
    #[arg(long)]
    pub nontx_read: bool,

    /// Allow writes outside a transaction
    #[arg(long)]
    pub nontx_write: bool,

    /// Keep field values after commit
    #[arg(long)]
    pub retain_values: bool,

    /// Restore field values on rollback
    #[arg(long)]
    pub restore_values: bool,

    /// Detach every instance on commit
    #[arg(long)]
    pub detach_all_on_commit: bool,

    /// Read transaction options from a JSON file; flags given on the
    /// command line are added on top
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,
}

impl TxArgs {
    /// Builds the transaction options and the initial active flag.
    pub fn resolve(&self) -> Result<(TransactionOptions, bool), Box<dyn std::error::Error>> {
        let base = match &self.options {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
                serde_json::from_str::<TransactionOptions>(&text)?
            }
            None => TransactionOptions::default(),
        };
        Ok((self.apply_flags(base), self.active))
    }

    fn apply_flags(&self, base: TransactionOptions) -> TransactionOptions {
        base.optimistic(base.optimistic || self.optimistic)
            .nontransactional_read(base.nontransactional_read || self.nontx_read)
            .nontransactional_write(base.nontransactional_write || self.nontx_write)
            .retain_values(base.retain_values || self.retain_values)
            .restore_values(base.restore_values || self.restore_values)
            .detach_all_on_commit(base.detach_all_on_commit || self.detach_all_on_commit)
    }
}

/// The class every command works with: a key, two default fields and a
/// lazy `bio`.
pub fn sample_class() -> LifecycleResult<ClassMetadata> {
    ClassMetadata::builder("Person")
        .field(FieldMetadata::primary_key("id"))
        .field(FieldMetadata::new("name"))
        .field(FieldMetadata::new("email"))
        .field(FieldMetadata::lazy("bio"))
        .build()
}

/// Short label for an error, without the object id.
pub fn error_kind(err: &LifecycleError) -> &'static str {
    match err {
        LifecycleError::IllegalTransition { .. } => "illegal",
        LifecycleError::NotReadable { .. } => "not readable",
        LifecycleError::NotWritable { .. } => "not writable",
        LifecycleError::InvalidOperation { .. } => "invalid",
        LifecycleError::ObjectNotFound { .. } => "not found",
        LifecycleError::DuplicateObject { .. } => "duplicate",
        LifecycleError::UnknownField { .. } => "unknown field",
        LifecycleError::InvalidMetadata { .. } => "bad metadata",
        LifecycleError::TransactionNotActive => "no transaction",
        LifecycleError::TransactionAlreadyActive => "transaction active",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> TxArgs {
        TxArgs {
            active: false,
            optimistic: false,
            nontx_read: false,
            nontx_write: false,
            retain_values: false,
            restore_values: false,
            detach_all_on_commit: false,
            options: None,
        }
    }

    #[test]
    fn flags_add_to_defaults() {
        let tx = TxArgs {
            active: true,
            optimistic: true,
            retain_values: true,
            ..args()
        };
        let (options, active) = tx.resolve().unwrap();
        assert!(active);
        assert!(options.optimistic && options.retain_values);
        assert!(!options.nontransactional_read);
    }

    #[test]
    fn flags_cannot_clear_file_options() {
        let base = TransactionOptions::default().restore_values(true);
        let options = args().apply_flags(base);
        assert!(options.restore_values);
    }

    #[test]
    fn sample_class_is_valid() {
        let class = sample_class().unwrap();
        assert_eq!(class.field_number("bio"), Some(3));
    }
}

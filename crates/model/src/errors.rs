use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Common error: {0}")]
    Eyre(#[from] eyre::Error),
    #[error("Ledger not found: {}", .0.display())]
    LedgerMissing(PathBuf),
    #[error("Failed to open ledger {}: {source:#}", path.display())]
    Open { path: PathBuf, source: eyre::Error },
    #[error("Failed to persist ledger {}: {source:#}", path.display())]
    Persist { path: PathBuf, source: eyre::Error },
    #[error("Sheet '{sheet}' expects {expected} columns, record has {actual}")]
    SchemaMismatch {
        sheet: String,
        expected: usize,
        actual: usize,
    },
}

impl LedgerError {
    /// Configuration problems that a retry would not fix.
    pub fn is_configuration(&self) -> bool {
        matches!(self, LedgerError::LedgerMissing(_))
    }
}

use crate::{cell::Cell, key::DedupKey};

/// A record that can be appended to a ledger sheet.
pub trait LedgerRow {
    fn header() -> &'static [&'static str];

    fn dedup_key(&self) -> DedupKey;

    /// Cells in header order, with ledger-side normalization applied.
    fn to_cells(&self) -> Vec<Cell>;
}

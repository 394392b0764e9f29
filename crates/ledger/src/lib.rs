use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{info, warn};
use model::{cell::Cell, errors::LedgerError, key::DedupKey, row::LedgerRow};
use storage::workbook::Workbook;

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub path: PathBuf,
    /// Allows creating a fresh ledger when the file is missing.
    pub ephemeral: bool,
}

#[derive(Clone)]
pub struct Ledger {
    config: Arc<LedgerConfig>,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Ledger {
            config: Arc::new(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Appends records whose dedup key is not yet in `sheet`. Returns the number appended.
    pub fn merge<R: LedgerRow>(&self, records: &[R], sheet: &str) -> Result<usize, LedgerError> {
        let (mut book, mut dirty) = self.open()?;

        if !book.has_sheet(sheet) {
            info!("Creating sheet '{}'", sheet);
            dirty = true;
        }
        let mut target = book.add_sheet(sheet)?;
        let header: Vec<Cell> = R::header().iter().map(|name| Cell::text(*name)).collect();
        match target.header() {
            None => {
                target.set_header(&header);
                dirty = true;
            }
            Some(existing) if existing != header => {
                warn!("Sheet '{}' header differs from the expected columns", sheet);
            }
            Some(_) => {}
        }

        let mut seen: HashSet<DedupKey> = target
            .data_rows()
            .iter()
            .filter(|row| !row.iter().all(Cell::is_empty))
            .map(|row| DedupKey::from_cells(row))
            .collect();

        let expected = R::header().len();
        let mut added = 0;
        for record in records {
            let cells = record.to_cells();
            if cells.len() != expected {
                return Err(LedgerError::SchemaMismatch {
                    sheet: sheet.to_owned(),
                    expected,
                    actual: cells.len(),
                });
            }
            if !seen.insert(record.dedup_key()) {
                continue;
            }
            target.push_row(&cells);
            added += 1;
        }

        if added > 0 {
            dirty = true;
        }
        if dirty {
            book.save(&self.config.path)
                .map_err(|source| LedgerError::Persist {
                    path: self.config.path.clone(),
                    source,
                })?;
        }
        info!(
            "Sheet '{}': {} records in, {} appended",
            sheet,
            records.len(),
            added
        );
        Ok(added)
    }

    /// Fails when the ledger is missing and may not be created.
    pub fn check_available(&self) -> Result<(), LedgerError> {
        if self.config.path.exists() || self.config.ephemeral {
            Ok(())
        } else {
            Err(LedgerError::LedgerMissing(self.config.path.clone()))
        }
    }

    fn open(&self) -> Result<(Workbook, bool), LedgerError> {
        self.check_available()?;
        let path = &self.config.path;
        if path.exists() {
            let book = Workbook::open(path).map_err(|source| LedgerError::Open {
                path: path.clone(),
                source,
            })?;
            return Ok((book, false));
        }
        info!("Creating ephemeral ledger at {}", path.display());
        Ok((Workbook::new(), true))
    }
}

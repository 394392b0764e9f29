use std::path::{Path, PathBuf};

use eyre::{eyre, Context as _, Error};
use model::cell::Cell;
use tempfile::NamedTempFile;
use umya_spreadsheet::{reader, writer, CellRawValue, Spreadsheet, Worksheet};

/// An xlsx document edited in place. Cells that are never written keep
/// their values, styles and number formats on save.
pub struct Workbook {
    book: Spreadsheet,
}

impl Workbook {
    pub fn new() -> Self {
        Workbook {
            book: umya_spreadsheet::new_file_empty_worksheet(),
        }
    }

    pub fn open(path: &Path) -> Result<Workbook, Error> {
        let book = reader::xlsx::read(path)
            .map_err(|err| eyre!("Failed to open workbook {}: {}", path.display(), err))?;
        Ok(Workbook { book })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name())
            .collect()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.book.get_sheet_by_name(name).is_some()
    }

    /// All rows of `name` from row 1, trailing empty cells trimmed.
    pub fn rows(&self, name: &str) -> Option<Vec<Vec<Cell>>> {
        self.book.get_sheet_by_name(name).map(read_rows)
    }

    /// Returns the sheet, creating it at the end when missing.
    pub fn add_sheet(&mut self, name: &str) -> Result<Sheet<'_>, Error> {
        if !self.has_sheet(name) {
            self.book
                .new_sheet(name)
                .map_err(|err| eyre!("Failed to add sheet '{}': {}", name, err))?;
        }
        let ws = self
            .book
            .get_sheet_by_name_mut(name)
            .ok_or_else(|| eyre!("Sheet '{}' is missing", name))?;
        Ok(Sheet::new(ws))
    }

    /// Writes a sibling temp file and renames it over `path`.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let dir = parent_dir(path);
        let mut tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        writer::xlsx::write_writer(&self.book, &mut tmp)
            .map_err(|err| eyre!("Failed to write workbook: {}", err))?;
        tmp.as_file()
            .sync_all()
            .context("Failed to flush temp workbook")?;
        tmp.persist(path)
            .map_err(|err| err.error)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Workbook::new()
    }
}

/// Write access to one worksheet. Rows are appended below the last used row.
pub struct Sheet<'a> {
    ws: &'a mut Worksheet,
    next_row: u32,
}

impl<'a> Sheet<'a> {
    fn new(ws: &'a mut Worksheet) -> Self {
        let next_row = (last_used_row(ws) + 1).max(2);
        Sheet { ws, next_row }
    }

    /// Row 1, or `None` when it is missing or blank.
    pub fn header(&self) -> Option<Vec<Cell>> {
        let header = read_row(&*self.ws, 1, self.ws.get_highest_column());
        (!header.is_empty()).then_some(header)
    }

    pub fn set_header(&mut self, header: &[Cell]) {
        write_row(self.ws, 1, header);
    }

    /// Rows 2.. including blank ones.
    pub fn data_rows(&self) -> Vec<Vec<Cell>> {
        read_rows(&*self.ws).into_iter().skip(1).collect()
    }

    pub fn push_row(&mut self, cells: &[Cell]) {
        write_row(self.ws, self.next_row, cells);
        self.next_row += 1;
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn read_cell(ws: &Worksheet, col: u32, row: u32) -> Cell {
    let Some(cell) = ws.get_cell((col, row)) else {
        return Cell::Empty;
    };
    if cell.is_formula() {
        return Cell::Formula(cell.get_formula().trim_start_matches('=').to_owned());
    }
    match cell.get_raw_value() {
        CellRawValue::Empty => Cell::Empty,
        CellRawValue::Numeric(value) => Cell::Number(*value),
        CellRawValue::Bool(value) => Cell::Bool(*value),
        _ => Cell::text(cell.get_value().into_owned()),
    }
}

fn read_row(ws: &Worksheet, row: u32, columns: u32) -> Vec<Cell> {
    let mut cells: Vec<Cell> = (1..=columns).map(|col| read_cell(ws, col, row)).collect();
    while cells.last().map(Cell::is_empty).unwrap_or(false) {
        cells.pop();
    }
    cells
}

fn read_rows(ws: &Worksheet) -> Vec<Vec<Cell>> {
    let columns = ws.get_highest_column();
    (1..=last_used_row(ws))
        .map(|row| read_row(ws, row, columns))
        .collect()
}

/// Styled but empty rows do not count as used.
fn last_used_row(ws: &Worksheet) -> u32 {
    let columns = ws.get_highest_column();
    (1..=ws.get_highest_row())
        .rev()
        .find(|row| (1..=columns).any(|col| !read_cell(ws, col, *row).is_empty()))
        .unwrap_or(0)
}

fn write_row(ws: &mut Worksheet, row: u32, cells: &[Cell]) {
    for (col, value) in (1u32..).zip(cells) {
        let target = ws.get_cell_mut((col, row));
        match value {
            Cell::Empty => {}
            Cell::Text(text) => {
                target.set_value_string(text.as_str());
            }
            Cell::Number(value) => {
                target.set_value_number(*value);
            }
            Cell::Bool(value) => {
                target.set_value_bool(*value);
            }
            Cell::Formula(formula) => {
                target.set_formula(formula.as_str());
            }
        }
    }
}

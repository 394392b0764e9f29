use std::fmt::{self, Display};

use crate::cell::Cell;

/// Number of leading columns that identify a ledger row.
pub const KEY_FIELDS: usize = 5;

const SEPARATOR: &str = "|";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn from_parts<I, S>(parts: I) -> DedupKey
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parts = parts.into_iter();
        let mut key = String::new();
        for idx in 0..KEY_FIELDS {
            if idx > 0 {
                key.push_str(SEPARATOR);
            }
            if let Some(part) = parts.next() {
                key.push_str(part.as_ref());
            }
        }
        DedupKey(key)
    }

    pub fn from_cells(cells: &[Cell]) -> DedupKey {
        DedupKey::from_parts(cells.iter().take(KEY_FIELDS).map(|cell| cell.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_first_five_parts() {
        let key = DedupKey::from_parts(["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!("a|b|c|d|e", key.as_str());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let key = DedupKey::from_parts(["a", "b"]);
        assert_eq!("a|b|||", key.as_str());
        assert_eq!(key, DedupKey::from_cells(&[Cell::text("a"), Cell::text("b")]));
    }

    #[test]
    fn test_cells_and_parts_agree() {
        let cells = vec![
            Cell::text("ClubX"),
            Cell::text("Group Lesson"),
            Cell::text("Kids"),
            Cell::Number(3.0),
            Cell::text("Mon 10:00"),
            Cell::text("John"),
        ];
        let key = DedupKey::from_parts(["ClubX", "Group Lesson", "Kids", "3", "Mon 10:00"]);
        assert_eq!(key, DedupKey::from_cells(&cells));
    }
}

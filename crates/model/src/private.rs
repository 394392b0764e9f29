use serde::{Deserialize, Serialize};

use crate::{cell::Cell, key::DedupKey, row::LedgerRow};

pub const PRIVATE_LESSONS_SHEET: &str = "private lessons";

pub const PRIVATE_LESSON_COLUMNS: [&str; 8] = [
    "Date",
    "StartTime",
    "EndTime",
    "Description",
    "Location",
    "Notes",
    "DurationHours",
    "Kind",
];

pub const PRIVATE_LESSON_KIND: &str = "Private lesson";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateLesson {
    /// `DD-MM-YYYY`
    pub date: String,
    /// `HH:MM`
    pub start_time: String,
    pub end_time: String,
    pub description: String,
    pub location: String,
    pub notes: String,
    pub duration_hours: f64,
    pub kind: String,
}

impl LedgerRow for PrivateLesson {
    fn header() -> &'static [&'static str] {
        &PRIVATE_LESSON_COLUMNS
    }

    fn dedup_key(&self) -> DedupKey {
        DedupKey::from_parts([
            self.date.as_str(),
            self.start_time.as_str(),
            self.end_time.as_str(),
            self.description.as_str(),
            self.location.as_str(),
        ])
    }

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(self.date.as_str()),
            Cell::text(self.start_time.as_str()),
            Cell::text(self.end_time.as_str()),
            Cell::text(self.description.as_str()),
            Cell::text(self.location.as_str()),
            Cell::text(self.notes.as_str()),
            Cell::Number(self.duration_hours),
            Cell::text(self.kind.as_str()),
        ]
    }
}

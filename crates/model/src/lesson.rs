use serde::{Deserialize, Serialize};

use crate::{
    amount::Amount,
    cell::Cell,
    key::{DedupKey, KEY_FIELDS},
    row::LedgerRow,
};

pub const WEBSITE_LESSONS_SHEET: &str = "website lessons";

pub const LESSON_COLUMNS: [&str; 10] = [
    "Club",
    "Offer",
    "TargetGroup",
    "Group",
    "DayTime",
    "Trainer",
    "Attendance",
    "LocationChanged",
    "Status",
    "Amount",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub club: String,
    pub offer: String,
    pub target_group: String,
    pub group: String,
    pub day_time: String,
    pub trainer: String,
    pub attendance: String,
    pub location_changed: String,
    pub status: String,
    /// Amount as shown by the portal. Normalized when written to the ledger.
    pub amount: String,
}

impl LessonRecord {
    pub fn from_fields(fields: [String; 10]) -> LessonRecord {
        let [club, offer, target_group, group, day_time, trainer, attendance, location_changed, status, amount] =
            fields;
        LessonRecord {
            club,
            offer,
            target_group,
            group,
            day_time,
            trainer,
            attendance,
            location_changed,
            status,
            amount,
        }
    }

    pub fn fields(&self) -> [&str; 10] {
        [
            &self.club,
            &self.offer,
            &self.target_group,
            &self.group,
            &self.day_time,
            &self.trainer,
            &self.attendance,
            &self.location_changed,
            &self.status,
            &self.amount,
        ]
    }

    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|field| field.is_empty())
    }
}

impl LedgerRow for LessonRecord {
    fn header() -> &'static [&'static str] {
        &LESSON_COLUMNS
    }

    fn dedup_key(&self) -> DedupKey {
        DedupKey::from_parts(&self.fields()[..KEY_FIELDS])
    }

    fn to_cells(&self) -> Vec<Cell> {
        let fields = self.fields();
        let mut cells: Vec<Cell> = fields[..fields.len() - 1]
            .iter()
            .map(|field| Cell::text(*field))
            .collect();
        cells.push(Amount::normalize(&self.amount).into());
        cells
    }
}

use log::{debug, warn};
use model::lesson::{LessonRecord, LESSON_COLUMNS};

/// Column labels as the portal renders them, in positional order.
pub const PORTAL_HEADER: [&str; 10] = [
    "Club",
    "Aanbod",
    "Doelgroep",
    "Groep",
    "Dag + uur",
    "Trainer",
    "Aanwezigh.",
    "Uur/locatie gewijzigd?",
    "Status",
    "Bedrag",
];

/// Maps cells by position. Extra cells are ignored, missing ones stay empty.
pub fn normalize_row(cells: &[String]) -> LessonRecord {
    let fields: [String; LESSON_COLUMNS.len()] = std::array::from_fn(|idx| {
        cells
            .get(idx)
            .map(|cell| cell.trim().to_owned())
            .unwrap_or_default()
    });
    LessonRecord::from_fields(fields)
}

pub fn normalize<I>(rows: I) -> Vec<LessonRecord>
where
    I: IntoIterator<Item = Vec<String>>,
{
    rows.into_iter()
        .map(|cells| normalize_row(&cells))
        .filter(|record| !record.is_blank())
        .collect()
}

/// Logs a warning when the portal's labels no longer match the positional mapping.
/// Returns true if the header matches.
pub fn check_header(header: &[String]) -> bool {
    if header.is_empty() {
        debug!("Results table has no header row");
        return true;
    }
    let drift: Vec<String> = PORTAL_HEADER
        .iter()
        .enumerate()
        .filter_map(|(idx, expected)| {
            let actual = header.get(idx).map(|h| h.trim()).unwrap_or_default();
            if actual.eq_ignore_ascii_case(expected) {
                None
            } else {
                Some(format!("#{} '{}' != '{}'", idx, actual, expected))
            }
        })
        .collect();
    if drift.is_empty() {
        return true;
    }
    warn!(
        "Results header drifted from the expected columns: {}",
        drift.join(", ")
    );
    false
}

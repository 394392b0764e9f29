use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub login_path: String,
    pub listing_path: String,
    pub trainer_id: String,
    pub status_id: String,
    pub search_type: String,
    /// Substring of a URL that identifies the login page.
    pub login_marker: String,
    pub max_login_attempts: usize,
    pub max_pages: usize,
    /// Rows with fewer non-empty cells are dropped.
    pub min_populated_cells: usize,
    pub timeouts: Timeouts,
}

impl PortalConfig {
    pub fn new(base_url: &str, trainer_id: &str) -> Self {
        PortalConfig {
            base_url: base_url.to_owned(),
            login_path: "/login".to_owned(),
            listing_path: "/nl/academy-opvolging-lessen".to_owned(),
            trainer_id: trainer_id.to_owned(),
            status_id: "5".to_owned(),
            search_type: "lessen".to_owned(),
            login_marker: "login".to_owned(),
            max_login_attempts: 2,
            max_pages: 50,
            min_populated_cells: 3,
            timeouts: Timeouts::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Timeouts {
    pub navigation: Duration,
    pub consent: Duration,
    pub field: Duration,
    pub table: Duration,
    pub login_settle: Duration,
    pub consent_settle: Duration,
    pub page_settle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            navigation: Duration::from_secs(30),
            consent: Duration::from_secs(2),
            field: Duration::from_secs(3),
            table: Duration::from_secs(5),
            login_settle: Duration::from_secs(3),
            consent_settle: Duration::from_secs(1),
            page_settle: Duration::from_secs(2),
        }
    }
}

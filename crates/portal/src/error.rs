use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Navigation to {url} timed out")]
    Timeout { url: String },
    #[error("No element matches {0}")]
    NotFound(String),
    #[error("Element {0} does not accept input")]
    NotEditable(String),
    #[error("Invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("Too many redirects from {0}")]
    RedirectLoop(String),
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A single table row that could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Row {index}: {reason}")]
pub struct RowError {
    pub index: usize,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("the portal rejected the credentials")]
    Rejected,
    #[error("still on the login page after submitting")]
    StillOnLogin,
    #[error("no {0} field accepted input")]
    FieldNotFound(&'static str),
    #[error("gave up after {0} login attempts")]
    AttemptsExhausted(usize),
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("No portal credentials available, run setup first")]
    MissingCredentials,
    #[error("Authentication failed: {0}")]
    Auth(AuthFailure),
    #[error("Browser error: {0}")]
    Page(#[from] PageError),
    #[error("Common error: {0}")]
    Eyre(#[from] eyre::Error),
}

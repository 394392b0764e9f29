use std::time::Duration;

use async_trait::async_trait;
use model::session::SessionState;

use crate::{
    error::{PageError, RowError},
    locator::Locator,
};

/// One rendered results table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Result<Vec<String>, RowError>>,
}

#[async_trait]
pub trait Page: Send + Sync {
    /// Navigates and waits for the page to load, at most `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), PageError>;

    async fn url(&self) -> String;

    /// True if an element matching `locator` is visible within `timeout`.
    async fn wait_visible(&mut self, locator: &Locator, timeout: Duration) -> bool;

    async fn fill(
        &mut self,
        locator: &Locator,
        value: &str,
        timeout: Duration,
    ) -> Result<(), PageError>;

    async fn click(&mut self, locator: &Locator, timeout: Duration) -> Result<(), PageError>;

    async fn count(&self, locator: &Locator) -> usize;

    async fn is_enabled(&self, locator: &Locator) -> bool;

    async fn read_table(&self, locator: &Locator) -> Option<RawTable>;

    async fn settle(&mut self, delay: Duration);

    async fn storage_state(&self) -> SessionState;
}

#[async_trait]
pub trait Browser: Send + Sync {
    type Page: Page;

    /// Opens a page, restoring cookies and storage from `state` when given.
    async fn open(&self, state: Option<SessionState>) -> Result<Self::Page, PageError>;
}

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod listing;
pub mod locator;
pub mod normalize;
pub mod page;

#[cfg(test)]
mod fake;

use std::sync::Arc;

use auth::Authenticator;
use config::PortalConfig;
use error::ScrapeError;
use extract::TableExtractor;
use log::info;
use model::{credentials::Credentials, lesson::LessonRecord, range::DateRange};
use page::{Browser, Page};
use storage::{credentials::CredentialProvider, session::SessionStore};

/// Scrapes lesson records for a date range from the portal.
#[derive(Clone)]
pub struct Portal<B> {
    browser: B,
    config: Arc<PortalConfig>,
    sessions: SessionStore,
    credentials: Arc<dyn CredentialProvider>,
}

impl<B: Browser> Portal<B> {
    pub fn new(
        browser: B,
        config: PortalConfig,
        sessions: SessionStore,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Portal {
            browser,
            config: Arc::new(config),
            sessions,
            credentials,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Session state is saved whether or not the scrape succeeds.
    pub async fn run(&self, range: &DateRange) -> Result<Vec<LessonRecord>, ScrapeError> {
        let creds = self
            .credentials
            .load()
            .ok_or(ScrapeError::MissingCredentials)?;
        let target = listing::listing_url(&self.config, range)?;
        info!("Scraping lessons {}", range);

        let mut page = self.browser.open(self.sessions.load()).await?;
        let result = self.scrape(&mut page, &creds, target.as_str()).await;
        self.sessions.save(&page.storage_state().await);
        result
    }

    async fn scrape(
        &self,
        page: &mut B::Page,
        creds: &Credentials,
        target: &str,
    ) -> Result<Vec<LessonRecord>, ScrapeError> {
        Authenticator::new(&self.config, creds)
            .authenticate(page, target)
            .await?;
        let extracted = TableExtractor::new(&self.config).extract(page).await;
        normalize::check_header(&extracted.header);
        let records = normalize::normalize(extracted.rows);
        info!(
            "Found {} lessons on {} pages",
            records.len(),
            extracted.pages
        );
        Ok(records)
    }
}

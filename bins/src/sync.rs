use std::{sync::Arc, time::Duration};

use calendar::{CalendarConfig, GoogleCalendar, PrivateLessonSource as _};
use env::Env;
use eyre::Error;
use ledger::{Ledger, LedgerConfig};
use log::{info, warn};
use model::{
    lesson::WEBSITE_LESSONS_SHEET, private::PRIVATE_LESSONS_SHEET, range::DateRange,
};
use portal::{config::PortalConfig, http::HttpBrowser, Portal};
use storage::{
    credentials::{CredentialChain, CredentialProvider, EnvCredentials},
    Storage,
};

pub struct SheetSummary {
    pub found: usize,
    pub added: usize,
}

pub struct Summary {
    pub lessons: SheetSummary,
    pub private_lessons: Option<SheetSummary>,
}

/// Environment variables first, then the OS keychain.
pub fn credentials(env: &Env, storage: &Storage) -> CredentialChain {
    CredentialChain::new(vec![
        Box::new(EnvCredentials::new(
            env.portal_username(),
            env.portal_password(),
        )),
        Box::new(storage.keyring.clone()),
    ])
}

pub fn portal_config(env: &Env) -> Result<PortalConfig, Error> {
    let mut config = PortalConfig::new(env.portal_base_url(), env.portal_trainer_id()?);
    config.login_path = env.portal_login_path().to_owned();
    config.listing_path = env.portal_listing_path().to_owned();
    config.status_id = env.portal_status_id().to_owned();
    config.search_type = env.portal_search_type().to_owned();
    config.max_pages = env.portal_max_pages();
    config.timeouts.navigation = Duration::from_secs(env.portal_nav_timeout_secs());
    Ok(config)
}

pub async fn run(env: &Env, range: DateRange) -> Result<Summary, Error> {
    let storage = Storage::new(env.session_state_path());
    let ledger = Ledger::new(LedgerConfig {
        path: env.ledger_path().to_path_buf(),
        ephemeral: env.ledger_ephemeral(),
    });
    ledger.check_available()?;

    let portal = Portal::new(
        HttpBrowser::new(),
        portal_config(env)?,
        storage.sessions.clone(),
        Arc::new(credentials(env, &storage)),
    );
    let lessons = portal.run(&range).await?;
    let added = ledger.merge(&lessons, WEBSITE_LESSONS_SHEET)?;
    let summary = Summary {
        lessons: SheetSummary {
            found: lessons.len(),
            added,
        },
        private_lessons: private_lessons(env, &ledger, &range).await?,
    };
    log_summary(&summary, &ledger);
    Ok(summary)
}

async fn private_lessons(
    env: &Env,
    ledger: &Ledger,
    range: &DateRange,
) -> Result<Option<SheetSummary>, Error> {
    let Some(google) = env.google() else {
        info!("Google Calendar is not configured, skipping private lessons");
        return Ok(None);
    };
    let calendar = GoogleCalendar::new(
        reqwest::Client::new(),
        CalendarConfig {
            client_id: google.client_id.clone(),
            client_secret: google.client_secret.clone(),
            refresh_token: google.refresh_token.clone(),
            calendar_id: google.calendar_id.clone(),
        },
    );
    let lessons = match calendar.private_lessons(range).await {
        Ok(lessons) => lessons,
        Err(err) => {
            warn!("Skipping private lessons: {}", err);
            return Ok(None);
        }
    };
    let added = ledger.merge(&lessons, PRIVATE_LESSONS_SHEET)?;
    Ok(Some(SheetSummary {
        found: lessons.len(),
        added,
    }))
}

fn log_summary(summary: &Summary, ledger: &Ledger) {
    info!(
        "Lessons: {} found, {} added",
        summary.lessons.found, summary.lessons.added
    );
    if let Some(private) = &summary.private_lessons {
        info!(
            "Private lessons: {} found, {} added",
            private.found, private.added
        );
    }
    info!("Ledger: {}", ledger.path().display());
}

/// True when some provider in the chain has a complete set of credentials.
pub fn has_credentials(env: &Env, storage: &Storage) -> bool {
    credentials(env, storage).load().is_some()
}

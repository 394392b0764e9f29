use std::{
    env::{temp_dir, var},
    path::{Path, PathBuf},
    sync::Arc,
};

use dotenv::dotenv;
use eyre::{Context, Error};
use log::debug;

const DEFAULT_BASE_URL: &str = "https://www.tennisenpadelvlaanderen.be";
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_LISTING_PATH: &str = "/nl/academy-opvolging-lessen";
const DEFAULT_STATUS_ID: &str = "5";
const DEFAULT_SEARCH_TYPE: &str = "lessen";
const DEFAULT_NAV_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_PAGES: usize = 50;
const DEFAULT_LEDGER_FILE: &str = "lessons.xlsx";
const DEFAULT_SESSION_FILE: &str = "browser_session.json";

#[derive(Clone)]
pub struct Env(Arc<EnvInner>);

#[derive(Clone)]
pub struct EnvInner {
    portal_base_url: String,
    portal_login_path: String,
    portal_listing_path: String,
    portal_trainer_id: Option<String>,
    portal_status_id: String,
    portal_search_type: String,
    portal_nav_timeout_secs: u64,
    portal_max_pages: usize,
    ledger_path: PathBuf,
    ledger_ephemeral: bool,
    session_state_path: PathBuf,
    portal_username: Option<String>,
    portal_password: Option<String>,
    google: Option<GoogleEnv>,
}

#[derive(Clone)]
pub struct GoogleEnv {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub calendar_id: String,
}

impl Env {
    pub fn portal_base_url(&self) -> &str {
        &self.0.portal_base_url
    }

    pub fn portal_login_path(&self) -> &str {
        &self.0.portal_login_path
    }

    pub fn portal_listing_path(&self) -> &str {
        &self.0.portal_listing_path
    }

    pub fn portal_trainer_id(&self) -> Result<&str, Error> {
        self.0
            .portal_trainer_id
            .as_deref()
            .ok_or_else(|| eyre::eyre!("PORTAL_TRAINER_ID is not set"))
    }

    pub fn portal_status_id(&self) -> &str {
        &self.0.portal_status_id
    }

    pub fn portal_search_type(&self) -> &str {
        &self.0.portal_search_type
    }

    pub fn portal_nav_timeout_secs(&self) -> u64 {
        self.0.portal_nav_timeout_secs
    }

    pub fn portal_max_pages(&self) -> usize {
        self.0.portal_max_pages
    }

    pub fn ledger_path(&self) -> &Path {
        &self.0.ledger_path
    }

    pub fn ledger_ephemeral(&self) -> bool {
        self.0.ledger_ephemeral
    }

    pub fn session_state_path(&self) -> &Path {
        &self.0.session_state_path
    }

    pub fn portal_username(&self) -> Option<&str> {
        self.0.portal_username.as_deref()
    }

    pub fn portal_password(&self) -> Option<&str> {
        self.0.portal_password.as_deref()
    }

    pub fn google(&self) -> Option<&GoogleEnv> {
        self.0.google.as_ref()
    }

    pub fn load() -> Result<Env, Error> {
        if let Err(err) = dotenv() {
            debug!("No .env file loaded: {}", err);
        }

        let ledger_ephemeral = flag("LEDGER_EPHEMERAL") || flag("CI") || flag("GITHUB_ACTIONS");
        let ledger_path = match non_empty("LEDGER_PATH") {
            Some(path) => PathBuf::from(path),
            None if ledger_ephemeral => temp_dir().join(DEFAULT_LEDGER_FILE),
            None => PathBuf::from(DEFAULT_LEDGER_FILE),
        };

        Ok(Env(Arc::new(EnvInner {
            portal_base_url: var_or("PORTAL_BASE_URL", DEFAULT_BASE_URL),
            portal_login_path: var_or("PORTAL_LOGIN_PATH", DEFAULT_LOGIN_PATH),
            portal_listing_path: var_or("PORTAL_LISTING_PATH", DEFAULT_LISTING_PATH),
            portal_trainer_id: non_empty("PORTAL_TRAINER_ID"),
            portal_status_id: var_or("PORTAL_STATUS_ID", DEFAULT_STATUS_ID),
            portal_search_type: var_or("PORTAL_SEARCH_TYPE", DEFAULT_SEARCH_TYPE),
            portal_nav_timeout_secs: parse_or("PORTAL_NAV_TIMEOUT_SECS", DEFAULT_NAV_TIMEOUT_SECS)?,
            portal_max_pages: parse_or("PORTAL_MAX_PAGES", DEFAULT_MAX_PAGES)?,
            ledger_path,
            ledger_ephemeral,
            session_state_path: PathBuf::from(var_or("SESSION_STATE_PATH", DEFAULT_SESSION_FILE)),
            portal_username: non_empty("PORTAL_USERNAME"),
            portal_password: non_empty("PORTAL_PASSWORD"),
            google: load_google(),
        })))
    }
}

fn load_google() -> Option<GoogleEnv> {
    Some(GoogleEnv {
        client_id: non_empty("GOOGLE_CLIENT_ID")?,
        client_secret: non_empty("GOOGLE_CLIENT_SECRET")?,
        refresh_token: non_empty("GOOGLE_REFRESH_TOKEN")?,
        calendar_id: var_or("GOOGLE_CALENDAR_ID", "primary"),
    })
}

fn non_empty(name: &str) -> Option<String> {
    var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    non_empty(name).unwrap_or_else(|| default.to_owned())
}

fn flag(name: &str) -> bool {
    non_empty(name)
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn parse_or<T>(name: &str, default: T) -> Result<T, Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty(name) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} has invalid value '{}'", name, value)),
        None => Ok(default),
    }
}

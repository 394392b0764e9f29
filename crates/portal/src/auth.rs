use log::{debug, info, warn};
use model::credentials::Credentials;

use crate::{
    config::PortalConfig,
    error::{AuthFailure, PageError, ScrapeError},
    listing::login_url,
    locator::{self, Locator},
    page::Page,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Navigating,
    LoginRequired,
    LoggingIn,
    /// `at_target` is false until the listing page has been reloaded after a login.
    Authenticated { at_target: bool },
    Failed(AuthFailure),
}

/// Drives a page to the authenticated listing view.
pub struct Authenticator<'a> {
    config: &'a PortalConfig,
    creds: &'a Credentials,
}

impl<'a> Authenticator<'a> {
    pub fn new(config: &'a PortalConfig, creds: &'a Credentials) -> Self {
        Authenticator { config, creds }
    }

    pub async fn authenticate<P: Page>(&self, page: &mut P, target: &str) -> Result<(), ScrapeError> {
        let mut state = AuthState::Unauthenticated;
        let mut attempts = 0;
        loop {
            let next = match &state {
                AuthState::Unauthenticated => {
                    self.navigate(page, target).await;
                    AuthState::Navigating
                }
                AuthState::Navigating => {
                    if self.on_login_page(page).await {
                        AuthState::LoginRequired
                    } else {
                        AuthState::Authenticated { at_target: true }
                    }
                }
                AuthState::LoginRequired => {
                    if attempts >= self.config.max_login_attempts {
                        AuthState::Failed(AuthFailure::AttemptsExhausted(attempts))
                    } else {
                        attempts += 1;
                        match self.login(page).await? {
                            Ok(()) => AuthState::LoggingIn,
                            Err(failure) => AuthState::Failed(failure),
                        }
                    }
                }
                AuthState::LoggingIn => {
                    page.settle(self.config.timeouts.login_settle).await;
                    if page.count(&locator::login_failed()).await > 0 {
                        AuthState::Failed(AuthFailure::Rejected)
                    } else if self.on_login_page(page).await {
                        AuthState::Failed(AuthFailure::StillOnLogin)
                    } else {
                        AuthState::Authenticated { at_target: false }
                    }
                }
                AuthState::Authenticated { at_target: false } => {
                    self.navigate(page, target).await;
                    if self.on_login_page(page).await {
                        warn!("Listing redirected to login again");
                        AuthState::LoginRequired
                    } else {
                        AuthState::Authenticated { at_target: true }
                    }
                }
                AuthState::Authenticated { at_target: true } => {
                    info!("Authenticated");
                    return Ok(());
                }
                AuthState::Failed(failure) => {
                    return Err(ScrapeError::Auth(failure.clone()));
                }
            };
            debug!("Auth: {:?} -> {:?}", state, next);
            state = next;
        }
    }

    async fn navigate<P: Page>(&self, page: &mut P, url: &str) {
        if let Err(err) = page.goto(url, self.config.timeouts.navigation).await {
            warn!("Navigation to {} incomplete: {}", url, err);
        }
    }

    async fn on_login_page<P: Page>(&self, page: &P) -> bool {
        let url = page.url().await.to_lowercase();
        url.contains(&self.config.login_marker.to_lowercase()) && !url.contains("dashboard")
    }

    /// Outer error aborts the run, inner one is a failed login.
    async fn login<P: Page>(&self, page: &mut P) -> Result<Result<(), AuthFailure>, PageError> {
        let login = login_url(self.config)?;
        if !self.on_login_page(page).await {
            self.navigate(page, login.as_str()).await;
        }
        self.dismiss_consent(page).await;

        if !self
            .fill_first(page, &locator::username_fields(), &self.creds.username)
            .await
        {
            return Ok(Err(AuthFailure::FieldNotFound("username")));
        }
        if !self
            .fill_first(page, &locator::password_fields(), &self.creds.password)
            .await
        {
            return Ok(Err(AuthFailure::FieldNotFound("password")));
        }
        if !self.click_first(page, &locator::submit_buttons()).await {
            return Ok(Err(AuthFailure::FieldNotFound("submit")));
        }
        info!("Submitted login form");
        Ok(Ok(()))
    }

    async fn dismiss_consent<P: Page>(&self, page: &mut P) {
        let timeouts = &self.config.timeouts;
        for candidate in locator::consent_buttons() {
            if !page.wait_visible(&candidate, timeouts.consent).await {
                continue;
            }
            match page.click(&candidate, timeouts.consent).await {
                Ok(()) => {
                    debug!("Dismissed consent banner via {}", candidate);
                    page.settle(timeouts.consent_settle).await;
                    return;
                }
                Err(err) => debug!("Consent {} not clickable: {}", candidate, err),
            }
        }
    }

    async fn fill_first<P: Page>(&self, page: &mut P, candidates: &[Locator], value: &str) -> bool {
        for candidate in candidates {
            match page.fill(candidate, value, self.config.timeouts.field).await {
                Ok(()) => return true,
                Err(err) => debug!("Field {} skipped: {}", candidate, err),
            }
        }
        false
    }

    async fn click_first<P: Page>(&self, page: &mut P, candidates: &[Locator]) -> bool {
        for candidate in candidates {
            if !page.wait_visible(candidate, self.config.timeouts.field).await {
                continue;
            }
            match page.click(candidate, self.config.timeouts.field).await {
                Ok(()) => return true,
                Err(err) => debug!("Button {} skipped: {}", candidate, err),
            }
        }
        false
    }
}

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use model::session::SessionState;

use crate::{
    error::PageError,
    locator::{self, Locator},
    page::{Browser, Page, RawTable},
};

pub const LOGIN_URL: &str = "https://portal.test/login";
pub const DASHBOARD_URL: &str = "https://portal.test/dashboard";
pub const TARGET_URL: &str = "https://portal.test/nl/lessons?trainerId=1#hash_results";

const LOGGED_IN: &[u8] = b"auth=1";

/// Scripted portal behaviour.
#[derive(Clone)]
pub struct FakeSite {
    pub logged_in: bool,
    pub password_ok: bool,
    pub consent_banner: bool,
    pub username_field: Option<Locator>,
    pub password_field: Locator,
    pub submit: Locator,
    /// Number of listing visits that bounce back to the login page after a login.
    pub session_expires: usize,
    pub slow_navigation: bool,
    pub table: Locator,
    pub pages: Vec<RawTable>,
    pub next: Locator,
    /// Next control stays on the last page but is disabled.
    pub next_disabled_on_last: bool,
    /// Next control on the last page re-renders the same page.
    pub next_repeats_last: bool,
    /// Next control on the last page jumps back to this page.
    pub next_cycles_to: Option<usize>,
}

impl Default for FakeSite {
    fn default() -> Self {
        FakeSite {
            logged_in: false,
            password_ok: true,
            consent_banner: false,
            username_field: Some(Locator::css("input[name=\"login\"]")),
            password_field: Locator::label("Wachtwoord"),
            submit: Locator::button("Inloggen"),
            session_expires: 0,
            slow_navigation: false,
            table: Locator::css("table.results-table"),
            pages: Vec::new(),
            next: Locator::text("a", "›"),
            next_disabled_on_last: false,
            next_repeats_last: false,
            next_cycles_to: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeCalls {
    pub gotos: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub submits: usize,
    pub consent_dismissed: bool,
    pub table_reads: usize,
    pub page_visits: Vec<usize>,
    pub next_clicks: usize,
    pub settles: usize,
}

pub struct FakePage {
    site: FakeSite,
    url: String,
    failure_shown: bool,
    page_idx: usize,
    calls: Arc<Mutex<FakeCalls>>,
}

impl FakePage {
    pub fn new(site: FakeSite) -> Self {
        FakePage::with_calls(site, Arc::new(Mutex::new(FakeCalls::default())))
    }

    fn with_calls(site: FakeSite, calls: Arc<Mutex<FakeCalls>>) -> Self {
        calls.lock().unwrap().page_visits = vec![0; site.pages.len()];
        FakePage {
            site,
            url: "about:blank".to_owned(),
            failure_shown: false,
            page_idx: 0,
            calls,
        }
    }

    pub fn calls(&self) -> FakeCalls {
        self.calls.lock().unwrap().clone()
    }

    fn on_login(&self) -> bool {
        self.url.starts_with(LOGIN_URL)
    }

    fn on_listing(&self) -> bool {
        !self.on_login() && self.url != DASHBOARD_URL && self.url != "about:blank"
    }

    fn has_next(&self) -> bool {
        if !self.on_listing() || self.site.pages.is_empty() {
            return false;
        }
        self.page_idx + 1 < self.site.pages.len()
            || self.site.next_disabled_on_last
            || self.site.next_repeats_last
            || self.site.next_cycles_to.is_some()
    }

    fn next_enabled(&self) -> bool {
        self.page_idx + 1 < self.site.pages.len()
            || self.site.next_repeats_last
            || self.site.next_cycles_to.is_some()
    }

    fn consent_locator() -> Locator {
        Locator::css("#onetrust-accept-btn-handler")
    }

    fn visible(&self, locator: &Locator) -> bool {
        if self.site.consent_banner
            && !self.calls.lock().unwrap().consent_dismissed
            && *locator == FakePage::consent_locator()
        {
            return true;
        }
        if self.on_login() {
            return self.site.username_field.as_ref() == Some(locator)
                || *locator == self.site.password_field
                || *locator == self.site.submit;
        }
        if self.on_listing() && !self.site.pages.is_empty() {
            return *locator == self.site.table || (*locator == self.site.next && self.has_next());
        }
        false
    }

    fn visit(&mut self, idx: usize) {
        self.page_idx = idx;
        if let Some(visits) = self.calls.lock().unwrap().page_visits.get_mut(idx) {
            *visits += 1;
        }
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<(), PageError> {
        self.calls.lock().unwrap().gotos.push(url.to_owned());
        if url.starts_with(LOGIN_URL) {
            self.url = url.to_owned();
        } else if self.site.logged_in && self.site.session_expires == 0 {
            self.url = url.to_owned();
            self.visit(0);
        } else {
            if self.site.logged_in {
                self.site.session_expires -= 1;
                self.site.logged_in = false;
            }
            self.url = format!("{}?redirect=lessons", LOGIN_URL);
        }
        if self.site.slow_navigation {
            return Err(PageError::Timeout {
                url: url.to_owned(),
            });
        }
        Ok(())
    }

    async fn url(&self) -> String {
        self.url.clone()
    }

    async fn wait_visible(&mut self, locator: &Locator, _timeout: Duration) -> bool {
        self.visible(locator)
    }

    async fn fill(
        &mut self,
        locator: &Locator,
        value: &str,
        _timeout: Duration,
    ) -> Result<(), PageError> {
        let editable = self.on_login()
            && (self.site.username_field.as_ref() == Some(locator)
                || *locator == self.site.password_field);
        if !editable {
            return Err(PageError::NotFound(locator.to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .fills
            .push((locator.to_string(), value.to_owned()));
        Ok(())
    }

    async fn click(&mut self, locator: &Locator, _timeout: Duration) -> Result<(), PageError> {
        if !self.visible(locator) {
            return Err(PageError::NotFound(locator.to_string()));
        }
        if *locator == FakePage::consent_locator() {
            self.calls.lock().unwrap().consent_dismissed = true;
        } else if *locator == self.site.submit {
            self.calls.lock().unwrap().submits += 1;
            if self.site.password_ok {
                self.site.logged_in = true;
                self.url = DASHBOARD_URL.to_owned();
            } else {
                self.failure_shown = true;
            }
        } else if *locator == self.site.next {
            self.calls.lock().unwrap().next_clicks += 1;
            if self.next_enabled() {
                let last = self.site.pages.len() - 1;
                let idx = match self.site.next_cycles_to {
                    Some(first) if self.page_idx == last => first,
                    _ => (self.page_idx + 1).min(last),
                };
                self.visit(idx);
            }
        }
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> usize {
        if *locator == locator::login_failed() {
            return self.failure_shown as usize;
        }
        self.visible(locator) as usize
    }

    async fn is_enabled(&self, locator: &Locator) -> bool {
        if *locator == self.site.next {
            return self.next_enabled();
        }
        true
    }

    async fn read_table(&self, locator: &Locator) -> Option<RawTable> {
        if !self.visible(locator) || *locator != self.site.table {
            return None;
        }
        self.calls.lock().unwrap().table_reads += 1;
        self.site.pages.get(self.page_idx).cloned()
    }

    async fn settle(&mut self, _delay: Duration) {
        self.calls.lock().unwrap().settles += 1;
    }

    async fn storage_state(&self) -> SessionState {
        if self.site.logged_in {
            SessionState::new(LOGGED_IN.to_vec())
        } else {
            SessionState::new(b"auth=0".to_vec())
        }
    }
}

/// Hands out one `FakePage` per `open`, restoring the login from session state.
pub struct FakeBrowser {
    site: FakeSite,
    calls: Arc<Mutex<FakeCalls>>,
}

impl FakeBrowser {
    pub fn new(site: FakeSite) -> Self {
        FakeBrowser {
            site,
            calls: Arc::new(Mutex::new(FakeCalls::default())),
        }
    }

    pub fn calls(&self) -> FakeCalls {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    type Page = FakePage;

    async fn open(&self, state: Option<SessionState>) -> Result<FakePage, PageError> {
        let mut site = self.site.clone();
        if state.map(|s| s.as_bytes() == LOGGED_IN).unwrap_or(false) {
            site.logged_in = true;
        }
        Ok(FakePage::with_calls(site, self.calls.clone()))
    }
}

pub fn table(header: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable {
        header: header.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| Ok(row.iter().map(|cell| cell.to_string()).collect()))
            .collect(),
    }
}

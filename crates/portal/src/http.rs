use std::{
    collections::HashMap,
    sync::{Arc, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use log::{debug, warn};
use model::session::SessionState;
use reqwest::{header::LOCATION, redirect::Policy, Client};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{
    error::{PageError, RowError},
    locator::Locator,
    page::{Browser, Page, RawTable},
};

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko)";
const MAX_REDIRECTS: usize = 10;
const BLANK: &str = "about:blank";

/// Opens pages backed by a cookie jar restored from the saved session.
#[derive(Clone, Default)]
pub struct HttpBrowser;

impl HttpBrowser {
    pub fn new() -> Self {
        HttpBrowser
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    type Page = HttpPage;

    async fn open(&self, state: Option<SessionState>) -> Result<HttpPage, PageError> {
        let store = match state {
            Some(state) => load_cookies(&state),
            None => CookieStore::default(),
        };
        let jar = Arc::new(CookieStoreMutex::new(store));
        let client = Client::builder()
            .redirect(Policy::none())
            .user_agent(USER_AGENT)
            .cookie_provider(jar.clone())
            .build()?;
        Ok(HttpPage {
            client,
            jar,
            url: None,
            html: String::new(),
            fills: HashMap::new(),
        })
    }
}

/// Cookies are the only state a server-rendered portal keeps between runs.
fn load_cookies(state: &SessionState) -> CookieStore {
    cookie_store::serde::json::load(state.as_bytes()).unwrap_or_else(|err| {
        warn!("Ignoring unreadable session state: {}", err);
        CookieStore::default()
    })
}

/// Session cookies are kept too, the portal login lives in one.
fn save_cookies(jar: &CookieStoreMutex) -> SessionState {
    let store = jar.lock().unwrap_or_else(PoisonError::into_inner);
    let mut buf = Vec::new();
    if let Err(err) =
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&store, &mut buf)
    {
        warn!("Failed to serialize cookies: {}", err);
        buf.clear();
    }
    SessionState::new(buf)
}

/// A page driven over plain HTTP. Forms are submitted the way a browser
/// would post them; script-only controls do nothing when clicked.
pub struct HttpPage {
    client: Client,
    jar: Arc<CookieStoreMutex>,
    url: Option<Url>,
    html: String,
    /// Values typed into fields, keyed by field name.
    fills: HashMap<String, String>,
}

enum Request {
    Get(Url),
    Post(Url, Vec<(String, String)>),
}

impl Request {
    fn url(&self) -> &Url {
        match self {
            Request::Get(url) | Request::Post(url, _) => url,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Action {
    Navigate(Url),
    Submit {
        method: FormMethod,
        action: Url,
        fields: Vec<(String, String)>,
    },
    Inert,
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum FormMethod {
    Get,
    Post,
}

impl HttpPage {
    async fn load(&mut self, request: Request, timeout: Duration) -> Result<(), PageError> {
        let target = request.url().to_string();
        match tokio::time::timeout(timeout, self.follow(request)).await {
            Ok(result) => result,
            Err(_) => Err(PageError::Timeout { url: target }),
        }
    }

    async fn follow(&mut self, mut request: Request) -> Result<(), PageError> {
        for _ in 0..MAX_REDIRECTS {
            let current = request.url().clone();
            let builder = match &request {
                Request::Get(url) => self.client.get(url.clone()),
                Request::Post(url, fields) => self.client.post(url.clone()).form(fields),
            };
            let response = builder.send().await?;

            if response.status().is_redirection() {
                if let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                {
                    let next = current.join(location)?;
                    debug!("Redirect {} -> {}", current, next);
                    request = Request::Get(next);
                    continue;
                }
            }

            let mut landed = response.url().clone();
            if landed.fragment().is_none() {
                landed.set_fragment(current.fragment());
            }
            self.html = response.text().await?;
            self.url = Some(landed);
            self.fills.clear();
            return Ok(());
        }
        Err(PageError::RedirectLoop(request.url().to_string()))
    }

    fn base(&self) -> Result<Url, PageError> {
        match &self.url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(BLANK)?),
        }
    }
}

#[async_trait]
impl Page for HttpPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), PageError> {
        let url = Url::parse(url)?;
        self.load(Request::Get(url), timeout).await
    }

    async fn url(&self) -> String {
        self.url
            .as_ref()
            .map(Url::to_string)
            .unwrap_or_else(|| BLANK.to_owned())
    }

    async fn wait_visible(&mut self, locator: &Locator, _timeout: Duration) -> bool {
        let doc = Html::parse_document(&self.html);
        !visible_matches(&doc, locator).is_empty()
    }

    async fn fill(
        &mut self,
        locator: &Locator,
        value: &str,
        _timeout: Duration,
    ) -> Result<(), PageError> {
        let name = {
            let doc = Html::parse_document(&self.html);
            let element = visible_matches(&doc, locator)
                .into_iter()
                .next()
                .ok_or_else(|| PageError::NotFound(locator.to_string()))?;
            field_name(element).ok_or_else(|| PageError::NotEditable(locator.to_string()))?
        };
        self.fills.insert(name, value.to_owned());
        Ok(())
    }

    async fn click(&mut self, locator: &Locator, timeout: Duration) -> Result<(), PageError> {
        let base = self.base()?;
        let action = {
            let doc = Html::parse_document(&self.html);
            let element = visible_matches(&doc, locator)
                .into_iter()
                .next()
                .ok_or_else(|| PageError::NotFound(locator.to_string()))?;
            click_action(element, &base, &self.fills)?
        };
        match action {
            Action::Navigate(url) => self.load(Request::Get(url), timeout).await,
            Action::Submit {
                method: FormMethod::Get,
                mut action,
                fields,
            } => {
                action.query_pairs_mut().clear().extend_pairs(fields);
                self.load(Request::Get(action), timeout).await
            }
            Action::Submit {
                method: FormMethod::Post,
                action,
                fields,
            } => self.load(Request::Post(action, fields), timeout).await,
            Action::Inert => {
                debug!("{} has no effect without scripts", locator);
                Ok(())
            }
        }
    }

    async fn count(&self, locator: &Locator) -> usize {
        let doc = Html::parse_document(&self.html);
        visible_matches(&doc, locator).len()
    }

    async fn is_enabled(&self, locator: &Locator) -> bool {
        let doc = Html::parse_document(&self.html);
        visible_matches(&doc, locator)
            .first()
            .map(|element| is_enabled(*element))
            .unwrap_or(false)
    }

    async fn read_table(&self, locator: &Locator) -> Option<RawTable> {
        let doc = Html::parse_document(&self.html);
        let element = visible_matches(&doc, locator).into_iter().next()?;
        Some(read_table(element))
    }

    async fn settle(&mut self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }

    async fn storage_state(&self) -> SessionState {
        save_cookies(&self.jar)
    }
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(err) => {
            debug!("Bad selector {}: {}", css, err);
            None
        }
    }
}

fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => scope.select(&selector).collect(),
        None => Vec::new(),
    }
}

fn text_of(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_hidden(element: ElementRef) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() || value.attr("aria-hidden") == Some("true") {
        return true;
    }
    if value.name() == "input" && value.attr("type") == Some("hidden") {
        return true;
    }
    value
        .attr("style")
        .map(|style| {
            let style: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

fn is_visible(element: ElementRef) -> bool {
    !is_hidden(element)
        && !element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(is_hidden)
}

fn is_enabled(element: ElementRef) -> bool {
    let disabled = |el: ElementRef| {
        let value = el.value();
        value.attr("disabled").is_some()
            || value.attr("aria-disabled") == Some("true")
            || value.classes().any(|class| class == "disabled")
    };
    if disabled(element) {
        return false;
    }
    !element
        .parent()
        .and_then(ElementRef::wrap)
        .map(disabled)
        .unwrap_or(false)
}

fn matches<'a>(doc: &'a Html, locator: &Locator) -> Vec<ElementRef<'a>> {
    let root = doc.root_element();
    match locator {
        Locator::Css(css) => select_all(root, css),
        Locator::Text { css, text } => select_all(root, css)
            .into_iter()
            .filter(|element| text_of(*element).contains(text.as_str()))
            .collect(),
        Locator::Label(text) => labelled(root, text),
        Locator::Button(name) => select_all(
            root,
            "button, input[type=\"submit\"], input[type=\"button\"], [role=\"button\"]",
        )
        .into_iter()
        .filter(|element| {
            text_of(*element).contains(name.as_str())
                || element
                    .value()
                    .attr("value")
                    .map(|value| value.contains(name.as_str()))
                    .unwrap_or(false)
        })
        .collect(),
    }
}

fn labelled<'a>(root: ElementRef<'a>, text: &str) -> Vec<ElementRef<'a>> {
    let mut found = Vec::new();
    for label in select_all(root, "label") {
        if !text_of(label).contains(text) {
            continue;
        }
        let control = match label.value().attr("for") {
            Some(id) => select_all(root, &format!("[id=\"{}\"]", id.replace('"', "\\\""))),
            None => select_all(label, "input, textarea, select"),
        };
        found.extend(control.into_iter().take(1));
    }
    found.extend(
        select_all(root, "input, textarea")
            .into_iter()
            .filter(|element| element.value().attr("aria-label") == Some(text)),
    );
    found
}

fn visible_matches<'a>(doc: &'a Html, locator: &Locator) -> Vec<ElementRef<'a>> {
    matches(doc, locator)
        .into_iter()
        .filter(|element| is_visible(*element))
        .collect()
}

/// Name under which an editable field is submitted.
fn field_name(element: ElementRef) -> Option<String> {
    let value = element.value();
    let editable = match value.name() {
        "textarea" => true,
        "input" => !matches!(
            value.attr("type").map(str::to_ascii_lowercase).as_deref(),
            Some("hidden" | "submit" | "button" | "checkbox" | "radio" | "file" | "image" | "reset")
        ),
        _ => false,
    };
    if !editable || value.attr("disabled").is_some() || value.attr("readonly").is_some() {
        return None;
    }
    value.attr("name").map(ToOwned::to_owned)
}

fn click_action(
    element: ElementRef,
    base: &Url,
    fills: &HashMap<String, String>,
) -> Result<Action, PageError> {
    let value = element.value();
    if value.name() == "a" {
        return Ok(match value.attr("href").map(str::trim) {
            Some(href) if !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:") => {
                Action::Navigate(base.join(href)?)
            }
            _ => Action::Inert,
        });
    }

    let kind = value.attr("type").map(str::to_ascii_lowercase);
    let submits = match value.name() {
        "button" => kind.as_deref().map(|k| k == "submit").unwrap_or(true),
        "input" => matches!(kind.as_deref(), Some("submit" | "image")),
        _ => false,
    };
    if !submits {
        return Ok(Action::Inert);
    }
    let Some(form) = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "form")
    else {
        return Ok(Action::Inert);
    };

    let method = match form.value().attr("method").map(str::to_ascii_lowercase).as_deref() {
        Some("post") => FormMethod::Post,
        _ => FormMethod::Get,
    };
    let mut action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => base.join(action)?,
        _ => base.clone(),
    };
    action.set_fragment(None);

    let mut fields = form_fields(form, fills);
    if let (Some(name), submitter) = (value.attr("name"), value.attr("value")) {
        fields.push((name.to_owned(), submitter.unwrap_or_default().to_owned()));
    }
    Ok(Action::Submit {
        method,
        action,
        fields,
    })
}

fn form_fields(form: ElementRef, fills: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for control in select_all(form, "input, textarea, select") {
        let value = control.value();
        let Some(name) = value.attr("name") else {
            continue;
        };
        if value.attr("disabled").is_some() {
            continue;
        }
        let kind = value.attr("type").map(str::to_ascii_lowercase);
        let current = match (value.name(), kind.as_deref()) {
            ("input", Some("submit" | "button" | "image" | "reset" | "file")) => continue,
            ("input", Some("checkbox" | "radio")) => {
                if value.attr("checked").is_none() {
                    continue;
                }
                value.attr("value").unwrap_or("on").to_owned()
            }
            ("textarea", _) => control.text().collect(),
            ("select", _) => selected_option(control),
            _ => value.attr("value").unwrap_or_default().to_owned(),
        };
        let current = fills.get(name).cloned().unwrap_or(current);
        fields.push((name.to_owned(), current));
    }
    fields
}

fn selected_option(select: ElementRef) -> String {
    let options = select_all(select, "option");
    let chosen = options
        .iter()
        .find(|option| option.value().attr("selected").is_some())
        .or_else(|| options.first());
    match chosen {
        Some(option) => option
            .value()
            .attr("value")
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| text_of(*option)),
        None => String::new(),
    }
}

fn row_cells(row: ElementRef, css: &str) -> Vec<String> {
    select_all(row, css).into_iter().map(text_of).collect()
}

fn read_table(table: ElementRef) -> RawTable {
    if table.value().name() != "table" {
        let header = select_all(table, "[role=\"row\"]")
            .into_iter()
            .map(|row| row_cells(row, "[role=\"columnheader\"]"))
            .find(|cells| !cells.is_empty())
            .unwrap_or_default();
        let rows = select_all(table, "[role=\"row\"]")
            .into_iter()
            .map(|row| row_cells(row, "[role=\"cell\"]"))
            .filter(|cells| !cells.is_empty())
            .map(Ok)
            .collect();
        return RawTable { header, rows };
    }

    let all_rows = select_all(table, "tr");
    let header_row = select_all(table, "thead tr").into_iter().next().or_else(|| {
        all_rows
            .first()
            .copied()
            .filter(|row| row_cells(*row, "td").is_empty() && !row_cells(*row, "th").is_empty())
    });
    let header = header_row
        .map(|row| row_cells(row, "th, td"))
        .unwrap_or_default();
    let in_head = |row: &ElementRef| {
        row.ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| el.value().name() == "thead")
    };

    let rows = all_rows
        .into_iter()
        .filter(|row| Some(*row) != header_row && !in_head(row))
        .enumerate()
        .map(|(index, row)| {
            let cells = row_cells(row, "td");
            if cells.is_empty() && !row_cells(row, "th").is_empty() {
                Err(RowError {
                    index,
                    reason: "header cells in table body".to_owned(),
                })
            } else {
                Ok(cells)
            }
        })
        .collect();
    RawTable { header, rows }
}

#[cfg(test)]
mod tests {
    use reqwest::{cookie::CookieStore as _, header::HeaderValue};

    use super::*;

    const LOGIN_PAGE: &str = r#"
        <html><body>
          <div id="onetrust-banner"><button id="onetrust-accept-btn-handler">Alle cookies accepteren</button></div>
          <form method="post" action="/login?p_p_id=login">
            <input type="hidden" name="formDate" value="42">
            <label for="user">Lidnummer of e-mailadres</label>
            <input id="user" name="login" type="text" placeholder="Lidnummer">
            <label>Wachtwoord <input name="password" type="password"></label>
            <input type="checkbox" name="remember" checked>
            <select name="lang"><option value="en">EN</option><option value="nl" selected>NL</option></select>
            <button type="submit">Inloggen</button>
          </form>
          <input name="outside" type="text" style="display: none">
        </body></html>
    "#;

    const LISTING_PAGE: &str = r##"
        <html><body>
          <div id="hash_results">
            <table class="results-table">
              <thead><tr><th>Club</th><th>Aanbod</th><th>Bedrag</th></tr></thead>
              <tbody>
                <tr><td>ClubX</td><td>Group
                    Lesson</td><td>12,50 €</td></tr>
                <tr><td colspan="3"></td></tr>
                <tr><th>Sub</th></tr>
              </tbody>
            </table>
          </div>
          <ul class="pagination">
            <li><a href="?page=2">›</a></li>
            <li class="disabled"><a href="#">»</a></li>
          </ul>
        </body></html>
    "##;

    fn base() -> Url {
        Url::parse("https://portal.test/nl/lessons?trainerId=1").unwrap()
    }

    #[test]
    fn test_locators_resolve() {
        let doc = Html::parse_document(LOGIN_PAGE);
        assert_eq!(1, visible_matches(&doc, &Locator::css("input[name=\"login\"]")).len());
        assert_eq!(1, visible_matches(&doc, &Locator::label("Wachtwoord")).len());
        assert_eq!(
            Some("login"),
            visible_matches(&doc, &Locator::label("Lidnummer of e-mailadres"))[0]
                .value()
                .attr("name")
        );
        assert_eq!(1, visible_matches(&doc, &Locator::button("Inloggen")).len());
        assert_eq!(
            1,
            visible_matches(&doc, &Locator::text("button", "Alle cookies accepteren")).len()
        );
        assert!(visible_matches(&doc, &Locator::css("input[name=\"outside\"]")).is_empty());
        assert!(visible_matches(&doc, &Locator::css("input[type=\"email\"]")).is_empty());
        assert!(visible_matches(&doc, &Locator::css("::bad[")).is_empty());
    }

    #[test]
    fn test_submit_posts_form_with_fills() {
        let doc = Html::parse_document(LOGIN_PAGE);
        let button = visible_matches(&doc, &Locator::button("Inloggen"))[0];
        let fills = HashMap::from([
            ("login".to_owned(), "123456".to_owned()),
            ("password".to_owned(), "secret".to_owned()),
        ]);
        let action = click_action(button, &base(), &fills).unwrap();
        assert_eq!(
            Action::Submit {
                method: FormMethod::Post,
                action: Url::parse("https://portal.test/login?p_p_id=login").unwrap(),
                fields: vec![
                    ("formDate".to_owned(), "42".to_owned()),
                    ("login".to_owned(), "123456".to_owned()),
                    ("password".to_owned(), "secret".to_owned()),
                    ("remember".to_owned(), "on".to_owned()),
                    ("lang".to_owned(), "nl".to_owned()),
                ],
            },
            action
        );
    }

    #[test]
    fn test_script_buttons_are_inert() {
        let doc = Html::parse_document(LOGIN_PAGE);
        let consent = visible_matches(&doc, &Locator::css("#onetrust-accept-btn-handler"))[0];
        assert_eq!(Action::Inert, click_action(consent, &base(), &HashMap::new()).unwrap());
    }

    #[test]
    fn test_field_names() {
        let doc = Html::parse_document(LOGIN_PAGE);
        let user = visible_matches(&doc, &Locator::css("#user"))[0];
        assert_eq!(Some("login".to_owned()), field_name(user));
        let button = visible_matches(&doc, &Locator::button("Inloggen"))[0];
        assert_eq!(None, field_name(button));
    }

    #[test]
    fn test_read_table() {
        let doc = Html::parse_document(LISTING_PAGE);
        let table = visible_matches(&doc, &Locator::css("table.results-table"))[0];
        let raw = read_table(table);
        assert_eq!(vec!["Club", "Aanbod", "Bedrag"], raw.header);
        assert_eq!(3, raw.rows.len());
        assert_eq!(
            Ok(vec!["ClubX".to_owned(), "Group Lesson".to_owned(), "12,50 €".to_owned()]),
            raw.rows[0]
        );
        assert_eq!(Ok(vec![String::new()]), raw.rows[1]);
        assert!(raw.rows[2].is_err());
    }

    #[test]
    fn test_pagination_links() {
        let doc = Html::parse_document(LISTING_PAGE);
        let next = visible_matches(&doc, &Locator::text("a", "›"))[0];
        assert!(is_enabled(next));
        assert_eq!(
            Action::Navigate(Url::parse("https://portal.test/nl/lessons?page=2").unwrap()),
            click_action(next, &base(), &HashMap::new()).unwrap()
        );
        let last = visible_matches(&doc, &Locator::text("a", "»"))[0];
        assert!(!is_enabled(last));
        assert_eq!(Action::Inert, click_action(last, &base(), &HashMap::new()).unwrap());
    }

    fn set_cookies(jar: &CookieStoreMutex, url: &str, cookies: &[&str]) {
        let values: Vec<HeaderValue> = cookies
            .iter()
            .map(|cookie| HeaderValue::from_str(cookie).unwrap())
            .collect();
        jar.set_cookies(&mut values.iter(), &Url::parse(url).unwrap());
    }

    fn cookies_for(jar: &CookieStoreMutex, url: &str) -> Option<String> {
        jar.cookies(&Url::parse(url).unwrap())
            .map(|value| value.to_str().unwrap().to_owned())
    }

    #[test]
    fn test_expired_cookies_are_dropped() {
        let jar = CookieStoreMutex::new(CookieStore::default());
        set_cookies(
            &jar,
            "https://portal.test/login",
            &["COOKIE_SUPPORT=true; Path=/", "GUEST=1; Max-Age=3600; Path=/"],
        );
        set_cookies(
            &jar,
            "https://portal.test/login",
            &[
                "COOKIE_SUPPORT=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/",
                "GUEST=; Max-Age=0; Path=/",
            ],
        );
        assert_eq!(None, cookies_for(&jar, "https://portal.test/nl/lessons"));
    }

    #[test]
    fn test_cookies_stay_with_their_host() {
        let jar = CookieStoreMutex::new(CookieStore::default());
        set_cookies(&jar, "https://sso.example/auth", &["SID=a; Path=/"]);
        set_cookies(&jar, "https://portal.test/login", &["SID=b; Path=/"]);
        set_cookies(&jar, "https://portal.test/nl/", &["TAB=1; Path=/nl"]);

        assert_eq!(Some("SID=a".to_owned()), cookies_for(&jar, "https://sso.example/"));
        assert_eq!(Some("SID=b".to_owned()), cookies_for(&jar, "https://portal.test/login"));
        let listing = cookies_for(&jar, "https://portal.test/nl/lessons").unwrap();
        assert!(listing.contains("SID=b"));
        assert!(listing.contains("TAB=1"));
        assert!(!listing.contains("SID=a"));
    }

    #[tokio::test]
    async fn test_session_state_round_trip() {
        let browser = HttpBrowser::new();
        let page = browser.open(None).await.unwrap();
        set_cookies(
            &page.jar,
            "https://portal.test/login",
            &["JSESSIONID=abc; Path=/; Secure; HttpOnly"],
        );
        let state = page.storage_state().await;

        let restored = browser.open(Some(state)).await.unwrap();
        assert_eq!(
            Some("JSESSIONID=abc".to_owned()),
            cookies_for(&restored.jar, "https://portal.test/nl/lessons")
        );
        assert_eq!(None, cookies_for(&restored.jar, "https://other.test/"));
        assert_eq!("about:blank", restored.url().await);

        let broken = browser
            .open(Some(SessionState::new(b"not json".to_vec())))
            .await
            .unwrap();
        assert_eq!(None, cookies_for(&broken.jar, "https://portal.test/"));
    }
}

use std::fmt::{self, Display};

/// Ways to find an element on a page. Candidate lists are tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    /// Elements matching `css` whose text contains `text`.
    Text { css: String, text: String },
    /// Form control described by a `<label>` with this text.
    Label(String),
    /// Button whose caption or value contains `name`.
    Button(String),
}

impl Locator {
    pub fn css(css: &str) -> Locator {
        Locator::Css(css.to_owned())
    }

    pub fn text(css: &str, text: &str) -> Locator {
        Locator::Text {
            css: css.to_owned(),
            text: text.to_owned(),
        }
    }

    pub fn label(text: &str) -> Locator {
        Locator::Label(text.to_owned())
    }

    pub fn button(name: &str) -> Locator {
        Locator::Button(name.to_owned())
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(css) => write!(f, "{}", css),
            Locator::Text { css, text } => write!(f, "{}:has-text(\"{}\")", css, text),
            Locator::Label(text) => write!(f, "label \"{}\"", text),
            Locator::Button(name) => write!(f, "button \"{}\"", name),
        }
    }
}

pub const LOGIN_FAILED_MARKER: &str = "Authenticatie mislukt";

pub fn consent_buttons() -> Vec<Locator> {
    vec![
        Locator::text("button", "Alle cookies accepteren"),
        Locator::text("button", "Accepteren"),
        Locator::text("a", "Alle cookies accepteren"),
        Locator::css("[data-testid=\"accept-cookies\"]"),
        Locator::css("#onetrust-accept-btn-handler"),
    ]
}

pub fn username_fields() -> Vec<Locator> {
    vec![
        Locator::css("input[name=\"login\"]"),
        Locator::css("input[placeholder*=\"Lidnummer\"]"),
        Locator::css("input[placeholder*=\"e-mail\"]"),
        Locator::css("input[type=\"email\"]"),
        Locator::css("#_com_liferay_login_web_portlet_LoginPortlet_login"),
        Locator::css("input[id*=\"login\"]"),
        Locator::label("Lidnummer of e-mailadres"),
    ]
}

pub fn password_fields() -> Vec<Locator> {
    vec![
        Locator::label("Wachtwoord"),
        Locator::css("input[type=\"password\"]"),
    ]
}

pub fn submit_buttons() -> Vec<Locator> {
    vec![
        Locator::button("Inloggen"),
        Locator::css("button[type=\"submit\"]"),
        Locator::css("input[type=\"submit\"]"),
    ]
}

/// Specific markup first, bare `table` last.
pub fn result_tables() -> Vec<Locator> {
    vec![
        Locator::css("table.results-table"),
        Locator::css("table.data-table"),
        Locator::css("#hash_results table"),
        Locator::css(".table-responsive table"),
        Locator::css("table"),
        Locator::css("[role='table']"),
    ]
}

pub fn next_page_controls() -> Vec<Locator> {
    vec![
        Locator::text("a", "›"),
        Locator::text("button", "Volgende"),
        Locator::css(".pagination-next"),
    ]
}

pub fn login_failed() -> Locator {
    Locator::text("body", LOGIN_FAILED_MARKER)
}

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use log::{info, warn};
use model::{
    private::{PrivateLesson, PRIVATE_LESSON_KIND},
    range::{DateRange, DATE_FORMAT},
};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const CALENDARS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/";
const MAX_PAGES: usize = 20;
const MAX_EVENTS: usize = 999;

#[derive(Clone)]
pub struct CalendarConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub calendar_id: String,
}

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Token refresh failed: {0}")]
    Token(reqwest::Error),
    #[error("Calendar request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid calendar url: {0}")]
    Url(#[from] url::ParseError),
    #[error("Calendar id '{0}' cannot be used in a url")]
    CalendarId(String),
}

#[async_trait]
pub trait PrivateLessonSource: Send + Sync {
    async fn private_lessons(&self, range: &DateRange) -> Result<Vec<PrivateLesson>, CalendarError>;
}

#[derive(Clone)]
pub struct GoogleCalendar {
    client: Client,
    config: CalendarConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
    next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Event {
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    start: Option<EventTime>,
    end: Option<EventTime>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<String>,
    date: Option<String>,
}

impl GoogleCalendar {
    pub fn new(client: Client, config: CalendarConfig) -> Self {
        GoogleCalendar { client, config }
    }

    async fn access_token(&self) -> Result<String, CalendarError> {
        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(CalendarError::Token)?
            .json()
            .await
            .map_err(CalendarError::Token)?;
        Ok(token.access_token)
    }

    fn events_url(&self) -> Result<Url, CalendarError> {
        let mut url = Url::parse(CALENDARS_URL)?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::CalendarId(self.config.calendar_id.clone()))?
            .pop_if_empty()
            .push(&self.config.calendar_id)
            .push("events");
        Ok(url)
    }
}

#[async_trait]
impl PrivateLessonSource for GoogleCalendar {
    async fn private_lessons(&self, range: &DateRange) -> Result<Vec<PrivateLesson>, CalendarError> {
        let token = self.access_token().await?;
        let url = self.events_url()?;
        let (time_min, time_max) = time_bounds(range);
        info!("Reading calendar events {}", range);

        let mut lessons = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut query = vec![
                ("timeMin", time_min.clone()),
                ("timeMax", time_max.clone()),
                ("singleEvents", "true".to_owned()),
                ("orderBy", "startTime".to_owned()),
            ];
            if let Some(page_token) = &page_token {
                query.push(("pageToken", page_token.clone()));
            }
            let events: EventList = self
                .client
                .get(url.clone())
                .bearer_auth(&token)
                .query(&query)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            for event in events.items {
                if lessons.len() >= MAX_EVENTS {
                    break;
                }
                match to_lesson(&event) {
                    Some(lesson) => lessons.push(lesson),
                    None => warn!("Skipping calendar event without usable times: {:?}", event.summary),
                }
            }
            page_token = events.next_page_token;
            if page_token.is_none() || lessons.len() >= MAX_EVENTS {
                break;
            }
        }
        info!("Found {} private lessons", lessons.len());
        Ok(lessons)
    }
}

/// Whole days from the first to the last day of the range, in UTC.
fn time_bounds(range: &DateRange) -> (String, String) {
    (
        format!("{}T00:00:00Z", range.start().format("%Y-%m-%d")),
        format!("{}T23:59:59Z", range.end().format("%Y-%m-%d")),
    )
}

fn parse_time(time: &EventTime) -> Option<NaiveDateTime> {
    if let Some(date_time) = &time.date_time {
        return DateTime::<FixedOffset>::parse_from_rfc3339(date_time)
            .ok()
            .map(|dt| dt.naive_local());
    }
    let date = NaiveDate::parse_from_str(time.date.as_deref()?, "%Y-%m-%d").ok()?;
    date.and_hms_opt(0, 0, 0)
}

fn to_lesson(event: &Event) -> Option<PrivateLesson> {
    let start = parse_time(event.start.as_ref()?)?;
    let end = parse_time(event.end.as_ref()?)?;
    let hours = (end - start).num_seconds() as f64 / 3600.0;
    Some(PrivateLesson {
        date: start.format(DATE_FORMAT).to_string(),
        start_time: start.format("%H:%M").to_string(),
        end_time: end.format("%H:%M").to_string(),
        description: event
            .summary
            .clone()
            .unwrap_or_else(|| PRIVATE_LESSON_KIND.to_owned()),
        location: event.location.clone().unwrap_or_default(),
        notes: event
            .description
            .as_deref()
            .unwrap_or_default()
            .replace('\n', " | ")
            .trim()
            .to_owned(),
        duration_hours: (hours * 100.0).round() / 100.0,
        kind: PRIVATE_LESSON_KIND.to_owned(),
    })
}

//! Calendar access used by the calendar tools.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::http::{error_message, shared_client};

pub const DEFAULT_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    /// No token, or the provider rejected it (HTTP 401/403).
    #[error("PERMISSION_MISSING")]
    PermissionMissing,
    #[error("{0}")]
    Request(String),
}

impl From<reqwest::Error> for CalendarError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

/// A new event. Times are ISO 8601 strings passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub description: Option<String>,
}

/// Fields to change on an existing event; `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.description.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventWindow {
    pub time_min: String,
    pub time_max: String,
    pub max_results: u32,
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Returns the event's link when the provider supplies one.
    async fn create_event(&self, event: &NewEvent) -> Result<Option<String>, CalendarError>;

    async fn list_events(&self, window: &EventWindow) -> Result<Vec<serde_json::Value>, CalendarError>;

    async fn update_event(
        &self,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<Option<String>, CalendarError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError>;
}

/// Calendar used when no account is connected. Every call reports missing permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedCalendar;

#[async_trait]
impl CalendarService for DisconnectedCalendar {
    async fn create_event(&self, _: &NewEvent) -> Result<Option<String>, CalendarError> {
        Err(CalendarError::PermissionMissing)
    }

    async fn list_events(&self, _: &EventWindow) -> Result<Vec<serde_json::Value>, CalendarError> {
        Err(CalendarError::PermissionMissing)
    }

    async fn update_event(&self, _: &str, _: &EventPatch) -> Result<Option<String>, CalendarError> {
        Err(CalendarError::PermissionMissing)
    }

    async fn delete_event(&self, _: &str) -> Result<(), CalendarError> {
        Err(CalendarError::PermissionMissing)
    }
}

#[derive(Serialize)]
struct EventTime<'a> {
    #[serde(rename = "dateTime")]
    date_time: &'a str,
}

#[derive(Serialize)]
struct EventBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<EventTime<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<EventTime<'a>>,
}

/// Google Calendar v3 client for the user's primary calendar.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    token: Option<String>,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            base_url: DEFAULT_CALENDAR_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn token(&self) -> Result<&str, CalendarError> {
        self.token.as_deref().ok_or(CalendarError::PermissionMissing)
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/primary/events", self.base_url)
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), event_id)
    }

    async fn checked(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<reqwest::Response, CalendarError> {
        let status = response.status().as_u16();
        match status {
            200..=299 => Ok(response),
            401 | 403 => Err(CalendarError::PermissionMissing),
            _ => {
                let body = response.text().await.unwrap_or_default();
                tracing::debug!(status, "calendar request failed");
                Err(CalendarError::Request(
                    error_message(&body).unwrap_or_else(|| fallback.to_string()),
                ))
            }
        }
    }

    fn html_link(data: &serde_json::Value) -> Option<String> {
        data.get("htmlLink")
            .and_then(|l| l.as_str())
            .map(str::to_string)
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn create_event(&self, event: &NewEvent) -> Result<Option<String>, CalendarError> {
        let body = EventBody {
            summary: Some(&event.title),
            description: event.description.as_deref(),
            start: Some(EventTime {
                date_time: &event.start_time,
            }),
            end: Some(EventTime {
                date_time: &event.end_time,
            }),
        };
        let response = shared_client()
            .post(self.events_url())
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;
        let data: serde_json::Value = Self::checked(response, "Failed to create event")
            .await?
            .json()
            .await?;
        Ok(Self::html_link(&data))
    }

    async fn list_events(&self, window: &EventWindow) -> Result<Vec<serde_json::Value>, CalendarError> {
        let max_results = window.max_results.to_string();
        let response = shared_client()
            .get(self.events_url())
            .bearer_auth(self.token()?)
            .query(&[
                ("timeMin", window.time_min.as_str()),
                ("timeMax", window.time_max.as_str()),
                ("maxResults", max_results.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await?;
        let data: serde_json::Value = Self::checked(response, "Failed to list events")
            .await?
            .json()
            .await?;
        Ok(data
            .get("items")
            .and_then(|items| items.as_array())
            .cloned()
            .unwrap_or_default())
    }

    async fn update_event(
        &self,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<Option<String>, CalendarError> {
        let body = EventBody {
            summary: patch.title.as_deref(),
            description: patch.description.as_deref(),
            start: patch.start_time.as_deref().map(|date_time| EventTime { date_time }),
            end: patch.end_time.as_deref().map(|date_time| EventTime { date_time }),
        };
        let response = shared_client()
            .patch(self.event_url(event_id))
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;
        let data: serde_json::Value = Self::checked(response, "Failed to update event")
            .await?
            .json()
            .await?;
        Ok(Self::html_link(&data))
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        let response = shared_client()
            .delete(self.event_url(event_id))
            .bearer_auth(self.token()?)
            .send()
            .await?;
        Self::checked(response, "Failed to delete event").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_token_is_a_permission_error() {
        let client = GoogleCalendarClient::new(Some("  ".into()));
        let err = client.delete_event("abc").await.unwrap_err();
        assert_eq!(err, CalendarError::PermissionMissing);
    }

    #[test]
    fn patch_body_only_carries_supplied_fields() {
        let patch = EventPatch {
            title: Some("Standup".into()),
            ..Default::default()
        };
        let body = EventBody {
            summary: patch.title.as_deref(),
            description: patch.description.as_deref(),
            start: patch.start_time.as_deref().map(|date_time| EventTime { date_time }),
            end: None,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "summary": "Standup" })
        );
    }

    #[tokio::test]
    async fn disconnected_calendar_always_denies() {
        let err = DisconnectedCalendar
            .list_events(&EventWindow {
                time_min: "a".into(),
                time_max: "b".into(),
                max_results: 10,
            })
            .await
            .unwrap_err();
        assert_eq!(err, CalendarError::PermissionMissing);
    }
}

//! Minimal Google Calendar client for the post-authorization sample call.
//!
//! One bounded `events.list` request against the primary calendar,
//! demonstrating that the freshly obtained access token works. This is not
//! a general Calendar API binding.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Base URL for the Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Authenticated Google Calendar API client.
#[derive(Debug)]
pub struct CalendarClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl CalendarClient {
    /// Creates a client with the given access token.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            http_client,
            access_token: access_token.into(),
        }
    }

    /// Lists events from a calendar, bounded by `max_results`.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        max_results: usize,
    ) -> AuthResult<Vec<Event>> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("maxResults", max_results.to_string())])
            .send()
            .await
            .map_err(|e| AuthError::ApiCall(format!("request failed: {e}")))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::ApiCall(
                "access token expired or invalid".to_string(),
            ));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(AuthError::ApiCall("access denied to calendar".to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::ApiCall(format!("API error ({status}): {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::ApiCall(format!("failed to read response: {e}")))?;

        let list: EventListResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::ApiCall(format!("failed to parse response: {e}")))?;

        debug!(
            "fetched {} events from calendar {}",
            list.items.len(),
            calendar_id
        );
        Ok(list.items)
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<Event>,
}

/// A single calendar event, reduced to the fields the listing prints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event title.
    #[serde(default)]
    pub summary: Option<String>,
    /// Event description.
    #[serde(default)]
    pub description: Option<String>,
    /// Event start time.
    #[serde(default)]
    pub start: Option<EventTime>,
}

/// Event start time: either a full timestamp or an all-day date.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// RFC 3339 timestamp for timed events.
    pub date_time: Option<String>,
    /// `YYYY-MM-DD` date for all-day events.
    pub date: Option<String>,
}

impl Event {
    /// The start string the listing prints: the timestamp, falling back to
    /// the all-day date, falling back to empty.
    pub fn start_display(&self) -> &str {
        self.start
            .as_ref()
            .and_then(|s| s.date_time.as_deref().or(s.date.as_deref()))
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_event_list_response() {
        let json = r#"{
            "items": [
                {
                    "summary": "Team sync",
                    "description": "Weekly status",
                    "start": {
                        "dateTime": "2024-03-15T10:00:00Z"
                    }
                }
            ]
        }"#;

        let response: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);

        let event = &response.items[0];
        assert_eq!(event.summary.as_deref(), Some("Team sync"));
        assert_eq!(event.description.as_deref(), Some("Weekly status"));
        assert_eq!(event.start_display(), "2024-03-15T10:00:00Z");
    }

    #[test]
    fn all_day_event_falls_back_to_date() {
        let json = r#"{
            "summary": "Offsite",
            "start": {
                "date": "2024-03-15"
            }
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.start_display(), "2024-03-15");
    }

    #[test]
    fn sparse_event_tolerated() {
        let event: Event = serde_json::from_str("{}").unwrap();
        assert!(event.summary.is_none());
        assert!(event.description.is_none());
        assert_eq!(event.start_display(), "");
    }

    #[test]
    fn empty_response_has_no_items() {
        let response: EventListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
    }
}

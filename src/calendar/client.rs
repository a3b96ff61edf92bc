use super::{
    credentials::{Credential, CredentialProvider},
    events::CalendarEvent,
};
use crate::error::{Result, TravelError};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// A calendar that accepts new events
#[async_trait]
pub trait CalendarService: Send + Sync + std::fmt::Debug {
    async fn create_event(&self, event: &CalendarEvent) -> Result<()>;
}

/// Google Calendar REST client
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    base_url: String,
    calendar_id: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl GoogleCalendarClient {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_CALENDAR_BASE_URL.to_string(),
            calendar_id: "primary".to_string(),
            credentials,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    fn events_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| TravelError::Config(format!("invalid calendar base URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| TravelError::Config("calendar base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("calendars")
            .push(&self.calendar_id)
            .push("events");
        Ok(url)
    }

    async fn post_event(
        &self,
        url: &Url,
        credential: &Credential,
        event: &CalendarEvent,
    ) -> Result<reqwest::Response> {
        self.http
            .post(url.clone())
            .bearer_auth(&credential.access_token)
            .json(&event.to_request_body())
            .send()
            .await
            .map_err(|err| TravelError::Api(format!("calendar request failed: {err}")))
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn create_event(&self, event: &CalendarEvent) -> Result<()> {
        let url = self.events_url()?;
        let credential = self.credentials.get_valid_credential().await?;
        let mut response = self.post_event(&url, &credential, event).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(target: "trip_planner::calendar", "access token rejected, refreshing");
            let renewed = self.credentials.refresh().await?;
            response = self.post_event(&url, &renewed, event).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(TravelError::Auth(
                    "calendar rejected the renewed credential".to_string(),
                ));
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|value| {
                    value
                        .get("error")
                        .and_then(|error| error.get("message"))
                        .and_then(|message| message.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or(body);
            warn!(target: "trip_planner::calendar", %status, "event rejected");
            return Err(TravelError::Api(format!("HTTP {}: {}", status, message)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::credentials::InMemoryCredentialProvider;

    fn client(base: &str, calendar_id: &str) -> GoogleCalendarClient {
        GoogleCalendarClient::new(Arc::new(InMemoryCredentialProvider::new(Credential::new(
            "t",
        ))))
        .with_base_url(base)
        .with_calendar_id(calendar_id)
    }

    #[test]
    fn test_events_url_encodes_calendar_id() {
        let url = client(DEFAULT_CALENDAR_BASE_URL, "team trips@example.com")
            .events_url()
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/team%20trips@example.com/events"
        );
    }

    #[test]
    fn test_events_url_with_trailing_slash() {
        let url = client("http://127.0.0.1:9000/", "primary").events_url().unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/calendars/primary/events");
    }
}

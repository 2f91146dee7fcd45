use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, warn};

use shared_config::{AppConfig, RetryPolicy};

use crate::models::{CalendarEvent, EventDraft, EventList};

pub struct CalendarClient {
    client: Client,
    base_url: String,
    api_token: String,
    calendar_id: String,
    policy: RetryPolicy,
}

impl CalendarClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_policy(config, RetryPolicy::default())
    }

    pub fn with_policy(config: &AppConfig, policy: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(policy.request_timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.calendar_base_url.clone(),
            api_token: config.calendar_api_token.clone(),
            calendar_id: config.calendar_id.clone(),
            policy,
        }
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, self.calendar_id)
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), event_id)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let prepared = request
                .try_clone()
                .ok_or_else(|| anyhow!("calendar request cannot be replayed"))?;

            match prepared.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_default();
                    error!("Calendar API error ({}): {}", status, error_text);

                    if attempt >= self.policy.max_attempts {
                        return Err(match status.as_u16() {
                            401 | 403 => anyhow!("Authentication error: {}", error_text),
                            404 => anyhow!("Resource not found: {}", error_text),
                            _ => anyhow!("API error ({}): {}", status, error_text),
                        });
                    }
                }
                Err(e) => {
                    warn!("Calendar request failed on attempt {}: {}", attempt, e);
                    if attempt >= self.policy.max_attempts {
                        return Err(e.into());
                    }
                }
            }
        }
    }

    async fn request<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Events already booked between the two instants, expanded to single
    /// occurrences and ordered by start time.
    pub async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        debug!("Listing events between {} and {}", time_min, time_max);

        let request = self
            .client
            .get(self.events_url())
            .bearer_auth(&self.api_token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ]);

        let list: EventList = self.request(request).await?;
        Ok(list.items)
    }

    pub async fn insert_event(&self, draft: &EventDraft) -> Result<CalendarEvent> {
        debug!("Inserting event: {}", draft.summary);

        let request = self
            .client
            .post(self.events_url())
            .bearer_auth(&self.api_token)
            .json(draft);

        self.request(request).await
    }

    pub async fn get_event(&self, event_id: &str) -> Result<CalendarEvent> {
        let request = self
            .client
            .get(self.event_url(event_id))
            .bearer_auth(&self.api_token);

        self.request(request).await
    }

    pub async fn patch_event_summary(&self, event_id: &str, summary: &str) -> Result<CalendarEvent> {
        debug!("Patching summary of event {}", event_id);

        let request = self
            .client
            .patch(self.event_url(event_id))
            .bearer_auth(&self.api_token)
            .json(&json!({ "summary": summary }));

        self.request(request).await
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<()> {
        debug!("Deleting event {}", event_id);

        let request = self
            .client
            .delete(self.event_url(event_id))
            .bearer_auth(&self.api_token);

        self.send(request).await?;
        Ok(())
    }
}

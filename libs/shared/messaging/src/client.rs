use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::{debug, error, warn};

use shared_config::{AppConfig, RetryPolicy};

/// Client for the outbound text-message transport. All messages leave from
/// the single configured sender number.
pub struct MessagingClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    sender: String,
    policy: RetryPolicy,
}

impl MessagingClient {
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
            base_url: config.twilio_base_url.clone(),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            sender: config.twilio_whatsapp_number.clone(),
            policy,
        }
    }

    pub async fn send_message(&self, to: &str, body: &str) -> Result<()> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        debug!("Sending message to {}", to);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .client
                .post(&url)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .form(&[("From", self.sender.as_str()), ("To", to), ("Body", body)])
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_default();
                    error!("Messaging API error ({}): {}", status, error_text);

                    if attempt >= self.policy.max_attempts {
                        return Err(anyhow!("Messaging API error ({}): {}", status, error_text));
                    }
                }
                Err(e) => {
                    warn!("Message delivery failed on attempt {}: {}", attempt, e);
                    if attempt >= self.policy.max_attempts {
                        return Err(e.into());
                    }
                }
            }
        }
    }
}

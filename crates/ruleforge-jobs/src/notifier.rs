//! Webhook delivery of job lifecycle events

use async_trait::async_trait;
use ruleforge_domain::{EventType, WebhookEvent};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the event type (e.g. `rules.extracted.v1`)
pub const EVENT_HEADER: &str = "X-Event";

/// Header carrying the job id
pub const JOB_ID_HEADER: &str = "X-Job-Process-Id";

/// Delivers lifecycle events to a callback URL
///
/// Delivery is best effort: failures are reported through the return value
/// and never propagate into job state.
#[async_trait]
pub trait WebhookNotifier: Send + Sync {
    /// Post `event` to `url`; `true` only on a 2xx answer
    async fn notify(&self, url: &str, event: &WebhookEvent) -> bool;
}

/// Posts events as JSON over HTTP
pub struct HttpWebhookNotifier {
    client: reqwest::Client,
}

impl HttpWebhookNotifier {
    /// Build a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookNotifier for HttpWebhookNotifier {
    async fn notify(&self, url: &str, event: &WebhookEvent) -> bool {
        let result = self
            .client
            .post(url)
            .header(EVENT_HEADER, event.event_type.header_value())
            .header(JOB_ID_HEADER, event.job_id.to_string())
            .json(&event.payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(job_id = %event.job_id, event = %event.event_type, "Webhook delivered");
                true
            }
            Ok(response) => {
                warn!(
                    job_id = %event.job_id,
                    event = %event.event_type,
                    status = %response.status(),
                    "Webhook rejected"
                );
                false
            }
            Err(e) => {
                warn!(job_id = %event.job_id, event = %event.event_type, "Webhook delivery failed: {}", e);
                false
            }
        }
    }
}

/// Records events instead of sending them
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<(String, WebhookEvent)>>>,
    reject: bool,
}

impl RecordingNotifier {
    /// Record events and report every delivery as successful
    pub fn new() -> Self {
        Self::default()
    }

    /// Record events but report every delivery as failed
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// All recorded `(url, event)` pairs, in delivery order
    pub fn events(&self) -> Vec<(String, WebhookEvent)> {
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Recorded event types, in delivery order
    pub fn event_types(&self) -> Vec<EventType> {
        self.events().into_iter().map(|(_, e)| e.event_type).collect()
    }

    /// Number of recorded events of one type
    pub fn count_of(&self, event_type: EventType) -> usize {
        self.event_types().into_iter().filter(|t| *t == event_type).count()
    }
}

#[async_trait]
impl WebhookNotifier for RecordingNotifier {
    async fn notify(&self, url: &str, event: &WebhookEvent) -> bool {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((url.to_string(), event.clone()));
        !self.reject
    }
}

use async_trait::async_trait;
use palmera_core::projection::{self, PROJECTION_VERSION};
use palmera_core::submission::Submission;
use palmera_store::app_config::WebhookConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::mailer::Mailer;
use crate::templates::EmailTemplates;

/// How far a dispatched submission made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    /// Primary endpoint accepted the payload.
    Success,
    /// Primary endpoint failed but the relay accepted the payload.
    Warning,
    /// Neither endpoint accepted the payload.
    Error,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Success => "success",
            DispatchStatus::Warning => "warning",
            DispatchStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub status: DispatchStatus,
    pub tracking_id: String,
    pub email_sent: bool,
}

/// Forwards a persisted submission to downstream automation. Implementations
/// report how delivery went but never fail the caller.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, submission: &Submission) -> DispatchOutcome;
}

#[derive(Debug, thiserror::Error)]
enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Posts submissions to the primary automation endpoint, falling back to the
/// relay once, and alerts the admin mailbox about every submission.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    target_url: String,
    relay_base_url: Option<String>,
    mailer: Option<Arc<dyn Mailer>>,
    admin_address: Option<String>,
    templates: EmailTemplates,
}

impl WebhookDispatcher {
    pub fn new(config: &WebhookConfig, templates: EmailTemplates) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("palmera-pipeline/0.1")
            .build()?;
        Ok(Self {
            client,
            target_url: config.target_url.clone(),
            relay_base_url: config.relay_base_url.clone(),
            mailer: None,
            admin_address: None,
            templates,
        })
    }

    /// Enables the admin alert email that accompanies every dispatch.
    pub fn with_admin_alerts(
        mut self,
        mailer: Arc<dyn Mailer>,
        admin_address: impl Into<String>,
    ) -> Self {
        self.mailer = Some(mailer);
        self.admin_address = Some(admin_address.into());
        self
    }

    fn payload_for(&self, submission: &Submission, tracking_id: &str) -> Value {
        let mut fields = projection::project(submission);
        fields.insert("tracking_id".to_string(), json!(tracking_id));
        fields.insert(
            "webhook_type".to_string(),
            json!(submission.kind().as_str()),
        );
        fields.insert("projection_version".to_string(), json!(PROJECTION_VERSION));
        Value::Object(fields)
    }

    async fn deliver(&self, url: &str, payload: &Value) -> Result<(), DeliveryError> {
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn send_admin_alert(&self, submission: &Submission, tracking_id: &str) -> bool {
        let (Some(mailer), Some(address)) = (&self.mailer, &self.admin_address) else {
            return false;
        };
        let subject = format!(
            "New {} submission from {}",
            submission.kind().as_str(),
            submission.first_name()
        );
        let html = self.templates.admin_alert(submission, tracking_id);
        mailer.send(address, &subject, &html).await
    }
}

#[async_trait]
impl Dispatcher for WebhookDispatcher {
    async fn dispatch(&self, submission: &Submission) -> DispatchOutcome {
        let tracking_id = submission
            .form_data()
            .get_str("trackingId")
            .or_else(|| submission.form_data().get_str("tracking_id"))
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let payload = self.payload_for(submission, &tracking_id);

        let status = match self.deliver(&self.target_url, &payload).await {
            Ok(()) => {
                info!(tracking_id = %tracking_id, "webhook delivered to primary endpoint");
                DispatchStatus::Success
            }
            Err(primary_err) => match &self.relay_base_url {
                Some(base) => {
                    let relay_url = format!("{}/api/relay", base.trim_end_matches('/'));
                    warn!(
                        tracking_id = %tracking_id,
                        error = %primary_err,
                        "primary webhook delivery failed, trying relay"
                    );
                    match self.deliver(&relay_url, &payload).await {
                        Ok(()) => {
                            info!(tracking_id = %tracking_id, "webhook delivered via relay");
                            DispatchStatus::Warning
                        }
                        Err(relay_err) => {
                            error!(
                                tracking_id = %tracking_id,
                                primary_error = %primary_err,
                                relay_error = %relay_err,
                                "webhook delivery failed on both endpoints"
                            );
                            DispatchStatus::Error
                        }
                    }
                }
                None => {
                    error!(
                        tracking_id = %tracking_id,
                        error = %primary_err,
                        "webhook delivery failed and no relay is configured"
                    );
                    DispatchStatus::Error
                }
            },
        };

        // The admin alert rides along with every dispatch, whatever the
        // delivery outcome was.
        let email_sent = self.send_admin_alert(submission, &tracking_id).await;

        DispatchOutcome {
            status,
            tracking_id,
            email_sent,
        }
    }
}

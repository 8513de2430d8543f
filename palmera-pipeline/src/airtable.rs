use async_trait::async_trait;
use palmera_core::projection;
use palmera_core::submission::{Submission, SubmissionKind};
use palmera_store::app_config::AirtableConfig;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::retry::{with_backoff, RetryPolicy};

const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";

/// Failure of a secondary record sync. Callers treat these as non-fatal.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sync request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sync target returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("sync target response carried no record id")]
    MissingRecordId,
}

/// Mirrors a persisted submission into an external record store, returning
/// the remote record id.
#[async_trait]
pub trait RecordSync: Send + Sync {
    async fn sync(&self, submission: &Submission) -> Result<String, SyncError>;
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    id: Option<String>,
}

/// Pushes submissions into Airtable, one table per submission kind.
pub struct AirtableSync {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    base_id: String,
    leads_table: String,
    bookings_table: String,
    guides_table: String,
    retry: RetryPolicy,
}

impl AirtableSync {
    pub fn new(config: &AirtableConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("palmera-pipeline/0.1")
            .build()?;
        Ok(Self {
            client,
            base_url: AIRTABLE_API_URL.to_string(),
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
            leads_table: config.leads_table.clone(),
            bookings_table: config.bookings_table.clone(),
            guides_table: config.guides_table.clone(),
            retry: RetryPolicy::default(),
        })
    }

    /// Points the client at a different API root, for tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn table_for(&self, kind: SubmissionKind) -> &str {
        match kind {
            SubmissionKind::Lead => &self.leads_table,
            SubmissionKind::Booking => &self.bookings_table,
            SubmissionKind::Guide => &self.guides_table,
        }
    }

    async fn post_record(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<String, SyncError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let record: RecordResponse = response.json().await?;
        record.id.ok_or(SyncError::MissingRecordId)
    }
}

#[async_trait]
impl RecordSync for AirtableSync {
    async fn sync(&self, submission: &Submission) -> Result<String, SyncError> {
        let table = self.table_for(submission.kind());
        let url = format!("{}/{}/{}", self.base_url, self.base_id, table);
        let payload = json!({ "fields": projection::project(submission) });

        let record_id = with_backoff("airtable_sync", self.retry, || {
            let url = url.clone();
            let payload = payload.clone();
            async move { self.post_record(&url, &payload).await }
        })
        .await?;

        debug!(
            table,
            record_id = %record_id,
            submission_id = %submission.id(),
            "submission mirrored to airtable"
        );
        Ok(record_id)
    }
}

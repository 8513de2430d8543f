use palmera_core::repository::{Storage, StorageError};
use palmera_core::submission::{
    GuideStatus, NewSubmission, Submission, SubmissionKind,
};
use palmera_core::validate::{validate, ValidationError};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::airtable::RecordSync;
use crate::mailer::Mailer;
use crate::templates::EmailTemplates;
use crate::webhook::{DispatchOutcome, Dispatcher};

/// The only two ways a submission can fail. Everything after the primary
/// write is best-effort and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("primary store write failed: {0}")]
    Storage(String),
}

/// Result of one best-effort step in the fan-out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome<T> {
    Completed(T),
    Failed(String),
    Skipped,
}

impl<T> StepOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped)
    }
}

/// What happened to a submission, step by step. The submission itself is
/// durable by the time a report exists.
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub submission: Submission,
    pub sync: StepOutcome<String>,
    pub webhook: StepOutcome<DispatchOutcome>,
    pub customer_email: StepOutcome<()>,
}

/// Runs a raw form payload through validation, the primary write and the
/// downstream fan-out. Collaborators are optional; a missing one skips its
/// step instead of failing the submission.
pub struct SubmissionPipeline {
    storage: Arc<dyn Storage>,
    sync: Option<Arc<dyn RecordSync>>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    mailer: Option<Arc<dyn Mailer>>,
    templates: EmailTemplates,
    guide_download_base: Option<String>,
}

impl SubmissionPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        sync: Option<Arc<dyn RecordSync>>,
        dispatcher: Option<Arc<dyn Dispatcher>>,
        mailer: Option<Arc<dyn Mailer>>,
        guide_download_base: Option<String>,
    ) -> Result<Self, handlebars::TemplateError> {
        Ok(Self {
            storage,
            sync,
            dispatcher,
            mailer,
            templates: EmailTemplates::new()?,
            guide_download_base,
        })
    }

    /// Validates and persists one submission, then fans out to the
    /// best-effort steps. Returns an error only when validation fails or
    /// the primary write fails; every later failure is recorded in the
    /// report and swallowed.
    pub async fn submit(
        &self,
        kind: SubmissionKind,
        raw: &Value,
    ) -> Result<PipelineReport, PipelineError> {
        let new_submission = validate(kind, raw)?;

        let submission = self.persist(new_submission).await.map_err(|err| {
            error!(kind = kind.as_str(), error = %err, "primary store write failed");
            PipelineError::Storage(err.to_string())
        })?;
        info!(
            kind = kind.as_str(),
            id = %submission.id(),
            subtype = submission.subtype(),
            "submission persisted"
        );

        let sync = match &self.sync {
            None => StepOutcome::Skipped,
            Some(sync) => match sync.sync(&submission).await {
                Ok(record_id) => StepOutcome::Completed(record_id),
                Err(err) => {
                    warn!(
                        id = %submission.id(),
                        error = %err,
                        "secondary sync failed, submission is already durable"
                    );
                    StepOutcome::Failed(err.to_string())
                }
            },
        };

        let webhook = match &self.dispatcher {
            None => StepOutcome::Skipped,
            Some(dispatcher) => {
                let outcome = dispatcher.dispatch(&submission).await;
                info!(
                    id = %submission.id(),
                    status = outcome.status.as_str(),
                    tracking_id = %outcome.tracking_id,
                    email_sent = outcome.email_sent,
                    "webhook dispatch finished"
                );
                StepOutcome::Completed(outcome)
            }
        };

        let customer_email = self.notify_customer(&submission).await;

        if let Submission::Guide(guide) = &submission {
            let status = match &customer_email {
                StepOutcome::Completed(()) => Some(GuideStatus::Sent),
                StepOutcome::Failed(_) => Some(GuideStatus::Failed),
                StepOutcome::Skipped => None,
            };
            if let Some(status) = status {
                if let Err(err) = self.storage.update_guide_status(guide.id, status).await {
                    warn!(id = %guide.id, error = %err, "failed to record guide delivery status");
                }
            }
        }

        Ok(PipelineReport {
            submission,
            sync,
            webhook,
            customer_email,
        })
    }

    async fn persist(&self, new: NewSubmission) -> Result<Submission, StorageError> {
        match new {
            NewSubmission::Lead(lead) => {
                Ok(Submission::Lead(self.storage.create_lead(&lead).await?))
            }
            NewSubmission::Booking(booking) => Ok(Submission::Booking(
                self.storage.create_booking(&booking).await?,
            )),
            NewSubmission::Guide(mut guide) => {
                // The download link has to exist before the write so the
                // secondary sync, the webhook and the email all agree on it.
                if let Some(base) = &self.guide_download_base {
                    if !guide.form_data.contains_key("downloadLink")
                        && !guide.form_data.contains_key("download_link")
                    {
                        let slug = guide.guide_type.trim().to_lowercase().replace(' ', "-");
                        let link = format!("{}/{}.pdf", base.trim_end_matches('/'), slug);
                        guide.form_data.insert("downloadLink", json!(link));
                    }
                }
                Ok(Submission::Guide(
                    self.storage.create_guide_submission(&guide).await?,
                ))
            }
        }
    }

    async fn notify_customer(&self, submission: &Submission) -> StepOutcome<()> {
        let Some(mailer) = &self.mailer else {
            return StepOutcome::Skipped;
        };

        let (to, subject, html) = match submission {
            // Leads only alert the admin mailbox, which rides along with
            // the webhook dispatch.
            Submission::Lead(_) => return StepOutcome::Skipped,
            Submission::Booking(booking) => (
                booking.email.clone(),
                format!("Your {} booking request", booking.booking_type.as_str()),
                self.templates.booking_confirmation(booking),
            ),
            Submission::Guide(guide) => {
                let link = guide
                    .form_data
                    .get_str("downloadLink")
                    .or_else(|| guide.form_data.get_str("download_link"));
                let Some(link) = link else {
                    warn!(id = %guide.id, "guide has no download link, skipping delivery email");
                    return StepOutcome::Failed("guide has no download link".to_string());
                };
                (
                    guide.email.clone(),
                    format!("Your {} guide is ready", guide.guide_type),
                    self.templates.guide_delivery(guide, link),
                )
            }
        };

        if mailer.send(&to, &subject, &html).await {
            StepOutcome::Completed(())
        } else {
            StepOutcome::Failed("email delivery failed".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airtable::SyncError;
    use crate::webhook::DispatchStatus;
    use async_trait::async_trait;
    use palmera_core::catalog::{
        Adventure, ImageAsset, NewAdventure, NewImageAsset, NewRestaurant, NewVilla, Restaurant,
        Villa,
    };
    use palmera_core::submission::{
        Booking, BookingUpdate, GuideSubmission, Lead, NewBooking, NewGuideSubmission, NewLead,
        PaymentState,
    };
    use palmera_store::MemStorage;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct StubSync {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl RecordSync for StubSync {
        async fn sync(&self, _submission: &Submission) -> Result<String, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SyncError::Status {
                    status: 500,
                    body: "mirror down".to_string(),
                })
            } else {
                Ok("rec_stub_1".to_string())
            }
        }
    }

    #[derive(Default)]
    struct StubDispatcher {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Dispatcher for StubDispatcher {
        async fn dispatch(&self, _submission: &Submission) -> DispatchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            DispatchOutcome {
                status: DispatchStatus::Success,
                tracking_id: "trk-stub".to_string(),
                email_sent: false,
            }
        }
    }

    struct StubMailer {
        sent: AtomicU32,
        succeed: bool,
        last_html: Mutex<Option<String>>,
    }

    impl StubMailer {
        fn new(succeed: bool) -> Self {
            Self {
                sent: AtomicU32::new(0),
                succeed,
                last_html: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Mailer for StubMailer {
        async fn send(&self, _to: &str, _subject: &str, html: &str) -> bool {
            self.sent.fetch_add(1, Ordering::SeqCst);
            *self.last_html.lock().unwrap() = Some(html.to_string());
            self.succeed
        }
    }

    /// Storage whose every call fails, for exercising the primary-write gate.
    struct OfflineStorage;

    macro_rules! offline {
        () => {
            Err("storage offline".into())
        };
    }

    #[async_trait]
    impl Storage for OfflineStorage {
        async fn create_lead(&self, _: &NewLead) -> Result<Lead, StorageError> {
            offline!()
        }
        async fn list_leads(&self) -> Result<Vec<Lead>, StorageError> {
            offline!()
        }
        async fn leads_by_email(&self, _: &str) -> Result<Vec<Lead>, StorageError> {
            offline!()
        }
        async fn create_booking(&self, _: &NewBooking) -> Result<Booking, StorageError> {
            offline!()
        }
        async fn get_booking(&self, _: Uuid) -> Result<Option<Booking>, StorageError> {
            offline!()
        }
        async fn list_bookings(&self) -> Result<Vec<Booking>, StorageError> {
            offline!()
        }
        async fn bookings_by_email(&self, _: &str) -> Result<Vec<Booking>, StorageError> {
            offline!()
        }
        async fn update_booking(
            &self,
            _: Uuid,
            _: &BookingUpdate,
        ) -> Result<Option<Booking>, StorageError> {
            offline!()
        }
        async fn update_booking_payment_status(
            &self,
            _: &str,
            _: PaymentState,
        ) -> Result<Option<Booking>, StorageError> {
            offline!()
        }
        async fn create_guide_submission(
            &self,
            _: &NewGuideSubmission,
        ) -> Result<GuideSubmission, StorageError> {
            offline!()
        }
        async fn list_guide_submissions(&self) -> Result<Vec<GuideSubmission>, StorageError> {
            offline!()
        }
        async fn update_guide_status(&self, _: Uuid, _: GuideStatus) -> Result<(), StorageError> {
            offline!()
        }
        async fn create_adventure(&self, _: &NewAdventure) -> Result<Adventure, StorageError> {
            offline!()
        }
        async fn get_adventure(&self, _: Uuid) -> Result<Option<Adventure>, StorageError> {
            offline!()
        }
        async fn list_adventures(&self) -> Result<Vec<Adventure>, StorageError> {
            offline!()
        }
        async fn update_adventure(
            &self,
            _: Uuid,
            _: &NewAdventure,
        ) -> Result<Option<Adventure>, StorageError> {
            offline!()
        }
        async fn delete_adventure(&self, _: Uuid) -> Result<bool, StorageError> {
            offline!()
        }
        async fn create_villa(&self, _: &NewVilla) -> Result<Villa, StorageError> {
            offline!()
        }
        async fn get_villa(&self, _: Uuid) -> Result<Option<Villa>, StorageError> {
            offline!()
        }
        async fn list_villas(&self) -> Result<Vec<Villa>, StorageError> {
            offline!()
        }
        async fn update_villa(&self, _: Uuid, _: &NewVilla) -> Result<Option<Villa>, StorageError> {
            offline!()
        }
        async fn delete_villa(&self, _: Uuid) -> Result<bool, StorageError> {
            offline!()
        }
        async fn create_restaurant(&self, _: &NewRestaurant) -> Result<Restaurant, StorageError> {
            offline!()
        }
        async fn get_restaurant(&self, _: Uuid) -> Result<Option<Restaurant>, StorageError> {
            offline!()
        }
        async fn list_restaurants(&self) -> Result<Vec<Restaurant>, StorageError> {
            offline!()
        }
        async fn update_restaurant(
            &self,
            _: Uuid,
            _: &NewRestaurant,
        ) -> Result<Option<Restaurant>, StorageError> {
            offline!()
        }
        async fn delete_restaurant(&self, _: Uuid) -> Result<bool, StorageError> {
            offline!()
        }
        async fn create_image(&self, _: &NewImageAsset) -> Result<ImageAsset, StorageError> {
            offline!()
        }
        async fn get_image(&self, _: Uuid) -> Result<Option<ImageAsset>, StorageError> {
            offline!()
        }
        async fn list_images(&self) -> Result<Vec<ImageAsset>, StorageError> {
            offline!()
        }
        async fn update_image(
            &self,
            _: Uuid,
            _: &NewImageAsset,
        ) -> Result<Option<ImageAsset>, StorageError> {
            offline!()
        }
        async fn delete_image(&self, _: Uuid) -> Result<bool, StorageError> {
            offline!()
        }
    }

    fn pipeline_with(
        storage: Arc<dyn Storage>,
        sync: Option<Arc<dyn RecordSync>>,
        dispatcher: Option<Arc<dyn Dispatcher>>,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> SubmissionPipeline {
        SubmissionPipeline::new(
            storage,
            sync,
            dispatcher,
            mailer,
            Some("https://cdn.palmera.travel/guides".to_string()),
        )
        .unwrap()
    }

    fn lead_payload() -> Value {
        json!({
            "firstName": "Maya",
            "lastName": "Flores",
            "email": "maya@example.com",
            "interestType": "villa"
        })
    }

    fn booking_payload() -> Value {
        json!({
            "firstName": "Diego",
            "email": "diego@example.com",
            "bookingType": "villa",
            "checkIn": "2025-06-01",
            "checkOut": "2025-06-08",
            "guests": 2
        })
    }

    fn guide_payload() -> Value {
        json!({
            "firstName": "Ana",
            "email": "ana@example.com",
            "guideType": "villa"
        })
    }

    #[tokio::test]
    async fn test_validation_failure_short_circuits_before_any_write() {
        let storage = Arc::new(MemStorage::new());
        let sync = Arc::new(StubSync::default());
        let dispatcher = Arc::new(StubDispatcher::default());
        let pipeline = pipeline_with(
            storage.clone(),
            Some(sync.clone()),
            Some(dispatcher.clone()),
            None,
        );

        let err = pipeline
            .submit(SubmissionKind::Lead, &json!({"lastName": "Flores"}))
            .await
            .unwrap_err();

        match err {
            PipelineError::Validation(validation) => {
                assert!(validation.violations.len() >= 2);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(storage.submission_count().await, 0);
        assert_eq!(sync.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_stops_the_fanout() {
        let sync = Arc::new(StubSync::default());
        let dispatcher = Arc::new(StubDispatcher::default());
        let pipeline = pipeline_with(
            Arc::new(OfflineStorage),
            Some(sync.clone()),
            Some(dispatcher.clone()),
            None,
        );

        let err = pipeline
            .submit(SubmissionKind::Lead, &lead_payload())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Storage(_)));
        assert_eq!(sync.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sync_failure_is_swallowed() {
        let storage = Arc::new(MemStorage::new());
        let sync = Arc::new(StubSync {
            calls: AtomicU32::new(0),
            fail: true,
        });
        let dispatcher = Arc::new(StubDispatcher::default());
        let pipeline = pipeline_with(
            storage.clone(),
            Some(sync.clone()),
            Some(dispatcher.clone()),
            None,
        );

        let report = pipeline
            .submit(SubmissionKind::Booking, &booking_payload())
            .await
            .unwrap();

        assert!(report.sync.is_failed());
        assert!(report.webhook.is_completed());
        assert_eq!(sync.calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(storage.list_bookings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_guide_flow_calls_each_collaborator_once() {
        let storage = Arc::new(MemStorage::new());
        let sync = Arc::new(StubSync::default());
        let dispatcher = Arc::new(StubDispatcher::default());
        let mailer = Arc::new(StubMailer::new(true));
        let pipeline = pipeline_with(
            storage.clone(),
            Some(sync.clone()),
            Some(dispatcher.clone()),
            Some(mailer.clone()),
        );

        let report = pipeline
            .submit(SubmissionKind::Guide, &guide_payload())
            .await
            .unwrap();

        assert_eq!(sync.calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
        assert!(report.customer_email.is_completed());

        // The generated download link reached both the stored row and the email.
        let link = "https://cdn.palmera.travel/guides/villa.pdf";
        assert_eq!(report.submission.form_data().get_str("downloadLink"), Some(link));
        let html = mailer.last_html.lock().unwrap().clone().unwrap();
        assert!(html.contains(link));

        let guides = storage.list_guide_submissions().await.unwrap();
        assert_eq!(guides.len(), 1);
        assert_eq!(guides[0].status, GuideStatus::Sent);
    }

    #[tokio::test]
    async fn test_lead_gets_no_customer_email() {
        let storage = Arc::new(MemStorage::new());
        let mailer = Arc::new(StubMailer::new(true));
        let pipeline = pipeline_with(storage.clone(), None, None, Some(mailer.clone()));

        let report = pipeline
            .submit(SubmissionKind::Lead, &lead_payload())
            .await
            .unwrap();

        assert!(report.customer_email.is_skipped());
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_customer_email_marks_guide_failed() {
        let storage = Arc::new(MemStorage::new());
        let mailer = Arc::new(StubMailer::new(false));
        let pipeline = pipeline_with(storage.clone(), None, None, Some(mailer.clone()));

        let report = pipeline
            .submit(SubmissionKind::Guide, &guide_payload())
            .await
            .unwrap();

        assert!(report.customer_email.is_failed());
        let guides = storage.list_guide_submissions().await.unwrap();
        assert_eq!(guides[0].status, GuideStatus::Failed);
    }

    #[tokio::test]
    async fn test_missing_collaborators_skip_their_steps() {
        let storage = Arc::new(MemStorage::new());
        let pipeline = pipeline_with(storage.clone(), None, None, None);

        let report = pipeline
            .submit(SubmissionKind::Booking, &booking_payload())
            .await
            .unwrap();

        assert!(report.sync.is_skipped());
        assert!(report.webhook.is_skipped());
        assert!(report.customer_email.is_skipped());
        assert_eq!(storage.list_bookings().await.unwrap().len(), 1);
    }
}

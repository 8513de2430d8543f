//! Submission processing for the Palmera Travel backend.
//!
//! A raw form payload enters through [`SubmissionPipeline::submit`], which
//! validates it, writes it to the primary store and then fans out to the
//! best-effort steps: the Airtable mirror, the automation webhook and
//! outbound email. Only validation and the primary write can fail a
//! submission.

pub mod airtable;
pub mod mailer;
pub mod orchestrator;
pub mod retry;
pub mod stripe;
pub mod templates;
pub mod webhook;

pub use airtable::{AirtableSync, RecordSync, SyncError};
pub use mailer::{Mailer, MailerError, SmtpMailer};
pub use orchestrator::{PipelineError, PipelineReport, StepOutcome, SubmissionPipeline};
pub use retry::{with_backoff, RetryPolicy};
pub use stripe::{
    verify_signature, GatewayError, MockPaymentGateway, SignatureError, StripeGateway,
    SIGNATURE_TOLERANCE,
};
pub use templates::EmailTemplates;
pub use webhook::{DispatchOutcome, DispatchStatus, Dispatcher, WebhookDispatcher};

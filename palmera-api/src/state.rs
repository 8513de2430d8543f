use palmera_core::payment::PaymentGateway;
use palmera_core::repository::Storage;
use palmera_pipeline::{Dispatcher, Mailer, SubmissionPipeline};
use std::sync::Arc;

/// Session-auth settings lifted out of the loaded config.
#[derive(Clone)]
pub struct AuthSettings {
    pub session_secret: String,
    pub session_ttl_seconds: u64,
    pub admin_email: String,
    pub admin_password: String,
    pub partner_email: Option<String>,
    pub partner_password: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub pipeline: Arc<SubmissionPipeline>,
    pub gateway: Arc<dyn PaymentGateway>,
    /// Present when SMTP is configured; the test-email route needs it.
    pub mailer: Option<Arc<dyn Mailer>>,
    /// Present when a webhook target is configured; the test-webhook route
    /// needs it.
    pub dispatcher: Option<Arc<dyn Dispatcher>>,
    pub auth: AuthSettings,
    pub stripe_webhook_secret: Option<String>,
}

use palmera_api::{app, AppState, AuthSettings};
use palmera_core::payment::PaymentGateway;
use palmera_core::repository::Storage;
use palmera_pipeline::{
    AirtableSync, Dispatcher, EmailTemplates, Mailer, MockPaymentGateway, RecordSync, SmtpMailer,
    StripeGateway, SubmissionPipeline, WebhookDispatcher,
};
use palmera_store::app_config::{Config, StorageBackend};
use palmera_store::{DbClient, MemStorage, PgStorage, SupabaseStorage};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "palmera_api=debug,palmera_pipeline=debug,palmera_store=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Palmera API on port {}", config.server.port);

    let storage: Arc<dyn Storage> = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database.url)
                .await
                .expect("Failed to connect to Postgres");
            db.migrate().await.expect("Failed to run migrations");
            Arc::new(PgStorage::new(db.pool.clone()))
        }
        StorageBackend::Supabase => {
            let supabase = config
                .supabase
                .as_ref()
                .expect("storage.backend is 'supabase' but [supabase] is not configured");
            Arc::new(SupabaseStorage::new(supabase).expect("Failed to build Supabase client"))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            Arc::new(MemStorage::new())
        }
    };

    let sync: Option<Arc<dyn RecordSync>> = config.airtable.as_ref().map(|airtable| {
        Arc::new(AirtableSync::new(airtable).expect("Failed to build Airtable client"))
            as Arc<dyn RecordSync>
    });

    let mailer: Option<Arc<dyn Mailer>> = config.email.as_ref().map(|email| {
        Arc::new(SmtpMailer::new(email).expect("Failed to build SMTP mailer")) as Arc<dyn Mailer>
    });

    let templates = EmailTemplates::new().expect("Failed to compile email templates");

    let dispatcher: Option<Arc<dyn Dispatcher>> = config.webhook.as_ref().map(|webhook| {
        let dispatcher = WebhookDispatcher::new(webhook, templates.clone())
            .expect("Failed to build webhook dispatcher");
        let dispatcher = match (&mailer, &config.email) {
            (Some(mailer), Some(email)) => {
                dispatcher.with_admin_alerts(mailer.clone(), email.admin_address.clone())
            }
            _ => dispatcher,
        };
        Arc::new(dispatcher) as Arc<dyn Dispatcher>
    });

    let gateway: Arc<dyn PaymentGateway> = match &config.stripe {
        Some(stripe) => Arc::new(
            StripeGateway::new(stripe.secret_key.clone()).expect("Failed to build Stripe client"),
        ),
        None => {
            tracing::warn!("stripe is not configured; using the mock payment gateway");
            Arc::new(MockPaymentGateway)
        }
    };

    let pipeline = Arc::new(
        SubmissionPipeline::new(
            storage.clone(),
            sync,
            dispatcher.clone(),
            mailer.clone(),
            Some(config.guides.download_base_url.clone()),
        )
        .expect("Failed to build submission pipeline"),
    );

    let app_state = AppState {
        storage,
        pipeline,
        gateway,
        mailer,
        dispatcher,
        auth: AuthSettings {
            session_secret: config.auth.session_secret.clone(),
            session_ttl_seconds: config.auth.session_ttl_seconds,
            admin_email: config.auth.admin_email.clone(),
            admin_password: config.auth.admin_password.clone(),
            partner_email: config.auth.partner_email.clone(),
            partner_password: config.auth.partner_password.clone(),
        },
        stripe_webhook_secret: config.stripe.as_ref().map(|s| s.webhook_secret.clone()),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

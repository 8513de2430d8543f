use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use palmera_core::extension::ExtensionMap;
use palmera_core::projection::PROJECTION_VERSION;
use palmera_core::repository::Storage;
use palmera_core::submission::{
    Booking, BookingType, GuideStatus, InterestType, Lead, LeadStatus, PaymentState, Submission,
    SubmissionKind, UtmParams,
};
use palmera_pipeline::{
    AirtableSync, DispatchStatus, Dispatcher, EmailTemplates, Mailer, RecordSync, RetryPolicy,
    StepOutcome, SubmissionPipeline, SyncError, WebhookDispatcher,
};
use palmera_store::app_config::{AirtableConfig, WebhookConfig};
use palmera_store::MemStorage;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CountingMailer {
    sent: AtomicU32,
    deliveries: Mutex<Vec<(String, String)>>,
}

impl CountingMailer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: AtomicU32::new(0),
            deliveries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Mailer for CountingMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> bool {
        self.sent.fetch_add(1, Ordering::SeqCst);
        self.deliveries
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        true
    }
}

fn airtable_config() -> AirtableConfig {
    AirtableConfig {
        api_key: "key_test".to_string(),
        base_id: "appTest".to_string(),
        leads_table: "Leads".to_string(),
        bookings_table: "Bookings".to_string(),
        guides_table: "Guides".to_string(),
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(5))
}

fn sample_lead() -> Submission {
    Submission::Lead(Lead {
        id: Uuid::new_v4(),
        first_name: "Maya".to_string(),
        last_name: Some("Flores".to_string()),
        email: "maya@example.com".to_string(),
        phone: None,
        interest_type: InterestType::Villa,
        source: Some("homepage".to_string()),
        status: LeadStatus::New,
        tags: vec![],
        utm: UtmParams::default(),
        form_data: ExtensionMap::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    })
}

fn sample_booking(tracking_id: Option<&str>) -> Submission {
    let mut form_data = ExtensionMap::new();
    if let Some(id) = tracking_id {
        form_data.insert("trackingId", json!(id));
    }
    Submission::Booking(Booking {
        id: Uuid::new_v4(),
        booking_type: BookingType::Villa,
        first_name: "Diego".to_string(),
        last_name: None,
        email: "diego@example.com".to_string(),
        phone: None,
        listing_id: None,
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        end_date: NaiveDate::from_ymd_opt(2025, 6, 8),
        guests: Some(2),
        total_amount: Some(4500),
        currency: "USD".to_string(),
        payment_status: PaymentState::Pending,
        payment_method: None,
        payment_intent_id: None,
        special_requests: None,
        form_data,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    })
}

// ==================== Airtable sync ====================

#[tokio::test]
async fn test_airtable_sync_retries_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/appTest/Leads"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/appTest/Leads"))
        .and(header("authorization", "Bearer key_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "recABC123"})))
        .expect(1)
        .mount(&server)
        .await;

    let sync = AirtableSync::new(&airtable_config())
        .unwrap()
        .with_base_url(server.uri())
        .with_retry_policy(fast_retry());

    let record_id = sync.sync(&sample_lead()).await.unwrap();
    assert_eq!(record_id, "recABC123");
}

#[tokio::test]
async fn test_airtable_sync_gives_up_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/appTest/Bookings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("over quota"))
        .expect(3)
        .mount(&server)
        .await;

    let sync = AirtableSync::new(&airtable_config())
        .unwrap()
        .with_base_url(server.uri())
        .with_retry_policy(fast_retry());

    let err = sync.sync(&sample_booking(None)).await.unwrap_err();
    match err {
        SyncError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "over quota");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

// ==================== Webhook dispatch ====================

#[tokio::test]
async fn test_dispatcher_uses_relay_exactly_once_when_primary_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/intake"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/relay"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = WebhookConfig {
        target_url: format!("{}/hooks/intake", server.uri()),
        relay_base_url: Some(server.uri()),
        timeout_seconds: 5,
    };
    let dispatcher = WebhookDispatcher::new(&config, EmailTemplates::new().unwrap()).unwrap();

    let outcome = dispatcher.dispatch(&sample_lead()).await;
    assert_eq!(outcome.status, DispatchStatus::Warning);
    assert!(!outcome.email_sent);
}

#[tokio::test]
async fn test_dispatcher_reports_error_but_still_alerts_admin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/intake"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/relay"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let config = WebhookConfig {
        target_url: format!("{}/hooks/intake", server.uri()),
        relay_base_url: Some(server.uri()),
        timeout_seconds: 5,
    };
    let mailer = CountingMailer::new();
    let dispatcher = WebhookDispatcher::new(&config, EmailTemplates::new().unwrap())
        .unwrap()
        .with_admin_alerts(mailer.clone(), "admin@palmera.travel");

    let outcome = dispatcher.dispatch(&sample_lead()).await;
    assert_eq!(outcome.status, DispatchStatus::Error);
    assert!(outcome.email_sent);
    assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
    let deliveries = mailer.deliveries.lock().unwrap();
    assert_eq!(deliveries[0].0, "admin@palmera.travel");
}

#[tokio::test]
async fn test_webhook_payload_carries_projection_and_tracking() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/intake"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = WebhookConfig {
        target_url: format!("{}/hooks/intake", server.uri()),
        relay_base_url: None,
        timeout_seconds: 5,
    };
    let dispatcher = WebhookDispatcher::new(&config, EmailTemplates::new().unwrap()).unwrap();

    let outcome = dispatcher.dispatch(&sample_booking(Some("trk-form-1"))).await;
    assert_eq!(outcome.status, DispatchStatus::Success);
    // A tracking id supplied by the form is reused, not replaced.
    assert_eq!(outcome.tracking_id, "trk-form-1");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["first_name"], json!("Diego"));
    assert_eq!(body["start_date"], json!("2025-06-01"));
    assert_eq!(body["guests"], json!(2));
    assert_eq!(body["total_amount"], json!(4500));
    assert_eq!(body["webhook_type"], json!("booking"));
    assert_eq!(body["tracking_id"], json!("trk-form-1"));
    assert_eq!(body["projection_version"], json!(PROJECTION_VERSION));
}

// ==================== Full pipeline ====================

#[tokio::test]
async fn test_guide_submission_flows_through_every_step() {
    let airtable_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/appTest/Guides"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "recGuide1"})))
        .expect(1)
        .mount(&airtable_server)
        .await;

    let hook_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/intake"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&hook_server)
        .await;

    let sync = AirtableSync::new(&airtable_config())
        .unwrap()
        .with_base_url(airtable_server.uri())
        .with_retry_policy(fast_retry());

    let webhook_config = WebhookConfig {
        target_url: format!("{}/hooks/intake", hook_server.uri()),
        relay_base_url: None,
        timeout_seconds: 5,
    };
    // One mailer serves both the admin alert and the customer email.
    let mailer = CountingMailer::new();
    let dispatcher = WebhookDispatcher::new(&webhook_config, EmailTemplates::new().unwrap())
        .unwrap()
        .with_admin_alerts(mailer.clone(), "admin@palmera.travel");

    let storage = Arc::new(MemStorage::new());
    let pipeline = SubmissionPipeline::new(
        storage.clone(),
        Some(Arc::new(sync)),
        Some(Arc::new(dispatcher)),
        Some(mailer.clone()),
        Some("https://cdn.palmera.travel/guides".to_string()),
    )
    .unwrap();

    let payload = json!({
        "firstName": "Ana",
        "email": "ana@island.example",
        "guideType": "surf",
        "interestAreas": ["beaches", "food"]
    });
    let report = pipeline.submit(SubmissionKind::Guide, &payload).await.unwrap();

    match &report.sync {
        StepOutcome::Completed(record_id) => assert_eq!(record_id, "recGuide1"),
        other => panic!("expected completed sync, got {other:?}"),
    }
    match &report.webhook {
        StepOutcome::Completed(outcome) => {
            assert_eq!(outcome.status, DispatchStatus::Success);
            assert!(outcome.email_sent);
        }
        other => panic!("expected completed dispatch, got {other:?}"),
    }
    assert!(report.customer_email.is_completed());

    // Admin alert plus customer delivery.
    assert_eq!(mailer.sent.load(Ordering::SeqCst), 2);
    let deliveries = mailer.deliveries.lock().unwrap();
    assert!(deliveries.iter().any(|(to, _)| to == "admin@palmera.travel"));
    assert!(deliveries.iter().any(|(to, _)| to == "ana@island.example"));

    let guides = storage.list_guide_submissions().await.unwrap();
    assert_eq!(guides.len(), 1);
    assert_eq!(guides[0].status, GuideStatus::Sent);
    assert!(!guides[0].submission_id.is_empty());

    let airtable_requests = airtable_server.received_requests().await.unwrap();
    let airtable_body: Value = serde_json::from_slice(&airtable_requests[0].body).unwrap();
    assert_eq!(airtable_body["fields"]["guide_type"], json!("surf"));
    assert_eq!(
        airtable_body["fields"]["download_link"],
        json!("https://cdn.palmera.travel/guides/surf.pdf")
    );
    assert_eq!(airtable_body["fields"]["interest_areas"], json!("beaches, food"));

    let hook_requests = hook_server.received_requests().await.unwrap();
    let hook_body: Value = serde_json::from_slice(&hook_requests[0].body).unwrap();
    assert_eq!(hook_body["webhook_type"], json!("guide"));
    assert_eq!(hook_body["submission_type"], json!("surf"));
}

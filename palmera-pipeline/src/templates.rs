use handlebars::Handlebars;
use palmera_core::projection;
use palmera_core::submission::{Booking, GuideSubmission, Submission};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

const BOOKING_CONFIRMATION: &str = r#"<html>
<body style="font-family: Georgia, serif; color: #2d3436;">
  <h2>Thank you, {{first_name}}!</h2>
  <p>We received your {{booking_type}} booking request and our concierge team
  is reviewing availability now. You will hear from us within 24 hours.</p>
  <table cellpadding="6">
    {{#if start_date}}<tr><td><strong>Arrival</strong></td><td>{{start_date}}</td></tr>{{/if}}
    {{#if end_date}}<tr><td><strong>Departure</strong></td><td>{{end_date}}</td></tr>{{/if}}
    {{#if guests}}<tr><td><strong>Guests</strong></td><td>{{guests}}</td></tr>{{/if}}
    {{#if total}}<tr><td><strong>Estimated total</strong></td><td>{{currency}} {{total}}</td></tr>{{/if}}
    {{#if special_requests}}<tr><td><strong>Requests</strong></td><td>{{special_requests}}</td></tr>{{/if}}
  </table>
  <p>Warm regards,<br/>The Palmera Travel Team</p>
</body>
</html>"#;

const GUIDE_DELIVERY: &str = r#"<html>
<body style="font-family: Georgia, serif; color: #2d3436;">
  <h2>Your {{guide_type}} guide is ready, {{first_name}}!</h2>
  <p><a href="{{download_link}}">Download your guide here</a>.</p>
  <p>Inside you will find our hand-picked stays, restaurants and local tips.
  Reply to this email any time and a travel planner will pick it up.</p>
  <p>Warm regards,<br/>The Palmera Travel Team</p>
</body>
</html>"#;

const ADMIN_ALERT: &str = r#"<html>
<body style="font-family: monospace; color: #2d3436;">
  <h3>New {{kind}} submission</h3>
  <p>Tracking id: {{tracking_id}}</p>
  <ul>
    {{#each fields}}<li><strong>{{@key}}</strong>: {{this}}</li>
    {{/each}}
  </ul>
</body>
</html>"#;

/// Pre-compiled HTML bodies for outbound email. Rendering never fails the
/// caller; a render problem falls back to a plain-text body.
#[derive(Clone)]
pub struct EmailTemplates {
    registry: Arc<Handlebars<'static>>,
}

impl EmailTemplates {
    pub fn new() -> Result<Self, handlebars::TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string("booking_confirmation", BOOKING_CONFIRMATION)?;
        registry.register_template_string("guide_delivery", GUIDE_DELIVERY)?;
        registry.register_template_string("admin_alert", ADMIN_ALERT)?;
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    fn render(&self, name: &str, data: &serde_json::Value, fallback: String) -> String {
        match self.registry.render(name, data) {
            Ok(html) => html,
            Err(err) => {
                warn!(template = name, error = %err, "template render failed, using fallback body");
                fallback
            }
        }
    }

    pub fn booking_confirmation(&self, booking: &Booking) -> String {
        let data = json!({
            "first_name": booking.first_name,
            "booking_type": booking.booking_type.as_str(),
            "start_date": booking.start_date.map(|d| d.format("%b %d, %Y").to_string()),
            "end_date": booking.end_date.map(|d| d.format("%b %d, %Y").to_string()),
            "guests": booking.guests,
            "total": booking.total_amount.map(format_minor_units),
            "currency": booking.currency,
            "special_requests": booking.special_requests,
        });
        let fallback = format!(
            "Thank you {}, we received your {} booking request.",
            booking.first_name,
            booking.booking_type.as_str()
        );
        self.render("booking_confirmation", &data, fallback)
    }

    pub fn guide_delivery(&self, guide: &GuideSubmission, download_link: &str) -> String {
        let data = json!({
            "first_name": guide.first_name,
            "guide_type": guide.guide_type,
            "download_link": download_link,
        });
        let fallback = format!(
            "Hi {}, download your {} guide here: {}",
            guide.first_name, guide.guide_type, download_link
        );
        self.render("guide_delivery", &data, fallback)
    }

    pub fn admin_alert(&self, submission: &Submission, tracking_id: &str) -> String {
        let data = json!({
            "kind": submission.kind().as_str(),
            "tracking_id": tracking_id,
            "fields": projection::project(submission),
        });
        let fallback = format!(
            "New {} submission ({})",
            submission.kind().as_str(),
            tracking_id
        );
        self.render("admin_alert", &data, fallback)
    }
}

fn format_minor_units(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use palmera_core::extension::ExtensionMap;
    use palmera_core::submission::{BookingType, PaymentState};
    use uuid::Uuid;

    fn sample_booking() -> Booking {
        Booking {
            id: Uuid::new_v4(),
            booking_type: BookingType::Villa,
            first_name: "Maya".to_string(),
            last_name: Some("Flores".to_string()),
            email: "maya@example.com".to_string(),
            phone: None,
            listing_id: None,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 15),
            guests: Some(4),
            total_amount: Some(450_000),
            currency: "USD".to_string(),
            payment_status: PaymentState::Pending,
            payment_method: None,
            payment_intent_id: None,
            special_requests: None,
            form_data: ExtensionMap::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_booking_confirmation_renders_details() {
        let templates = EmailTemplates::new().unwrap();
        let html = templates.booking_confirmation(&sample_booking());
        assert!(html.contains("Thank you, Maya!"));
        assert!(html.contains("villa"));
        assert!(html.contains("USD 4500.00"));
        assert!(html.contains("Mar 10, 2025"));
    }

    #[test]
    fn test_booking_confirmation_omits_absent_fields() {
        let templates = EmailTemplates::new().unwrap();
        let mut booking = sample_booking();
        booking.total_amount = None;
        booking.guests = None;
        let html = templates.booking_confirmation(&booking);
        assert!(!html.contains("Estimated total"));
        assert!(!html.contains("Guests"));
    }

    #[test]
    fn test_guide_delivery_embeds_download_link() {
        let templates = EmailTemplates::new().unwrap();
        let guide = GuideSubmission {
            id: Uuid::new_v4(),
            guide_type: "villa".to_string(),
            first_name: "Ana".to_string(),
            last_name: None,
            email: "ana@example.com".to_string(),
            phone: None,
            interest_areas: vec![],
            submission_id: "guide-1".to_string(),
            status: palmera_core::submission::GuideStatus::Pending,
            form_data: ExtensionMap::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let html = templates.guide_delivery(&guide, "https://cdn.palmera.travel/guides/villa.pdf");
        assert!(html.contains("https://cdn.palmera.travel/guides/villa.pdf"));
        assert!(html.contains("Ana"));
    }
}

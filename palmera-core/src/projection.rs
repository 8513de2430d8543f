use serde_json::{json, Map, Value};

use crate::submission::{Submission, SubmissionKind};

/// Bumped whenever a field table changes shape, so downstream automation
/// can branch on the payload generation it receives.
pub const PROJECTION_VERSION: u32 = 2;

/// Maps one extension-blob key onto a flat downstream field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub key: &'static str,
    pub column: &'static str,
}

const fn rule(key: &'static str, column: &'static str) -> FieldRule {
    FieldRule { key, column }
}

pub static LEAD_RULES: &[FieldRule] = &[
    rule("checkIn", "start_date"),
    rule("checkOut", "end_date"),
    rule("budgetRange", "budget_range"),
    rule("groupSize", "group_size"),
    rule("eventDate", "event_date"),
    rule("eventType", "event_type"),
    rule("message", "message"),
];

pub static BOOKING_RULES: &[FieldRule] = &[
    rule("budgetRange", "budget_range"),
    rule("arrivalTime", "arrival_time"),
    rule("occasion", "occasion"),
    rule("dietaryRequests", "dietary_requests"),
    rule("message", "message"),
];

pub static GUIDE_RULES: &[FieldRule] = &[
    rule("downloadLink", "download_link"),
    rule("travelDate", "travel_date"),
    rule("newsletterOptIn", "newsletter_opt_in"),
    rule("message", "message"),
];

pub fn rules_for(kind: SubmissionKind) -> &'static [FieldRule] {
    match kind {
        SubmissionKind::Lead => LEAD_RULES,
        SubmissionKind::Booking => BOOKING_RULES,
        SubmissionKind::Guide => GUIDE_RULES,
    }
}

/// Flattens a persisted submission into the field set shared by the
/// Airtable sync and the webhook dispatcher. Extension keys without a
/// rule are dropped; typed fields win over a colliding extension key.
pub fn project(submission: &Submission) -> Map<String, Value> {
    let mut fields = Map::new();

    fields.insert("first_name".into(), json!(submission.first_name()));
    if let Some(last) = submission.last_name() {
        fields.insert("last_name".into(), json!(last));
    }
    fields.insert("email".into(), json!(submission.email()));
    fields.insert("submission_type".into(), json!(submission.subtype()));

    for rule in rules_for(submission.kind()) {
        if let Some(value) = submission.form_data().get(rule.key) {
            if !value.is_null() {
                fields.insert(rule.column.into(), value.clone());
            }
        }
    }

    match submission {
        Submission::Lead(lead) => {
            if let Some(phone) = &lead.phone {
                fields.insert("phone".into(), json!(phone));
            }
            fields.insert("interest_type".into(), json!(lead.interest_type.as_str()));
            fields.insert("status".into(), json!(lead.status.as_str()));
            if let Some(source) = &lead.source {
                fields.insert("source".into(), json!(source));
            }
            if !lead.tags.is_empty() {
                fields.insert("tags".into(), json!(lead.tags.join(", ")));
            }
            if let Some(s) = &lead.utm.utm_source {
                fields.insert("utm_source".into(), json!(s));
            }
            if let Some(m) = &lead.utm.utm_medium {
                fields.insert("utm_medium".into(), json!(m));
            }
            if let Some(c) = &lead.utm.utm_campaign {
                fields.insert("utm_campaign".into(), json!(c));
            }
            if let Some(t) = &lead.utm.utm_term {
                fields.insert("utm_term".into(), json!(t));
            }
            if let Some(c) = &lead.utm.utm_content {
                fields.insert("utm_content".into(), json!(c));
            }
        }
        Submission::Booking(booking) => {
            if let Some(phone) = &booking.phone {
                fields.insert("phone".into(), json!(phone));
            }
            fields.insert("booking_type".into(), json!(booking.booking_type.as_str()));
            if let Some(listing) = &booking.listing_id {
                fields.insert("listing_id".into(), json!(listing.to_string()));
            }
            if let Some(date) = &booking.start_date {
                fields.insert("start_date".into(), json!(date.format("%Y-%m-%d").to_string()));
            }
            if let Some(date) = &booking.end_date {
                fields.insert("end_date".into(), json!(date.format("%Y-%m-%d").to_string()));
            }
            if let Some(guests) = booking.guests {
                fields.insert("guests".into(), json!(guests));
            }
            if let Some(total) = booking.total_amount {
                fields.insert("total_amount".into(), json!(total));
            }
            fields.insert("currency".into(), json!(booking.currency));
            fields.insert("payment_status".into(), json!(booking.payment_status.as_str()));
            if let Some(method) = &booking.payment_method {
                fields.insert("payment_method".into(), json!(method));
            }
            if let Some(requests) = &booking.special_requests {
                fields.insert("special_requests".into(), json!(requests));
            }
        }
        Submission::Guide(guide) => {
            if let Some(phone) = &guide.phone {
                fields.insert("phone".into(), json!(phone));
            }
            fields.insert("guide_type".into(), json!(guide.guide_type));
            if !guide.interest_areas.is_empty() {
                fields.insert("interest_areas".into(), json!(guide.interest_areas.join(", ")));
            }
            fields.insert("submission_id".into(), json!(guide.submission_id));
            fields.insert("status".into(), json!(guide.status.as_str()));
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionMap;
    use crate::submission::{
        Booking, BookingType, GuideStatus, GuideSubmission, InterestType, Lead, LeadStatus,
        PaymentState, UtmParams,
    };
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn booking_fixture() -> Booking {
        let mut form_data = ExtensionMap::new();
        form_data.insert("budgetRange", json!("5k-10k"));
        form_data.insert("favoriteColor", json!("teal"));
        Booking {
            id: Uuid::new_v4(),
            booking_type: BookingType::Villa,
            first_name: "Maya".into(),
            last_name: Some("Reyes".into()),
            email: "maya@example.com".into(),
            phone: None,
            listing_id: None,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 8),
            guests: Some(2),
            total_amount: Some(4500),
            currency: "USD".into(),
            payment_status: PaymentState::Pending,
            payment_method: None,
            payment_intent_id: None,
            special_requests: None,
            form_data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_booking_fields_survive_projection() {
        let fields = project(&Submission::Booking(booking_fixture()));
        assert_eq!(fields["total_amount"], json!(4500));
        assert_eq!(fields["guests"], json!(2));
        assert_eq!(fields["start_date"], json!("2025-06-01"));
        assert_eq!(fields["end_date"], json!("2025-06-08"));
        assert_eq!(fields["submission_type"], json!("villa"));
        assert_eq!(fields["budget_range"], json!("5k-10k"));
    }

    #[test]
    fn test_unmapped_extension_keys_are_dropped() {
        let fields = project(&Submission::Booking(booking_fixture()));
        assert!(!fields.contains_key("favoriteColor"));
        assert!(!fields.contains_key("favorite_color"));
    }

    #[test]
    fn test_lead_dates_come_from_the_extension_blob() {
        let mut form_data = ExtensionMap::new();
        form_data.insert("checkIn", json!("2025-07-01"));
        form_data.insert("checkOut", json!("2025-07-05"));
        let lead = Lead {
            id: Uuid::new_v4(),
            first_name: "Ana".into(),
            last_name: None,
            email: "ana@example.com".into(),
            phone: None,
            interest_type: InterestType::Villa,
            source: Some("homepage".into()),
            status: LeadStatus::New,
            tags: vec!["vip".into(), "returning".into()],
            utm: UtmParams {
                utm_source: Some("instagram".into()),
                ..UtmParams::default()
            },
            form_data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let fields = project(&Submission::Lead(lead));
        assert_eq!(fields["start_date"], json!("2025-07-01"));
        assert_eq!(fields["end_date"], json!("2025-07-05"));
        assert_eq!(fields["tags"], json!("vip, returning"));
        assert_eq!(fields["utm_source"], json!("instagram"));
        assert_eq!(fields["submission_type"], json!("villa"));
    }

    #[test]
    fn test_guide_projection_carries_download_link() {
        let mut form_data = ExtensionMap::new();
        form_data.insert("downloadLink", json!("https://cdn.example.com/guides/villa.pdf"));
        let guide = GuideSubmission {
            id: Uuid::new_v4(),
            first_name: "Ana".into(),
            last_name: None,
            email: "ana@x.com".into(),
            phone: None,
            guide_type: "villa".into(),
            interest_areas: vec!["beaches".into()],
            submission_id: "gd-123".into(),
            status: GuideStatus::Pending,
            form_data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let fields = project(&Submission::Guide(guide));
        assert_eq!(
            fields["download_link"],
            json!("https://cdn.example.com/guides/villa.pdf")
        );
        assert_eq!(fields["submission_id"], json!("gd-123"));
        assert_eq!(fields["interest_areas"], json!("beaches"));
    }
}

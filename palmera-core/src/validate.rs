use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::extension::ExtensionMap;
use crate::submission::{
    BookingType, InterestType, NewBooking, NewGuideSubmission, NewLead, NewSubmission,
    SubmissionKind, UtmParams,
};

/// One problem with one field of the incoming payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Every violation found in a payload, reported together.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("validation failed: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks a raw form payload against the typed shape for `kind`.
///
/// Pure: no I/O, no clock, no id generation. Walks every field before
/// reporting, so the caller gets the complete violation list in one
/// round trip. Accepts both the public forms' camelCase keys and
/// snake_case equivalents; keys outside the typed shape are collected
/// into `form_data` along with an explicit `formData` object.
pub fn validate(kind: SubmissionKind, raw: &Value) -> Result<NewSubmission, ValidationError> {
    let mut form = match RawForm::new(raw) {
        Some(form) => form,
        None => {
            return Err(ValidationError {
                violations: vec![FieldViolation {
                    field: "payload".into(),
                    message: "must be a JSON object".into(),
                }],
            })
        }
    };

    let built = match kind {
        SubmissionKind::Lead => build_lead(&mut form).map(NewSubmission::Lead),
        SubmissionKind::Booking => build_booking(&mut form).map(NewSubmission::Booking),
        SubmissionKind::Guide => build_guide(&mut form).map(NewSubmission::Guide),
    };

    match built {
        Some(submission) if form.violations.is_empty() => Ok(submission),
        _ => Err(ValidationError {
            violations: form.violations,
        }),
    }
}

fn build_lead(form: &mut RawForm) -> Option<NewLead> {
    let first_name = form.require_str("firstName", &["firstName", "first_name"]);
    let last_name = form.opt_str(&["lastName", "last_name"]);
    let email = form.require_email();
    let phone = form.opt_str(&["phone"]);
    let interest_type = form.require_with(
        "interestType",
        &["interestType", "interest_type"],
        InterestType::parse,
        "one of villa, resort, adventure, wedding, group_trip, influencer, concierge",
    );
    let source = form.opt_str(&["source"]);
    let tags = form.opt_list("tags", &["tags"]);
    let utm = UtmParams {
        utm_source: form.opt_str(&["utmSource", "utm_source"]),
        utm_medium: form.opt_str(&["utmMedium", "utm_medium"]),
        utm_campaign: form.opt_str(&["utmCampaign", "utm_campaign"]),
        utm_term: form.opt_str(&["utmTerm", "utm_term"]),
        utm_content: form.opt_str(&["utmContent", "utm_content"]),
    };
    let form_data = form.extension();

    Some(NewLead {
        first_name: first_name?,
        last_name,
        email: email?,
        phone,
        interest_type: interest_type?,
        source,
        tags,
        utm,
        form_data,
    })
}

fn build_booking(form: &mut RawForm) -> Option<NewBooking> {
    let booking_type = form.require_with(
        "bookingType",
        &["bookingType", "booking_type"],
        BookingType::parse,
        "one of villa, resort, adventure, restaurant, event",
    );
    let first_name = form.require_str("firstName", &["firstName", "first_name"]);
    let last_name = form.opt_str(&["lastName", "last_name"]);
    let email = form.require_email();
    let phone = form.opt_str(&["phone"]);
    let listing_id = form.opt_with(
        "listingId",
        &["listingId", "listing_id"],
        |s| Uuid::parse_str(s).ok(),
        "a valid UUID",
    );
    let start_date = form.opt_date("startDate", &["startDate", "start_date", "checkIn", "check_in"]);
    let end_date = form.opt_date("endDate", &["endDate", "end_date", "checkOut", "check_out"]);
    let guests = form.opt_i64("guests", &["guests"]).map(|n| n as i32);
    let total_amount = form.opt_i64("totalAmount", &["totalAmount", "total_amount"]);
    let currency = form
        .opt_str(&["currency"])
        .unwrap_or_else(|| "USD".to_string());
    let payment_method = form.opt_str(&["paymentMethod", "payment_method"]);
    let payment_intent_id = form.opt_str(&["paymentIntentId", "payment_intent_id"]);
    let special_requests = form.opt_str(&["specialRequests", "special_requests"]);
    // Payment state is owned by the gateway webhook; a client-sent value
    // is dropped rather than persisted.
    form.discard(&["paymentStatus", "payment_status"]);
    let form_data = form.extension();

    Some(NewBooking {
        booking_type: booking_type?,
        first_name: first_name?,
        last_name,
        email: email?,
        phone,
        listing_id,
        start_date,
        end_date,
        guests,
        total_amount,
        currency,
        payment_method,
        payment_intent_id,
        special_requests,
        form_data,
    })
}

fn build_guide(form: &mut RawForm) -> Option<NewGuideSubmission> {
    let first_name = form.require_str("firstName", &["firstName", "first_name"]);
    let last_name = form.opt_str(&["lastName", "last_name"]);
    let email = form.require_email();
    let phone = form.opt_str(&["phone"]);
    let guide_type = form.require_str("guideType", &["guideType", "guide_type"]);
    let interest_areas = form.opt_list("interestAreas", &["interestAreas", "interest_areas"]);
    let submission_id = form.opt_str(&["submissionId", "submission_id"]);
    let form_data = form.extension();

    Some(NewGuideSubmission {
        first_name: first_name?,
        last_name,
        email: email?,
        phone,
        guide_type: guide_type?,
        interest_areas,
        submission_id,
        form_data,
    })
}

/// Cursor over the raw payload object: tracks which keys the typed shape
/// consumed and accumulates violations as fields are walked.
struct RawForm<'a> {
    map: &'a Map<String, Value>,
    consumed: BTreeSet<&'static str>,
    violations: Vec<FieldViolation>,
}

impl<'a> RawForm<'a> {
    fn new(raw: &'a Value) -> Option<Self> {
        Some(Self {
            map: raw.as_object()?,
            consumed: BTreeSet::new(),
            violations: Vec::new(),
        })
    }

    fn violation(&mut self, field: &str, message: &str) {
        self.violations.push(FieldViolation {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// First present alias, marking every alias consumed either way.
    fn take(&mut self, names: &'static [&'static str]) -> Option<&'a Value> {
        self.consumed.extend(names);
        names.iter().find_map(|name| self.map.get(*name))
    }

    fn discard(&mut self, names: &'static [&'static str]) {
        self.consumed.extend(names);
    }

    fn take_trimmed(&mut self, names: &'static [&'static str]) -> Option<Result<String, ()>> {
        let value = self.take(names)?;
        match value {
            Value::Null => None,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Ok(trimmed.to_string()))
                }
            }
            _ => Some(Err(())),
        }
    }

    fn require_str(&mut self, canonical: &str, names: &'static [&'static str]) -> Option<String> {
        match self.take_trimmed(names) {
            Some(Ok(s)) => Some(s),
            Some(Err(())) => {
                self.violation(canonical, "must be a string");
                None
            }
            None => {
                self.violation(canonical, "is required");
                None
            }
        }
    }

    fn opt_str(&mut self, names: &'static [&'static str]) -> Option<String> {
        match self.take_trimmed(names) {
            Some(Ok(s)) => Some(s),
            Some(Err(())) => {
                self.violation(names[0], "must be a string");
                None
            }
            None => None,
        }
    }

    fn require_email(&mut self) -> Option<String> {
        let email = self.require_str("email", &["email"])?;
        let valid = email.contains('@') && !email.starts_with('@') && !email.ends_with('@');
        if valid {
            Some(email)
        } else {
            self.violation("email", "must be a valid email address");
            None
        }
    }

    fn require_with<T>(
        &mut self,
        canonical: &str,
        names: &'static [&'static str],
        parse: impl Fn(&str) -> Option<T>,
        expected: &str,
    ) -> Option<T> {
        let raw = self.require_str(canonical, names)?;
        match parse(&raw) {
            Some(value) => Some(value),
            None => {
                self.violation(canonical, &format!("must be {expected}"));
                None
            }
        }
    }

    fn opt_with<T>(
        &mut self,
        canonical: &str,
        names: &'static [&'static str],
        parse: impl Fn(&str) -> Option<T>,
        expected: &str,
    ) -> Option<T> {
        let raw = self.opt_str_named(canonical, names)?;
        match parse(&raw) {
            Some(value) => Some(value),
            None => {
                self.violation(canonical, &format!("must be {expected}"));
                None
            }
        }
    }

    fn opt_str_named(&mut self, canonical: &str, names: &'static [&'static str]) -> Option<String> {
        match self.take_trimmed(names) {
            Some(Ok(s)) => Some(s),
            Some(Err(())) => {
                self.violation(canonical, "must be a string");
                None
            }
            None => None,
        }
    }

    fn opt_date(&mut self, canonical: &str, names: &'static [&'static str]) -> Option<NaiveDate> {
        self.opt_with(
            canonical,
            names,
            |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            "a date in YYYY-MM-DD format",
        )
    }

    /// Whole numbers arrive as JSON numbers or numeric strings.
    fn opt_i64(&mut self, canonical: &str, names: &'static [&'static str]) -> Option<i64> {
        match self.take(names)? {
            Value::Null => None,
            Value::Number(n) => match n.as_i64() {
                Some(v) => Some(v),
                None => {
                    self.violation(canonical, "must be a whole number");
                    None
                }
            },
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<i64>() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        self.violation(canonical, "must be a whole number");
                        None
                    }
                }
            }
            _ => {
                self.violation(canonical, "must be a whole number");
                None
            }
        }
    }

    /// Accepts an array of strings or a comma-separated string.
    fn opt_list(&mut self, canonical: &str, names: &'static [&'static str]) -> Vec<String> {
        let Some(value) = self.take(names) else {
            return Vec::new();
        };
        match value {
            Value::Null => Vec::new(),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(s) if !s.trim().is_empty() => out.push(s.trim().to_string()),
                        Some(_) => {}
                        None => {
                            self.violation(canonical, "must be an array of strings");
                            return Vec::new();
                        }
                    }
                }
                out
            }
            Value::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
            _ => {
                self.violation(canonical, "must be an array of strings");
                Vec::new()
            }
        }
    }

    /// Everything the typed shape did not consume, merged over an
    /// explicit `formData` object when one was sent.
    fn extension(&mut self) -> ExtensionMap {
        let mut out = ExtensionMap::new();
        match self.take(&["formData", "form_data"]) {
            Some(Value::Object(explicit)) => {
                for (key, value) in explicit {
                    out.insert(key.clone(), value.clone());
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => self.violation("formData", "must be a JSON object"),
        }
        for (key, value) in self.map {
            if !self.consumed.contains(key.as_str()) {
                out.insert(key.clone(), value.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(err: &ValidationError) -> Vec<&str> {
        err.violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn test_valid_lead_passes() {
        let raw = json!({
            "firstName": "Ana",
            "lastName": "Sol",
            "email": "ana@example.com",
            "interestType": "villa",
            "source": "homepage",
            "tags": ["vip"],
            "utmSource": "instagram",
        });
        let NewSubmission::Lead(lead) = validate(SubmissionKind::Lead, &raw).unwrap() else {
            panic!("expected a lead");
        };
        assert_eq!(lead.first_name, "Ana");
        assert_eq!(lead.email, "ana@example.com");
        assert_eq!(lead.interest_type, InterestType::Villa);
        assert_eq!(lead.tags, vec!["vip".to_string()]);
        assert_eq!(lead.utm.utm_source.as_deref(), Some("instagram"));
    }

    #[test]
    fn test_collects_every_violation() {
        let raw = json!({
            "bookingType": "spaceship",
            "guests": "a few",
            "startDate": "June 1st",
        });
        let err = validate(SubmissionKind::Booking, &raw).unwrap_err();
        let seen = fields(&err);
        assert!(seen.contains(&"bookingType"));
        assert!(seen.contains(&"firstName"));
        assert!(seen.contains(&"email"));
        assert!(seen.contains(&"guests"));
        assert!(seen.contains(&"startDate"));
        assert_eq!(err.violations.len(), 5);
    }

    #[test]
    fn test_missing_email_and_first_name_reported_together() {
        let raw = json!({ "interestType": "resort" });
        let err = validate(SubmissionKind::Lead, &raw).unwrap_err();
        assert_eq!(fields(&err), vec!["firstName", "email"]);
        for violation in &err.violations {
            assert_eq!(violation.message, "is required");
        }
    }

    #[test]
    fn test_coerces_numeric_strings_and_dates() {
        let raw = json!({
            "bookingType": "villa",
            "firstName": "Maya",
            "email": "maya@example.com",
            "guests": "2",
            "totalAmount": "4500",
            "checkIn": "2025-06-01",
            "checkOut": "2025-06-08",
        });
        let NewSubmission::Booking(booking) = validate(SubmissionKind::Booking, &raw).unwrap()
        else {
            panic!("expected a booking");
        };
        assert_eq!(booking.guests, Some(2));
        assert_eq!(booking.total_amount, Some(4500));
        assert_eq!(
            booking.start_date,
            NaiveDate::from_ymd_opt(2025, 6, 1),
        );
        assert_eq!(
            booking.end_date,
            NaiveDate::from_ymd_opt(2025, 6, 8),
        );
        assert_eq!(booking.currency, "USD");
    }

    #[test]
    fn test_snake_case_keys_accepted() {
        let raw = json!({
            "first_name": "Leo",
            "email": "leo@example.com",
            "guide_type": "adventure",
            "interest_areas": "diving, hiking",
        });
        let NewSubmission::Guide(guide) = validate(SubmissionKind::Guide, &raw).unwrap() else {
            panic!("expected a guide submission");
        };
        assert_eq!(guide.first_name, "Leo");
        assert_eq!(guide.guide_type, "adventure");
        assert_eq!(guide.interest_areas, vec!["diving", "hiking"]);
        assert_eq!(guide.submission_id, None);
    }

    #[test]
    fn test_unknown_keys_collect_into_form_data() {
        let raw = json!({
            "firstName": "Ana",
            "email": "ana@example.com",
            "interestType": "wedding",
            "eventDate": "2026-02-14",
            "formData": { "budgetRange": "10k+" },
        });
        let NewSubmission::Lead(lead) = validate(SubmissionKind::Lead, &raw).unwrap() else {
            panic!("expected a lead");
        };
        assert_eq!(lead.form_data.get_str("eventDate"), Some("2026-02-14"));
        assert_eq!(lead.form_data.get_str("budgetRange"), Some("10k+"));
        assert!(!lead.form_data.contains_key("firstName"));
        assert!(!lead.form_data.contains_key("formData"));
    }

    #[test]
    fn test_rejects_malformed_email() {
        let raw = json!({
            "firstName": "Ana",
            "email": "not-an-address",
            "interestType": "villa",
        });
        let err = validate(SubmissionKind::Lead, &raw).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].field, "email");
        assert_eq!(err.violations[0].message, "must be a valid email address");
    }

    #[test]
    fn test_payment_intent_captured_and_client_payment_status_dropped() {
        let raw = json!({
            "bookingType": "resort",
            "firstName": "Maya",
            "email": "maya@example.com",
            "paymentIntentId": "pi_123",
            "paymentStatus": "confirmed",
        });
        let NewSubmission::Booking(booking) = validate(SubmissionKind::Booking, &raw).unwrap()
        else {
            panic!("expected a booking");
        };
        assert_eq!(booking.payment_intent_id.as_deref(), Some("pi_123"));
        assert!(!booking.form_data.contains_key("paymentStatus"));
    }

    #[test]
    fn test_non_object_payload() {
        let err = validate(SubmissionKind::Lead, &json!("hello")).unwrap_err();
        assert_eq!(err.violations[0].field, "payload");
    }

    #[test]
    fn test_camel_case_alias_does_not_leak_duplicate() {
        let raw = json!({
            "firstName": "Ana",
            "first_name": "Shadow",
            "email": "ana@example.com",
            "interestType": "villa",
        });
        let NewSubmission::Lead(lead) = validate(SubmissionKind::Lead, &raw).unwrap() else {
            panic!("expected a lead");
        };
        assert_eq!(lead.first_name, "Ana");
        assert!(!lead.form_data.contains_key("first_name"));
    }
}

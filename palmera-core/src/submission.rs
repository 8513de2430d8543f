use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extension::ExtensionMap;

/// Which intake form a payload came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Lead,
    Booking,
    Guide,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Lead => "lead",
            SubmissionKind::Booking => "booking",
            SubmissionKind::Guide => "guide",
        }
    }
}

/// What a lead is asking about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterestType {
    Villa,
    Resort,
    Adventure,
    Wedding,
    GroupTrip,
    Influencer,
    Concierge,
}

impl InterestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestType::Villa => "villa",
            InterestType::Resort => "resort",
            InterestType::Adventure => "adventure",
            InterestType::Wedding => "wedding",
            InterestType::GroupTrip => "group_trip",
            InterestType::Influencer => "influencer",
            InterestType::Concierge => "concierge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "villa" => Some(InterestType::Villa),
            "resort" => Some(InterestType::Resort),
            "adventure" => Some(InterestType::Adventure),
            "wedding" => Some(InterestType::Wedding),
            "group_trip" => Some(InterestType::GroupTrip),
            "influencer" => Some(InterestType::Influencer),
            "concierge" => Some(InterestType::Concierge),
            _ => None,
        }
    }
}

/// Lead status in the follow-up lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Closed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Converted => "converted",
            LeadStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "qualified" => Some(LeadStatus::Qualified),
            "converted" => Some(LeadStatus::Converted),
            "closed" => Some(LeadStatus::Closed),
            _ => None,
        }
    }
}

/// What kind of stay or experience a booking reserves
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    Villa,
    Resort,
    Adventure,
    Restaurant,
    Event,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Villa => "villa",
            BookingType::Resort => "resort",
            BookingType::Adventure => "adventure",
            BookingType::Restaurant => "restaurant",
            BookingType::Event => "event",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "villa" => Some(BookingType::Villa),
            "resort" => Some(BookingType::Resort),
            "adventure" => Some(BookingType::Adventure),
            "restaurant" => Some(BookingType::Restaurant),
            "event" => Some(BookingType::Event),
            _ => None,
        }
    }
}

/// Payment lifecycle as observed from the gateway
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Confirmed,
    Failed,
    Refunded,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Confirmed => "confirmed",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentState::Pending),
            "confirmed" => Some(PaymentState::Confirmed),
            "failed" => Some(PaymentState::Failed),
            "refunded" => Some(PaymentState::Refunded),
            _ => None,
        }
    }
}

/// Guide delivery status, driven by the customer email outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GuideStatus {
    Pending,
    Sent,
    Failed,
}

impl GuideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuideStatus::Pending => "pending",
            GuideStatus::Sent => "sent",
            GuideStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(GuideStatus::Pending),
            "sent" => Some(GuideStatus::Sent),
            "failed" => Some(GuideStatus::Failed),
            _ => None,
        }
    }
}

/// Campaign attribution captured alongside a lead
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UtmParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

impl UtmParams {
    pub fn is_empty(&self) -> bool {
        self.utm_source.is_none()
            && self.utm_medium.is_none()
            && self.utm_campaign.is_none()
            && self.utm_term.is_none()
            && self.utm_content.is_none()
    }
}

/// A persisted inquiry from one of the contact forms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub interest_type: InterestType,
    pub source: Option<String>,
    pub status: LeadStatus,
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub utm: UtmParams,
    pub form_data: ExtensionMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated lead that has not been written yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub interest_type: InterestType,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub utm: UtmParams,
    pub form_data: ExtensionMap,
}

/// A persisted reservation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub booking_type: BookingType,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub listing_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub guests: Option<i32>,
    pub total_amount: Option<i64>,
    pub currency: String,
    pub payment_status: PaymentState,
    pub payment_method: Option<String>,
    pub payment_intent_id: Option<String>,
    pub special_requests: Option<String>,
    pub form_data: ExtensionMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated booking that has not been written yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub booking_type: BookingType,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub listing_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub guests: Option<i32>,
    pub total_amount: Option<i64>,
    pub currency: String,
    pub payment_method: Option<String>,
    pub payment_intent_id: Option<String>,
    pub special_requests: Option<String>,
    pub form_data: ExtensionMap,
}

/// Partial update applied to a booking by the admin surface.
/// Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingUpdate {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub guests: Option<i32>,
    pub total_amount: Option<i64>,
    pub payment_status: Option<PaymentState>,
    pub payment_method: Option<String>,
    pub special_requests: Option<String>,
}

/// A persisted travel-guide download request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideSubmission {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub guide_type: String,
    pub interest_areas: Vec<String>,
    pub submission_id: String,
    pub status: GuideStatus,
    pub form_data: ExtensionMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated guide request that has not been written yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewGuideSubmission {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub guide_type: String,
    pub interest_areas: Vec<String>,
    /// Correlation token; filled in by the pipeline when the form omits it.
    pub submission_id: Option<String>,
    pub form_data: ExtensionMap,
}

/// Output of the validator, ready for the primary write
#[derive(Debug, Clone, PartialEq)]
pub enum NewSubmission {
    Lead(NewLead),
    Booking(NewBooking),
    Guide(NewGuideSubmission),
}

impl NewSubmission {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            NewSubmission::Lead(_) => SubmissionKind::Lead,
            NewSubmission::Booking(_) => SubmissionKind::Booking,
            NewSubmission::Guide(_) => SubmissionKind::Guide,
        }
    }
}

/// A persisted submission of any kind, as handed to the fan-out steps
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Submission {
    Lead(Lead),
    Booking(Booking),
    Guide(GuideSubmission),
}

impl Submission {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            Submission::Lead(_) => SubmissionKind::Lead,
            Submission::Booking(_) => SubmissionKind::Booking,
            Submission::Guide(_) => SubmissionKind::Guide,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Submission::Lead(l) => l.id,
            Submission::Booking(b) => b.id,
            Submission::Guide(g) => g.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Submission::Lead(l) => &l.email,
            Submission::Booking(b) => &b.email,
            Submission::Guide(g) => &g.email,
        }
    }

    pub fn first_name(&self) -> &str {
        match self {
            Submission::Lead(l) => &l.first_name,
            Submission::Booking(b) => &b.first_name,
            Submission::Guide(g) => &g.first_name,
        }
    }

    pub fn last_name(&self) -> Option<&str> {
        match self {
            Submission::Lead(l) => l.last_name.as_deref(),
            Submission::Booking(b) => b.last_name.as_deref(),
            Submission::Guide(g) => g.last_name.as_deref(),
        }
    }

    pub fn form_data(&self) -> &ExtensionMap {
        match self {
            Submission::Lead(l) => &l.form_data,
            Submission::Booking(b) => &b.form_data,
            Submission::Guide(g) => &g.form_data,
        }
    }

    /// The concrete form variant, e.g. `villa` for a villa booking or lead.
    pub fn subtype(&self) -> &str {
        match self {
            Submission::Lead(l) => l.interest_type.as_str(),
            Submission::Booking(b) => b.booking_type.as_str(),
            Submission::Guide(g) => &g.guide_type,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookable excursion on the destination site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adventure {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_hours: Option<i32>,
    pub price: Option<i64>,
    pub currency: String,
    pub location: Option<String>,
    pub max_guests: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload for an adventure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdventure {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_hours: Option<i32>,
    pub price: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub location: Option<String>,
    pub max_guests: Option<i32>,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// A rentable property listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Villa {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub max_guests: Option<i32>,
    pub nightly_rate: Option<i64>,
    pub currency: String,
    pub location: Option<String>,
    pub amenities: Vec<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload for a villa
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVilla {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub max_guests: Option<i32>,
    pub nightly_rate: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub location: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// A partner restaurant listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub price_range: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload for a restaurant; also the bulk-import row shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRestaurant {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub price_range: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Metadata for a hosted image; no upload pipeline, URLs only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAsset {
    pub id: Uuid,
    pub file_name: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub category: Option<String>,
    pub listing_type: Option<String>,
    pub listing_id: Option<Uuid>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/replace payload for an image asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImageAsset {
    pub file_name: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub category: Option<String>,
    pub listing_type: Option<String>,
    pub listing_id: Option<Uuid>,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_active() -> bool {
    true
}

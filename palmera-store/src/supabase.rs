use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use palmera_core::catalog::{
    Adventure, ImageAsset, NewAdventure, NewImageAsset, NewRestaurant, NewVilla, Restaurant, Villa,
};
use palmera_core::repository::{Storage, StorageError};
use palmera_core::submission::{
    Booking, BookingUpdate, GuideStatus, GuideSubmission, Lead, NewBooking, NewGuideSubmission,
    NewLead, PaymentState,
};

use crate::app_config::SupabaseConfig;

#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("supabase request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("supabase responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("supabase returned no rows for an insert")]
    EmptyInsert,
}

/// PostgREST implementation of [`Storage`].
///
/// Mirrors the Postgres schema over Supabase's REST surface; row ids and
/// timestamps still come from the database defaults
/// (`Prefer: return=representation` hands the stored row back).
#[derive(Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(config: &SupabaseConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("palmera-store/0.1")
            .build()
            .map_err(SupabaseError::Http)?;
        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            service_key: config.service_key.clone(),
        })
    }

    fn headers(&self, prefer_representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if prefer_representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }
        headers
    }

    async fn parse_rows<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, StorageError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        let rows = response.json::<Vec<T>>().await.map_err(SupabaseError::Http)?;
        Ok(rows)
    }

    async fn insert_row<T: DeserializeOwned>(
        &self,
        table: &str,
        body: Value,
    ) -> Result<T, StorageError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, table))
            .headers(self.headers(true))
            .json(&body)
            .send()
            .await
            .map_err(SupabaseError::Http)?;
        let rows: Vec<T> = Self::parse_rows(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::EmptyInsert.into())
    }

    async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StorageError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, table))
            .headers(self.headers(false))
            .query(query)
            .send()
            .await
            .map_err(SupabaseError::Http)?;
        Self::parse_rows(response).await
    }

    async fn patch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: (&str, String),
        body: Value,
    ) -> Result<Vec<T>, StorageError> {
        let response = self
            .client
            .patch(format!("{}/{}", self.base_url, table))
            .headers(self.headers(true))
            .query(&[filter])
            .json(&body)
            .send()
            .await
            .map_err(SupabaseError::Http)?;
        Self::parse_rows(response).await
    }

    async fn delete_rows(&self, table: &str, filter: (&str, String)) -> Result<bool, StorageError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.base_url, table))
            .headers(self.headers(true))
            .query(&[filter])
            .send()
            .await
            .map_err(SupabaseError::Http)?;
        let rows: Vec<Value> = Self::parse_rows(response).await?;
        Ok(!rows.is_empty())
    }

    async fn get_row<T: DeserializeOwned>(
        &self,
        table: &str,
        id: Uuid,
    ) -> Result<Option<T>, StorageError> {
        let rows = self
            .select_rows::<T>(
                table,
                &[("select", "*".into()), ("id", format!("eq.{id}"))],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_table<T: DeserializeOwned>(
        &self,
        table: &str,
        order: &str,
    ) -> Result<Vec<T>, StorageError> {
        self.select_rows(table, &[("select", "*".into()), ("order", order.into())])
            .await
    }

    async fn by_email<T: DeserializeOwned>(
        &self,
        table: &str,
        email: &str,
    ) -> Result<Vec<T>, StorageError> {
        // ilike without wildcards is a case-insensitive equality match
        self.select_rows(
            table,
            &[
                ("select", "*".into()),
                ("email", format!("ilike.{email}")),
                ("order", "created_at.desc".into()),
            ],
        )
        .await
    }
}

fn adventure_body(new: &NewAdventure) -> Value {
    json!({
        "title": new.title,
        "slug": new.slug,
        "description": new.description,
        "category": new.category,
        "duration_hours": new.duration_hours,
        "price": new.price,
        "currency": new.currency,
        "location": new.location,
        "max_guests": new.max_guests,
        "image_url": new.image_url,
        "is_active": new.is_active,
    })
}

fn villa_body(new: &NewVilla) -> Value {
    json!({
        "name": new.name,
        "slug": new.slug,
        "description": new.description,
        "bedrooms": new.bedrooms,
        "bathrooms": new.bathrooms,
        "max_guests": new.max_guests,
        "nightly_rate": new.nightly_rate,
        "currency": new.currency,
        "location": new.location,
        "amenities": new.amenities,
        "image_url": new.image_url,
        "is_active": new.is_active,
    })
}

fn restaurant_body(new: &NewRestaurant) -> Value {
    json!({
        "name": new.name,
        "slug": new.slug,
        "description": new.description,
        "cuisine": new.cuisine,
        "price_range": new.price_range,
        "location": new.location,
        "phone": new.phone,
        "website": new.website,
        "image_url": new.image_url,
        "is_active": new.is_active,
    })
}

fn image_body(new: &NewImageAsset) -> Value {
    json!({
        "file_name": new.file_name,
        "url": new.url,
        "alt_text": new.alt_text,
        "category": new.category,
        "listing_type": new.listing_type,
        "listing_id": new.listing_id,
        "sort_order": new.sort_order,
    })
}

#[async_trait]
impl Storage for SupabaseStorage {
    // ==================== Submissions ====================

    async fn create_lead(&self, new: &NewLead) -> Result<Lead, StorageError> {
        let body = json!({
            "first_name": new.first_name,
            "last_name": new.last_name,
            "email": new.email,
            "phone": new.phone,
            "interest_type": new.interest_type.as_str(),
            "source": new.source,
            "tags": new.tags,
            "utm_source": new.utm.utm_source,
            "utm_medium": new.utm.utm_medium,
            "utm_campaign": new.utm.utm_campaign,
            "utm_term": new.utm.utm_term,
            "utm_content": new.utm.utm_content,
            "form_data": new.form_data,
        });
        self.insert_row("leads", body).await
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, StorageError> {
        self.list_table("leads", "created_at.desc").await
    }

    async fn leads_by_email(&self, email: &str) -> Result<Vec<Lead>, StorageError> {
        self.by_email("leads", email).await
    }

    async fn create_booking(&self, new: &NewBooking) -> Result<Booking, StorageError> {
        let body = json!({
            "booking_type": new.booking_type.as_str(),
            "first_name": new.first_name,
            "last_name": new.last_name,
            "email": new.email,
            "phone": new.phone,
            "listing_id": new.listing_id,
            "start_date": new.start_date,
            "end_date": new.end_date,
            "guests": new.guests,
            "total_amount": new.total_amount,
            "currency": new.currency,
            "payment_method": new.payment_method,
            "payment_intent_id": new.payment_intent_id,
            "special_requests": new.special_requests,
            "form_data": new.form_data,
        });
        self.insert_row("bookings", body).await
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StorageError> {
        self.get_row("bookings", id).await
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StorageError> {
        self.list_table("bookings", "created_at.desc").await
    }

    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, StorageError> {
        self.by_email("bookings", email).await
    }

    async fn update_booking(
        &self,
        id: Uuid,
        update: &BookingUpdate,
    ) -> Result<Option<Booking>, StorageError> {
        let mut body = Map::new();
        if let Some(date) = update.start_date {
            body.insert("start_date".into(), json!(date));
        }
        if let Some(date) = update.end_date {
            body.insert("end_date".into(), json!(date));
        }
        if let Some(guests) = update.guests {
            body.insert("guests".into(), json!(guests));
        }
        if let Some(total) = update.total_amount {
            body.insert("total_amount".into(), json!(total));
        }
        if let Some(status) = update.payment_status {
            body.insert("payment_status".into(), json!(status.as_str()));
        }
        if let Some(method) = &update.payment_method {
            body.insert("payment_method".into(), json!(method));
        }
        if let Some(requests) = &update.special_requests {
            body.insert("special_requests".into(), json!(requests));
        }
        body.insert("updated_at".into(), json!(Utc::now()));
        let rows = self
            .patch_rows("bookings", ("id", format!("eq.{id}")), Value::Object(body))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_booking_payment_status(
        &self,
        payment_intent_id: &str,
        status: PaymentState,
    ) -> Result<Option<Booking>, StorageError> {
        let body = json!({
            "payment_status": status.as_str(),
            "updated_at": Utc::now(),
        });
        let rows = self
            .patch_rows(
                "bookings",
                ("payment_intent_id", format!("eq.{payment_intent_id}")),
                body,
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn create_guide_submission(
        &self,
        new: &NewGuideSubmission,
    ) -> Result<GuideSubmission, StorageError> {
        let submission_id = new
            .submission_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let body = json!({
            "first_name": new.first_name,
            "last_name": new.last_name,
            "email": new.email,
            "phone": new.phone,
            "guide_type": new.guide_type,
            "interest_areas": new.interest_areas,
            "submission_id": submission_id,
            "form_data": new.form_data,
        });
        self.insert_row("guide_submissions", body).await
    }

    async fn list_guide_submissions(&self) -> Result<Vec<GuideSubmission>, StorageError> {
        self.list_table("guide_submissions", "created_at.desc").await
    }

    async fn update_guide_status(&self, id: Uuid, status: GuideStatus) -> Result<(), StorageError> {
        let body = json!({
            "status": status.as_str(),
            "updated_at": Utc::now(),
        });
        self.patch_rows::<Value>("guide_submissions", ("id", format!("eq.{id}")), body)
            .await?;
        Ok(())
    }

    // ==================== Catalog ====================

    async fn create_adventure(&self, new: &NewAdventure) -> Result<Adventure, StorageError> {
        self.insert_row("adventures", adventure_body(new)).await
    }

    async fn get_adventure(&self, id: Uuid) -> Result<Option<Adventure>, StorageError> {
        self.get_row("adventures", id).await
    }

    async fn list_adventures(&self) -> Result<Vec<Adventure>, StorageError> {
        self.list_table("adventures", "created_at.desc").await
    }

    async fn update_adventure(
        &self,
        id: Uuid,
        new: &NewAdventure,
    ) -> Result<Option<Adventure>, StorageError> {
        let mut body = adventure_body(new);
        if let Some(map) = body.as_object_mut() {
            map.insert("updated_at".into(), json!(Utc::now()));
        }
        let rows = self
            .patch_rows("adventures", ("id", format!("eq.{id}")), body)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_adventure(&self, id: Uuid) -> Result<bool, StorageError> {
        self.delete_rows("adventures", ("id", format!("eq.{id}"))).await
    }

    async fn create_villa(&self, new: &NewVilla) -> Result<Villa, StorageError> {
        self.insert_row("villas", villa_body(new)).await
    }

    async fn get_villa(&self, id: Uuid) -> Result<Option<Villa>, StorageError> {
        self.get_row("villas", id).await
    }

    async fn list_villas(&self) -> Result<Vec<Villa>, StorageError> {
        self.list_table("villas", "created_at.desc").await
    }

    async fn update_villa(&self, id: Uuid, new: &NewVilla) -> Result<Option<Villa>, StorageError> {
        let mut body = villa_body(new);
        if let Some(map) = body.as_object_mut() {
            map.insert("updated_at".into(), json!(Utc::now()));
        }
        let rows = self
            .patch_rows("villas", ("id", format!("eq.{id}")), body)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_villa(&self, id: Uuid) -> Result<bool, StorageError> {
        self.delete_rows("villas", ("id", format!("eq.{id}"))).await
    }

    async fn create_restaurant(&self, new: &NewRestaurant) -> Result<Restaurant, StorageError> {
        self.insert_row("restaurants", restaurant_body(new)).await
    }

    async fn get_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StorageError> {
        self.get_row("restaurants", id).await
    }

    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, StorageError> {
        self.list_table("restaurants", "created_at.desc").await
    }

    async fn update_restaurant(
        &self,
        id: Uuid,
        new: &NewRestaurant,
    ) -> Result<Option<Restaurant>, StorageError> {
        let mut body = restaurant_body(new);
        if let Some(map) = body.as_object_mut() {
            map.insert("updated_at".into(), json!(Utc::now()));
        }
        let rows = self
            .patch_rows("restaurants", ("id", format!("eq.{id}")), body)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_restaurant(&self, id: Uuid) -> Result<bool, StorageError> {
        self.delete_rows("restaurants", ("id", format!("eq.{id}"))).await
    }

    // ==================== Media ====================

    async fn create_image(&self, new: &NewImageAsset) -> Result<ImageAsset, StorageError> {
        self.insert_row("images", image_body(new)).await
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageAsset>, StorageError> {
        self.get_row("images", id).await
    }

    async fn list_images(&self) -> Result<Vec<ImageAsset>, StorageError> {
        self.list_table("images", "sort_order.asc,created_at.desc").await
    }

    async fn update_image(
        &self,
        id: Uuid,
        new: &NewImageAsset,
    ) -> Result<Option<ImageAsset>, StorageError> {
        let mut body = image_body(new);
        if let Some(map) = body.as_object_mut() {
            map.insert("updated_at".into(), json!(Utc::now()));
        }
        let rows = self
            .patch_rows("images", ("id", format!("eq.{id}")), body)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, StorageError> {
        self.delete_rows("images", ("id", format!("eq.{id}"))).await
    }
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use palmera_core::catalog::{
    Adventure, ImageAsset, NewAdventure, NewImageAsset, NewRestaurant, NewVilla, Restaurant, Villa,
};
use palmera_core::extension::ExtensionMap;
use palmera_core::repository::{Storage, StorageError};
use palmera_core::submission::{
    Booking, BookingType, BookingUpdate, GuideStatus, GuideSubmission, InterestType, Lead,
    LeadStatus, NewBooking, NewGuideSubmission, NewLead, PaymentState, UtmParams,
};

/// sqlx/Postgres implementation of [`Storage`]; the default backend.
#[derive(Clone)]
pub struct PgStorage {
    pool: Pool<Postgres>,
}

impl PgStorage {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn parse_enum<T>(raw: &str, parse: fn(&str) -> Option<T>, what: &str) -> Result<T, StorageError> {
    parse(raw).ok_or_else(|| format!("unknown {what} in stored row: {raw}").into())
}

#[derive(FromRow)]
struct LeadRow {
    id: Uuid,
    first_name: String,
    last_name: Option<String>,
    email: String,
    phone: Option<String>,
    interest_type: String,
    source: Option<String>,
    status: String,
    tags: Vec<String>,
    utm_source: Option<String>,
    utm_medium: Option<String>,
    utm_campaign: Option<String>,
    utm_term: Option<String>,
    utm_content: Option<String>,
    form_data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LeadRow {
    fn into_lead(self) -> Result<Lead, StorageError> {
        Ok(Lead {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            interest_type: parse_enum(&self.interest_type, InterestType::parse, "interest type")?,
            source: self.source,
            status: parse_enum(&self.status, LeadStatus::parse, "lead status")?,
            tags: self.tags,
            utm: UtmParams {
                utm_source: self.utm_source,
                utm_medium: self.utm_medium,
                utm_campaign: self.utm_campaign,
                utm_term: self.utm_term,
                utm_content: self.utm_content,
            },
            form_data: ExtensionMap::from_value(&self.form_data),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BookingRow {
    id: Uuid,
    booking_type: String,
    first_name: String,
    last_name: Option<String>,
    email: String,
    phone: Option<String>,
    listing_id: Option<Uuid>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    guests: Option<i32>,
    total_amount: Option<i64>,
    currency: String,
    payment_status: String,
    payment_method: Option<String>,
    payment_intent_id: Option<String>,
    special_requests: Option<String>,
    form_data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, StorageError> {
        Ok(Booking {
            id: self.id,
            booking_type: parse_enum(&self.booking_type, BookingType::parse, "booking type")?,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            listing_id: self.listing_id,
            start_date: self.start_date,
            end_date: self.end_date,
            guests: self.guests,
            total_amount: self.total_amount,
            currency: self.currency,
            payment_status: parse_enum(&self.payment_status, PaymentState::parse, "payment state")?,
            payment_method: self.payment_method,
            payment_intent_id: self.payment_intent_id,
            special_requests: self.special_requests,
            form_data: ExtensionMap::from_value(&self.form_data),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct GuideRow {
    id: Uuid,
    first_name: String,
    last_name: Option<String>,
    email: String,
    phone: Option<String>,
    guide_type: String,
    interest_areas: Vec<String>,
    submission_id: String,
    status: String,
    form_data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GuideRow {
    fn into_guide(self) -> Result<GuideSubmission, StorageError> {
        Ok(GuideSubmission {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            guide_type: self.guide_type,
            interest_areas: self.interest_areas,
            submission_id: self.submission_id,
            status: parse_enum(&self.status, GuideStatus::parse, "guide status")?,
            form_data: ExtensionMap::from_value(&self.form_data),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AdventureRow {
    id: Uuid,
    title: String,
    slug: String,
    description: Option<String>,
    category: Option<String>,
    duration_hours: Option<i32>,
    price: Option<i64>,
    currency: String,
    location: Option<String>,
    max_guests: Option<i32>,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AdventureRow> for Adventure {
    fn from(row: AdventureRow) -> Self {
        Adventure {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            category: row.category,
            duration_hours: row.duration_hours,
            price: row.price,
            currency: row.currency,
            location: row.location,
            max_guests: row.max_guests,
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct VillaRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
    max_guests: Option<i32>,
    nightly_rate: Option<i64>,
    currency: String,
    location: Option<String>,
    amenities: Vec<String>,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VillaRow> for Villa {
    fn from(row: VillaRow) -> Self {
        Villa {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            max_guests: row.max_guests,
            nightly_rate: row.nightly_rate,
            currency: row.currency,
            location: row.location,
            amenities: row.amenities,
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct RestaurantRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    cuisine: Option<String>,
    price_range: Option<String>,
    location: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    image_url: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Restaurant {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            cuisine: row.cuisine,
            price_range: row.price_range,
            location: row.location,
            phone: row.phone,
            website: row.website,
            image_url: row.image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ImageRow {
    id: Uuid,
    file_name: String,
    url: String,
    alt_text: Option<String>,
    category: Option<String>,
    listing_type: Option<String>,
    listing_id: Option<Uuid>,
    sort_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ImageRow> for ImageAsset {
    fn from(row: ImageRow) -> Self {
        ImageAsset {
            id: row.id,
            file_name: row.file_name,
            url: row.url,
            alt_text: row.alt_text,
            category: row.category,
            listing_type: row.listing_type,
            listing_id: row.listing_id,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const LEAD_COLUMNS: &str = "id, first_name, last_name, email, phone, interest_type, source, \
     status, tags, utm_source, utm_medium, utm_campaign, utm_term, utm_content, form_data, \
     created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, booking_type, first_name, last_name, email, phone, \
     listing_id, start_date, end_date, guests, total_amount, currency, payment_status, \
     payment_method, payment_intent_id, special_requests, form_data, created_at, updated_at";

const GUIDE_COLUMNS: &str = "id, first_name, last_name, email, phone, guide_type, \
     interest_areas, submission_id, status, form_data, created_at, updated_at";

const ADVENTURE_COLUMNS: &str = "id, title, slug, description, category, duration_hours, \
     price, currency, location, max_guests, image_url, is_active, created_at, updated_at";

const VILLA_COLUMNS: &str = "id, name, slug, description, bedrooms, bathrooms, max_guests, \
     nightly_rate, currency, location, amenities, image_url, is_active, created_at, updated_at";

const RESTAURANT_COLUMNS: &str = "id, name, slug, description, cuisine, price_range, \
     location, phone, website, image_url, is_active, created_at, updated_at";

const IMAGE_COLUMNS: &str = "id, file_name, url, alt_text, category, listing_type, \
     listing_id, sort_order, created_at, updated_at";

#[async_trait]
impl Storage for PgStorage {
    // ==================== Submissions ====================

    async fn create_lead(&self, new: &NewLead) -> Result<Lead, StorageError> {
        let sql = format!(
            "INSERT INTO leads (first_name, last_name, email, phone, interest_type, source, \
             tags, utm_source, utm_medium, utm_campaign, utm_term, utm_content, form_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {LEAD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(new.interest_type.as_str())
            .bind(&new.source)
            .bind(&new.tags)
            .bind(&new.utm.utm_source)
            .bind(&new.utm.utm_medium)
            .bind(&new.utm.utm_campaign)
            .bind(&new.utm.utm_term)
            .bind(&new.utm.utm_content)
            .bind(serde_json::to_value(&new.form_data)?)
            .fetch_one(&self.pool)
            .await?;
        row.into_lead()
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, StorageError> {
        let sql = format!("SELECT {LEAD_COLUMNS} FROM leads ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, LeadRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(LeadRow::into_lead).collect()
    }

    async fn leads_by_email(&self, email: &str) -> Result<Vec<Lead>, StorageError> {
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE LOWER(email) = LOWER($1) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, LeadRow>(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(LeadRow::into_lead).collect()
    }

    async fn create_booking(&self, new: &NewBooking) -> Result<Booking, StorageError> {
        let sql = format!(
            "INSERT INTO bookings (booking_type, first_name, last_name, email, phone, \
             listing_id, start_date, end_date, guests, total_amount, currency, \
             payment_method, payment_intent_id, special_requests, form_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(new.booking_type.as_str())
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(new.listing_id)
            .bind(new.start_date)
            .bind(new.end_date)
            .bind(new.guests)
            .bind(new.total_amount)
            .bind(&new.currency)
            .bind(&new.payment_method)
            .bind(&new.payment_intent_id)
            .bind(&new.special_requests)
            .bind(serde_json::to_value(&new.form_data)?)
            .fetch_one(&self.pool)
            .await?;
        row.into_booking()
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StorageError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(BookingRow::into_booking).transpose()
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StorageError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, StorageError> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE LOWER(email) = LOWER($1) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn update_booking(
        &self,
        id: Uuid,
        update: &BookingUpdate,
    ) -> Result<Option<Booking>, StorageError> {
        let sql = format!(
            "UPDATE bookings SET \
             start_date = COALESCE($2, start_date), \
             end_date = COALESCE($3, end_date), \
             guests = COALESCE($4, guests), \
             total_amount = COALESCE($5, total_amount), \
             payment_status = COALESCE($6, payment_status), \
             payment_method = COALESCE($7, payment_method), \
             special_requests = COALESCE($8, special_requests), \
             updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .bind(update.start_date)
            .bind(update.end_date)
            .bind(update.guests)
            .bind(update.total_amount)
            .bind(update.payment_status.map(|s| s.as_str()))
            .bind(&update.payment_method)
            .bind(&update.special_requests)
            .fetch_optional(&self.pool)
            .await?;
        row.map(BookingRow::into_booking).transpose()
    }

    async fn update_booking_payment_status(
        &self,
        payment_intent_id: &str,
        status: PaymentState,
    ) -> Result<Option<Booking>, StorageError> {
        let sql = format!(
            "UPDATE bookings SET payment_status = $2, updated_at = NOW() \
             WHERE payment_intent_id = $1 \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(payment_intent_id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(BookingRow::into_booking).transpose()
    }

    async fn create_guide_submission(
        &self,
        new: &NewGuideSubmission,
    ) -> Result<GuideSubmission, StorageError> {
        let submission_id = new
            .submission_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let sql = format!(
            "INSERT INTO guide_submissions (first_name, last_name, email, phone, guide_type, \
             interest_areas, submission_id, form_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {GUIDE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, GuideRow>(&sql)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.guide_type)
            .bind(&new.interest_areas)
            .bind(submission_id)
            .bind(serde_json::to_value(&new.form_data)?)
            .fetch_one(&self.pool)
            .await?;
        row.into_guide()
    }

    async fn list_guide_submissions(&self) -> Result<Vec<GuideSubmission>, StorageError> {
        let sql = format!("SELECT {GUIDE_COLUMNS} FROM guide_submissions ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, GuideRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(GuideRow::into_guide).collect()
    }

    async fn update_guide_status(&self, id: Uuid, status: GuideStatus) -> Result<(), StorageError> {
        sqlx::query("UPDATE guide_submissions SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ==================== Catalog ====================

    async fn create_adventure(&self, new: &NewAdventure) -> Result<Adventure, StorageError> {
        let sql = format!(
            "INSERT INTO adventures (title, slug, description, category, duration_hours, \
             price, currency, location, max_guests, image_url, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ADVENTURE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AdventureRow>(&sql)
            .bind(&new.title)
            .bind(&new.slug)
            .bind(&new.description)
            .bind(&new.category)
            .bind(new.duration_hours)
            .bind(new.price)
            .bind(&new.currency)
            .bind(&new.location)
            .bind(new.max_guests)
            .bind(&new.image_url)
            .bind(new.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_adventure(&self, id: Uuid) -> Result<Option<Adventure>, StorageError> {
        let sql = format!("SELECT {ADVENTURE_COLUMNS} FROM adventures WHERE id = $1");
        let row = sqlx::query_as::<_, AdventureRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Adventure::from))
    }

    async fn list_adventures(&self) -> Result<Vec<Adventure>, StorageError> {
        let sql = format!("SELECT {ADVENTURE_COLUMNS} FROM adventures ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, AdventureRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Adventure::from).collect())
    }

    async fn update_adventure(
        &self,
        id: Uuid,
        new: &NewAdventure,
    ) -> Result<Option<Adventure>, StorageError> {
        let sql = format!(
            "UPDATE adventures SET title = $2, slug = $3, description = $4, category = $5, \
             duration_hours = $6, price = $7, currency = $8, location = $9, max_guests = $10, \
             image_url = $11, is_active = $12, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ADVENTURE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AdventureRow>(&sql)
            .bind(id)
            .bind(&new.title)
            .bind(&new.slug)
            .bind(&new.description)
            .bind(&new.category)
            .bind(new.duration_hours)
            .bind(new.price)
            .bind(&new.currency)
            .bind(&new.location)
            .bind(new.max_guests)
            .bind(&new.image_url)
            .bind(new.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Adventure::from))
    }

    async fn delete_adventure(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM adventures WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_villa(&self, new: &NewVilla) -> Result<Villa, StorageError> {
        let sql = format!(
            "INSERT INTO villas (name, slug, description, bedrooms, bathrooms, max_guests, \
             nightly_rate, currency, location, amenities, image_url, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {VILLA_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VillaRow>(&sql)
            .bind(&new.name)
            .bind(&new.slug)
            .bind(&new.description)
            .bind(new.bedrooms)
            .bind(new.bathrooms)
            .bind(new.max_guests)
            .bind(new.nightly_rate)
            .bind(&new.currency)
            .bind(&new.location)
            .bind(&new.amenities)
            .bind(&new.image_url)
            .bind(new.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_villa(&self, id: Uuid) -> Result<Option<Villa>, StorageError> {
        let sql = format!("SELECT {VILLA_COLUMNS} FROM villas WHERE id = $1");
        let row = sqlx::query_as::<_, VillaRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Villa::from))
    }

    async fn list_villas(&self) -> Result<Vec<Villa>, StorageError> {
        let sql = format!("SELECT {VILLA_COLUMNS} FROM villas ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, VillaRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Villa::from).collect())
    }

    async fn update_villa(&self, id: Uuid, new: &NewVilla) -> Result<Option<Villa>, StorageError> {
        let sql = format!(
            "UPDATE villas SET name = $2, slug = $3, description = $4, bedrooms = $5, \
             bathrooms = $6, max_guests = $7, nightly_rate = $8, currency = $9, location = $10, \
             amenities = $11, image_url = $12, is_active = $13, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {VILLA_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VillaRow>(&sql)
            .bind(id)
            .bind(&new.name)
            .bind(&new.slug)
            .bind(&new.description)
            .bind(new.bedrooms)
            .bind(new.bathrooms)
            .bind(new.max_guests)
            .bind(new.nightly_rate)
            .bind(&new.currency)
            .bind(&new.location)
            .bind(&new.amenities)
            .bind(&new.image_url)
            .bind(new.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Villa::from))
    }

    async fn delete_villa(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM villas WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_restaurant(&self, new: &NewRestaurant) -> Result<Restaurant, StorageError> {
        let sql = format!(
            "INSERT INTO restaurants (name, slug, description, cuisine, price_range, \
             location, phone, website, image_url, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {RESTAURANT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RestaurantRow>(&sql)
            .bind(&new.name)
            .bind(&new.slug)
            .bind(&new.description)
            .bind(&new.cuisine)
            .bind(&new.price_range)
            .bind(&new.location)
            .bind(&new.phone)
            .bind(&new.website)
            .bind(&new.image_url)
            .bind(new.is_active)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StorageError> {
        let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1");
        let row = sqlx::query_as::<_, RestaurantRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Restaurant::from))
    }

    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, StorageError> {
        let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants ORDER BY created_at DESC");
        let rows = sqlx::query_as::<_, RestaurantRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Restaurant::from).collect())
    }

    async fn update_restaurant(
        &self,
        id: Uuid,
        new: &NewRestaurant,
    ) -> Result<Option<Restaurant>, StorageError> {
        let sql = format!(
            "UPDATE restaurants SET name = $2, slug = $3, description = $4, cuisine = $5, \
             price_range = $6, location = $7, phone = $8, website = $9, image_url = $10, \
             is_active = $11, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {RESTAURANT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RestaurantRow>(&sql)
            .bind(id)
            .bind(&new.name)
            .bind(&new.slug)
            .bind(&new.description)
            .bind(&new.cuisine)
            .bind(&new.price_range)
            .bind(&new.location)
            .bind(&new.phone)
            .bind(&new.website)
            .bind(&new.image_url)
            .bind(new.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Restaurant::from))
    }

    async fn delete_restaurant(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Media ====================

    async fn create_image(&self, new: &NewImageAsset) -> Result<ImageAsset, StorageError> {
        let sql = format!(
            "INSERT INTO images (file_name, url, alt_text, category, listing_type, \
             listing_id, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {IMAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(&new.file_name)
            .bind(&new.url)
            .bind(&new.alt_text)
            .bind(&new.category)
            .bind(&new.listing_type)
            .bind(new.listing_id)
            .bind(new.sort_order)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageAsset>, StorageError> {
        let sql = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1");
        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ImageAsset::from))
    }

    async fn list_images(&self) -> Result<Vec<ImageAsset>, StorageError> {
        let sql = format!(
            "SELECT {IMAGE_COLUMNS} FROM images ORDER BY sort_order ASC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, ImageRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ImageAsset::from).collect())
    }

    async fn update_image(
        &self,
        id: Uuid,
        new: &NewImageAsset,
    ) -> Result<Option<ImageAsset>, StorageError> {
        let sql = format!(
            "UPDATE images SET file_name = $2, url = $3, alt_text = $4, category = $5, \
             listing_type = $6, listing_id = $7, sort_order = $8, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {IMAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(id)
            .bind(&new.file_name)
            .bind(&new.url)
            .bind(&new.alt_text)
            .bind(&new.category)
            .bind(&new.listing_type)
            .bind(new.listing_id)
            .bind(new.sort_order)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ImageAsset::from))
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

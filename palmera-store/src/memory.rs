use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use palmera_core::catalog::{
    Adventure, ImageAsset, NewAdventure, NewImageAsset, NewRestaurant, NewVilla, Restaurant, Villa,
};
use palmera_core::repository::{Storage, StorageError};
use palmera_core::submission::{
    Booking, BookingUpdate, GuideStatus, GuideSubmission, Lead, LeadStatus, NewBooking,
    NewGuideSubmission, NewLead, PaymentState,
};

#[derive(Default)]
struct MemInner {
    leads: Vec<Lead>,
    bookings: Vec<Booking>,
    guides: Vec<GuideSubmission>,
    adventures: Vec<Adventure>,
    villas: Vec<Villa>,
    restaurants: Vec<Restaurant>,
    images: Vec<ImageAsset>,
}

/// In-memory implementation of [`Storage`] for development and tests.
/// Same visible behavior as the database backends: generated ids,
/// server-assigned timestamps, newest-first listings.
#[derive(Default)]
pub struct MemStorage {
    inner: RwLock<MemInner>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row count across the three submission tables; handy for tests
    /// asserting that a failed validation wrote nothing.
    pub async fn submission_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.leads.len() + inner.bookings.len() + inner.guides.len()
    }

    fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
        let mut out = items.to_vec();
        out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
        out
    }
}

#[async_trait]
impl Storage for MemStorage {
    // ==================== Submissions ====================

    async fn create_lead(&self, new: &NewLead) -> Result<Lead, StorageError> {
        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            interest_type: new.interest_type,
            source: new.source.clone(),
            status: LeadStatus::New,
            tags: new.tags.clone(),
            utm: new.utm.clone(),
            form_data: new.form_data.clone(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.leads.push(lead.clone());
        Ok(lead)
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, StorageError> {
        let inner = self.inner.read().await;
        Ok(Self::newest_first(&inner.leads, |l| l.created_at))
    }

    async fn leads_by_email(&self, email: &str) -> Result<Vec<Lead>, StorageError> {
        let inner = self.inner.read().await;
        let matching: Vec<Lead> = inner
            .leads
            .iter()
            .filter(|l| l.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect();
        Ok(Self::newest_first(&matching, |l| l.created_at))
    }

    async fn create_booking(&self, new: &NewBooking) -> Result<Booking, StorageError> {
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            booking_type: new.booking_type,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            listing_id: new.listing_id,
            start_date: new.start_date,
            end_date: new.end_date,
            guests: new.guests,
            total_amount: new.total_amount,
            currency: new.currency.clone(),
            payment_status: PaymentState::Pending,
            payment_method: new.payment_method.clone(),
            payment_intent_id: new.payment_intent_id.clone(),
            special_requests: new.special_requests.clone(),
            form_data: new.form_data.clone(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StorageError> {
        let inner = self.inner.read().await;
        Ok(Self::newest_first(&inner.bookings, |b| b.created_at))
    }

    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, StorageError> {
        let inner = self.inner.read().await;
        let matching: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| b.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect();
        Ok(Self::newest_first(&matching, |b| b.created_at))
    }

    async fn update_booking(
        &self,
        id: Uuid,
        update: &BookingUpdate,
    ) -> Result<Option<Booking>, StorageError> {
        let mut inner = self.inner.write().await;
        let Some(booking) = inner.bookings.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(date) = update.start_date {
            booking.start_date = Some(date);
        }
        if let Some(date) = update.end_date {
            booking.end_date = Some(date);
        }
        if let Some(guests) = update.guests {
            booking.guests = Some(guests);
        }
        if let Some(total) = update.total_amount {
            booking.total_amount = Some(total);
        }
        if let Some(status) = update.payment_status {
            booking.payment_status = status;
        }
        if let Some(method) = &update.payment_method {
            booking.payment_method = Some(method.clone());
        }
        if let Some(requests) = &update.special_requests {
            booking.special_requests = Some(requests.clone());
        }
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn update_booking_payment_status(
        &self,
        payment_intent_id: &str,
        status: PaymentState,
    ) -> Result<Option<Booking>, StorageError> {
        let mut inner = self.inner.write().await;
        let Some(booking) = inner
            .bookings
            .iter_mut()
            .find(|b| b.payment_intent_id.as_deref() == Some(payment_intent_id))
        else {
            return Ok(None);
        };
        booking.payment_status = status;
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn create_guide_submission(
        &self,
        new: &NewGuideSubmission,
    ) -> Result<GuideSubmission, StorageError> {
        let now = Utc::now();
        let guide = GuideSubmission {
            id: Uuid::new_v4(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            guide_type: new.guide_type.clone(),
            interest_areas: new.interest_areas.clone(),
            submission_id: new
                .submission_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            status: GuideStatus::Pending,
            form_data: new.form_data.clone(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.guides.push(guide.clone());
        Ok(guide)
    }

    async fn list_guide_submissions(&self) -> Result<Vec<GuideSubmission>, StorageError> {
        let inner = self.inner.read().await;
        Ok(Self::newest_first(&inner.guides, |g| g.created_at))
    }

    async fn update_guide_status(&self, id: Uuid, status: GuideStatus) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if let Some(guide) = inner.guides.iter_mut().find(|g| g.id == id) {
            guide.status = status;
            guide.updated_at = Utc::now();
        }
        Ok(())
    }

    // ==================== Catalog ====================

    async fn create_adventure(&self, new: &NewAdventure) -> Result<Adventure, StorageError> {
        let now = Utc::now();
        let adventure = Adventure {
            id: Uuid::new_v4(),
            title: new.title.clone(),
            slug: new.slug.clone(),
            description: new.description.clone(),
            category: new.category.clone(),
            duration_hours: new.duration_hours,
            price: new.price,
            currency: new.currency.clone(),
            location: new.location.clone(),
            max_guests: new.max_guests,
            image_url: new.image_url.clone(),
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.adventures.push(adventure.clone());
        Ok(adventure)
    }

    async fn get_adventure(&self, id: Uuid) -> Result<Option<Adventure>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.adventures.iter().find(|a| a.id == id).cloned())
    }

    async fn list_adventures(&self) -> Result<Vec<Adventure>, StorageError> {
        let inner = self.inner.read().await;
        Ok(Self::newest_first(&inner.adventures, |a| a.created_at))
    }

    async fn update_adventure(
        &self,
        id: Uuid,
        new: &NewAdventure,
    ) -> Result<Option<Adventure>, StorageError> {
        let mut inner = self.inner.write().await;
        let Some(adventure) = inner.adventures.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        adventure.title = new.title.clone();
        adventure.slug = new.slug.clone();
        adventure.description = new.description.clone();
        adventure.category = new.category.clone();
        adventure.duration_hours = new.duration_hours;
        adventure.price = new.price;
        adventure.currency = new.currency.clone();
        adventure.location = new.location.clone();
        adventure.max_guests = new.max_guests;
        adventure.image_url = new.image_url.clone();
        adventure.is_active = new.is_active;
        adventure.updated_at = Utc::now();
        Ok(Some(adventure.clone()))
    }

    async fn delete_adventure(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        let before = inner.adventures.len();
        inner.adventures.retain(|a| a.id != id);
        Ok(inner.adventures.len() < before)
    }

    async fn create_villa(&self, new: &NewVilla) -> Result<Villa, StorageError> {
        let now = Utc::now();
        let villa = Villa {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            slug: new.slug.clone(),
            description: new.description.clone(),
            bedrooms: new.bedrooms,
            bathrooms: new.bathrooms,
            max_guests: new.max_guests,
            nightly_rate: new.nightly_rate,
            currency: new.currency.clone(),
            location: new.location.clone(),
            amenities: new.amenities.clone(),
            image_url: new.image_url.clone(),
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.villas.push(villa.clone());
        Ok(villa)
    }

    async fn get_villa(&self, id: Uuid) -> Result<Option<Villa>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.villas.iter().find(|v| v.id == id).cloned())
    }

    async fn list_villas(&self) -> Result<Vec<Villa>, StorageError> {
        let inner = self.inner.read().await;
        Ok(Self::newest_first(&inner.villas, |v| v.created_at))
    }

    async fn update_villa(&self, id: Uuid, new: &NewVilla) -> Result<Option<Villa>, StorageError> {
        let mut inner = self.inner.write().await;
        let Some(villa) = inner.villas.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        villa.name = new.name.clone();
        villa.slug = new.slug.clone();
        villa.description = new.description.clone();
        villa.bedrooms = new.bedrooms;
        villa.bathrooms = new.bathrooms;
        villa.max_guests = new.max_guests;
        villa.nightly_rate = new.nightly_rate;
        villa.currency = new.currency.clone();
        villa.location = new.location.clone();
        villa.amenities = new.amenities.clone();
        villa.image_url = new.image_url.clone();
        villa.is_active = new.is_active;
        villa.updated_at = Utc::now();
        Ok(Some(villa.clone()))
    }

    async fn delete_villa(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        let before = inner.villas.len();
        inner.villas.retain(|v| v.id != id);
        Ok(inner.villas.len() < before)
    }

    async fn create_restaurant(&self, new: &NewRestaurant) -> Result<Restaurant, StorageError> {
        let now = Utc::now();
        let restaurant = Restaurant {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            slug: new.slug.clone(),
            description: new.description.clone(),
            cuisine: new.cuisine.clone(),
            price_range: new.price_range.clone(),
            location: new.location.clone(),
            phone: new.phone.clone(),
            website: new.website.clone(),
            image_url: new.image_url.clone(),
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.restaurants.push(restaurant.clone());
        Ok(restaurant)
    }

    async fn get_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.restaurants.iter().find(|r| r.id == id).cloned())
    }

    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, StorageError> {
        let inner = self.inner.read().await;
        Ok(Self::newest_first(&inner.restaurants, |r| r.created_at))
    }

    async fn update_restaurant(
        &self,
        id: Uuid,
        new: &NewRestaurant,
    ) -> Result<Option<Restaurant>, StorageError> {
        let mut inner = self.inner.write().await;
        let Some(restaurant) = inner.restaurants.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        restaurant.name = new.name.clone();
        restaurant.slug = new.slug.clone();
        restaurant.description = new.description.clone();
        restaurant.cuisine = new.cuisine.clone();
        restaurant.price_range = new.price_range.clone();
        restaurant.location = new.location.clone();
        restaurant.phone = new.phone.clone();
        restaurant.website = new.website.clone();
        restaurant.image_url = new.image_url.clone();
        restaurant.is_active = new.is_active;
        restaurant.updated_at = Utc::now();
        Ok(Some(restaurant.clone()))
    }

    async fn delete_restaurant(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        let before = inner.restaurants.len();
        inner.restaurants.retain(|r| r.id != id);
        Ok(inner.restaurants.len() < before)
    }

    // ==================== Media ====================

    async fn create_image(&self, new: &NewImageAsset) -> Result<ImageAsset, StorageError> {
        let now = Utc::now();
        let image = ImageAsset {
            id: Uuid::new_v4(),
            file_name: new.file_name.clone(),
            url: new.url.clone(),
            alt_text: new.alt_text.clone(),
            category: new.category.clone(),
            listing_type: new.listing_type.clone(),
            listing_id: new.listing_id,
            sort_order: new.sort_order,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.images.push(image.clone());
        Ok(image)
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageAsset>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.images.iter().find(|i| i.id == id).cloned())
    }

    async fn list_images(&self) -> Result<Vec<ImageAsset>, StorageError> {
        let inner = self.inner.read().await;
        let mut out = inner.images.clone();
        out.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(out)
    }

    async fn update_image(
        &self,
        id: Uuid,
        new: &NewImageAsset,
    ) -> Result<Option<ImageAsset>, StorageError> {
        let mut inner = self.inner.write().await;
        let Some(image) = inner.images.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        image.file_name = new.file_name.clone();
        image.url = new.url.clone();
        image.alt_text = new.alt_text.clone();
        image.category = new.category.clone();
        image.listing_type = new.listing_type.clone();
        image.listing_id = new.listing_id;
        image.sort_order = new.sort_order;
        image.updated_at = Utc::now();
        Ok(Some(image.clone()))
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        let before = inner.images.len();
        inner.images.retain(|i| i.id != id);
        Ok(inner.images.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palmera_core::extension::ExtensionMap;
    use palmera_core::submission::{BookingType, InterestType, UtmParams};

    fn new_lead(email: &str) -> NewLead {
        NewLead {
            first_name: "Ana".into(),
            last_name: None,
            email: email.into(),
            phone: None,
            interest_type: InterestType::Villa,
            source: None,
            tags: Vec::new(),
            utm: UtmParams::default(),
            form_data: ExtensionMap::new(),
        }
    }

    fn new_booking(intent: Option<&str>) -> NewBooking {
        NewBooking {
            booking_type: BookingType::Villa,
            first_name: "Maya".into(),
            last_name: None,
            email: "maya@example.com".into(),
            phone: None,
            listing_id: None,
            start_date: None,
            end_date: None,
            guests: Some(2),
            total_amount: Some(4500),
            currency: "USD".into(),
            payment_method: None,
            payment_intent_id: intent.map(str::to_string),
            special_requests: None,
            form_data: ExtensionMap::new(),
        }
    }

    #[tokio::test]
    async fn test_create_lead_assigns_id_and_timestamps() {
        let store = MemStorage::new();
        let lead = store.create_lead(&new_lead("ana@example.com")).await.unwrap();
        assert!(!lead.id.is_nil());
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.created_at, lead.updated_at);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let store = MemStorage::new();
        store.create_lead(&new_lead("Ana@Example.com")).await.unwrap();
        let found = store.leads_by_email("ana@example.com").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_payment_status_update_by_intent_id() {
        let store = MemStorage::new();
        store.create_booking(&new_booking(Some("pi_123"))).await.unwrap();
        let updated = store
            .update_booking_payment_status("pi_123", PaymentState::Confirmed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.payment_status, PaymentState::Confirmed);

        let missing = store
            .update_booking_payment_status("pi_unknown", PaymentState::Confirmed)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_guide_submission_id_generated_when_absent() {
        let store = MemStorage::new();
        let new = NewGuideSubmission {
            first_name: "Leo".into(),
            last_name: None,
            email: "leo@example.com".into(),
            phone: None,
            guide_type: "adventure".into(),
            interest_areas: Vec::new(),
            submission_id: None,
            form_data: ExtensionMap::new(),
        };
        let guide = store.create_guide_submission(&new).await.unwrap();
        assert!(!guide.submission_id.is_empty());
        assert_eq!(guide.status, GuideStatus::Pending);
    }

    #[tokio::test]
    async fn test_booking_partial_update_keeps_other_fields() {
        let store = MemStorage::new();
        let booking = store.create_booking(&new_booking(None)).await.unwrap();
        let updated = store
            .update_booking(
                booking.id,
                &BookingUpdate {
                    guests: Some(4),
                    ..BookingUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.guests, Some(4));
        assert_eq!(updated.total_amount, Some(4500));
    }

    #[tokio::test]
    async fn test_catalog_delete_reports_missing_rows() {
        let store = MemStorage::new();
        let villa = store
            .create_villa(&NewVilla {
                name: "Casa Palmera".into(),
                slug: "casa-palmera".into(),
                description: None,
                bedrooms: Some(4),
                bathrooms: Some(3),
                max_guests: Some(8),
                nightly_rate: Some(950),
                currency: "USD".into(),
                location: None,
                amenities: vec!["pool".into()],
                image_url: None,
                is_active: true,
            })
            .await
            .unwrap();
        assert!(store.delete_villa(villa.id).await.unwrap());
        assert!(!store.delete_villa(villa.id).await.unwrap());
    }
}

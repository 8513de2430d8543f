use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{
    Adventure, ImageAsset, NewAdventure, NewImageAsset, NewRestaurant, NewVilla, Restaurant, Villa,
};
use crate::submission::{
    Booking, BookingUpdate, GuideStatus, GuideSubmission, Lead, NewBooking, NewGuideSubmission,
    NewLead, PaymentState,
};

pub type StorageError = Box<dyn std::error::Error + Send + Sync>;

/// Primary-store access for every persisted entity.
///
/// One backend is selected from configuration at startup (postgres,
/// supabase or memory); business logic only ever sees this trait.
/// Create methods perform a single insert and hand back the stored row
/// with its generated id and server-assigned timestamps.
#[async_trait]
pub trait Storage: Send + Sync {
    // ==================== Submissions ====================

    async fn create_lead(&self, new: &NewLead) -> Result<Lead, StorageError>;

    async fn list_leads(&self) -> Result<Vec<Lead>, StorageError>;

    async fn leads_by_email(&self, email: &str) -> Result<Vec<Lead>, StorageError>;

    async fn create_booking(&self, new: &NewBooking) -> Result<Booking, StorageError>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, StorageError>;

    async fn list_bookings(&self) -> Result<Vec<Booking>, StorageError>;

    async fn bookings_by_email(&self, email: &str) -> Result<Vec<Booking>, StorageError>;

    async fn update_booking(
        &self,
        id: Uuid,
        update: &BookingUpdate,
    ) -> Result<Option<Booking>, StorageError>;

    /// Payment-intent id is the only lookup key the gateway webhook has.
    async fn update_booking_payment_status(
        &self,
        payment_intent_id: &str,
        status: PaymentState,
    ) -> Result<Option<Booking>, StorageError>;

    async fn create_guide_submission(
        &self,
        new: &NewGuideSubmission,
    ) -> Result<GuideSubmission, StorageError>;

    async fn list_guide_submissions(&self) -> Result<Vec<GuideSubmission>, StorageError>;

    async fn update_guide_status(
        &self,
        id: Uuid,
        status: GuideStatus,
    ) -> Result<(), StorageError>;

    // ==================== Catalog ====================

    async fn create_adventure(&self, new: &NewAdventure) -> Result<Adventure, StorageError>;

    async fn get_adventure(&self, id: Uuid) -> Result<Option<Adventure>, StorageError>;

    async fn list_adventures(&self) -> Result<Vec<Adventure>, StorageError>;

    async fn update_adventure(
        &self,
        id: Uuid,
        new: &NewAdventure,
    ) -> Result<Option<Adventure>, StorageError>;

    async fn delete_adventure(&self, id: Uuid) -> Result<bool, StorageError>;

    async fn create_villa(&self, new: &NewVilla) -> Result<Villa, StorageError>;

    async fn get_villa(&self, id: Uuid) -> Result<Option<Villa>, StorageError>;

    async fn list_villas(&self) -> Result<Vec<Villa>, StorageError>;

    async fn update_villa(&self, id: Uuid, new: &NewVilla) -> Result<Option<Villa>, StorageError>;

    async fn delete_villa(&self, id: Uuid) -> Result<bool, StorageError>;

    async fn create_restaurant(&self, new: &NewRestaurant) -> Result<Restaurant, StorageError>;

    async fn get_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, StorageError>;

    async fn list_restaurants(&self) -> Result<Vec<Restaurant>, StorageError>;

    async fn update_restaurant(
        &self,
        id: Uuid,
        new: &NewRestaurant,
    ) -> Result<Option<Restaurant>, StorageError>;

    async fn delete_restaurant(&self, id: Uuid) -> Result<bool, StorageError>;

    // ==================== Media ====================

    async fn create_image(&self, new: &NewImageAsset) -> Result<ImageAsset, StorageError>;

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageAsset>, StorageError>;

    async fn list_images(&self) -> Result<Vec<ImageAsset>, StorageError>;

    async fn update_image(
        &self,
        id: Uuid,
        new: &NewImageAsset,
    ) -> Result<Option<ImageAsset>, StorageError>;

    async fn delete_image(&self, id: Uuid) -> Result<bool, StorageError>;
}

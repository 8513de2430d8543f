pub mod app_config;
pub mod database;
pub mod memory;
pub mod pg;
pub mod supabase;

pub use app_config::{Config, StorageBackend};
pub use database::DbClient;
pub use memory::MemStorage;
pub use pg::PgStorage;
pub use supabase::SupabaseStorage;

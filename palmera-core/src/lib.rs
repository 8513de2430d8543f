pub mod catalog;
pub mod extension;
pub mod payment;
pub mod projection;
pub mod repository;
pub mod submission;
pub mod validate;

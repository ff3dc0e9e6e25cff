//! `clinicstock-core`: shared building blocks for the inventory client.
//!
//! This crate contains **pure domain** primitives (no IO, no backend access).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ItemId, LocationId, VendorId};
pub use value_object::ValueObject;

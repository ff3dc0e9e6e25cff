//! `clinicstock-client`: reconciliation core and headless views.
//!
//! **Responsibility:** everything the inventory pages do, minus rendering.
//!
//! - [`Reconciler`]: re-read, compute delta, dispatch one procedure, refresh.
//! - [`views`]: per-page state holders (listing, detail, cycle count,
//!   history) built on a shared [`Reconciler`].
//! - [`filters`]: query builders shared by the views.
//!
//! The backend stays the authority: local state is a snapshot plus pending
//! intents, and every write goes through the gateway.

pub mod error;
pub mod filters;
pub mod reconcile;
pub mod views;

pub use error::ClientError;
pub use reconcile::{BatchReport, FailedItem, Reconciled, Reconciler};
pub use views::{CycleCount, FilterOptions, ItemDetail, ItemListing, TransactionHistory};

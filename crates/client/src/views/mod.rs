//! Headless page state.
//!
//! Each view owns a snapshot of what its page shows plus any pending user
//! intents. Reads go straight to the gateway; every quantity write goes
//! through the shared [`Reconciler`](crate::Reconciler). On error the intent
//! is left untouched so the caller can retry.

mod counts;
mod detail;
mod history;
mod listing;
mod options;

pub use counts::CycleCount;
pub use detail::{HISTORY_LIMIT, ItemDetail};
pub use history::{PAGE_LIMIT as HISTORY_PAGE_LIMIT, TransactionHistory};
pub use listing::{ItemListing, PAGE_SIZE};
pub use options::FilterOptions;

//! Inventory domain module.
//!
//! Business rules for the clinic inventory client, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no backend access). The backend
//! owns the authoritative quantities; everything here works on snapshots and
//! on the user's local intents.

pub mod count;
pub mod filter;
pub mod item;
pub mod lookup;
pub mod quantity;
pub mod reason;
pub mod transaction;

pub use count::{CountInput, CountSheet};
pub use filter::{ItemFilters, ItemSort, SortDir, SortKey};
pub use item::{InventoryItem, NamedRef};
pub use lookup::LookupOption;
pub use quantity::{Adjustment, AdjustmentIntent, Magnitude, Quantity};
pub use reason::ReasonCode;
pub use transaction::TransactionRecord;

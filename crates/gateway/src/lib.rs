//! Remote Data Gateway: the client's single point of access to the backend.
//!
//! Everything that talks to the hosted backend goes through a [`Gateway`]:
//! filtered row reads over named collections and the two quantity
//! procedures. The handle is constructed once and passed to whoever needs
//! it; there is no global client.
//!
//! - [`RestGateway`] speaks PostgREST over HTTP.
//! - [`InMemoryGateway`] is the test/dev double with the same procedure
//!   semantics.

pub mod config;
pub mod error;
pub mod in_memory;
pub mod procedure;
pub mod query;
pub mod rest;
pub mod session;
mod r#trait;

pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use in_memory::InMemoryGateway;
pub use procedure::{Procedure, ProcedureCall};
pub use query::{Filter, Order, RowQuery, collections};
pub use r#trait::{Gateway, Page, RowSet, fetch_one, fetch_rows};
pub use rest::RestGateway;
pub use session::Session;

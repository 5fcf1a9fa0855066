//! titanhelp-core: Core library for the titanhelp ticket tracker
//!
//! Provides the ticket model, field validation and the SQLite-backed
//! [`TicketStore`]. Front ends (CLI, REST API) only call into the store
//! and map its errors to their own responses.

pub mod config;
pub mod error;
pub mod query;
pub mod schema;
pub mod store;
pub mod ticket;

pub use config::{Config, DatabaseConfig, JournalMode, SyncMode};
pub use error::{Error, ValidationError};
pub use query::{ListFilter, SortDirection, SortField, SortSpec, DEFAULT_LIMIT};
pub use store::TicketStore;
pub use ticket::{Priority, Status, Ticket, TicketUpdate, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};

/// Result type for titanhelp operations
pub type Result<T> = std::result::Result<T, Error>;

//! OrderDesk Server
//!
//! HTTP service for creating, updating and listing purchase orders, with
//! order totals converted into the display currency on retrieval.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod sqlite;
pub mod state;
pub mod store;

pub use api::{app_router, router, OrderResponse};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use extract::{AppJson, AppPath, AppQuery};
pub use sqlite::SqliteOrderStore;
pub use state::{build_state, AppState};
pub use store::{InMemoryOrderStore, OrderStore};

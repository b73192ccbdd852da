//! # aliados-gateway: Remote Services for the Aliados Merchant Portal
//!
//! ## Modules
//! - [`api`] - The `Gateway` trait (offers, redemption, registration)
//! - [`http`] - `HttpGateway`, the reqwest implementation
//! - [`config`] - `AppConfig` from TOML and `ALIADOS_*` variables
//! - [`session`] - Stored business id (`SessionStore`)
//! - [`error`] - `GatewayError`

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod session;

pub use api::Gateway;
pub use config::{AppConfig, GatewaySettings, ScannerSettings, SessionSettings};
pub use error::{GatewayError, GatewayResult};
pub use http::HttpGateway;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};

//! HTTP API handlers

pub mod admin;
pub mod auth;
pub mod entries;
pub mod health;
pub mod intake;
pub mod submit;

pub use admin::admin_routes;
pub use auth::{admin_guard, Submitter, ADMIN_TOKEN_HEADER, USER_ID_HEADER};
pub use entries::entry_routes;
pub use health::health_routes;
pub use submit::submit_routes;

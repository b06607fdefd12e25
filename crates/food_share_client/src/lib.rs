//! crates/food_share_client/src/lib.rs
//!
//! The data layer of the FoodShare app: HTTP adapters for every port and the
//! `FoodShareApp` context the screens drive.

pub mod app;
pub mod config;
pub mod error;
pub mod http;

pub use app::{FoodShareApp, Photo};
pub use config::ClientConfig;
pub use error::{AppError, ClientError};
pub use http::HttpBackend;

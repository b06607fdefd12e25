//! services/api/src/lib.rs
//!
//! The FoodShare backend: accounts, profiles, donations and photo storage
//! behind a JSON API.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;

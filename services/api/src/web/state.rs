//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use food_share_core::ports::{AccountStore, DonationStore, MediaStore, ProfileStore};
use food_share_core::DonationLifecycle;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub donations: DonationLifecycle,
    pub media: Arc<dyn MediaStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        accounts: Arc<dyn AccountStore>,
        profiles: Arc<dyn ProfileStore>,
        donations: Arc<dyn DonationStore>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            accounts,
            profiles,
            donations: DonationLifecycle::new(donations),
            media,
            config,
        }
    }
}

//! crates/food_share_core/src/session.rs
//!
//! Holds the current identity and its resolved role, and keeps them in step
//! with the auth gateway's identity-change notifications.

use std::sync::Arc;

use futures::StreamExt;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::access::Actor;
use crate::domain::{Identity, Role, Session};
use crate::ports::{AuthGateway, ProfileStore};

/// Builds the session for `identity` by looking up its profile.
///
/// A failed lookup still yields a session, with no role.
pub async fn resolve_session(profiles: &dyn ProfileStore, identity: Identity) -> Session {
    match profiles.get_profile(identity.user_id).await {
        Ok(profile) => Session {
            identity: Identity {
                display_name: Some(profile.display_name),
                ..identity
            },
            role: Some(profile.role),
        },
        Err(e) => {
            warn!(user_id = %identity.user_id, "Profile lookup failed, role unknown: {}", e);
            Session {
                identity,
                role: None,
            }
        }
    }
}

/// The single owner of the current session.
///
/// Writers are serialized: a profile lookup started by `sync` finishes and
/// publishes before any later `sync`, `establish` or `clear` takes effect.
pub struct SessionStore {
    profiles: Arc<dyn ProfileStore>,
    state: watch::Sender<Option<Session>>,
    writer: Mutex<()>,
}

impl SessionStore {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            profiles,
            state,
            writer: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// `None` when signed out or when the role could not be resolved.
    pub fn current_role(&self) -> Option<Role> {
        self.state.borrow().as_ref().and_then(|s| s.role)
    }

    pub fn actor(&self) -> Option<Actor> {
        self.state.borrow().as_ref().map(Actor::from)
    }

    /// A receiver that observes every session change.
    pub fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    /// Replaces the session for `identity`, or clears it when `None`.
    pub async fn sync(&self, identity: Option<Identity>) {
        let _writer = self.writer.lock().await;
        let next = match identity {
            Some(identity) => Some(resolve_session(self.profiles.as_ref(), identity).await),
            None => None,
        };
        self.state.send_replace(next);
    }

    /// Installs a session whose role is already known.
    pub async fn establish(&self, session: Session) {
        let _writer = self.writer.lock().await;
        self.state.send_replace(Some(session));
    }

    pub async fn clear(&self) {
        let _writer = self.writer.lock().await;
        self.state.send_replace(None);
    }

    /// Applies every identity change from `gateway`, one at a time, until
    /// the returned subscription is dropped by `unsubscribe`.
    pub fn subscribe(self: &Arc<Self>, gateway: &dyn AuthGateway) -> Subscription {
        let mut changes = gateway.identity_changes();
        let token = CancellationToken::new();
        let store = Arc::clone(self);
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    change = changes.next() => match change {
                        Some(identity) => {
                            tokio::select! {
                                _ = cancelled.cancelled() => break,
                                _ = store.sync(identity) => {}
                            }
                        }
                        None => break,
                    },
                }
            }
            info!("Identity subscription ended.");
        });

        Subscription { token, task }
    }
}

/// A live identity subscription. Consumed by `unsubscribe`.
pub struct Subscription {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stops delivering identity changes and waits for the worker to exit.
    pub async fn unsubscribe(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!("Identity subscription task failed: {}", e);
        }
    }
}

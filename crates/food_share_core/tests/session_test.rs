//! Integration tests for the session store and its identity subscription.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use food_share_core::memory::{InMemoryAuthGateway, InMemoryProfileStore};
use food_share_core::{
    AuthGateway, Identity, PortError, PortResult, ProfileStore, Role, Session, SessionStore,
    UserProfile,
};
use tokio::time::timeout;
use uuid::Uuid;

fn profile_for(identity: &Identity, role: Role, name: &str) -> UserProfile {
    UserProfile {
        user_id: identity.user_id,
        email: identity.email.clone().unwrap_or_default(),
        role,
        display_name: name.to_string(),
        created_at: Utc::now(),
        location: None,
    }
}

/// Waits until the store's session satisfies `check`.
async fn wait_for(store: &SessionStore, check: impl Fn(&Option<Session>) -> bool) {
    let mut rx = store.watch();
    timeout(Duration::from_secs(2), rx.wait_for(|s| check(s)))
        .await
        .expect("session did not reach the expected state in time")
        .expect("session channel closed");
}

#[tokio::test]
async fn sync_resolves_role_from_profile() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let store = SessionStore::new(profiles.clone());
    let identity = Identity {
        user_id: Uuid::new_v4(),
        email: Some("ngo@example.org".into()),
        display_name: None,
    };
    profiles
        .create_profile(profile_for(&identity, Role::Ngo, "Food Rescue"))
        .await
        .unwrap();

    store.sync(Some(identity.clone())).await;
    assert_eq!(store.current_role(), Some(Role::Ngo));
    let session = store.current().unwrap();
    assert_eq!(session.identity.display_name.as_deref(), Some("Food Rescue"));
    assert_eq!(store.actor().unwrap().user_id, identity.user_id);

    store.sync(None).await;
    assert_eq!(store.current_role(), None);
    assert!(store.current().is_none());
}

#[tokio::test]
async fn missing_profile_keeps_identity_without_role() {
    let store = SessionStore::new(Arc::new(InMemoryProfileStore::new()));
    let identity = Identity {
        user_id: Uuid::new_v4(),
        email: Some("someone@example.org".into()),
        display_name: Some("Someone".into()),
    };

    store.sync(Some(identity.clone())).await;
    let session = store.current().expect("identity must be kept");
    assert_eq!(session.identity, identity);
    assert_eq!(session.role, None);
    assert_eq!(store.current_role(), None);
}

struct UnreachableProfiles;

#[async_trait]
impl ProfileStore for UnreachableProfiles {
    async fn get_profile(&self, _user_id: Uuid) -> PortResult<UserProfile> {
        Err(PortError::Unexpected("offline".into()))
    }

    async fn create_profile(&self, _profile: UserProfile) -> PortResult<()> {
        Err(PortError::Unexpected("offline".into()))
    }
}

#[tokio::test]
async fn each_sync_overwrites_the_whole_session() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let store = SessionStore::new(profiles.clone());
    let donor = Identity {
        user_id: Uuid::new_v4(),
        email: Some("donor@example.org".into()),
        display_name: None,
    };
    profiles
        .create_profile(profile_for(&donor, Role::Donor, "Corner Bakery"))
        .await
        .unwrap();
    store.sync(Some(donor)).await;
    assert_eq!(store.current_role(), Some(Role::Donor));

    let stranger = Identity {
        user_id: Uuid::new_v4(),
        email: None,
        display_name: None,
    };
    store.sync(Some(stranger.clone())).await;
    assert_eq!(
        store.current(),
        Some(Session {
            identity: stranger,
            role: None
        })
    );

    let offline = SessionStore::new(Arc::new(UnreachableProfiles));
    offline
        .sync(Some(Identity {
            user_id: Uuid::new_v4(),
            email: None,
            display_name: None,
        }))
        .await;
    assert!(offline.current().is_some());
    assert_eq!(offline.current_role(), None);
}

#[tokio::test]
async fn subscription_follows_sign_in_and_sign_out() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let gateway = InMemoryAuthGateway::new();
    let store = Arc::new(SessionStore::new(profiles.clone()));

    let identity = gateway.sign_up("donor@example.org", "secret-pass").await.unwrap();
    profiles
        .create_profile(profile_for(&identity, Role::Donor, "Corner Bakery"))
        .await
        .unwrap();

    // The first delivery is the identity already signed in.
    let subscription = store.subscribe(&gateway);
    wait_for(&store, |s| {
        s.as_ref().is_some_and(|s| s.role == Some(Role::Donor))
    })
    .await;

    gateway.sign_out().await.unwrap();
    wait_for(&store, |s| s.is_none()).await;

    gateway.sign_in("donor@example.org", "secret-pass").await.unwrap();
    wait_for(&store, |s| {
        s.as_ref().is_some_and(|s| s.role == Some(Role::Donor))
    })
    .await;

    gateway.sign_out().await.unwrap();
    wait_for(&store, |s| s.is_none()).await;
    assert_eq!(store.current_role(), None);

    subscription.unsubscribe().await;
}

#[tokio::test]
async fn events_after_unsubscribe_are_ignored() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let gateway = InMemoryAuthGateway::new();
    let store = Arc::new(SessionStore::new(profiles.clone()));
    let subscription = store.subscribe(&gateway);

    let identity = gateway.sign_up("ngo@example.org", "secret-pass").await.unwrap();
    wait_for(&store, |s| s.is_some()).await;

    subscription.unsubscribe().await;
    gateway.sign_out().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let session = store.current().expect("session must survive after unsubscribe");
    assert_eq!(session.identity.user_id, identity.user_id);
}

#[tokio::test]
async fn identity_events_apply_in_order() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let gateway = InMemoryAuthGateway::new();
    let store = Arc::new(SessionStore::new(profiles.clone()));

    let identities: Vec<Identity> = (0..5)
        .map(|i| Identity {
            user_id: Uuid::new_v4(),
            email: Some(format!("user{i}@example.org")),
            display_name: None,
        })
        .collect();
    for (i, identity) in identities.iter().enumerate() {
        let role = if i % 2 == 0 { Role::Donor } else { Role::Ngo };
        profiles
            .create_profile(profile_for(identity, role, "User"))
            .await
            .unwrap();
    }

    let subscription = store.subscribe(&gateway);
    let mut rx = store.watch();
    for identity in &identities {
        gateway.emit(Some(identity.clone())).await;
    }

    let last = identities.last().unwrap().user_id;
    timeout(
        Duration::from_secs(2),
        rx.wait_for(|s| s.as_ref().is_some_and(|s| s.identity.user_id == last)),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(store.current_role(), Some(Role::Donor));

    subscription.unsubscribe().await;
}

#[tokio::test]
async fn login_failures_carry_user_facing_text() {
    let gateway = InMemoryAuthGateway::new();
    gateway.sign_up("donor@example.org", "secret-pass").await.unwrap();

    let bad_email = gateway.sign_in("not-an-email", "secret-pass").await.unwrap_err();
    assert_eq!(bad_email.user_message(), "The email address is badly formatted.");

    let wrong = gateway.sign_in("donor@example.org", "nope-nope").await.unwrap_err();
    assert_eq!(wrong.user_message(), "Invalid email or password. Please try again.");

    gateway.disable("donor@example.org").await;
    let disabled = gateway.sign_in("donor@example.org", "secret-pass").await.unwrap_err();
    assert_eq!(disabled.user_message(), "This user account has been disabled.");
}

#[tokio::test]
async fn establish_installs_a_known_session() {
    let store = SessionStore::new(Arc::new(InMemoryProfileStore::new()));
    let mut rx = store.watch();
    let session = Session {
        identity: Identity {
            user_id: Uuid::new_v4(),
            email: Some("bakery@example.com".into()),
            display_name: Some("Corner Bakery".into()),
        },
        role: Some(Role::Donor),
    };

    store.establish(session.clone()).await;
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), Some(session));
    assert_eq!(store.current_role(), Some(Role::Donor));

    store.clear().await;
    assert!(store.current().is_none());
}

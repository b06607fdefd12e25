//! Integration tests for the donation lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use food_share_core::memory::InMemoryDonationStore;
use food_share_core::{
    Actor, Donation, DonationDraft, DonationFilter, DonationLifecycle, DonationStatus,
    DonationStore, GeoPoint, LifecycleError, NewDonation, PortError, PortResult, Role,
};
use uuid::Uuid;

fn actor(role: Role, name: &str) -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        display_name: Some(name.to_string()),
        role: Some(role),
    }
}

fn bread_draft() -> DonationDraft {
    DonationDraft {
        title: "Bread".to_string(),
        description: "Day-old sourdough, still good for toast".to_string(),
        quantity: "5 loaves".to_string(),
        image_url: Some("http://localhost:3000/media/donations/1_bread.jpg".to_string()),
        location: Some(GeoPoint::new(12.9716, 77.5946)),
    }
}

fn stored(donor_id: Uuid, title: &str, status: DonationStatus, minutes_ago: i64) -> Donation {
    Donation {
        id: Uuid::new_v4(),
        donor_id,
        donor_name: "Corner Bakery".to_string(),
        title: title.to_string(),
        description: "Surplus".to_string(),
        quantity: "1 crate".to_string(),
        image_url: "http://localhost:3000/media/x.jpg".to_string(),
        location: GeoPoint::new(0.0, 0.0),
        status,
        created_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

fn setup() -> (Arc<InMemoryDonationStore>, DonationLifecycle) {
    let store = Arc::new(InMemoryDonationStore::new());
    let lifecycle = DonationLifecycle::new(store.clone());
    (store, lifecycle)
}

#[tokio::test]
async fn posted_bread_is_listed_until_an_ngo_accepts_it() {
    let (_store, lifecycle) = setup();
    let donor = actor(Role::Donor, "Corner Bakery");
    let ngo = actor(Role::Ngo, "Food Rescue");

    let d1 = lifecycle.create(&donor, bread_draft()).await.unwrap();
    assert_eq!(d1.status, DonationStatus::Available);
    assert_eq!(d1.title, "Bread");
    assert_eq!(d1.quantity, "5 loaves");
    assert_eq!(d1.donor_id, donor.user_id);
    assert_eq!(d1.donor_name, "Corner Bakery");

    let available = lifecycle.list(DonationStatus::Available).await.unwrap();
    assert!(available.iter().any(|d| d.id == d1.id));

    let accepted = lifecycle.accept(d1.id, &ngo).await.unwrap();
    assert_eq!(accepted.status, DonationStatus::Pending);
    assert_eq!(
        lifecycle.get(d1.id).await.unwrap().status,
        DonationStatus::Pending
    );

    let available = lifecycle.list(DonationStatus::Available).await.unwrap();
    assert!(available.iter().all(|d| d.id != d1.id));
}

#[tokio::test]
async fn missing_fields_are_rejected_without_writing() {
    let (store, lifecycle) = setup();
    let donor = actor(Role::Donor, "Corner Bakery");

    let cases: Vec<(&str, DonationDraft)> = vec![
        ("title", DonationDraft { title: "  ".into(), ..bread_draft() }),
        ("description", DonationDraft { description: String::new(), ..bread_draft() }),
        ("quantity", DonationDraft { quantity: String::new(), ..bread_draft() }),
        ("image", DonationDraft { image_url: None, ..bread_draft() }),
        ("image", DonationDraft { image_url: Some(" ".into()), ..bread_draft() }),
        ("location", DonationDraft { location: None, ..bread_draft() }),
        (
            "location",
            DonationDraft { location: Some(GeoPoint::new(120.0, 0.0)), ..bread_draft() },
        ),
    ];

    for (field, draft) in cases {
        let err = lifecycle.create(&donor, draft).await.unwrap_err();
        assert_eq!(err, LifecycleError::Validation { field });
    }

    let all = store
        .query_donations(DonationFilter::Donor(donor.user_id))
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn donor_name_falls_back_to_anonymous() {
    let (_store, lifecycle) = setup();
    let donor = Actor {
        display_name: Some("   ".to_string()),
        ..actor(Role::Donor, "")
    };
    let d = lifecycle.create(&donor, bread_draft()).await.unwrap();
    assert_eq!(d.donor_name, "Anonymous");
}

#[tokio::test]
async fn only_donors_can_post() {
    let (_store, lifecycle) = setup();
    for poster in [
        actor(Role::Ngo, "Food Rescue"),
        actor(Role::Admin, "Ops"),
        Actor { role: None, ..actor(Role::Donor, "Degraded") },
    ] {
        let err = lifecycle.create(&poster, bread_draft()).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Authorization(_)), "{err:?}");
    }
    assert!(lifecycle.list(DonationStatus::Available).await.unwrap().is_empty());
}

#[tokio::test]
async fn accept_requires_ngo_role_and_available_status() {
    let (store, lifecycle) = setup();
    let donor = actor(Role::Donor, "Corner Bakery");
    let ngo = actor(Role::Ngo, "Food Rescue");

    let d = lifecycle.create(&donor, bread_draft()).await.unwrap();

    let err = lifecycle.accept(d.id, &donor).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Authorization(_)));
    assert_eq!(lifecycle.get(d.id).await.unwrap().status, DonationStatus::Available);

    lifecycle.accept(d.id, &ngo).await.unwrap();
    let err = lifecycle.accept(d.id, &ngo).await.unwrap_err();
    assert_eq!(
        err,
        LifecycleError::State {
            id: d.id,
            status: DonationStatus::Pending,
            expected: DonationStatus::Available,
        }
    );

    for status in [DonationStatus::Collected, DonationStatus::Expired] {
        let done = stored(donor.user_id, "Rice", status, 5);
        store.put(done.clone()).await;
        let err = lifecycle.accept(done.id, &ngo).await.unwrap_err();
        assert!(matches!(err, LifecycleError::State { .. }));
        assert_eq!(lifecycle.get(done.id).await.unwrap().status, status);
    }
}

#[tokio::test]
async fn accepting_an_unknown_donation_is_not_found() {
    let (_store, lifecycle) = setup();
    let ngo = actor(Role::Ngo, "Food Rescue");
    let missing = Uuid::new_v4();
    assert_eq!(
        lifecycle.accept(missing, &ngo).await.unwrap_err(),
        LifecycleError::NotFound(missing)
    );
}

#[tokio::test]
async fn only_the_owner_can_remove() {
    let (_store, lifecycle) = setup();
    let owner = actor(Role::Donor, "Corner Bakery");
    let other = actor(Role::Donor, "Market Stall");
    let ngo = actor(Role::Ngo, "Food Rescue");

    let d = lifecycle.create(&owner, bread_draft()).await.unwrap();

    for intruder in [&other, &ngo] {
        let err = lifecycle.remove(d.id, intruder).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Authorization(_)));
        assert!(lifecycle.get(d.id).await.is_ok());
    }

    lifecycle.remove(d.id, &owner).await.unwrap();
    assert_eq!(
        lifecycle.get(d.id).await.unwrap_err(),
        LifecycleError::NotFound(d.id)
    );
}

#[tokio::test]
async fn lists_are_filtered_and_newest_first() {
    let (store, lifecycle) = setup();
    let donor = Uuid::new_v4();
    let other_donor = Uuid::new_v4();

    let old = stored(donor, "Old", DonationStatus::Available, 30);
    let new = stored(other_donor, "New", DonationStatus::Available, 1);
    let middle = stored(donor, "Middle", DonationStatus::Available, 10);
    let claimed = stored(donor, "Claimed", DonationStatus::Pending, 2);
    let gone = stored(other_donor, "Gone", DonationStatus::Expired, 3);
    for d in [&old, &new, &middle, &claimed, &gone] {
        store.put(d.clone()).await;
    }

    let available = lifecycle.list(DonationStatus::Available).await.unwrap();
    let titles: Vec<&str> = available.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, ["New", "Middle", "Old"]);
    assert!(available
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));

    let mine = lifecycle.list_by_donor(donor).await.unwrap();
    let titles: Vec<&str> = mine.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, ["Claimed", "Middle", "Old"]);
}

/// A store where a competing NGO always claims the listing just before our write.
struct ContendedStore {
    inner: InMemoryDonationStore,
}

#[async_trait]
impl DonationStore for ContendedStore {
    async fn insert_donation(&self, donation: NewDonation) -> PortResult<Donation> {
        self.inner.insert_donation(donation).await
    }

    async fn get_donation(&self, donation_id: Uuid) -> PortResult<Donation> {
        self.inner.get_donation(donation_id).await
    }

    async fn query_donations(&self, filter: DonationFilter) -> PortResult<Vec<Donation>> {
        self.inner.query_donations(filter).await
    }

    async fn update_status_if(
        &self,
        donation_id: Uuid,
        expected: DonationStatus,
        next: DonationStatus,
    ) -> PortResult<bool> {
        self.inner
            .update_status_if(donation_id, DonationStatus::Available, DonationStatus::Pending)
            .await?;
        self.inner.update_status_if(donation_id, expected, next).await
    }

    async fn delete_donation(&self, donation_id: Uuid) -> PortResult<()> {
        self.inner.delete_donation(donation_id).await
    }
}

#[tokio::test]
async fn losing_an_accept_race_is_a_state_error() {
    let store = Arc::new(ContendedStore {
        inner: InMemoryDonationStore::new(),
    });
    let lifecycle = DonationLifecycle::new(store.clone());
    let donor = actor(Role::Donor, "Corner Bakery");
    let ngo = actor(Role::Ngo, "Food Rescue");

    let d = lifecycle.create(&donor, bread_draft()).await.unwrap();
    let err = lifecycle.accept(d.id, &ngo).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::State { status: DonationStatus::Pending, .. }
    ));
}

struct OfflineStore;

#[async_trait]
impl DonationStore for OfflineStore {
    async fn insert_donation(&self, _donation: NewDonation) -> PortResult<Donation> {
        Err(PortError::Unexpected("network unreachable".into()))
    }

    async fn get_donation(&self, _donation_id: Uuid) -> PortResult<Donation> {
        Err(PortError::Unexpected("network unreachable".into()))
    }

    async fn query_donations(&self, _filter: DonationFilter) -> PortResult<Vec<Donation>> {
        Err(PortError::Unexpected("network unreachable".into()))
    }

    async fn update_status_if(
        &self,
        _donation_id: Uuid,
        _expected: DonationStatus,
        _next: DonationStatus,
    ) -> PortResult<bool> {
        Err(PortError::Unexpected("network unreachable".into()))
    }

    async fn delete_donation(&self, _donation_id: Uuid) -> PortResult<()> {
        Err(PortError::Unexpected("network unreachable".into()))
    }
}

#[tokio::test]
async fn backend_failures_surface_as_fetch_or_write() {
    let lifecycle = DonationLifecycle::new(Arc::new(OfflineStore));
    let donor = actor(Role::Donor, "Corner Bakery");

    assert!(matches!(
        lifecycle.list(DonationStatus::Available).await,
        Err(LifecycleError::Fetch(_))
    ));
    assert!(matches!(
        lifecycle.create(&donor, bread_draft()).await,
        Err(LifecycleError::Write(_))
    ));
    assert!(matches!(
        lifecycle.remove(Uuid::new_v4(), &donor).await,
        Err(LifecycleError::Fetch(_))
    ));
}

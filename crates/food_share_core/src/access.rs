//! crates/food_share_core/src/access.rs
//!
//! Role-based capabilities. Every permission decision in the workspace goes
//! through `Actor::can` or `Tab::visible_for`.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Donation, Role, Session};

/// The user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

impl From<&Session> for Actor {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.identity.user_id,
            display_name: session.identity.display_name.clone(),
            role: session.role,
        }
    }
}

/// Operations on donations that need a permission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateDonation,
    ViewDonations,
    AcceptDonation,
    RemoveDonation,
}

impl Actor {
    /// Whether this actor may perform `operation`, on `donation` when the
    /// operation concerns a specific listing.
    ///
    /// Status preconditions are not checked here; the lifecycle owns those.
    pub fn can(&self, operation: Operation, donation: Option<&Donation>) -> bool {
        match operation {
            Operation::CreateDonation => self.role == Some(Role::Donor),
            Operation::ViewDonations => true,
            Operation::AcceptDonation => self.role == Some(Role::Ngo),
            Operation::RemoveDonation => donation.is_some_and(|d| d.donor_id == self.user_id),
        }
    }
}

/// The top-level screens of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Home,
    Add,
    MyDonations,
    Map,
    Profile,
}

impl Tab {
    /// Tabs shown for a session with `role`, in display order.
    pub fn visible_for(role: Option<Role>) -> Vec<Tab> {
        let mut tabs = vec![Tab::Home];
        match role {
            Some(Role::Donor) => tabs.extend([Tab::Add, Tab::MyDonations]),
            Some(Role::Ngo) => tabs.push(Tab::Map),
            Some(Role::Admin) | None => {}
        }
        tabs.push(Tab::Profile);
        tabs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DonationStatus, GeoPoint};
    use chrono::Utc;

    fn actor(role: Option<Role>) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            display_name: None,
            role,
        }
    }

    fn donation_owned_by(donor_id: Uuid) -> Donation {
        Donation {
            id: Uuid::new_v4(),
            donor_id,
            donor_name: "Corner Bakery".to_string(),
            title: "Bread".to_string(),
            description: "Day-old sourdough".to_string(),
            quantity: "5 loaves".to_string(),
            image_url: "http://localhost/media/bread.jpg".to_string(),
            location: GeoPoint::new(12.97, 77.59),
            status: DonationStatus::Available,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn only_donors_create_and_only_ngos_accept() {
        let donor = actor(Some(Role::Donor));
        let ngo = actor(Some(Role::Ngo));
        let admin = actor(Some(Role::Admin));
        let degraded = actor(None);

        assert!(donor.can(Operation::CreateDonation, None));
        assert!(!ngo.can(Operation::CreateDonation, None));
        assert!(!admin.can(Operation::CreateDonation, None));
        assert!(!degraded.can(Operation::CreateDonation, None));

        let listing = donation_owned_by(donor.user_id);
        assert!(ngo.can(Operation::AcceptDonation, Some(&listing)));
        assert!(!donor.can(Operation::AcceptDonation, Some(&listing)));
        assert!(!admin.can(Operation::AcceptDonation, Some(&listing)));
        assert!(!degraded.can(Operation::AcceptDonation, Some(&listing)));
    }

    #[test]
    fn removal_follows_ownership_not_role() {
        let owner = actor(Some(Role::Donor));
        let other_donor = actor(Some(Role::Donor));
        let listing = donation_owned_by(owner.user_id);

        assert!(owner.can(Operation::RemoveDonation, Some(&listing)));
        assert!(!other_donor.can(Operation::RemoveDonation, Some(&listing)));
        assert!(!owner.can(Operation::RemoveDonation, None));

        let degraded_owner = Actor {
            role: None,
            ..owner.clone()
        };
        assert!(degraded_owner.can(Operation::RemoveDonation, Some(&listing)));
    }

    #[test]
    fn everyone_signed_in_can_browse() {
        for role in [Some(Role::Donor), Some(Role::Ngo), Some(Role::Admin), None] {
            assert!(actor(role).can(Operation::ViewDonations, None));
        }
    }

    #[test]
    fn tabs_follow_role() {
        assert_eq!(
            Tab::visible_for(Some(Role::Donor)),
            vec![Tab::Home, Tab::Add, Tab::MyDonations, Tab::Profile]
        );
        assert_eq!(
            Tab::visible_for(Some(Role::Ngo)),
            vec![Tab::Home, Tab::Map, Tab::Profile]
        );
        assert_eq!(Tab::visible_for(None), vec![Tab::Home, Tab::Profile]);
    }
}

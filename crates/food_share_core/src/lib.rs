pub mod access;
pub mod domain;
pub mod lifecycle;
pub mod memory;
pub mod ports;
pub mod session;

pub use access::{Actor, Operation, Tab};
pub use domain::{
    AuthSession, Donation, DonationDraft, DonationStatus, GeoPoint, Identity, NewDonation, Role,
    Session, UserCredentials, UserProfile,
};
pub use lifecycle::{DonationLifecycle, LifecycleError, LifecycleResult};
pub use ports::{
    AccountStore, AuthFailure, AuthGateway, AuthResult, DonationFilter, DonationStore,
    IdentityStream, MediaStore, PortError, PortResult, ProfileStore,
};
pub use session::{resolve_session, SessionStore, Subscription};

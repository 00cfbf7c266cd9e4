//! Core functionality for the turntable backend
//!
//! This crate holds the parts of the backend with real state: the per-identity
//! login throttle and its janitor, the password login flow that wraps an
//! external [`CredentialVerifier`], and the id lists behind follows and
//! favorites.
//!
//! See [`services::LoginThrottle`] for throttling, [`services::AuthService`] for
//! login, and [`services::MembershipService`] for follows and favorites.
//!
pub mod clock;
pub mod error;
pub mod membership;
pub mod repositories;
pub mod services;
pub mod validation;
pub mod verifier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, Error, RateLimited, StorageError, ValidationError};
pub use membership::{MembershipChange, MembershipKind, MembershipList};
pub use repositories::{
    InMemoryMembershipRepository, InMemoryProfileRepository, MembershipRepository,
    MembershipUpdate, ProfileRepository,
};
pub use services::{
    AttemptRecord, AuthService, Janitor, LoginThrottle, MAX_THROTTLE_DURATION, MembershipService,
    ThrottleConfig,
};
pub use verifier::{AuthSession, AuthUser, CredentialVerifier, SignUp};

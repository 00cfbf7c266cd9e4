//! Service layer for business logic.
//!
//! Services own their collaborators behind `Arc` and are shared across request
//! handlers.

pub mod auth;
pub mod janitor;
pub mod login_throttle;
pub mod membership;

pub use auth::AuthService;
pub use janitor::Janitor;
pub use login_throttle::{AttemptRecord, LoginThrottle, MAX_THROTTLE_DURATION, ThrottleConfig};
pub use membership::MembershipService;

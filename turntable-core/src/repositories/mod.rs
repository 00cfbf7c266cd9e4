//! Repository traits for data access.
//!
//! Services talk to storage through these traits so the hosted backend can be
//! swapped for the in-memory implementations in tests.

pub mod membership;
pub mod profile;

pub use membership::{InMemoryMembershipRepository, MembershipRepository, MembershipUpdate};
pub use profile::{InMemoryProfileRepository, ProfileRepository};

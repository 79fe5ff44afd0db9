//! Social platform surface consumed by the churn tracker.
//!
//! [`services`] holds the narrow, platform-neutral traits the core depends on (profile,
//! follower listing, bulk lookup, timeline probing, posting). [`twitter`] implements
//! them against the Twitter/X v1.1 REST API with OAuth 1.0a user-context auth.
pub mod services;
pub mod twitter;

pub use services::{
    Cursor, FollowerListService, IdPage, Notifier, ProfileService, ResolvedUser, TimelineProbe,
    UserLookupService, VerifiedAccount,
};

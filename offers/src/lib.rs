//! Offer-matching core: the Offer Matcher Manager, the Launch Rate Limiter,
//! and the Concurrent Request Admission Filter.
//!
//! This crate owns none of its collaborators' business logic — matcher
//! implementations, task-status tracking, and how offers are obtained from
//! the cluster manager all live outside it. It only implements the
//! resource-conserving fan-out, the backoff bookkeeping, and the admission
//! gate described for those three pieces.

pub mod admission;
pub mod error;
pub mod manager;
pub mod matcher;
pub mod offer;
pub mod rate_limiter;
pub mod resources;

pub use admission::{AdmissionError, AdmissionFilter, RequestOutcome};
pub use error::OfferError;
pub use manager::{Manager, ManagerConfig, ManagerHandle};
pub use matcher::{MatcherHandle, OfferMatcher};
pub use offer::{MatchedTasks, Offer, OfferId, TaskPlacement, TaskSource};
pub use rate_limiter::{LaunchRateLimiter, RateLimitedApp};
pub use resources::{Resource, ResourceValue, ValueRange};

//! The Manager's view of a matcher: an identity-keyed handle around an
//! async `processOffer` capability.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::offer::{MatchedTasks, Offer};

/// A per-application decision module. Given a deadline and an offer, it
/// asynchronously proposes task placements on the offer's remaining
/// resources. The Manager applies no per-matcher timeout beyond the
/// offer-wide deadline — a matcher is expected to respect `deadline`
/// itself, but if it doesn't, the deadline self-message races it anyway.
#[async_trait]
pub trait OfferMatcher: Send + Sync {
    async fn process_offer(&self, deadline: Instant, offer: Offer) -> anyhow::Result<MatchedTasks>;
}

/// A matcher, keyed by a stable logical id rather than pointer identity —
/// matchers are compared and deduplicated by `id`, per the design note that
/// membership should key on a supplied identifier, not object identity.
#[derive(Clone)]
pub struct MatcherHandle {
    pub id: String,
    pub matcher: Arc<dyn OfferMatcher>,
}

impl MatcherHandle {
    pub fn new(id: impl Into<String>, matcher: Arc<dyn OfferMatcher>) -> Self {
        Self {
            id: id.into(),
            matcher,
        }
    }
}

impl PartialEq for MatcherHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MatcherHandle {}

impl Hash for MatcherHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherHandle").field("id", &self.id).finish()
    }
}

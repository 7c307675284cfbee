//! Offers, task placements, and the one-shot commit/reject capability a
//! placement carries back to whoever proposed it.

use std::fmt;

use uuid::Uuid;

use crate::resources::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OfferId(pub Uuid);

impl OfferId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OfferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bundle of resources published by the cluster manager for potential
/// task placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub id: OfferId,
    pub resources: Vec<Resource>,
}

impl Offer {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            id: OfferId::new(),
            resources,
        }
    }
}

/// A placement's one-shot capability to decline. Commit is out of scope for
/// this core: the offer source observes a placement in the final
/// `MatchedTasks` reply and is responsible for committing it; `reject` is
/// the only callback this crate ever invokes, and at most once per
/// placement.
pub trait TaskSource: Send + Sync + fmt::Debug {
    fn reject(self: Box<Self>);
}

/// A prospective task, paired with the capability to decline it.
pub struct TaskPlacement {
    pub task_id: String,
    pub resources: Vec<Resource>,
    pub source: Box<dyn TaskSource>,
}

impl fmt::Debug for TaskPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskPlacement")
            .field("task_id", &self.task_id)
            .field("resources", &self.resources)
            .field("source", &self.source)
            .finish()
    }
}

/// A matcher's reply to a `processOffer` query, or the Manager's final
/// reply to the offer source.
#[derive(Debug)]
pub struct MatchedTasks {
    pub offer_id: OfferId,
    pub placements: Vec<TaskPlacement>,
}

impl MatchedTasks {
    pub fn empty(offer_id: OfferId) -> Self {
        Self {
            offer_id,
            placements: Vec::new(),
        }
    }
}

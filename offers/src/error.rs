use thiserror::Error;

/// Errors the Manager catches and logs internally. Neither variant ever
/// escapes the actor loop — a matcher failure degrades to an empty reply,
/// and a placement-processing failure leaves the offending placement's
/// resources undeducted but still accepted. See `DESIGN.md` for why.
#[derive(Error, Debug)]
pub enum OfferError {
    #[error("matcher query failed: {0}")]
    MatcherFailed(String),

    #[error("resource subtraction failed for placement {task_id}: {reason}")]
    PlacementProcessing { task_id: String, reason: String },
}

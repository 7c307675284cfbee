//! Bounded-concurrency gate in front of the control-plane API.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::warn;

/// The HTTP-like status this crate maps rejection to.
pub const REJECTED_STATUS: u16 = 503;

#[derive(Debug, Error)]
pub enum AdmissionError<E> {
    /// No permit became available within `wait_time`.
    #[error("Too many concurrent requests! Allowed: {limit}.")]
    Rejected { limit: usize },

    /// The downstream handler failed on its own terms.
    #[error("handler error: {0}")]
    Inner(E),

    /// The downstream handler returned something that cannot be represented
    /// as a response at all — a programmer error, not a capacity problem.
    #[error("handler produced a non-HTTP response")]
    Misuse,
}

/// What a handler wrapped by `AdmissionFilter::admit_http` produced.
pub enum RequestOutcome<T> {
    Response(T),
    NonHttp,
}

/// A counting permit pool guarding `concurrent_requests` in-flight calls.
pub struct AdmissionFilter {
    semaphore: Arc<Semaphore>,
    limit: usize,
    wait_time: Duration,
}

impl AdmissionFilter {
    pub fn new(concurrent_requests: usize, wait_time: Duration) -> Self {
        assert!(concurrent_requests >= 1, "concurrent_requests must be >= 1");
        Self {
            semaphore: Arc::new(Semaphore::new(concurrent_requests)),
            limit: concurrent_requests,
            wait_time,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `fut` if a permit is acquired within `wait_time`, otherwise
    /// rejects. The permit is held for the lifetime of `fut` and released on
    /// every exit path — success, error, or panic-unwind — since it is a
    /// RAII guard whose `Drop` always runs during unwinding.
    pub async fn admit<F, T, E>(&self, fut: F) -> Result<T, AdmissionError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let _permit = self.acquire().await?;
        fut.await.map_err(AdmissionError::Inner)
    }

    /// Like `admit`, but for handlers that can also fail to produce a
    /// response at all (`RequestOutcome::NonHttp`), which this crate treats
    /// as a programmer-error signal rather than a rejection.
    pub async fn admit_http<F, T, E>(&self, fut: F) -> Result<T, AdmissionError<E>>
    where
        F: Future<Output = Result<RequestOutcome<T>, E>>,
    {
        let _permit = self.acquire().await?;
        match fut.await.map_err(AdmissionError::Inner)? {
            RequestOutcome::Response(t) => Ok(t),
            RequestOutcome::NonHttp => Err(AdmissionError::Misuse),
        }
    }

    async fn acquire<E>(&self) -> Result<tokio::sync::OwnedSemaphorePermit, AdmissionError<E>> {
        match tokio::time::timeout(self.wait_time, self.semaphore.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) | Err(_) => {
                warn!(limit = self.limit, "admission filter rejected request: no permit within wait_time");
                Err(AdmissionError::Rejected { limit: self.limit })
            }
        }
    }
}

/// The wire body for a rejected request, matching `AdmissionError::Rejected`'s
/// `Display` impl exactly.
pub fn rejected_body(limit: usize) -> String {
    format!("Too many concurrent requests! Allowed: {limit}.")
}

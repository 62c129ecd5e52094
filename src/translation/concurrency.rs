/*!
 * Admission control for batch requests.
 *
 * All batch futures of a job are created up front; each one waits here for a
 * slot before doing any network work. Waiting is raced against the job's
 * cancellation token so a cancelled job never admits anything new.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Bounded admission of concurrent batches
#[derive(Debug, Clone)]
pub struct ConcurrencyController {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Slot held by an admitted batch; released on drop
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyController {
    /// Create a controller admitting at most `max_concurrent` holders (at least one)
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot
    ///
    /// Returns `None` when `cancel` fires before or while waiting.
    pub async fn admit(&self, cancel: &CancellationToken) -> Option<AdmissionPermit> {
        if cancel.is_cancelled() {
            return None;
        }

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            permit = self.semaphore.clone().acquire_owned() => permit.ok()?,
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Some(AdmissionPermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        })
    }

    /// Configured limit
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Currently admitted holders
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously admitted holders so far
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

//! Bounded request admission.
//!
//! Limits in-flight pipeline runs and lets a bounded number of arrivals
//! wait for a slot; anything beyond the queue bound is rejected
//! immediately rather than parked indefinitely.

use crate::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    queued: AtomicUsize,
    max_queued: usize,
}

/// Held for the duration of one admitted request.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    pub fn new(max_in_flight: usize, max_queued: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            queued: AtomicUsize::new(0),
            max_queued,
        }
    }

    /// Admit a request, waiting in the bounded queue when all slots are busy.
    pub async fn admit(&self) -> Result<AdmissionPermit> {
        if let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() {
            return Ok(AdmissionPermit { _permit: permit });
        }

        if self.queued.fetch_add(1, Ordering::SeqCst) >= self.max_queued {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!("Admission queue full, rejecting request");
            return Err(Error::CapacityExceeded);
        }

        let acquired = Arc::clone(&self.permits).acquire_owned().await;
        self.queued.fetch_sub(1, Ordering::SeqCst);

        // The semaphore is never closed while the gate is alive.
        let permit = acquired.map_err(|_| Error::CapacityExceeded)?;
        Ok(AdmissionPermit { _permit: permit })
    }

    /// Number of requests currently waiting for a slot.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }
}

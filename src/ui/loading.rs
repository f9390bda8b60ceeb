use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Loading overlay state. Shown while any workflow holds a [`LoadingGuard`].
#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    active: Arc<AtomicUsize>,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the indicator until the returned guard is dropped.
    pub fn show(&self) -> LoadingGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            active: self.active.clone(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }

    /// Last-resort reset for error paths that escaped every guard.
    pub fn force_hide(&self) {
        if self.active.swap(0, Ordering::SeqCst) > 0 {
            warn!("Loading indicator was still visible, forcing it off");
        }
    }
}

pub struct LoadingGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        // force_hide may already have zeroed the counter
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

/// Rejects a workflow while another run of it is still pending.
#[derive(Debug, Default)]
pub struct SingleFlight {
    pending: AtomicBool,
    settled: Notify,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, `None` if a run is already in flight.
    pub fn try_begin(&self, name: &'static str) -> Option<InFlight<'_>> {
        let flight = self.claim();
        if flight.is_none() {
            debug!(workflow = name, "Ignoring duplicate invocation while pending");
        }
        flight
    }

    /// Claim the slot, waiting for the pending run to finish first.
    pub async fn begin(&self, name: &'static str) -> InFlight<'_> {
        loop {
            let settled = self.settled.notified();
            tokio::pin!(settled);
            settled.as_mut().enable();

            if let Some(flight) = self.claim() {
                return flight;
            }
            debug!(workflow = name, "Waiting for pending run");
            settled.await;
        }
    }

    fn claim(&self) -> Option<InFlight<'_>> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight { owner: self })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

pub struct InFlight<'a> {
    owner: &'a SingleFlight,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.owner.pending.store(false, Ordering::Release);
        self.owner.settled.notify_waiters();
    }
}

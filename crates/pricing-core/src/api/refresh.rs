//! Single-flight coordination for access-token refresh.
//!
//! The first caller to see an expired token becomes the leader and performs
//! the refresh. Everyone arriving while it runs is parked on a oneshot
//! channel and released, oldest first, with the leader's outcome.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use super::ApiError;

/// Result of one refresh: the new access token or the error every caller gets.
pub type RefreshOutcome = Result<String, ApiError>;

/// A caller blocked on an in-flight refresh.
pub type PendingRequest = oneshot::Sender<RefreshOutcome>;

/// `refreshing` flag plus the FIFO of parked callers.
/// Invariant: `queue` is empty whenever `refreshing` is false.
#[derive(Debug, Default)]
pub struct RefreshState {
    refreshing: bool,
    queue: VecDeque<PendingRequest>,
}

/// What a caller got when it asked to refresh.
pub enum RefreshTicket<'a> {
    /// This caller must perform the refresh and then settle the guard.
    Leader(RefreshGuard<'a>),
    /// A refresh is already running; await its outcome.
    Waiter(oneshot::Receiver<RefreshOutcome>),
}

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set in one critical section: either claim the refresh or
    /// join the queue behind the one already running.
    pub fn join(&self) -> RefreshTicket<'_> {
        let mut state = self.state.lock();
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.queue.push_back(tx);
            debug!(waiting = state.queue.len(), "Queued behind in-flight token refresh");
            RefreshTicket::Waiter(rx)
        } else {
            state.refreshing = true;
            RefreshTicket::Leader(RefreshGuard {
                coordinator: self,
                settled: false,
            })
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    /// Number of callers parked on the current refresh.
    pub fn waiting(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Drop all parked callers and clear the flag. Parked callers observe a
    /// closed channel.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.refreshing = false;
        state.queue.clear();
    }

    fn take_queue(&self) -> VecDeque<PendingRequest> {
        let mut state = self.state.lock();
        state.refreshing = false;
        std::mem::take(&mut state.queue)
    }
}

/// Held by the leader for the duration of one refresh.
///
/// Dropping it without settling (the leader's future was cancelled) still
/// clears the flag; the parked callers then see their channel close.
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshGuard<'_> {
    /// Reset the state and hand `outcome` to every parked caller in the
    /// order they queued. Returns how many were released.
    pub fn settle(mut self, outcome: &RefreshOutcome) -> usize {
        self.settled = true;
        let queue = self.coordinator.take_queue();
        let released = queue.len();
        for pending in queue {
            // Receiver gone means that caller was cancelled; nothing to do.
            let _ = pending.send(outcome.clone());
        }
        released
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Token refresh abandoned before completion");
            self.coordinator.reset();
        }
    }
}

/// Outcome for a waiter whose leader went away without settling.
pub(crate) fn abandoned() -> ApiError {
    ApiError::Unauthenticated("token refresh was abandoned".to_string())
}

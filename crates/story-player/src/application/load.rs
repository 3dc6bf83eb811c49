//! Load coordination: neighbors of the active story wait until it reports its
//! content loaded.
//!
//! At most one wait is outstanding. Starting a new wait settles the previous
//! one with `PlayerError::Cancelled`, so pipelines gated on a stale wait abort
//! instead of loading for a story that is no longer active.

use story_player_core::error::PlayerError;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitState {
    Pending,
    Loaded,
    Cancelled,
}

#[derive(Debug)]
struct ActiveWait {
    entry: usize,
    tx: watch::Sender<WaitState>,
}

impl ActiveWait {
    fn settle(&self, outcome: WaitState) -> bool {
        self.tx.send_if_modified(|state| {
            if *state != WaitState::Pending {
                return false;
            }
            *state = outcome;
            true
        })
    }
}

/// A gate a neighbor pipeline passes before loading.
#[derive(Debug)]
pub struct LoadGate {
    rx: Option<watch::Receiver<WaitState>>,
}

impl LoadGate {
    /// A gate that is already open.
    #[must_use]
    pub fn open() -> Self {
        Self { rx: None }
    }

    /// Waits for the gate.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Cancelled` if the wait was superseded.
    pub async fn wait(self) -> Result<(), PlayerError> {
        let Some(mut rx) = self.rx else {
            return Ok(());
        };
        let settled = rx.wait_for(|state| *state != WaitState::Pending).await;
        match settled.map(|state| *state) {
            Ok(WaitState::Loaded) => Ok(()),
            _ => Err(PlayerError::Cancelled),
        }
    }
}

/// Tracks the wait for the active story's content.
#[derive(Debug, Default)]
pub struct LoadCoordinator {
    current: Option<ActiveWait>,
}

impl LoadCoordinator {
    /// Creates a coordinator with no outstanding wait.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts waiting for `active`, cancelling any previous wait. No new
    /// wait is started if the active story already reported its content
    /// loaded.
    pub fn begin(&mut self, active: usize, already_loaded: bool) {
        if let Some(previous) = self.current.take() {
            if previous.settle(WaitState::Cancelled) {
                debug!(entry = previous.entry, "cancelled superseded story load wait");
            }
        }
        if already_loaded {
            return;
        }
        let (tx, _rx) = watch::channel(WaitState::Pending);
        self.current = Some(ActiveWait { entry: active, tx });
    }

    /// Returns the gate for a neighbor of the active story.
    #[must_use]
    pub fn gate(&self, active_loaded: bool) -> LoadGate {
        if active_loaded {
            return LoadGate::open();
        }
        match &self.current {
            Some(wait) => LoadGate {
                rx: Some(wait.tx.subscribe()),
            },
            None => LoadGate::open(),
        }
    }

    /// Records that the story at `index` reported its content loaded.
    /// Returns true if this released the outstanding wait.
    pub fn content_loaded(&mut self, index: usize) -> bool {
        match &self.current {
            Some(wait) if wait.entry == index => wait.settle(WaitState::Loaded),
            _ => false,
        }
    }

    /// Index the outstanding wait is bound to, if any.
    #[must_use]
    pub fn waiting_on(&self) -> Option<usize> {
        self.current
            .as_ref()
            .filter(|wait| *wait.tx.borrow() == WaitState::Pending)
            .map(|wait| wait.entry)
    }
}

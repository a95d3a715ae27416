//! Bounded-retry setup of the contour source.
//!
//! [`ContourInitializer`] owns everything the setup sequence needs to
//! remember between map callbacks: the state, the attempt counter, the one
//! pending timer and the handle of the live contour source. It never touches
//! the map itself. The owner runs an attempt whenever
//! [`take_due`](ContourInitializer::take_due) hands one out and reports the
//! outcome back.
//!
//! Timers are plain deadlines. Nothing fires on its own; the owner polls with
//! the current time, which keeps the machine deterministic under test.

use crate::contour::source::ContourTileSource;
use crate::contour::thresholds::ContourThresholdTable;
use crate::core::config::ContourLifecycleConfig;
use crate::lifecycle::state::{InitAttemptCounter, InitState};
use crate::ViewerError;
use instant::Instant;
use std::sync::Arc;

/// What scheduled a pending attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptReason {
    /// First attempt after a trigger, once things had time to settle
    Settle,
    /// The style was still loading on the previous attempt
    StyleRecheck,
    /// The previous attempt failed
    Retry,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledAttempt {
    due: Instant,
    reason: AttemptReason,
}

/// The live contour source, as registered on the map
#[derive(Debug, Clone)]
pub struct ContourSourceHandle {
    /// Terrain source the contours are derived from
    pub terrain_key: String,
    pub tile_source: Arc<ContourTileSource>,
    pub thresholds: ContourThresholdTable,
    /// Tile URL template of the registered vector source
    pub protocol_url: String,
}

pub struct ContourInitializer {
    config: ContourLifecycleConfig,
    state: InitState,
    counter: InitAttemptCounter,
    pending: Option<ScheduledAttempt>,
    handle: Option<ContourSourceHandle>,
    terrain_key: Option<String>,
    disposed: bool,
}

impl ContourInitializer {
    pub fn new(config: ContourLifecycleConfig) -> Self {
        let counter = InitAttemptCounter::new(config.max_attempts);
        Self {
            config,
            state: InitState::Uninitialized,
            counter,
            pending: None,
            handle: None,
            terrain_key: None,
            disposed: false,
        }
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.counter.attempts()
    }

    pub fn terrain_key(&self) -> Option<&str> {
        self.terrain_key.as_deref()
    }

    pub fn handle(&self) -> Option<&ContourSourceHandle> {
        self.handle.as_ref()
    }

    /// Deadline of the pending attempt, if one is scheduled
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    pub fn pending_reason(&self) -> Option<AttemptReason> {
        self.pending.map(|p| p.reason)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The active terrain source changed (or must be set up again from
    /// scratch). Resets the counter and schedules a fresh attempt. Returns
    /// the handle of the source being replaced so the caller can tear it
    /// down.
    pub fn terrain_source_changed(
        &mut self,
        key: &str,
        now: Instant,
    ) -> Option<ContourSourceHandle> {
        if self.disposed {
            return None;
        }
        log::debug!(
            "[contours] terrain source {:?} -> {:?}, resetting setup",
            self.terrain_key,
            key
        );
        self.terrain_key = Some(key.to_string());
        self.counter.reset();
        self.state = InitState::Uninitialized;
        self.schedule(now, AttemptReason::Settle);
        self.handle.take()
    }

    /// Collapsed trigger for every map event. Schedules an attempt unless
    /// one is already pending or there is nothing to do.
    ///
    /// An existing deadline is kept, so a steady stream of events cannot
    /// postpone the attempt forever.
    pub fn nudge(&mut self, now: Instant) -> bool {
        if self.disposed || !self.state.is_pending() || self.pending.is_some() {
            return false;
        }
        if self.counter.is_exhausted() {
            return false;
        }
        self.schedule(now, AttemptReason::Settle);
        true
    }

    /// Pops the pending attempt once its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> Option<AttemptReason> {
        if self.disposed {
            return None;
        }
        match self.pending {
            Some(scheduled) if scheduled.due <= now => {
                self.pending = None;
                Some(scheduled.reason)
            }
            _ => None,
        }
    }

    /// Starts an attempt, counting it against the bound. Returns `false`
    /// (and gives up for this terrain source) when the bound is reached.
    pub fn begin_attempt(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        if self.counter.is_exhausted() {
            self.exhaust();
            return false;
        }
        let attempt = self.counter.record();
        self.state = InitState::Attempting;
        log::debug!(
            "[contours] setup attempt {}/{}",
            attempt,
            self.counter.max_attempts()
        );
        true
    }

    /// The style was not loaded yet; look again after the settle delay.
    /// The re-check is a new attempt and counts as one.
    pub fn style_not_ready(&mut self, now: Instant) {
        if self.disposed {
            return;
        }
        log::debug!("[contours] style not loaded, re-checking");
        if self.counter.is_exhausted() {
            self.exhaust();
            return;
        }
        self.schedule(now, AttemptReason::StyleRecheck);
    }

    /// The attempt registered source and layers. Returns the handle it
    /// replaces, if any.
    pub fn succeeded(&mut self, handle: ContourSourceHandle) -> Option<ContourSourceHandle> {
        if self.disposed {
            return Some(handle);
        }
        log::info!(
            "[contours] initialized for {} after {} attempt(s)",
            handle.terrain_key,
            self.counter.attempts()
        );
        self.state = InitState::Ready;
        self.pending = None;
        self.handle.replace(handle)
    }

    /// The live source was re-registered with new intervals. Whatever the
    /// machine was waiting on is moot: the map shows contours again.
    pub fn rebuilt(&mut self, thresholds: ContourThresholdTable, protocol_url: String) {
        if self.disposed {
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        handle.thresholds = thresholds;
        handle.protocol_url = protocol_url;
        if self.state != InitState::Ready {
            log::info!("[contours] recovered by rebuilding with new intervals");
        }
        self.state = InitState::Ready;
        self.pending = None;
    }

    /// The attempt failed; retry after the retry delay while attempts remain
    pub fn failed(&mut self, now: Instant, err: &ViewerError) {
        if self.disposed {
            return;
        }
        log::error!("[contours] initialization error: {}", err);
        if self.counter.is_exhausted() {
            self.exhaust();
            return;
        }
        log::warn!(
            "[contours] retrying in {}ms ({}/{} attempts used)",
            self.config.retry_delay_ms,
            self.counter.attempts(),
            self.counter.max_attempts()
        );
        self.state = InitState::Attempting;
        self.pending = Some(ScheduledAttempt {
            due: now + self.config.retry_delay(),
            reason: AttemptReason::Retry,
        });
    }

    /// Stops the machine for good. Returns the live handle for teardown.
    pub fn dispose(&mut self) -> Option<ContourSourceHandle> {
        if self.disposed {
            return None;
        }
        self.disposed = true;
        self.pending = None;
        self.handle.take()
    }

    fn schedule(&mut self, now: Instant, reason: AttemptReason) {
        self.pending = Some(ScheduledAttempt {
            due: now + self.config.settle_delay(),
            reason,
        });
    }

    fn exhaust(&mut self) {
        if self.state != InitState::Exhausted {
            log::error!(
                "[contours] giving up after {} attempts for {:?}",
                self.counter.attempts(),
                self.terrain_key
            );
        }
        self.state = InitState::Exhausted;
        self.pending = None;
    }
}

impl Default for ContourInitializer {
    fn default() -> Self {
        Self::new(ContourLifecycleConfig::default())
    }
}

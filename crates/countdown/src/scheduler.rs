//! Repeating-timer scheduling.
//!
//! [`Scheduler`] is the seam between the countdown state machine and time.
//! [`TokioScheduler`] runs on a tokio runtime; [`ManualScheduler`] is a fake
//! clock advanced explicitly, for deterministic tests and replays.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Callback fired on every tick.
pub type TickFn = Arc<dyn Fn() + Send + Sync>;

/// Shortest interval a scheduler accepts; shorter ones are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to one repeating schedule. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the handle is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

/// Schedules repeating callbacks.
pub trait Scheduler: Send + Sync {
    /// Call `callback` every `interval`, first after one full interval.
    fn schedule_repeating(&self, interval: Duration, callback: TickFn) -> CancelHandle;

    /// Stop a schedule. Cancelling twice, or a finished schedule, is a no-op.
    fn cancel(&self, handle: &CancelHandle) {
        handle.cancel();
    }
}

// ---------------------------------------------------------------------------
// TokioScheduler
// ---------------------------------------------------------------------------

/// Runs each schedule as a task driving `tokio::time::interval`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Scheduler on the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_repeating(&self, interval: Duration, callback: TickFn) -> CancelHandle {
        let interval = interval.max(MIN_INTERVAL);
        let handle = CancelHandle::new();
        let cancel = handle.clone();

        self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        callback();
                    }
                }
            }
            tracing::trace!("Repeating schedule stopped");
        });

        handle
    }
}

// ---------------------------------------------------------------------------
// ManualScheduler
// ---------------------------------------------------------------------------

struct Entry {
    interval: Duration,
    next_due: Duration,
    callback: TickFn,
    handle: CancelHandle,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    entries: Vec<Entry>,
}

/// Fake clock: nothing fires until [`advance`](Self::advance) is called.
///
/// Callbacks run on the caller's thread without the clock's lock held, so
/// they may schedule or cancel freely.
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<ManualClock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the fake clock.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of live (not cancelled) schedules.
    pub fn pending(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|e| !e.handle.is_cancelled())
            .count()
    }

    /// Move the clock forward by `by`, firing every tick that falls due in
    /// time order. Returns how many callbacks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        let mut fired = 0;

        loop {
            let due = {
                let mut clock = self.lock();
                clock.entries.retain(|e| !e.handle.is_cancelled());

                let next = clock
                    .entries
                    .iter_mut()
                    .filter(|e| e.next_due <= target)
                    .min_by_key(|e| e.next_due);

                match next {
                    Some(entry) => {
                        let due_at = entry.next_due;
                        entry.next_due += entry.interval;
                        let due = (entry.callback.clone(), entry.handle.clone());
                        clock.now = due_at;
                        Some(due)
                    }
                    None => {
                        clock.now = target;
                        None
                    }
                }
            };

            let Some((callback, handle)) = due else { break };
            if !handle.is_cancelled() {
                callback();
                fired += 1;
            }
        }

        fired
    }

    fn lock(&self) -> MutexGuard<'_, ManualClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval: Duration, callback: TickFn) -> CancelHandle {
        let interval = interval.max(MIN_INTERVAL);
        let handle = CancelHandle::new();
        let mut clock = self.lock();
        let next_due = clock.now + interval;
        clock.entries.push(Entry {
            interval,
            next_due,
            callback,
            handle: handle.clone(),
        });
        handle
    }
}

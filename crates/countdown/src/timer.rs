//! Verification-code countdown.
//!
//! A [`CountdownTimer`] is idle until [`send`](CountdownTimer::send) succeeds.
//! It then counts down once per tick interval, publishing a
//! [`CountdownState`] on every change, and returns to idle at zero.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::scheduler::{CancelHandle, Scheduler, TickFn};

/// Placeholder replaced by the remaining seconds in the wait template.
pub const SECONDS_PLACEHOLDER: &str = "{n}";

pub const DEFAULT_IDLE_TEXT: &str = "get code";
pub const DEFAULT_WAIT_TEMPLATE: &str = "{n}s";
pub const DEFAULT_DURATION_SECS: u32 = 120;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownConfig {
    /// Message shown while idle.
    pub idle_text: String,
    /// Message shown while counting; `{n}` becomes the remaining seconds.
    pub wait_template: String,
    /// Length of one countdown. Zero is treated as one.
    pub duration_secs: u32,
    pub tick_interval: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            idle_text: DEFAULT_IDLE_TEXT.to_string(),
            wait_template: DEFAULT_WAIT_TEMPLATE.to_string(),
            duration_secs: DEFAULT_DURATION_SECS,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl CountdownConfig {
    pub fn with_idle_text(mut self, text: impl Into<String>) -> Self {
        self.idle_text = text.into();
        self
    }

    pub fn with_wait_template(mut self, template: impl Into<String>) -> Self {
        self.wait_template = template.into();
        self
    }

    pub fn with_duration_secs(mut self, secs: u32) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn wait_message(&self, remaining: u32) -> String {
        self.wait_template
            .replace(SECONDS_PLACEHOLDER, &remaining.to_string())
    }

    fn duration(&self) -> u32 {
        self.duration_secs.max(1)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// What an observer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownState {
    /// `true` while counting; the trigger should not be pressable.
    pub disabled: bool,
    /// Seconds left; zero while idle.
    pub remaining_seconds: u32,
    pub message: String,
}

impl CountdownState {
    pub fn idle(config: &CountdownConfig) -> Self {
        Self {
            disabled: false,
            remaining_seconds: 0,
            message: config.idle_text.clone(),
        }
    }

    fn counting(config: &CountdownConfig, remaining: u32) -> Self {
        Self {
            disabled: true,
            remaining_seconds: remaining,
            message: config.wait_message(remaining),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Both preconditions passed and the countdown began.
    Started,
    /// A countdown, or a send, was already in progress. Nothing ran.
    AlreadyCounting,
}

#[derive(Debug, thiserror::Error)]
pub enum CountdownError {
    #[error("validation rejected the send: {0}")]
    Validate(#[source] anyhow::Error),

    #[error("code request failed: {0}")]
    Request(#[source] anyhow::Error),

    #[error("countdown has been shut down")]
    Closed,
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

/// Async check run before a countdown may start.
pub type Precondition = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`Precondition`].
pub fn precondition<F, Fut>(f: F) -> Precondition
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// The two checks `send` awaits, in order: validate the input, then request
/// the code. Both default to always passing.
#[derive(Clone)]
pub struct Preconditions {
    pub validate: Precondition,
    pub request: Precondition,
}

impl Default for Preconditions {
    fn default() -> Self {
        Self {
            validate: precondition(|| async { Ok(()) }),
            request: precondition(|| async { Ok(()) }),
        }
    }
}

impl Preconditions {
    pub fn new(validate: Precondition, request: Precondition) -> Self {
        Self { validate, request }
    }
}

// ---------------------------------------------------------------------------
// CountdownTimer
// ---------------------------------------------------------------------------

struct Inner {
    config: CountdownConfig,
    ticks: u32,
    /// Bumped on every start, reset and shutdown. Ticks from an older epoch
    /// are ignored.
    epoch: u64,
    sending: bool,
    closed: bool,
    handle: Option<CancelHandle>,
}

struct Shared {
    inner: Mutex<Inner>,
    state: watch::Sender<CountdownState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.closed || inner.epoch != epoch {
            return;
        }
        let live = inner.handle.as_ref().is_some_and(|h| !h.is_cancelled());
        if !live {
            return;
        }

        inner.ticks += 1;
        let remaining = inner.config.duration().saturating_sub(inner.ticks);
        if remaining == 0 {
            stop(&mut inner);
            self.state.send_replace(CountdownState::idle(&inner.config));
            tracing::info!("Countdown finished");
        } else {
            self.state
                .send_replace(CountdownState::counting(&inner.config, remaining));
        }
    }

    /// Cancel any running countdown and publish the idle state.
    fn reset(&self, inner: &mut Inner) {
        stop(inner);
        inner.epoch += 1;
        self.state.send_replace(CountdownState::idle(&inner.config));
    }
}

fn stop(inner: &mut Inner) {
    if let Some(handle) = inner.handle.take() {
        handle.cancel();
    }
    inner.ticks = 0;
}

/// Clears the in-flight flag however `send` exits.
struct SendingGuard<'a>(&'a Shared);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().sending = false;
    }
}

/// Send-code countdown bound to one scheduler.
///
/// Dropping the timer shuts it down: its schedule is cancelled and ticks
/// already in flight are discarded.
pub struct CountdownTimer {
    shared: Arc<Shared>,
    scheduler: Arc<dyn Scheduler>,
    preconditions: Preconditions,
}

impl CountdownTimer {
    pub fn new(
        config: CountdownConfig,
        preconditions: Preconditions,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let (state, _) = watch::channel(CountdownState::idle(&config));
        let inner = Inner {
            config,
            ticks: 0,
            epoch: 0,
            sending: false,
            closed: false,
            handle: None,
        };
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                state,
            }),
            scheduler,
            preconditions,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.shared.state.borrow().clone()
    }

    pub fn is_counting(&self) -> bool {
        self.shared.state.borrow().disabled
    }

    pub fn config(&self) -> CountdownConfig {
        self.shared.lock().config.clone()
    }

    /// Receive every future state.
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.shared.state.subscribe()
    }

    /// Run validate then request; on success start counting from the full
    /// duration.
    ///
    /// While counting, or while another send is awaiting its preconditions,
    /// this returns [`SendOutcome::AlreadyCounting`] without running them.
    /// A rejected precondition leaves the timer idle.
    pub async fn send(&self) -> Result<SendOutcome, CountdownError> {
        {
            let mut inner = self.shared.lock();
            if inner.closed {
                return Err(CountdownError::Closed);
            }
            if inner.sending || inner.handle.is_some() {
                tracing::debug!("Send ignored, countdown already running");
                return Ok(SendOutcome::AlreadyCounting);
            }
            inner.sending = true;
        }
        let _guard = SendingGuard(&self.shared);

        (self.preconditions.validate)()
            .await
            .map_err(CountdownError::Validate)?;
        (self.preconditions.request)()
            .await
            .map_err(CountdownError::Request)?;

        self.start()
    }

    fn start(&self) -> Result<SendOutcome, CountdownError> {
        let mut inner = self.shared.lock();
        inner.sending = false;
        if inner.closed {
            return Err(CountdownError::Closed);
        }

        stop(&mut inner);
        inner.epoch += 1;
        let epoch = inner.epoch;
        let duration = inner.config.duration();
        self.shared
            .state
            .send_replace(CountdownState::counting(&inner.config, duration));

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let callback: TickFn = Arc::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.tick(epoch);
            }
        });
        let handle = self
            .scheduler
            .schedule_repeating(inner.config.tick_interval, callback);
        inner.handle = Some(handle);

        tracing::info!(duration_secs = duration, "Countdown started");
        Ok(SendOutcome::Started)
    }

    /// Cancel any running countdown and return to idle.
    pub fn reset(&self) {
        let mut inner = self.shared.lock();
        self.shared.reset(&mut inner);
        tracing::debug!("Countdown reset");
    }

    /// Cancel the countdown for good. Later sends fail with
    /// [`CountdownError::Closed`]. Calling it again is a no-op.
    pub fn shutdown(&self) {
        let mut inner = self.shared.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        self.shared.reset(&mut inner);
        tracing::debug!("Countdown shut down");
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

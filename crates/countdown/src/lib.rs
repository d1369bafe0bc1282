//! Send-code countdown timer.
//!
//! The timer logic is independent of wall-clock time: it runs on any
//! [`Scheduler`], either [`TokioScheduler`] in production or
//! [`ManualScheduler`] when ticks must be driven by hand.

pub mod scheduler;
pub mod timer;

pub use scheduler::{CancelHandle, ManualScheduler, Scheduler, TickFn, TokioScheduler};
pub use timer::{
    precondition, CountdownConfig, CountdownError, CountdownState, CountdownTimer, Precondition,
    Preconditions, SendOutcome,
};

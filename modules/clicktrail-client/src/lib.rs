//! Browser-side half of the telemetry pipeline.
//!
//! Signals enter through [`PageSession`], high-frequency ones pass through a
//! [`Debounced`] wrapper, and each reportable event is sent by the
//! [`Dispatcher`], which mirrors the newest log line into a [`LogMirror`].

pub mod dispatcher;
pub mod error;
pub mod mirror;
pub mod rate_limit;
pub mod session;
pub mod signals;

pub use dispatcher::{Dispatcher, Recorded};
pub use error::{DispatchError, Result, Stage};
pub use mirror::{LogMirror, MemoryMirror};
pub use rate_limit::{debounce, throttle, Debounced, Throttled};
pub use session::{ExitSummary, PageSession, RecordHandle, SessionConfig, SessionTimers};
pub use signals::{ClickTarget, PlayerState, ScriptError, ScrollPosition, Signal};

//! Page-lifetime capture state.
//!
//! A [`PageSession`] is created on page load and dropped on unload. It owns the
//! session timers as a plain value, replaced on every focus and blur by the pure
//! transitions on [`SessionTimers`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::dispatcher::{Dispatcher, Recorded};
use crate::rate_limit::{debounce, Debounced};
use crate::signals::{ClickTarget, PlayerState, ScriptError, ScrollPosition, Signal};

pub type RecordHandle = JoinHandle<crate::Result<Recorded>>;

const DEFAULT_CAPTURE_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period for scroll, mouse-out and form input before one event is sent.
    pub capture_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capture_delay: DEFAULT_CAPTURE_DELAY,
        }
    }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// Focus bookkeeping for one page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimers {
    entered_at: DateTime<Utc>,
    focused_at: Option<DateTime<Utc>>,
    blurred_at: Option<DateTime<Utc>>,
    inactive_total: Duration,
}

/// Time on page at unload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSummary {
    pub spent: Duration,
    pub active: Duration,
    pub inactive: Duration,
}

impl SessionTimers {
    /// A page counts as focused from the moment it loads.
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            entered_at: now,
            focused_at: Some(now),
            blurred_at: None,
            inactive_total: Duration::ZERO,
        }
    }

    /// Returns the new timers and how long the window was unfocused.
    #[must_use]
    pub fn focused(self, now: DateTime<Utc>) -> (Self, Duration) {
        let inactive = self
            .blurred_at
            .map(|since| span(since, now))
            .unwrap_or(Duration::ZERO);
        let next = Self {
            focused_at: Some(now),
            blurred_at: None,
            inactive_total: self.inactive_total + inactive,
            ..self
        };
        (next, inactive)
    }

    /// Returns the new timers and how long the window was focused.
    #[must_use]
    pub fn blurred(self, now: DateTime<Utc>) -> (Self, Duration) {
        let active = self
            .focused_at
            .map(|since| span(since, now))
            .unwrap_or(Duration::ZERO);
        let next = Self {
            focused_at: None,
            blurred_at: Some(now),
            ..self
        };
        (next, active)
    }

    /// Only completed blur periods count as inactive.
    pub fn exit_summary(&self, now: DateTime<Utc>) -> ExitSummary {
        let spent = span(self.entered_at, now);
        ExitSummary {
            spent,
            active: spent.saturating_sub(self.inactive_total),
            inactive: self.inactive_total,
        }
    }

    pub fn inactive_total(&self) -> Duration {
        self.inactive_total
    }
}

// A clock step backwards reads as zero.
fn span(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}

// ---------------------------------------------------------------------------
// Page session
// ---------------------------------------------------------------------------

/// Turns raw page signals into dispatched events.
///
/// Immediate signals return the handle of the detached dispatch; callers may
/// drop it. Scroll, mouse-out and form input are debounced and return nothing.
pub struct PageSession {
    dispatcher: Arc<Dispatcher>,
    timers: SessionTimers,
    clicks: u64,
    scroll: Debounced<Signal>,
    mouse_out: Debounced<Signal>,
    input: Debounced<Signal>,
}

impl PageSession {
    pub fn start(dispatcher: Arc<Dispatcher>, config: SessionConfig, now: DateTime<Utc>) -> Self {
        let debounced = |dispatcher: &Arc<Dispatcher>| {
            let dispatcher = Arc::clone(dispatcher);
            debounce(
                move |signal: Signal| {
                    report(&dispatcher, &signal);
                },
                config.capture_delay,
            )
        };

        Self {
            scroll: debounced(&dispatcher),
            mouse_out: debounced(&dispatcher),
            input: debounced(&dispatcher),
            dispatcher,
            timers: SessionTimers::start(now),
            clicks: 0,
        }
    }

    pub fn timers(&self) -> SessionTimers {
        self.timers
    }

    pub fn clicks(&self) -> u64 {
        self.clicks
    }

    pub fn on_focus(&mut self, now: DateTime<Utc>) -> Option<RecordHandle> {
        let (timers, inactive) = self.timers.focused(now);
        self.timers = timers;
        report(&self.dispatcher, &Signal::WindowFocused { inactive })
    }

    pub fn on_blur(&mut self, now: DateTime<Utc>) -> Option<RecordHandle> {
        let (timers, active) = self.timers.blurred(now);
        self.timers = timers;
        report(&self.dispatcher, &Signal::WindowBlurred { active })
    }

    pub fn on_click(&mut self, target: ClickTarget) -> Option<RecordHandle> {
        self.clicks += 1;
        report(
            &self.dispatcher,
            &Signal::Click {
                count: self.clicks,
                target,
            },
        )
    }

    pub fn on_page_loaded(&self, path: &str, load_time_ms: f64) -> Option<RecordHandle> {
        report(
            &self.dispatcher,
            &Signal::PageView {
                path: path.to_string(),
                load_time_ms,
            },
        )
    }

    pub fn on_unload(&self, now: DateTime<Utc>, path: &str) -> Option<RecordHandle> {
        report(
            &self.dispatcher,
            &Signal::PageExit {
                path: path.to_string(),
                summary: self.timers.exit_summary(now),
            },
        )
    }

    pub fn on_scroll(&self, position: ScrollPosition) {
        self.scroll.call(Signal::Scroll(position));
    }

    /// Reported only if the last mouse-out of a burst left the document.
    pub fn on_mouse_out(&self, left_document: bool) {
        self.mouse_out.call(Signal::MouseOut { left_document });
    }

    pub fn on_search(&self, term: &str) -> Option<RecordHandle> {
        report(
            &self.dispatcher,
            &Signal::SearchQuery {
                term: term.to_string(),
            },
        )
    }

    pub fn on_input(&self, field: &str, value: &str) {
        self.input.call(Signal::FormInput {
            field: field.to_string(),
            value: value.to_string(),
        });
    }

    pub fn on_script_error(&self, error: ScriptError) -> Option<RecordHandle> {
        report(&self.dispatcher, &Signal::ScriptError(error))
    }

    pub fn on_player_state(&self, state: PlayerState) -> Option<RecordHandle> {
        report(&self.dispatcher, &Signal::Player(state))
    }
}

fn report(dispatcher: &Arc<Dispatcher>, signal: &Signal) -> Option<RecordHandle> {
    let Some((kind, payload)) = signal.event() else {
        debug!(?signal, "Signal not reportable");
        return None;
    };
    Some(dispatcher.spawn_record(kind.as_str(), payload))
}

//! Raw page signals and how each one reads in the event log.

use std::time::Duration;

use clicktrail_common::EventKind;

use crate::session::ExitSummary;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClickTarget {
    pub tag_name: String,
    pub class_name: String,
    pub id: String,
}

/// Scroll offsets in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    pub scroll_y: f64,
    pub scroll_height: f64,
    pub viewport_height: f64,
}

impl ScrollPosition {
    /// How far down the scrollable range the viewport is, in percent.
    /// A page shorter than its viewport reads as 0.
    pub fn percent(&self) -> f64 {
        let range = self.scroll_height - self.viewport_height;
        if range <= 0.0 {
            return 0.0;
        }
        self.scroll_y / range * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub message: String,
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

/// Embedded video player states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    WindowFocused { inactive: Duration },
    WindowBlurred { active: Duration },
    Click { count: u64, target: ClickTarget },
    PageView { path: String, load_time_ms: f64 },
    PageExit { path: String, summary: ExitSummary },
    Scroll(ScrollPosition),
    /// `left_document` is false when the pointer only moved onto another element.
    MouseOut { left_document: bool },
    SearchQuery { term: String },
    FormInput { field: String, value: String },
    ScriptError(ScriptError),
    Player(PlayerState),
}

impl Signal {
    /// The event this signal reports, or `None` when it is not worth reporting.
    pub fn event(&self) -> Option<(EventKind, String)> {
        let event = match self {
            Signal::WindowFocused { inactive } => (
                EventKind::Window,
                format!("Window Focused -- Was Deactive: {} s", seconds(*inactive)),
            ),
            Signal::WindowBlurred { active } => (
                EventKind::Window,
                format!("Window Blurred -- Was Active: {} s", seconds(*active)),
            ),
            Signal::Click { count, target } => (
                EventKind::Click,
                format!(
                    "Click Count: {count}, Target Tag: {}, Target Class: {}, Target ID: {}",
                    target.tag_name, target.class_name, target.id
                ),
            ),
            Signal::PageView { path, load_time_ms } => (
                EventKind::Page,
                format!("Page: {path} -- Load Time: {load_time_ms}"),
            ),
            Signal::PageExit { path, summary } => (
                EventKind::Page,
                format!(
                    "Spent Time: {} s on {path}-- Active Time: {} s -- Deactive Time: {} s",
                    seconds(summary.spent),
                    seconds(summary.active),
                    seconds(summary.inactive),
                ),
            ),
            Signal::Scroll(position) => (EventKind::Scroll, format!("%{:.2}", position.percent())),
            Signal::MouseOut { left_document } => {
                if !left_document {
                    return None;
                }
                (EventKind::Mouse, "Mouse Out".to_string())
            }
            Signal::SearchQuery { term } => (EventKind::SearchQuery, format!("Input: {term}")),
            Signal::FormInput { field, value } => {
                (EventKind::Form, format!("Field: {field} -- Input: {value}"))
            }
            Signal::ScriptError(err) => (
                EventKind::Error,
                format!(
                    "Info: {} at {}:{}:{}",
                    err.message, err.filename, err.line, err.column
                ),
            ),
            Signal::Player(state) => {
                let payload = match state {
                    PlayerState::Playing => "Video Played",
                    PlayerState::Paused => "Video Paused",
                    _ => return None,
                };
                (EventKind::Player, payload.to_string())
            }
        };
        Some(event)
    }
}

/// Seconds with millisecond resolution, without trailing zeros: `1.5`, `2`, `0.25`.
pub fn seconds(span: Duration) -> String {
    let secs = span.as_millis() as f64 / 1000.0;
    format!("{secs}")
}

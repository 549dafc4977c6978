use std::fmt;

use serde::{Deserialize, Serialize};

// --- Wire record ---

/// The body of `POST /api/events`.
///
/// Field names follow the browser's JSON convention (`eventType`, `deviceInfo`),
/// everything else in the workspace uses snake_case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "eventType")]
    pub event_type: String,
    pub data: String,
    #[serde(rename = "deviceInfo")]
    pub device_info: String,
}

impl EventRecord {
    pub fn new(
        event_type: impl Into<String>,
        data: impl Into<String>,
        environment: &Environment,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            device_info: environment.to_string(),
        }
    }
}

/// Response body of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestAck {
    pub message: String,
}

impl IngestAck {
    pub fn recorded(event_type: &str) -> Self {
        Self {
            message: format!("{event_type} Recorded"),
        }
    }
}

// --- Environment descriptor ---

/// Device description computed once per page session and attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub screen_width: u32,
    pub screen_height: u32,
    pub user_agent: String,
    pub locale: String,
}

impl Environment {
    pub fn new(
        screen_width: u32,
        screen_height: u32,
        user_agent: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            screen_width,
            screen_height,
            user_agent: user_agent.into(),
            locale: locale.into(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.screen_width, self.screen_height, self.user_agent, self.locale
        )
    }
}

// --- Event kinds ---

/// Coarse event categories. Sent as the `eventType` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Window,
    Click,
    Page,
    Scroll,
    Mouse,
    SearchQuery,
    Form,
    Error,
    Player,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Window => "Window Action",
            EventKind::Click => "Click Action",
            EventKind::Page => "Page Action",
            EventKind::Scroll => "Scroll Action",
            EventKind::Mouse => "Mouse Action",
            EventKind::SearchQuery => "Search Query",
            EventKind::Form => "Form Action",
            EventKind::Error => "Error",
            EventKind::Player => "Player Action",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

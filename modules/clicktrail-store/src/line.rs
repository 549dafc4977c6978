use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use clicktrail_common::EventRecord;

/// Render one log line, newline included.
///
/// `<eventType> -- <data> -- IP: <ip> -- Device: <deviceInfo> -- TIME: <ISO-8601>`
pub fn render_line(record: &EventRecord, sender: &str, received_at: DateTime<Utc>) -> String {
    format!(
        "{} -- {} -- IP: {} -- Device: {} -- TIME: {}\n",
        single_line(&record.event_type),
        single_line(&record.data),
        single_line(sender),
        single_line(&record.device_info),
        received_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

// A CR or LF inside a field would split one event across two lines.
fn single_line(field: &str) -> Cow<'_, str> {
    if !field.contains(['\r', '\n']) {
        return Cow::Borrowed(field);
    }
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

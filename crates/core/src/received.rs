//! Human-readable "time ago" strings for message receipt times.

use chrono::Utc;

use crate::message::Message;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Render how long ago each message was received, relative to now.
///
/// The output has one entry per message, in input order.
pub fn received_details(messages: &[Message]) -> Vec<String> {
    received_details_at(messages, Utc::now().timestamp())
}

/// Same as [`received_details`] with an explicit clock (epoch seconds).
pub fn received_details_at(messages: &[Message], now: i64) -> Vec<String> {
    messages
        .iter()
        .map(|m| format_elapsed(now.saturating_sub(m.received_at).max(0)))
        .collect()
}

fn format_elapsed(secs: i64) -> String {
    if secs < 30 {
        "Less than 30s ago".to_owned()
    } else if secs < MINUTE {
        format!("{secs}s ago")
    } else if secs < HOUR {
        format!("{}m ago", secs / MINUTE)
    } else if secs < DAY {
        format!("{}h {}m ago", secs / HOUR, (secs % HOUR) / MINUTE)
    } else {
        format!("{}d {}h ago", secs / DAY, (secs % DAY) / HOUR)
    }
}

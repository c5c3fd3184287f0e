use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Board payloads.
pub mod board;
/// Game payloads and listing queries.
pub mod game;
/// Health check payload.
pub mod health;
/// Message payloads.
pub mod message;
/// Player and admin payloads.
pub mod player;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp. Callers validate the format beforehand.
fn parse_system_time(value: &str) -> Option<SystemTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .ok()
        .map(SystemTime::from)
}

//! Voltage events listed in the report's Event Summary section.

use serde::Serialize;
use std::fmt;

/// Event categories a PQ meter records.
#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Swell,
    Dip,
    Interruption,
    Transient,
}

impl EventType {
    /// Parse a report cell, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "swell" => Some(EventType::Swell),
            "dip" => Some(EventType::Dip),
            "interruption" => Some(EventType::Interruption),
            "transient" => Some(EventType::Transient),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventType::Swell => "Swell",
            EventType::Dip => "Dip",
            EventType::Interruption => "Interruption",
            EventType::Transient => "Transient",
        };
        f.write_str(s)
    }
}

/// One row of the Event Summary table. Start time, duration and deviation
/// are kept verbatim — formats vary between meter firmware versions.
#[derive(Serialize, Clone, Debug)]
pub struct PowerEvent {
    pub event_type: EventType,
    pub phase: String,
    pub start_time: String,
    pub duration: String,
    pub deviation_pct: String,
}

/// Headline counts shown with the event table.
#[derive(Serialize, Clone, Copy, Debug, Default)]
pub struct EventStats {
    pub total: usize,
    pub swells: usize,
    pub dips: usize,
}

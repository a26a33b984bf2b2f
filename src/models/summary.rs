//! Header metadata and weekly-summary shapes extracted from a report.

use serde::Serialize;

/// Fields printed in the report header block on the first page.
/// Everything is optional — older firmware omits lines.
#[derive(Serialize, Clone, Debug, Default)]
pub struct ReportInfo {
    /// `Start time: DD-MM-YYYY hh:mm:ss AM/PM`
    pub start_time: Option<String>,
    /// `End time: …`, same format.
    pub end_time: Option<String>,
    /// GMT offset, e.g. `+05:30`.
    pub gmt: Option<String>,
    /// Report generator version.
    pub version: Option<String>,
    pub feeder_name: Option<String>,
    pub network_nominal: Option<String>,
}

/// Site identity recovered from the filename and first-page text.
#[derive(Serialize, Clone, Debug, Default)]
pub struct ReportIdentity {
    /// First parenthesised group of the filename, e.g. `TATA Block-15 Bay-09`.
    pub component: Option<String>,
    /// Block number.
    pub block: Option<String>,
    /// Feeder or bay number.
    pub feeder: Option<String>,
    /// Utility company name.
    pub company: Option<String>,
}

/// One day's worth of THD (voltage) or TDD (current) distortion values.
#[derive(Serialize, Clone, Debug)]
pub struct DailyDistortion {
    /// `DD-MM-YYYY`.
    pub day: String,
    /// Three phase values in percent, R/Y/B order.
    pub phases: [f64; 3],
}

/// Compliance view of a [`DailyDistortion`] row against the daily limit.
#[derive(Serialize, Clone, Debug)]
pub struct DailyCompliance {
    pub day: String,
    pub limit_pct: f64,
    pub r_phase_pct: f64,
    pub y_phase_pct: f64,
    pub b_phase_pct: f64,
    pub within_limits: bool,
    pub remarks: String,
}

/// One row of the generating / non-generating hours schedule.
#[derive(Serialize, Clone, Debug)]
pub struct ScheduleRow {
    pub index: usize,
    /// `DD/MM/YYYY`.
    pub date_from: String,
    /// `hh:mm AM/PM`.
    pub from: String,
    pub date_to: String,
    pub to: String,
    pub description: String,
}

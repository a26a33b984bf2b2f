//! Harmonic measurement tables as they appear in PQ reports.

use serde::Serialize;
use std::fmt;

/// The four harmonic tables a report carries.
///
/// Voltage tables measure V1N/V2N/V3N distortion, current tables I1/I2/I3
/// demand distortion; each exists over the full report range and per day.
#[derive(Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    VoltageFull,
    CurrentFull,
    VoltageDaily,
    CurrentDaily,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::VoltageFull,
        TableKind::CurrentFull,
        TableKind::VoltageDaily,
        TableKind::CurrentDaily,
    ];

    /// Section title as printed in the report.
    pub fn title(self) -> &'static str {
        match self {
            TableKind::VoltageFull => "Harmonic Voltage Full Time Range",
            TableKind::CurrentFull => "Harmonic Current Full Time Range",
            TableKind::VoltageDaily => "Harmonic Voltage Daily",
            TableKind::CurrentDaily => "Harmonic Current Daily",
        }
    }

    /// Compact sheet-name code: V/I for circuit, F/D for time range.
    pub fn abbrev(self) -> &'static str {
        match self {
            TableKind::VoltageFull => "VF",
            TableKind::CurrentFull => "IF",
            TableKind::VoltageDaily => "VD",
            TableKind::CurrentDaily => "ID",
        }
    }

    pub fn is_current(self) -> bool {
        matches!(self, TableKind::CurrentFull | TableKind::CurrentDaily)
    }

    /// Column labels for the three measured phases.
    pub fn phase_labels(self) -> [&'static str; 3] {
        if self.is_current() {
            ["I1", "I2", "I3"]
        } else {
            ["V1N", "V2N", "V3N"]
        }
    }

    /// Headings that terminate this table's section in the report text.
    ///
    /// Matched against uppercased page text. `HARMONIC 5:` looks like a
    /// heading but occurs inside the Harmonic Current Daily body, so it is
    /// deliberately absent from that kind's list.
    pub fn boundaries(self) -> &'static [&'static str] {
        match self {
            TableKind::VoltageFull => &[
                "SUMMARY",
                "TOTAL HARMONIC VOLTAGE FULL TIME RANGE",
                "TOTAL HARMONIC DISTORTION FULL TIME RANGE",
                "HARMONIC CURRENT FULL TIME RANGE",
            ],
            TableKind::CurrentFull => &[
                "TOTAL HARMONIC DISTORTION DAILY",
                "TDD FULL TIME RANGE",
                "HARMONIC VOLTAGE DAILY",
                "TRANSIENT",
            ],
            TableKind::VoltageDaily => &[
                "TOTAL HARMONIC DISTORTION FULL TIME RANGE",
                "TOTAL HARMONIC VOLTAGE FULL TIME RANGE",
                "HARMONIC CURRENT DAILY",
                "TOTAL HARMONIC DISTORTION DAILY",
            ],
            TableKind::CurrentDaily => &[
                "TDD FULL TIME RANGE",
                "TDD DAILY",
                "TRANSIENT",
                "FLICKER SEVERITY",
            ],
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Per-phase compliance verdict printed next to a measurement.
#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// The report row carried measurements but no verdict column.
    NotReported,
}

/// One verdict cell, e.g. `Pass(99.5%)` — the percentage is the share of
/// time the phase stayed within the limit.
#[derive(Serialize, Clone, Copy, Debug)]
pub struct PhaseResult {
    pub verdict: Verdict,
    pub within_pct: Option<f64>,
}

impl PhaseResult {
    pub fn not_reported() -> Self {
        Self {
            verdict: Verdict::NotReported,
            within_pct: None,
        }
    }

    pub fn is_fail(&self) -> bool {
        self.verdict == Verdict::Fail
    }
}

impl fmt::Display for PhaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self.verdict {
            Verdict::Pass => "Pass",
            Verdict::Fail => "Fail",
            Verdict::NotReported => return f.write_str("N/A"),
        };
        match self.within_pct {
            Some(pct) => write!(f, "{}({}%)", word, pct),
            None => f.write_str(word),
        }
    }
}

/// One row of a harmonic table: harmonic order N at a statistical time
/// limit (95th or 99th percentile), the regulatory maximum, and the three
/// measured phases with their verdicts.
#[derive(Serialize, Clone, Debug)]
pub struct HarmonicRow {
    /// Harmonic order, 2..=50.
    pub n: u32,

    /// Time-limit percentile the row applies to (95 or 99).
    pub percentile: u8,

    /// Regulatory maximum in percent.
    pub reg_max_pct: f64,

    /// Measured distortion per phase, in percent.
    pub measured_pct: [f64; 3],

    /// Verdict per phase, same order as `measured_pct`.
    pub results: [PhaseResult; 3],
}

impl HarmonicRow {
    /// A phase violates when the measurement exceeds the regulatory
    /// maximum or the report itself marked it as failed.
    pub fn phase_violates(&self, idx: usize) -> bool {
        self.measured_pct[idx] > self.reg_max_pct || self.results[idx].is_fail()
    }
}

//! src/services/analysis_service.rs
//!
//! Shaping and compliance checking of extracted report data: harmonic row
//! cleaning, percentile/parity splits, limit-violation detection, daily
//! THD/TDD compliance remarks and the generating-hours schedule table.

use crate::models::{
    event::{EventStats, PowerEvent},
    harmonic::{HarmonicRow, TableKind},
    summary::{DailyCompliance, DailyDistortion, ReportInfo, ScheduleRow},
};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

/// Harmonic orders a report is expected to cover.
pub const EXPECTED_HARMONICS: std::ops::RangeInclusive<u32> = 2..=50;

/// Daily limit for voltage THD, percent.
pub const VOLTAGE_THD_DAILY_LIMIT: f64 = 7.5;
/// Daily limit for current TDD, percent.
pub const CURRENT_TDD_DAILY_LIMIT: f64 = 10.0;

/// Timestamp format of the report header, e.g. `14-05-2025 06:00:00 AM`.
const REPORT_TIME_FORMAT: &str = "%d-%m-%Y %I:%M:%S %p";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("report period not found: the header carries no parseable start/end time")]
    MissingPeriod,
    #[error("invalid report timestamp `{0}`")]
    BadTimestamp(String),
}

/// Drop out-of-range harmonics and duplicate `(N, percentile)` rows, then
/// order by harmonic and percentile.
pub fn clean_rows(rows: Vec<HarmonicRow>) -> Vec<HarmonicRow> {
    let mut seen = std::collections::HashSet::new();
    let mut cleaned: Vec<HarmonicRow> = rows
        .into_iter()
        .filter(|row| EXPECTED_HARMONICS.contains(&row.n))
        .filter(|row| seen.insert((row.n, row.percentile)))
        .collect();
    cleaned.sort_by_key(|row| (row.n, row.percentile));
    cleaned
}

/// A table split into odd and even harmonic orders.
#[derive(Serialize, Clone, Debug, Default)]
pub struct OddEven {
    pub odd: Vec<HarmonicRow>,
    pub even: Vec<HarmonicRow>,
}

/// A table split by statistical time limit, then parity.
#[derive(Serialize, Clone, Debug, Default)]
pub struct SplitTables {
    pub p95: OddEven,
    pub p99: OddEven,
}

/// Partition rows by percentile (95 / 99) and odd/even harmonic order.
pub fn split_rows(rows: &[HarmonicRow]) -> SplitTables {
    let mut split = SplitTables::default();
    for row in rows {
        let limit = match row.percentile {
            95 => &mut split.p95,
            99 => &mut split.p99,
            _ => continue,
        };
        if row.n % 2 == 1 {
            limit.odd.push(row.clone());
        } else {
            limit.even.push(row.clone());
        }
    }
    split
}

/// Which expected harmonics of the given parity are absent from the rows.
pub fn missing_harmonics(rows: &[HarmonicRow], odd: bool) -> Vec<u32> {
    let present: std::collections::HashSet<u32> = rows.iter().map(|row| row.n).collect();
    EXPECTED_HARMONICS
        .filter(|n| (n % 2 == 1) == odd)
        .filter(|n| !present.contains(n))
        .collect()
}

/// One harmonic limit exceedance.
#[derive(Serialize, Clone, Debug)]
pub struct Violation {
    pub harmonic: u32,
    pub phase: String,
    pub percentile: u8,
    pub allowed_pct: f64,
    pub measured_pct: f64,
    pub exceedance_pct: f64,
    pub table: String,
}

/// Collect limit violations across all extracted tables, worst first.
pub fn collect_violations(
    tables: &std::collections::BTreeMap<TableKind, Vec<HarmonicRow>>,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (kind, rows) in tables {
        let labels = kind.phase_labels();
        for row in rows {
            for (idx, label) in labels.iter().enumerate() {
                if !row.phase_violates(idx) {
                    continue;
                }
                violations.push(Violation {
                    harmonic: row.n,
                    phase: (*label).to_string(),
                    percentile: row.percentile,
                    allowed_pct: row.reg_max_pct,
                    measured_pct: row.measured_pct[idx],
                    exceedance_pct: row.measured_pct[idx] - row.reg_max_pct,
                    table: kind.title().to_string(),
                });
            }
        }
    }
    violations.sort_by(|a, b| {
        b.exceedance_pct
            .partial_cmp(&a.exceedance_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.harmonic.cmp(&a.harmonic))
    });
    violations
}

/// Check daily distortion rows against the regulatory daily limit.
pub fn daily_compliance(rows: &[DailyDistortion], limit_pct: f64) -> Vec<DailyCompliance> {
    rows.iter()
        .map(|row| {
            let within = row.phases.iter().all(|&value| value <= limit_pct);
            DailyCompliance {
                day: row.day.clone(),
                limit_pct,
                r_phase_pct: row.phases[0],
                y_phase_pct: row.phases[1],
                b_phase_pct: row.phases[2],
                within_limits: within,
                remarks: if within {
                    "All values within limits".to_string()
                } else {
                    "Some values exceed limits".to_string()
                },
            }
        })
        .collect()
}

/// Headline counts for the event table.
pub fn event_stats(events: &[PowerEvent]) -> EventStats {
    use crate::models::event::EventType;
    EventStats {
        total: events.len(),
        swells: events
            .iter()
            .filter(|e| e.event_type == EventType::Swell)
            .count(),
        dips: events
            .iter()
            .filter(|e| e.event_type == EventType::Dip)
            .count(),
    }
}

/// Build the generating / non-generating hours schedule from the report
/// period: one row for the whole 7-day window, then per day a generating
/// row (06:00 AM - 06:30 PM) and a non-generating row (06:30 PM - 06:00 AM
/// next day).
///
/// Fails when the header times are absent or unparseable — a schedule made
/// of invented dates is worse than none.
pub fn schedule_table(info: &ReportInfo) -> Result<Vec<ScheduleRow>, AnalysisError> {
    let start_raw = info.start_time.as_deref().ok_or(AnalysisError::MissingPeriod)?;
    let end_raw = info.end_time.as_deref().ok_or(AnalysisError::MissingPeriod)?;
    let start = parse_report_time(start_raw)?;
    let end = parse_report_time(end_raw)?;

    let mut rows = vec![ScheduleRow {
        index: 1,
        date_from: start.format("%d/%m/%Y").to_string(),
        from: start.format("%I:%M %p").to_string(),
        date_to: end.format("%d/%m/%Y").to_string(),
        to: end.format("%I:%M %p").to_string(),
        description: "7 Days Report".to_string(),
    }];

    for day in 0..7 {
        let date = start.date() + Duration::days(day);
        let next = date + Duration::days(1);

        rows.push(ScheduleRow {
            index: rows.len() + 1,
            date_from: date.format("%d/%m/%Y").to_string(),
            from: "06:00 AM".to_string(),
            date_to: date.format("%d/%m/%Y").to_string(),
            to: "06:30 PM".to_string(),
            description: format!(
                "Day {} ({}) Generating Hours",
                day + 1,
                date.format("%d-%m-%Y")
            ),
        });
        rows.push(ScheduleRow {
            index: rows.len() + 1,
            date_from: date.format("%d/%m/%Y").to_string(),
            from: "06:30 PM".to_string(),
            date_to: next.format("%d/%m/%Y").to_string(),
            to: "06:00 AM".to_string(),
            description: format!(
                "Night {} ({} to {}) Non-Generating Hours",
                day + 1,
                date.format("%d-%m-%Y"),
                next.format("%d-%m-%Y")
            ),
        });
    }

    Ok(rows)
}

fn parse_report_time(raw: &str) -> Result<NaiveDateTime, AnalysisError> {
    NaiveDateTime::parse_from_str(raw, REPORT_TIME_FORMAT)
        .map_err(|_| AnalysisError::BadTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::harmonic::{PhaseResult, Verdict};

    fn row(n: u32, percentile: u8, reg_max: f64, measured: [f64; 3]) -> HarmonicRow {
        HarmonicRow {
            n,
            percentile,
            reg_max_pct: reg_max,
            measured_pct: measured,
            results: [PhaseResult::not_reported(); 3],
        }
    }

    #[test]
    fn clean_drops_out_of_range_and_duplicates() {
        let rows = vec![
            row(1, 95, 5.0, [90.0, 90.0, 90.0]),
            row(2025, 95, 5.0, [1.0, 1.0, 1.0]),
            row(3, 95, 5.0, [1.0, 1.0, 1.0]),
            row(3, 95, 5.0, [9.0, 9.0, 9.0]),
            row(3, 99, 5.0, [1.5, 1.5, 1.5]),
            row(2, 95, 5.0, [0.5, 0.5, 0.5]),
        ];
        let cleaned = clean_rows(rows);
        let keys: Vec<(u32, u8)> = cleaned.iter().map(|r| (r.n, r.percentile)).collect();
        assert_eq!(keys, vec![(2, 95), (3, 95), (3, 99)]);
        // first occurrence wins
        assert_eq!(cleaned[1].measured_pct[0], 1.0);
    }

    #[test]
    fn split_partitions_by_percentile_and_parity() {
        let rows = vec![
            row(2, 95, 5.0, [0.1; 3]),
            row(3, 95, 5.0, [0.1; 3]),
            row(4, 99, 5.0, [0.1; 3]),
            row(5, 99, 5.0, [0.1; 3]),
        ];
        let split = split_rows(&rows);
        assert_eq!(split.p95.even.len(), 1);
        assert_eq!(split.p95.odd.len(), 1);
        assert_eq!(split.p99.even[0].n, 4);
        assert_eq!(split.p99.odd[0].n, 5);
    }

    #[test]
    fn missing_harmonics_by_parity() {
        let rows: Vec<HarmonicRow> = (2..=50)
            .filter(|n| *n != 7 && *n != 8)
            .map(|n| row(n, 95, 5.0, [0.1; 3]))
            .collect();
        assert_eq!(missing_harmonics(&rows, true), vec![7]);
        assert_eq!(missing_harmonics(&rows, false), vec![8]);
    }

    #[test]
    fn violations_from_measurements_and_verdicts() {
        let mut tables = std::collections::BTreeMap::new();
        let mut failing = row(5, 95, 3.0, [2.0, 4.5, 1.0]);
        failing.results[2] = PhaseResult {
            verdict: Verdict::Fail,
            within_pct: Some(92.0),
        };
        tables.insert(TableKind::CurrentFull, vec![failing, row(7, 99, 3.0, [1.0; 3])]);

        let violations = collect_violations(&tables);
        assert_eq!(violations.len(), 2);
        // worst exceedance first
        assert_eq!(violations[0].phase, "I2");
        assert!((violations[0].exceedance_pct - 1.5).abs() < 1e-9);
        // verdict-only failure has non-positive exceedance but is reported
        assert_eq!(violations[1].phase, "I3");
        assert_eq!(violations[1].table, "Harmonic Current Full Time Range");
    }

    #[test]
    fn daily_compliance_remarks() {
        let rows = vec![
            DailyDistortion {
                day: "14-05-2025".into(),
                phases: [3.0, 4.0, 5.0],
            },
            DailyDistortion {
                day: "15-05-2025".into(),
                phases: [3.0, 8.0, 5.0],
            },
        ];
        let checked = daily_compliance(&rows, VOLTAGE_THD_DAILY_LIMIT);
        assert!(checked[0].within_limits);
        assert_eq!(checked[0].remarks, "All values within limits");
        assert!(!checked[1].within_limits);
        assert_eq!(checked[1].remarks, "Some values exceed limits");
    }

    #[test]
    fn schedule_covers_week_and_nights() {
        let info = ReportInfo {
            start_time: Some("14-05-2025 06:00:00 AM".into()),
            end_time: Some("21-05-2025 06:00:00 AM".into()),
            ..ReportInfo::default()
        };
        let rows = schedule_table(&info).unwrap();
        // 1 period row + 7 generating + 7 non-generating
        assert_eq!(rows.len(), 15);
        assert_eq!(rows[0].description, "7 Days Report");
        assert_eq!(rows[0].date_from, "14/05/2025");
        assert_eq!(rows[0].to, "06:00 AM");
        assert_eq!(rows[1].description, "Day 1 (14-05-2025) Generating Hours");
        assert_eq!(
            rows[2].description,
            "Night 1 (14-05-2025 to 15-05-2025) Non-Generating Hours"
        );
        assert_eq!(rows[2].date_to, "15/05/2025");
        assert_eq!(rows[14].date_to, "21/05/2025");
    }

    #[test]
    fn schedule_requires_a_parseable_period() {
        assert!(matches!(
            schedule_table(&ReportInfo::default()),
            Err(AnalysisError::MissingPeriod)
        ));

        let info = ReportInfo {
            start_time: Some("garbage".into()),
            end_time: Some("21-05-2025 06:00:00 AM".into()),
            ..ReportInfo::default()
        };
        assert!(matches!(
            schedule_table(&info),
            Err(AnalysisError::BadTimestamp(_))
        ));
    }

    #[test]
    fn event_stats_count_types() {
        use crate::models::event::{EventType, PowerEvent};
        let events = vec![
            PowerEvent {
                event_type: EventType::Swell,
                phase: "V1N".into(),
                start_time: "t".into(),
                duration: "0.05s".into(),
                deviation_pct: "12".into(),
            },
            PowerEvent {
                event_type: EventType::Dip,
                phase: "V2N".into(),
                start_time: "t".into(),
                duration: "0.10s".into(),
                deviation_pct: "-8".into(),
            },
            PowerEvent {
                event_type: EventType::Dip,
                phase: "V3N".into(),
                start_time: "t".into(),
                duration: "0.10s".into(),
                deviation_pct: "-9".into(),
            },
        ];
        let stats = event_stats(&events);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.swells, 1);
        assert_eq!(stats.dips, 2);
    }
}

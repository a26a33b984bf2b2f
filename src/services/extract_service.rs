//! src/services/extract_service.rs
//!
//! Text-level extraction of PQ report PDFs. A report is reduced to its
//! per-page plain text once, then regex passes recover the header block,
//! the four harmonic tables, the daily THD/TDD summaries and the event
//! summary. Table recovery is a small state machine: a section opens when
//! a page contains its title and stays active across pages until one of
//! its boundary headings appears.

use crate::models::{
    event::{EventType, PowerEvent},
    harmonic::{HarmonicRow, PhaseResult, TableKind, Verdict},
    summary::{DailyDistortion, ReportIdentity, ReportInfo},
};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read PDF text: {0}")]
    Pdf(String),
    #[error("PDF contains no pages")]
    Empty,
}

/// Extract the plain text of every page of a PDF payload.
pub fn pages_from_pdf(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|err| ExtractError::Pdf(err.to_string()))?;
    if pages.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(pages)
}

/// Does the filename look like a 7-day summary report?
///
/// Single-day reports ("Day 3 Night …") must not reach the weekly digest,
/// so the match is on explicit weekly markers only.
pub fn is_weekly_filename(filename: &str) -> bool {
    let upper = filename.to_ascii_uppercase();
    let patterns = [
        r"\b7\s*DAYS?\s+REPORT",
        r"\b7\s*DAYS?\s+SUMMARY",
        r"\bSEVEN\s*DAYS?\s+REPORT",
        r"\bWEEKLY\s+REPORT",
    ];
    patterns.iter().any(|pattern| {
        Regex::new(pattern)
            .expect("weekly filename regex is valid")
            .is_match(&upper)
    })
}

/// Parse the header block printed on the first page.
pub fn parse_report_info(first_page: &str) -> ReportInfo {
    let mut info = ReportInfo::default();

    let time_re = Regex::new(concat!(
        r"Start time:\s*(\d{2}-\d{2}-\d{4}\s*\d{2}:\d{2}:\d{2}\s*[AP]M)\s*",
        r"End time:\s*(\d{2}-\d{2}-\d{4}\s*\d{2}:\d{2}:\d{2}\s*[AP]M)\s*",
        r"GMT:\s*([+-]\d{2}:\d{2})\s*",
        r"Report Version:\s*([\d.]+)",
    ))
    .expect("report header regex is valid");
    if let Some(cap) = time_re.captures(first_page) {
        info.start_time = Some(cap[1].split_whitespace().collect::<Vec<_>>().join(" "));
        info.end_time = Some(cap[2].split_whitespace().collect::<Vec<_>>().join(" "));
        info.gmt = Some(cap[3].to_string());
        info.version = Some(cap[4].to_string());
    }

    let feeder_re =
        Regex::new(r"Feeder Name:\s*(.+?)(?:\n|Network)").expect("feeder name regex is valid");
    if let Some(cap) = feeder_re.captures(first_page) {
        info.feeder_name = Some(cap[1].trim().to_string());
    }

    let nominal_re = Regex::new(r"Network Nominal:\s*(.+?)(?:\n|Device)")
        .expect("network nominal regex is valid");
    if let Some(cap) = nominal_re.captures(first_page) {
        info.network_nominal = Some(cap[1].trim().to_string());
    }

    info
}

/// Recover the site identity from the filename plus first-page text.
pub fn parse_identity(filename: &str, first_page: &str) -> ReportIdentity {
    let mut identity = ReportIdentity::default();

    let component_re = Regex::new(r"\((.*?)\)").expect("component regex is valid");
    identity.component = component_re
        .captures(filename)
        .map(|cap| cap[1].to_string());

    let combined = format!("{} {}", filename, first_page).to_ascii_uppercase();

    let block_re = Regex::new(r"\bBLOCK[-\s]*(\d{1,3})\b").expect("block regex is valid");
    identity.block = block_re.captures(&combined).map(|cap| cap[1].to_string());

    let feeder_re = Regex::new(r"\b(FEEDER|BAY)[-\s]*(\d{1,3})\b").expect("feeder regex is valid");
    identity.feeder = feeder_re.captures(&combined).map(|cap| cap[2].to_string());

    let company_re = Regex::new(r"\b(TATA|ADANI|NTPC|RELIANCE|POWERGRID|TORRENT)\b")
        .expect("company regex is valid");
    identity.company = company_re.captures(&combined).map(|cap| cap[1].to_string());

    identity
}

/// The row patterns tried against harmonic table text, most specific
/// first: explicit Pass/Fail verdicts, bare parenthesised percentages,
/// then measurements without any verdict column.
struct RowPatterns {
    tidy: Regex,
    full: Regex,
    bare: Regex,
    measurements: Regex,
}

impl RowPatterns {
    fn new() -> Self {
        let num = r"([\d.]+)\s*,?\s*";
        let verdict = r"(Pass|Fail)\s*\(([\d.%]+)\)";
        let head = format!(r"(\d+)\s*,?\s*(\d+)\s*,?\s*{num}{num}{num}{num}");
        let full = format!(r"{head}{verdict}\s*,?\s*{verdict}\s*,?\s*{verdict}");
        let bare = format!(r"{head}\(([\d.%]+)\)\s*,?\s*\(([\d.%]+)\)\s*,?\s*\(([\d.%]+)\)");
        let measurements = format!(r"(\d+)\s*,?\s*(\d+)\s*,?\s*{num}{num}{num}([\d.]+)");

        Self {
            tidy: RegexBuilder::new(r"(Pass|Fail)\s*\(\s*([\d.%]+)\s*\)")
                .case_insensitive(true)
                .build()
                .expect("verdict tidy regex is valid"),
            full: RegexBuilder::new(&full)
                .case_insensitive(true)
                .build()
                .expect("full row regex is valid"),
            bare: RegexBuilder::new(&bare)
                .case_insensitive(true)
                .build()
                .expect("bare row regex is valid"),
            measurements: RegexBuilder::new(&measurements)
                .case_insensitive(true)
                .build()
                .expect("measurement row regex is valid"),
        }
    }
}

fn parse_verdict(word: &str, within: &str) -> PhaseResult {
    let verdict = if word.eq_ignore_ascii_case("fail") {
        Verdict::Fail
    } else {
        Verdict::Pass
    };
    PhaseResult {
        verdict,
        within_pct: within.trim_end_matches('%').parse().ok(),
    }
}

/// Accept only real harmonic orders. Rejects the fundamental (N=1) and
/// year-like values that leak out of date cells.
fn valid_harmonic(n: u32) -> bool {
    (2..=50).contains(&n)
}

/// Parse all harmonic rows out of a section of page text.
///
/// Patterns run most specific first and a `(N, percentile)` pair is only
/// taken once, so the loose measurement pattern cannot shadow a row the
/// verdict patterns already matched.
fn parse_rows(patterns: &RowPatterns, text: &str) -> Vec<HarmonicRow> {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let flat = patterns.tidy.replace_all(&flat, "${1}(${2})");

    let mut rows: Vec<HarmonicRow> = Vec::new();
    let mut seen: HashSet<(u32, u8)> = HashSet::new();

    let mut push = |row: HarmonicRow, seen: &mut HashSet<(u32, u8)>| {
        if valid_harmonic(row.n) && seen.insert((row.n, row.percentile)) {
            rows.push(row);
        }
    };

    for cap in patterns.full.captures_iter(&flat) {
        let (Ok(n), Ok(percentile)) = (cap[1].parse(), cap[2].parse()) else {
            continue;
        };
        let Some(numbers) = parse_numbers(&cap, &[3, 4, 5, 6]) else {
            continue;
        };
        push(
            HarmonicRow {
                n,
                percentile,
                reg_max_pct: numbers[0],
                measured_pct: [numbers[1], numbers[2], numbers[3]],
                results: [
                    parse_verdict(&cap[7], &cap[8]),
                    parse_verdict(&cap[9], &cap[10]),
                    parse_verdict(&cap[11], &cap[12]),
                ],
            },
            &mut seen,
        );
    }

    for cap in patterns.bare.captures_iter(&flat) {
        let (Ok(n), Ok(percentile)) = (cap[1].parse(), cap[2].parse()) else {
            continue;
        };
        let Some(numbers) = parse_numbers(&cap, &[3, 4, 5, 6]) else {
            continue;
        };
        push(
            HarmonicRow {
                n,
                percentile,
                reg_max_pct: numbers[0],
                measured_pct: [numbers[1], numbers[2], numbers[3]],
                results: [
                    parse_verdict("Pass", &cap[7]),
                    parse_verdict("Pass", &cap[8]),
                    parse_verdict("Pass", &cap[9]),
                ],
            },
            &mut seen,
        );
    }

    for cap in patterns.measurements.captures_iter(&flat) {
        let (Ok(n), Ok(percentile)) = (cap[1].parse(), cap[2].parse()) else {
            continue;
        };
        let Some(numbers) = parse_numbers(&cap, &[3, 4, 5, 6]) else {
            continue;
        };
        push(
            HarmonicRow {
                n,
                percentile,
                reg_max_pct: numbers[0],
                measured_pct: [numbers[1], numbers[2], numbers[3]],
                results: [PhaseResult::not_reported(); 3],
            },
            &mut seen,
        );
    }

    rows
}

fn parse_numbers(cap: &regex::Captures<'_>, groups: &[usize]) -> Option<Vec<f64>> {
    groups
        .iter()
        .map(|&idx| cap[idx].parse::<f64>().ok())
        .collect()
}

/// Extract all four harmonic tables from the report pages.
///
/// The first page (header/summary) is skipped. Within a page that opens a
/// section, only the slice up to the first boundary heading is parsed; on
/// following pages the whole page belongs to the active section until a
/// boundary appears. `HARMONIC 5:` inside Harmonic Current Daily is the
/// one heading-lookalike that must not close the section.
pub fn extract_harmonic_tables(pages: &[String]) -> BTreeMap<TableKind, Vec<HarmonicRow>> {
    let patterns = RowPatterns::new();
    let mut tables: BTreeMap<TableKind, Vec<HarmonicRow>> = BTreeMap::new();
    let mut active: Option<TableKind> = None;

    for page in pages.iter().skip(1) {
        let upper = page.to_ascii_uppercase();

        let mut opened_section = false;
        for kind in TableKind::ALL {
            let title = kind.title().to_ascii_uppercase();
            let Some(start) = upper.find(&title) else {
                continue;
            };

            let body_start = start + title.len();
            let mut end = page.len();
            for boundary in kind.boundaries() {
                if let Some(pos) = upper[body_start..].find(boundary) {
                    end = end.min(body_start + pos);
                }
            }

            append_rows(
                tables.entry(kind).or_default(),
                parse_rows(&patterns, &page[start..end]),
            );
            active = Some(kind);
            opened_section = true;
        }
        if opened_section {
            continue;
        }

        let Some(kind) = active else { continue };
        let hit_boundary = kind
            .boundaries()
            .iter()
            .any(|boundary| upper.contains(boundary));

        if !hit_boundary || (kind == TableKind::CurrentDaily && upper.contains("HARMONIC 5:")) {
            append_rows(
                tables.entry(kind).or_default(),
                parse_rows(&patterns, page),
            );
        } else {
            active = None;
        }
    }

    tables.retain(|_, rows| !rows.is_empty());
    tables
}

/// Append rows a later page produced, keeping the first occurrence of each
/// `(N, percentile)` pair.
fn append_rows(dst: &mut Vec<HarmonicRow>, new_rows: Vec<HarmonicRow>) {
    let existing: HashSet<(u32, u8)> = dst.iter().map(|row| (row.n, row.percentile)).collect();
    dst.extend(
        new_rows
            .into_iter()
            .filter(|row| !existing.contains(&(row.n, row.percentile))),
    );
}

/// Extract the daily voltage THD and current TDD summary rows.
///
/// Returns `(voltage_thd, current_tdd)`. A data row is a `DD-MM-YYYY` day
/// whose last three numeric cells are the R/Y/B phase percentages.
pub fn extract_daily_distortion(pages: &[String]) -> (Vec<DailyDistortion>, Vec<DailyDistortion>) {
    let mut voltage = Vec::new();
    let mut current = Vec::new();

    for page in pages {
        if page.contains("Total Harmonic Distortion Daily") && page.contains("3sec THD") {
            voltage.extend(parse_daily_rows(page));
        }
        if page.contains("TDD Daily") && page.contains("3sec TDD") {
            current.extend(parse_daily_rows(page));
        }
    }

    (voltage, current)
}

fn parse_daily_rows(page: &str) -> Vec<DailyDistortion> {
    let date_re = Regex::new(r"^(\d{2}-\d{2}-\d{4})\b").expect("daily date regex is valid");

    let mut rows = Vec::new();
    for line in page.lines() {
        let line = line.trim();
        let Some(cap) = date_re.captures(line) else {
            continue;
        };
        let day = cap[1].to_string();

        let values: Vec<f64> = line[cap[0].len()..]
            .split_whitespace()
            .filter_map(|token| token.trim_end_matches('%').parse::<f64>().ok())
            .collect();
        if values.len() < 3 {
            continue;
        }

        let tail = &values[values.len() - 3..];
        rows.push(DailyDistortion {
            day,
            phases: [tail[0], tail[1], tail[2]],
        });
    }
    rows
}

/// Extract the Event Summary table from the last two pages.
///
/// The first of the two pages (checked last page first) containing
/// `Event Summary` wins; header echoes and non-event lines are skipped.
pub fn extract_events(pages: &[String]) -> Vec<PowerEvent> {
    let strict_re = RegexBuilder::new(concat!(
        r"^(swell|dip|interruption|transient)\s+(\S+)\s+",
        r"(\d{2}-\d{2}-\d{4}\s+\d{2}:\d{2}:\d{2}\s*[AP]M)\s+(\S+)\s+(\S+)",
    ))
    .case_insensitive(true)
    .build()
    .expect("strict event regex is valid");
    let loose_re = RegexBuilder::new(r"^(swell|dip|interruption|transient)\s+(\S+)\s+(.+?)\s+(\S+)\s+(\S+)$")
        .case_insensitive(true)
        .build()
        .expect("loose event regex is valid");

    let mut candidates: Vec<&String> = Vec::new();
    if let Some(last) = pages.last() {
        candidates.push(last);
    }
    if pages.len() >= 2 {
        candidates.push(&pages[pages.len() - 2]);
    }

    for page in candidates {
        if !page.contains("Event Summary") {
            continue;
        }

        let mut events = Vec::new();
        for line in page.lines() {
            let line = line.trim();
            let cap = strict_re
                .captures(line)
                .or_else(|| loose_re.captures(line));
            let Some(cap) = cap else { continue };
            let Some(event_type) = EventType::parse(&cap[1]) else {
                continue;
            };
            events.push(PowerEvent {
                event_type,
                phase: cap[2].to_string(),
                start_time: cap[3].split_whitespace().collect::<Vec<_>>().join(" "),
                duration: cap[4].to_string(),
                deviation_pct: cap[5].to_string(),
            });
        }
        return events;
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_filenames_match_known_shapes() {
        assert!(is_weekly_filename("7 Days report (TATA Block-15 Bay-09).pdf"));
        assert!(is_weekly_filename("7 Day Report (TATA BLOCK-15 FEEDER-10).pdf"));
        assert!(is_weekly_filename("Weekly Summary Report.pdf"));
        assert!(is_weekly_filename("Seven Days Report.pdf"));

        assert!(!is_weekly_filename("Day 3 Night (TATA Block-15).pdf"));
        assert!(!is_weekly_filename("Day 7 Day.pdf"));
    }

    #[test]
    fn header_block_parses() {
        let page = "Feeder Name: Solar Feeder 2\nNetwork Nominal: 33 kV\n\
                    Start time: 14-05-2025 06:00:00 AM End time: 21-05-2025 06:00:00 AM \
                    GMT: +05:30 Report Version: 2.1";
        let info = parse_report_info(page);
        assert_eq!(info.start_time.as_deref(), Some("14-05-2025 06:00:00 AM"));
        assert_eq!(info.end_time.as_deref(), Some("21-05-2025 06:00:00 AM"));
        assert_eq!(info.gmt.as_deref(), Some("+05:30"));
        assert_eq!(info.version.as_deref(), Some("2.1"));
        assert_eq!(info.feeder_name.as_deref(), Some("Solar Feeder 2"));
        assert_eq!(info.network_nominal.as_deref(), Some("33 kV"));
    }

    #[test]
    fn header_block_tolerates_missing_lines() {
        let info = parse_report_info("nothing useful here");
        assert!(info.start_time.is_none());
        assert!(info.feeder_name.is_none());
    }

    #[test]
    fn identity_from_filename_and_page() {
        let identity = parse_identity(
            "7 Days report (TATA Block-15 Bay-09).pdf",
            "some page text mentioning FEEDER-09",
        );
        assert_eq!(identity.component.as_deref(), Some("TATA Block-15 Bay-09"));
        assert_eq!(identity.block.as_deref(), Some("15"));
        assert_eq!(identity.feeder.as_deref(), Some("09"));
        assert_eq!(identity.company.as_deref(), Some("TATA"));
    }

    #[test]
    fn full_rows_parse_with_verdicts() {
        let patterns = RowPatterns::new();
        let rows = parse_rows(
            &patterns,
            "3 95 5.0 1.2 1.3 1.4 Pass(100%) Pass(99.5%) Fail(97%)",
        );
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.n, 3);
        assert_eq!(row.percentile, 95);
        assert_eq!(row.reg_max_pct, 5.0);
        assert_eq!(row.measured_pct, [1.2, 1.3, 1.4]);
        assert_eq!(row.results[0].verdict, Verdict::Pass);
        assert_eq!(row.results[2].verdict, Verdict::Fail);
        assert_eq!(row.results[2].within_pct, Some(97.0));
    }

    #[test]
    fn bare_rows_default_to_pass() {
        let patterns = RowPatterns::new();
        let rows = parse_rows(&patterns, "5 99 6.0 2.0 2.1 2.2 (100%) (100%) (98%)");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].results[0].verdict, Verdict::Pass);
        assert_eq!(rows[0].results[2].within_pct, Some(98.0));
    }

    #[test]
    fn measurement_rows_have_no_verdict() {
        let patterns = RowPatterns::new();
        let rows = parse_rows(&patterns, "7 95 5.0 0.4 0.5 0.6");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].results[0].verdict, Verdict::NotReported);
    }

    #[test]
    fn fundamental_and_year_values_are_rejected() {
        let patterns = RowPatterns::new();
        let rows = parse_rows(
            &patterns,
            "1 95 5.0 90.0 90.0 90.0 Pass(100%) Pass(100%) Pass(100%) \
             2025 95 5.0 1.0 1.0 1.0 Pass(100%) Pass(100%) Pass(100%) \
             2 95 5.0 1.0 1.0 1.0 Pass(100%) Pass(100%) Pass(100%)",
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].n, 2);
    }

    #[test]
    fn loose_pattern_cannot_shadow_verdict_rows() {
        let patterns = RowPatterns::new();
        let rows = parse_rows(&patterns, "4 95 5.0 1.0 1.1 1.2 Pass(100%) Pass(100%) Fail(95%)");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].results[2].verdict, Verdict::Fail);
    }

    fn page(text: &str) -> String {
        text.to_string()
    }

    #[test]
    fn sections_carry_over_pages_until_boundary() {
        let pages = vec![
            page("header page"),
            page("Harmonic Voltage Full Time Range\n2 95 5.0 1.0 1.0 1.0 Pass(100%) Pass(100%) Pass(100%)"),
            page("3 95 5.0 1.1 1.1 1.1 Pass(100%) Pass(100%) Pass(100%)"),
            page("SUMMARY\n4 95 5.0 1.2 1.2 1.2 Pass(100%) Pass(100%) Pass(100%)"),
        ];
        let tables = extract_harmonic_tables(&pages);
        let rows = &tables[&TableKind::VoltageFull];
        let orders: Vec<u32> = rows.iter().map(|row| row.n).collect();
        // page 4 hits the SUMMARY boundary, so harmonic 4 is not collected
        assert_eq!(orders, vec![2, 3]);
    }

    #[test]
    fn section_body_stops_at_boundary_on_opening_page() {
        let pages = vec![
            page("header page"),
            page(
                "Harmonic Voltage Full Time Range\n\
                 2 95 5.0 1.0 1.0 1.0 Pass(100%) Pass(100%) Pass(100%)\n\
                 HARMONIC CURRENT FULL TIME RANGE\n\
                 3 95 5.0 9.0 9.0 9.0 Pass(100%) Pass(100%) Pass(100%)",
            ),
        ];
        let tables = extract_harmonic_tables(&pages);
        let voltage: Vec<u32> = tables[&TableKind::VoltageFull].iter().map(|r| r.n).collect();
        assert_eq!(voltage, vec![2]);
        // the second title also opened the current table on the same page
        let current: Vec<u32> = tables[&TableKind::CurrentFull].iter().map(|r| r.n).collect();
        assert_eq!(current, vec![3]);
    }

    #[test]
    fn harmonic_five_heading_does_not_close_current_daily() {
        let pages = vec![
            page("header page"),
            page("Harmonic Current Daily\n2 95 8.0 1.0 1.0 1.0 Pass(100%) Pass(100%) Pass(100%)"),
            page(
                "HARMONIC 5: TRANSIENT mention\n\
                 5 95 8.0 2.0 2.0 2.0 Pass(100%) Pass(100%) Pass(100%)",
            ),
            page("FLICKER SEVERITY\n7 95 8.0 3.0 3.0 3.0 Pass(100%) Pass(100%) Pass(100%)"),
        ];
        let tables = extract_harmonic_tables(&pages);
        let orders: Vec<u32> = tables[&TableKind::CurrentDaily].iter().map(|r| r.n).collect();
        // TRANSIENT alone would close the section, but HARMONIC 5: keeps it open;
        // the plain FLICKER SEVERITY page then closes it.
        assert_eq!(orders, vec![2, 5]);
    }

    #[test]
    fn duplicate_rows_across_pages_keep_first() {
        let pages = vec![
            page("header"),
            page("Harmonic Voltage Daily\n2 95 5.0 1.0 1.0 1.0 Pass(100%) Pass(100%) Pass(100%)"),
            page("2 95 5.0 9.9 9.9 9.9 Pass(100%) Pass(100%) Pass(100%)\n2 99 6.0 1.5 1.5 1.5 Pass(100%) Pass(100%) Pass(100%)"),
        ];
        let tables = extract_harmonic_tables(&pages);
        let rows = &tables[&TableKind::VoltageDaily];
        assert_eq!(rows.len(), 2);
        let first = rows.iter().find(|r| r.percentile == 95).unwrap();
        assert_eq!(first.measured_pct[0], 1.0);
    }

    #[test]
    fn daily_distortion_rows_take_last_three_values() {
        let pages = vec![page(
            "Total Harmonic Distortion Daily\n3sec THD\n\
             14-05-2025 06:00 AM 3.10 3.20 3.30\n\
             not a data line\n\
             15-05-2025 06:00 AM 2.90 3.00 3.10",
        )];
        let (voltage, current) = extract_daily_distortion(&pages);
        assert!(current.is_empty());
        assert_eq!(voltage.len(), 2);
        assert_eq!(voltage[0].day, "14-05-2025");
        assert_eq!(voltage[0].phases, [3.10, 3.20, 3.30]);
    }

    #[test]
    fn events_parse_from_last_pages_and_skip_headers() {
        let pages = vec![
            page("first"),
            page(
                "Event Summary\n\
                 Type Phase Start Time Duration Deviation (%)\n\
                 Swell V1N 14-05-2025 10:23:45 AM 0.05s 12.3\n\
                 Dip V2N 15-05-2025 11:00:00 PM 0.10s -8.1",
            ),
        ];
        let events = extract_events(&pages);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::Swell);
        assert_eq!(events[0].phase, "V1N");
        assert_eq!(events[0].start_time, "14-05-2025 10:23:45 AM");
        assert_eq!(events[1].event_type, EventType::Dip);
        assert_eq!(events[1].deviation_pct, "-8.1");
    }

    #[test]
    fn no_event_section_means_no_events() {
        let pages = vec![page("first"), page("nothing here")];
        assert!(extract_events(&pages).is_empty());
    }
}

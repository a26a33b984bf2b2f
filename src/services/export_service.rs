//! src/services/export_service.rs
//!
//! Spreadsheet and CSV rendering of extracted harmonic data. Sheet naming
//! is deliberately terse (31-char Excel cap): per-report sheets are
//! `H_{V|I}{F|D}_{95|99}_{O|E}`, bulk sheets `{file prefix}_H_{V|I}{F|D}`.
//! Failing measurements get a red fill and dark-red bold font, their
//! harmonic cell an amber fill.

use crate::models::harmonic::{HarmonicRow, TableKind};
use crate::services::analysis_service::{self, Violation};
use regex::Regex;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Excel's hard limit on sheet name length.
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Xlsx(#[from] XlsxError),
    #[error("csv export failed: {0}")]
    Csv(String),
}

struct FailFormats {
    fail: Format,
    harmonic: Format,
}

impl FailFormats {
    fn new() -> Self {
        Self {
            fail: Format::new()
                .set_bold()
                .set_font_color(Color::RGB(0x9C0006))
                .set_background_color(Color::RGB(0xFFC7CE)),
            harmonic: Format::new().set_background_color(Color::RGB(0xFFEB9C)),
        }
    }
}

/// Build the per-report workbook: one sheet per table kind, percentile and
/// parity combination that actually has rows.
pub fn report_workbook(
    tables: &BTreeMap<TableKind, Vec<HarmonicRow>>,
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let formats = FailFormats::new();
    let mut wrote_any = false;

    for (kind, rows) in tables {
        let cleaned = analysis_service::clean_rows(rows.clone());
        if cleaned.is_empty() {
            continue;
        }
        let split = analysis_service::split_rows(&cleaned);

        for (limit, odd_even) in [("95", &split.p95), ("99", &split.p99)] {
            for (parity, subset) in [("O", &odd_even.odd), ("E", &odd_even.even)] {
                if subset.is_empty() {
                    continue;
                }
                let name = clamp_sheet_name(&format!("H_{}_{}_{}", kind.abbrev(), limit, parity));
                let worksheet = workbook.add_worksheet();
                worksheet.set_name(&name)?;
                write_table(worksheet, 0, *kind, subset, &formats)?;
                wrote_any = true;
            }
        }
    }

    if !wrote_any {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Empty")?;
        worksheet.write_string(0, 0, "No harmonic data extracted")?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Build one workbook over many files: one sheet per (file, table kind),
/// the source filename recorded in the sheet's first row.
pub fn bulk_workbook(
    files: &[(String, BTreeMap<TableKind, Vec<HarmonicRow>>)],
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let formats = FailFormats::new();
    let mut taken: HashSet<String> = HashSet::new();

    for (filename, tables) in files {
        let prefix = sheet_prefix(filename);
        for (kind, rows) in tables {
            let cleaned = analysis_service::clean_rows(rows.clone());
            if cleaned.is_empty() {
                continue;
            }

            let base = clamp_sheet_name(&format!("{}_H_{}", prefix, kind.abbrev()));
            let name = dedupe_sheet_name(&base, &taken);
            taken.insert(name.clone());

            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&name)?;
            worksheet.write_string(0, 0, format!("File: {}", filename))?;
            write_table(worksheet, 1, *kind, &cleaned, &formats)?;
        }
    }

    if taken.is_empty() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Empty")?;
        worksheet.write_string(0, 0, "No harmonic data extracted")?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Render violations as CSV.
pub fn violations_csv(violations: &[Violation]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "harmonic",
            "phase",
            "time_limit_pct",
            "allowed_pct",
            "measured_pct",
            "exceedance_pct",
            "table",
        ])
        .map_err(|err| ExportError::Csv(err.to_string()))?;

    for violation in violations {
        writer
            .write_record([
                violation.harmonic.to_string(),
                violation.phase.clone(),
                violation.percentile.to_string(),
                format!("{}", violation.allowed_pct),
                format!("{}", violation.measured_pct),
                format!("{}", violation.exceedance_pct),
                violation.table.clone(),
            ])
            .map_err(|err| ExportError::Csv(err.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.to_string()))
}

/// Compact per-file sheet prefix: `7Days` for weekly reports, `{n}D`/`{n}N`
/// for daily day/night reports, else the first four word characters.
pub fn sheet_prefix(filename: &str) -> String {
    let upper = filename.to_ascii_uppercase();

    if upper.contains('7') && upper.contains("DAY") {
        return "7Days".to_string();
    }

    let day_period_re =
        Regex::new(r"DAY\s*(\d+)\s*(DAY|NIGHT)").expect("day/period regex is valid");
    if let Some(cap) = day_period_re.captures(&upper) {
        let period = if cap[2].contains("DAY") { "D" } else { "N" };
        return format!("{}{}", &cap[1], period);
    }

    let day_re = Regex::new(r"DAY\s*(\d+)").expect("day regex is valid");
    if let Some(cap) = day_re.captures(&upper) {
        return format!("{}D", &cap[1]);
    }

    filename
        .trim_end_matches(".pdf")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(4)
        .collect()
}

fn clamp_sheet_name(name: &str) -> String {
    name.chars().take(MAX_SHEET_NAME).collect()
}

/// Suffix `_1`, `_2`… until the name is free, re-truncating so the suffix
/// always survives the 31-char cap.
fn dedupe_sheet_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut counter = 1;
    loop {
        let suffix = format!("_{}", counter);
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.len());
        let candidate = format!(
            "{}{}",
            base.chars().take(keep).collect::<String>(),
            suffix
        );
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn write_table(
    worksheet: &mut Worksheet,
    start_row: u32,
    kind: TableKind,
    rows: &[HarmonicRow],
    formats: &FailFormats,
) -> Result<(), XlsxError> {
    let labels = kind.phase_labels();

    worksheet.write_string(start_row, 0, "N")?;
    worksheet.write_string(start_row, 1, "[%]")?;
    worksheet.write_string(start_row, 2, "Reg Max[%]")?;
    for (idx, label) in labels.iter().enumerate() {
        worksheet.write_string(start_row, 3 + idx as u16, format!("Measured_{}", label))?;
        worksheet.write_string(start_row, 6 + idx as u16, format!("Result_{}", label))?;
    }

    for (offset, row) in rows.iter().enumerate() {
        let excel_row = start_row + 1 + offset as u32;
        let any_fail = (0..3).any(|idx| row.phase_violates(idx));

        if any_fail {
            worksheet.write_number_with_format(excel_row, 0, row.n as f64, &formats.harmonic)?;
        } else {
            worksheet.write_number(excel_row, 0, row.n as f64)?;
        }
        worksheet.write_number(excel_row, 1, row.percentile as f64)?;
        worksheet.write_number(excel_row, 2, row.reg_max_pct)?;

        for idx in 0..3 {
            let measured_col = 3 + idx as u16;
            let result_col = 6 + idx as u16;
            let result_text = row.results[idx].to_string();

            if row.phase_violates(idx) {
                worksheet.write_number_with_format(
                    excel_row,
                    measured_col,
                    row.measured_pct[idx],
                    &formats.fail,
                )?;
                worksheet.write_string_with_format(
                    excel_row,
                    result_col,
                    result_text,
                    &formats.fail,
                )?;
            } else {
                worksheet.write_number(excel_row, measured_col, row.measured_pct[idx])?;
                worksheet.write_string(excel_row, result_col, result_text)?;
            }
        }
    }

    Ok(())
}

//! src/services/graph_service.rs
//!
//! DOCX graph extraction. A .docx file is a ZIP archive with embedded
//! images under `word/media/`; most of them are logos, separators and
//! icons. A multi-criteria heuristic keeps only images that plausibly are
//! charts: technical plots have varied brightness, busy borders (axes,
//! frames) and moderate tonal complexity, while decorations tend to be
//! tiny, flat or extreme in aspect ratio.

use image::{GenericImageView, GrayImage};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use thiserror::Error;
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::FileOptions};

/// Entries smaller than this are never images worth looking at.
const MIN_ENTRY_BYTES: usize = 100;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("not a readable DOCX archive: {0}")]
    InvalidArchive(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to assemble ZIP bundle: {0}")]
    Bundle(String),
}

/// An image that passed the graph heuristic.
#[derive(Serialize, Clone, Debug)]
pub struct ExtractedGraph {
    /// Output filename, `chart_{nnn}_{original stem}.{ext}`.
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Detected image format extension.
    pub format: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// A media entry that was rejected, with the reason.
#[derive(Serialize, Clone, Debug)]
pub struct SkippedImage {
    pub name: String,
    pub reason: String,
}

/// Result of scanning one document.
#[derive(Serialize, Clone, Debug, Default)]
pub struct GraphScan {
    pub graphs: Vec<ExtractedGraph>,
    pub skipped: Vec<SkippedImage>,
}

/// Scan a DOCX payload for chart-like images.
pub fn scan_docx(bytes: &[u8]) -> Result<GraphScan, GraphError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| GraphError::InvalidArchive(err.to_string()))?;

    let mut scan = GraphScan::default();
    let mut processed: HashSet<(String, u64)> = HashSet::new();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| GraphError::InvalidArchive(err.to_string()))?;
        let entry_name = entry.name().to_string();
        if !entry_name.starts_with("word/media/") || entry_name.ends_with('/') {
            continue;
        }
        // the same media part can be referenced twice
        if !processed.insert((entry_name.clone(), entry.size())) {
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;

        let basename = entry_name.rsplit('/').next().unwrap_or(&entry_name);
        if data.len() < MIN_ENTRY_BYTES {
            scan.skipped.push(SkippedImage {
                name: basename.to_string(),
                reason: "tiny file".to_string(),
            });
            continue;
        }

        let img = match image::load_from_memory(&data) {
            Ok(img) => img,
            Err(err) => {
                scan.skipped.push(SkippedImage {
                    name: basename.to_string(),
                    reason: format!("not decodable: {}", err),
                });
                continue;
            }
        };

        let (width, height) = img.dimensions();
        let gray = img.to_luma8();
        if !is_likely_graph(&gray, width, height) {
            let reason = if width < 200 || height < 120 {
                "size"
            } else {
                "content analysis"
            };
            scan.skipped.push(SkippedImage {
                name: basename.to_string(),
                reason: reason.to_string(),
            });
            continue;
        }

        let extension = image::guess_format(&data)
            .ok()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("png");
        let stem = basename.rsplit_once('.').map(|(s, _)| s).unwrap_or(basename);

        scan.graphs.push(ExtractedGraph {
            name: format!("chart_{:03}_{}.{}", scan.graphs.len() + 1, stem, extension),
            width,
            height,
            format: extension.to_string(),
            bytes: data,
        });
    }

    Ok(scan)
}

/// Bundle accepted graphs into a deflate ZIP, bytes passed through
/// unchanged.
pub fn bundle_zip(graphs: &[ExtractedGraph]) -> Result<Vec<u8>, GraphError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for graph in graphs {
        writer
            .start_file(graph.name.as_str(), options)
            .map_err(|err| GraphError::Bundle(err.to_string()))?;
        writer.write_all(&graph.bytes)?;
    }

    let cursor = writer
        .finish()
        .map_err(|err| GraphError::Bundle(err.to_string()))?;
    Ok(cursor.into_inner())
}

/// Graph-likeness heuristic, tuned for charts in technical reports.
///
/// Hard gates first (size, area, aspect ratio), then acceptance criteria
/// in decreasing specificity; the first that passes wins. Large images
/// that fail every content check still pass on size alone.
fn is_likely_graph(gray: &GrayImage, width: u32, height: u32) -> bool {
    if width < 100 || height < 80 {
        return false;
    }
    if (width as u64) * (height as u64) < 8_000 {
        return false;
    }
    let aspect = width as f64 / height as f64;
    if !(0.3..=8.0).contains(&aspect) {
        return false;
    }

    let pixels = gray.as_raw();
    let total = pixels.len();
    if total == 0 {
        return false;
    }
    let avg = pixels.iter().map(|&p| p as f64).sum::<f64>() / total as f64;

    // brightness spread over four quartile bins: charts are rarely flat
    let mut bins = [0usize; 4];
    for &pixel in pixels {
        bins[(pixel / 64) as usize] += 1;
    }
    let dominant = bins
        .iter()
        .map(|&count| count as f64 / total as f64)
        .fold(0.0, f64::max);
    if dominant < 0.85 {
        return true;
    }

    // busy borders (axes, frames) show up as edge variance
    let mut edges: Vec<f64> = Vec::new();
    let x_step = (width / 20).max(1) as usize;
    for x in (0..width).step_by(x_step) {
        edges.push(gray.get_pixel(x, 0).0[0] as f64);
        edges.push(gray.get_pixel(x, height - 1).0[0] as f64);
    }
    let y_step = (height / 20).max(1) as usize;
    for y in (0..height).step_by(y_step) {
        edges.push(gray.get_pixel(0, y).0[0] as f64);
        edges.push(gray.get_pixel(width - 1, y).0[0] as f64);
    }
    if !edges.is_empty() {
        let variance =
            edges.iter().map(|p| (p - avg) * (p - avg)).sum::<f64>() / edges.len() as f64;
        if variance > 500.0 {
            return true;
        }
    }

    // interquartile contrast
    let mut sorted = pixels.clone();
    sorted.sort_unstable();
    if sorted.len() >= 4 {
        let q1 = sorted[sorted.len() / 4];
        let q3 = sorted[3 * sorted.len() / 4];
        if q3 - q1 > 80 {
            return true;
        }
    }

    // moderate tonal complexity: not flat, not noise
    let sample = &pixels[..total.min(1000)];
    let unique: HashSet<u8> = sample.iter().copied().collect();
    let complexity = unique.len() as f64 / sample.len() as f64;
    if (0.1..=0.8).contains(&complexity) {
        return true;
    }

    width >= 200 && height >= 120
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};

    fn gradient(width: u32, height: u32) -> GrayImage {
        ImageBuffer::from_fn(width, height, |x, _| Luma([(x % 256) as u8]))
    }

    fn solid(width: u32, height: u32, value: u8) -> GrayImage {
        ImageBuffer::from_fn(width, height, |_, _| Luma([value]))
    }

    fn png_bytes(img: GrayImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn small_images_are_rejected() {
        let img = gradient(50, 50);
        assert!(!is_likely_graph(&img, 50, 50));
    }

    #[test]
    fn extreme_aspect_ratios_are_rejected() {
        let img = gradient(1000, 100);
        assert!(!is_likely_graph(&img, 1000, 100));
    }

    #[test]
    fn varied_brightness_is_accepted() {
        let img = gradient(300, 200);
        assert!(is_likely_graph(&img, 300, 200));
    }

    #[test]
    fn flat_small_images_fail_content_checks() {
        // big enough to pass the gates, too small for the size fallback
        let img = solid(150, 100, 200);
        assert!(!is_likely_graph(&img, 150, 100));
    }

    #[test]
    fn flat_large_images_pass_on_size_alone() {
        let img = solid(400, 300, 200);
        assert!(is_likely_graph(&img, 400, 300));
    }

    fn docx_with_media(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(b"<w:document/>").unwrap();
        for (name, bytes) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn scan_keeps_charts_and_reports_skips() {
        let docx = docx_with_media(&[
            ("word/media/image1.png", png_bytes(gradient(300, 200))),
            ("word/media/image2.png", vec![0u8; 20]),
        ]);
        let scan = scan_docx(&docx).unwrap();

        assert_eq!(scan.graphs.len(), 1);
        let graph = &scan.graphs[0];
        assert_eq!(graph.name, "chart_001_image1.png");
        assert_eq!((graph.width, graph.height), (300, 200));
        assert_eq!(graph.format, "png");

        assert_eq!(scan.skipped.len(), 1);
        assert_eq!(scan.skipped[0].name, "image2.png");
        assert_eq!(scan.skipped[0].reason, "tiny file");
    }

    #[test]
    fn scan_rejects_non_archives() {
        assert!(matches!(
            scan_docx(b"definitely not a zip"),
            Err(GraphError::InvalidArchive(_))
        ));
    }

    #[test]
    fn bundle_round_trips_through_zip() {
        let docx = docx_with_media(&[("word/media/plot.png", png_bytes(gradient(300, 200)))]);
        let scan = scan_docx(&docx).unwrap();
        let bundle = bundle_zip(&scan.graphs).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bundle)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "chart_001_plot.png");
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, scan.graphs[0].bytes);
    }
}

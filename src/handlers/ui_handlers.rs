//! The index page: one card per toolkit module, pointing at the API
//! routes that implement it.

use axum::response::Html;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Harmonic Analysis Toolkit</title>
<style>
  body { background-color: #f5f5f5; font-family: sans-serif; margin: 0; padding: 2em; }
  h1 { color: #2c3e50; text-align: center; }
  .cards { display: flex; gap: 20px; justify-content: center; flex-wrap: wrap; }
  .card { background: white; border-radius: 10px; padding: 20px; width: 280px;
          box-shadow: 0 4px 8px rgba(0,0,0,0.1); }
  .card h2 { margin-top: 0; font-size: 1.2em; }
  .card code { display: block; background: #f0f0f0; border-radius: 4px;
               padding: 4px 6px; margin: 4px 0; font-size: 0.8em; }
  footer { text-align: center; color: #7f8c8d; margin-top: 2em; }
</style>
</head>
<body>
<h1>Harmonic Analysis Toolkit</h1>
<div class="cards">
  <div class="card">
    <h2>&#128197; Weekly Summary Analyzer</h2>
    <p>THD/TDD compliance, schedule and events from 7-day summary reports.</p>
    <code>POST /api/reports</code>
    <code>GET /api/reports/{id}/summary</code>
  </div>
  <div class="card">
    <h2>&#128203; Harmonic Table Analyzer</h2>
    <p>Per-harmonic tables, violations and Excel exports from PQ reports.</p>
    <code>GET /api/reports/{id}/tables</code>
    <code>GET /api/reports/{id}/violations</code>
    <code>GET /api/exports/tables.xlsx</code>
  </div>
  <div class="card">
    <h2>&#128200; Graph Extractor</h2>
    <p>Chart images pulled out of DOCX reports, bundled as a ZIP.</p>
    <code>POST /api/graphs/inspect</code>
    <code>POST /api/graphs/extract</code>
  </div>
</div>
<footer>Harmonic Analysis Toolkit v1.0</footer>
</body>
</html>
"#;

/// `GET /` — serve the toolkit index.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

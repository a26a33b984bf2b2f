//! Service layer: report storage plus the pure extraction, analysis,
//! export and graph pipelines that operate on stored payloads.

pub mod analysis_service;
pub mod export_service;
pub mod extract_service;
pub mod graph_service;
pub mod report_service;

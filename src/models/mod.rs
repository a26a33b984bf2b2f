//! Core data models for the harmonic analysis toolkit.
//!
//! These entities represent stored reports and everything extracted from
//! them. `Report` maps to a database table via `sqlx::FromRow`; the rest
//! serialize naturally as JSON via `serde`.

pub mod event;
pub mod harmonic;
pub mod report;
pub mod summary;

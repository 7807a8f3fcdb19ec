//! Shared packaging domain primitives.
//!
//! This crate owns the manifest format, the fixed package layout, target
//! runtime identifiers and the build report contract. It excludes subprocess
//! and archive concerns, which live in `lambda_packager`.

pub mod layout;
pub mod manifest;
pub mod report;
pub mod runtime;

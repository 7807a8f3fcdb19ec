//! Adapters and runtime for building serverless deployment archives.
//!
//! This crate owns the subprocess and archive side of packaging: the
//! dependency installer seam, source discovery, zip writing, and the
//! packaging pipeline that strings them together. Domain primitives come from
//! `lambda_packager_core`.

pub mod archive;
pub mod error;
pub mod installer;
pub mod logging;
pub mod packager;
pub mod sources;

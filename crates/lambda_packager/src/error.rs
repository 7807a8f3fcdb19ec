use std::path::PathBuf;

use lambda_packager_core::manifest::ManifestError;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::installer::InstallError;

/// Failure of one packaging step. Every variant is fatal for the run.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("failed to remove '{path}': {source}")]
    StagingCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create staging directory '{path}': {source}")]
    StagingSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("dependency installation failed: {0}")]
    DependencyResolution(#[from] InstallError),

    #[error("failed to create archive '{path}': {source}")]
    ArchiveCreation {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("failed to read archive '{path}': {source}")]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("failed to list source files in '{dir}': {source}")]
    SourceDiscovery {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to append source files to '{path}' (archive holds dependencies only): {source}"
    )]
    SourceAppend {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },
}

impl PackageError {
    /// Process exit code for this failure. Installer exit codes pass through.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DependencyResolution(InstallError {
                exit_code: Some(code),
                ..
            }) => u8::try_from(*code).ok().filter(|code| *code != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

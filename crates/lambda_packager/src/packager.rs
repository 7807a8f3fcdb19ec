use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lambda_packager_core::layout::PackageLayout;
use lambda_packager_core::manifest::{read_manifest, Manifest};
use lambda_packager_core::report::{fingerprint_reader, PackageReport, REPORT_SCHEMA_VERSION};

use crate::archive::{append_files, create_archive_from_dir, ArchiveError};
use crate::error::PackageError;
use crate::installer::DependencyInstaller;
use crate::sources::collect_source_files;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
    pub archive_path: PathBuf,
    pub requirements: usize,
    pub dependency_entries: usize,
    pub source_files: Vec<String>,
}

pub struct Packager<I> {
    layout: PackageLayout,
    installer: I,
}

impl<I: DependencyInstaller> Packager<I> {
    pub fn new(layout: PackageLayout, installer: I) -> Self {
        Self { layout, installer }
    }

    pub fn layout(&self) -> &PackageLayout {
        &self.layout
    }

    pub fn installer(&self) -> &I {
        &self.installer
    }

    pub fn preflight(&self) -> Result<(), PackageError> {
        step("Check dependency installer");
        self.installer.preflight()?;
        Ok(())
    }

    /// Runs the full pipeline. Any failure aborts the run and leaves partial
    /// state behind for the next run's cleanup to remove.
    pub fn run(&self) -> Result<PackageOutcome, PackageError> {
        let staging = self.layout.staging_path();
        let archive_path = self.layout.archive_path();

        clean_previous_run(&self.layout)?;

        step("Create staging directory");
        fs::create_dir_all(&staging).map_err(|source| PackageError::StagingSetup {
            path: staging.clone(),
            source,
        })?;

        let manifest = self.install_dependencies(&staging)?;

        step("Archive staged dependencies");
        let working_dir = self.layout.working_dir();
        let source_files = collect_source_files(working_dir, self.layout.source_extension())
            .map_err(|source| PackageError::SourceDiscovery {
                dir: working_dir.to_path_buf(),
                source,
            })?;
        let source_names: Vec<String> = source_files
            .iter()
            .filter_map(|path| file_name(path))
            .collect();
        let shadowed: BTreeSet<String> = source_names.iter().cloned().collect();
        let summary = create_archive_from_dir(&staging, &archive_path, &shadowed).map_err(
            |source| PackageError::ArchiveCreation {
                path: archive_path.clone(),
                source,
            },
        )?;
        tracing::info!(
            files = summary.files,
            directories = summary.directories,
            "dependency archive written"
        );

        step("Append source files");
        if source_files.is_empty() {
            tracing::warn!(
                extension = self.layout.source_extension(),
                dir = %working_dir.display(),
                "no source files matched; archive holds dependencies only"
            );
        }
        append_files(&archive_path, &source_files).map_err(|source| PackageError::SourceAppend {
            path: archive_path.clone(),
            source,
        })?;

        step("Remove staging directory");
        remove_dir_if_present(&staging)?;

        Ok(PackageOutcome {
            archive_path,
            requirements: manifest.dependency_count(),
            dependency_entries: summary.entries(),
            source_files: source_names,
        })
    }

    fn install_dependencies(&self, staging: &Path) -> Result<Manifest, PackageError> {
        step("Install dependencies");
        let manifest_path = self.layout.manifest_path();
        let manifest = read_manifest(&manifest_path)?;

        for name in manifest.duplicate_names() {
            tracing::warn!(dependency = %name, "dependency listed more than once in manifest");
        }

        if manifest.is_empty() {
            tracing::info!("manifest lists no dependencies; skipping installer");
            return Ok(manifest);
        }

        tracing::info!(
            requirements = manifest.requirements.len(),
            direct_references = manifest.direct_references.len(),
            options = manifest.options.len(),
            "installing dependencies into {}",
            staging.display()
        );
        self.installer.install(&manifest_path, &manifest, staging)?;
        Ok(manifest)
    }
}

/// Removes the staging directory and archive left by a previous run.
/// Missing paths are not an error.
pub fn clean_previous_run(layout: &PackageLayout) -> Result<(), PackageError> {
    step("Remove previous build output");
    remove_dir_if_present(&layout.staging_path())?;
    remove_file_if_present(&layout.archive_path())
}

/// Builds the report for a finished run by fingerprinting the archive.
pub fn build_report(outcome: &PackageOutcome, runtime: &str) -> Result<PackageReport, PackageError> {
    let fingerprint = fs::File::open(&outcome.archive_path)
        .and_then(fingerprint_reader)
        .map_err(|source| PackageError::ArchiveRead {
            path: outcome.archive_path.clone(),
            source: ArchiveError::Io(source),
        })?;

    Ok(PackageReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        archive_path: outcome.archive_path.display().to_string(),
        archive_bytes: fingerprint.bytes,
        archive_sha256: fingerprint.sha256,
        runtime: runtime.to_string(),
        requirements: outcome.requirements,
        dependency_entries: outcome.dependency_entries,
        source_files: outcome.source_files.clone(),
    })
}

fn step(label: &str) {
    tracing::info!(step = label, "=== {label} ===");
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

fn remove_dir_if_present(path: &Path) -> Result<(), PackageError> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed directory");
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PackageError::StagingCleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn remove_file_if_present(path: &Path) -> Result<(), PackageError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed file");
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PackageError::StagingCleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

use std::path::{Path, PathBuf};

pub const DEFAULT_MANIFEST_FILE: &str = "requirements.txt";
pub const DEFAULT_ARCHIVE_FILE: &str = "deployment_package.zip";
pub const DEFAULT_STAGING_DIR: &str = "package";
pub const DEFAULT_SOURCE_EXTENSION: &str = "py";

/// Fixed relative paths of one packaging run, anchored at a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
    pub working_dir: PathBuf,
    pub manifest_file: String,
    pub archive_file: String,
    pub staging_dir: String,
    pub source_extension: String,
}

impl PackageLayout {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            manifest_file: DEFAULT_MANIFEST_FILE.to_string(),
            archive_file: DEFAULT_ARCHIVE_FILE.to_string(),
            staging_dir: DEFAULT_STAGING_DIR.to_string(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.working_dir.join(&self.manifest_file)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.working_dir.join(&self.archive_file)
    }

    pub fn staging_path(&self) -> PathBuf {
        self.working_dir.join(&self.staging_dir)
    }

    /// Source extension without a leading dot, so `.py` and `py` behave alike.
    pub fn source_extension(&self) -> &str {
        self.source_extension.trim_start_matches('.')
    }
}

impl Default for PackageLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

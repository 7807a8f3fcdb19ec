//! Zip archive writing for deployment packages.
//!
//! Entries are written in sorted path order with the writer's fixed default
//! timestamp, so unchanged inputs produce identical archive bytes.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Zip(#[from] ZipError),

    #[error("path '{0}' is not valid UTF-8 and cannot be stored as an archive entry")]
    NonUtf8Path(PathBuf),
}

/// Counts of entries written by [`create_archive_from_dir`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub files: usize,
    pub directories: usize,
}

impl ArchiveSummary {
    pub fn entries(&self) -> usize {
        self.files + self.directories
    }
}

/// Writes every file and directory under `root` into a new archive at
/// `archive_path`, with entry names relative to `root`. Top-level files named
/// in `shadowed` are left out so a later append can supply them instead.
pub fn create_archive_from_dir(
    root: &Path,
    archive_path: &Path,
    shadowed: &BTreeSet<String>,
) -> Result<ArchiveSummary, ArchiveError> {
    let mut entries = Vec::new();
    collect_tree(root, root, &mut entries)?;

    let mut zip = ZipWriter::new(File::create(archive_path)?);
    let mut summary = ArchiveSummary::default();

    for entry in entries {
        match entry.kind {
            EntryKind::Directory => {
                zip.add_directory(entry.name.as_str(), entry_options(entry.mode))?;
                summary.directories += 1;
            }
            EntryKind::File => {
                if !entry.name.contains('/') && shadowed.contains(&entry.name) {
                    tracing::warn!(
                        entry = %entry.name,
                        "source file shadows a top-level dependency file; keeping the source file"
                    );
                    continue;
                }
                zip.start_file(entry.name.as_str(), entry_options(entry.mode))?;
                io::copy(&mut File::open(&entry.path)?, &mut zip)?;
                summary.files += 1;
            }
        }
    }

    zip.finish()?;
    Ok(summary)
}

/// Appends `files` to the existing archive at `archive_path`, each stored at
/// the archive root under its file name. Existing entries are preserved.
pub fn append_files(archive_path: &Path, files: &[PathBuf]) -> Result<usize, ArchiveError> {
    let file = OpenOptions::new().read(true).write(true).open(archive_path)?;
    let mut zip = ZipWriter::new_append(file)?;

    for path in files {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ArchiveError::NonUtf8Path(path.clone()))?;
        let mode = file_mode(&fs::metadata(path)?, DEFAULT_FILE_MODE);
        zip.start_file(name, entry_options(mode))?;
        io::copy(&mut File::open(path)?, &mut zip)?;
        tracing::debug!(entry = name, "appended source file");
    }

    zip.finish()?;
    Ok(files.len())
}

/// Entry names of the archive at `archive_path`, in archive order.
pub fn list_entries(archive_path: &Path) -> Result<Vec<String>, ArchiveError> {
    let mut archive = ZipArchive::new(File::open(archive_path)?)?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        names.push(archive.by_index(index)?.name().to_string());
    }
    Ok(names)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

#[derive(Debug)]
struct TreeEntry {
    name: String,
    path: PathBuf,
    kind: EntryKind,
    mode: u32,
}

fn collect_tree(root: &Path, dir: &Path, entries: &mut Vec<TreeEntry>) -> Result<(), ArchiveError> {
    let mut children = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    children.sort();

    for path in children {
        let name = entry_name(root, &path)?;
        let Some(metadata) = entry_metadata(&path)? else {
            continue;
        };
        if metadata.is_dir() {
            entries.push(TreeEntry {
                name: format!("{name}/"),
                path: path.clone(),
                kind: EntryKind::Directory,
                mode: file_mode(&metadata, DEFAULT_DIR_MODE),
            });
            collect_tree(root, &path, entries)?;
        } else {
            entries.push(TreeEntry {
                name,
                mode: file_mode(&metadata, DEFAULT_FILE_MODE),
                path,
                kind: EntryKind::File,
            });
        }
    }

    Ok(())
}

/// Metadata for a staged path without descending through links. A link to a
/// file is archived as that file; links to directories (which may loop back
/// into the tree) and dangling links are skipped.
fn entry_metadata(path: &Path) -> Result<Option<fs::Metadata>, ArchiveError> {
    let metadata = fs::symlink_metadata(path)?;
    if !metadata.file_type().is_symlink() {
        return Ok(Some(metadata));
    }
    match fs::metadata(path) {
        Ok(target) if target.is_file() => Ok(Some(target)),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "skipping symlink to a directory in staging");
            Ok(None)
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "skipping dangling symlink in staging");
            Ok(None)
        }
    }
}

fn entry_name(root: &Path, path: &Path) -> Result<String, ArchiveError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ArchiveError::NonUtf8Path(path.to_path_buf()))?;
    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| ArchiveError::NonUtf8Path(path.to_path_buf()))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

fn entry_options(mode: u32) -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(mode)
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata, _fallback: u32) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata, fallback: u32) -> u32 {
    fallback
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn read_entry(archive_path: &Path, name: &str) -> String {
        let mut archive = ZipArchive::new(File::open(archive_path).unwrap()).unwrap();
        let mut contents = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        contents
    }

    fn staged_tree(root: &Path) {
        fs::create_dir_all(root.join("foo").join("sub")).unwrap();
        fs::write(root.join("foo").join("__init__.py"), "VERSION = '1.0'\n").unwrap();
        fs::write(root.join("foo").join("sub").join("core.py"), "x = 1\n").unwrap();
        fs::write(root.join("six.py"), "# vendored\n").unwrap();
    }

    #[test]
    fn archives_tree_in_sorted_order_with_directories() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("package");
        staged_tree(&staging);
        let archive_path = dir.path().join("out.zip");

        let summary =
            create_archive_from_dir(&staging, &archive_path, &BTreeSet::new()).unwrap();

        assert_eq!(summary, ArchiveSummary { files: 3, directories: 2 });
        assert_eq!(
            list_entries(&archive_path).unwrap(),
            vec![
                "foo/",
                "foo/__init__.py",
                "foo/sub/",
                "foo/sub/core.py",
                "six.py",
            ]
        );
        assert_eq!(read_entry(&archive_path, "foo/sub/core.py"), "x = 1\n");
    }

    #[test]
    fn empty_staging_yields_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("package");
        fs::create_dir(&staging).unwrap();
        let archive_path = dir.path().join("out.zip");

        let summary =
            create_archive_from_dir(&staging, &archive_path, &BTreeSet::new()).unwrap();

        assert_eq!(summary.entries(), 0);
        assert!(list_entries(&archive_path).unwrap().is_empty());
    }

    #[test]
    fn append_preserves_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("package");
        staged_tree(&staging);
        let archive_path = dir.path().join("out.zip");
        create_archive_from_dir(&staging, &archive_path, &BTreeSet::new()).unwrap();

        let handler = dir.path().join("main.py");
        fs::write(&handler, "def lambda_handler(event, context):\n    return event\n").unwrap();
        let appended = append_files(&archive_path, &[handler]).unwrap();

        assert_eq!(appended, 1);
        let entries = list_entries(&archive_path).unwrap();
        assert_eq!(entries.len(), 6);
        assert!(entries.contains(&"foo/__init__.py".to_string()));
        assert_eq!(entries.last().map(String::as_str), Some("main.py"));
        assert!(read_entry(&archive_path, "main.py").contains("lambda_handler"));
    }

    #[test]
    fn shadowed_top_level_files_are_left_for_append() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("package");
        staged_tree(&staging);
        let archive_path = dir.path().join("out.zip");
        let shadowed = BTreeSet::from(["six.py".to_string()]);

        let summary = create_archive_from_dir(&staging, &archive_path, &shadowed).unwrap();
        let source = dir.path().join("six.py");
        fs::write(&source, "# local override\n").unwrap();
        append_files(&archive_path, &[source]).unwrap();

        assert_eq!(summary.files, 2);
        let entries = list_entries(&archive_path).unwrap();
        assert_eq!(entries.iter().filter(|name| *name == "six.py").count(), 1);
        assert_eq!(read_entry(&archive_path, "six.py"), "# local override\n");
    }

    #[test]
    fn identical_inputs_produce_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("package");
        staged_tree(&staging);
        let first = dir.path().join("first.zip");
        let second = dir.path().join("second.zip");

        create_archive_from_dir(&staging, &first, &BTreeSet::new()).unwrap();
        create_archive_from_dir(&staging, &second, &BTreeSet::new()).unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("package");
        staged_tree(&staging);
        symlink(&staging, staging.join("loop")).unwrap();
        symlink(staging.join("six.py"), staging.join("six_alias.py")).unwrap();
        symlink(staging.join("gone.py"), staging.join("dangling.py")).unwrap();
        let archive_path = dir.path().join("out.zip");

        let summary =
            create_archive_from_dir(&staging, &archive_path, &BTreeSet::new()).unwrap();

        let entries = list_entries(&archive_path).unwrap();
        assert!(entries.iter().all(|name| !name.starts_with("loop")));
        assert!(!entries.contains(&"dangling.py".to_string()));
        assert_eq!(summary, ArchiveSummary { files: 4, directories: 2 });
        assert_eq!(read_entry(&archive_path, "six_alias.py"), "# vendored\n");
    }

    #[test]
    fn append_to_missing_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let error = append_files(&dir.path().join("missing.zip"), &[]).unwrap_err();
        assert!(matches!(error, ArchiveError::Io(_)));
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Regular files directly inside `dir` whose extension is `extension`, sorted
/// by name. Subdirectories are not searched and dotfiles are skipped, the
/// same set a `*.<extension>` shell glob would match.
pub fn collect_source_files(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            tracing::warn!(
                path = %path.display(),
                "skipping file with a non-UTF-8 name; it cannot be stored as an archive entry"
            );
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        if !fs::metadata(&path)?.is_file() {
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

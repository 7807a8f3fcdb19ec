#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use lambda_packager_core::layout::PackageLayout;
use tempfile::TempDir;
use zip::ZipArchive;

/// Scratch function directory with a manifest and source files.
pub struct FunctionDir {
    dir: TempDir,
}

impl FunctionDir {
    pub fn new(manifest: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir should be creatable");
        fs::write(dir.path().join("requirements.txt"), manifest).expect("manifest write");
        Self { dir }
    }

    pub fn with_source(self, name: &str, contents: &str) -> Self {
        fs::write(self.dir.path().join(name), contents).expect("source write");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> PackageLayout {
        PackageLayout::new(self.dir.path())
    }
}

/// Sorted entry names of an archive.
pub fn sorted_entries(archive_path: &Path) -> Vec<String> {
    let mut archive = ZipArchive::new(File::open(archive_path).expect("archive should exist"))
        .expect("archive should be a zip");
    let mut names: Vec<String> = (0..archive.len())
        .map(|index| {
            archive
                .by_index(index)
                .expect("entry should be readable")
                .name()
                .to_string()
        })
        .collect();
    names.sort();
    names
}

pub fn entry_contents(archive_path: &Path, name: &str) -> String {
    let mut archive = ZipArchive::new(File::open(archive_path).expect("archive should exist"))
        .expect("archive should be a zip");
    let mut contents = String::new();
    archive
        .by_name(name)
        .expect("entry should exist")
        .read_to_string(&mut contents)
        .expect("entry should be utf-8");
    contents
}

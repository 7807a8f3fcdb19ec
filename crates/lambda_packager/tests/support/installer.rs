#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use lambda_packager::installer::{DependencyInstaller, InstallError};
use lambda_packager_core::manifest::Manifest;

/// In-process stand-in for pip: each known package name, or direct
/// reference location, maps to the files (relative path, contents) it drops
/// into the staging directory.
#[derive(Default)]
pub struct FakeInstaller {
    packages: BTreeMap<String, Vec<(String, String)>>,
    installs: Mutex<Vec<Vec<String>>>,
}

impl FakeInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, name: &str, files: &[(&str, &str)]) -> Self {
        self.packages.insert(
            name.to_string(),
            files
                .iter()
                .map(|(path, contents)| (path.to_string(), contents.to_string()))
                .collect(),
        );
        self
    }

    /// Requirement names, then direct reference locations, seen by each
    /// `install` call.
    pub fn installs(&self) -> Vec<Vec<String>> {
        self.installs.lock().expect("poisoned mutex").clone()
    }
}

impl DependencyInstaller for FakeInstaller {
    fn install(
        &self,
        _manifest_path: &Path,
        manifest: &Manifest,
        staging_dir: &Path,
    ) -> Result<(), InstallError> {
        let names: Vec<String> = manifest
            .requirements
            .iter()
            .map(|requirement| requirement.name.clone())
            .chain(
                manifest
                    .direct_references
                    .iter()
                    .map(|reference| reference.location.clone()),
            )
            .collect();
        self.installs
            .lock()
            .expect("poisoned mutex")
            .push(names.clone());

        for name in names {
            let Some(files) = self.packages.get(&name) else {
                return Err(InstallError {
                    message: format!("No matching distribution found for {name}"),
                    exit_code: Some(1),
                });
            };
            for (relative, contents) in files {
                let target = staging_dir.join(relative);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).expect("staging parent should be creatable");
                }
                fs::write(target, contents).expect("staged file should be writable");
            }
        }
        Ok(())
    }
}

/// Installer that must never be reached.
pub struct UnreachableInstaller;

impl DependencyInstaller for UnreachableInstaller {
    fn install(&self, _: &Path, _: &Manifest, _: &Path) -> Result<(), InstallError> {
        panic!("installer should not run for an empty manifest");
    }
}

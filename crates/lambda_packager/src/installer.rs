use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use lambda_packager_core::manifest::Manifest;
use lambda_packager_core::runtime::TargetRuntime;
use thiserror::Error;

pub const DEFAULT_PYTHON: &str = "python3";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InstallError {
    pub message: String,
    pub exit_code: Option<i32>,
}

impl InstallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn exited(command: &str, exit_code: Option<i32>) -> Self {
        let message = match exit_code {
            Some(code) => format!("`{command}` exited with status {code}"),
            None => format!("`{command}` was terminated by a signal"),
        };
        Self { message, exit_code }
    }
}

/// Resolves and fetches the manifest's dependencies into a staging directory.
pub trait DependencyInstaller {
    fn preflight(&self) -> Result<(), InstallError> {
        Ok(())
    }

    fn install(
        &self,
        manifest_path: &Path,
        manifest: &Manifest,
        staging_dir: &Path,
    ) -> Result<(), InstallError>;
}

/// Installs with `python -m pip install --target`, resolving binary wheels
/// for the target runtime rather than the host interpreter.
#[derive(Debug, Clone)]
pub struct PipInstaller {
    python: String,
    runtime: TargetRuntime,
}

impl PipInstaller {
    pub fn new(python: impl Into<String>, runtime: TargetRuntime) -> Self {
        Self {
            python: python.into(),
            runtime,
        }
    }

    pub fn runtime(&self) -> &TargetRuntime {
        &self.runtime
    }

    pub fn install_args(&self, manifest_path: &Path, staging_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-m", "pip", "install", "--requirement"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(manifest_path.as_os_str().to_owned());
        args.push("--target".into());
        args.push(staging_dir.as_os_str().to_owned());
        args.extend(
            [
                "--platform",
                self.runtime.platform_tag(),
                "--python-version",
                self.runtime.python_version(),
                "--implementation",
                "cp",
                "--only-binary=:all:",
                "--upgrade",
                "--no-input",
                "--disable-pip-version-check",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args
    }

    fn command_line(&self, args: &[OsString]) -> String {
        let rendered: Vec<_> = args.iter().map(|arg| arg.to_string_lossy()).collect();
        format!("{} {}", self.python, rendered.join(" "))
    }
}

impl Default for PipInstaller {
    fn default() -> Self {
        Self::new(DEFAULT_PYTHON, TargetRuntime::default())
    }
}

impl DependencyInstaller for PipInstaller {
    fn preflight(&self) -> Result<(), InstallError> {
        let output = Command::new(&self.python)
            .args(["-m", "pip", "--version"])
            .output()
            .map_err(|error| {
                InstallError::new(format!("failed to run `{}`: {error}", self.python))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InstallError::new(format!(
                "pip is not available for `{}`; install it or pass --python. details: {}",
                self.python,
                stderr.trim()
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(pip = %version.trim(), "installer preflight passed");
        Ok(())
    }

    fn install(
        &self,
        manifest_path: &Path,
        _manifest: &Manifest,
        staging_dir: &Path,
    ) -> Result<(), InstallError> {
        let manifest_path = absolute_path(manifest_path)?;
        let staging_dir = absolute_path(staging_dir)?;
        let args = self.install_args(&manifest_path, &staging_dir);
        let command_line = self.command_line(&args);
        tracing::info!("+ {command_line}");

        // Relative direct references in the manifest resolve against pip's
        // working directory, so run from the directory holding the manifest.
        let mut command = Command::new(&self.python);
        command.args(&args);
        if let Some(manifest_dir) = manifest_path.parent() {
            command.current_dir(manifest_dir);
        }
        let status = command
            .status()
            .map_err(|error| InstallError::new(format!("failed to run `{command_line}`: {error}")))?;

        if !status.success() {
            return Err(InstallError::exited(&command_line, status.code()));
        }
        Ok(())
    }
}

fn absolute_path(path: &Path) -> Result<PathBuf, InstallError> {
    std::path::absolute(path).map_err(|error| {
        InstallError::new(format!("failed to resolve '{}': {error}", path.display()))
    })
}

use std::fmt;

use thiserror::Error;

pub const DEFAULT_RUNTIME: &str = "python3.12";
const RUNTIME_PREFIX: &str = "python";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Architecture {
    #[default]
    X86_64,
    Arm64,
}

impl Architecture {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }

    /// Wheel platform tag pip should resolve binary distributions for.
    pub fn platform_tag(self) -> &'static str {
        match self {
            Self::X86_64 => "manylinux2014_x86_64",
            Self::Arm64 => "manylinux2014_aarch64",
        }
    }
}

/// Runtime the archive is built for. It only steers dependency resolution;
/// the archive format is the same for every runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRuntime {
    identifier: String,
    python_version: String,
    architecture: Architecture,
}

impl TargetRuntime {
    pub fn parse(identifier: &str, architecture: Architecture) -> Result<Self, ValidationError> {
        let identifier = identifier.trim();
        let version = identifier.strip_prefix(RUNTIME_PREFIX).ok_or_else(|| {
            ValidationError::new(format!(
                "runtime '{identifier}' is not a Python runtime (expected e.g. {DEFAULT_RUNTIME})"
            ))
        })?;

        let mut parts = version.split('.');
        let (Some(major), Some(minor), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ValidationError::new(format!(
                "runtime '{identifier}' must carry a major.minor version"
            )));
        };
        if !is_number(major) || !is_number(minor) {
            return Err(ValidationError::new(format!(
                "runtime '{identifier}' has a non-numeric version"
            )));
        }

        Ok(Self {
            identifier: identifier.to_string(),
            python_version: version.to_string(),
            architecture,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn python_version(&self) -> &str {
        &self.python_version
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    pub fn platform_tag(&self) -> &'static str {
        self.architecture.platform_tag()
    }
}

impl Default for TargetRuntime {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_RUNTIME.to_string(),
            python_version: DEFAULT_RUNTIME[RUNTIME_PREFIX.len()..].to_string(),
            architecture: Architecture::default(),
        }
    }
}

impl fmt::Display for TargetRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identifier, self.architecture.as_str())
    }
}

fn is_number(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit())
}

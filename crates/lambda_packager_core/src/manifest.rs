//! Dependency manifest (`requirements.txt`) parsing.
//!
//! The manifest is read line by line. Each non-blank, non-comment line is
//! a requirement (`name[extras] constraint`), a direct reference (local path,
//! archive file or URL), or an installer option line starting with `-`.
//! Direct references and option lines are kept verbatim for the installer.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid requirement '{text}': {reason}")]
    InvalidRequirement {
        line: usize,
        text: String,
        reason: &'static str,
    },
}

/// One dependency specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    pub constraint: Option<String>,
    /// 1-based line the specifier starts on.
    pub line: usize,
}

impl Requirement {
    /// Lowercase name with runs of `-`, `_` and `.` collapsed to `-`.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// A dependency named by location rather than by name, e.g. `./vendor/lib`,
/// `/opt/wheels/foo-1.0-py3-none-any.whl` or `git+https://host/repo.git`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectReference {
    pub location: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub requirements: Vec<Requirement>,
    pub direct_references: Vec<DirectReference>,
    pub options: Vec<String>,
}

impl Manifest {
    /// True when there is nothing for an installer to do.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
            && self.direct_references.is_empty()
            && self.options.is_empty()
    }

    /// Named requirements plus direct references.
    pub fn dependency_count(&self) -> usize {
        self.requirements.len() + self.direct_references.len()
    }

    /// Normalized names listed more than once, in sorted order. Direct
    /// references carry no name and are never reported.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for requirement in &self.requirements {
            let name = requirement.normalized_name();
            if !seen.insert(name.clone()) {
                duplicates.insert(name);
            }
        }
        duplicates.into_iter().collect()
    }
}

pub fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&text)
}

pub fn parse_manifest(text: &str) -> Result<Manifest, ManifestError> {
    let mut manifest = Manifest::default();

    for (line, content) in logical_lines(text) {
        let content = strip_comment(&content).trim().to_string();
        if content.is_empty() {
            continue;
        }
        if content.starts_with('-') {
            manifest.options.push(content);
            continue;
        }
        if is_direct_reference(&content) {
            manifest.direct_references.push(DirectReference {
                location: content,
                line,
            });
            continue;
        }
        manifest.requirements.push(parse_requirement(&content, line)?);
    }

    Ok(manifest)
}

pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
            }
            in_separator = true;
        } else {
            normalized.push(ch.to_ascii_lowercase());
            in_separator = false;
        }
    }
    normalized
}

/// Joins backslash continuations, yielding each logical line with the
/// number of the physical line it starts on.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in text.lines().enumerate() {
        let (start, mut buffer) = pending.take().unwrap_or((index + 1, String::new()));
        match raw.strip_suffix('\\') {
            Some(head) => {
                buffer.push_str(head);
                pending = Some((start, buffer));
            }
            None => {
                buffer.push_str(raw);
                lines.push((start, buffer));
            }
        }
    }

    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    let bytes = line.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b'#' && idx > 0 && bytes[idx - 1].is_ascii_whitespace() {
            return &line[..idx];
        }
    }
    line
}

const ARCHIVE_SUFFIXES: [&str; 5] = [".whl", ".zip", ".tar.gz", ".tar.bz2", ".tgz"];

/// Paths, archive files and URLs, which pip installs without a project name.
/// `name @ url` lines count too, since the URL decides what gets installed.
fn is_direct_reference(text: &str) -> bool {
    let location = text.split(';').next().unwrap_or(text).trim();
    location.starts_with(['.', '/', '~', '\\'])
        || location.contains("://")
        || location.starts_with("file:")
        || ARCHIVE_SUFFIXES
            .iter()
            .any(|suffix| location.to_ascii_lowercase().ends_with(suffix))
}

fn parse_requirement(text: &str, line: usize) -> Result<Requirement, ManifestError> {
    let invalid = |reason| ManifestError::InvalidRequirement {
        line,
        text: text.to_string(),
        reason,
    };

    let name_len = text
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
        .unwrap_or(text.len());
    let name = &text[..name_len];

    let starts_ok = name.chars().next().is_some_and(|ch| ch.is_ascii_alphanumeric());
    let ends_ok = name.chars().last().is_some_and(|ch| ch.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok {
        return Err(invalid("name must start and end with a letter or digit"));
    }

    let mut rest = text[name_len..].trim_start();
    let mut extras = Vec::new();
    if let Some(after_bracket) = rest.strip_prefix('[') {
        let close = after_bracket
            .find(']')
            .ok_or_else(|| invalid("unterminated extras list"))?;
        extras = after_bracket[..close]
            .split(',')
            .map(str::trim)
            .filter(|extra| !extra.is_empty())
            .map(str::to_string)
            .collect();
        rest = after_bracket[close + 1..].trim_start();
    }

    let constraint = rest.trim();
    Ok(Requirement {
        name: name.to_string(),
        extras,
        constraint: (!constraint.is_empty()).then(|| constraint.to_string()),
        line,
    })
}

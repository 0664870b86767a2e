//! Formula data model
//!
//! A formula is a primary resource (the packaged application) plus a flat,
//! ordered list of pinned resources. Everything here is immutable once
//! loaded; the engine only reads it.

pub mod audit;
pub mod version;

use crate::core::error::{FormulaError, Result};
use crate::helpers::url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A 256-bit content digest, stored as 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum(String);

impl Checksum {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a computed hex digest.
    pub fn matches(&self, actual_hex: &str) -> bool {
        self.0.eq_ignore_ascii_case(actual_hex)
    }
}

impl TryFrom<String> for Checksum {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.len() != 64 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FormulaError::Invalid(format!(
                "sha256 must be 64 hex characters, got '{}'",
                value
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl TryFrom<&str> for Checksum {
    type Error = FormulaError;

    fn try_from(value: &str) -> Result<Self> {
        Self::try_from(value.to_string())
    }
}

impl From<Checksum> for String {
    fn from(value: Checksum) -> Self {
        value.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pinned archive: name, source URL and expected sha256.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub url: String,
    pub sha256: Checksum,
}

impl Resource {
    /// File name used when staging the archive
    pub fn filename(&self) -> String {
        url::extract_filename(&self.url)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FormulaError::Invalid("resource name cannot be empty".into()));
        }
        url::validate_url_scheme(&self.url, url::FETCH_SCHEMES)
            .map_err(|e| FormulaError::Invalid(format!("resource '{}': {}", self.name, e)))
    }
}

/// A runtime or build-time dependency such as `python@3.11` or `cmake`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dependency(pub String);

impl Dependency {
    /// Name of the executable that must be on PATH for this dependency.
    ///
    /// `python@3.11` -> `python3.11`, `rust` -> `rustc`, anything else
    /// is looked up as-is with any `@version` suffix dropped.
    pub fn executable(&self) -> String {
        match self.0.split_once('@') {
            Some(("python", version)) => format!("python{}", version),
            Some((name, _)) => Self::alias(name).to_string(),
            None => Self::alias(&self.0).to_string(),
        }
    }

    /// Whether this is a versioned python runtime such as `python@3.11`
    pub fn is_python(&self) -> bool {
        self.0.starts_with("python@")
    }

    fn alias(name: &str) -> &str {
        match name {
            "rust" => "rustc",
            other => other,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully loaded formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub license: String,
    pub url: String,
    pub sha256: Checksum,
    #[serde(default)]
    pub depends_on: Vec<Dependency>,
    #[serde(default)]
    pub build_depends_on: Vec<Dependency>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Formula {
    /// The primary package as a resource declaration
    pub fn source(&self) -> Resource {
        Resource {
            name: self.name.clone(),
            url: self.url.clone(),
            sha256: self.sha256.clone(),
        }
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// The declared `python@X.Y` runtime, if any
    pub fn python(&self) -> Option<&Dependency> {
        self.depends_on.iter().find(|d| d.is_python())
    }

    /// Every dependency, build-time first
    pub fn all_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.build_depends_on.iter().chain(self.depends_on.iter())
    }

    /// Check the invariants of a loaded formula.
    pub fn validate(&self) -> Result<()> {
        if !is_path_component(&self.name) {
            return Err(FormulaError::Invalid(format!(
                "invalid formula name '{}'",
                self.name
            )));
        }
        if !is_path_component(&self.version) {
            return Err(FormulaError::Invalid(format!(
                "invalid version '{}'",
                self.version
            )));
        }
        self.source().validate()?;

        let mut seen = HashSet::new();
        for resource in &self.resources {
            resource.validate()?;
            if !seen.insert(resource.name.to_ascii_lowercase()) {
                return Err(FormulaError::Invalid(format!(
                    "duplicate resource '{}'",
                    resource.name
                )));
            }
        }
        Ok(())
    }
}

/// Whether `value` is safe as one directory name under the cellar:
/// `[A-Za-z0-9._+-]`, not starting with a dot, no `..` anywhere.
pub fn is_path_component(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('.')
        && !value.contains("..")
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
}

/// Infer a version from an archive URL.
///
/// `posting-1.11.0.tar.gz` -> `1.11.0`, `v1.10.2.tar.gz` -> `1.10.2`.
pub fn infer_version(source_url: &str) -> Option<String> {
    let filename = url::extract_filename(source_url);
    let stem = url::strip_archive_extension(&filename);

    let candidate = match stem.rsplit_once('-') {
        Some((_, tail)) => tail,
        None => stem,
    };
    let candidate = candidate.strip_prefix('v').unwrap_or(candidate);

    if candidate.starts_with(|c: char| c.is_ascii_digit()) {
        Some(candidate.to_string())
    } else {
        None
    }
}

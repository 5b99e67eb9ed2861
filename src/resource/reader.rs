//! @ai:module:intent Resolve benchmark and SQL locations to readable files
//! @ai:module:layer infrastructure
//! @ai:module:public_api FileReader, Resource, Location
//! @ai:module:stateless true

use crate::error::{LoadError, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use url::Url;
use walkdir::WalkDir;

const CLASSPATH_PREFIX: &str = "classpath:";
const FILE_PREFIX: &str = "file:";

/// @ai:intent Parsed form of a location string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Path looked up under the reader's classpath roots
    Classpath(String),
    /// Plain filesystem path, absolute or relative to the working directory
    File(PathBuf),
}

impl Location {
    /// @ai:intent Parse `classpath:`, `file:`, URL, absolute and relative location syntax
    /// @ai:effects pure
    pub fn parse(location: &str) -> Result<Self> {
        if let Some(rest) = location.strip_prefix(CLASSPATH_PREFIX) {
            return Ok(Location::Classpath(rest.trim_start_matches('/').to_string()));
        }

        if let Some(rest) = location.strip_prefix(FILE_PREFIX) {
            if !rest.starts_with('/') {
                return Ok(Location::File(PathBuf::from(rest)));
            }

            let url = Url::parse(location)
                .map_err(|e| LoadError::LocationNotFound(format!("{}: {}", location, e)))?;
            let path = url
                .to_file_path()
                .map_err(|_| LoadError::LocationNotFound(location.to_string()))?;
            return Ok(Location::File(path));
        }

        if has_url_scheme(location) {
            return Err(LoadError::LocationNotFound(format!(
                "{} (unsupported scheme)",
                location
            )));
        }

        // Absolute paths keep their leading slash untouched.
        Ok(Location::File(PathBuf::from(location)))
    }
}

/// @ai:intent Detect `scheme:` prefixes; single-letter schemes are drive letters
/// @ai:effects pure
fn has_url_scheme(location: &str) -> bool {
    match location.split_once(':') {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme
                    .chars()
                    .next()
                    .map(|c| c.is_ascii_alphabetic())
                    .unwrap_or(false)
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// @ai:intent A resolved, existing file or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    location: String,
    path: PathBuf,
}

impl Resource {
    /// @ai:intent Location string the resource was resolved from (or discovered as)
    /// @ai:effects pure
    pub fn location(&self) -> &str {
        &self.location
    }

    /// @ai:intent Filesystem path backing the resource
    /// @ai:effects pure
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// @ai:intent Resource for a path relative to this resource's directory
    /// @ai:effects pure
    pub fn sibling(&self, relative: &str) -> Resource {
        let parent = self.path.parent().unwrap_or_else(|| Path::new(""));
        let path = parent.join(relative);
        Resource {
            location: path.display().to_string(),
            path,
        }
    }

    /// @ai:intent Read the whole resource as UTF-8 text
    /// @ai:effects fs:read
    pub fn read_to_string(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|source| LoadError::ReadFailure {
            path: self.path.clone(),
            source,
        })
    }
}

/// @ai:intent Resolves location strings and lists files by glob
#[derive(Debug, Clone)]
pub struct FileReader {
    classpath_roots: Vec<PathBuf>,
}

impl FileReader {
    /// @ai:intent Create a reader searching `classpath:` locations under the given roots
    /// @ai:effects pure
    pub fn new(classpath_roots: Vec<PathBuf>) -> Self {
        Self { classpath_roots }
    }

    /// @ai:intent Resolve a location to an existing resource
    /// @ai:effects fs:read
    pub fn resolve(&self, location: &str) -> Result<Resource> {
        let path = match Location::parse(location)? {
            Location::Classpath(relative) => self
                .classpath_roots
                .iter()
                .map(|root| root.join(&relative))
                .find(|candidate| candidate.exists())
                .ok_or_else(|| LoadError::LocationNotFound(location.to_string()))?,
            Location::File(path) => {
                if !path.exists() {
                    return Err(LoadError::LocationNotFound(location.to_string()));
                }
                path
            }
        };

        Ok(Resource {
            location: location.to_string(),
            path,
        })
    }

    /// @ai:intent List files under a directory resource whose relative path matches a glob
    /// @ai:pre base is a directory
    /// @ai:post result is sorted by path
    /// @ai:effects fs:read
    pub fn glob(&self, base: &Resource, pattern: &str) -> Result<Vec<Resource>> {
        let matcher = Pattern::new(pattern)
            .map_err(|e| LoadError::InvalidConfig(format!("glob {}: {}", pattern, e)))?;
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        let mut resources = Vec::new();

        for entry in WalkDir::new(base.path()).follow_links(true) {
            let entry = entry.map_err(|e| LoadError::ReadFailure {
                path: base.path().to_path_buf(),
                source: e.into(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_path(base.path(), entry.path());
            if matcher.matches_with(&relative, options) {
                resources.push(Resource {
                    location: entry.path().display().to_string(),
                    path: entry.path().to_path_buf(),
                });
            }
        }

        resources.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(resources)
    }
}

impl Default for FileReader {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(".")])
    }
}

/// @ai:intent Relative path of `file` under `base`, always `/`-separated
/// @ai:effects pure
pub fn relative_path(base: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

//! Resource manifest parsing.
//!
//! The descriptor is line oriented. Each non-empty, non-comment line names one
//! resource, either in the resource-script form
//!
//! ```text
//! INCBIN(Configurable, "lib/Configurable.os")
//! ```
//!
//! or as a plain `name path` pair. Relative paths resolve against the
//! directory holding the descriptor.

use kettle_shared::errors::{KettleError, KettleResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    pub source_path: PathBuf,
}

impl ResourceEntry {
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
        }
    }
}

/// Ordered list of named resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceManifest {
    entries: Vec<ResourceEntry>,
}

impl ResourceManifest {
    pub fn new(entries: Vec<ResourceEntry>) -> Self {
        Self { entries }
    }

    /// Read and parse a descriptor file.
    pub fn from_file(path: &Path) -> KettleResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            KettleError::Bundler(format!(
                "failed to read resource manifest {}: {}",
                path.display(),
                e
            ))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base_dir)
    }

    /// Parse descriptor text. Relative paths are joined onto `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> KettleResult<Self> {
        let mut entries = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }

            let (name, path) = parse_line(line).ok_or_else(|| {
                KettleError::Bundler(format!(
                    "malformed manifest line {}: '{}'",
                    index + 1,
                    line
                ))
            })?;

            if !is_c_identifier(name) {
                return Err(KettleError::Bundler(format!(
                    "invalid resource name '{}' on line {}",
                    name,
                    index + 1
                )));
            }

            let path = Path::new(path);
            let source_path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            };
            entries.push(ResourceEntry::new(name, source_path));
        }

        let manifest = Self { entries };
        manifest.check_unique()?;
        Ok(manifest)
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject duplicate names.
    pub fn check_unique(&self) -> KettleResult<()> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(KettleError::Bundler(format!(
                    "duplicate resource name '{}'",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    if let Some(rest) = line.strip_prefix("INCBIN(") {
        let rest = rest.trim_end_matches(';').trim_end();
        let inner = rest.strip_suffix(')')?;
        let (name, path) = inner.split_once(',')?;
        let path = unquote(path.trim())?;
        return Some((name.trim(), path));
    }

    let (name, path) = line.split_once(char::is_whitespace)?;
    let path = unquote(path.trim())?;
    Some((name, path))
}

fn unquote(s: &str) -> Option<&str> {
    let s = match s.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"')?,
        None => s,
    };
    if s.is_empty() { None } else { Some(s) }
}

/// Resource names become C symbols in the generated container.
pub(crate) fn is_c_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

//! Shell-glob exclusion of file and directory names.

use once_cell::sync::OnceCell;
use std::path::Path;

/// Ignore patterns as accepted at the public API boundary: nothing, a single
/// glob string, or a list of glob strings. Normalized to a list once at job
/// start.
#[derive(Debug, Clone)]
pub enum IgnoreSpec {
    None,
    Pattern(String),
    Patterns(Vec<String>),
}

impl IgnoreSpec {
    fn into_patterns(self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::Pattern(p) => vec![p],
            Self::Patterns(ps) => ps,
        }
    }
}

impl From<&str> for IgnoreSpec {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

impl From<String> for IgnoreSpec {
    fn from(pattern: String) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<Vec<String>> for IgnoreSpec {
    fn from(patterns: Vec<String>) -> Self {
        Self::Patterns(patterns)
    }
}

impl From<&[&str]> for IgnoreSpec {
    fn from(patterns: &[&str]) -> Self {
        Self::Patterns(patterns.iter().map(|p| p.to_string()).collect())
    }
}

impl From<Option<Vec<String>>> for IgnoreSpec {
    fn from(patterns: Option<Vec<String>>) -> Self {
        match patterns {
            Some(ps) => Self::Patterns(ps),
            None => Self::None,
        }
    }
}

/// Decides inclusion of a file or directory by its base name. A name is
/// excluded when any pattern matches under shell-glob semantics
/// (`*`, `?`, `[...]`). An empty pattern list includes everything.
#[derive(Debug)]
pub struct IgnoreFilter {
    patterns: Vec<String>,
    compiled: OnceCell<globset::GlobSet>,
}

impl IgnoreFilter {
    pub fn new(spec: impl Into<IgnoreSpec>) -> Self {
        Self {
            patterns: spec.into().into_patterns(),
            compiled: OnceCell::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn build_globset(patterns: &[String]) -> globset::GlobSet {
        let mut builder = globset::GlobSetBuilder::new();
        for pat in patterns {
            if let Ok(glob) = globset::Glob::new(pat) {
                builder.add(glob);
            }
        }
        builder.build().unwrap_or_else(|_| globset::GlobSet::empty())
    }

    fn globs(&self) -> &globset::GlobSet {
        self.compiled
            .get_or_init(|| Self::build_globset(&self.patterns))
    }

    /// True when `name` (a base name, not a path) survives every pattern.
    pub fn should_include(&self, name: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        !self.globs().is_match(name)
    }

    /// Tests the base name of `path`. Paths without a base name (e.g. `/`)
    /// are always included.
    pub fn allows_path(&self, path: &Path) -> bool {
        match path.file_name() {
            Some(name) => self.should_include(&name.to_string_lossy()),
            None => true,
        }
    }
}

impl Clone for IgnoreFilter {
    fn clone(&self) -> Self {
        Self {
            patterns: self.patterns.clone(),
            compiled: OnceCell::new(),
        }
    }
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::new(IgnoreSpec::None)
    }
}

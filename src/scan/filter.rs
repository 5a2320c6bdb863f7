// Ignored-prefix filtering
// Decides which paths the walker skips

use super::error::ScanError;
use std::path::Path;

/// Set of ignored path prefixes
///
/// Matching is a plain prefix test on the raw path bytes, not on path
/// segments: an ignored prefix of `/sys` also skips `/systemd`. The walker
/// uses the same test to prune directories, so an ignored directory's whole
/// subtree is skipped without being read.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    prefixes: Vec<String>,
}

impl PathFilter {
    /// Build a filter from a set of prefixes
    ///
    /// # Returns
    /// `InvalidConfig` if any prefix is empty, since an empty prefix would
    /// match every path
    pub fn new<I, S>(prefixes: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected = Vec::new();
        for prefix in prefixes {
            let prefix = prefix.into();
            if prefix.is_empty() {
                return Err(ScanError::invalid_config(
                    "ignored prefixes must not be empty",
                ));
            }
            if !collected.contains(&prefix) {
                collected.push(prefix);
            }
        }
        Ok(Self {
            prefixes: collected,
        })
    }

    /// True if `path` starts with any ignored prefix
    pub fn should_skip(&self, path: &Path) -> bool {
        let bytes = path.as_os_str().as_encoded_bytes();
        self.prefixes
            .iter()
            .any(|prefix| bytes.starts_with(prefix.as_bytes()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

// Tests moved to tests/scan/filter_tests.rs

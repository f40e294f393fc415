//! Config file discovery.
//!
//! Files are returned in merge order (lowest precedence first):
//! 1. `config.yaml` (or `config.yml` when no `.yaml` exists)
//! 2. `config.*.yaml` partials, sorted, minus the command and environment files
//! 3. `config.{command}.yaml` / `.yml`
//! 4. `config.{environment}.yaml` / `.yml`
//! 5. Extra patterns supplied by the caller, in order
//!
//! Missing candidates are skipped. A path is never returned twice.

use super::loader::LoaderOptions;
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const BASE_NAME: &str = "config";

/// Discover the files to merge for these options under `environment`.
pub fn discover(options: &LoaderOptions, environment: &str) -> Result<Vec<PathBuf>> {
    let dir = options.config_dir.as_path();
    let command = options.command_name.as_str();
    let mut files = DiscoveredFiles::default();

    // 1. Base
    files.push_first_existing(dir, BASE_NAME);

    // 2. Partials
    for partial in glob_sorted(dir, &format!("{}.*.yaml", BASE_NAME)) {
        let suffix = partial_suffix(&partial);
        if suffix.is_some_and(|s| s == command || s == environment) {
            continue;
        }
        files.push(partial);
    }

    // 3. Command-specific
    if !command.is_empty() {
        files.push_first_existing(dir, &format!("{}.{}", BASE_NAME, command));
    }

    // 4. Environment-specific
    if !environment.is_empty() {
        files.push_first_existing(dir, &format!("{}.{}", BASE_NAME, environment));
    }

    // 5. Extra patterns
    for pattern in &options.patterns {
        for path in glob_sorted(dir, pattern) {
            files.push(path);
        }
    }

    if files.0.is_empty() {
        return Err(ConfigError::NoFilesFound {
            dir: dir.to_path_buf(),
        });
    }
    Ok(files.0)
}

/// Ordered, duplicate-free list of existing files.
#[derive(Default)]
struct DiscoveredFiles(Vec<PathBuf>);

impl DiscoveredFiles {
    fn push(&mut self, path: PathBuf) {
        if !path.is_file() {
            return;
        }
        if self.0.contains(&path) {
            debug!(path = %path.display(), "Skipping already discovered config file");
            return;
        }
        debug!(path = %path.display(), "Discovered config file");
        self.0.push(path);
    }

    /// Push `{stem}.yaml`, or `{stem}.yml` when the former does not exist.
    fn push_first_existing(&mut self, dir: &Path, stem: &str) {
        let candidate = ["yaml", "yml"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext)))
            .find(|path| path.is_file());
        if let Some(path) = candidate {
            self.push(path);
        }
    }
}

/// `config.feature.yaml` -> `feature`.
fn partial_suffix(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .strip_prefix(BASE_NAME)?
        .strip_prefix('.')?
        .strip_suffix(".yaml")
}

/// Expand `pattern` relative to `dir`, sorted lexically.
fn glob_sorted(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
    let full = Path::new(&escaped_dir).join(pattern);

    let paths = match glob::glob(&full.to_string_lossy()) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Ignoring invalid config file pattern");
            return Vec::new();
        }
    };

    let mut matched: Vec<PathBuf> = paths.filter_map(|entry| entry.ok()).collect();
    matched.sort();
    matched
}

//! Loading suite configuration and per-test result documents.
//!
//! Result paths in a config are globs relative to the config file's
//! directory. Every matched file must be an `rdbench.results.v1` document
//! and every test name must be unique across the suite.

use anyhow::Context;
use rdbench_types::{RESULTS_SCHEMA_V1, ResultsDocument, SuiteConfig, TestRun};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{path}: unsupported schema {found:?} (expected \"rdbench.results.v1\")")]
    UnsupportedSchema { path: String, found: String },

    #[error("invalid result pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no result files match {pattern:?}")]
    NoMatches { pattern: String },

    #[error("test {name:?} is defined twice ({first} and {second})")]
    DuplicateTest {
        name: String,
        first: String,
        second: String,
    },
}

/// A loaded config plus the directory its relative paths resolve against.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: SuiteConfig,
    pub base_dir: PathBuf,
}

impl LoadedConfig {
    /// Workbook path from `[suite] out_dir` and the suite name.
    pub fn default_output(&self) -> PathBuf {
        let dir = match self.config.suite.out_dir.as_deref() {
            Some(dir) => self.base_dir.join(dir),
            None => self.base_dir.clone(),
        };
        dir.join(format!("{}.workbook.json", self.config.suite_name()))
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<LoadedConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config: SuiteConfig =
        toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    debug!(path = %path.display(), summaries = config.summaries.len(), "config loaded");
    Ok(LoadedConfig { config, base_dir })
}

/// Expand result patterns relative to `base_dir`, sorted and deduplicated.
/// A pattern that matches nothing is an error.
pub fn resolve_patterns(base_dir: &Path, patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let full = if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            base_dir.join(pattern)
        };
        let full = full.to_string_lossy().into_owned();

        let entries = glob::glob(&full).map_err(|source| IngestError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        let mut matched: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry.with_context(|| format!("expand {pattern}"))?;
            if path.is_file() {
                matched.push(path);
            }
        }
        if matched.is_empty() {
            return Err(IngestError::NoMatches {
                pattern: pattern.clone(),
            }
            .into());
        }
        matched.sort();
        for path in matched {
            if !out.contains(&path) {
                out.push(path);
            }
        }
    }
    Ok(out)
}

pub fn parse_results(text: &str, origin: &str) -> anyhow::Result<ResultsDocument> {
    let doc: ResultsDocument =
        serde_json::from_str(text).with_context(|| format!("parse json {origin}"))?;
    if doc.schema != RESULTS_SCHEMA_V1 {
        return Err(IngestError::UnsupportedSchema {
            path: origin.to_string(),
            found: doc.schema,
        }
        .into());
    }
    Ok(doc)
}

pub fn load_results(path: &Path) -> anyhow::Result<ResultsDocument> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_results(&text, &path.display().to_string())
}

/// Load every result document the patterns match.
pub fn load_runs(base_dir: &Path, patterns: &[String]) -> anyhow::Result<Vec<TestRun>> {
    let paths = resolve_patterns(base_dir, patterns)?;
    let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut runs = Vec::with_capacity(paths.len());

    for path in paths {
        let doc = load_results(&path)?;
        if let Some(first) = seen.get(&doc.name) {
            return Err(IngestError::DuplicateTest {
                name: doc.name,
                first: first.display().to_string(),
                second: path.display().to_string(),
            }
            .into());
        }
        debug!(path = %path.display(), test = %doc.name, records = doc.records.len(), "results loaded");
        seen.insert(doc.name.clone(), path);
        runs.push(TestRun::from(doc));
    }

    info!(tests = runs.len(), "result documents loaded");
    Ok(runs)
}

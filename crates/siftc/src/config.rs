use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sift_contracts::{SIFT_CONFIG_SCHEMA_VERSION, SIFT_CONFIG_SCHEMA_VERSIONS_SUPPORTED};

use crate::checks::CheckId;
use crate::diagnostics::Severity;

pub const DEFAULT_EXCLUDED_FIELD_ANNOTATIONS: &[&str] =
    &["com.google.inject.testing.fieldbinder.Bind"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Off,
    Error,
    Warning,
    Info,
    Hint,
}

impl Level {
    pub fn severity(self) -> Option<Severity> {
        match self {
            Level::Off => None,
            Level::Error => Some(Severity::Error),
            Level::Warning => Some(Severity::Warning),
            Level::Info => Some(Severity::Info),
            Level::Hint => Some(Severity::Hint),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintOptions {
    pub levels: BTreeMap<CheckId, Level>,
    /// Marker annotations (qualified or simple names) that keep a field out of
    /// collection narrowing.
    pub excluded_field_annotations: Vec<String>,
    pub allow_distinct_iteration: bool,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            levels: BTreeMap::new(),
            excluded_field_annotations: DEFAULT_EXCLUDED_FIELD_ANNOTATIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allow_distinct_iteration: false,
        }
    }
}

impl LintOptions {
    /// Effective severity of a check, `None` when it is turned off.
    pub fn severity_for(&self, check: CheckId) -> Option<Severity> {
        match self.levels.get(&check) {
            Some(level) => level.severity(),
            None => Some(check.default_severity()),
        }
    }

    pub fn is_enabled(&self, check: CheckId) -> bool {
        self.severity_for(check).is_some()
    }

    pub fn is_excluded_annotation(&self, annotation: &str) -> bool {
        self.excluded_field_annotations.iter().any(|ex| {
            if ex == annotation {
                return true;
            }
            // An unqualified name on either side matches by simple name.
            (!annotation.contains('.') && simple_name(ex) == annotation)
                || (!ex.contains('.') && simple_name(annotation) == ex)
        })
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    schema_version: String,
    #[serde(default)]
    checks: BTreeMap<CheckId, Level>,
    #[serde(default)]
    excluded_field_annotations: Option<Vec<String>>,
    #[serde(default)]
    allow_distinct_iteration: bool,
}

pub fn parse_config(bytes: &[u8]) -> Result<LintOptions> {
    let file: ConfigFile = serde_json::from_slice(bytes).context("parse sift config JSON")?;
    if !SIFT_CONFIG_SCHEMA_VERSIONS_SUPPORTED.contains(&file.schema_version.as_str()) {
        anyhow::bail!(
            "config schema_version mismatch: expected {} got {:?}",
            SIFT_CONFIG_SCHEMA_VERSION,
            file.schema_version
        );
    }
    let mut options = LintOptions {
        levels: file.checks,
        allow_distinct_iteration: file.allow_distinct_iteration,
        ..LintOptions::default()
    };
    if let Some(excluded) = file.excluded_field_annotations {
        options.excluded_field_annotations = excluded;
    }
    Ok(options)
}

pub fn load_config(path: &Path) -> Result<LintOptions> {
    let bytes = std::fs::read(path).with_context(|| format!("read config: {}", path.display()))?;
    parse_config(&bytes).with_context(|| format!("load config: {}", path.display()))
}

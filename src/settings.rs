use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::scoring::{ConfigError, ScoringConfig, ScoringTable, TriageConfig};

pub const DEFAULT_LABEL: &str = "Vitalscope";

/// Everything a session is configured with. Every field has a default, so a
/// settings file only needs the parts it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Prefix of every sink header.
    pub label: String,
    pub scoring: ScoringConfig,
    pub triage: TriageConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.into(),
            scoring: ScoringConfig::default(),
            triage: TriageConfig::default(),
        }
    }
}

impl Settings {
    /// Reads and validates a settings file. A missing file means defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            Self::from_json(&contents)
                .with_context(|| format!("Invalid settings in {}", path.display()))?
        } else {
            Self::default()
        };
        Ok(settings)
    }

    /// Like [`Settings::load`], but a missing file is an error. For paths a
    /// user named explicitly.
    pub fn load_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("settings file {} does not exist", path.display());
        }
        Self::load(path)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ScoringTable::new(&self.scoring)?;
        self.triage.validate()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SignalKind;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn explicitly_named_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typo.json");
        let err = Settings::load_existing(&path).unwrap_err();
        assert!(err.to_string().contains("typo.json"));

        Settings::default().save(&path).unwrap();
        assert_eq!(Settings::load_existing(&path).unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vitalscope.json");
        let mut settings = Settings::default();
        settings.label = "Checkout".into();
        settings.triage.long_task_report_over_ms = 50.0;
        settings.triage.minor_max_ms = 125.0;
        settings.triage.moderate_max_ms = 200.0;
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn inverted_threshold_in_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{"scoring":{"thresholds":[{"signal":"CLS","good":5,"needsImprovement":2}]}}"#,
        )
        .unwrap();

        let err = Settings::load(&path).unwrap_err();
        let config_error = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ConfigError>())
            .cloned();
        assert_eq!(
            config_error,
            Some(ConfigError::InvertedThreshold {
                signal: SignalKind::Cls,
                good: 5.0,
                needs_improvement: 2.0,
            })
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Settings::from_json("{ not json").is_err());
    }
}

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SheetError;

/// Sentinel values filled in when the archive document carries no usable
/// value for a field. Threaded into the extractor and the normalizer so the
/// defaults are never hard-coded at the lookup site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefaults {
    pub missing_attribute: String,
    pub unknown_organism: String,
}

impl Default for AttributeDefaults {
    fn default() -> Self {
        Self {
            missing_attribute: "not provided".to_string(),
            unknown_organism: "unknown".to_string(),
        }
    }
}

/// Optional `seqsheet.json` settings file. Every field is optional; absent
/// values fall back to the built-in defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub retmax: Option<u32>,
    #[serde(default)]
    pub fetch_delay_ms: Option<u64>,
    #[serde(default)]
    pub min_read_count: Option<u64>,
    #[serde(default)]
    pub missing_attribute: Option<String>,
    #[serde(default)]
    pub unknown_organism: Option<String>,
}

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Default, Clone)]
pub struct SettingsOverrides {
    pub api_key: Option<String>,
    pub retmax: Option<u32>,
    pub fetch_delay_ms: Option<u64>,
    pub min_read_count: Option<u64>,
}

/// Fully resolved runtime settings: flag over file over default.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub retmax: u32,
    pub fetch_delay: Duration,
    pub min_read_count: u64,
    pub defaults: AttributeDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_sources(ConfigFile::default(), SettingsOverrides::default())
    }
}

impl Settings {
    pub fn from_sources(file: ConfigFile, overrides: SettingsOverrides) -> Self {
        let defaults = AttributeDefaults::default();
        Self {
            api_key: overrides.api_key.or(file.api_key),
            retmax: overrides.retmax.or(file.retmax).unwrap_or(10_000),
            fetch_delay: Duration::from_millis(
                overrides.fetch_delay_ms.or(file.fetch_delay_ms).unwrap_or(100),
            ),
            min_read_count: overrides
                .min_read_count
                .or(file.min_read_count)
                .unwrap_or(10_000),
            defaults: AttributeDefaults {
                missing_attribute: file
                    .missing_attribute
                    .unwrap_or(defaults.missing_attribute),
                unknown_organism: file.unknown_organism.unwrap_or(defaults.unknown_organism),
            },
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the settings file. An explicit `--config` path must exist; the
    /// implicit `seqsheet.json` is optional and silently defaults when absent.
    pub fn resolve(path: Option<&str>) -> Result<ConfigFile, SheetError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("seqsheet.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SheetError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| SheetError::ConfigParse(err.to_string()))
    }
}

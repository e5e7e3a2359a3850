use crate::error::{Result, ShopError};
use crate::store::adapters::{AdapterRegistry, DateAdapter, DEFAULT_DATE_FORMAT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";

pub const KEYS: &[&str] = &["obfuscate", "date-format"];

/// Configuration for a workshop, stored in `<data>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShopConfig {
    /// Write collection files XOR + base64 encoded instead of plain JSON
    #[serde(default)]
    pub obfuscate: bool,

    /// `strftime` format used for dates inside collection files
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            obfuscate: false,
            date_format: default_date_format(),
        }
    }
}

impl ShopConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let config_path = data_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: ShopConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, data_dir: P) -> Result<()> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(data_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    /// Adapter set matching this configuration.
    pub fn adapters(&self) -> AdapterRegistry {
        AdapterRegistry::with_defaults(&self.date_format)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "obfuscate" => Some(self.obfuscate.to_string()),
            "date-format" => Some(self.date_format.clone()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "obfuscate" => {
                self.obfuscate = parse_bool(value).ok_or_else(|| {
                    ShopError::Invalid(format!("obfuscate expects true or false, got '{}'", value))
                })?;
            }
            "date-format" => {
                DateAdapter::checked(value).map_err(ShopError::Invalid)?;
                self.date_format = value.to_string();
            }
            _ => {
                return Err(ShopError::Invalid(format!(
                    "Unknown config key: {} (known: {})",
                    key,
                    KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

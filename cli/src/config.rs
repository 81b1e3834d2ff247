//! CLI Configuration

use clap::ValueEnum;
use procdesk_fields::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub default_format: Option<String>,
    pub bundle: Option<String>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self, String> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| e.to_string())?;
            toml::from_str(&content).map_err(|e| e.to_string())
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf, String> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, content).map_err(|e| e.to_string())?;
        Ok(path)
    }

    /// Configured output format, `table` when unset or unrecognized
    pub fn format(&self) -> OutputFormat {
        self.default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
            .unwrap_or(OutputFormat::Table)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "default_format" => {
                OutputFormat::from_str(value, true)?;
                self.default_format = Some(value.to_string());
            }
            "bundle" => self.bundle = Some(value.to_string()),
            "engine.validate_on_change" => self.engine.validate_on_change = parse(key, value)?,
            "engine.lookup_row_limit" => self.engine.lookup_row_limit = parse(key, value)?,
            "engine.lookup_cache_capacity" => self.engine.lookup_cache_capacity = parse(key, value)?,
            "engine.fallback_section_label" => self.engine.fallback_section_label = value.to_string(),
            "engine.general_section_label" => self.engine.general_section_label = value.to_string(),
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    fn config_path(profile: Option<&str>) -> Result<PathBuf, String> {
        let home = dirs::home_dir().ok_or("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".procdesk").join(filename))
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value.parse().map_err(|_| format!("Invalid value for {}: {}", key, value))
}

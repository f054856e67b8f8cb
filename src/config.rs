use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{EngineSettings, PinError, Result, SupersededLookups};

const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const DEFAULT_USER_AGENT: &str = concat!("pinmark/", env!("CARGO_PKG_VERSION"));

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory where locations are stored
    pub data_dir: PathBuf,

    /// Name of the blob holding the location collection
    pub storage_key: String,

    /// Reverse geocoding endpoint (Nominatim compatible)
    pub geocoder_url: String,

    /// User agent sent to the geocoder
    pub user_agent: Option<String>,

    /// Zoom level used when centering on a location
    pub zoom_level: u8,

    /// Give up on a lookup after this many seconds; no limit when unset
    pub lookup_timeout_secs: Option<u64>,

    /// Whether lookups overtaken by a newer click still add a location
    pub superseded_lookups: SupersededLookups,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: "locations".to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: None,
            zoom_level: 13,
            lookup_timeout_secs: None,
            superseded_lookups: SupersededLookups::Commit,
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("", "", "pinmark") {
            Some(dirs) => dirs.config_dir().join("config.json"),
            None => PathBuf::from("pinmark.json"),
        }
    }

    /// Loads the configuration, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse config {}: {}", path.display(), e);
            PinError::ConfigError {
                message: format!("{}: {}", path.display(), e),
            }
        })
    }

    /// Writes the configuration as pretty JSON, atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(path).map_err(|e| PinError::Io(e.error))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    // Configured value first, then the environment, then a built-in default
    pub fn get_user_agent(&self) -> String {
        if let Some(agent) = &self.user_agent {
            return agent.clone();
        }

        if let Ok(agent) = std::env::var("PINMARK_USER_AGENT") {
            return agent;
        }

        DEFAULT_USER_AGENT.to_string()
    }

    /// The part of the configuration the engine itself uses
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            storage_key: self.storage_key.clone(),
            zoom_level: self.zoom_level,
            superseded_lookups: self.superseded_lookups,
            lookup_timeout: self.lookup_timeout_secs.map(Duration::from_secs),
        }
    }
}

fn default_data_dir() -> PathBuf {
    match ProjectDirs::from("", "", "pinmark") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => PathBuf::from(".pinmark"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.storage_key, "locations");
        assert_eq!(config.zoom_level, 13);
        assert_eq!(config.engine_settings().lookup_timeout, None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"zoom_level": 9, "lookup_timeout_secs": 4, "superseded_lookups": "discard"}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let settings = config.engine_settings();

        assert_eq!(settings.zoom_level, 9);
        assert_eq!(settings.lookup_timeout, Some(Duration::from_secs(4)));
        assert_eq!(settings.superseded_lookups, SupersededLookups::Discard);
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            user_agent: Some("tester".to_string()),
            ..Config::default()
        };

        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.get_user_agent(), "tester");
    }

    #[test]
    fn broken_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();

        assert!(matches!(Config::load(&path), Err(PinError::ConfigError { .. })));
    }
}

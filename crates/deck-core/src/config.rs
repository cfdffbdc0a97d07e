use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub artwork: ArtworkConfig,
    #[serde(default)]
    pub mpv: MpvConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Station directory (radio-browser) query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_directory_url")]
    pub base_url: String,
    /// Country every listing and search is scoped to.
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtworkConfig {
    #[serde(default = "default_artwork_url")]
    pub base_url: String,
    /// Lookups slower than this are dropped and the placeholder stays.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on embedded tag extraction per file.
    #[serde(default = "default_extract_timeout_ms")]
    pub extract_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpvConfig {
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    /// Seconds a load may stay silent before it is reported as failed.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_favorites_file")]
    pub favorites_file: PathBuf,
    /// Holds the last chosen library folder.
    #[serde(default = "default_library_file")]
    pub library_file: PathBuf,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_directory_url(),
            country: default_country(),
            limit: default_limit(),
            debounce_ms: default_debounce_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            base_url: default_artwork_url(),
            timeout_secs: default_timeout_secs(),
            extract_timeout_ms: default_extract_timeout_ms(),
        }
    }
}

impl Default for MpvConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            favorites_file: default_favorites_file(),
            library_file: default_library_file(),
            state_file: default_state_file(),
        }
    }
}

impl DirectoryConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_directory_url() -> String {
    "https://de1.api.radio-browser.info".to_string()
}

fn default_country() -> String {
    "India".to_string()
}

fn default_limit() -> u32 {
    50
}

fn default_debounce_ms() -> u64 {
    280
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_artwork_url() -> String {
    "https://itunes.apple.com".to_string()
}

fn default_extract_timeout_ms() -> u64 {
    3000
}

fn default_volume() -> f32 {
    0.7
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_favorites_file() -> PathBuf {
    platform::data_dir().join("favorites.json")
}

fn default_library_file() -> PathBuf {
    platform::data_dir().join("library.json")
}

fn default_state_file() -> PathBuf {
    platform::data_dir().join("state.json")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.directory.country, "India");
        assert_eq!(config.directory.limit, 50);
        assert_eq!(config.directory.debounce(), Duration::from_millis(280));
        assert!(config.artwork.base_url.starts_with("https://"));
        assert!(config.paths.favorites_file.ends_with("tunedeck/favorites.json"));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [directory]
            country = "Germany"
            "#,
        )
        .unwrap();
        assert_eq!(config.directory.country, "Germany");
        assert_eq!(config.directory.limit, 50);
        assert_eq!(config.mpv.connect_timeout_secs, 15);
    }
}

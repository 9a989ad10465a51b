use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default origin of the Voice Vault API service.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default cap on a single recording, in seconds.
pub const DEFAULT_MAX_RECORD_SECS: u32 = 30;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Voice Vault API, e.g. "http://localhost:8000".
    pub api_base_url: String,
    /// Recording auto-stops once this many seconds have elapsed.
    #[serde(default = "default_max_record_secs")]
    pub max_record_secs: u32,
}

fn default_max_record_secs() -> u32 {
    DEFAULT_MAX_RECORD_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            max_record_secs: DEFAULT_MAX_RECORD_SECS,
        }
    }
}

impl Config {
    /// Directory: ~/.config/voice-vault/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("voice-vault");
        p
    }

    fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from disk, returning defaults if file doesn't exist or is invalid.
    pub fn load() -> Self {
        let path = Self::path();
        match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let dir = Self::dir();
        fs::create_dir_all(&dir)?;
        let data = serde_json::to_string_pretty(self)?;
        fs::write(Self::path(), data)?;
        Ok(())
    }
}

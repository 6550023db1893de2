use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Read-only view of user settings, keyed like `voice.<provider>`
pub trait SettingsStore: Send + Sync {
    /// Look up a raw setting value
    fn get(&self, key: &str) -> Option<Value>;

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        }
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => default,
            },
            _ => default,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Speech
    pub backend: String,
    pub disable_broken_backends: bool,

    // Playback
    pub player: String,
    pub advanced_player: bool,
    pub audio_dir: String,

    // Meta
    pub log_level: String,

    // Per-provider values: voice.<provider>, speed.<provider>, <extra>.<provider>
    #[serde(default)]
    pub settings: HashMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: "auto".to_string(),
            disable_broken_backends: true,
            player: "".to_string(),
            advanced_player: false,
            audio_dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("tts-service/wavs")
                .to_string_lossy()
                .to_string(),
            log_level: "INFO".to_string(),
            settings: HashMap::new(),
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let config_path = config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    // Graceful degradation: log warning and use defaults
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    let backup_path = config_path.with_extension("json.corrupt");
                    let _ = std::fs::rename(&config_path, &backup_path);
                    Ok(Self::default())
                }
            }
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Preferred external player, if one is configured
    pub fn preferred_player(&self) -> Option<&str> {
        let player = self.player.trim();
        (!player.is_empty()).then_some(player)
    }
}

impl SettingsStore for Config {
    fn get(&self, key: &str) -> Option<Value> {
        match key {
            "disable_broken_backends" => Some(Value::Bool(self.disable_broken_backends)),
            _ => self.settings.get(key).cloned(),
        }
    }
}

/// Config shared between the service and its backends.
///
/// Backends hold this as their settings store, so a `reload()` or `set()` is
/// visible on their next settings refresh.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current config
    pub fn snapshot(&self) -> Config {
        match self.inner.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Store a per-provider setting
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        if let Ok(mut config) = self.inner.write() {
            config.settings.insert(key.into(), value.into());
        }
    }

    /// Re-read the config file, keeping the current values if that fails
    pub fn reload(&self) -> Result<()> {
        let fresh = Config::load()?;
        if let Ok(mut config) = self.inner.write() {
            *config = fresh;
        }
        Ok(())
    }
}

impl SettingsStore for SharedConfig {
    fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().ok().and_then(|config| config.get(key))
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tts-service")
        .join("config.json")
}

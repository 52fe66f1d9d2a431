use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page title shown in the browser UI
    pub title: String,
    /// Library root: MP3s and one level of folders of MP3s
    pub sound_dir: PathBuf,
    /// Requested output sample rate for the audio device
    pub sample_rate: u32,
    pub host: String,
    pub port: u16,
    /// Upper bound on the `/upload` request body
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Program used for speech on Linux; receives the text as its only argument
    pub command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Soundboard".to_string(),
            sound_dir: PathBuf::from("sounds"),
            sample_rate: 44100,
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            command: "espeak".to_string(),
        }
    }
}

impl Config {
    /// Load the config file named by `SOUNDBOARD_CONFIG` (or `config.toml`),
    /// then apply `SOUNDBOARD_HOST` / `SOUNDBOARD_PORT` overrides.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let path = env::var("SOUNDBOARD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            Config::default()
        };

        if let Ok(host) = env::var("SOUNDBOARD_HOST") {
            config.app.host = host;
        }
        if let Ok(port) = env::var("SOUNDBOARD_PORT") {
            config.app.port = port
                .parse()
                .with_context(|| format!("SOUNDBOARD_PORT is not a valid port: {}", port))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self, anyhow::Error> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.app.port == 0 {
            anyhow::bail!("app.port must be non-zero");
        }
        if !(8000..=192_000).contains(&self.app.sample_rate) {
            anyhow::bail!(
                "app.sample_rate must be between 8000 and 192000, got {}",
                self.app.sample_rate
            );
        }
        if self.app.max_upload_bytes == 0 {
            anyhow::bail!("app.max_upload_bytes must be greater than zero");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const STRIDE_DIR: &str = ".stride";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    /// Model-turn budget for one plan step.
    pub max_turns: usize,
    /// Execute/replan round budget for one objective.
    pub max_rounds: usize,
    /// Produce a closing prose answer from the step records.
    pub summarize: bool,
    pub weather_api_key: String,
    pub stock_api_key: String,
    #[serde(skip)]
    pub artifacts_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: "gpt-4o".to_string(),
            temperature: 0.0,
            max_turns: 20,
            max_rounds: 8,
            summarize: false,
            weather_api_key: String::new(),
            stock_api_key: String::new(),
            artifacts_dir: get_stride_dir().join("artifacts"),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }

    /// Weather key from config, else the WEATHER_API_KEY environment
    /// variable. Empty means the weather tools run on canned demo data.
    pub fn weather_key(&self) -> String {
        if !self.weather_api_key.is_empty() {
            self.weather_api_key.clone()
        } else {
            std::env::var("WEATHER_API_KEY").unwrap_or_default()
        }
    }

    /// Stock key from config, else AV_STOCK_API_KEY. Same demo fallback.
    pub fn stock_key(&self) -> String {
        if !self.stock_api_key.is_empty() {
            self.stock_api_key.clone()
        } else {
            std::env::var("AV_STOCK_API_KEY").unwrap_or_default()
        }
    }
}

pub fn get_stride_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(STRIDE_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_stride_dir().join("config.toml")
}

pub fn ensure_stride_dir() -> Result<PathBuf> {
    let stride_dir = get_stride_dir();

    if !stride_dir.exists() {
        std::fs::create_dir_all(&stride_dir).with_context(|| {
            format!(
                "Failed to create stride directory at {}",
                stride_dir.display()
            )
        })?;
    }

    Ok(stride_dir)
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'stride onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.artifacts_dir = get_stride_dir().join("artifacts");

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_stride_dir()?;

    let config_path = get_config_path();
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.model, "gpt-4o");
        assert_eq!(parsed.max_turns, 20);
        assert_eq!(parsed.max_rounds, 8);
        assert!(!parsed.summarize);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let parsed: Config = toml::from_str(r#"model = "gpt-4o-mini""#).unwrap();
        assert_eq!(parsed.model, "gpt-4o-mini");
        assert_eq!(parsed.max_rounds, 8);
        assert_eq!(parsed.provider, None);
    }
}

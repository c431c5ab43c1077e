use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_max_sessions() -> usize {
    1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_provider")]
    pub provider: String,
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: default_ocr_provider(),
            endpoint: default_vision_endpoint(),
            timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

fn default_ocr_provider() -> String {
    "google_vision".to_string()
}
fn default_vision_endpoint() -> String {
    "https://vision.googleapis.com".to_string()
}
fn default_ocr_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    #[serde(default = "default_catalog_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base_url(),
            timeout_secs: default_catalog_timeout_secs(),
        }
    }
}

fn default_catalog_base_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}
fn default_catalog_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    /// Lines must be strictly longer than this (in chars) to count as titles.
    #[serde(default = "default_min_title_chars")]
    pub min_title_chars: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_title_chars: default_min_title_chars(),
        }
    }
}

fn default_min_title_chars() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecommendConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_recommend_limit")]
    pub limit: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            limit: default_recommend_limit(),
        }
    }
}

fn default_strategy() -> String {
    "local".to_string()
}
fn default_recommend_limit() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl OcrConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Every section at its default, with a local database path.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/shelf.sqlite"),
            },
            server: ServerConfig {
                bind: "127.0.0.1:8000".to_string(),
                max_upload_bytes: default_max_upload_bytes(),
                max_sessions: default_max_sessions(),
            },
            ocr: OcrConfig::default(),
            catalog: CatalogConfig::default(),
            scan: ScanConfig::default(),
            recommend: RecommendConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.recommend.limit == 0 {
        anyhow::bail!("recommend.limit must be >= 1");
    }

    match config.recommend.strategy.as_str() {
        "local" | "remote" => {}
        other => anyhow::bail!(
            "Unknown recommend strategy: '{}'. Must be local or remote.",
            other
        ),
    }

    match config.ocr.provider.as_str() {
        "disabled" | "google_vision" => {}
        other => anyhow::bail!(
            "Unknown OCR provider: '{}'. Must be disabled or google_vision.",
            other
        ),
    }

    if config.ocr.timeout_secs == 0 {
        anyhow::bail!("ocr.timeout_secs must be > 0");
    }

    if config.catalog.timeout_secs == 0 {
        anyhow::bail!("catalog.timeout_secs must be > 0");
    }

    if config.server.max_sessions == 0 {
        anyhow::bail!("server.max_sessions must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> Config {
        let content = format!(
            r#"
[db]
path = "./data/shelf.sqlite"

[server]
bind = "127.0.0.1:8000"
{}
"#,
            extra
        );
        toml::from_str(&content).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.recommend.strategy, "local");
        assert_eq!(cfg.recommend.limit, 5);
        assert_eq!(cfg.scan.min_title_chars, 3);
        assert_eq!(cfg.catalog.timeout_secs, 5);
        assert_eq!(cfg.ocr.provider, "google_vision");
        assert_eq!(cfg.server.max_upload_bytes, 10 * 1024 * 1024);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let cfg = parse("[recommend]\nstrategy = \"neural\"\n");
        let err = validate(&cfg).unwrap_err().to_string();
        assert!(err.contains("neural"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let cfg = parse("[recommend]\nlimit = 0\n");
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_unknown_ocr_provider_rejected() {
        let cfg = parse("[ocr]\nprovider = \"tesseract\"\n");
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let err = validate(&parse("[ocr]\ntimeout_secs = 0\n")).unwrap_err();
        assert!(err.to_string().contains("ocr.timeout_secs"));
        let err = validate(&parse("[catalog]\ntimeout_secs = 0\n")).unwrap_err();
        assert!(err.to_string().contains("catalog.timeout_secs"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/shelf.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_example_config_is_valid() {
        let cfg: Config = toml::from_str(include_str!("../config/shelf.example.toml")).unwrap();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.server.bind, "127.0.0.1:8000");
        assert_eq!(cfg.recommend.limit, 5);
    }
}

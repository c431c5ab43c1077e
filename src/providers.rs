//! Provider status overview for `shelf providers`.
//!
//! Reports which OCR, catalog, and storage backends the configuration
//! selects and whether each has what it needs to run.

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;

/// Configuration status of one external collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub role: String,
    pub provider: String,
    pub configured: bool,
    pub detail: String,
}

/// Inspect the configuration and environment without making network calls.
pub fn get_providers(config: &Config) -> Vec<ProviderStatus> {
    let mut out = Vec::new();

    let ocr = if !config.ocr.is_enabled() {
        ProviderStatus {
            role: "ocr".to_string(),
            provider: "disabled".to_string(),
            configured: false,
            detail: "scans will fail until ocr.provider is set".to_string(),
        }
    } else {
        let has_key = env_set("GOOGLE_VISION_API_KEY");
        ProviderStatus {
            role: "ocr".to_string(),
            provider: config.ocr.provider.clone(),
            configured: has_key,
            detail: if has_key {
                config.ocr.endpoint.clone()
            } else {
                "GOOGLE_VISION_API_KEY not set".to_string()
            },
        }
    };
    out.push(ocr);

    out.push(ProviderStatus {
        role: "catalog".to_string(),
        provider: "google_books".to_string(),
        configured: true,
        detail: if env_set("GOOGLE_BOOKS_API_KEY") {
            format!("{} (keyed)", config.catalog.base_url)
        } else {
            format!("{} (anonymous)", config.catalog.base_url)
        },
    });

    out.push(ProviderStatus {
        role: "store".to_string(),
        provider: "sqlite".to_string(),
        configured: config.db.path.exists(),
        detail: if config.db.path.exists() {
            config.db.path.display().to_string()
        } else {
            format!("{} (run `shelf init`)", config.db.path.display())
        },
    });

    out.push(ProviderStatus {
        role: "recommend".to_string(),
        provider: config.recommend.strategy.clone(),
        configured: true,
        detail: format!("limit {}", config.recommend.limit),
    });

    out
}

fn env_set(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

pub fn list_providers(config: &Config) -> Result<()> {
    println!("{:<10} {:<14} {:<11} DETAIL", "ROLE", "PROVIDER", "CONFIGURED");
    for p in get_providers(config) {
        println!(
            "{:<10} {:<14} {:<11} {}",
            p.role, p.provider, p.configured, p.detail
        );
    }
    Ok(())
}

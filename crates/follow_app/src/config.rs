use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use follow_engine::{EngineConfig, Endpoints, StaticCredentials, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

/// Values a user may override from the RON configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub page_size: u32,
    pub output_dir: PathBuf,
    pub log_destination: String,
    pub log_level: String,
    pub log_file: PathBuf,
    pub poll_interval_ms: u64,
    pub page_delay_ms: (u64, u64),
    pub fallback_cap: usize,
    pub image_batch_size: usize,
    pub image_timeout_ms: u64,
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub app_id: String,
    pub asbd_id: String,
    pub csrf_token: String,
    pub session_cookie: Option<String>,
    pub www_claim: Option<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        let defaults = StaticCredentials::default();
        Self {
            app_id: defaults.app_id,
            asbd_id: defaults.asbd_id,
            csrf_token: defaults.csrf_token,
            session_cookie: defaults.session_cookie,
            www_claim: defaults.www_claim,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: engine.endpoints.page_size,
            output_dir: PathBuf::from("output"),
            log_destination: "terminal".to_string(),
            log_level: "info".to_string(),
            log_file: PathBuf::from("follow_app.log"),
            poll_interval_ms: 500,
            page_delay_ms: (
                engine.collector.page_delay_min.as_millis() as u64,
                engine.collector.page_delay_max.as_millis() as u64,
            ),
            fallback_cap: engine.collector.fallback_cap,
            image_batch_size: engine.materializer.batch_size,
            image_timeout_ms: engine.materializer.item_timeout.as_millis() as u64,
            credentials: CredentialsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, or returns the defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            endpoints: Endpoints {
                base_url: self.base_url.clone(),
                page_size: self.page_size,
                ..Endpoints::default()
            },
            ..EngineConfig::default()
        };
        let (min, max) = self.page_delay_ms;
        config.collector.page_delay_min = Duration::from_millis(min);
        config.collector.page_delay_max = Duration::from_millis(max.max(min));
        config.collector.fallback_cap = self.fallback_cap;
        config.materializer.batch_size = self.image_batch_size.max(1);
        config.materializer.item_timeout = Duration::from_millis(self.image_timeout_ms);
        config
    }

    pub fn credentials(&self) -> Arc<StaticCredentials> {
        let creds = &self.credentials;
        Arc::new(StaticCredentials {
            app_id: creds.app_id.clone(),
            asbd_id: creds.asbd_id.clone(),
            csrf_token: creds.csrf_token.clone(),
            session_cookie: creds.session_cookie.clone(),
            www_claim: creds.www_claim.clone(),
        })
    }
}

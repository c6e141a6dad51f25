//! Configuration module
//!
//! All runtime knobs are provided at process start via `DECKHAND_*`
//! environment variables and are immutable afterwards. Nothing
//! security-sensitive is compiled in: the gateway token in particular is
//! only ever read from the environment.

use std::env;
use std::path::PathBuf;

const MAX_UPLOAD_SIZE_MB: u64 = 500;
const SESSION_IDLE_TIMEOUT_SECS: u64 = 3600;
const CLEANUP_INTERVAL_SECS: u64 = 600;

const DEFAULT_UPLOAD_ROOT: &str = "data/uploads";
const DEFAULT_OUTPUT_ROOT: &str = "data/outputs";
const DEFAULT_TEMPLATE_ROOT: &str = "templates";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory uploaded artifacts are published under.
    pub upload_root: PathBuf,
    /// Directory saved decks are published under. May equal `upload_root`.
    pub output_root: PathBuf,
    /// Directory the read-only template catalog is loaded from.
    pub template_root: PathBuf,
    /// Ceiling on both declared and actual upload sizes.
    pub max_upload_size_bytes: u64,
    /// Sessions idle longer than this are reclaimed.
    pub session_idle_timeout_secs: u64,
    /// Interval between cleanup sweeps.
    pub cleanup_interval_secs: u64,
    pub environment: String,
    /// Chat-gateway credential. Never defaulted; the gateway refuses to
    /// start in production without it.
    pub gateway_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let max_upload_size_mb = env::var("DECKHAND_MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let config = Config {
            upload_root: env::var("DECKHAND_UPLOAD_ROOT")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_ROOT.to_string())
                .into(),
            output_root: env::var("DECKHAND_OUTPUT_ROOT")
                .unwrap_or_else(|_| DEFAULT_OUTPUT_ROOT.to_string())
                .into(),
            template_root: env::var("DECKHAND_TEMPLATE_ROOT")
                .unwrap_or_else(|_| DEFAULT_TEMPLATE_ROOT.to_string())
                .into(),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            session_idle_timeout_secs: env::var("DECKHAND_SESSION_IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| SESSION_IDLE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(SESSION_IDLE_TIMEOUT_SECS),
            cleanup_interval_secs: env::var("DECKHAND_CLEANUP_INTERVAL_SECS")
                .unwrap_or_else(|_| CLEANUP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(CLEANUP_INTERVAL_SECS),
            environment,
            gateway_token: env::var("DECKHAND_GATEWAY_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn max_upload_size_mb(&self) -> u64 {
        self.max_upload_size_bytes / 1024 / 1024
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "DECKHAND_MAX_UPLOAD_SIZE_MB must be greater than zero"
            ));
        }

        if self.session_idle_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "DECKHAND_SESSION_IDLE_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.upload_root.as_os_str().is_empty()
            || self.output_root.as_os_str().is_empty()
            || self.template_root.as_os_str().is_empty()
        {
            return Err(anyhow::anyhow!(
                "DECKHAND_UPLOAD_ROOT, DECKHAND_OUTPUT_ROOT and DECKHAND_TEMPLATE_ROOT must not be empty"
            ));
        }

        if self.is_production() && self.gateway_token.is_none() {
            return Err(anyhow::anyhow!(
                "DECKHAND_GATEWAY_TOKEN must be set in production"
            ));
        }

        Ok(())
    }
}

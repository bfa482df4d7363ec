//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Shared primitives and utilities for the core runtime."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use co2_calc_engine::emissions::{EmissionFactorMap, THERMAL_EMISSION_FACTOR};
use co2_calc_engine::reports::ReportStyle;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_offset() -> usize {
    8
}

fn default_factors() -> IndexMap<String, f64> {
    [
        ("hydro", 0.0),
        ("itaipu-binational", 0.0),
        ("nuclear", 0.0),
        ("thermal", THERMAL_EMISSION_FACTOR),
        ("wind", 0.0),
        ("solar", 0.0),
    ]
    .into_iter()
    .map(|(id, value)| (id.to_owned(), value))
    .collect()
}

fn default_base_url() -> String {
    "http://sdro.ons.org.br/SDRO/DIARIO".to_owned()
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_publish_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_token_env() -> String {
    "CO2_BULLETIN_TOKEN".to_owned()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for a bulletin run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default = "default_factors")]
    pub factors: IndexMap<String, f64>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub report: ReportStyle,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "CO2_BULLETIN_CONFIG";

    /// Load configuration from disk, respecting the `CO2_BULLETIN_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// Unlike the explicit override, missing candidates are not an error: the
    /// built-in defaults describe a complete run.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!(
            inspected = %candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            "no configuration file found, using defaults"
        );
        let config = Self::default();
        config.validate()?;
        Ok(LoadedAppConfig {
            config,
            source: None,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Emission coefficients resolved against the closed set of sources.
    pub fn factor_map(&self) -> Result<EmissionFactorMap> {
        EmissionFactorMap::from_named(self.factors.iter().map(|(id, value)| (id.as_str(), *value)))
            .context("invalid [factors] table")
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.run.validate()?;
        self.factor_map()?;
        self.provider.validate()?;
        self.publisher.validate()?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            factors: default_factors(),
            provider: ProviderConfig::default(),
            publisher: PublisherConfig::default(),
            report: ReportStyle::default(),
            export: ExportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// What to do when the trailing baseline sums to zero.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroBaselinePolicy {
    #[default]
    Skip,
    PublishUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Rows fetched per run: the trailing window plus the reported day.
    #[serde(default = "default_offset")]
    pub offset: usize,
    /// Reference date of the run; today when unset.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
    #[serde(default)]
    pub zero_baseline: ZeroBaselinePolicy,
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            offset: default_offset(),
            reference_date: None,
            zero_baseline: ZeroBaselinePolicy::default(),
            dry_run: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.offset < 2 {
            return Err(anyhow!(
                "run.offset must be at least 2 (one baseline day plus the reported day), got {}",
                self.offset
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    OnsHtml,
    File,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_fetch_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    #[serde(default)]
    pub input: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: default_base_url(),
            timeout: default_fetch_timeout(),
            input: None,
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            ProviderKind::OnsHtml if self.base_url.trim().is_empty() => {
                Err(anyhow!("provider.base_url cannot be empty"))
            }
            ProviderKind::File if self.input.is_none() => {
                Err(anyhow!("provider.input is required for the file provider"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PublisherKind {
    #[default]
    Stdout,
    Http,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    #[serde(default)]
    pub kind: PublisherKind,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable holding the bearer token for the HTTP publisher.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_publish_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            kind: PublisherKind::default(),
            endpoint: None,
            token_env: default_token_env(),
            timeout: default_publish_timeout(),
        }
    }
}

impl PublisherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.kind == PublisherKind::Http && self.endpoint.is_none() {
            return Err(anyhow!("publisher.endpoint is required for the http publisher"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    /// Directory receiving one JSON run summary per run; disabled when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the rolling JSON log file; stdout only when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

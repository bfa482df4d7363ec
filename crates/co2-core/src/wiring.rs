//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Primary orchestration and lifecycle management."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use co2_calc_engine::reports::ReportComposer;
use co2_common::{AppConfig, ProviderConfig, ProviderKind, PublisherConfig, PublisherKind};
use co2_feeds::{
    FetchWindow, FileProvider, GenerationProvider, HttpSink, OnsDailyBalanceProvider, ReportSink,
    StdoutSink,
};
use tracing::info;

use crate::pipeline::BulletinPipeline;

/// Build the provider selected by `[provider]`.
pub fn provider_from_config(config: &ProviderConfig) -> Result<Arc<dyn GenerationProvider>> {
    let provider: Arc<dyn GenerationProvider> = match config.kind {
        ProviderKind::OnsHtml => Arc::new(
            OnsDailyBalanceProvider::new(config.base_url.clone(), config.timeout)
                .context("building daily balance client")?,
        ),
        ProviderKind::File => {
            let input = config
                .input
                .as_ref()
                .ok_or_else(|| anyhow!("provider.input is required for the file provider"))?;
            Arc::new(FileProvider::new(input))
        }
    };
    Ok(provider)
}

/// Build the sink selected by `[publisher]`.
///
/// Dry runs never publish, so they do not need the HTTP token.
pub fn sink_from_config(config: &PublisherConfig, dry_run: bool) -> Result<Arc<dyn ReportSink>> {
    let sink: Arc<dyn ReportSink> = match config.kind {
        PublisherKind::Stdout => Arc::new(StdoutSink),
        PublisherKind::Http if dry_run => Arc::new(StdoutSink),
        PublisherKind::Http => {
            let endpoint = config
                .endpoint
                .as_deref()
                .ok_or_else(|| anyhow!("publisher.endpoint is required for the http publisher"))?;
            Arc::new(
                HttpSink::from_env(endpoint, &config.token_env, config.timeout)
                    .context("building http publisher")?,
            )
        }
    };
    Ok(sink)
}

/// Window for the configured reference date, falling back to `today`.
pub fn window_for(config: &AppConfig, today: NaiveDate) -> FetchWindow {
    let reference = config.run.reference_date.unwrap_or(today);
    FetchWindow::for_reference(reference, config.run.offset)
}

/// Window for the configured reference date or the local calendar date.
pub fn current_window(config: &AppConfig) -> FetchWindow {
    window_for(config, Local::now().date_naive())
}

impl BulletinPipeline {
    /// Assemble a pipeline from a validated configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let provider = provider_from_config(&config.provider)?;
        let sink = sink_from_config(&config.publisher, config.run.dry_run)?;
        info!(
            provider = provider.name(),
            sink = sink.name(),
            dry_run = config.run.dry_run,
            "bulletin pipeline assembled"
        );
        Ok(BulletinPipeline::new(provider, sink)
            .with_factors(config.factor_map()?)
            .with_composer(ReportComposer::new(config.report))
            .with_zero_baseline(config.run.zero_baseline)
            .with_dry_run(config.run.dry_run)
            .with_export_dir(config.export.directory.clone()))
    }
}

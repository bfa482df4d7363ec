//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Primary orchestration and lifecycle management."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use co2_calc_engine::emissions::{convert, EmissionFactorMap};
use co2_calc_engine::model::GenerationTable;
use co2_calc_engine::reports::{Report, ReportComposer};
use co2_calc_engine::{analyze_generation, CalcEngineError, CalcSummary};
use co2_common::ZeroBaselinePolicy;
use co2_feeds::{FetchWindow, GenerationProvider, ReportSink};
use co2_logging::{
    bulletin_debug, bulletin_error, bulletin_info, bulletin_warn, log_run_event, LogContext,
    RunEventOutcome,
};

/// Result of a single bulletin run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The report was handed to the sink.
    Published {
        report: Report,
        summary: Option<CalcSummary>,
    },
    /// The report was composed but not published.
    DryRun {
        report: Report,
        summary: Option<CalcSummary>,
    },
    /// No report was produced.
    Skipped { reason: String },
}

impl RunOutcome {
    pub fn report(&self) -> Option<&Report> {
        match self {
            RunOutcome::Published { report, .. } | RunOutcome::DryRun { report, .. } => {
                Some(report)
            }
            RunOutcome::Skipped { .. } => None,
        }
    }

    /// Analysis summary; absent when the run skipped or had no baseline to compare with.
    pub fn summary(&self) -> Option<&CalcSummary> {
        match self {
            RunOutcome::Published { summary, .. } | RunOutcome::DryRun { summary, .. } => {
                summary.as_ref()
            }
            RunOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, RunOutcome::Published { .. })
    }
}

/// Fetches a window, runs the emission analysis and publishes the bulletin.
pub struct BulletinPipeline {
    provider: Arc<dyn GenerationProvider>,
    sink: Arc<dyn ReportSink>,
    factors: EmissionFactorMap,
    composer: ReportComposer,
    zero_baseline: ZeroBaselinePolicy,
    dry_run: bool,
    export_dir: Option<PathBuf>,
}

impl std::fmt::Debug for BulletinPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulletinPipeline")
            .field("provider", &self.provider.name())
            .field("sink", &self.sink.name())
            .field("factors", &self.factors)
            .field("composer", &self.composer)
            .field("zero_baseline", &self.zero_baseline)
            .field("dry_run", &self.dry_run)
            .field("export_dir", &self.export_dir)
            .finish()
    }
}

impl BulletinPipeline {
    pub fn new(provider: Arc<dyn GenerationProvider>, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            provider,
            sink,
            factors: EmissionFactorMap::canonical(),
            composer: ReportComposer::default(),
            zero_baseline: ZeroBaselinePolicy::default(),
            dry_run: false,
            export_dir: None,
        }
    }

    pub fn with_factors(mut self, factors: EmissionFactorMap) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_composer(mut self, composer: ReportComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_zero_baseline(mut self, policy: ZeroBaselinePolicy) -> Self {
        self.zero_baseline = policy;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_export_dir(mut self, directory: Option<PathBuf>) -> Self {
        self.export_dir = directory;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run the whole pipeline once over `window`.
    pub async fn run_once(&self, window: FetchWindow) -> Result<RunOutcome> {
        let first = window.first_day().to_string();
        let last = window.last_day().to_string();
        let run_id = format!("bulletin-{last}");
        let ctx = LogContext::new()
            .with_run(&run_id)
            .with_window(&first, &last);

        bulletin_info!(
            context = ctx.clone().with_stage("fetch"),
            "fetching {} days from {} provider",
            window.len(),
            self.provider.name()
        );
        let generation = match self.provider.fetch(&window).await {
            Ok(table) => table,
            Err(err) => {
                log_run_event(
                    Some(&ctx),
                    "bulletin.fetch",
                    &err.to_string(),
                    RunEventOutcome::Fault,
                );
                return Err(err)
                    .with_context(|| format!("fetching generation for {first}..{last}"));
            }
        };
        if let Err(err) = window.verify(&generation) {
            bulletin_error!(context = ctx.clone().with_stage("fetch"), "{}", err);
            return Err(err).with_context(|| {
                format!(
                    "{} provider returned an incomplete window for {first}..{last}",
                    self.provider.name()
                )
            });
        }

        let (report, summary) = match analyze_generation(&generation, &self.factors) {
            Ok(summary) => {
                bulletin_debug!(
                    context = ctx.clone().with_stage("analyze"),
                    "variation {:.1}% ({:?})",
                    summary.percent,
                    summary.trend
                );
                (summary.compose(&self.composer), Some(summary))
            }
            Err(CalcEngineError::DivisionByZero { total_present }) => {
                match self.on_zero_baseline(&generation, total_present, &ctx)? {
                    Some(report) => (report, None),
                    None => {
                        return Ok(RunOutcome::Skipped {
                            reason: format!(
                                "baseline emissions for {first}..{last} sum to {total_present}"
                            ),
                        })
                    }
                }
            }
            Err(err) => {
                log_run_event(
                    Some(&ctx),
                    "bulletin.analyze",
                    &err.to_string(),
                    RunEventOutcome::Fault,
                );
                return Err(err)
                    .with_context(|| format!("analyzing generation for {first}..{last}"));
            }
        };

        if let (Some(summary), Some(directory)) = (&summary, &self.export_dir) {
            let path = summary
                .exporter()
                .export(directory)
                .with_context(|| format!("exporting run summary to {}", directory.display()))?;
            bulletin_debug!(
                context = ctx.clone().with_stage("export"),
                "summary written to {}",
                path.display()
            );
        }

        if self.dry_run {
            log_run_event(
                Some(&ctx),
                "bulletin.dry_run",
                "report composed, publishing disabled",
                RunEventOutcome::Success,
            );
            return Ok(RunOutcome::DryRun { report, summary });
        }

        if let Err(err) = self.sink.publish(&report).await {
            log_run_event(
                Some(&ctx),
                "bulletin.publish",
                &err.to_string(),
                RunEventOutcome::Fault,
            );
            return Err(err).with_context(|| {
                format!("publishing bulletin for {last} via {} sink", self.sink.name())
            });
        }
        log_run_event(
            Some(&ctx),
            "bulletin.published",
            &format!("report published via {} sink", self.sink.name()),
            RunEventOutcome::Success,
        );
        Ok(RunOutcome::Published { report, summary })
    }

    fn on_zero_baseline(
        &self,
        generation: &GenerationTable,
        total_present: f64,
        ctx: &LogContext<'_>,
    ) -> Result<Option<Report>> {
        match self.zero_baseline {
            ZeroBaselinePolicy::Skip => {
                log_run_event(
                    Some(ctx),
                    "bulletin.skipped",
                    &format!("baseline emissions sum to {total_present}"),
                    RunEventOutcome::Skipped,
                );
                Ok(None)
            }
            ZeroBaselinePolicy::PublishUnavailable => {
                bulletin_warn!(
                    context = ctx.clone().with_stage("analyze"),
                    "baseline emissions sum to {}, publishing without comparison",
                    total_present
                );
                let emissions = convert(generation, &self.factors)
                    .context("converting generation to emissions")?;
                let total_present = emissions.latest_total();
                if !(total_present.is_finite() && generation.latest_total().is_finite()) {
                    return Err(CalcEngineError::NonFiniteVariation {
                        total_past: 0.0,
                        total_present,
                    })
                    .context("composing bulletin without comparison");
                }
                Ok(Some(self.composer.compose_unavailable(
                    emissions.latest_total(),
                    generation.latest_total(),
                )))
            }
        }
    }
}

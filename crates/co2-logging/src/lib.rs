//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Structured logging adapters and sinks."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Run-scoped structured logging for the bulletin pipeline.

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

/// Initialize a baseline tracing subscriber suitable for tests and local runs.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Identifier of the bulletin run.
    pub run: Option<&'a str>,
    /// Pipeline stage (fetch, analyze, compose, publish).
    pub stage: Option<&'a str>,
    /// First day of the data window.
    pub window_start: Option<&'a str>,
    /// Last day of the data window.
    pub window_end: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a run identifier.
    pub fn with_run(mut self, run: &'a str) -> Self {
        self.run = Some(run);
        self
    }

    /// Attach a pipeline stage.
    pub fn with_stage(mut self, stage: &'a str) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Attach the data window bounds.
    pub fn with_window(mut self, start: &'a str, end: &'a str) -> Self {
        self.window_start = Some(start);
        self.window_end = Some(end);
        self
    }
}

/// Outcome used when emitting run lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEventOutcome {
    /// The step completed and its result was used.
    Success,
    /// The step completed but the run deliberately stopped short.
    Skipped,
    /// The step failed and the run was aborted.
    Fault,
}

impl RunEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            RunEventOutcome::Success => "success",
            RunEventOutcome::Skipped => "skipped",
            RunEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized run event with an outcome.
pub fn log_run_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: RunEventOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    macro_rules! emit {
        ($level:expr) => {
            tracing::event!(
                $level,
                event,
                outcome = outcome.as_str(),
                run = ctx.run.unwrap_or(""),
                stage = ctx.stage.unwrap_or(""),
                window_start = ctx.window_start.unwrap_or(""),
                window_end = ctx.window_end.unwrap_or(""),
                message = %message
            )
        };
    }
    match outcome {
        RunEventOutcome::Success => emit!(Level::INFO),
        RunEventOutcome::Skipped => emit!(Level::WARN),
        RunEventOutcome::Fault => emit!(Level::ERROR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_emit_without_panic() {
        init();
        let ctx = LogContext::new()
            .with_run("run-1")
            .with_window("2021-02-16", "2021-02-23");
        bulletin_info!(context = ctx.clone(), "window fetched");
        bulletin_debug!("debug message");
        bulletin_error!(context = ctx.with_stage("publish"), "status: {}", 503);
    }

    #[test]
    fn run_event_helper_emits() {
        init();
        let ctx = LogContext::new().with_run("run-2");
        log_run_event(
            Some(&ctx),
            "bulletin.published",
            "report published",
            RunEventOutcome::Success,
        );
        log_run_event(None, "bulletin.skipped", "zero baseline", RunEventOutcome::Skipped);
        log_run_event(None, "bulletin.failed", "fetch failed", RunEventOutcome::Fault);
    }
}

//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Primary orchestration and lifecycle management."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use co2_calc_engine::emissions::EmissionFactorMap;
use co2_calc_engine::model::{DailyRow, DailyTable, GenerationTable, Source, SourceMap};
use co2_calc_engine::reports::{Language, Report, ReportComposer, ReportStyle};
use co2_calc_engine::variation::Trend;
use co2_calc_engine::CalcEngineError;
use co2_common::ZeroBaselinePolicy;
use co2_core::{BulletinPipeline, RunOutcome};
use co2_feeds::{FeedError, FetchWindow, GenerationProvider, ReportSink};
use tempfile::tempdir;

struct FixedProvider {
    thermal: Vec<f64>,
}

#[async_trait]
impl GenerationProvider for FixedProvider {
    async fn fetch(&self, window: &FetchWindow) -> Result<GenerationTable, FeedError> {
        let rows = window
            .dates()
            .zip(self.thermal.iter())
            .map(|(date, thermal)| {
                DailyRow::new(
                    date,
                    SourceMap::from_fn(|source| match source {
                        Source::Thermal => *thermal,
                        _ => 50.0,
                    }),
                )
            })
            .collect();
        Ok(DailyTable::from_rows(rows)?)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

struct FailingProvider;

#[async_trait]
impl GenerationProvider for FailingProvider {
    async fn fetch(&self, window: &FetchWindow) -> Result<GenerationTable, FeedError> {
        Err(FeedError::FetchFailed {
            date: window.first_day(),
            reason: "HTTP 503".into(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[derive(Default)]
struct RecordingSink {
    published: Mutex<Vec<Report>>,
    reject: bool,
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn publish(&self, report: &Report) -> Result<(), FeedError> {
        if self.reject {
            return Err(FeedError::PublishFailed {
                status: Some(401),
                reason: "unauthorized".into(),
            });
        }
        self.published.lock().unwrap().push(report.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn window() -> FetchWindow {
    FetchWindow::for_reference(NaiveDate::from_ymd_opt(2021, 2, 26).unwrap(), 8)
}

fn doubling_provider() -> Arc<FixedProvider> {
    Arc::new(FixedProvider {
        thermal: vec![100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 200.0],
    })
}

#[tokio::test]
async fn publishes_doubling_bulletin() {
    co2_logging::init();
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BulletinPipeline::new(doubling_provider(), sink.clone());

    let outcome = pipeline.run_once(window()).await.unwrap();

    assert!(outcome.is_published());
    let summary = outcome.summary().unwrap();
    assert_eq!(summary.percent, 100.0);
    assert_eq!(summary.trend, Trend::Increase);
    assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2021, 2, 24).unwrap());

    let published = sink.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(
        published[0].as_str(),
        "Emitimos 46 toneladas de CO2 para gerar 450 GWh e acender o Brasil ontem!\n\
         Isso equivale a 100.0% mais emissões que a média da última semana 🌡☹"
    );
}

#[tokio::test]
async fn dry_run_never_reaches_the_sink() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BulletinPipeline::new(doubling_provider(), sink.clone())
        .with_dry_run(true)
        .with_composer(ReportComposer::new(ReportStyle {
            language: Language::En,
            ..ReportStyle::default()
        }));

    let outcome = pipeline.run_once(window()).await.unwrap();

    assert!(matches!(outcome, RunOutcome::DryRun { .. }));
    assert!(outcome.report().unwrap().as_str().contains("100.0% more"));
    assert!(sink.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn zero_baseline_is_skipped_by_default() {
    let sink = Arc::new(RecordingSink::default());
    let zero = EmissionFactorMap::from_entries(Source::all().map(|s| (s, 0.0))).unwrap();
    let pipeline = BulletinPipeline::new(doubling_provider(), sink.clone()).with_factors(zero);

    let outcome = pipeline.run_once(window()).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Skipped { .. }));
    assert!(outcome.report().is_none());
    assert!(sink.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn zero_baseline_can_publish_without_comparison() {
    let sink = Arc::new(RecordingSink::default());
    let zero = EmissionFactorMap::from_entries(Source::all().map(|s| (s, 0.0))).unwrap();
    let pipeline = BulletinPipeline::new(doubling_provider(), sink.clone())
        .with_factors(zero)
        .with_zero_baseline(ZeroBaselinePolicy::PublishUnavailable);

    let outcome = pipeline.run_once(window()).await.unwrap();

    assert!(outcome.is_published());
    assert!(outcome.summary().is_none());
    let published = sink.published.lock().unwrap();
    assert!(published[0].as_str().starts_with("Emitimos 0 toneladas"));
    assert!(published[0].as_str().contains("Não há média"));
}

#[tokio::test]
async fn single_row_window_aborts_before_publishing() {
    let sink = Arc::new(RecordingSink::default());
    let provider = Arc::new(FixedProvider {
        thermal: vec![100.0],
    });
    let pipeline = BulletinPipeline::new(provider, sink.clone());
    let one_day = FetchWindow::ending_on(NaiveDate::from_ymd_opt(2021, 2, 24).unwrap(), 1);

    let err = pipeline.run_once(one_day).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CalcEngineError>(),
        Some(CalcEngineError::InsufficientData { rows: 1 })
    ));
    assert!(sink.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn partial_window_is_rejected_before_publishing() {
    let sink = Arc::new(RecordingSink::default());
    let provider = Arc::new(FixedProvider {
        thermal: vec![100.0, 100.0, 200.0],
    });
    let pipeline = BulletinPipeline::new(provider, sink.clone());

    let err = pipeline.run_once(window()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FeedError>(),
        Some(FeedError::IncompleteWindow {
            expected_rows: 8,
            rows: 3,
            ..
        })
    ));
    assert!(sink.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_finite_history_aborts_the_run() {
    let sink = Arc::new(RecordingSink::default());
    let mut thermal = vec![100.0; 8];
    thermal[1] = f64::NAN;
    let pipeline = BulletinPipeline::new(Arc::new(FixedProvider { thermal }), sink.clone());

    let err = pipeline.run_once(window()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CalcEngineError>(),
        Some(CalcEngineError::NonFiniteVariation { .. })
    ));
    assert!(sink.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn infinite_latest_day_aborts_the_run() {
    let sink = Arc::new(RecordingSink::default());
    let mut thermal = vec![100.0; 8];
    thermal[7] = f64::INFINITY;
    let pipeline = BulletinPipeline::new(Arc::new(FixedProvider { thermal }), sink.clone());

    let err = pipeline.run_once(window()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CalcEngineError>(),
        Some(CalcEngineError::NonFiniteVariation { .. })
    ));
    assert!(sink.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn fetch_failure_propagates_unchanged() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BulletinPipeline::new(Arc::new(FailingProvider), sink.clone());

    let err = pipeline.run_once(window()).await.unwrap_err();

    let feed = err.downcast_ref::<FeedError>().unwrap();
    assert!(matches!(feed, FeedError::FetchFailed { reason, .. } if reason == "HTTP 503"));
    assert!(sink.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn publish_failure_propagates_unchanged() {
    let sink = Arc::new(RecordingSink {
        reject: true,
        ..RecordingSink::default()
    });
    let pipeline = BulletinPipeline::new(doubling_provider(), sink);

    let err = pipeline.run_once(window()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FeedError>(),
        Some(FeedError::PublishFailed {
            status: Some(401),
            ..
        })
    ));
}

#[tokio::test]
async fn exports_summary_when_directory_is_set() {
    let dir = tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let pipeline = BulletinPipeline::new(doubling_provider(), sink)
        .with_export_dir(Some(dir.path().to_path_buf()));

    pipeline.run_once(window()).await.unwrap();

    let path = dir.path().join("co2_summary_2021-02-24.json");
    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(exported["data"]["percent"], 100.0);
    assert_eq!(exported["data"]["trend"], "increase");
}

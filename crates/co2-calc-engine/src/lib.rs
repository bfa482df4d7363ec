//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Emission estimation and trailing-baseline comparison routines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
pub mod baseline;
pub mod emissions;
pub mod errors;
pub mod io;
pub mod model;
pub mod reports;
pub mod variation;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

use crate::{
    baseline::{baseline, BaselineMap},
    emissions::{convert, EmissionFactorMap},
    model::GenerationTable,
    reports::{Report, ReportComposer, ReportExporter},
    variation::{variation, Trend, VariationRatio},
};

pub use errors::{CalcEngineError, Result};

#[derive(Debug, Clone, serde::Serialize)]
pub struct CalcSummary {
    pub timestamp: DateTime<Utc>,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub rows: usize,
    pub latest_generation_total: f64,
    pub latest_emissions_total: f64,
    pub baseline_emissions: BaselineMap,
    pub baseline_emissions_total: f64,
    pub ratio: VariationRatio,
    pub percent: f64,
    pub trend: Trend,
}

impl CalcSummary {
    pub fn exporter(&self) -> ReportExporter<'_> {
        ReportExporter::new(self)
    }

    /// Render the bulletin text for this summary.
    pub fn compose(&self, composer: &ReportComposer) -> Report {
        composer.compose(
            self.ratio,
            self.latest_emissions_total,
            self.latest_generation_total,
        )
    }
}

/// Runs conversion, baseline and variation over one generation window.
pub fn analyze_generation(
    generation: &GenerationTable,
    factors: &EmissionFactorMap,
) -> Result<CalcSummary> {
    info!(
        first = %generation.first_date(),
        last = %generation.last_date(),
        rows = generation.len(),
        "Running emission analysis..."
    );
    let emissions = convert(generation, factors)?;
    let baseline_emissions = baseline(&emissions)?;
    let ratio = variation(&emissions, &baseline_emissions)?;

    let summary = CalcSummary {
        timestamp: Utc::now(),
        first_date: generation.first_date(),
        last_date: generation.last_date(),
        rows: generation.len(),
        latest_generation_total: generation.latest_total(),
        latest_emissions_total: emissions.latest_total(),
        baseline_emissions_total: baseline_emissions.total(),
        baseline_emissions,
        ratio,
        percent: ratio.percent(),
        trend: ratio.trend(),
    };
    info!(
        ratio = summary.ratio.value(),
        percent = summary.percent,
        trend = ?summary.trend,
        "Emission analysis complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DailyRow, DailyTable, Source, SourceMap};

    fn scenario() -> GenerationTable {
        let thermal = [100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 200.0];
        let rows = thermal
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let values = SourceMap::from_fn(|source| match source {
                    Source::Thermal => *value,
                    _ => 50.0,
                });
                DailyRow::new(
                    NaiveDate::from_ymd_opt(2021, 2, 16 + i as u32).unwrap(),
                    values,
                )
            })
            .collect();
        DailyTable::from_rows(rows).unwrap()
    }

    #[test]
    fn eight_day_window_doubles_thermal() {
        let summary = analyze_generation(&scenario(), &EmissionFactorMap::canonical()).unwrap();

        assert_eq!(summary.rows, 8);
        assert!((summary.baseline_emissions[Source::Thermal] - 23.1413).abs() < 1e-9);
        assert_eq!(summary.baseline_emissions[Source::Hydro], 0.0);
        assert!((summary.baseline_emissions_total - 23.1413).abs() < 1e-9);
        assert!((summary.latest_emissions_total - 46.2826).abs() < 1e-9);
        assert!((summary.ratio.value() - 1.0).abs() < 1e-12);
        assert_eq!(summary.percent, 100.0);
        assert_eq!(summary.trend, Trend::Increase);
        assert_eq!(summary.latest_generation_total, 450.0);

        let report = summary.compose(&ReportComposer::default());
        assert!(report.as_str().contains("100.0% mais"));
    }

    #[test]
    fn all_zero_factors_fail_with_division_by_zero() {
        let zero = EmissionFactorMap::from_entries(Source::all().map(|s| (s, 0.0))).unwrap();
        assert!(matches!(
            analyze_generation(&scenario(), &zero),
            Err(CalcEngineError::DivisionByZero { total_present }) if total_present == 0.0
        ));
    }
}

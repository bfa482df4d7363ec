//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Emission estimation and trailing-baseline comparison routines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    baseline::BaselineMap,
    errors::{CalcEngineError, Result},
    model::DailyTable,
};

/// Relative change of the latest daily total against the trailing baseline total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariationRatio(f64);

/// Direction of a variation, decided on the displayed (rounded) percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trend {
    Increase,
    Decrease,
    /// The percentage rounds to exactly zero.
    Unchanged,
}

impl VariationRatio {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Ratio expressed in percent, rounded to one decimal place.
    pub fn percent(&self) -> f64 {
        round_to(self.0 * 100.0, 1)
    }

    pub fn trend(&self) -> Trend {
        let percent = self.percent();
        if percent > 0.0 {
            Trend::Increase
        } else if percent < 0.0 {
            Trend::Decrease
        } else {
            Trend::Unchanged
        }
    }
}

/// Compare the last row's cross-source total with the summed baseline.
pub fn variation(table: &DailyTable, baseline: &BaselineMap) -> Result<VariationRatio> {
    let total_past = baseline.total();
    let total_present = table.latest_total();
    if total_past == 0.0 {
        return Err(CalcEngineError::DivisionByZero { total_present });
    }

    let ratio = total_present / total_past - 1.0;
    if !(ratio.is_finite() && total_past.is_finite() && total_present.is_finite()) {
        return Err(CalcEngineError::NonFiniteVariation {
            total_past,
            total_present,
        });
    }
    debug!(total_past, total_present, ratio, "computed variation against baseline");
    Ok(VariationRatio(ratio))
}

/// Round half to even at the given number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Emission estimation and trailing-baseline comparison routines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use tracing::debug;

use crate::{
    errors::{CalcEngineError, Result},
    model::{DailyTable, SourceMap},
};

/// Per-source trailing mean.
pub type BaselineMap = SourceMap<f64>;

/// Mean of every column over all rows except the most recent one.
///
/// NaN values inside the window propagate into the mean of their source.
pub fn baseline(table: &DailyTable) -> Result<BaselineMap> {
    let rows = table.len();
    if rows < 2 {
        return Err(CalcEngineError::InsufficientData { rows });
    }

    let history = &table.rows()[..rows - 1];
    let mut sums = SourceMap::filled(0.0);
    for row in history {
        for (source, value) in row.values.iter() {
            sums[source] += *value;
        }
    }

    let count = history.len() as f64;
    debug!(window = history.len(), "computed trailing baseline");
    Ok(sums.map(|_, sum| sum / count))
}

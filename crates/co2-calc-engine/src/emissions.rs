//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Emission estimation and trailing-baseline comparison routines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::Serialize;
use tracing::debug;

use crate::{
    errors::{CalcEngineError, Result},
    model::{EmissionTable, GenerationTable, Source, SourceMap},
};

/// Emission coefficient for thermal generation, in tCO2 per unit of generation.
pub const THERMAL_EMISSION_FACTOR: f64 = 0.231413;

/// Per-source emission coefficients. A source without a coefficient cannot be converted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionFactorMap {
    factors: SourceMap<Option<f64>>,
}

impl EmissionFactorMap {
    /// A map with no coefficients at all.
    pub fn empty() -> Self {
        Self {
            factors: SourceMap::filled(None),
        }
    }

    /// The published coefficients: only thermal generation emits.
    pub fn canonical() -> Self {
        Self {
            factors: SourceMap::from_fn(|source| match source {
                Source::Thermal => Some(THERMAL_EMISSION_FACTOR),
                _ => Some(0.0),
            }),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (Source, f64)>) -> Result<Self> {
        entries
            .into_iter()
            .try_fold(Self::empty(), |map, (source, value)| {
                map.with_factor(source, value)
            })
    }

    /// Build from identifier keyed entries such as a configuration table.
    pub fn from_named<'a>(entries: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Self> {
        entries
            .into_iter()
            .try_fold(Self::empty(), |map, (id, value)| {
                map.with_factor(Source::from_id(id)?, value)
            })
    }

    pub fn with_factor(mut self, source: Source, value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(CalcEngineError::InvalidFactor {
                energy: source,
                value,
            });
        }
        self.factors[source] = Some(value);
        Ok(self)
    }

    pub fn get(&self, source: Source) -> Option<f64> {
        *self.factors.get(source)
    }

    /// First source that has no coefficient, if any.
    pub fn first_missing(&self) -> Option<Source> {
        self.factors
            .iter()
            .find(|(_, factor)| factor.is_none())
            .map(|(source, _)| source)
    }
}

impl Default for EmissionFactorMap {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Multiply every generation cell by its source's emission coefficient.
pub fn convert(table: &GenerationTable, factors: &EmissionFactorMap) -> Result<EmissionTable> {
    let resolved: SourceMap<f64> = match factors.first_missing() {
        Some(source) => return Err(CalcEngineError::MissingFactor(source)),
        None => SourceMap::from_fn(|source| factors.get(source).unwrap_or_default()),
    };

    debug!(rows = table.len(), "converting generation to emissions");
    Ok(table.map_values(|source, value| value * resolved[source]))
}

//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Emission estimation and trailing-baseline comparison routines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumCount, EnumIter, IntoEnumIterator};

use crate::errors::{CalcEngineError, Result};

/// Energy sources reported in the operator's daily balance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumCount,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Source {
    #[serde(alias = "hidro")]
    Hydro,
    #[serde(alias = "itaipu")]
    ItaipuBinational,
    Nuclear,
    #[serde(alias = "termo")]
    Thermal,
    #[serde(alias = "eolica")]
    Wind,
    Solar,
}

impl Source {
    /// Parse a source identifier, accepting the short Portuguese aliases used by the operator.
    pub fn from_id(id: &str) -> Result<Self> {
        let normalized = id.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "hydro" | "hidro" => Ok(Source::Hydro),
            "itaipu-binational" | "itaipu" => Ok(Source::ItaipuBinational),
            "nuclear" => Ok(Source::Nuclear),
            "thermal" | "termo" => Ok(Source::Thermal),
            "wind" | "eolica" => Ok(Source::Wind),
            "solar" => Ok(Source::Solar),
            _ => Err(CalcEngineError::UnknownSource(id.to_owned())),
        }
    }

    pub fn all() -> impl Iterator<Item = Source> {
        Source::iter()
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl std::str::FromStr for Source {
    type Err = CalcEngineError;

    fn from_str(s: &str) -> Result<Self> {
        Source::from_id(s)
    }
}

/// Fixed-size mapping holding exactly one value per [`Source`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceMap<T>([T; Source::COUNT]);

impl<T> SourceMap<T> {
    pub fn from_fn(mut f: impl FnMut(Source) -> T) -> Self {
        let mut sources = Source::iter();
        SourceMap(std::array::from_fn(|_| {
            let source = sources.next().unwrap_or(Source::Solar);
            f(source)
        }))
    }

    pub fn get(&self, source: Source) -> &T {
        &self.0[source.slot()]
    }

    pub fn get_mut(&mut self, source: Source) -> &mut T {
        &mut self.0[source.slot()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Source, &T)> {
        Source::iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(Source, &T) -> U) -> SourceMap<U> {
        SourceMap::from_fn(|source| f(source, self.get(source)))
    }
}

impl<T: Copy> SourceMap<T> {
    pub fn filled(value: T) -> Self {
        SourceMap([value; Source::COUNT])
    }
}

impl SourceMap<f64> {
    /// Sum across all sources.
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl<T> Index<Source> for SourceMap<T> {
    type Output = T;

    fn index(&self, source: Source) -> &T {
        self.get(source)
    }
}

impl<T> IndexMut<Source> for SourceMap<T> {
    fn index_mut(&mut self, source: Source) -> &mut T {
        self.get_mut(source)
    }
}

impl<T: Serialize> Serialize for SourceMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Source::COUNT))?;
        for (source, value) in self.iter() {
            map.serialize_entry(source.as_ref(), value)?;
        }
        map.end()
    }
}

/// One day of per-source values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub values: SourceMap<f64>,
}

impl DailyRow {
    pub fn new(date: NaiveDate, values: SourceMap<f64>) -> Self {
        Self { date, values }
    }

    pub fn total(&self) -> f64 {
        self.values.total()
    }
}

/// Chronologically ordered daily values for every [`Source`].
///
/// A table always holds at least one row and its dates are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTable {
    rows: Vec<DailyRow>,
}

/// Daily generation volumes per source.
pub type GenerationTable = DailyTable;
/// Daily emissions per source, derived from a [`GenerationTable`].
pub type EmissionTable = DailyTable;

impl DailyTable {
    /// Build a table from per-source date columns, as delivered by a data provider.
    pub fn from_columns(columns: &BTreeMap<Source, BTreeMap<NaiveDate, f64>>) -> Result<Self> {
        let reference = Source::Hydro;
        let reference_column = columns
            .get(&reference)
            .ok_or(CalcEngineError::MissingSource(reference))?;
        let expected = reference_column.len();

        for source in Source::iter() {
            let column = columns
                .get(&source)
                .ok_or(CalcEngineError::MissingSource(source))?;
            if column.len() != expected {
                return Err(CalcEngineError::ShapeMismatch {
                    energy: source,
                    expected,
                    found: column.len(),
                });
            }
            if !column.keys().eq(reference_column.keys()) {
                return Err(CalcEngineError::DateMismatch {
                    energy: source,
                    reference,
                });
            }
        }

        if expected == 0 {
            return Err(CalcEngineError::EmptyTable);
        }

        let rows = reference_column
            .keys()
            .map(|date| {
                let values = SourceMap::from_fn(|source| columns[&source][date]);
                DailyRow::new(*date, values)
            })
            .collect();
        Ok(Self { rows })
    }

    /// Build a table from rows that are already in chronological order.
    pub fn from_rows(rows: Vec<DailyRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(CalcEngineError::EmptyTable);
        }
        for pair in rows.windows(2) {
            if pair[0].date >= pair[1].date {
                return Err(CalcEngineError::UnorderedDates {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self { rows })
    }

    /// Append a row dated after the current last row.
    pub fn push(&mut self, row: DailyRow) -> Result<()> {
        let last = self.last_row().date;
        if row.date <= last {
            return Err(CalcEngineError::UnorderedDates {
                previous: last,
                next: row.date,
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[DailyRow] {
        &self.rows
    }

    pub fn column(&self, source: Source) -> Vec<f64> {
        self.rows.iter().map(|row| row.values[source]).collect()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|row| row.date)
    }

    pub fn first_date(&self) -> NaiveDate {
        self.rows[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.last_row().date
    }

    pub fn last_row(&self) -> &DailyRow {
        &self.rows[self.rows.len() - 1]
    }

    pub fn row_total(&self, index: usize) -> Option<f64> {
        self.rows.get(index).map(DailyRow::total)
    }

    /// Cross-source total of the most recent day.
    pub fn latest_total(&self) -> f64 {
        self.last_row().total()
    }

    /// Produce a table of identical shape with every cell transformed.
    pub fn map_values(&self, mut f: impl FnMut(Source, f64) -> f64) -> DailyTable {
        let rows = self
            .rows
            .iter()
            .map(|row| DailyRow::new(row.date, row.values.map(|source, value| f(source, *value))))
            .collect();
        DailyTable { rows }
    }
}

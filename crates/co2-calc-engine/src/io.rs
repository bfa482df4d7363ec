//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Emission estimation and trailing-baseline comparison routines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::{collections::BTreeMap, fs, io::Read, path::Path};

use chrono::NaiveDate;

use crate::{
    errors::{CalcEngineError, Result},
    model::{GenerationTable, Source},
};

type Columns = BTreeMap<Source, BTreeMap<NaiveDate, f64>>;

/// Load a generation table from a `.csv` file or a JSON column map.
pub fn load_generation_table_from_file(path: impl AsRef<Path>) -> Result<GenerationTable> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        let file = fs::File::open(path)?;
        parse_generation_csv(file)
    } else {
        let data = fs::read_to_string(path)?;
        parse_generation_json(&data)
    }
}

/// Parse `{"<source>": {"YYYY-MM-DD": value, ...}, ...}`.
pub fn parse_generation_json(data: &str) -> Result<GenerationTable> {
    let raw: BTreeMap<String, BTreeMap<String, f64>> = serde_json::from_str(data)?;
    let mut columns = Columns::new();
    for (source_id, entries) in raw {
        let source = Source::from_id(&source_id)?;
        if columns.contains_key(&source) {
            return Err(CalcEngineError::DuplicateSource(source));
        }
        let column = columns.entry(source).or_default();
        for (date_key, value) in entries {
            insert_unique(column, source, parse_date(&date_key)?, value)?;
        }
    }
    GenerationTable::from_columns(&columns)
}

/// Parse a CSV with a `date` column followed by one column per source.
pub fn parse_generation_csv(reader: impl Read) -> Result<GenerationTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let date_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("date"))
        .ok_or_else(|| CalcEngineError::MissingColumn("date".into()))?;
    let sources = headers
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != date_index)
        .map(|(index, header)| Ok((index, Source::from_id(header)?)))
        .collect::<Result<Vec<_>>>()?;
    for (position, (_, source)) in sources.iter().enumerate() {
        if sources[..position].iter().any(|(_, seen)| seen == source) {
            return Err(CalcEngineError::DuplicateSource(*source));
        }
    }

    let mut columns = Columns::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let date = parse_date(record.get(date_index).unwrap_or_default())?;
        for (index, source) in &sources {
            let raw = record.get(*index).unwrap_or_default();
            let value = raw
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| CalcEngineError::InvalidValue {
                    row: row + 1,
                    column: headers[*index].to_owned(),
                    raw: raw.to_owned(),
                })?;
            insert_unique(columns.entry(*source).or_default(), *source, date, value)?;
        }
    }
    GenerationTable::from_columns(&columns)
}

fn insert_unique(
    column: &mut BTreeMap<NaiveDate, f64>,
    energy: Source,
    date: NaiveDate,
    value: f64,
) -> Result<()> {
    if column.insert(date, value).is_some() {
        return Err(CalcEngineError::DuplicateDate { energy, date });
    }
    Ok(())
}

fn parse_date(key: &str) -> Result<NaiveDate> {
    // Keys such as "2021-02-24T00:00:00" carry the date in their first 10 characters.
    let date_part = key.trim().get(..10).unwrap_or(key);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| CalcEngineError::InvalidDate(key.to_owned()))
}

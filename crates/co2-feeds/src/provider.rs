//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Grid operator data providers and bulletin publishing sinks."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use co2_calc_engine::io::load_generation_table_from_file;
use co2_calc_engine::model::{DailyRow, DailyTable, GenerationTable, Source, SourceMap};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{debug, info};

use crate::error::FeedError;

const REPORT_PATH: &str = "HTML/01_RelBalancoEnergeticoDiario.html";

/// The report publishes average MW over the day; multiply to get MWh per day.
const HOURS_PER_DAY: f64 = 24.0;

static LABEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"id\s*=\s*["']lbl_sin_([a-z]+)_v["'][^>]*>\s*([^<]*?)\s*<"#)
        .expect("label pattern is a valid regex")
});

/// Consecutive days requested from a provider, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    first_day: NaiveDate,
    days: usize,
}

impl FetchWindow {
    /// Window of `days` days ending on `last_day` inclusive. At least one day is always covered.
    pub fn ending_on(last_day: NaiveDate, days: usize) -> Self {
        let days = days.max(1);
        let first_day = last_day - Days::new(days as u64 - 1);
        Self { first_day, days }
    }

    /// Window used for a run started on `reference`.
    ///
    /// The operator consolidates a day's balance with a lag, so the newest
    /// usable day is two days before the reference date.
    pub fn for_reference(reference: NaiveDate, offset: usize) -> Self {
        Self::ending_on(reference - Days::new(2), offset)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day + Days::new(self.days as u64 - 1)
    }

    pub fn len(&self) -> usize {
        self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days == 0
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let first = self.first_day;
        (0..self.days as u64).map(move |offset| first + Days::new(offset))
    }

    /// Check that `table` holds exactly one row per day of this window.
    ///
    /// Tables are strictly date-ordered, so matching bounds and row count
    /// imply every day is present.
    pub fn verify(&self, table: &GenerationTable) -> Result<(), FeedError> {
        if table.len() == self.len()
            && table.first_date() == self.first_day()
            && table.last_date() == self.last_day()
        {
            return Ok(());
        }
        Err(FeedError::IncompleteWindow {
            expected_first: self.first_day(),
            expected_last: self.last_day(),
            expected_rows: self.len(),
            first: table.first_date(),
            last: table.last_date(),
            rows: table.len(),
        })
    }
}

/// Source of daily generation figures.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Return one row per day of `window`, or fail as a whole.
    async fn fetch(&self, window: &FetchWindow) -> Result<GenerationTable, FeedError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Scrapes the operator's daily energy balance pages, one request per day.
#[derive(Debug, Clone)]
pub struct OnsDailyBalanceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OnsDailyBalanceProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn report_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            date.format("%Y_%m_%d"),
            REPORT_PATH
        )
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<SourceMap<f64>, FeedError> {
        let url = self.report_url(date);
        debug!(%url, "requesting daily balance");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| FeedError::FetchFailed {
                date,
                reason: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::FetchFailed {
                date,
                reason: format!("HTTP {status} from {url}"),
            });
        }

        let body = response.text().await.map_err(|err| FeedError::FetchFailed {
            date,
            reason: err.to_string(),
        })?;
        parse_daily_balance(date, &body)
    }
}

#[async_trait]
impl GenerationProvider for OnsDailyBalanceProvider {
    async fn fetch(&self, window: &FetchWindow) -> Result<GenerationTable, FeedError> {
        let mut rows = Vec::with_capacity(window.len());
        for date in window.dates() {
            rows.push(DailyRow::new(date, self.fetch_day(date).await?));
        }
        info!(
            first = %window.first_day(),
            last = %window.last_day(),
            days = rows.len(),
            "daily balances fetched"
        );
        Ok(DailyTable::from_rows(rows)?)
    }

    fn name(&self) -> &'static str {
        "ons-html"
    }
}

/// Field suffix of the `lbl_sin_<field>_v` label holding a source's value.
pub fn report_field(source: Source) -> &'static str {
    match source {
        Source::Hydro => "hidro",
        Source::ItaipuBinational => "itaipu",
        Source::Nuclear => "nuclear",
        Source::Thermal => "termo",
        Source::Wind => "eolica",
        Source::Solar => "solar",
    }
}

/// Extract the daily totals of every source from a daily balance page.
pub fn parse_daily_balance(date: NaiveDate, html: &str) -> Result<SourceMap<f64>, FeedError> {
    let labels: HashMap<&str, &str> = LABEL_PATTERN
        .captures_iter(html)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect();

    let mut values = SourceMap::filled(0.0);
    for source in Source::all() {
        let field = report_field(source);
        let raw = labels
            .get(field)
            .ok_or_else(|| FeedError::MissingField {
                date,
                field: format!("lbl_sin_{field}_v"),
            })?;
        let average = parse_decimal(raw).ok_or_else(|| FeedError::InvalidNumber {
            date,
            field: format!("lbl_sin_{field}_v"),
            raw: (*raw).to_owned(),
        })?;
        values[source] = average * HOURS_PER_DAY;
    }
    Ok(values)
}

/// Accepts `1234.5` as well as the Brazilian `1.234,5` notation.
fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let value: f64 = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".").parse().ok()?
    } else {
        trimmed.parse().ok()?
    };
    value.is_finite().then_some(value)
}

/// Serves windows out of a JSON or CSV table on disk.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl GenerationProvider for FileProvider {
    async fn fetch(&self, window: &FetchWindow) -> Result<GenerationTable, FeedError> {
        let table = load_generation_table_from_file(&self.path)?;
        let by_date: HashMap<NaiveDate, &DailyRow> =
            table.rows().iter().map(|row| (row.date, row)).collect();

        let mut rows = Vec::with_capacity(window.len());
        for date in window.dates() {
            let row = by_date.get(&date).ok_or_else(|| FeedError::FetchFailed {
                date,
                reason: format!("no row in {}", self.path.display()),
            })?;
            rows.push((*row).clone());
        }
        debug!(path = %self.path.display(), days = rows.len(), "window loaded from file");
        Ok(DailyTable::from_rows(rows)?)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

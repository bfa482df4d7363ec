//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Emission estimation and trailing-baseline comparison routines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::{fmt, fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    errors::Result,
    variation::{Trend, VariationRatio},
    CalcSummary,
};

/// Language of the bulletin text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    #[default]
    PtBr,
    En,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportStyle {
    #[serde(default)]
    pub language: Language,
    /// Phrase a change that rounds to 0.0% neutrally instead of as a decrease.
    #[serde(default)]
    pub neutral_on_zero: bool,
}

/// Finished bulletin text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report(String);

impl Report {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Phrasing {
    comparator: &'static str,
    marker: &'static str,
    mood: &'static str,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportComposer {
    style: ReportStyle,
}

impl ReportComposer {
    pub fn new(style: ReportStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> ReportStyle {
        self.style
    }

    /// Render the bulletin for a ratio and the latest day's totals.
    pub fn compose(
        &self,
        ratio: VariationRatio,
        latest_emissions_total: f64,
        latest_generation_total: f64,
    ) -> Report {
        let percent = ratio.percent().abs();
        let headline = self.headline(latest_emissions_total, latest_generation_total);
        let comparison = match (ratio.trend(), self.style.neutral_on_zero) {
            (Trend::Unchanged, true) => self.neutral_line(),
            (Trend::Increase, _) => self.comparison_line(percent, self.increase()),
            (Trend::Decrease | Trend::Unchanged, _) => {
                self.comparison_line(percent, self.decrease())
            }
        };
        Report(format!("{headline}\n{comparison}"))
    }

    /// Render the bulletin when no baseline comparison is possible.
    pub fn compose_unavailable(
        &self,
        latest_emissions_total: f64,
        latest_generation_total: f64,
    ) -> Report {
        let headline = self.headline(latest_emissions_total, latest_generation_total);
        let note = match self.style.language {
            Language::PtBr => "Não há média da última semana para comparar.",
            Language::En => "No average from last week is available for comparison.",
        };
        Report(format!("{headline}\n{note}"))
    }

    fn headline(&self, emissions: f64, generation: f64) -> String {
        match self.style.language {
            Language::PtBr => format!(
                "Emitimos {emissions:.0} toneladas de CO2 para gerar {generation:.0} GWh e acender o Brasil ontem!"
            ),
            Language::En => format!(
                "We emitted {emissions:.0} tonnes of CO2 to generate {generation:.0} GWh and power Brazil yesterday!"
            ),
        }
    }

    fn comparison_line(&self, percent: f64, phrasing: Phrasing) -> String {
        let Phrasing {
            comparator,
            marker,
            mood,
        } = phrasing;
        match self.style.language {
            Language::PtBr => format!(
                "Isso equivale a {percent:.1}% {comparator} emissões que a média da última semana {marker}{mood}"
            ),
            Language::En => format!(
                "That is {percent:.1}% {comparator} emissions than last week's average {marker}{mood}"
            ),
        }
    }

    fn neutral_line(&self) -> String {
        match self.style.language {
            Language::PtBr => {
                "Isso equivale às mesmas emissões da média da última semana ⚖😐".to_owned()
            }
            Language::En => "That is the same level of emissions as last week's average ⚖😐".to_owned(),
        }
    }

    fn increase(&self) -> Phrasing {
        Phrasing {
            comparator: match self.style.language {
                Language::PtBr => "mais",
                Language::En => "more",
            },
            marker: "🌡",
            mood: "☹",
        }
    }

    fn decrease(&self) -> Phrasing {
        Phrasing {
            comparator: match self.style.language {
                Language::PtBr => "menos",
                Language::En => "less",
            },
            marker: "☘",
            mood: "😀",
        }
    }
}

/// Writes run summaries as JSON envelopes.
#[derive(Debug)]
pub struct ReportExporter<'a> {
    summary: &'a CalcSummary,
}

impl<'a> ReportExporter<'a> {
    pub fn new(summary: &'a CalcSummary) -> Self {
        Self { summary }
    }

    /// Write `co2_summary_<last date>.json` under `output_dir` and return its path.
    pub fn export(&self, output_dir: &Path) -> Result<PathBuf> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let timestamp = self.summary.timestamp.to_rfc3339();
        let envelope = ReportEnvelope::new(&timestamp, summary_schema(), self.summary);
        let path = output_dir.join(format!("co2_summary_{}.json", self.summary.last_date));
        write_json(&path, &envelope)?;

        info!("Run summary exported to {}", path.display());
        Ok(path)
    }
}

#[derive(Debug, Serialize)]
struct ReportEnvelope<'a, T: Serialize> {
    timestamp: &'a str,
    schema: serde_json::Value,
    data: &'a T,
}

impl<'a, T: Serialize> ReportEnvelope<'a, T> {
    fn new(timestamp: &'a str, schema: serde_json::Value, data: &'a T) -> Self {
        Self {
            timestamp,
            schema,
            data,
        }
    }
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn summary_schema() -> serde_json::Value {
    let per_source = json!({
        "type": "object",
        "properties": {
            "hydro": {"type": "number"},
            "itaipu-binational": {"type": "number"},
            "nuclear": {"type": "number"},
            "thermal": {"type": "number"},
            "wind": {"type": "number"},
            "solar": {"type": "number"}
        }
    });
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "CalcSummary",
        "type": "object",
        "properties": {
            "timestamp": {"type": "string", "format": "date-time"},
            "first_date": {"type": "string", "format": "date"},
            "last_date": {"type": "string", "format": "date"},
            "rows": {"type": "integer"},
            "latest_generation_total": {"type": "number"},
            "latest_emissions_total": {"type": "number"},
            "baseline_emissions": per_source,
            "baseline_emissions_total": {"type": "number"},
            "ratio": {"type": "number"},
            "percent": {"type": "number"},
            "trend": {"enum": ["increase", "decrease", "unchanged"]}
        },
        "required": [
            "timestamp",
            "first_date",
            "last_date",
            "rows",
            "latest_generation_total",
            "latest_emissions_total",
            "ratio"
        ]
    })
}

//! ---
//! ems_section: "08-energy-models-optimization"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Emission estimation and trailing-baseline comparison routines."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fs;

use chrono::NaiveDate;
use co2_calc_engine::{
    analyze_generation,
    baseline::baseline,
    emissions::{convert, EmissionFactorMap},
    model::{DailyRow, DailyTable, GenerationTable, Source, SourceMap},
    reports::ReportComposer,
    variation::variation,
    CalcEngineError,
};
use proptest::prelude::*;
use tempfile::tempdir;

fn date(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap() + chrono::Days::new(offset as u64)
}

fn table_from(rows: &[[f64; 6]]) -> GenerationTable {
    DailyTable::from_rows(
        rows.iter()
            .enumerate()
            .map(|(i, cells)| {
                DailyRow::new(date(i), SourceMap::from_fn(|source| cells[source as usize]))
            })
            .collect(),
    )
    .unwrap()
}

fn add_tables(a: &GenerationTable, b: &GenerationTable) -> GenerationTable {
    let rows = a
        .rows()
        .iter()
        .zip(b.rows())
        .map(|(left, right)| {
            DailyRow::new(
                left.date,
                SourceMap::from_fn(|source| left.values[source] + right.values[source]),
            )
        })
        .collect();
    DailyTable::from_rows(rows).unwrap()
}

fn cells() -> impl Strategy<Value = [f64; 6]> {
    prop::array::uniform6(0.0f64..100_000.0)
}

fn factors() -> impl Strategy<Value = EmissionFactorMap> {
    prop::array::uniform6(0.0f64..2.0).prop_map(|values| {
        EmissionFactorMap::from_entries(Source::all().map(|s| (s, values[s as usize]))).unwrap()
    })
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn zero_factors_yield_zero_table(rows in prop::collection::vec(cells(), 1..12)) {
        let generation = table_from(&rows);
        let zero = EmissionFactorMap::from_entries(Source::all().map(|s| (s, 0.0))).unwrap();
        let emissions = convert(&generation, &zero).unwrap();
        prop_assert_eq!(emissions.len(), generation.len());
        prop_assert_eq!(emissions.dates().collect::<Vec<_>>(), generation.dates().collect::<Vec<_>>());
        prop_assert!(emissions.rows().iter().all(|row| row.values.values().all(|v| *v == 0.0)));
    }

    #[test]
    fn conversion_is_linear(
        pairs in prop::collection::vec((cells(), cells()), 1..10),
        factors in factors(),
    ) {
        let left: Vec<_> = pairs.iter().map(|(a, _)| *a).collect();
        let right: Vec<_> = pairs.iter().map(|(_, b)| *b).collect();
        let a = table_from(&left);
        let b = table_from(&right);

        let of_sum = convert(&add_tables(&a, &b), &factors).unwrap();
        let sum_of = add_tables(&convert(&a, &factors).unwrap(), &convert(&b, &factors).unwrap());
        for (x, y) in of_sum.rows().iter().zip(sum_of.rows()) {
            for source in Source::all() {
                prop_assert!(close(x.values[source], y.values[source]));
            }
        }
    }

    #[test]
    fn baseline_ignores_the_newest_row(
        rows in prop::collection::vec(cells(), 2..12),
        newest in cells(),
    ) {
        let table = table_from(&rows);
        let mut replaced_rows = rows.clone();
        let last = replaced_rows.len() - 1;
        replaced_rows[last] = newest;
        let replaced = table_from(&replaced_rows);
        prop_assert_eq!(baseline(&table).unwrap(), baseline(&replaced).unwrap());
    }

    #[test]
    fn last_row_equal_to_baseline_has_zero_variation(rows in prop::collection::vec(cells(), 1..10)) {
        let means = {
            let mut extended = rows.clone();
            extended.push([0.0; 6]);
            baseline(&table_from(&extended)).unwrap()
        };
        prop_assume!(means.total() > 0.0);
        let mut with_mean_row = rows.clone();
        with_mean_row.push(std::array::from_fn(|i| {
            means[Source::all().nth(i).unwrap()]
        }));
        let table = table_from(&with_mean_row);
        let ratio = variation(&table, &baseline(&table).unwrap()).unwrap();
        prop_assert!(ratio.value().abs() < 1e-9);
    }

    #[test]
    fn compose_is_idempotent(ratio in -1.0f64..5.0, co2 in 0.0f64..1e6, gwh in 0.0f64..1e7) {
        let composer = ReportComposer::default();
        let ratio = co2_calc_engine::variation::VariationRatio::new(ratio);
        prop_assert_eq!(composer.compose(ratio, co2, gwh), composer.compose(ratio, co2, gwh));
    }
}

#[test]
fn two_rows_use_first_row_only_and_one_row_fails() {
    let two = table_from(&[[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [9.0; 6]]);
    let map = baseline(&two).unwrap();
    assert_eq!(map[Source::Solar], 6.0);
    assert_eq!(map[Source::Hydro], 1.0);

    let one = table_from(&[[1.0; 6]]);
    assert!(matches!(
        baseline(&one),
        Err(CalcEngineError::InsufficientData { rows: 1 })
    ));
}

#[test]
fn zero_factors_and_zero_latest_row_divide_by_zero() {
    let generation = table_from(&[[0.0; 6], [0.0; 6], [0.0; 6]]);
    let zero = EmissionFactorMap::from_entries(Source::all().map(|s| (s, 0.0))).unwrap();
    let emissions = convert(&generation, &zero).unwrap();
    let means = baseline(&emissions).unwrap();
    assert!(matches!(
        variation(&emissions, &means),
        Err(CalcEngineError::DivisionByZero { .. })
    ));
}

#[test]
fn summary_exports_json_envelope() {
    let mut rows = vec![[50.0, 50.0, 50.0, 100.0, 50.0, 50.0]; 7];
    rows.push([50.0, 50.0, 50.0, 200.0, 50.0, 50.0]);
    let summary = analyze_generation(&table_from(&rows), &EmissionFactorMap::canonical()).unwrap();

    let dir = tempdir().unwrap();
    let path = summary.exporter().export(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "co2_summary_2021-01-08.json");

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["schema"]["title"], "CalcSummary");
    assert_eq!(written["data"]["rows"], 8);
    assert_eq!(written["data"]["percent"], 100.0);
    assert_eq!(written["data"]["trend"], "increase");
    assert_eq!(written["data"]["baseline_emissions"]["hydro"], 0.0);
}

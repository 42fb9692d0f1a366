//! Summary statistics over the accumulated table.
//!
//! Everything here is a pure function of the table. The grand total is one
//! direct pass over all rows; `cross_check` recomputes it through per-year
//! subtotals and reports any divergence beyond rounding as an error.

use crate::{
    error::{PipelineError, PipelineResult},
    types::{AccumulatedTable, SalesAggregateRow, Year},
};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

const TOP_INGREDIENTS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    #[serde(rename = "total_registros")]
    pub total_records: usize,
    #[serde(rename = "municipios_unicos")]
    pub distinct_municipalities: usize,
    #[serde(rename = "anos_unicos")]
    pub distinct_years: usize,
    #[serde(rename = "principios_unicos")]
    pub distinct_ingredients: usize,
    #[serde(rename = "total_vendido")]
    pub total_quantity: f64,
    #[serde(rename = "data_geracao")]
    pub generated_at: DateTime<Local>,
}

/// `{"status":"empty"}` for an empty table, the full figures otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Statistics {
    Empty,
    Computed(RunStatistics),
}

impl Statistics {
    pub fn is_empty(&self) -> bool {
        matches!(self, Statistics::Empty)
    }

    pub fn computed(&self) -> Option<&RunStatistics> {
        match self {
            Statistics::Computed(stats) => Some(stats),
            Statistics::Empty => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossCheck {
    pub direct:  f64,
    pub by_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearBreakdown {
    pub year:           Year,
    pub records:        usize,
    pub municipalities: usize,
    pub total_quantity: f64,
    /// Largest ingredients of the year by volume, biggest first.
    pub top_ingredients: Vec<(String, f64)>,
}

pub fn compute_statistics(table: &AccumulatedTable) -> PipelineResult<Statistics> {
    if table.is_empty() {
        return Ok(Statistics::Empty);
    }

    let check = cross_check(table)?;
    log::debug!(
        "Total cross-check: direct {:.0}, per-year {:.0}, difference {:.0}",
        check.direct,
        check.by_year,
        check.by_year - check.direct
    );

    let rows = table.rows();
    let municipalities: HashSet<&str> = rows.iter().map(|r| r.municipality.as_str()).collect();
    let years: HashSet<Year> = rows.iter().map(|r| r.year).collect();
    let ingredients: HashSet<&str> = rows.iter().map(|r| r.active_ingredient.as_str()).collect();

    Ok(Statistics::Computed(RunStatistics {
        total_records: rows.len(),
        distinct_municipalities: municipalities.len(),
        distinct_years: years.len(),
        distinct_ingredients: ingredients.len(),
        total_quantity: check.direct,
        generated_at: Local::now(),
    }))
}

/// Compare the direct total against the sum of per-year subtotals.
///
/// The tolerance is the worst-case rounding of two naive summations over
/// the same values, so only real conversion defects trip it.
pub fn cross_check(table: &AccumulatedTable) -> PipelineResult<CrossCheck> {
    let rows = table.rows();
    let direct = direct_total(rows);

    let mut per_year: BTreeMap<Year, f64> = BTreeMap::new();
    for row in rows {
        *per_year.entry(row.year).or_insert(0.0) += row.total_quantity;
    }
    let by_year: f64 = per_year.values().sum();

    let magnitude: f64 = rows.iter().map(|r| r.total_quantity.abs()).sum();
    let tolerance = 2.0 * f64::EPSILON * (rows.len() as f64 + 1.0) * magnitude;

    if !direct.is_finite() || !by_year.is_finite() || (direct - by_year).abs() > tolerance {
        return Err(PipelineError::CrossCheck { direct, by_year });
    }
    Ok(CrossCheck { direct, by_year })
}

fn direct_total(rows: &[SalesAggregateRow]) -> f64 {
    rows.iter().map(|r| r.total_quantity).sum()
}

/// Per-year figures, oldest year first.
pub fn year_breakdown(table: &AccumulatedTable) -> Vec<YearBreakdown> {
    #[derive(Default)]
    struct Acc<'a> {
        records:        usize,
        municipalities: BTreeSet<&'a str>,
        total:          f64,
        ingredients:    HashMap<&'a str, f64>,
    }

    let mut years: BTreeMap<Year, Acc<'_>> = BTreeMap::new();
    for row in table.rows() {
        let acc = years.entry(row.year).or_default();
        acc.records += 1;
        acc.municipalities.insert(&row.municipality);
        acc.total += row.total_quantity;
        *acc.ingredients.entry(&row.active_ingredient).or_insert(0.0) += row.total_quantity;
    }

    years
        .into_iter()
        .map(|(year, acc)| {
            let mut ranked: Vec<(&str, f64)> = acc.ingredients.into_iter().collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            YearBreakdown {
                year,
                records: acc.records,
                municipalities: acc.municipalities.len(),
                total_quantity: acc.total,
                top_ingredients: ranked
                    .into_iter()
                    .take(TOP_INGREDIENTS)
                    .map(|(name, total)| (name.to_string(), total))
                    .collect(),
            }
        })
        .collect()
}

/// The first `n` rows of `year`, in table order.
pub fn sample_for_year(table: &AccumulatedTable, year: Year, n: usize) -> Vec<&SalesAggregateRow> {
    table.rows().iter().filter(|r| r.year == year).take(n).collect()
}

//! Simulated-versus-observed comparison.
//!
//! [`pair`] is the hand-off contract for any statistic: two numeric series
//! with missing values dropped pairwise. [`align`] builds those series from
//! two parsed tables by matching key columns, and [`FitSummary`] reduces a
//! pairing to the usual goodness-of-fit numbers.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::{
    cli::CompareArgs,
    config::Config,
    data::Value,
    readers::{DATE_COLUMN, TREATMENT_COLUMN},
    table::{self, Table},
};

pub const DEFAULT_KEYS: &[&str] = &[TREATMENT_COLUMN, DATE_COLUMN];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlignError {
    #[error("Column '{column}' not found in {side} table")]
    MissingColumn { side: &'static str, column: String },
}

/// Equal-length numeric series with no missing values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PairedSeries {
    pub simulated: Vec<f64>,
    pub observed: Vec<f64>,
}

impl PairedSeries {
    pub fn len(&self) -> usize {
        self.simulated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simulated.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.simulated.iter().copied().zip(self.observed.iter().copied())
    }
}

/// Zips `simulated` with `observed`, dropping index `i` from both when
/// either side is missing there. Extra trailing entries on the longer side
/// are ignored.
pub fn pair(simulated: &[Option<f64>], observed: &[Option<f64>]) -> PairedSeries {
    let mut paired = PairedSeries::default();
    for (sim, obs) in simulated.iter().zip(observed) {
        if let (Some(sim), Some(obs)) = (sim, obs) {
            paired.simulated.push(*sim);
            paired.observed.push(*obs);
        }
    }
    paired
}

/// Numeric view of one column, optionally restricted to one treatment.
pub fn series(table: &Table, column: &str, treatment: Option<&str>) -> Option<Vec<Option<f64>>> {
    match treatment {
        Some(trt) if table.has_column(TREATMENT_COLUMN) => {
            table.filter_eq(TREATMENT_COLUMN, trt).numeric_series(column)
        }
        _ => table.numeric_series(column),
    }
}

/// Pairs `column` across two tables by matching `keys`. Each simulated row is
/// paired with the first observed row carrying the same key values; rows
/// with a missing key cell are skipped.
pub fn align(
    simulated: &Table,
    observed: &Table,
    column: &str,
    treatment: Option<&str>,
    keys: &[String],
) -> Result<PairedSeries, AlignError> {
    for (side, table) in [("simulated", simulated), ("observed", observed)] {
        for name in keys.iter().map(String::as_str).chain([column]) {
            if !table.has_column(name) {
                return Err(AlignError::MissingColumn {
                    side,
                    column: name.to_string(),
                });
            }
        }
    }

    let restrict = |table: &Table| match treatment {
        Some(trt) if table.has_column(TREATMENT_COLUMN) => table.filter_eq(TREATMENT_COLUMN, trt),
        _ => table.clone(),
    };
    let simulated = restrict(simulated);
    let observed = restrict(observed);

    let mut observed_rows = HashMap::new();
    for row in 0..observed.row_count() {
        if let Some(key) = row_key(&observed, row, keys) {
            observed_rows.entry(key).or_insert(row);
        }
    }

    let mut sim_values = Vec::new();
    let mut obs_values = Vec::new();
    for row in 0..simulated.row_count() {
        let Some(key) = row_key(&simulated, row, keys) else {
            continue;
        };
        if let Some(&obs_row) = observed_rows.get(&key) {
            sim_values.push(simulated.value(row, column).and_then(Value::as_f64));
            obs_values.push(observed.value(obs_row, column).and_then(Value::as_f64));
        }
    }
    debug!(
        "Matched {} of {} simulated row(s) on {:?}",
        sim_values.len(),
        simulated.row_count(),
        keys
    );
    Ok(pair(&sim_values, &obs_values))
}

fn row_key(table: &Table, row: usize, keys: &[String]) -> Option<Vec<String>> {
    keys.iter()
        .map(|key| {
            table
                .value(row, key)
                .filter(|value| !value.is_missing())
                .map(Value::as_display)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitSummary {
    pub n: usize,
    pub mean_observed: f64,
    pub mean_simulated: f64,
    pub rmse: f64,
    /// RMSE as a percentage of the observed mean.
    pub nrmse: Option<f64>,
    /// Willmott index of agreement.
    pub d_stat: Option<f64>,
    /// Squared Pearson correlation.
    pub r_squared: Option<f64>,
}

impl FitSummary {
    /// `None` for an empty pairing.
    pub fn compute(paired: &PairedSeries) -> Option<Self> {
        if paired.is_empty() {
            return None;
        }
        let n = paired.len() as f64;
        let mean_simulated = paired.simulated.iter().sum::<f64>() / n;
        let mean_observed = paired.observed.iter().sum::<f64>() / n;

        let squared_error = paired.iter().map(|(s, o)| (s - o).powi(2)).sum::<f64>();
        let rmse = (squared_error / n).sqrt();
        let nrmse = (mean_observed != 0.0).then(|| rmse / mean_observed * 100.0);

        let potential_error = paired
            .iter()
            .map(|(s, o)| ((s - mean_observed).abs() + (o - mean_observed).abs()).powi(2))
            .sum::<f64>();
        let d_stat = (potential_error != 0.0).then(|| 1.0 - squared_error / potential_error);

        let (mut covariance, mut sim_variance, mut obs_variance) = (0.0, 0.0, 0.0);
        for (s, o) in paired.iter() {
            let ds = s - mean_simulated;
            let dobs = o - mean_observed;
            covariance += ds * dobs;
            sim_variance += ds * ds;
            obs_variance += dobs * dobs;
        }
        let denominator = sim_variance * obs_variance;
        let r_squared = (denominator != 0.0).then(|| covariance * covariance / denominator);

        Some(Self {
            n: paired.len(),
            mean_observed,
            mean_simulated,
            rmse,
            nrmse,
            d_stat,
            r_squared,
        })
    }

    fn render_rows(&self) -> Vec<Vec<String>> {
        let optional = |value: Option<f64>| value.map_or_else(|| "n/a".to_string(), format_stat);
        vec![
            vec!["n".to_string(), self.n.to_string()],
            vec!["mean_observed".to_string(), format_stat(self.mean_observed)],
            vec!["mean_simulated".to_string(), format_stat(self.mean_simulated)],
            vec!["rmse".to_string(), format_stat(self.rmse)],
            vec!["nrmse_percent".to_string(), optional(self.nrmse)],
            vec!["d_stat".to_string(), optional(self.d_stat)],
            vec!["r_squared".to_string(), optional(self.r_squared)],
        ]
    }
}

fn format_stat(value: f64) -> String {
    format!("{value:.4}")
}

/// Key columns for alignment: the requested ones, or `TRT` and `DATE`.
fn comparison_keys(requested: &[String]) -> Vec<String> {
    let keys: Vec<String> = requested
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        DEFAULT_KEYS.iter().map(|k| k.to_string()).collect()
    } else {
        keys
    }
}

pub fn execute(args: &CompareArgs, config: &Config) -> Result<()> {
    let simulated = crate::load_table(&args.simulated, args.simulated_format, config)?;
    let observed = crate::load_table(&args.observed, args.observed_format, config)?;
    let keys = comparison_keys(&args.keys);

    let paired = align(
        &simulated.table,
        &observed.table,
        &args.column,
        args.treatment.as_deref(),
        &keys,
    )
    .with_context(|| {
        format!(
            "Aligning {:?} with {:?} on {}",
            args.simulated,
            args.observed,
            keys.join(",")
        )
    })?;
    let summary = FitSummary::compute(&paired).ok_or_else(|| {
        anyhow!(
            "No simulated/observed pairs for column '{}' on keys {}",
            args.column,
            keys.join(",")
        )
    })?;

    let headers = vec!["statistic".to_string(), "value".to_string()];
    table::print_table(&headers, &summary.render_rows());
    info!(
        "Compared {} pair(s) of '{}' between {:?} and {:?}",
        summary.n, args.column, args.simulated, args.observed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn table(columns: Vec<(&str, Vec<Value>)>) -> Table {
        let mut table = Table::new("t");
        for (name, values) in columns {
            table.insert_column(Column::from_values(name, values));
        }
        table
    }

    fn numbers(values: &[f64]) -> Vec<Value> {
        values.iter().copied().map(Value::number).collect()
    }

    #[test]
    fn pair_drops_missing_pairwise() {
        let paired = pair(
            &[Some(1.0), None, Some(3.0), Some(4.0)],
            &[Some(1.5), Some(2.0), None, Some(4.5)],
        );
        assert_eq!(paired.simulated, vec![1.0, 4.0]);
        assert_eq!(paired.observed, vec![1.5, 4.5]);
        assert_eq!(paired.len(), 2);
    }

    #[test]
    fn align_matches_on_keys_not_position() {
        let simulated = table(vec![
            ("TRT", vec![Value::text("1"), Value::text("1"), Value::text("2")]),
            ("DAS", numbers(&[10.0, 20.0, 10.0])),
            ("LAID", numbers(&[0.5, 1.0, 0.7])),
        ]);
        let observed = table(vec![
            ("TRT", numbers(&[1.0, 1.0])),
            ("DAS", numbers(&[20.0, 30.0])),
            ("LAID", numbers(&[1.2, 2.0])),
        ]);
        let keys = vec!["TRT".to_string(), "DAS".to_string()];
        let paired = align(&simulated, &observed, "LAID", None, &keys).expect("align");
        assert_eq!(paired.simulated, vec![1.0]);
        assert_eq!(paired.observed, vec![1.2]);

        let only_two = align(&simulated, &observed, "LAID", Some("2"), &keys).expect("align");
        assert!(only_two.is_empty());
    }

    #[test]
    fn align_reports_missing_columns() {
        let simulated = table(vec![("TRT", numbers(&[1.0])), ("LAID", numbers(&[1.0]))]);
        let observed = table(vec![("TRT", numbers(&[1.0]))]);
        let err = align(&simulated, &observed, "LAID", None, &["TRT".to_string()]).unwrap_err();
        assert_eq!(
            err,
            AlignError::MissingColumn {
                side: "observed",
                column: "LAID".to_string()
            }
        );
    }

    #[test]
    fn series_filters_by_treatment() {
        let t = table(vec![
            ("TRT", numbers(&[1.0, 2.0, 1.0])),
            ("CWAD", vec![Value::number(10.0), Value::number(20.0), Value::Absent]),
        ]);
        assert_eq!(series(&t, "CWAD", Some("1")), Some(vec![Some(10.0), None]));
        assert_eq!(series(&t, "CWAD", None).map(|s| s.len()), Some(3));
        assert_eq!(series(&t, "HWAM", None), None);
    }

    #[test]
    fn fit_summary_matches_hand_computation() {
        let paired = PairedSeries {
            simulated: vec![2.0, 4.0, 6.0],
            observed: vec![1.0, 3.0, 5.0],
        };
        let summary = FitSummary::compute(&paired).expect("summary");
        assert_eq!(summary.n, 3);
        assert!(approx(summary.mean_observed, 3.0));
        assert!(approx(summary.mean_simulated, 4.0));
        assert!(approx(summary.rmse, 1.0));
        assert!(approx(summary.nrmse.unwrap(), 100.0 / 3.0));
        // Σ(|s-ō|+|o-ō|)² = (1+2)² + (1+0)² + (3+2)² = 35
        assert!(approx(summary.d_stat.unwrap(), 1.0 - 3.0 / 35.0));
        assert!(approx(summary.r_squared.unwrap(), 1.0));
    }

    #[test]
    fn zero_denominators_yield_none() {
        let paired = PairedSeries {
            simulated: vec![0.0, 0.0],
            observed: vec![0.0, 0.0],
        };
        let summary = FitSummary::compute(&paired).expect("summary");
        assert!(approx(summary.rmse, 0.0));
        assert_eq!(summary.nrmse, None);
        assert_eq!(summary.d_stat, None);
        assert_eq!(summary.r_squared, None);
        assert!(FitSummary::compute(&PairedSeries::default()).is_none());
    }

    #[test]
    fn comparison_keys_default_to_treatment_and_date() {
        assert_eq!(comparison_keys(&[]), vec!["TRT", "DATE"]);
        assert_eq!(comparison_keys(&[" ".to_string()]), vec!["TRT", "DATE"]);
        assert_eq!(
            comparison_keys(&["TRT ".to_string(), " DAS".to_string()]),
            vec!["TRT", "DAS"]
        );
    }
}

//! Column listing for a parsed file.
//!
//! Shows each column's inferred kind and missing count next to the label and
//! description from the variable dictionary, as an ASCII table or JSON.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    cli::ColumnsArgs,
    config::Config,
    reference::ReferenceData,
    schema::ColumnKind,
    table::{self, Table},
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnReport {
    pub position: usize,
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
    pub label: String,
    pub description: String,
}

/// One report per column, kinds inferred with the configured thresholds.
pub fn column_reports(parsed: &Table, config: &Config, reference: &ReferenceData) -> Vec<ColumnReport> {
    parsed
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let info = reference.variable(column.name());
            ColumnReport {
                position: idx + 1,
                name: column.name().to_string(),
                kind: column.infer_kind(&config.inference),
                missing: column.missing_count(),
                label: reference.label_for(column.name()).to_string(),
                description: info.map(|i| i.description.clone()).unwrap_or_default(),
            }
        })
        .collect()
}

pub fn execute(args: &ColumnsArgs, config: &Config) -> Result<()> {
    let matched = crate::load_table(&args.input, args.format, config)?;
    let reference = ReferenceData::new(config.reference.clone());
    let reports = column_reports(&matched.table, config, &reference);

    if args.json {
        let json = serde_json::to_string_pretty(&reports).context("Serializing column report")?;
        println!("{json}");
    } else {
        let headers = ["#", "name", "kind", "missing", "label", "description"]
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();
        let rows = reports
            .iter()
            .map(|report| {
                vec![
                    report.position.to_string(),
                    report.name.clone(),
                    report.kind.to_string(),
                    report.missing.to_string(),
                    report.label.clone(),
                    report.description.clone(),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }
    info!(
        "Listed {} column(s) from {:?} ({} reader)",
        reports.len(),
        args.input,
        matched.reader
    );
    Ok(())
}

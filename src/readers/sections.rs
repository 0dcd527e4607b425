//! Whitespace-delimited output with repeating `@` headers.
//!
//! Time-series output files (`PlantGro.OUT`, `SoilWat.OUT`, ...) repeat a
//! header per run and treatment. Each header starts a section; the
//! experiment, treatment, and run in effect when it starts are stamped onto
//! every row as `EXPERIMENT`, `TRT`, `RUN`, and `TNAME`. Sections are then
//! stacked in file order.

use std::{collections::HashMap, path::Path};

use log::debug;

use crate::{
    classify::{LineKind, classify},
    data::{Value, tokenize},
    dates,
    error::{ReadError, ReadResult},
    table::{Column, Table},
};

use super::{DATE_COLUMN, TREATMENT_COLUMN, TableReader, as_int, table_name};

pub const DEFAULT_EXPERIMENT: &str = "DEFAULT";
pub const DEFAULT_TREATMENT: &str = "1";
pub const DEFAULT_RUN: u32 = 1;

/// Columns that may carry the treatment number, in rename priority order.
const TREATMENT_ALIASES: &[&str] = &["TRNO", "TR", "TN"];

/// Words that end a data block when they appear in a data line.
const BLOCK_TERMINATORS: &[&str] = &["MODEL", "SUMMARY", "SEASONAL"];

#[derive(Debug, Clone, Copy, Default)]
pub struct SectionReader;

impl SectionReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for SectionReader {
    fn name(&self) -> &'static str {
        "sections"
    }

    fn parse(&self, path: &Path, lines: &[String]) -> ReadResult<Table> {
        let mut scanner = SectionScanner::default();
        for line in lines {
            scanner.feed(line);
        }
        if scanner.headers_seen == 0 {
            return Err(ReadError::NoHeaderFound {
                path: path.to_path_buf(),
            });
        }
        let headers_seen = scanner.headers_seen;
        let sections = scanner.finish();
        debug!(
            "Found {} data section(s) under {} header(s) in {:?}",
            sections.len(),
            headers_seen,
            path
        );

        let mut table = Table::concat(sections).ok_or_else(|| ReadError::NoDataTables {
            path: path.to_path_buf(),
        })?;
        table.set_name(table_name(path));

        if let Some(alias) = canonicalize_treatment(&mut table) {
            debug!("Renamed {alias} to {TREATMENT_COLUMN} in {:?}", path);
        }
        let dated = synthesize_dates(&mut table);
        if dated > 0 {
            debug!("Derived {dated} {DATE_COLUMN} value(s) from YEAR/DOY");
        }
        Ok(table)
    }
}

#[derive(Debug, Clone)]
struct Context {
    experiment: String,
    treatment: String,
    run: u32,
    run_markers: u32,
    treatment_names: HashMap<String, String>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            experiment: DEFAULT_EXPERIMENT.to_string(),
            treatment: DEFAULT_TREATMENT.to_string(),
            run: DEFAULT_RUN,
            run_markers: 0,
            treatment_names: HashMap::new(),
        }
    }
}

impl Context {
    fn treatment_name(&self) -> String {
        self.treatment_names
            .get(&self.treatment)
            .cloned()
            .unwrap_or_else(|| format!("Treatment {}", self.treatment))
    }
}

#[derive(Debug)]
struct OpenSection {
    table: Table,
    experiment: String,
    treatment: String,
    run: u32,
    treatment_name: String,
}

impl OpenSection {
    /// Appends the context columns. Empty sections are discarded.
    fn close(self) -> Option<Table> {
        let mut table = self.table;
        if table.is_empty() {
            return None;
        }
        let rows = table.row_count();
        table.insert_column(Column::filled("EXPERIMENT", Value::text(self.experiment), rows));
        let treatment = Value::parse(&self.treatment);
        table.insert_column(Column::filled(TREATMENT_COLUMN, treatment, rows));
        table.insert_column(Column::filled("RUN", Value::number(f64::from(self.run)), rows));
        table.insert_column(Column::filled("TNAME", Value::text(self.treatment_name), rows));
        Some(table)
    }
}

#[derive(Debug, Default)]
struct SectionScanner {
    context: Context,
    current: Option<OpenSection>,
    sections: Vec<Table>,
    headers_seen: usize,
}

impl SectionScanner {
    fn feed(&mut self, line: &str) {
        match classify(line) {
            LineKind::Blank | LineKind::Comment => {}
            LineKind::Header(columns) => {
                self.close_current();
                self.headers_seen += 1;
                self.current = Some(OpenSection {
                    table: Table::with_headers(String::new(), &columns),
                    experiment: self.context.experiment.clone(),
                    treatment: self.context.treatment.clone(),
                    run: self.context.run,
                    treatment_name: self.context.treatment_name(),
                });
            }
            LineKind::Run(id) => {
                self.close_current();
                self.context.run_markers += 1;
                self.context.run = id.unwrap_or(self.context.run_markers);
            }
            LineKind::Experiment(code) => {
                self.close_current();
                if let Some(code) = code {
                    self.context.experiment = code;
                }
            }
            LineKind::Treatment { number, name } => {
                self.close_current();
                if let Some(number) = number {
                    if let Some(name) = name {
                        self.context.treatment_names.insert(number.clone(), name);
                    }
                    self.context.treatment = number;
                }
            }
            LineKind::Section(_) => self.close_current(),
            LineKind::Data(text) => {
                if is_terminator(text) {
                    self.close_current();
                } else if let Some(section) = self.current.as_mut() {
                    section.table.push_tokens(tokenize(text));
                }
            }
        }
    }

    fn close_current(&mut self) {
        if let Some(section) = self.current.take()
            && let Some(table) = section.close()
        {
            self.sections.push(table);
        }
    }

    fn finish(mut self) -> Vec<Table> {
        self.close_current();
        self.sections
    }
}

fn is_terminator(line: &str) -> bool {
    let upper = line.to_ascii_uppercase();
    BLOCK_TERMINATORS.iter().any(|word| upper.contains(word))
}

/// Renames the first treatment alias holding a real value to `TRT`,
/// replacing the context column. Only one alias is ever renamed.
fn canonicalize_treatment(table: &mut Table) -> Option<&'static str> {
    let alias = TREATMENT_ALIASES.iter().copied().find(|alias| {
        table.column(alias).is_some_and(|column| {
            column
                .values()
                .iter()
                .any(|value| !value.is_missing() && value.as_display() != "0")
        })
    })?;
    table.rename_column(alias, TREATMENT_COLUMN);
    Some(alias)
}

fn synthesize_dates(table: &mut Table) -> usize {
    let (Some(years), Some(days)) = (table.column("YEAR"), table.column("DOY")) else {
        return 0;
    };
    let values = years
        .values()
        .iter()
        .zip(days.values())
        .map(|(year, doy)| {
            let date = match (as_int(Some(year)), as_int(Some(doy))) {
                (Some(year), Some(doy)) if year >= 1 && (1..=366).contains(&doy) => {
                    dates::normalize(Some(year), Some(doy), None)
                }
                _ => None,
            };
            date.map_or(Value::Absent, Value::Date)
        })
        .collect::<Vec<_>>();
    let resolved = values.iter().filter(|v| !v.is_missing()).count();
    table.insert_column(Column::from_values(DATE_COLUMN, values));
    resolved
}

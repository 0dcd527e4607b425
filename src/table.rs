//! In-memory columnar tables populated by the readers.
//!
//! A [`Table`] is an ordered list of named [`Column`]s that all hold exactly
//! `row_count` values. Readers are responsible for keeping rows even; the
//! table asserts the invariant instead of repairing it.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::OnceLock;

use itertools::Itertools;
use log::debug;

use crate::{
    data::{Value, fit_row},
    schema::{ColumnKind, InferenceThresholds},
};

#[derive(Debug, Clone, Default)]
pub struct Column {
    name: String,
    values: Vec<Value>,
    kind: OnceLock<ColumnKind>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            kind: OnceLock::new(),
        }
    }

    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
            kind: OnceLock::new(),
        }
    }

    /// A column of `len` copies of `value`.
    pub fn filled(name: impl Into<String>, value: Value, len: usize) -> Self {
        Self::from_values(name, vec![value; len])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Semantic kind under the default thresholds. See [`Column::infer_kind`].
    pub fn kind(&self) -> ColumnKind {
        self.infer_kind(&InferenceThresholds::default())
    }

    /// Classifies the column on first call and remembers the answer; later
    /// calls (and later edits to the values) do not change it.
    pub fn infer_kind(&self, thresholds: &InferenceThresholds) -> ColumnKind {
        *self
            .kind
            .get_or_init(|| thresholds.classify(self.values.iter()))
    }

    fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.values == other.values
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    row_count: usize,
    /// Column index for each header position, set by [`Table::with_headers`].
    slots: Vec<usize>,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns == other.columns
            && self.row_count == other.row_count
    }
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            row_count: 0,
            slots: Vec::new(),
        }
    }

    /// An empty table with the given header. A repeated name shares the
    /// column of its first occurrence; [`Table::push_tokens`] lets the later
    /// position win.
    pub fn with_headers(name: impl Into<String>, headers: &[String]) -> Self {
        let mut table = Self::new(name);
        for header in headers {
            let slot = match table.column_index(header) {
                Some(idx) => idx,
                None => {
                    table.insert_column(Column::new(header.as_str()));
                    table.columns.len() - 1
                }
            };
            table.slots.push(slot);
        }
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Adds a column, replacing any existing column of the same name in
    /// place. The first column added to an empty table sets the row count.
    pub fn insert_column(&mut self, column: Column) {
        if self.columns.is_empty() {
            self.row_count = column.len();
        }
        assert_eq!(
            column.len(),
            self.row_count,
            "column '{}' has {} values but table '{}' has {} rows",
            column.name,
            column.len(),
            self.name,
            self.row_count
        );
        match self.column_index(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.column_index(name)?;
        let removed = self.columns.remove(idx);
        self.slots.clear();
        if self.columns.is_empty() {
            self.row_count = 0;
        }
        Some(removed)
    }

    /// Renames `from` to `to`. An existing column already called `to` is
    /// dropped so names stay unique. Returns false when `from` is absent.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.has_column(from);
        }
        let Some(idx) = self.column_index(from) else {
            return false;
        };
        let idx = match self.column_index(to) {
            Some(existing) => {
                self.columns.remove(existing);
                self.slots.clear();
                if existing < idx { idx - 1 } else { idx }
            }
            None => idx,
        };
        self.columns[idx].set_name(to);
        true
    }

    /// Strips characters from every column name, e.g. the trailing dots used
    /// to pad header tokens. Collisions resolve in favour of the later column.
    pub fn trim_column_names(&mut self, pattern: char) {
        let renames = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.name.trim_end_matches(pattern).to_string()))
            .filter(|(from, to)| from != to && !to.is_empty())
            .collect::<Vec<_>>();
        for (from, to) in renames {
            self.rename_column(&from, &to);
        }
    }

    /// Appends one row given in column order. The row must be exactly as wide
    /// as the table.
    pub fn push_row(&mut self, values: Vec<Value>) {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "row width does not match table '{}'",
            self.name
        );
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.push(value);
        }
        self.row_count += 1;
    }

    /// Appends a raw token row, padding or truncating it to the header width.
    /// Tokens land in their header's column, so with a repeated header name
    /// the last position wins.
    pub fn push_tokens(&mut self, tokens: Vec<String>) {
        let width = if self.slots.is_empty() {
            self.columns.len()
        } else {
            self.slots.len()
        };
        if tokens.len() != width {
            debug!(
                "Fitting a {}-token row to {} column(s) in '{}'",
                tokens.len(),
                width,
                self.name
            );
        }
        let tokens = fit_row(tokens, width);
        if self.slots.is_empty() {
            self.push_row(tokens.iter().map(|token| Value::parse(token)).collect());
            return;
        }
        let mut values = vec![Value::Absent; self.columns.len()];
        for (&slot, token) in self.slots.iter().zip(&tokens) {
            values[slot] = Value::parse(token);
        }
        self.push_row(values);
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.column(column)?.get(row)
    }

    pub fn set_value(&mut self, row: usize, column: &str, value: Value) -> bool {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        match self.columns[idx].values.get_mut(row) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
        if row >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[row]).collect())
    }

    /// Union of columns, rows of `self` followed by rows of `other`. Columns
    /// missing on one side are padded with `Absent`. Rows are never matched or
    /// deduplicated.
    pub fn merge(&self, other: &Table) -> Table {
        let names = self
            .columns
            .iter()
            .chain(other.columns.iter())
            .map(|c| c.name.as_str())
            .unique()
            .collect::<Vec<_>>();
        let mut merged = Table::new(self.name.clone());
        for name in names {
            let mut values = Vec::with_capacity(self.row_count + other.row_count);
            extend_or_pad(&mut values, self.column(name), self.row_count);
            extend_or_pad(&mut values, other.column(name), other.row_count);
            merged.insert_column(Column::from_values(name, values));
        }
        merged.row_count = self.row_count + other.row_count;
        merged
    }

    /// Merges a sequence of tables in order. `None` when the sequence is empty.
    pub fn concat<I>(tables: I) -> Option<Table>
    where
        I: IntoIterator<Item = Table>,
    {
        tables
            .into_iter()
            .reduce(|merged, next| merged.merge(&next))
    }

    /// Keeps the rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(usize, &Table) -> bool,
    {
        let rows = (0..self.row_count)
            .filter(|&row| keep(row, self))
            .collect::<Vec<_>>();
        let mut filtered = Table::new(self.name.clone());
        for column in &self.columns {
            let values = rows.iter().map(|&row| column.values[row].clone()).collect();
            filtered.insert_column(Column::from_values(column.name.clone(), values));
        }
        filtered.row_count = rows.len();
        filtered
    }

    /// Rows whose `column` value displays as `wanted`. Numeric cells compare
    /// by value so `"1"` matches `1.0`.
    pub fn filter_eq(&self, column: &str, wanted: &str) -> Table {
        let wanted_number = wanted.trim().parse::<f64>().ok();
        self.filter_rows(|row, table| match table.value(row, column) {
            Some(value) => match (value.as_f64(), wanted_number) {
                (Some(a), Some(b)) => a == b,
                _ => value.as_display() == wanted.trim(),
            },
            None => false,
        })
    }

    /// Distinct non-missing display values of a column in first-seen order.
    pub fn distinct_text(&self, column: &str) -> Vec<String> {
        let Some(column) = self.column(column) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        column
            .values
            .iter()
            .filter(|v| !v.is_missing())
            .map(Value::as_display)
            .filter(|v| seen.insert(v.clone()))
            .collect()
    }

    /// Numeric view of a column with missing and non-numeric cells as `None`.
    pub fn numeric_series(&self, column: &str) -> Option<Vec<Option<f64>>> {
        self.column(column)
            .map(|c| c.values.iter().map(Value::as_f64).collect())
    }

    /// Header and display rows for the first `limit` rows (all rows when
    /// `limit` is `None`), optionally restricted to `columns`.
    pub fn display_rows(
        &self,
        columns: Option<&[String]>,
        limit: Option<usize>,
    ) -> (Vec<String>, Vec<Vec<String>>) {
        let selected = match columns {
            Some(names) if !names.is_empty() => names
                .iter()
                .filter_map(|name| self.column(name))
                .collect::<Vec<_>>(),
            _ => self.columns.iter().collect(),
        };
        let headers = selected.iter().map(|c| c.name.clone()).collect();
        let take = limit.unwrap_or(self.row_count).min(self.row_count);
        let rows = (0..take)
            .map(|row| {
                selected
                    .iter()
                    .map(|c| c.values[row].as_display())
                    .collect()
            })
            .collect();
        (headers, rows)
    }
}

fn extend_or_pad(values: &mut Vec<Value>, column: Option<&Column>, rows: usize) {
    match column {
        Some(column) => values.extend(column.values.iter().cloned()),
        None => values.extend(std::iter::repeat_n(Value::Absent, rows)),
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();

    let header_line = format_row(headers, &widths);
    let _ = writeln!(output, "{header_line}");

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
    let separator_cells = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let separator_line = format_row(&separator_cells, &separator_widths);
    let _ = writeln!(output, "{separator_line}");

    for row in rows {
        let row_line = format_row(row, &widths);
        let _ = writeln!(output, "{row_line}");
    }

    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    let rendered = render_table(headers, rows);
    print!("{rendered}");
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(sanitized.as_ref()));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

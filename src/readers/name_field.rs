//! Single-header files with a positional, free-text name column.
//!
//! In `Summary.OUT` style files the treatment name (`TNAM...`) may contain
//! spaces, so splitting a row on whitespace would shift every column after
//! it. The name is therefore cut out by character position first
//! ([`extract_by_position`]), a placeholder token takes its place, and the
//! rest of the row is split normally ([`tokenize_remainder`]).

use std::path::Path;

use log::debug;

use crate::{
    classify::{LineKind, classify},
    config::NameFieldOptions,
    data::{Value, tokenize},
    dates,
    error::{ReadError, ReadResult},
    table::{Column, Table},
};

use super::{DATE_COLUMN, TREATMENT_COLUMN, TableReader, as_int, table_name};

/// Stand-in for the name field while the rest of the row is tokenized. It
/// contains no whitespace, so it always survives as exactly one token.
pub const NAME_PLACEHOLDER: &str = "\u{1f}NAME\u{1f}";

/// Character range `[start, end)` of the name field, and its header index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSpan {
    pub column: usize,
    pub start: usize,
    pub end: usize,
}

/// Header tokens with their starting character offsets. The leading `@` is
/// treated as a blank so offsets line up with data rows.
pub fn header_offsets(header_line: &str) -> Vec<(usize, String)> {
    let mut offsets = Vec::new();
    let mut current: Option<(usize, String)> = None;
    for (idx, ch) in header_line.chars().enumerate() {
        let blank = ch.is_whitespace() || (ch == '@' && current.is_none());
        if blank {
            if let Some(token) = current.take() {
                offsets.push(token);
            }
        } else {
            current
                .get_or_insert_with(|| (idx, String::new()))
                .1
                .push(ch);
        }
    }
    offsets.extend(current);
    offsets
}

/// Finds the first header column whose name contains `marker`. The span runs
/// to one character before the next column, or `default_width` characters
/// when the name column is last.
pub fn locate_name_span(header_line: &str, marker: &str, default_width: usize) -> Option<NameSpan> {
    let offsets = header_offsets(header_line);
    let column = offsets.iter().position(|(_, name)| name.contains(marker))?;
    let start = offsets[column].0;
    let end = match offsets.get(column + 1) {
        Some((anchor, _)) => anchor.saturating_sub(1).max(start),
        None => start + default_width,
    };
    Some(NameSpan { column, start, end })
}

/// Cuts the name field out of `line` by character position. Returns the
/// trimmed name and the line with the field replaced by [`NAME_PLACEHOLDER`].
pub fn extract_by_position(line: &str, span: &NameSpan) -> (String, String) {
    let chars = line.chars().collect::<Vec<_>>();
    if chars.len() <= span.start {
        return (String::new(), format!("{line} {NAME_PLACEHOLDER}"));
    }
    let end = span.end.min(chars.len());
    let name = chars[span.start..end]
        .iter()
        .collect::<String>()
        .trim()
        .to_string();
    let before = chars[..span.start].iter().collect::<String>();
    let after = chars[end..].iter().collect::<String>();
    (name, format!("{before} {NAME_PLACEHOLDER} {after}"))
}

/// Splits the placeholder-bearing line on whitespace and puts `name` back in
/// the placeholder's slot.
pub fn tokenize_remainder(remainder: &str, name: &str) -> Vec<String> {
    let mut tokens = tokenize(remainder);
    if let Some(slot) = tokens.iter_mut().find(|token| token.as_str() == NAME_PLACEHOLDER) {
        *slot = name.to_string();
    }
    tokens
}

#[derive(Debug, Clone, Default)]
pub struct NameFieldReader {
    options: NameFieldOptions,
}

impl NameFieldReader {
    pub fn new(options: NameFieldOptions) -> Self {
        Self { options }
    }

    fn split_row(&self, text: &str, span: Option<&NameSpan>) -> Vec<String> {
        match span {
            Some(span) => {
                let (name, remainder) = extract_by_position(text, span);
                tokenize_remainder(&remainder, &name)
            }
            None => tokenize(text),
        }
    }

    fn canonicalize(&self, table: &mut Table) {
        table.trim_column_names('.');
        table.rename_column("CR", "CROP");
        table.rename_column("TRNO", TREATMENT_COLUMN);
        rename_first_with_prefix(table, &self.options.name_marker, "TNAME");
        rename_first_with_prefix(table, &self.options.experiment_marker, "EXPERIMENT");
    }

    fn synthesize_dates(&self, table: &mut Table) -> usize {
        if table.has_column(DATE_COLUMN) {
            return 0;
        }
        let Some(day_column) = first_present(table, &self.options.day_columns) else {
            return 0;
        };
        let year_column = first_present(table, &self.options.year_columns);
        let values = (0..table.row_count())
            .map(|row| {
                let day = table.value(row, &day_column);
                let code = day.map(Value::as_display).unwrap_or_default();
                let date = if code.len() == 7 {
                    dates::normalize(None, None, Some(code.as_str()))
                } else {
                    let year = year_column
                        .as_deref()
                        .and_then(|column| as_int(table.value(row, column)));
                    match (year, as_int(day)) {
                        (Some(year), Some(doy)) => dates::normalize(Some(year), Some(doy), None),
                        _ => None,
                    }
                };
                date.map_or(Value::Absent, Value::Date)
            })
            .collect::<Vec<_>>();
        let resolved = values.iter().filter(|v| !v.is_missing()).count();
        table.insert_column(Column::from_values(DATE_COLUMN, values));
        resolved
    }
}

impl TableReader for NameFieldReader {
    fn name(&self) -> &'static str {
        "name-field"
    }

    fn parse(&self, path: &Path, lines: &[String]) -> ReadResult<Table> {
        let Some((header_idx, headers)) = lines.iter().enumerate().find_map(|(idx, line)| {
            match classify(line) {
                LineKind::Header(columns) => Some((idx, columns)),
                _ => None,
            }
        }) else {
            return Err(ReadError::NoHeaderFound {
                path: path.to_path_buf(),
            });
        };

        let span = locate_name_span(
            &lines[header_idx],
            &self.options.name_marker,
            self.options.default_width,
        );
        match &span {
            Some(span) => debug!(
                "Name field '{}' spans characters {}..{} in {:?}",
                headers[span.column], span.start, span.end, path
            ),
            None => debug!("No name field in header of {:?}; splitting on whitespace", path),
        }

        let mut table = Table::with_headers(table_name(path), &headers);
        for line in &lines[header_idx + 1..] {
            match classify(line) {
                LineKind::Data(text) => table.push_tokens(self.split_row(text, span.as_ref())),
                LineKind::Header(columns) if columns == headers => {}
                LineKind::Header(_) => {
                    debug!("Stopping at a second, different header in {:?}", path);
                    break;
                }
                _ => {}
            }
        }
        if table.is_empty() {
            return Err(ReadError::NoDataFound {
                path: path.to_path_buf(),
            });
        }

        self.canonicalize(&mut table);
        let dated = self.synthesize_dates(&mut table);
        debug!(
            "Read {} row(s) from {:?}; {} dated",
            table.row_count(),
            path,
            dated
        );
        Ok(table)
    }
}

fn rename_first_with_prefix(table: &mut Table, prefix: &str, to: &str) {
    if prefix.is_empty() || table.has_column(to) {
        return;
    }
    let found = table
        .column_names()
        .into_iter()
        .find(|name| name.starts_with(prefix))
        .map(str::to_string);
    if let Some(from) = found {
        table.rename_column(&from, to);
    }
}

fn first_present(table: &Table, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .find(|name| table.has_column(name))
        .cloned()
}

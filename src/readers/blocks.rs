//! Observed-data files with several `@` header blocks.
//!
//! Time-series (`.xxT`) and summary (`.xxA`) observation files split their
//! measurements across blocks that share identifier columns such as `TRNO`
//! and `DATE`. Each block becomes its own table and the blocks are merged by
//! column union in file order.
//!
//! `DATE` is decoded from the raw token text of each block. Going through the
//! numeric cell would turn `05123` into `5123` and lose the year.

use std::path::Path;

use log::debug;

use crate::{
    classify::{LineKind, classify},
    data::{Value, tokenize},
    dates,
    error::{ReadError, ReadResult},
    table::{Column, Table},
};

use super::{DATE_COLUMN, TREATMENT_COLUMN, TableReader, table_name};

/// Planting-date column that takes priority as the source of `DATE`.
pub const PLANTING_DATE_COLUMN: &str = "PDAT";

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockReader;

impl BlockReader {
    pub fn new() -> Self {
        Self
    }
}

impl TableReader for BlockReader {
    fn name(&self) -> &'static str {
        "blocks"
    }

    fn parse(&self, path: &Path, lines: &[String]) -> ReadResult<Table> {
        let header_lines = lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| match classify(line) {
                LineKind::Header(columns) => Some((idx, columns)),
                _ => None,
            })
            .collect::<Vec<_>>();
        if header_lines.is_empty() {
            return Err(ReadError::NoHeaderFound {
                path: path.to_path_buf(),
            });
        }

        let mut blocks = Vec::with_capacity(header_lines.len());
        for (position, (start, columns)) in header_lines.iter().enumerate() {
            let end = header_lines
                .get(position + 1)
                .map_or(lines.len(), |(next, _)| *next);
            let (block, dated) = read_block(&lines[start + 1..end], columns);
            debug!(
                "Block {} in {:?}: {} column(s), {} row(s), {} dated",
                position + 1,
                path,
                block.column_count(),
                block.row_count(),
                dated
            );
            if !block.is_empty() {
                blocks.push(block);
            }
        }

        let mut table = Table::concat(blocks).ok_or_else(|| ReadError::NoDataFound {
            path: path.to_path_buf(),
        })?;
        table.set_name(table_name(path));

        table.rename_column("TRNO", TREATMENT_COLUMN);
        Ok(table)
    }
}

/// Rows of one block plus the number of rows that got a `DATE`. Markers other
/// than headers are skipped rather than ending the block.
fn read_block(lines: &[String], columns: &[String]) -> (Table, usize) {
    let mut table = Table::with_headers(String::new(), columns);
    let source = [PLANTING_DATE_COLUMN, DATE_COLUMN]
        .iter()
        .find_map(|name| columns.iter().rposition(|column| column == name));
    let mut parsed = Vec::new();
    for line in lines {
        if let LineKind::Data(text) = classify(line) {
            let tokens = tokenize(text);
            if let Some(idx) = source {
                let date = tokens
                    .get(idx)
                    .and_then(|token| dates::normalize(None, None, Some(token.as_str())));
                parsed.push(date.map_or(Value::Absent, Value::Date));
            }
            table.push_tokens(tokens);
        }
    }
    let dated = parsed.iter().filter(|v| !v.is_missing()).count();
    if source.is_some() && !table.is_empty() {
        table.insert_column(Column::from_values(DATE_COLUMN, parsed));
    }
    (table, dated)
}

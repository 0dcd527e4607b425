//! File readers for the three table layouts written by the crop model.
//!
//! Every reader implements [`TableReader`]. Which readers to try, and in which
//! order, is the caller's decision: [`read_first_match`] runs an explicit list
//! and stops at the first success, and [`suggest_order`] offers the usual
//! ordering for a file name.

pub mod blocks;
pub mod name_field;
pub mod sections;

use std::{fmt, path::Path};

use log::debug;

use crate::{
    config::Config,
    data::Value,
    error::{ReadError, ReadResult},
    io_utils,
    table::Table,
};

pub use blocks::BlockReader;
pub use name_field::NameFieldReader;
pub use sections::SectionReader;

/// Canonical treatment-number column.
pub const TREATMENT_COLUMN: &str = "TRT";
pub const DATE_COLUMN: &str = "DATE";

pub trait TableReader {
    fn name(&self) -> &'static str;

    /// Parses already-decoded lines. `path` is only used for table naming and
    /// error reporting.
    fn parse(&self, path: &Path, lines: &[String]) -> ReadResult<Table>;

    fn read(&self, path: &Path) -> ReadResult<Table> {
        let lines = io_utils::read_lines(path)?;
        self.parse(path, &lines)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sections,
    NameField,
    Blocks,
}

impl Strategy {
    pub fn reader(&self, config: &Config) -> Box<dyn TableReader> {
        match self {
            Strategy::Sections => Box::new(SectionReader::new()),
            Strategy::NameField => Box::new(NameFieldReader::new(config.name_field.clone())),
            Strategy::Blocks => Box::new(BlockReader::new()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sections => "sections",
            Strategy::NameField => "name-field",
            Strategy::Blocks => "blocks",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conventional reader order for a file name:
/// `SUMMARY.OUT` is positional, other `.OUT` files are sectioned, and
/// observed files (`.xxT` / `.xxA`) are header blocks.
pub fn suggest_order(path: &Path) -> Vec<Strategy> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_uppercase())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_uppercase())
        .unwrap_or_default();

    if file_name == "SUMMARY.OUT" {
        vec![Strategy::NameField, Strategy::Sections]
    } else if extension == "OUT" {
        vec![Strategy::Sections, Strategy::NameField]
    } else if extension.len() == 3 && (extension.ends_with('T') || extension.ends_with('A')) {
        vec![Strategy::Blocks, Strategy::NameField]
    } else {
        vec![Strategy::Sections, Strategy::Blocks, Strategy::NameField]
    }
}

/// Outcome of [`read_first_match`].
#[derive(Debug, Clone)]
pub struct Matched {
    pub table: Table,
    pub reader: &'static str,
}

/// Tries each reader in order on one decoded copy of the file. Format
/// mismatches move on to the next reader; I/O failures stop immediately.
/// When every reader declines, the last reader's error is returned.
pub fn read_first_match(path: &Path, readers: &[&dyn TableReader]) -> ReadResult<Matched> {
    let lines = io_utils::read_lines(path)?;
    let mut last_error = None;
    for reader in readers {
        match reader.parse(path, &lines) {
            Ok(table) => {
                debug!("{} reader accepted {:?}", reader.name(), path);
                return Ok(Matched {
                    table,
                    reader: reader.name(),
                });
            }
            Err(err) if err.is_format_mismatch() => {
                debug!("{} reader declined {:?}: {}", reader.name(), path, err);
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_error.unwrap_or_else(|| ReadError::NoHeaderFound {
        path: path.to_path_buf(),
    }))
}

pub(crate) fn table_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Integer view of a cell, for year and day columns.
pub(crate) fn as_int(value: Option<&Value>) -> Option<i32> {
    let number = value?.as_f64()?;
    (number.fract() == 0.0 && number.abs() < f64::from(i32::MAX)).then_some(number as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_order_follows_file_conventions() {
        assert_eq!(
            suggest_order(Path::new("run/Summary.OUT")),
            vec![Strategy::NameField, Strategy::Sections]
        );
        assert_eq!(
            suggest_order(Path::new("PlantGro.OUT"))[0],
            Strategy::Sections
        );
        assert_eq!(
            suggest_order(Path::new("UFGA8201.MZT"))[0],
            Strategy::Blocks
        );
        assert_eq!(
            suggest_order(Path::new("UFGA8201.MZA"))[0],
            Strategy::Blocks
        );
        assert_eq!(suggest_order(Path::new("notes.csv")).len(), 3);
    }

    #[test]
    fn as_int_rejects_fractions_and_missing() {
        assert_eq!(as_int(Some(&Value::Number(1982.0))), Some(1982));
        assert_eq!(as_int(Some(&Value::Number(1.5))), None);
        assert_eq!(as_int(Some(&Value::Absent)), None);
        assert_eq!(as_int(None), None);
    }
}

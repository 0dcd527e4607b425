//! File input and CSV output helpers.
//!
//! Model files are read whole and decoded as UTF-8, falling back to
//! Windows-1252 for legacy output that carries Latin-1 bytes in treatment
//! or site names. CSV output goes through the `csv` crate; the `-` path
//! routes to stdout.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::debug;

use crate::error::{ReadError, ReadResult};

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

/// Reads `path` into lines with line terminators removed.
pub fn read_lines(path: &Path) -> ReadResult<Vec<String>> {
    let bytes = fs::read(path).map_err(|err| ReadError::from_io(path, err))?;
    let text = decode_text(&bytes);
    Ok(text.lines().map(str::to_string).collect())
}

/// Decodes bytes as UTF-8 when valid, otherwise as Windows-1252. A UTF-8 BOM
/// is dropped either way.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return text.into_owned();
    }
    debug!("Input is not valid UTF-8; decoding as {}", WINDOWS_1252.name());
    decode_with(bytes, WINDOWS_1252)
}

pub fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

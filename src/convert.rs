use anyhow::{Context, Result};
use log::info;

use crate::{cli::ConvertArgs, config::Config, io_utils, table::Table};

/// Writes the header and every row of `parsed`. Absent cells become empty
/// fields and dates are written as `%Y-%m-%d`.
pub fn write_table<W: std::io::Write>(parsed: &Table, writer: &mut csv::Writer<W>) -> Result<()> {
    writer
        .write_record(parsed.column_names())
        .context("Writing CSV header")?;
    for row in 0..parsed.row_count() {
        let record = parsed
            .columns()
            .iter()
            .map(|column| column.values()[row].as_display())
            .collect::<Vec<_>>();
        writer
            .write_record(&record)
            .with_context(|| format!("Writing row {}", row + 1))?;
    }
    Ok(())
}

pub fn execute(args: &ConvertArgs, config: &Config) -> Result<()> {
    let matched = crate::load_table(&args.input, args.format, config)?;
    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), args.delimiter)?;
    write_table(&matched.table, &mut writer)?;
    writer.flush().context("Flushing CSV output")?;
    info!(
        "Wrote {} row(s) and {} column(s) from {:?} ({} reader)",
        matched.table.row_count(),
        matched.table.column_count(),
        args.input,
        matched.reader
    );
    Ok(())
}

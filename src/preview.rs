use anyhow::{Result, bail};
use log::info;

use crate::{cli::PreviewArgs, config::Config, readers::TREATMENT_COLUMN, table};

pub fn execute(args: &PreviewArgs, config: &Config) -> Result<()> {
    let matched = crate::load_table(&args.input, args.format, config)?;
    let mut parsed = matched.table;

    if let Some(treatment) = args.treatment.as_deref() {
        if !parsed.has_column(TREATMENT_COLUMN) {
            bail!("{:?} has no {TREATMENT_COLUMN} column to filter on", args.input);
        }
        parsed = parsed.filter_eq(TREATMENT_COLUMN, treatment);
    }

    let missing = args
        .columns
        .iter()
        .filter(|name| !parsed.has_column(name))
        .cloned()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "Column(s) not found in {:?}: {}",
            args.input,
            missing.join(", ")
        );
    }

    let (headers, rows) = parsed.display_rows(Some(args.columns.as_slice()), Some(args.rows));
    table::print_table(&headers, &rows);
    info!(
        "Displayed {} of {} row(s) from {:?} using the {} reader",
        rows.len(),
        parsed.row_count(),
        args.input,
        matched.reader
    );
    Ok(())
}

pub mod classify;
pub mod cli;
pub mod columns;
pub mod config;
pub mod convert;
pub mod data;
pub mod dates;
pub mod error;
pub mod io_utils;
pub mod lookup;
pub mod metrics;
pub mod preview;
pub mod readers;
pub mod reference;
pub mod schema;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug};

use crate::{
    cli::{Cli, Commands, ReaderFormat},
    config::Config,
    readers::{Matched, TableReader},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dssat_tables", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("Loading configuration from {path:?}"))?
        }
        None => Config::default(),
    };
    match cli.command {
        Commands::Preview(args) => preview::execute(&args, &config),
        Commands::Columns(args) => columns::execute(&args, &config),
        Commands::Convert(args) => convert::execute(&args, &config),
        Commands::Compare(args) => metrics::execute(&args, &config),
        Commands::Lookup(args) => lookup::execute(&args, &config),
    }
}

/// Reads `path` with the requested layout, or with the conventional order
/// for its file name when `format` is `auto`.
pub(crate) fn load_table(path: &Path, format: ReaderFormat, config: &Config) -> Result<Matched> {
    let strategies = match format.strategy() {
        Some(strategy) => vec![strategy],
        None => readers::suggest_order(path),
    };
    debug!(
        "Reading {:?} with {}",
        path,
        strategies.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" -> ")
    );
    let boxed = strategies
        .iter()
        .map(|strategy| strategy.reader(config))
        .collect::<Vec<_>>();
    let chain = boxed.iter().map(|reader| reader.as_ref()).collect::<Vec<&dyn TableReader>>();
    readers::read_first_match(path, &chain).with_context(|| format!("Reading {path:?}"))
}

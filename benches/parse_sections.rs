use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use dssat_tables::io_utils;
use dssat_tables::readers::{BlockReader, NameFieldReader, SectionReader, TableReader};
use tempfile::TempDir;

/// PlantGro-style output with `runs` runs of one season each.
fn generate_plantgro(runs: usize, days: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let path = temp_dir.path().join("PlantGro.OUT");
    let mut file = BufWriter::new(File::create(&path).expect("create output"));
    writeln!(file, "*DSSAT Cropping System Model Ver. 4.8.0.000").expect("banner");
    for run in 1..=runs {
        let treatment = (run - 1) % 6 + 1;
        writeln!(file).expect("blank");
        writeln!(file, "*RUN {run:3}        : Treatment {treatment} MZCER048").expect("run");
        writeln!(file, " EXPERIMENT     : UFGA8201 MZ BENCHMARK").expect("experiment");
        writeln!(file, " TREATMENT {treatment:2}   : Treatment {treatment}     MZCER048")
            .expect("treatment");
        writeln!(file).expect("blank");
        writeln!(file, "@YEAR DOY   DAS   LAID   CWAD   HWAD").expect("header");
        for das in 0..days {
            let doy = 57 + das;
            let laid = das as f64 * 0.05;
            let cwad = das * 40;
            let hwad = if das < days / 2 { "-99".to_string() } else { (das * 12).to_string() };
            writeln!(file, " 1982 {doy:3} {das:5} {laid:6.2} {cwad:6} {hwad:>6}").expect("row");
        }
    }
    file.flush().expect("flush output");
    (temp_dir, path)
}

/// Observed time series with one block per measured variable.
fn generate_observed(treatments: usize, dates: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let path = temp_dir.path().join("UFGA8201.MZT");
    let mut file = BufWriter::new(File::create(&path).expect("create observed"));
    writeln!(file, "*EXP.DATA (T): UFGA8201MZ BENCHMARK").expect("banner");
    for variable in ["LAID", "CWAD", "HWAD"] {
        writeln!(file).expect("blank");
        writeln!(file, "@TRNO DATE  {variable}").expect("header");
        for trt in 1..=treatments {
            for step in 0..dates {
                let doy = 60 + step * 7;
                writeln!(file, "{trt:5} 82{doy:03} {:6}", step * trt).expect("row");
            }
        }
    }
    file.flush().expect("flush observed");
    (temp_dir, path)
}

fn bench_readers(c: &mut Criterion) {
    let (plantgro_dir, plantgro) = generate_plantgro(60, 150);
    let (observed_dir, observed) = generate_observed(12, 40);
    let plantgro_lines = io_utils::read_lines(&plantgro).expect("read plantgro");
    let observed_lines = io_utils::read_lines(&observed).expect("read observed");

    let mut group = c.benchmark_group("readers");

    group.bench_function("sections_plantgro", |b| {
        let reader = SectionReader::new();
        b.iter_batched(
            || (),
            |_| {
                reader.parse(&plantgro, &plantgro_lines).expect("parse sections");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("blocks_observed", |b| {
        let reader = BlockReader::new();
        b.iter_batched(
            || (),
            |_| {
                reader.parse(&observed, &observed_lines).expect("parse blocks");
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("name_field_single_header", |b| {
        let reader = NameFieldReader::default();
        b.iter_batched(
            || (),
            |_| {
                reader.parse(&plantgro, &plantgro_lines).expect("parse name field");
            },
            BatchSize::SmallInput,
        );
    });

    drop(plantgro_dir);
    drop(observed_dir);
    group.finish();
}

criterion_group!(benches, bench_readers);
criterion_main!(benches);

mod common;

use std::path::Path;

use chrono::NaiveDate;
use common::{TestWorkspace, fixture_path};
use dssat_tables::{
    config::NameFieldOptions,
    data::Value,
    error::ReadError,
    readers::{
        BlockReader, NameFieldReader, SectionReader, Strategy, TableReader, read_first_match,
        suggest_order,
    },
    table::Table,
};

fn ymd(y: i32, m: u32, d: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

fn assert_rectangular(table: &Table) {
    for column in table.columns() {
        assert_eq!(
            column.len(),
            table.row_count(),
            "column {} is out of shape",
            column.name()
        );
    }
}

#[test]
fn plantgro_sections_carry_run_and_treatment_context() {
    let table = SectionReader::new()
        .read(&fixture_path("PlantGro.OUT"))
        .expect("read PlantGro.OUT");
    assert_rectangular(&table);
    assert_eq!(table.name(), "PlantGro.OUT");
    assert_eq!(table.row_count(), 5);
    assert_eq!(
        table.column_names(),
        vec![
            "YEAR",
            "DOY",
            "DAS",
            "DAP",
            "LAID",
            "CWAD",
            "EXPERIMENT",
            "TRT",
            "RUN",
            "TNAME",
            "DATE"
        ]
    );
    assert_eq!(table.value(0, "EXPERIMENT"), Some(&Value::text("UFGA8201")));
    assert_eq!(table.value(0, "TNAME"), Some(&Value::text("RAINFED LOW NITROGEN")));
    assert_eq!(table.value(4, "TRT"), Some(&Value::Number(2.0)));
    assert_eq!(table.value(4, "RUN"), Some(&Value::Number(2.0)));
    assert_eq!(table.value(4, "TNAME"), Some(&Value::text("RAINFED HIGH NITROGEN")));
    assert_eq!(table.value(2, "DATE"), Some(&ymd(1982, 3, 16)));
    assert_eq!(table.distinct_text("TRT"), vec!["1", "2"]);
}

#[test]
fn section_context_scenario() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "Context.OUT",
        "*EXPERIMENT 1 : UFGA8201\n\
         TREATMENT 1 : Control\n\
         @YEAR DOY DAS\n\
         1982 57 0\n\
         1982 58 1\n\
         1982 59 2\n",
    );
    let table = SectionReader::new().read(&path).expect("read sections");
    assert_eq!(table.row_count(), 3);
    for row in 0..3 {
        assert_eq!(table.value(row, "EXPERIMENT"), Some(&Value::text("UFGA8201")));
        assert_eq!(table.value(row, "TRT"), Some(&Value::Number(1.0)));
        assert_eq!(table.value(row, "TNAME"), Some(&Value::text("Control")));
    }
}

#[test]
fn repeated_keys_across_sections_are_kept() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "Twice.OUT",
        "*RUN 1 : Control MZCER048\n\
         @YEAR DOY LAID\n\
         1982 57 0.1\n\
         *GROWTH ASPECTS\n\
         @YEAR DOY CWAD\n\
         1982 57 12\n",
    );
    let table = SectionReader::new().read(&path).expect("read sections");
    assert_rectangular(&table);
    // Same experiment, treatment, run and date in both sections: rows stack.
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.value(0, "DATE"), table.value(1, "DATE"));
    assert!(table.value(0, "CWAD").unwrap().is_missing());
    assert!(table.value(1, "LAID").unwrap().is_missing());
}

#[test]
fn ragged_rows_are_padded_or_truncated() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("Ragged.OUT", "@DAS LAID CWAD\n0 0.1\n1 0.2 30 extra\n");
    let table = SectionReader::new().read(&path).expect("read sections");
    assert_rectangular(&table);
    assert!(table.value(0, "CWAD").unwrap().is_missing());
    assert_eq!(table.value(1, "CWAD"), Some(&Value::Number(30.0)));
    assert!(!table.has_column("extra"));
}

#[test]
fn legacy_latin1_names_are_decoded() {
    let workspace = TestWorkspace::new();
    let mut bytes = b"TREATMENT 1 : Caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b" MZCER048\r\n@DAS LAID\r\n0 0.1\r\n");
    let path = workspace.write_bytes("Latin.OUT", &bytes);
    let table = SectionReader::new().read(&path).expect("read sections");
    assert_eq!(table.value(0, "TNAME"), Some(&Value::text("Caf\u{e9}")));
    assert_eq!(table.value(0, "LAID"), Some(&Value::Number(0.1)));
}

#[test]
fn summary_name_field_keeps_embedded_spaces() {
    let table = NameFieldReader::new(NameFieldOptions::default())
        .read(&fixture_path("Summary.OUT"))
        .expect("read Summary.OUT");
    assert_rectangular(&table);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.value(0, "TNAME"), Some(&Value::text("Rainfed low N")));
    assert_eq!(table.value(0, "FNAM"), Some(&Value::text("FN01")));
    assert_eq!(table.value(0, "CROP"), Some(&Value::text("MZ")));
    assert_eq!(table.value(0, "EXPERIMENT"), Some(&Value::text("UFGA8201")));
    assert_eq!(table.value(0, "DATE"), Some(&ymd(1982, 2, 26)));
    assert!(table.value(1, "PDAT").unwrap().is_missing());
}

#[test]
fn name_field_extraction_scenario() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "Names.OUT",
        "@TRNO TNAM            FNAM\n    1 Early Plant     FN01\n    2 Late            FN02\n",
    );
    let table = NameFieldReader::default().read(&path).expect("read name field");
    assert_eq!(table.column_names(), vec!["TRT", "TNAME", "FNAM"]);
    assert_eq!(table.value(0, "TNAME"), Some(&Value::text("Early Plant")));
    assert_eq!(table.value(1, "TNAME"), Some(&Value::text("Late")));
    assert_eq!(table.value(1, "FNAM"), Some(&Value::text("FN02")));
}

#[test]
fn observed_blocks_merge_and_rename_treatment() {
    let table = BlockReader::new()
        .read(&fixture_path("UFGA8201.MZT"))
        .expect("read UFGA8201.MZT");
    assert_rectangular(&table);
    assert_eq!(table.row_count(), 4);
    assert_eq!(table.column_names(), vec!["TRT", "DATE", "LAID", "CWAD", "HWAD"]);
    assert_eq!(table.value(0, "DATE"), Some(&ymd(1982, 3, 16)));
    assert_eq!(table.value(3, "DATE"), Some(&ymd(1982, 6, 9)));
    assert!(table.value(1, "CWAD").unwrap().is_missing());
    assert!(table.value(3, "LAID").unwrap().is_missing());
    assert_eq!(table.value(3, "HWAD"), Some(&Value::Number(5200.0)));
}

#[test]
fn header_block_scenario() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "TWOB.MZT",
        "@TRNO LAID\n1 0.5\n2 0.6\n\n@TRNO CWAD\n1 100\n",
    );
    let table = BlockReader::new().read(&path).expect("read blocks");
    assert!(table.has_column("TRT"));
    assert!(!table.has_column("TRNO"));
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.value(2, "TRT"), Some(&Value::Number(1.0)));
}

#[test]
fn empty_file_is_never_an_empty_table() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("Empty.OUT", "");
    let readers: [&dyn TableReader; 3] = [
        &SectionReader::new(),
        &NameFieldReader::default(),
        &BlockReader::new(),
    ];
    for reader in readers {
        let err = reader.read(&path).unwrap_err();
        assert!(
            matches!(err, ReadError::NoHeaderFound { .. }),
            "{} returned {err:?}",
            reader.name()
        );
    }
}

#[test]
fn missing_file_is_reported_as_not_found() {
    let workspace = TestWorkspace::new();
    let err = SectionReader::new()
        .read(&workspace.path().join("absent.OUT"))
        .unwrap_err();
    assert!(matches!(err, ReadError::FileNotFound { .. }));
    assert!(!err.is_format_mismatch());
}

#[test]
fn first_match_reports_the_reader_that_succeeded() {
    let summary = fixture_path("Summary.OUT");
    let order = suggest_order(&summary);
    assert_eq!(order, vec![Strategy::NameField, Strategy::Sections]);

    let name_field = NameFieldReader::default();
    let sections = SectionReader::new();
    let matched = read_first_match(&summary, &[&name_field, &sections]).expect("read summary");
    assert_eq!(matched.reader, "name-field");
    assert_eq!(matched.table.row_count(), 2);
}

#[test]
fn first_match_falls_through_format_mismatches() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("Mixed.OUT", "@DAS LAID\n@DAS LAID CWAD\n0 0.1 12\n");
    let name_field = NameFieldReader::default();
    let sections = SectionReader::new();
    let matched = read_first_match(&path, &[&name_field, &sections]).expect("fallback");
    assert_eq!(matched.reader, "sections");
    assert_eq!(matched.table.row_count(), 1);

    let plain = workspace.write("Plain.OUT", "no markers here\n1 2 3\n");
    let blocks = BlockReader::new();
    let err = read_first_match(&plain, &[&sections, &blocks]).unwrap_err();
    assert!(matches!(err, ReadError::NoHeaderFound { .. }));
}

#[test]
fn first_match_stops_on_io_failure() {
    let sections = SectionReader::new();
    let err = read_first_match(Path::new("/definitely/not/here.OUT"), &[&sections]).unwrap_err();
    assert!(matches!(err, ReadError::FileNotFound { .. }));
}

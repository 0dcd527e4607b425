fn main() {
    if let Err(err) = dssat_tables::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

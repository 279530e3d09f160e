pub mod interval_csv_file;

pub use interval_csv_file::{parse_rows, IntervalCsvFileSource};

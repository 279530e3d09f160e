use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
    time::SystemTime,
};

use csv::{StringRecord, Trim};
use futures::Stream;
use tariff_core::RawRow;

use crate::pipeline::{Envelope, PipelineError, Source};

/// File source for interval-meter export CSVs.
///
/// The export format carries a fixed-size preamble (`skip_rows` lines of
/// account metadata and a header) followed by positional two-column data
/// rows: timestamp text, kWh text. Rows are handed on as raw text; whether
/// a row is usable is the classifier's decision, so malformed values are
/// not dropped here.
pub struct IntervalCsvFileSource {
    path: PathBuf,
    skip_rows: usize,
}

impl IntervalCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P, skip_rows: usize) -> Self {
        Self {
            path: path.into(),
            skip_rows,
        }
    }
}

fn record_to_raw_row(index: usize, record: &StringRecord) -> RawRow {
    RawRow {
        index,
        timestamp: record.get(0).unwrap_or("").to_string(),
        kwh: record.get(1).unwrap_or("").to_string(),
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.is_empty())
}

/// Extract raw rows from an in-memory CSV body, honoring the same preamble
/// offset as the file source. Shared with the HTTP upload handler.
pub fn parse_rows(text: &str, skip_rows: usize) -> Result<Vec<RawRow>, PipelineError> {
    let mut rest = text;
    for _ in 0..skip_rows {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(rest.as_bytes());

    let mut rows = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record =
            result.map_err(|e| PipelineError::Source(format!("failed to read CSV record: {e}")))?;
        if is_blank(&record) {
            continue;
        }
        rows.push(record_to_raw_row(index, &record));
    }
    Ok(rows)
}

#[async_trait::async_trait]
impl Source<RawRow> for IntervalCsvFileSource {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Envelope<RawRow>, PipelineError>> + Send>> {
        // Blocking CSV reader wrapped in a single async task, which is fine
        // for the batch sizes a meter export produces.
        let path = self.path.clone();
        let skip_rows = self.skip_rows;
        let s = async_stream::try_stream! {
            let file = File::open(&path)
                .map_err(|e| PipelineError::Source(format!("failed to open CSV file: {e}")))?;
            let mut reader = BufReader::new(file);

            let mut preamble = String::new();
            for _ in 0..skip_rows {
                preamble.clear();
                let read = reader
                    .read_line(&mut preamble)
                    .map_err(|e| PipelineError::Source(format!("failed to skip preamble: {e}")))?;
                if read == 0 {
                    break;
                }
            }

            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .trim(Trim::All)
                .from_reader(reader);

            for (index, result) in rdr.records().enumerate() {
                let record = result.map_err(|e| {
                    metrics::counter!("interval_csv_read_errors_total").increment(1);
                    PipelineError::Source(format!("failed to read CSV record: {e}"))
                })?;
                if is_blank(&record) {
                    continue;
                }

                yield Envelope {
                    payload: record_to_raw_row(index, &record),
                    received_at: SystemTime::now(),
                };
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_the_preamble_and_reads_positional_columns() {
        let body = "Meter 22001772\nExported 06/08/2023\nDateTime,Kwh\n\
                    15/07/2023 18:30,10.5\n15/07/2023 19:00,3.25\n";
        let rows = parse_rows(body, 3).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].timestamp, "15/07/2023 18:30");
        assert_eq!(rows[0].kwh, "10.5");
        assert_eq!(rows[1].kwh, "3.25");
    }

    #[test]
    fn offset_past_the_end_yields_no_rows() {
        let rows = parse_rows("only\ntwo lines", 10).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn blank_lines_are_skipped_and_short_rows_pass_through() {
        let body = "15/07/2023 18:30,1.0\n\n15/07/2023 19:00\n";
        let rows = parse_rows(body, 0).unwrap();

        assert_eq!(rows.len(), 2);
        // The short row keeps an empty kWh field; classification rejects it.
        assert_eq!(rows[1].timestamp, "15/07/2023 19:00");
        assert_eq!(rows[1].kwh, "");
    }
}

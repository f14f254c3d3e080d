// Primitives for reading CSV files.

use crate::pairing::{io_common::assemble_row, *};

pub fn read_csv_rows(path: &str, cfs: &FileSource) -> MatchResult<Vec<ParsedRow>> {
    let first_row = cfs.first_data_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut res: Vec<ParsedRow> = Vec::new();
    // The index starts at 1 to respect most conventions in the excel world
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if lineno < first_row {
            debug!("read_csv_rows: skipping header line {}: {:?}", lineno, line);
            continue;
        }
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        let pr = assemble_row(lineno, &cells, cfs)?;
        debug!("read_csv_rows: {:?}", pr);
        res.push(pr);
    }
    Ok(res)
}

// Primitives for reading Excel files.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::pairing::{io_common::assemble_row, *};

pub fn read_excel_rows(path: &str, cfs: &FileSource) -> MatchResult<Vec<ParsedRow>> {
    let wrange = get_range(path, cfs)?;
    let first_row = cfs.first_data_row_index()?;

    let mut res: Vec<ParsedRow> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        // Rows are numbered from 1, like in the spreadsheet.
        let lineno = idx + 1;
        if lineno < first_row {
            debug!("read_excel_rows: skipping header line {}: {:?}", lineno, row);
            continue;
        }
        let mut cells: Vec<String> = Vec::new();
        for cell in row.iter() {
            cells.push(read_cell(lineno, cell)?);
        }
        let pr = assemble_row(lineno, &cells, cfs)?;
        debug!("read_excel_rows: {:?}", pr);
        res.push(pr);
    }
    Ok(res)
}

/// The text of a cell. Numbers written by the forms are read as floats.
fn read_cell(lineno: usize, cell: &DataType) -> MatchResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Empty => Ok("".to_string()),
        // Timestamps and other columns are kept as text, and only looked at when they
        // are part of the layout.
        DataType::DateTime(f) | DataType::Float(f) => Ok(f.to_string()),
        DataType::Bool(b) => Ok(b.to_string()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

fn get_range(path: &str, cfs: &FileSource) -> MatchResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "read_excel_rows: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu { path }.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_rows: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => AmbiguousWorksheetSnafu {
                path,
                names: all_worksheets
                    .iter()
                    .map(|(n, _)| n.clone())
                    .collect::<Vec<String>>(),
            }
            .fail(),
        }
    }
}

//! Read the input table from CSV.

use crate::{error::ForesightResult, row::RawRow};
use std::{io::Read, path::Path};

/// Read every row of a CSV file with a header row.
///
/// Columns are matched by name, extra columns are ignored, and empty cells are missing values.
pub fn read_rows<P: AsRef<Path>>(path: P) -> ForesightResult<Vec<RawRow>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;

    let rows = read_rows_from(file)?;
    log::info!("read {} rows from {}", rows.len(), path.display());

    Ok(rows)
}

/// Read every row of CSV data from any source.
pub fn read_rows_from<R: Read>(src: R) -> ForesightResult<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(src);

    let mut rows = vec![];
    for row in rdr.deserialize() {
        let row: RawRow = row?;
        rows.push(row);
    }

    Ok(rows)
}

//! CSV export. ISO dates and plain `1234.56` decimals so any locale reads it
//! back the same way.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::dataset::{DatasetView, Table};
use crate::error::ExportError;

use super::{parse_header, parse_row};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header row of column names, then one row per record.
pub fn write_csv<W: Write>(view: &DatasetView<'_>, mut writer: W, bom: bool) -> Result<(), ExportError> {
    if bom {
        writer.write_all(UTF8_BOM)?;
    }

    let mut wtr = ::csv::Writer::from_writer(writer);
    wtr.write_record(view.columns().iter().map(|f| f.column()))?;

    for row in view.rows() {
        wtr.write_record(row.iter().map(|value| value.to_cell()))?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(view: &DatasetView<'_>, path: &Path, bom: bool) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(view, BufWriter::new(file), bom)
}

pub fn to_csv_string(view: &DatasetView<'_>, bom: bool) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(view, &mut buffer, bom)?;
    String::from_utf8(buffer).map_err(|e| {
        ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Read a CSV written by [`write_csv`], with or without BOM.
pub fn read_csv<R: Read>(mut reader: R) -> Result<Table, ExportError> {
    let mut content = Vec::new();
    reader.read_to_end(&mut content)?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

    let mut rdr = ::csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content);

    let columns = parse_header(rdr.headers()?.iter().map(str::to_string))?;

    let mut rows = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let cells = record?.iter().map(str::to_string).collect();
        rows.push(parse_row(&columns, index + 1, cells)?);
    }

    Ok(Table { columns, rows })
}

pub fn read_csv_file(path: &Path) -> Result<Table, ExportError> {
    read_csv(File::open(path)?)
}

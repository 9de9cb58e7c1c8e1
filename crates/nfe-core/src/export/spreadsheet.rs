//! SpreadsheetML 2003 workbooks (Excel XML), written and read with quick-xml.
//!
//! Cells are typed: amounts and counts are `Number`, dates are `DateTime`
//! with a date-only number format, everything else is `String`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::dataset::{DatasetView, Table};
use crate::error::ExportError;
use crate::models::invoice::{FieldValue, ParseFailure};

use super::{parse_header, parse_row};

/// Worksheet holding the records.
pub const RECORDS_SHEET: &str = "NF-e";

/// Worksheet listing the documents that failed, present only when some did.
pub const FAILURES_SHEET: &str = "Failures";

const SS_NAMESPACE: &str = "urn:schemas-microsoft-com:office:spreadsheet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    String,
    Number,
    DateTime,
}

impl CellType {
    fn as_str(&self) -> &'static str {
        match self {
            CellType::String => "String",
            CellType::Number => "Number",
            CellType::DateTime => "DateTime",
        }
    }
}

fn typed_cell(value: &FieldValue) -> (CellType, String) {
    match value {
        FieldValue::Amount(_) | FieldValue::Count(_) => (CellType::Number, value.to_cell()),
        FieldValue::Date(d) => (CellType::DateTime, format!("{}T00:00:00.000", d.format("%Y-%m-%d"))),
        _ => (CellType::String, value.to_cell()),
    }
}

struct SheetWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> SheetWriter<W> {
    fn start(&mut self, tag: BytesStart<'_>) -> Result<(), ExportError> {
        self.writer.write_event(Event::Start(tag))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, tag: BytesStart<'_>) -> Result<(), ExportError> {
        self.writer.write_event(Event::Empty(tag))?;
        Ok(())
    }

    fn cell(&mut self, kind: CellType, text: &str, style: Option<&str>) -> Result<(), ExportError> {
        let mut cell = BytesStart::new("Cell");
        if let Some(style) = style {
            cell.push_attribute(("ss:StyleID", style));
        }
        self.start(cell)?;
        self.start(BytesStart::new("Data").with_attributes([("ss:Type", kind.as_str())]))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end("Data")?;
        self.end("Cell")
    }

    fn header_row(&mut self, names: &[&str]) -> Result<(), ExportError> {
        self.start(BytesStart::new("Row"))?;
        for name in names {
            self.cell(CellType::String, name, Some("header"))?;
        }
        self.end("Row")
    }

    fn worksheet<F>(&mut self, name: &str, body: F) -> Result<(), ExportError>
    where
        F: FnOnce(&mut Self) -> Result<(), ExportError>,
    {
        self.start(BytesStart::new("Worksheet").with_attributes([("ss:Name", name)]))?;
        self.start(BytesStart::new("Table"))?;
        body(self)?;
        self.end("Table")?;
        self.end("Worksheet")
    }

    fn styles(&mut self) -> Result<(), ExportError> {
        self.start(BytesStart::new("Styles"))?;

        self.start(BytesStart::new("Style").with_attributes([("ss:ID", "header")]))?;
        self.empty(BytesStart::new("Font").with_attributes([("ss:Bold", "1")]))?;
        self.end("Style")?;

        self.start(BytesStart::new("Style").with_attributes([("ss:ID", "date")]))?;
        self.empty(BytesStart::new("NumberFormat").with_attributes([("ss:Format", "yyyy-mm-dd")]))?;
        self.end("Style")?;

        self.end("Styles")
    }
}

fn write_records<W: Write>(sheet: &mut SheetWriter<W>, view: &DatasetView<'_>) -> Result<(), ExportError> {
    let names: Vec<&str> = view.columns().iter().map(|f| f.column()).collect();
    sheet.header_row(&names)?;

    for row in view.rows() {
        sheet.start(BytesStart::new("Row"))?;
        for value in &row {
            let (kind, text) = typed_cell(value);
            let style = (kind == CellType::DateTime).then_some("date");
            sheet.cell(kind, &text, style)?;
        }
        sheet.end("Row")?;
    }
    Ok(())
}

fn write_failures<W: Write>(sheet: &mut SheetWriter<W>, failures: &[ParseFailure]) -> Result<(), ExportError> {
    sheet.header_row(&["file", "kind", "field", "detail"])?;

    for failure in failures {
        sheet.start(BytesStart::new("Row"))?;
        sheet.cell(CellType::String, &failure.file, None)?;
        sheet.cell(CellType::String, failure.kind.as_str(), None)?;
        sheet.cell(
            CellType::String,
            failure.field.map(|f| f.column()).unwrap_or(""),
            None,
        )?;
        sheet.cell(CellType::String, &failure.detail, None)?;
        sheet.end("Row")?;
    }
    Ok(())
}

/// Write the view as a workbook, plus a failures worksheet when the
/// underlying dataset has failures.
pub fn write_spreadsheet<W: Write>(view: &DatasetView<'_>, writer: W) -> Result<(), ExportError> {
    let mut sheet = SheetWriter {
        writer: Writer::new(writer),
    };

    sheet
        .writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    sheet
        .writer
        .write_event(Event::PI(BytesPI::new(r#"mso-application progid="Excel.Sheet""#)))?;

    sheet.start(
        BytesStart::new("Workbook").with_attributes([("xmlns", SS_NAMESPACE), ("xmlns:ss", SS_NAMESPACE)]),
    )?;
    sheet.styles()?;
    sheet.worksheet(RECORDS_SHEET, |s| write_records(s, view))?;

    let failures = view.dataset().failures();
    if !failures.is_empty() {
        sheet.worksheet(FAILURES_SHEET, |s| write_failures(s, failures))?;
    }

    sheet.end("Workbook")?;
    sheet.writer.into_inner().flush()?;
    Ok(())
}

pub fn write_spreadsheet_file(view: &DatasetView<'_>, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_spreadsheet(view, BufWriter::new(file))
}

fn attribute(tag: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, ExportError> {
    for attr in tag.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn data_type(tag: &BytesStart<'_>) -> Result<String, ExportError> {
    Ok(attribute(tag, b"Type")?.unwrap_or_else(|| CellType::String.as_str().to_string()))
}

/// Raw cells of one worksheet: `(ss:Type, text)` per cell.
fn read_sheet<R: BufRead>(reader: R, sheet: &str) -> Result<Vec<Vec<(String, String)>>, ExportError> {
    let mut reader = Reader::from_reader(reader);
    let mut buf = Vec::new();

    let mut found = false;
    let mut in_sheet = false;
    let mut rows = Vec::new();
    let mut row: Vec<(String, String)> = Vec::new();
    let mut data: Option<(String, String)> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(tag) => match tag.local_name().as_ref() {
                b"Worksheet" => {
                    in_sheet = attribute(&tag, b"Name")?.as_deref() == Some(sheet);
                    found |= in_sheet;
                }
                b"Row" if in_sheet => row.clear(),
                b"Data" if in_sheet => data = Some((data_type(&tag)?, String::new())),
                _ => {}
            },
            Event::Empty(tag) if in_sheet => match tag.local_name().as_ref() {
                b"Cell" => row.push((CellType::String.as_str().to_string(), String::new())),
                b"Data" => row.push((data_type(&tag)?, String::new())),
                b"Row" => rows.push(Vec::new()),
                _ => {}
            },
            Event::Text(text) => {
                if let Some((_, content)) = data.as_mut() {
                    content.push_str(&text.unescape().map_err(quick_xml::Error::from)?);
                }
            }
            Event::End(tag) => match tag.local_name().as_ref() {
                b"Data" => row.extend(data.take()),
                b"Row" if in_sheet => rows.push(std::mem::take(&mut row)),
                b"Worksheet" if in_sheet => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !found {
        return Err(ExportError::MissingWorksheet(sheet.to_string()));
    }
    Ok(rows)
}

/// Read the records worksheet back into a table.
pub fn read_spreadsheet<R: BufRead>(reader: R) -> Result<Table, ExportError> {
    let mut rows = read_sheet(reader, RECORDS_SHEET)?.into_iter();

    let Some(header) = rows.next() else {
        return Ok(Table {
            columns: Vec::new(),
            rows: Vec::new(),
        });
    };
    let columns = parse_header(header.into_iter().map(|(_, text)| text))?;

    let rows = rows
        .enumerate()
        .map(|(index, cells)| {
            let cells = cells
                .into_iter()
                .map(|(kind, text)| match kind.as_str() {
                    // Dates are written as midnight date-times
                    "DateTime" => text.split('T').next().unwrap_or_default().to_string(),
                    _ => text,
                })
                .collect();
            parse_row(&columns, index + 1, cells)
        })
        .collect::<Result<_, _>>()?;

    Ok(Table { columns, rows })
}

pub fn read_spreadsheet_file(path: &Path) -> Result<Table, ExportError> {
    read_spreadsheet(BufReader::new(File::open(path)?))
}

/// Rows of the failures worksheet, empty when the workbook has none.
pub fn read_failures<R: BufRead>(reader: R) -> Result<Vec<Vec<String>>, ExportError> {
    match read_sheet(reader, FAILURES_SHEET) {
        Ok(rows) => Ok(rows
            .into_iter()
            .skip(1)
            .map(|cells| cells.into_iter().map(|(_, text)| text).collect())
            .collect()),
        Err(ExportError::MissingWorksheet(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::parse;
    use crate::invoice::testdata::NfeBuilder;
    use crate::models::config::ExtractionConfig;
    use crate::models::dataset::Dataset;
    use crate::models::invoice::Field;
    use pretty_assertions::assert_eq;

    fn dataset(failures: Vec<ParseFailure>) -> Dataset {
        let records = [
            NfeBuilder::new().build(),
            NfeBuilder::new()
                .set(Field::InvoiceNumber, "2")
                .set(Field::IssuerName, "M&amp;M &lt;Alimentos&gt;")
                .set(Field::GrandTotal, "1234.56")
                .set(Field::IssueDate, "2023-12-31T23:59:59-03:00")
                .without(Field::IssuerTradeName)
                .build(),
        ]
        .iter()
        .map(|xml| parse(xml.as_bytes(), "n.xml", &ExtractionConfig::default()).unwrap())
        .collect();
        Dataset::new(records, failures)
    }

    fn to_bytes(view: &DatasetView<'_>) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_spreadsheet(view, &mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_typed_cells() {
        let dataset = dataset(Vec::new());
        let view = DatasetView::new(&dataset).select(&[Field::IssueDate, Field::GrandTotal, Field::IssuerName]);
        let xml = String::from_utf8(to_bytes(&view)).unwrap();

        assert!(xml.contains(r#"<Worksheet ss:Name="NF-e">"#));
        assert!(xml.contains(r#"<Data ss:Type="DateTime">2023-12-31T00:00:00.000</Data>"#));
        assert!(xml.contains(r#"<Data ss:Type="Number">1234.56</Data>"#));
        assert!(xml.contains("M&amp;M &lt;Alimentos&gt;"));
        assert!(!xml.contains(FAILURES_SHEET));
    }

    #[test]
    fn test_round_trip_all_columns() {
        let dataset = dataset(Vec::new());
        let view = DatasetView::new(&dataset).select(&Field::ALL);

        let table = read_spreadsheet(to_bytes(&view).as_slice()).unwrap();
        assert_eq!(table, view.table());
        assert_eq!(
            table.rows[1][2],
            FieldValue::Date(chrono::NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
        );
    }

    #[test]
    fn test_failures_sheet() {
        let failures = vec![ParseFailure::missing_field(
            "4.xml",
            Field::GrandTotal,
            "missing mandatory field 'grand total'",
        )];
        let dataset = dataset(failures);
        let bytes = to_bytes(&DatasetView::new(&dataset));

        assert_eq!(
            read_failures(bytes.as_slice()).unwrap(),
            vec![vec![
                "4.xml".to_string(),
                "missing-mandatory-field".to_string(),
                "grand_total".to_string(),
                "missing mandatory field 'grand total'".to_string(),
            ]]
        );
        assert_eq!(read_spreadsheet(bytes.as_slice()).unwrap().rows.len(), 2);
    }

    #[test]
    fn test_missing_worksheet() {
        let xml = br#"<Workbook><Worksheet ss:Name="Other"><Table/></Worksheet></Workbook>"#;
        assert!(matches!(
            read_spreadsheet(&xml[..]),
            Err(ExportError::MissingWorksheet(_))
        ));
    }
}

//! CSV export of value grids

use std::io::Write;

use sheetwire_protocol::CellValue;

/// Options for writing CSV
#[derive(Debug, Clone)]
pub struct CsvExportOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Line terminator
    pub line_terminator: LineTerminator,
    /// Pad short rows with empty fields so every record has the same width
    pub pad_rows: bool,
}

impl Default for CsvExportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            line_terminator: LineTerminator::LF,
            pad_rows: true,
        }
    }
}

/// Line terminator type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    LF,
    CRLF,
}

/// Write `rows` as CSV and return the number of records written.
///
/// The service trims trailing empty cells from each row, so rows are padded
/// to the widest one unless `pad_rows` is off.
pub fn write_values_csv<W: Write>(
    writer: W,
    rows: &[Vec<CellValue>],
    options: &CsvExportOptions,
) -> csv::Result<usize> {
    let terminator = match options.line_terminator {
        LineTerminator::LF => csv::Terminator::Any(b'\n'),
        LineTerminator::CRLF => csv::Terminator::CRLF,
    };

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .terminator(terminator)
        .flexible(!options.pad_rows)
        .from_writer(writer);

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);

    for row in rows {
        let mut record: Vec<String> = row.iter().map(CellValue::to_string).collect();
        if options.pad_rows {
            record.resize(width, String::new());
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(rows.len())
}

//! Semicolon-delimited tables with a header row.
//!
//! Files are written with a UTF-8 byte-order mark so spreadsheet programs pick
//! the right encoding; the mark is stripped again on read. Rows are ordered
//! maps so column order survives a read/modify/write cycle.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;

pub const DELIMITER: u8 = b';';
const BOM: &str = "\u{feff}";

/// One table row: field name to value, in column order.
pub type Row = IndexMap<String, String>;

/// Trimmed value of `field`, or `""` when the row has no such column.
pub fn cell<'a>(row: &'a Row, field: &str) -> &'a str {
    row.get(field).map_or("", |v| v.trim())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub fields: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(fields: Vec<String>, rows: Vec<Row>) -> Self {
        Self { fields, rows }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read a table from disk. A missing file reads as an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("table {} does not exist", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("opening {}", path.display())),
        };
        Self::from_reader(file).with_context(|| format!("reading table {}", path.display()))
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("table is not valid UTF-8")?;
        let text = text.strip_prefix(BOM).unwrap_or(&text);

        let mut csv = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = csv.headers().context("parsing header row")?.clone();
        let mut fields: Vec<String> = Vec::with_capacity(headers.len());
        for name in &headers {
            if fields.iter().any(|f| f == name) {
                tracing::warn!("duplicate column {name:?}; the last one wins");
            } else {
                fields.push(name.to_owned());
            }
        }

        let mut rows = Vec::new();
        for record in csv.records() {
            let record = record.context("parsing table row")?;
            let mut row = Row::with_capacity(fields.len());
            for (i, name) in headers.iter().enumerate() {
                row.insert(name.to_owned(), record.get(i).unwrap_or_default().to_owned());
            }
            rows.push(row);
        }

        Ok(Self { fields, rows })
    }

    /// Write the table to `path` (with BOM), replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = TableWriter::new(file, &self.fields, true)
            .with_context(|| format!("writing {}", path.display()))?;
        for row in &self.rows {
            writer.write_row(row)?;
        }
        writer
            .finish()
            .with_context(|| format!("flushing {}", path.display()))
    }
}

/// Streaming writer: header first, then one record at a time.
pub struct TableWriter<W: Write> {
    csv: csv::Writer<W>,
    fields: Vec<String>,
}

impl<W: Write> TableWriter<W> {
    pub fn new<S: AsRef<str>>(mut inner: W, fields: &[S], bom: bool) -> Result<Self> {
        if bom {
            inner
                .write_all(BOM.as_bytes())
                .context("writing byte-order mark")?;
        }
        let mut csv = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .terminator(csv::Terminator::CRLF)
            .from_writer(inner);
        let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_owned()).collect();
        csv.write_record(&fields).context("writing header row")?;
        Ok(Self { csv, fields })
    }

    /// Write a record whose values are already in column order.
    pub fn write_values<S: AsRef<[u8]>>(&mut self, values: &[S]) -> Result<()> {
        self.csv.write_record(values).context("writing table row")
    }

    /// Write a row by field name; absent fields become empty cells.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        let values: Vec<&str> = self
            .fields
            .iter()
            .map(|f| row.get(f).map_or("", String::as_str))
            .collect();
        self.write_values(values.as_slice())
    }

    pub fn finish(mut self) -> Result<()> {
        self.csv.flush().context("flushing table")?;
        Ok(())
    }
}

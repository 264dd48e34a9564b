//! Append-only destinations for normalized rows.
//!
//! File sinks stream each row to disk as it arrives, so memory use does not
//! grow with the size of the harvest.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::normalize::NormalizedRecord;
use crate::persist::{ensure_output_dir, split_output_path, PersistError};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("delimited write error: {0}")]
    Delimited(#[from] csv::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

pub trait DatasetSink: Send {
    fn append(&mut self, record: NormalizedRecord) -> Result<(), SinkError>;

    /// Flushes buffered rows. Called once when the harvest finishes.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Rows accepted so far.
    fn written(&self) -> u64;
}

/// Keeps every row in memory. Intended for tests and small runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<NormalizedRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }
}

impl DatasetSink for MemorySink {
    fn append(&mut self, record: NormalizedRecord) -> Result<(), SinkError> {
        self.records.push(record);
        Ok(())
    }

    fn written(&self) -> u64 {
        self.records.len() as u64
    }
}

fn create_output(path: &Path) -> Result<BufWriter<File>, SinkError> {
    let (dir, _) = split_output_path(path)?;
    ensure_output_dir(&dir)?;
    Ok(BufWriter::new(File::create(path)?))
}

/// One JSON object per line; nulls are kept so every line has all columns.
pub struct JsonLinesSink<W: Write + Send = BufWriter<File>> {
    out: W,
    written: u64,
}

impl JsonLinesSink {
    /// Creates (or truncates) the file at `path`, creating parent directories.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        Ok(Self::new(create_output(path)?))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> DatasetSink for JsonLinesSink<W> {
    fn append(&mut self, record: NormalizedRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.out, &record)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }

    fn written(&self) -> u64 {
        self.written
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    fn as_byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }
}

/// Spreadsheet-friendly delimited text with a header row. Null cells are
/// empty; cells are quoted only when needed.
pub struct DelimitedSink<W: Write + Send = BufWriter<File>> {
    out: csv::Writer<W>,
    header_written: bool,
    written: u64,
}

impl DelimitedSink {
    pub fn create(path: &Path, delimiter: Delimiter) -> Result<Self, SinkError> {
        Ok(Self::new(create_output(path)?, delimiter))
    }
}

impl<W: Write + Send> DelimitedSink<W> {
    pub fn new(out: W, delimiter: Delimiter) -> Self {
        let out = csv::WriterBuilder::new()
            .delimiter(delimiter.as_byte())
            .terminator(csv::Terminator::Any(b'\n'))
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(out);
        Self {
            out,
            header_written: false,
            written: 0,
        }
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.out
            .into_inner()
            .map_err(|err| SinkError::Io(err.into_error()))
    }

    fn ensure_header(&mut self) -> Result<(), SinkError> {
        if !self.header_written {
            self.out.write_record(NormalizedRecord::COLUMNS)?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl<W: Write + Send> DatasetSink for DelimitedSink<W> {
    fn append(&mut self, record: NormalizedRecord) -> Result<(), SinkError> {
        self.ensure_header()?;
        let cells = record.to_row().into_iter().map(Option::unwrap_or_default);
        self.out.write_record(cells)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        // An empty harvest still yields a file with the header.
        self.ensure_header()?;
        self.out.flush()?;
        Ok(())
    }

    fn written(&self) -> u64 {
        self.written
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    JsonLines,
    Tsv,
    Csv,
}

impl SinkFormat {
    /// Guesses from the file extension, defaulting to JSON Lines.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("tsv") => SinkFormat::Tsv,
            Some("csv") => SinkFormat::Csv,
            _ => SinkFormat::JsonLines,
        }
    }
}

/// Opens a streaming file sink of the given format at `path`.
pub fn open_sink(path: &Path, format: SinkFormat) -> Result<Box<dyn DatasetSink>, SinkError> {
    let sink: Box<dyn DatasetSink> = match format {
        SinkFormat::JsonLines => Box::new(JsonLinesSink::create(path)?),
        SinkFormat::Tsv => Box::new(DelimitedSink::create(path, Delimiter::Tab)?),
        SinkFormat::Csv => Box::new(DelimitedSink::create(path, Delimiter::Comma)?),
    };
    Ok(sink)
}

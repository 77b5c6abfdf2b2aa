//! Review writers
//!
//! Items are written as they arrive, so a run's output never has to be held
//! in memory. The JSON array writer emits the opening bracket with the first
//! item and the closing one on `finish`.

use crate::config::OutputFormat;
use crate::model::ReviewItem;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize review: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Sink for emitted reviews
pub trait ReviewWriter {
    /// Writes one item
    fn write_item(&mut self, item: &ReviewItem) -> OutputResult<()>;

    /// Completes the document and flushes
    ///
    /// # Returns
    ///
    /// The number of items written
    fn finish(&mut self) -> OutputResult<usize>;
}

/// Writes a single pretty-printed JSON array
pub struct JsonArrayWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReviewWriter for JsonArrayWriter<W> {
    fn write_item(&mut self, item: &ReviewItem) -> OutputResult<()> {
        self.out
            .write_all(if self.written == 0 { b"[\n" } else { b",\n" })?;
        serde_json::to_writer_pretty(&mut self.out, item)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<usize> {
        if self.written == 0 {
            self.out.write_all(b"[]\n")?;
        } else {
            self.out.write_all(b"\n]\n")?;
        }
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Writes one compact JSON object per line
pub struct JsonLinesWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReviewWriter for JsonLinesWriter<W> {
    fn write_item(&mut self, item: &ReviewItem) -> OutputResult<()> {
        serde_json::to_writer(&mut self.out, item)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<usize> {
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Creates the output file, and its parent directories, and returns a writer
/// for `format`
pub fn create_writer(path: &Path, format: OutputFormat) -> OutputResult<Box<dyn ReviewWriter>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(path)?);

    tracing::debug!("Writing {:?} output to {}", format, path.display());
    Ok(match format {
        OutputFormat::Json => Box::new(JsonArrayWriter::new(file)),
        OutputFormat::Jsonl => Box::new(JsonLinesWriter::new(file)),
    })
}

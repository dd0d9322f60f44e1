//! Delimited Text Waveform Loader

use crate::error::SourceError;
use crate::signal::Signal;
use crate::WaveformSource;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;
use tracing::{debug, info};

/// How samples are laid out in the file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One sample per row, taken from the given column
    Column(usize),
    /// A whole row is the waveform; optionally drop a trailing class-label column
    Row { index: usize, drop_last: bool },
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Column(0)
    }
}

/// Waveform stored as delimited text (tab-separated by default)
#[derive(Debug, Clone)]
pub struct DelimitedSource {
    path: PathBuf,
    sample_rate: f64,
    delimiter: u8,
    has_headers: bool,
    layout: Layout,
}

impl DelimitedSource {
    /// Tab-delimited file without a header, one sample per row in column 0
    pub fn new(path: impl Into<PathBuf>, sample_rate: f64) -> Self {
        Self {
            path: path.into(),
            sample_rate,
            delimiter: b'\t',
            has_headers: false,
            layout: Layout::default(),
        }
    }

    /// Use a different field delimiter
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Skip the first line as a header
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Select the sample layout
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    fn open(&self) -> Result<csv::Reader<File>, SourceError> {
        let file = File::open(&self.path).map_err(|source| SourceError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file))
    }

    fn read_samples(&self) -> Result<Vec<f64>, SourceError> {
        let mut reader = self.open()?;
        let mut samples = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            if is_blank(&record) {
                continue;
            }

            match self.layout {
                Layout::Column(column) => {
                    let cell = record.get(column).ok_or_else(|| {
                        SourceError::MissingField(format!("column {column} in row {row}"))
                    })?;
                    samples.push(parse_cell(cell, row, column)?);
                }
                Layout::Row { index, drop_last } => {
                    if row != index {
                        continue;
                    }
                    let width = if drop_last {
                        record.len().saturating_sub(1)
                    } else {
                        record.len()
                    };
                    for (column, cell) in record.iter().take(width).enumerate() {
                        samples.push(parse_cell(cell, row, column)?);
                    }
                    return Ok(samples);
                }
            }
        }

        if let Layout::Row { index, .. } = self.layout {
            return Err(SourceError::MissingField(format!("row {index}")));
        }

        Ok(samples)
    }
}

impl WaveformSource for DelimitedSource {
    fn load(&self) -> Result<Signal, SourceError> {
        let samples = self.read_samples()?;
        debug!("Read {} samples from {}", samples.len(), self.path.display());

        let label = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let signal = Signal::new(samples, self.sample_rate)?.with_label(label);

        info!(
            "Loaded waveform {} ({} samples, {} Hz)",
            self.path.display(),
            signal.len(),
            signal.sample_rate()
        );
        Ok(signal)
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.is_empty())
}

fn parse_cell(cell: &str, row: usize, column: usize) -> Result<f64, SourceError> {
    cell.parse::<f64>().map_err(|_| SourceError::Parse {
        row,
        column,
        text: cell.to_string(),
    })
}

//! Output formatting module.
//!
//! Renders samples as plain text, JSON lines or CSV records, one sample at
//! a time so poll output appears as it is produced.

mod csv_format;
mod json_format;
mod plain;

pub use plain::print_error;

use crate::cli::OutputFormat;
use crate::types::Sample;
use std::io::{self, Write};

enum Sink<W: Write> {
    Plain(W),
    Json(W),
    Csv(csv::Writer<W>),
}

/// Streams samples to a writer in one output format.
pub struct SampleWriter<W: Write> {
    sink: Sink<W>,
    timestamps: bool,
}

impl<W: Write> SampleWriter<W> {
    /// Create a writer. `timestamps` prefixes plain lines with the sample
    /// time; structured formats always carry it.
    pub fn new(out: W, format: OutputFormat, timestamps: bool) -> Self {
        let sink = match format {
            OutputFormat::Plain => Sink::Plain(out),
            OutputFormat::Json => Sink::Json(out),
            OutputFormat::Csv => Sink::Csv(csv::Writer::from_writer(out)),
        };
        Self { sink, timestamps }
    }

    /// Write and flush one sample.
    pub fn write(&mut self, sample: &Sample) -> io::Result<()> {
        match &mut self.sink {
            Sink::Plain(out) => plain::write_plain(out, sample, self.timestamps),
            Sink::Json(out) => json_format::write_json(out, sample),
            Sink::Csv(wtr) => csv_format::write_csv(wtr, sample),
        }
    }

    /// Flush and return the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        match self.sink {
            Sink::Plain(mut out) | Sink::Json(mut out) => {
                out.flush()?;
                Ok(out)
            }
            Sink::Csv(wtr) => wtr.into_inner().map_err(|e| e.into_error()),
        }
    }
}

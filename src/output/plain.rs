//! Plain text output formatting.
//!
//! Sample lines go to the given writer unstyled; errors go to stderr
//! with colors.

use crate::types::Sample;
use chrono::SecondsFormat;
use console::style;
use std::io::{self, Write};

/// Write the decoded value, optionally prefixed with `[timestamp]`.
pub fn write_plain<W: Write>(out: &mut W, sample: &Sample, timestamps: bool) -> io::Result<()> {
    if timestamps {
        writeln!(
            out,
            "[{}] {}",
            sample.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            sample.value
        )?;
    } else {
        writeln!(out, "{}", sample.value)?;
    }
    out.flush()
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

//! JSON lines output formatting.

use crate::types::Sample;
use std::io::{self, Write};

/// Write one sample as a single-line JSON object.
pub fn write_json<W: Write>(out: &mut W, sample: &Sample) -> io::Result<()> {
    serde_json::to_writer(&mut *out, sample)?;
    writeln!(out)?;
    out.flush()
}

//! CSV output formatting.

use crate::types::Sample;
use std::io::{self, Write};

/// Append one sample as a CSV record.
///
/// The header row comes from the `Sample` field names and is emitted by
/// the writer before the first record only.
pub fn write_csv<W: Write>(wtr: &mut csv::Writer<W>, sample: &Sample) -> io::Result<()> {
    wtr.serialize(sample)?;
    wtr.flush()?;
    Ok(())
}

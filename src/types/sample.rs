//! One decoded observation of an area.

use crate::types::{AreaDescriptor, AreaKind, FormatSpec};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A decoded read, stamped with the time it completed.
///
/// The fields are flat so the same record serializes to a JSON object and
/// to a CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Completion time of the read.
    pub timestamp: DateTime<Utc>,
    /// 1-based position within a poll run; always 1 for a single read.
    pub sequence: u64,
    pub area: AreaKind,
    pub block: u16,
    pub start: u32,
    pub size: u16,
    pub format: FormatSpec,
    /// Codec output.
    pub value: String,
}

impl Sample {
    /// Create a sample stamped with the current time.
    pub fn new(sequence: u64, area: &AreaDescriptor, format: FormatSpec, value: String) -> Self {
        Self::at(Utc::now(), sequence, area, format, value)
    }

    /// Create a sample with an explicit timestamp.
    pub fn at(
        timestamp: DateTime<Utc>,
        sequence: u64,
        area: &AreaDescriptor,
        format: FormatSpec,
        value: String,
    ) -> Self {
        Self {
            timestamp,
            sequence,
            area: area.kind(),
            block: area.block_number(),
            start: area.start_offset(),
            size: area.length(),
            format,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sample_from_descriptor() {
        let area = AreaDescriptor::new("MK", 5, 10, 2).unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let sample = Sample::at(ts, 3, &area, FormatSpec::Int16, "7".to_string());

        assert_eq!(sample.area, AreaKind::Marker);
        assert_eq!(sample.block, 0);
        assert_eq!(sample.start, 10);
        assert_eq!(sample.size, 2);
        assert_eq!(sample.sequence, 3);
    }

    #[test]
    fn test_sample_json_shape() {
        let area = AreaDescriptor::new("DB", 1, 0, 4).unwrap();
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let sample = Sample::at(ts, 1, &area, FormatSpec::Hex, "01 02 03 04".to_string());

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["area"], "DB");
        assert_eq!(json["block"], 1);
        assert_eq!(json["format"], "hex");
        assert_eq!(json["value"], "01 02 03 04");
        assert_eq!(json["timestamp"], "2024-03-01T12:00:00Z");
    }
}

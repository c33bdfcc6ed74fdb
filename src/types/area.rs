//! Memory area kinds and descriptors.
//!
//! `AreaKind` is the canonical set of S7 areas reachable through read/write
//! var jobs. `AreaDescriptor` pins one contiguous byte range inside an area
//! and is validated once at construction.

use crate::error::{AreaError, AreaResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest S7 address is 24 bits wide and counts bits, not bytes.
const MAX_BIT_ADDRESS: u64 = 0x00FF_FFFF;

/// Area names that exist on the controller but have no read/write path here.
const TIMER_COUNTER_ALIASES: [&str; 4] = ["TM", "CT", "TIMER", "COUNTER"];

/// A class of addressable PLC memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaKind {
    /// Data block (DB), addressed by block number.
    #[serde(rename = "DB")]
    DataBlock,
    /// Process image of inputs (PE / I).
    #[serde(rename = "PE")]
    Input,
    /// Process image of outputs (PA / Q).
    #[serde(rename = "PA")]
    Output,
    /// Marker / flag memory (MK / M).
    #[serde(rename = "MK")]
    Marker,
}

impl AreaKind {
    /// Resolve an area name, case-insensitively.
    ///
    /// Accepted aliases:
    /// - `DB`
    /// - `PE`, `I`, `INPUT`
    /// - `PA`, `Q`, `OUTPUT`
    /// - `MK`, `M`, `MERKER`
    ///
    /// `TM` and `CT` are known area names but are rejected with
    /// [`AreaError::UnsupportedArea`] like any unknown name.
    pub fn resolve(name: &str) -> AreaResult<Self> {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "DB" => Ok(Self::DataBlock),
            "PE" | "I" | "INPUT" => Ok(Self::Input),
            "PA" | "Q" | "OUTPUT" => Ok(Self::Output),
            "MK" | "M" | "MERKER" => Ok(Self::Marker),
            other if TIMER_COUNTER_ALIASES.contains(&other) => Err(AreaError::UnsupportedArea {
                name: name.to_string(),
                reason: "timer and counter areas are not available for read/write",
            }),
            _ => Err(AreaError::UnsupportedArea {
                name: name.to_string(),
                reason: "expected DB, PE, PA or MK",
            }),
        }
    }

    /// The S7 area code used in read/write var item specifications.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Self::Input => 0x81,
            Self::Output => 0x82,
            Self::Marker => 0x83,
            Self::DataBlock => 0x84,
        }
    }

    /// Short conventional name (DB, PE, PA, MK).
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::DataBlock => "DB",
            Self::Input => "PE",
            Self::Output => "PA",
            Self::Marker => "MK",
        }
    }

    /// Whether the block number is part of the address.
    #[inline]
    pub const fn uses_block_number(self) -> bool {
        matches!(self, Self::DataBlock)
    }
}

impl fmt::Display for AreaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for AreaKind {
    type Err = AreaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

/// A validated byte range inside one PLC memory area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaDescriptor {
    kind: AreaKind,
    block_number: u16,
    start_offset: u32,
    length: u16,
}

impl AreaDescriptor {
    /// Build a descriptor from an area name and raw numbers.
    pub fn new(area: &str, block_number: u16, start_offset: u32, length: u16) -> AreaResult<Self> {
        let kind = AreaKind::resolve(area)?;
        Self::from_kind(kind, block_number, start_offset, length)
    }

    /// Build a descriptor from an already resolved kind.
    pub fn from_kind(
        kind: AreaKind,
        block_number: u16,
        start_offset: u32,
        length: u16,
    ) -> AreaResult<Self> {
        if length == 0 {
            return Err(AreaError::InvalidDescriptor(
                "size must be at least 1 byte".to_string(),
            ));
        }

        let end_bits = (u64::from(start_offset) + u64::from(length)) * 8;
        if end_bits > MAX_BIT_ADDRESS + 1 {
            return Err(AreaError::InvalidDescriptor(format!(
                "range {}..{} exceeds the 24-bit S7 address space",
                start_offset,
                u64::from(start_offset) + u64::from(length)
            )));
        }

        Ok(Self {
            kind,
            block_number,
            start_offset,
            length,
        })
    }

    /// The area kind.
    #[inline]
    pub const fn kind(&self) -> AreaKind {
        self.kind
    }

    /// Block number as sent on the wire: zero for anything but data blocks.
    #[inline]
    pub const fn block_number(&self) -> u16 {
        if self.kind.uses_block_number() {
            self.block_number
        } else {
            0
        }
    }

    /// First byte of the range.
    #[inline]
    pub const fn start_offset(&self) -> u32 {
        self.start_offset
    }

    /// Number of bytes in the range.
    #[inline]
    pub const fn length(&self) -> u16 {
        self.length
    }
}

impl fmt::Display for AreaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.uses_block_number() {
            write!(f, "DB{}.DBB{}", self.block_number, self.start_offset)
        } else {
            write!(f, "{}{}", self.kind, self.start_offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_insensitive() {
        assert_eq!(AreaKind::resolve("db").unwrap(), AreaKind::DataBlock);
        assert_eq!(AreaKind::resolve("DB").unwrap(), AreaKind::DataBlock);
        assert_eq!(AreaKind::resolve(" Db ").unwrap(), AreaKind::DataBlock);
    }

    #[test]
    fn test_resolve_aliases() {
        for name in ["PE", "i", "Input"] {
            assert_eq!(AreaKind::resolve(name).unwrap(), AreaKind::Input);
        }
        for name in ["pa", "Q", "OUTPUT"] {
            assert_eq!(AreaKind::resolve(name).unwrap(), AreaKind::Output);
        }
        for name in ["MK", "m", "merker"] {
            assert_eq!(AreaKind::resolve(name).unwrap(), AreaKind::Marker);
        }
    }

    #[test]
    fn test_timer_counter_unsupported() {
        for name in ["tm", "TM", "ct", "Counter"] {
            let err = AreaKind::resolve(name).unwrap_err();
            assert!(matches!(err, AreaError::UnsupportedArea { .. }), "{name}");
            assert!(err.to_string().contains("timer and counter"));
        }
    }

    #[test]
    fn test_unknown_area() {
        let err = AreaKind::resolve("XYZ").unwrap_err();
        assert!(matches!(err, AreaError::UnsupportedArea { ref name, .. } if name == "XYZ"));
    }

    #[test]
    fn test_area_codes() {
        assert_eq!(AreaKind::Input.code(), 0x81);
        assert_eq!(AreaKind::Output.code(), 0x82);
        assert_eq!(AreaKind::Marker.code(), 0x83);
        assert_eq!(AreaKind::DataBlock.code(), 0x84);
    }

    #[test]
    fn test_descriptor_rejects_zero_length() {
        assert!(matches!(
            AreaDescriptor::new("DB", 1, 0, 0),
            Err(AreaError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_descriptor_address_space() {
        // Last addressable byte is 0x1FFFFF.
        assert!(AreaDescriptor::new("MK", 0, 0x1F_FFFF, 1).is_ok());
        assert!(AreaDescriptor::new("MK", 0, 0x1F_FFFF, 2).is_err());
    }

    #[test]
    fn test_block_number_ignored_outside_db() {
        let db = AreaDescriptor::new("DB", 7, 0, 4).unwrap();
        assert_eq!(db.block_number(), 7);

        let mk = AreaDescriptor::new("MK", 7, 0, 4).unwrap();
        assert_eq!(mk.block_number(), 0);
    }

    #[test]
    fn test_descriptor_display() {
        let db = AreaDescriptor::new("db", 1, 10, 4).unwrap();
        assert_eq!(db.to_string(), "DB1.DBB10");

        let q = AreaDescriptor::new("q", 0, 2, 1).unwrap();
        assert_eq!(q.to_string(), "PA2");
    }
}

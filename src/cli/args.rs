//! Argument groups shared by the read, write and poll commands.
//!
//! Connection flags are optional so that unset ones fall back to the
//! settings file.

use crate::config::AppSettings;
use crate::error::{AreaResult, CodecResult};
use crate::transport::ConnectionOptions;
use crate::types::{AreaDescriptor, FormatSpec};
use clap::Args;
use std::time::Duration;

/// How to reach the controller.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// PLC address (IP or host, optionally host:port) [default: 127.0.0.1]
    #[arg(long = "addr", value_name = "HOST")]
    pub address: Option<String>,

    /// Rack number [default: 0]
    #[arg(long)]
    pub rack: Option<u16>,

    /// Slot number [default: 1]
    #[arg(long)]
    pub slot: Option<u16>,

    /// Connection type, 0 for the default (1 = PG, 2 = OP, 3 = S7 basic)
    #[arg(long = "ctype", value_name = "TYPE")]
    pub connection_type: Option<u16>,

    /// TCP port [default: 102]
    #[arg(long)]
    pub port: Option<u16>,

    /// Local TSAP in hex; connects by TSAP instead of rack/slot
    #[arg(long, value_name = "HEX", value_parser = parse_tsap, requires = "remote_tsap")]
    pub local_tsap: Option<u16>,

    /// Remote TSAP in hex
    #[arg(long, value_name = "HEX", value_parser = parse_tsap, requires = "local_tsap")]
    pub remote_tsap: Option<u16>,

    /// Connect timeout in milliseconds [default: 3000]
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,
}

impl ConnectionArgs {
    /// Merge the flags over the settings file.
    pub fn options(&self, settings: &AppSettings) -> ConnectionOptions {
        let mut timeouts = settings.timeouts();
        if let Some(ms) = self.timeout {
            timeouts.connect = Duration::from_millis(ms);
        }

        let options = ConnectionOptions::new(
            self.address
                .clone()
                .unwrap_or_else(|| settings.address.clone()),
        )
        .with_rack_slot(
            self.rack.unwrap_or(settings.rack),
            self.slot.unwrap_or(settings.slot),
        )
        .with_connection_type(self.connection_type.unwrap_or(settings.connection_type))
        .with_port(self.port.unwrap_or(settings.port))
        .with_timeouts(timeouts);

        match (self.local_tsap, self.remote_tsap) {
            (Some(local), Some(remote)) => options.with_tsap(local, remote),
            _ => options,
        }
    }
}

/// Which bytes to touch and how to render them.
#[derive(Args, Debug, Clone)]
pub struct AreaArgs {
    /// Memory area: DB, PE, PA or MK
    #[arg(long, default_value = "DB")]
    pub area: String,

    /// DB number (used when area=DB)
    #[arg(long = "db", default_value_t = 1)]
    pub block: u16,

    /// Start offset in bytes
    #[arg(long, default_value_t = 0)]
    pub start: u32,

    /// Byte count
    #[arg(long, default_value_t = 4)]
    pub size: u16,

    /// Value format: hex, string, int16, int32, float32 [default: hex]
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}

impl AreaArgs {
    /// Resolve the area name and validate the range.
    pub fn descriptor(&self) -> AreaResult<AreaDescriptor> {
        AreaDescriptor::new(&self.area, self.block, self.start, self.size)
    }

    /// The requested format, or the configured one.
    pub fn format(&self, settings: &AppSettings) -> CodecResult<FormatSpec> {
        match &self.format {
            Some(name) => name.parse(),
            None => Ok(settings.format),
        }
    }
}

/// Parse a TSAP given in hex, with or without `0x`.
pub fn parse_tsap(s: &str) -> Result<u16, String> {
    let digits = s
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid TSAP {:?}: {}", s, e))
}

/// Parse a duration such as `500ms`, `2s`, `1.5s` or `1m30s`.
///
/// Units: `h`, `m`, `s`, `ms`, `us` (or `µs`) and `ns`. A bare `0` is
/// accepted; any other number needs a unit.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let input = s.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration {:?}", s));
        }
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid duration {:?}", s))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        let nanos_per_unit = match unit {
            "h" => 3.6e12,
            "m" => 6e10,
            "s" => 1e9,
            "ms" => 1e6,
            "us" | "µs" => 1e3,
            "ns" => 1.0,
            "" => return Err(format!("missing unit in duration {:?}", s)),
            other => return Err(format!("unknown unit {:?} in duration {:?}", other, s)),
        };

        let nanos = (value * nanos_per_unit).round();
        if !nanos.is_finite() || nanos > u64::MAX as f64 {
            return Err(format!("duration {:?} out of range", s));
        }
        total = total
            .checked_add(Duration::from_nanos(nanos as u64))
            .ok_or_else(|| format!("duration {:?} out of range", s))?;
        rest = next;
    }

    Ok(total)
}

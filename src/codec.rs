//! Conversion between raw PLC byte buffers and text.
//!
//! Every multi-byte value is big-endian, the S7 wire order. Numeric formats
//! never truncate: a payload whose length is not a multiple of the element
//! width is rejected with [`CodecError::Alignment`].

use crate::error::{CodecError, CodecResult};
use crate::types::FormatSpec;

/// Render a payload as text in the given format.
pub fn decode(data: &[u8], format: FormatSpec) -> CodecResult<String> {
    match format {
        FormatSpec::Hex => Ok(bytes_to_hex(data)),
        FormatSpec::String => Ok(String::from_utf8_lossy(data).into_owned()),
        FormatSpec::Int16 => {
            check_alignment(data, format)?;
            let values = data
                .chunks_exact(2)
                .map(|c| i64::from(i16::from_be_bytes([c[0], c[1]])));
            Ok(join_values(values))
        }
        FormatSpec::Int32 => {
            check_alignment(data, format)?;
            let values = data
                .chunks_exact(4)
                .map(|c| i64::from(i32::from_be_bytes([c[0], c[1], c[2], c[3]])));
            Ok(join_values(values))
        }
        FormatSpec::Float32 => {
            check_alignment(data, format)?;
            let values = data
                .chunks_exact(4)
                .map(|c| f32::from_bits(u32::from_be_bytes([c[0], c[1], c[2], c[3]])))
                .map(format_float);
            Ok(values.collect::<Vec<_>>().join(","))
        }
    }
}

/// Parse text into a payload in the given format.
pub fn encode(text: &str, format: FormatSpec) -> CodecResult<Vec<u8>> {
    match format {
        FormatSpec::Hex => parse_hex(text),
        FormatSpec::String => Ok(text.as_bytes().to_vec()),
        FormatSpec::Int16 => {
            let tokens = split_values(text);
            let mut out = Vec::with_capacity(tokens.len() * 2);
            for token in tokens {
                let value = parse_int(token, 16)? as i16;
                out.extend_from_slice(&value.to_be_bytes());
            }
            Ok(out)
        }
        FormatSpec::Int32 => {
            let tokens = split_values(text);
            let mut out = Vec::with_capacity(tokens.len() * 4);
            for token in tokens {
                let value = parse_int(token, 32)? as i32;
                out.extend_from_slice(&value.to_be_bytes());
            }
            Ok(out)
        }
        FormatSpec::Float32 => {
            let tokens = split_values(text);
            let mut out = Vec::with_capacity(tokens.len() * 4);
            for token in tokens {
                let value = parse_float(token)?;
                out.extend_from_slice(&value.to_bits().to_be_bytes());
            }
            Ok(out)
        }
    }
}

fn check_alignment(data: &[u8], format: FormatSpec) -> CodecResult<()> {
    let width = format.width().unwrap_or(1);
    if data.len() % width != 0 {
        return Err(CodecError::Alignment {
            format: format.name(),
            width,
            len: data.len(),
        });
    }
    Ok(())
}

fn bytes_to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02X}", byte));
    }
    out
}

fn parse_hex(text: &str) -> CodecResult<Vec<u8>> {
    let clean = text.replace(' ', "").replace("0x", "").replace("0X", "");
    let bytes = clean.as_bytes();

    if bytes.len() % 2 != 0 {
        return Err(CodecError::MalformedInput(format!(
            "hex input length must be even, got {}",
            bytes.len()
        )));
    }

    let mut out = Vec::with_capacity(bytes.len() / 2);
    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        match (hex_digit(pair[0]), hex_digit(pair[1])) {
            (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
            _ => {
                return Err(CodecError::MalformedInput(format!(
                    "invalid hex at position {}: {:?}",
                    i * 2,
                    String::from_utf8_lossy(pair)
                )))
            }
        }
    }
    Ok(out)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Split on commas, trim, and drop empty tokens.
fn split_values(text: &str) -> Vec<&str> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parse a signed integer that must fit in `bits` bits.
///
/// Accepts an optional sign and the usual literal bases: `0x`, `0o`, `0b`,
/// or a bare leading `0` for octal. `_` may separate digits or follow a
/// base prefix.
fn parse_int(token: &str, bits: u32) -> CodecResult<i64> {
    let malformed = || CodecError::MalformedInput(format!("invalid integer {:?}", token));

    let (negative, body) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };

    let (radix, digits, prefixed) = if let Some(rest) = strip_radix(body, 'x') {
        (16, rest, true)
    } else if let Some(rest) = strip_radix(body, 'o') {
        (8, rest, true)
    } else if let Some(rest) = strip_radix(body, 'b') {
        (2, rest, true)
    } else if body.len() > 1 && body.starts_with('0') {
        // leading zero selects octal
        (8, &body[1..], true)
    } else {
        (10, body, false)
    };

    // `_` may follow a base prefix or sit between digits
    let digits = if prefixed {
        digits.strip_prefix('_').unwrap_or(digits)
    } else {
        digits
    };
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return Err(malformed());
    }
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    // from_str_radix would accept a second sign
    if digits.starts_with(['+', '-']) {
        return Err(malformed());
    }

    let magnitude = u64::from_str_radix(&digits, radix).map_err(|_| malformed())?;
    let value = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };

    let min = -(1i128 << (bits - 1));
    let max = (1i128 << (bits - 1)) - 1;
    if value < min || value > max {
        return Err(CodecError::MalformedInput(format!(
            "integer {:?} out of range for int{}",
            token, bits
        )));
    }

    Ok(value as i64)
}

/// Parse a binary32 value. Finite text that overflows `f32` is rejected
/// rather than stored as infinity.
fn parse_float(token: &str) -> CodecResult<f32> {
    let value: f32 = token
        .parse()
        .map_err(|_| CodecError::MalformedInput(format!("invalid float {:?}", token)))?;

    if !value.is_finite() {
        let word = token.trim_start_matches(['+', '-']).to_ascii_lowercase();
        if !matches!(word.as_str(), "inf" | "infinity" | "nan") {
            return Err(CodecError::MalformedInput(format!(
                "float {:?} out of range for float32",
                token
            )));
        }
    }
    Ok(value)
}

/// Strip a `0x`-style prefix, either case of the letter.
fn strip_radix(body: &str, letter: char) -> Option<&str> {
    let rest = body.strip_prefix('0')?;
    rest.strip_prefix(letter)
        .or_else(|| rest.strip_prefix(letter.to_ascii_uppercase()))
}

fn join_values(values: impl Iterator<Item = i64>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

/// Shortest round-trip digits in `%g` layout: plain decimal for exponents
/// in `-4..6`, otherwise `d.ddde±XX`.
fn format_float(value: f32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = match exponent.parse() {
        Ok(e) => e,
        Err(_) => return scientific,
    };

    if (-4..6).contains(&exponent) {
        format!("{}", value)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_decode() {
        assert_eq!(decode(&[0x01, 0x02, 0x03, 0x04], FormatSpec::Hex).unwrap(), "01 02 03 04");
        assert_eq!(decode(&[0xAB, 0xff], FormatSpec::Hex).unwrap(), "AB FF");
        assert_eq!(decode(&[], FormatSpec::Hex).unwrap(), "");
    }

    #[test]
    fn test_hex_encode_strips_spaces_and_prefixes() {
        assert_eq!(encode("01ff", FormatSpec::Hex).unwrap(), vec![0x01, 0xFF]);
        assert_eq!(encode("0x01 0XFF", FormatSpec::Hex).unwrap(), vec![0x01, 0xFF]);
        assert_eq!(encode("01 02 03 04", FormatSpec::Hex).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_hex_roundtrip_is_canonical() {
        let text = "0xde ad BE 0Xef";
        let bytes = encode(text, FormatSpec::Hex).unwrap();
        let rendered = decode(&bytes, FormatSpec::Hex).unwrap();
        assert_eq!(rendered, "DE AD BE EF");
        assert_eq!(encode(&rendered, FormatSpec::Hex).unwrap(), bytes);
    }

    #[test]
    fn test_hex_odd_length() {
        let err = encode("ABC", FormatSpec::Hex).unwrap_err();
        assert!(matches!(err, CodecError::MalformedInput(ref m) if m.contains("even")));
    }

    #[test]
    fn test_hex_invalid_group_reports_offset() {
        let err = encode("01zz", FormatSpec::Hex).unwrap_err();
        assert!(matches!(err, CodecError::MalformedInput(ref m) if m.contains("position 2")));

        // A sign is not a hex digit.
        assert!(encode("+1", FormatSpec::Hex).is_err());
    }

    #[test]
    fn test_string_identity() {
        assert_eq!(decode(b"PUMP1", FormatSpec::String).unwrap(), "PUMP1");
        assert_eq!(encode("PUMP1", FormatSpec::String).unwrap(), b"PUMP1".to_vec());
        assert_eq!(encode("", FormatSpec::String).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_int16_decode_is_signed_big_endian() {
        assert_eq!(decode(&[0x01, 0x02, 0x03, 0x04], FormatSpec::Int16).unwrap(), "258,772");
        assert_eq!(decode(&[0xFF, 0xFE], FormatSpec::Int16).unwrap(), "-2");
        assert_eq!(decode(&[0x80, 0x00], FormatSpec::Int16).unwrap(), "-32768");
    }

    #[test]
    fn test_int32_decode() {
        assert_eq!(decode(&[0x01, 0x02, 0x03, 0x04], FormatSpec::Int32).unwrap(), "16909060");
        assert_eq!(decode(&[0xFF, 0xFF, 0xFF, 0xFF], FormatSpec::Int32).unwrap(), "-1");
    }

    #[test]
    fn test_int_alignment() {
        let err = decode(&[1, 2, 3], FormatSpec::Int32).unwrap_err();
        assert_eq!(
            err,
            CodecError::Alignment {
                format: "int32",
                width: 4,
                len: 3
            }
        );
        assert!(decode(&[1, 2, 3], FormatSpec::Int16).is_err());
    }

    #[test]
    fn test_int16_extremes_roundtrip() {
        let bytes = encode("-32768, 32767, 0, -1", FormatSpec::Int16).unwrap();
        assert_eq!(bytes, vec![0x80, 0x00, 0x7F, 0xFF, 0x00, 0x00, 0xFF, 0xFF]);
        assert_eq!(decode(&bytes, FormatSpec::Int16).unwrap(), "-32768,32767,0,-1");
    }

    #[test]
    fn test_int32_extremes_roundtrip() {
        let text = "-2147483648,2147483647";
        let bytes = encode(text, FormatSpec::Int32).unwrap();
        assert_eq!(decode(&bytes, FormatSpec::Int32).unwrap(), text);
    }

    #[test]
    fn test_int_out_of_range_rejected() {
        let err = encode("32768", FormatSpec::Int16).unwrap_err();
        assert!(matches!(err, CodecError::MalformedInput(ref m) if m.contains("32768")));
        assert!(encode("-32769", FormatSpec::Int16).is_err());
        assert!(encode("2147483648", FormatSpec::Int32).is_err());
        assert!(encode("99999999999999999999999", FormatSpec::Int32).is_err());
    }

    #[test]
    fn test_int_non_numeric_names_token() {
        let err = encode("1,two,3", FormatSpec::Int16).unwrap_err();
        assert!(matches!(err, CodecError::MalformedInput(ref m) if m.contains("\"two\"")));
        assert!(encode("--1", FormatSpec::Int16).is_err());
        assert!(encode("1__0", FormatSpec::Int16).is_err());
    }

    #[test]
    fn test_int_prefixes_and_empty_tokens() {
        assert_eq!(encode("0x10, ,0b11,,", FormatSpec::Int16).unwrap(), vec![0, 16, 0, 3]);
        assert_eq!(encode("-0x8000", FormatSpec::Int16).unwrap(), vec![0x80, 0x00]);
        assert_eq!(encode("1_000", FormatSpec::Int16).unwrap(), vec![0x03, 0xE8]);
        assert_eq!(encode(" , ", FormatSpec::Int32).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_int_base_zero_literals() {
        // a leading zero is octal, like C and Go literals
        assert_eq!(encode("010", FormatSpec::Int16).unwrap(), vec![0, 8]);
        assert_eq!(encode("-017", FormatSpec::Int16).unwrap(), (-15i16).to_be_bytes().to_vec());
        assert_eq!(encode("0", FormatSpec::Int16).unwrap(), vec![0, 0]);
        assert_eq!(encode("0_10", FormatSpec::Int16).unwrap(), vec![0, 8]);
        assert_eq!(encode("0x_10", FormatSpec::Int16).unwrap(), vec![0, 16]);
        assert_eq!(encode("0b_1_0", FormatSpec::Int16).unwrap(), vec![0, 2]);

        for bad in ["08", "0x", "0x__1", "1__0", "_1", "1_", "0x1_"] {
            assert!(
                matches!(encode(bad, FormatSpec::Int16), Err(CodecError::MalformedInput(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_float32_encode_exact_bytes() {
        assert_eq!(
            encode("1.5,2.25", FormatSpec::Float32).unwrap(),
            vec![0x3F, 0xC0, 0x00, 0x00, 0x40, 0x10, 0x00, 0x00]
        );
    }

    #[test]
    fn test_float32_decode() {
        let bytes = [0x3F, 0xC0, 0x00, 0x00, 0x40, 0x10, 0x00, 0x00];
        assert_eq!(decode(&bytes, FormatSpec::Float32).unwrap(), "1.5,2.25");
    }

    #[test]
    fn test_float32_bit_exact_roundtrip() {
        for value in [0.1f32, -3.4028235e38, 1.17549435e-38, 1e-45, 123456.79, -0.0, 7.0] {
            let bytes = encode(&format_float(value), FormatSpec::Float32).unwrap();
            let back = f32::from_bits(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
            assert_eq!(back.to_bits(), value.to_bits(), "{value}");
        }
    }

    #[test]
    fn test_float32_alignment_names_length() {
        let err = decode(&[0; 6], FormatSpec::Float32).unwrap_err();
        assert!(err.to_string().contains("got 6"));
    }

    #[test]
    fn test_float32_malformed() {
        let err = encode("1.0,abc", FormatSpec::Float32).unwrap_err();
        assert!(matches!(err, CodecError::MalformedInput(ref m) if m.contains("abc")));
    }

    #[test]
    fn test_float32_overflow_rejected() {
        for token in ["1e39", "-3.5e38"] {
            let err = encode(token, FormatSpec::Float32).unwrap_err();
            assert!(
                matches!(err, CodecError::MalformedInput(ref m) if m.contains(token)),
                "{token}"
            );
        }
        assert_eq!(
            encode("+Inf,-inf,NaN", FormatSpec::Float32).unwrap()[..8],
            [0x7F, 0x80, 0x00, 0x00, 0xFF, 0x80, 0x00, 0x00]
        );
    }

    #[test]
    fn test_format_float_layout() {
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(-0.0), "-0");
        assert_eq!(format_float(100000.0), "100000");
        assert_eq!(format_float(1_000_000.0), "1e+06");
        assert_eq!(format_float(1234567.0), "1.234567e+06");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.00001), "1e-05");
        assert_eq!(format_float(f32::NAN), "NaN");
        assert_eq!(format_float(f32::INFINITY), "+Inf");
        assert_eq!(format_float(f32::NEG_INFINITY), "-Inf");
        assert_eq!(format_float(3.4028235e38), "3.4028235e+38");
    }
}

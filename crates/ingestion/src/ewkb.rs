//! Point decoder for the hex-encoded EWKB geometries in forecast tables.
//!
//! Only one layout is supported: little-endian point with an SRID, i.e. a
//! 9-byte header (byte order, geometry type, SRID) followed by longitude and
//! latitude as little-endian doubles. The header is skipped, not checked.

use crate::error::DecodeError;

/// Hex characters of the byte order + type + SRID header.
pub const HEADER_HEX_LEN: usize = 18;

/// Hex characters of one double.
const F64_HEX_LEN: usize = 16;

/// Decode `(lat, lon)` from a hex EWKB point.
pub fn decode_point(hex: &str) -> Result<(f64, f64), DecodeError> {
    let bytes = hex.as_bytes();
    let expected = HEADER_HEX_LEN + 2 * F64_HEX_LEN;
    if bytes.len() < expected {
        return Err(DecodeError::TooShort {
            expected,
            actual: bytes.len(),
        });
    }

    let lon = read_f64_le(bytes, HEADER_HEX_LEN)?;
    let lat = read_f64_le(bytes, HEADER_HEX_LEN + F64_HEX_LEN)?;
    Ok((lat, lon))
}

fn read_f64_le(hex: &[u8], offset: usize) -> Result<f64, DecodeError> {
    let mut raw = [0u8; 8];
    for (i, byte) in raw.iter_mut().enumerate() {
        let pos = offset + 2 * i;
        *byte = (nibble(hex[pos], pos)? << 4) | nibble(hex[pos + 1], pos + 1)?;
    }
    Ok(f64::from_le_bytes(raw))
}

fn nibble(c: u8, position: usize) -> Result<u8, DecodeError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(DecodeError::InvalidHex { position }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // SRID 4326 point at lon 85.3, lat 27.7
    const KATHMANDU_VALLEY: &str = "0101000020E610000033333333335355403333333333B33B40";

    #[test]
    fn test_decode_point() {
        assert_eq!(decode_point(KATHMANDU_VALLEY).unwrap(), (27.7, 85.3));
    }

    #[test]
    fn test_lowercase_hex() {
        let lower = KATHMANDU_VALLEY.to_lowercase();
        assert_eq!(decode_point(&lower).unwrap(), (27.7, 85.3));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let extended = format!("{}00FF", KATHMANDU_VALLEY);
        assert_eq!(decode_point(&extended).unwrap(), (27.7, 85.3));
    }

    #[test]
    fn test_too_short() {
        let err = decode_point("0101000020E6100000").unwrap_err();
        assert_eq!(err, DecodeError::TooShort { expected: 50, actual: 18 });
    }

    #[test]
    fn test_invalid_hex() {
        let mut bad = KATHMANDU_VALLEY.to_string();
        bad.replace_range(20..21, "Z");
        assert_eq!(decode_point(&bad).unwrap_err(), DecodeError::InvalidHex { position: 20 });
    }
}

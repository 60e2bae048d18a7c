// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text, integer, and bitmask readings of SNMP values.

use async_snmp::Value;

/// Display form. Printable octet strings come back as text with trailing
/// NULs removed; anything else binary is rendered as `0x` hex. Exceptions
/// and NULL read as "".
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Integer(v) => v.to_string(),
        Value::OctetString(bytes) | Value::Opaque(bytes) => octets_to_text(bytes),
        Value::ObjectIdentifier(oid) => oid.to_string(),
        Value::IpAddress(a) => format!("{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
        Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => v.to_string(),
        Value::Counter64(v) => v.to_string(),
        _ => String::new(),
    }
}

/// Integer reading of the value, if it has one.
///
/// Numeric types map directly. Octet strings are read through their text
/// form: decimal text, or `0x` hex for non-printable octets.
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(v) => Some(i64::from(*v)),
        Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(i64::from(*v)),
        Value::Counter64(v) => i64::try_from(*v).ok(),
        Value::OctetString(_) => {
            let text = to_text(value);
            let text = text.trim();
            match text.strip_prefix("0x") {
                Some(hex_digits) => i64::from_str_radix(hex_digits, 16).ok(),
                None => text.parse().ok(),
            }
        }
        _ => None,
    }
}

/// A big-endian bit string of any length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmask {
    /// Big-endian, no leading zero octets.
    octets: Vec<u8>,
}

impl Bitmask {
    /// Octet strings are taken as-is; non-negative integers contribute their
    /// own value. Anything else is an empty mask.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::OctetString(bytes) | Value::Opaque(bytes) => Self::from_octets(bytes),
            other => match as_integer(other).and_then(|v| u64::try_from(v).ok()) {
                Some(v) => Self::from_octets(&v.to_be_bytes()),
                None => Self::default(),
            },
        }
    }

    pub fn from_octets(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        Self {
            octets: bytes[start..].to_vec(),
        }
    }

    /// Bit `bit`, counting from the least significant bit of the last octet.
    pub fn is_set(&self, bit: usize) -> bool {
        let from_end = bit / 8;
        if from_end >= self.octets.len() {
            return false;
        }
        let octet = self.octets[self.octets.len() - 1 - from_end];
        octet & (1 << (bit % 8)) != 0
    }

    /// `0x` hex with no leading zeros; `0x0` for an empty mask.
    pub fn to_hex(&self) -> String {
        let digits = hex::encode(&self.octets);
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{digits}")
        }
    }
}

fn octets_to_text(bytes: &[u8]) -> String {
    let trimmed = match bytes.iter().rposition(|&b| b != 0) {
        Some(last) => &bytes[..=last],
        None => &bytes[..0],
    };
    match std::str::from_utf8(trimmed) {
        Ok(text) if !text.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
            text.to_string()
        }
        _ => format!("0x{}", hex::encode(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_snmp::Oid;

    #[test]
    fn printable_octets_are_text() {
        assert_eq!(to_text(&Value::from("Black Toner\0\0")), "Black Toner");
        assert_eq!(to_text(&Value::from(&[0x00u8, 0x05][..])), "0x0005");
        assert_eq!(to_text(&Value::ObjectIdentifier(Oid::from([1, 3, 6]))), "1.3.6");
        assert_eq!(to_text(&Value::IpAddress([192, 0, 2, 7])), "192.0.2.7");
        assert_eq!(to_text(&Value::NoSuchInstance), "");
    }

    #[test]
    fn integer_coercions() {
        assert_eq!(as_integer(&Value::Integer(-2)), Some(-2));
        assert_eq!(as_integer(&Value::Gauge32(40)), Some(40));
        assert_eq!(as_integer(&Value::from(" 75 ")), Some(75));
        assert_eq!(as_integer(&Value::from(&[0x01u8, 0x00][..])), Some(256));
        assert_eq!(as_integer(&Value::from("n/a")), None);
        assert_eq!(as_integer(&Value::NoSuchInstance), None);
    }

    #[test]
    fn bitmask_is_big_endian() {
        let mask = Bitmask::from_value(&Value::from(&[0x01u8, 0x02][..]));
        assert_eq!(mask.to_hex(), "0x102");
        assert!(mask.is_set(1));
        assert!(mask.is_set(8));
        assert!(!mask.is_set(0));
        assert_eq!(Bitmask::from_value(&Value::Integer(9)).to_hex(), "0x9");
        assert_eq!(Bitmask::from_value(&Value::Integer(-1)).to_hex(), "0x0");
        assert_eq!(Bitmask::from_value(&Value::NoSuchInstance).to_hex(), "0x0");
    }

    #[test]
    fn bitmask_keeps_octets_beyond_eight() {
        let bytes: [u8; 9] = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05];
        let mask = Bitmask::from_value(&Value::from(&bytes[..]));
        assert_eq!(mask.to_hex(), "0x10000000000000005");
        assert!(mask.is_set(0));
        assert!(mask.is_set(2));
        assert!(mask.is_set(64));
        assert!(!mask.is_set(72));
    }
}

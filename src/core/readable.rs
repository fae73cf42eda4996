//! Readable byte sizes with ISO/IEC 80000-13 binary units.
//!
//! Parses strings like `"1 KiB"` or `"5.314 MiB"` into a byte count (rounded
//! up to the nearest integer) and formats byte counts back. Also usable as a
//! serde `with` module so config fields can be written as readable sizes.

use std::fmt;

use crate::core::MarqError;

// ISO/IEC 80000-13 binary units, matched case-insensitively.
const SCALE_FACTORS: &[(&str, u64)] = &[
    ("b", 1),
    ("kib", 1 << 10),
    ("mib", 1 << 20),
    ("gib", 1 << 30),
    ("tib", 1 << 40),
    ("pib", 1 << 50),
    ("eib", 1 << 60),
];

/// Parse a readable byte size (`"3 MiB"`, `"5.314KiB"`, `"10 B"`) into the
/// number of bytes, rounded up to the nearest integer.
pub fn parse_readable_size(input: &str) -> Result<u64, MarqError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(MarqError::ReadableSizeError("empty input".into()));
    }

    let number_end = trimmed
        .find(|c: char| !matches!(c, '0'..='9' | '.' | '+' | '-'))
        .unwrap_or(trimmed.len());
    let (number_part, unit_part) = trimmed.split_at(number_end);

    let value: f64 = number_part.trim().parse().map_err(|_| {
        MarqError::ReadableSizeError(format!("invalid number '{number_part}' in '{input}'"))
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(MarqError::ReadableSizeError(format!(
            "size must be a finite non-negative number, got '{number_part}'"
        )));
    }

    let unit = unit_part.trim().to_ascii_lowercase();
    let scale = SCALE_FACTORS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, scale)| *scale)
        .ok_or_else(|| {
            MarqError::ReadableSizeError(format!("unknown unit '{}' in '{input}'", unit_part.trim()))
        })?;

    let bytes = value * scale as f64;
    if bytes > u64::MAX as f64 {
        return Err(MarqError::ReadableSizeError(format!(
            "'{input}' does not fit in 64 bits"
        )));
    }
    Ok(bytes.ceil() as u64)
}

/// Format a byte count with the largest binary unit that keeps the value
/// at or above one, e.g. `1536` -> `"1.50 KiB"`.
pub fn format_readable_size(bytes: u64) -> String {
    let (unit, scale) = SCALE_FACTORS
        .iter()
        .rev()
        .find(|(_, scale)| bytes >= *scale)
        .map(|(name, scale)| (*name, *scale))
        .unwrap_or(("b", 1));

    let display = match unit {
        "b" => "B".to_string(),
        other => {
            let mut s = other.to_string();
            s[..1].make_ascii_uppercase();
            // "kib" -> "KiB"
            s[2..].make_ascii_uppercase();
            s
        }
    };

    if scale == 1 {
        format!("{bytes} {display}")
    } else {
        format!("{:.2} {display}", bytes as f64 / scale as f64)
    }
}

// serde `with` support: accepts either a readable string or a plain integer,
// serializes as the readable form.

pub fn serialize<S>(bytes: &usize, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_readable_size(*bytes as u64))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct ReadableVisitor;

    impl serde::de::Visitor<'_> for ReadableVisitor {
        type Value = usize;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a byte count or a readable size string like \"1 MiB\"")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<usize, E> {
            parse_readable_size(v)
                .map(|b| b as usize)
                .map_err(|e| E::custom(e.to_string()))
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<usize, E> {
            Ok(v as usize)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<usize, E> {
            if v < 0 {
                return Err(E::custom("byte size cannot be negative"));
            }
            Ok(v as usize)
        }
    }

    deserializer.deserialize_any(ReadableVisitor)
}

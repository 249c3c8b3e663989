//! Human-readable size strings to byte counts.
//!
//! Units are binary: `1 KB` is 1024 bytes, so `"1.5 GB"` is 1610612736.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static SIZE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^([0-9]+(?:[.,][0-9]+)?)\s*([A-Za-z]*)$").ok());

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Parse a size like `"1.5 GB"`, `"700MB"`, `"350 MiB"` or a bare byte count.
///
/// Returns `None` for anything it cannot read.
pub fn convert_size(text: &str) -> Option<u64> {
    let re = SIZE_RE.as_ref()?;
    let caps = re.captures(text.trim())?;

    let scalar: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
    let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let exponent = unit_exponent(unit)?;

    let bytes = scalar * 1024f64.powi(exponent);
    if !bytes.is_finite() || bytes > u64::MAX as f64 {
        return None;
    }
    Some(bytes.round() as u64)
}

fn unit_exponent(unit: &str) -> Option<i32> {
    if unit.is_empty() {
        return Some(0);
    }
    // KiB, MiB and friends mean the same thing here
    let normalized = unit.to_ascii_uppercase().replace("IB", "B");
    UNITS
        .iter()
        .position(|u| *u == normalized)
        .map(|idx| idx as i32)
}

/// Lenient integer parse: anything malformed or missing is 0.
pub fn try_int(text: Option<&str>) -> u32 {
    text.and_then(|t| t.trim().parse::<u32>().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_size_units() {
        assert_eq!(convert_size("1.5 GB"), Some(1_610_612_736));
        assert_eq!(convert_size("700 MB"), Some(734_003_200));
        assert_eq!(convert_size("12 KB"), Some(12_288));
        assert_eq!(convert_size("2 TB"), Some(2_199_023_255_552));
        assert_eq!(convert_size("512 B"), Some(512));
    }

    #[test]
    fn test_convert_size_variants() {
        assert_eq!(convert_size("1.5GB"), Some(1_610_612_736));
        assert_eq!(convert_size("1,5 gb"), Some(1_610_612_736));
        assert_eq!(convert_size("350 MiB"), Some(367_001_600));
        assert_eq!(convert_size("  1048576 "), Some(1_048_576));
    }

    #[test]
    fn test_convert_size_unparsable() {
        assert_eq!(convert_size(""), None);
        assert_eq!(convert_size("unknown"), None);
        assert_eq!(convert_size("1.5 XB"), None);
        assert_eq!(convert_size("GB 1.5"), None);
        assert_eq!(convert_size("-3 MB"), None);
    }

    #[test]
    fn test_try_int() {
        assert_eq!(try_int(Some("42")), 42);
        assert_eq!(try_int(Some(" 7 ")), 7);
        assert_eq!(try_int(Some("n/a")), 0);
        assert_eq!(try_int(Some("-5")), 0);
        assert_eq!(try_int(Some("")), 0);
        assert_eq!(try_int(None), 0);
    }
}

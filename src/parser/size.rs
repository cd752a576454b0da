use regex::Regex;
use std::sync::OnceLock;

/// Bytes for a feed size string such as `1.4 GiB` or `350 MB`.
/// The feed's `?` placeholder and anything else unrecognised yield `None`.
#[must_use]
pub fn parse_size(size_str: &str) -> Option<i64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(B|Bytes|[KMGT]i?B)$").expect("Invalid regex")
    });

    let caps = re.captures(size_str.trim())?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str().to_uppercase();

    let (base, power): (f64, i32) = match unit.as_str() {
        "B" | "BYTES" => (1.0, 0),
        "KIB" => (1024.0, 1),
        "MIB" => (1024.0, 2),
        "GIB" => (1024.0, 3),
        "TIB" => (1024.0, 4),
        "KB" => (1000.0, 1),
        "MB" => (1000.0, 2),
        "GB" => (1000.0, 3),
        "TB" => (1000.0, 4),
        _ => return None,
    };

    #[allow(clippy::cast_possible_truncation)]
    Some((value * base.powi(power)) as i64)
}

#[must_use]
pub fn format_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    if value < 1024.0 {
        return format!("{bytes} B");
    }

    let mut unit = UNITS[0];
    for next in UNITS {
        value /= 1024.0;
        unit = next;
        if value < 1024.0 {
            break;
        }
    }
    format!("{value:.2} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1.5 GiB"), Some(1_610_612_736));
        assert_eq!(parse_size("500 MiB"), Some(524_288_000));
        assert_eq!(parse_size("1.2 GB"), Some(1_200_000_000));
        assert_eq!(parse_size("512 Bytes"), Some(512));
        assert_eq!(parse_size("?"), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KiB");
        assert_eq!(format_size(1_610_612_736), "1.50 GiB");
    }
}

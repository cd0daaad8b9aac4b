use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// Convert seconds since the Unix epoch into a UTC timestamp.
///
/// Returns `None` for values chrono cannot represent.
pub fn datetime_from_epoch(secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Convert a `SystemTime` (e.g. from `Metadata::modified`) into a UTC timestamp.
pub fn datetime_from_system_time(time: SystemTime) -> Option<DateTime<Utc>> {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .and_then(|d| datetime_from_epoch(d.as_secs()))
}

/// A byte count scaled to the largest fitting unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanSize {
    pub value: f64,
    pub unit: &'static str,
}

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Scale `bytes` by powers of 1024, rounded to two decimals.
///
/// Anything beyond terabytes stays in `TB`.
pub fn format_size(bytes: u64) -> HumanSize {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    HumanSize {
        value: (value * 100.0).round() / 100.0,
        unit: SIZE_UNITS[unit],
    }
}

/// Guess a MIME type from a file name's extension.
pub fn mime_type_for(name: &str) -> Option<String> {
    mime_guess::from_path(name).first().map(|mime| mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(0), HumanSize { value: 0.0, unit: "B" });
        assert_eq!(format_size(1023), HumanSize { value: 1023.0, unit: "B" });
        assert_eq!(format_size(1024), HumanSize { value: 1.0, unit: "KB" });
        assert_eq!(format_size(1536), HumanSize { value: 1.5, unit: "KB" });
        assert_eq!(format_size(4_194_370).unit, "MB");
        assert_eq!(format_size(u64::MAX).unit, "TB");
    }

    #[test]
    fn format_size_rounds_to_two_decimals() {
        let size = format_size(1_234_567);
        assert_eq!(size.unit, "MB");
        assert_eq!(size.value, 1.18);
        assert_eq!(size.to_string(), "1.18 MB");
    }

    #[test]
    fn epoch_conversion() {
        let dt = datetime_from_epoch(1_700_000_000).unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert!(datetime_from_epoch(u64::MAX).is_none());
    }

    #[test]
    fn system_time_conversion() {
        let now = SystemTime::now();
        let dt = datetime_from_system_time(now).unwrap();
        assert!(dt.timestamp() > 1_600_000_000);
    }

    #[test]
    fn mime_type_guess() {
        assert_eq!(mime_type_for("docs/readme.md").as_deref(), Some("text/markdown"));
        assert_eq!(mime_type_for("LOGO.PNG").as_deref(), Some("image/png"));
        for name in ["clip.mov", "song.wav", "report.docx", "sheet.xlsx", "notes.yaml"] {
            assert!(mime_type_for(name).is_some(), "{name}");
        }
        assert_eq!(mime_type_for("data.qqzz"), None);
        assert_eq!(mime_type_for("Makefile"), None);
    }
}

pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod members;
pub(crate) mod owner;
pub(crate) mod stats;
pub(crate) mod tiles;

use crate::CliError;

/// Convert a `--threshold-days` value into a duration.
pub(crate) fn threshold_from_days(days: i64) -> Result<chrono::Duration, CliError> {
    chrono::Duration::try_days(days)
        .ok_or_else(|| CliError::invalid_args(format!("threshold of {days} days is out of range")))
}

/// Format an optional value, printing `-` for `None`.
pub(crate) fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

/// Format a tile count without a trailing `.0` for whole numbers.
pub(crate) fn format_tiles(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_days_in_range() {
        assert_eq!(threshold_from_days(30).unwrap(), chrono::Duration::days(30));
        assert_eq!(
            threshold_from_days(100_000_000).unwrap(),
            chrono::Duration::days(100_000_000)
        );
    }

    #[test]
    fn threshold_days_out_of_range() {
        assert!(matches!(
            threshold_from_days(i64::MAX),
            Err(CliError::InvalidArgs(_))
        ));
    }

    #[test]
    fn tiles_format_without_fraction() {
        assert_eq!(format_tiles(4.0), "4");
        assert_eq!(format_tiles(2.5), "2.50");
        assert_eq!(or_dash(None::<i64>), "-");
    }
}

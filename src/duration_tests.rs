// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `duration.rs`

#[cfg(test)]
mod tests {
    use super::super::parse_duration;
    use std::time::Duration;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_duration("0s").unwrap(), Duration::from_secs(0));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86400));
    }

    #[test]
    fn test_empty_string_rejected() {
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_missing_unit_rejected() {
        assert!(parse_duration("10").is_err());
    }

    #[test]
    fn test_unit_without_value_rejected() {
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("m").is_err());
    }

    #[test]
    fn test_unsupported_unit_rejected() {
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("10w").is_err());
        assert!(parse_duration("10ms").is_err());
    }

    #[test]
    fn test_negative_value_rejected() {
        // The leading '-' is not a digit, so it is treated as a (bad) unit.
        assert!(parse_duration("-30s").is_err());
    }
}

use serde::{Deserialize, Serialize};

/// A derived 30-minute candidate interval, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

/// Parse a zero-padded `HH:MM` string into minutes since midnight.
pub fn parse_hhmm(s: &str) -> anyhow::Result<u32> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
    if h.len() != 2 || m.len() != 2 {
        return Err(anyhow::anyhow!("time must be zero-padded HH:MM: {s}"));
    }
    let hour: u32 = h
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = m
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow::anyhow!("time out of range: {s}"));
    }
    Ok(hour * 60 + minute)
}

/// Format minutes since midnight back to zero-padded `HH:MM`.
pub fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(parse_hhmm("00:00").unwrap(), 0);
        assert_eq!(parse_hhmm("09:30").unwrap(), 570);
        assert_eq!(parse_hhmm("23:59").unwrap(), 1439);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_hhmm("9:30").is_err());
        assert!(parse_hhmm("09:5").is_err());
        assert!(parse_hhmm("24:00").is_err());
        assert!(parse_hhmm("09:60").is_err());
        assert!(parse_hhmm("0930").is_err());
        assert!(parse_hhmm("ab:cd").is_err());
    }

    #[test]
    fn test_format_zero_pads() {
        assert_eq!(format_hhmm(0), "00:00");
        assert_eq!(format_hhmm(570), "09:30");
        assert_eq!(format_hhmm(1439), "23:59");
    }
}

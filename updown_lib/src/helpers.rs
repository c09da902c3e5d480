//! Helpers for API key resolution and time handling.

use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Source from which the API key was obtained (for diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    OnePassword,
    Bitwarden,
    Keepassxc,
}

impl ApiKeySource {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiKeySource::OnePassword => "1Password",
            ApiKeySource::Bitwarden => "Bitwarden",
            ApiKeySource::Keepassxc => "KeePassXC",
        }
    }
}

/// Get API key from a secret backend only (1Password, Bitwarden, KeePassXC).
///
/// Plain-text API keys (env vars or CLI) are not supported.
/// Configure one backend via its env vars (see [crate::secret]):
/// - 1Password: `UPDOWN_OP_ENTRY_PATH` (op://Vault/Item) or `UPDOWN_OP_VAULT` + `UPDOWN_OP_ITEM`; optional `UPDOWN_OP_FIELD` (default API_KEY).
/// - Bitwarden: `UPDOWN_BW_ITEM_ID` (login item UUID); optional `UPDOWN_BW_SESSION`.
/// - KeePassXC: `UPDOWN_KPXC_DB`, `UPDOWN_KPXC_ENTRY`; optional `UPDOWN_KPXC_ATTRIBUTE` (default Password).
pub fn get_api_key() -> Result<(String, ApiKeySource), String> {
    let backends: [(fn() -> Option<String>, ApiKeySource); 3] = [
        (crate::secret::one_password, ApiKeySource::OnePassword),
        (crate::secret::bitwarden, ApiKeySource::Bitwarden),
        (crate::secret::keepassxc, ApiKeySource::Keepassxc),
    ];
    backends
        .iter()
        .find_map(|(read, source)| read().filter(|k| !k.is_empty()).map(|k| (k, *source)))
        .ok_or_else(|| {
            "API key not found. Configure a secret backend: UPDOWN_OP_ENTRY_PATH (1Password), \
             UPDOWN_BW_ITEM_ID (Bitwarden), or UPDOWN_KPXC_DB+UPDOWN_KPXC_ENTRY (KeePassXC). Plain-text keys are not supported."
                .to_string()
        })
}

/// Format time as ISO 8601 for the API.
pub fn format_time(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format a timestamp for display. If `use_utc` is true, shows UTC; otherwise converts to local timezone.
pub fn format_timestamp_display(dt: &DateTime<Utc>, use_utc: bool) -> String {
    if use_utc {
        dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    } else {
        dt.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string()
    }
}

/// Parse ISO 8601 time string. A missing zone designator is read as UTC.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim().trim_end_matches('Z').trim_end_matches('z');
    let parsed = chrono::DateTime::parse_from_rfc3339(&format!("{}Z", s))
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(s))
        .map_err(|e| e.to_string())?;
    Ok(parsed.with_timezone(&Utc))
}

/// Parse range string (e.g. "30min", "1day", "7days") into seconds.
pub fn parse_range(range_str: &str) -> Result<u64, String> {
    let s = range_str.trim().to_lowercase().replace(' ', "");
    let num_end = s.chars().take_while(|c| c.is_ascii_digit()).count();
    let num: u64 = s[..num_end]
        .parse()
        .map_err(|_| format!("Invalid range: {}", range_str))?;
    let unit = &s[num_end..];
    let unit_secs: u64 = match unit {
        u if u.starts_with("min") => 60,
        u if u.starts_with("hr") || u.starts_with("hour") => 3600,
        u if u.starts_with("day") => 86400,
        u if u.starts_with("week") => 7 * 86400,
        _ => return Err(format!("Unknown time unit in range: {}", range_str)),
    };
    num.checked_mul(unit_secs)
        .ok_or_else(|| format!("Range too large: {}", range_str))
}

/// Compute the (from, to) window for a range ending at `to` (or now).
pub fn calculate_range(
    range: &str,
    to: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
    let end_time = to.unwrap_or_else(Utc::now);
    let secs = parse_range(range)?;
    let start_time = i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|span| end_time.checked_sub_signed(span))
        .ok_or_else(|| format!("Range too large: {}", range))?;
    Ok((start_time, end_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("30min").unwrap(), 30 * 60);
        assert_eq!(parse_range("1day").unwrap(), 86400);
        assert_eq!(parse_range("7days").unwrap(), 7 * 86400);
        assert_eq!(parse_range("2 weeks").unwrap(), 14 * 86400);
        assert!(parse_range("days").is_err());
        assert!(parse_range("3fortnights").is_err());
    }

    #[test]
    fn test_oversized_range_is_an_error() {
        let err = parse_range("307445734561825861min").unwrap_err();
        assert!(err.starts_with("Range too large"), "{err}");
        let err = calculate_range("999999999999days", None).unwrap_err();
        assert!(err.starts_with("Range too large"), "{err}");
    }

    #[test]
    fn test_calculate_range_ends_at_to() {
        let to = Utc.with_ymd_and_hms(2019, 8, 17, 12, 0, 0).unwrap();
        let (from, end) = calculate_range("1day", Some(to)).unwrap();
        assert_eq!(end, to);
        assert_eq!(from, Utc.with_ymd_and_hms(2019, 8, 16, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_format_time_is_iso8601() {
        let t = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_time(t), "2019-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_parse_time_without_zone() {
        let t = parse_time("2016-02-07T13:59:51").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2016, 2, 7, 13, 59, 51).unwrap());
        assert!(parse_time("not a time").is_err());
    }

    #[test]
    fn test_format_timestamp_display_utc() {
        let t = Utc.with_ymd_and_hms(2016, 2, 7, 13, 59, 51).unwrap();
        assert_eq!(format_timestamp_display(&t, true), "2016-02-07 13:59:51 UTC");
    }
}

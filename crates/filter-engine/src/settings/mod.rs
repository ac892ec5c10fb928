//! Knobs that change how a filter tree is evaluated without changing the
//! tree itself.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use error::SettingsError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::debug;

pub mod error;

pub const TIMEZONE_VAR: &str = "FILTER_TIMEZONE";
pub const WEEK_START_VAR: &str = "FILTER_WEEK_START";
pub const NULL_CHECK_VAR: &str = "FILTER_NULL_CHECK";

/// How `null` / `notNull` conditions are compiled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullCheck {
    /// `field IS NULL` / `field IS NOT NULL`.
    #[default]
    Predicate,

    /// Compatibility with the old admin: `null` matches nothing and
    /// `notNull` matches everything, whatever the column holds.
    Legacy,
}

impl FromStr for NullCheck {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "predicate" => Ok(NullCheck::Predicate),
            "legacy" => Ok(NullCheck::Legacy),
            _ => Err(SettingsError::InvalidNullCheck(s.to_string())),
        }
    }
}

impl fmt::Display for NullCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullCheck::Predicate => write!(f, "predicate"),
            NullCheck::Legacy => write!(f, "legacy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Timezone in which "today" is computed for relative date filters.
    pub timezone: Tz,

    /// First day of the week for `thisWeek` / `lastWeek`.
    pub week_start: Weekday,

    pub null_check: NullCheck,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            week_start: Weekday::Sun,
            null_check: NullCheck::Predicate,
        }
    }
}

impl FilterSettings {
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Applies `FILTER_*` overrides found through `lookup`, typically an
    /// environment reader.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(TIMEZONE_VAR) {
            self.timezone = raw
                .trim()
                .parse::<Tz>()
                .map_err(|_| SettingsError::InvalidTimezone(raw.clone()))?;
        }
        if let Some(raw) = lookup(WEEK_START_VAR) {
            self.week_start = raw
                .trim()
                .parse::<Weekday>()
                .map_err(|_| SettingsError::InvalidWeekStart(raw.clone()))?;
        }
        if let Some(raw) = lookup(NULL_CHECK_VAR) {
            self.null_check = raw.parse()?;
        }

        debug!(
            "Filter settings: timezone={}, week_start={}, null_check={}",
            self.timezone, self.week_start, self.null_check
        );
        Ok(self)
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn with_null_check(mut self, null_check: NullCheck) -> Self {
        self.null_check = null_check;
        self
    }

    /// The calendar day `now` falls on in the configured timezone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = FilterSettings::default();
        assert_eq!(settings.timezone, Tz::UTC);
        assert_eq!(settings.week_start, Weekday::Sun);
        assert_eq!(settings.null_check, NullCheck::Predicate);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let settings = FilterSettings::from_json_str(r#"{"null_check": "legacy"}"#).unwrap();
        assert_eq!(settings.null_check, NullCheck::Legacy);
        assert_eq!(settings.week_start, Weekday::Sun);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (TIMEZONE_VAR, "Asia/Shanghai"),
            (WEEK_START_VAR, "monday"),
            (NULL_CHECK_VAR, "LEGACY"),
        ]);
        let settings = FilterSettings::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.timezone, chrono_tz::Asia::Shanghai);
        assert_eq!(settings.week_start, Weekday::Mon);
        assert_eq!(settings.null_check, NullCheck::Legacy);
    }

    #[test]
    fn test_invalid_override() {
        let err = FilterSettings::default()
            .with_overrides(|key| (key == TIMEZONE_VAR).then(|| "Mars/Olympus".to_string()))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidTimezone(_)));
    }

    #[test]
    fn test_today_uses_timezone() {
        // 2024-03-15 20:00 UTC is already the 16th in Shanghai.
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 20, 0, 0).unwrap();
        let utc = FilterSettings::default();
        let shanghai = utc.with_timezone(chrono_tz::Asia::Shanghai);

        assert_eq!(utc.today(now), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(shanghai.today(now), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
    }
}

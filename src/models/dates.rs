use chrono::{DateTime, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar day as the requester sees it.
///
/// Accepts either a plain `YYYY-MM-DD` date or an RFC 3339 timestamp. For
/// timestamps the date is taken in the timestamp's own offset, so
/// `2024-01-30T00:00:00-05:00` is the 30th, not the UTC day it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(pub NaiveDate);

impl CalendarDate {
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for CalendarDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self(date));
        }
        DateTime::parse_from_rfc3339(s)
            .map(|ts| Self(ts.date_naive()))
            .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD or an RFC 3339 timestamp", s))
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_date() {
        let date: CalendarDate = "2024-01-30".parse().unwrap();
        assert_eq!(date.date(), ymd(2024, 1, 30));
    }

    #[test]
    fn test_timestamp_keeps_local_day() {
        // midnight in New York is 05:00 UTC on the same day
        let date: CalendarDate = "2024-01-30T00:00:00-05:00".parse().unwrap();
        assert_eq!(date.date(), ymd(2024, 1, 30));

        // late evening west of UTC is already the next day in UTC
        let date: CalendarDate = "2024-01-30T22:30:00-08:00".parse().unwrap();
        assert_eq!(date.date(), ymd(2024, 1, 30));

        // early morning east of UTC is still the previous day in UTC
        let date: CalendarDate = "2024-01-30T01:00:00+09:00".parse().unwrap();
        assert_eq!(date.date(), ymd(2024, 1, 30));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("30/01/2024".parse::<CalendarDate>().is_err());
        assert!("".parse::<CalendarDate>().is_err());
    }

    #[test]
    fn test_json_round_trip_uses_plain_date() {
        let date: CalendarDate = serde_json::from_str("\"2024-02-29T12:00:00Z\"").unwrap();
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-02-29\"");
    }
}

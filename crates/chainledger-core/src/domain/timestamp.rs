use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::SchemaError;

/// Display format shared by validation and export: `MM/DD/YYYY HH:MM:SS`.
const EVENT_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[month]/[day]/[year] [hour]:[minute]:[second]");

pub const MIN_EVENT_YEAR: i32 = 2000;
pub const MAX_EVENT_YEAR: i32 = 2100;

/// UTC timestamp with second precision.
///
/// Parsing is strict: zero-padded fields, calendar-valid day-of-month
/// (including leap years, delegated to `time`), and a year inside
/// [`MIN_EVENT_YEAR`, `MAX_EVENT_YEAR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventTimestamp(PrimitiveDateTime);

impl EventTimestamp {
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        let parsed = PrimitiveDateTime::parse(input, EVENT_TIMESTAMP_FORMAT).map_err(|_| {
            SchemaError::InvalidTimestamp {
                value: input.to_owned(),
            }
        })?;

        Self::from_primitive(parsed)
    }

    /// Builds a timestamp from unix seconds, as returned by most indexers.
    pub fn from_unix(seconds: i64) -> Result<Self, SchemaError> {
        let datetime = OffsetDateTime::from_unix_timestamp(seconds).map_err(|_| {
            SchemaError::InvalidTimestamp {
                value: seconds.to_string(),
            }
        })?;

        Self::from_primitive(PrimitiveDateTime::new(datetime.date(), datetime.time()))
    }

    fn from_primitive(value: PrimitiveDateTime) -> Result<Self, SchemaError> {
        let year = value.year();
        if !(MIN_EVENT_YEAR..=MAX_EVENT_YEAR).contains(&year) {
            return Err(SchemaError::TimestampYearOutOfRange { year });
        }

        Ok(Self(value))
    }

    pub fn render(self) -> String {
        self.0
            .format(EVENT_TIMESTAMP_FORMAT)
            .expect("event timestamps are always formattable")
    }
}

impl Display for EventTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for EventTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.render())
    }
}

impl<'de> Deserialize<'de> for EventTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_renders_round_trip() {
        let parsed = EventTimestamp::parse("02/29/2024 23:59:59").expect("leap day must parse");
        assert_eq!(parsed.render(), "02/29/2024 23:59:59");
    }

    #[test]
    fn rejects_non_leap_february_29() {
        let err = EventTimestamp::parse("02/29/2023 00:00:00").expect_err("must fail");
        assert!(matches!(err, SchemaError::InvalidTimestamp { .. }));
    }

    #[test]
    fn rejects_day_beyond_month_end() {
        assert!(EventTimestamp::parse("04/31/2024 10:00:00").is_err());
        assert!(EventTimestamp::parse("13/01/2024 10:00:00").is_err());
    }

    #[test]
    fn rejects_year_outside_window() {
        let err = EventTimestamp::parse("01/01/1999 00:00:00").expect_err("must fail");
        assert!(matches!(err, SchemaError::TimestampYearOutOfRange { year: 1999 }));
        assert!(EventTimestamp::parse("01/01/2101 00:00:00").is_err());
    }

    #[test]
    fn converts_unix_seconds() {
        // 2021-06-01T00:00:00Z
        let ts = EventTimestamp::from_unix(1_622_505_600).expect("must convert");
        assert_eq!(ts.render(), "06/01/2021 00:00:00");
    }
}

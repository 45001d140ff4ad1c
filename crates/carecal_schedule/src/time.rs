// --- File: crates/carecal_schedule/src/time.rs ---
//! Clock-time arithmetic within a single day.
//!
//! [`TimeOfDay`] is a minute-resolution wall-clock time between 00:00 and
//! 23:59. Arithmetic never wraps into the next day. [`MinuteSpan`] is a
//! half-open `[start, end)` interval measured in minutes since midnight whose
//! end may reach 24:00, which is what a full-day block needs.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, ScheduleError};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock time within one day, minute granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(TimeOfDay((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    /// Parses strict `HH:MM` 24-hour text.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || ScheduleError::InvalidFormat(format!("expected HH:MM, got {text:?}"));
        let bytes = text.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let [h1, h2, m1, m2] = digits.map(|b| u32::from(b - b'0'));
        Self::from_hm(h1 * 10 + h2, m1 * 10 + m2).ok_or_else(invalid)
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0 / 60)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0 % 60)
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.0
    }

    /// Adds `minutes`; `None` when the result would reach or pass 24:00.
    pub fn add_minutes(self, minutes: u32) -> Option<Self> {
        let total = u32::from(self.0).checked_add(minutes)?;
        if total < u32::from(MINUTES_PER_DAY) {
            Some(TimeOfDay(total as u16))
        } else {
            None
        }
    }

    /// Drops seconds.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        TimeOfDay((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        TimeOfDay::parse(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        TimeOfDay::parse(&text).map_err(de::Error::custom)
    }
}

/// Half-open interval overlap: touching endpoints do not overlap.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// Non-empty half-open interval of minutes since midnight, end ≤ 1440.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinuteSpan {
    pub start: u16,
    pub end: u16,
}

impl MinuteSpan {
    pub fn new(start: u16, end: u16) -> Option<Self> {
        (start < end && end <= MINUTES_PER_DAY).then_some(MinuteSpan { start, end })
    }

    pub fn whole_day() -> Self {
        MinuteSpan {
            start: 0,
            end: MINUTES_PER_DAY,
        }
    }

    pub fn between(start: TimeOfDay, end: TimeOfDay) -> Option<Self> {
        Self::new(start.minutes_since_midnight(), end.minutes_since_midnight())
    }

    pub fn len(&self) -> u16 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &MinuteSpan) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidFormat(format!("expected YYYY-MM-DD, got {text:?}")))
}

/// Accepts full or abbreviated English day names, any case.
pub fn parse_weekday(text: &str) -> Result<Weekday> {
    Weekday::from_str(text.trim())
        .map_err(|_| ScheduleError::InvalidFormat(format!("unknown weekday {text:?}")))
}

/// Full English name, e.g. `Monday`.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Serde adapter for `Vec<Weekday>`: writes full day names and reads full or
/// abbreviated ones. Use with `#[serde(with = "weekday_names")]`.
pub mod weekday_names {
    use super::*;

    pub fn serialize<S: Serializer>(
        days: &[Weekday],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(days.iter().map(|day| weekday_name(*day)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Vec<Weekday>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|text| parse_weekday(text).map_err(de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(text: &str) -> TimeOfDay {
        TimeOfDay::parse(text).unwrap()
    }

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(t("00:00"), TimeOfDay::MIDNIGHT);
        assert_eq!(t("09:05").minutes_since_midnight(), 545);
        assert_eq!(t("23:59").hour(), 23);
        assert_eq!(t("23:59").minute(), 59);
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        for bad in ["9:00", "24:00", "12:60", "12-30", "1230", "", "ab:cd", "12:3", " 12:30", "12:30:00"] {
            assert!(
                matches!(TimeOfDay::parse(bad), Err(ScheduleError::InvalidFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        assert_eq!(t("07:30").to_string(), "07:30");
        assert_eq!("18:00".parse::<TimeOfDay>().unwrap(), t("18:00"));
    }

    #[test]
    fn test_add_minutes_does_not_wrap() {
        assert_eq!(t("09:00").add_minutes(30), Some(t("09:30")));
        assert_eq!(t("23:30").add_minutes(29), Some(t("23:59")));
        assert_eq!(t("23:30").add_minutes(30), None);
        assert_eq!(t("12:00").add_minutes(u32::MAX), None);
    }

    #[test]
    fn test_overlaps_is_half_open() {
        assert!(!overlaps(t("12:30"), t("13:00"), t("13:00"), t("14:00")));
        assert!(overlaps(t("12:45"), t("13:15"), t("13:00"), t("14:00")));
        assert!(overlaps(t("13:00"), t("14:00"), t("12:00"), t("15:00")));
        assert!(!overlaps(t("14:00"), t("14:30"), t("13:00"), t("14:00")));
    }

    #[test]
    fn test_minute_span() {
        assert!(MinuteSpan::new(10, 10).is_none());
        assert!(MinuteSpan::new(0, MINUTES_PER_DAY + 1).is_none());
        assert_eq!(MinuteSpan::whole_day().len(), MINUTES_PER_DAY);
        let morning = MinuteSpan::between(t("09:00"), t("12:00")).unwrap();
        assert!(morning.overlaps(&MinuteSpan::new(600, 660).unwrap()));
        assert!(!morning.overlaps(&MinuteSpan::new(720, 780).unwrap()));
        assert!(MinuteSpan::between(t("12:00"), t("09:00")).is_none());
    }

    #[test]
    fn test_serde_uses_hh_mm() {
        let json = serde_json::to_string(&t("08:15")).unwrap();
        assert_eq!(json, "\"08:15\"");
        let back: TimeOfDay = serde_json::from_str("\"16:45\"").unwrap();
        assert_eq!(back, t("16:45"));
        assert!(serde_json::from_str::<TimeOfDay>("\"16:4\"").is_err());
    }

    #[test]
    fn test_parse_date_and_weekday() {
        assert_eq!(
            parse_date("2025-01-10").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
        assert!(matches!(parse_date("2025-13-01"), Err(ScheduleError::InvalidFormat(_))));
        assert!(parse_date("10.01.2025").is_err());
        assert_eq!(parse_weekday("Monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("wed").unwrap(), Weekday::Wed);
        assert!(parse_weekday("Funday").is_err());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Days {
        #[serde(with = "weekday_names")]
        days: Vec<Weekday>,
    }

    #[test]
    fn test_weekdays_written_as_full_names() {
        let days = Days {
            days: vec![Weekday::Mon, Weekday::Sat, Weekday::Sun],
        };
        assert_eq!(
            serde_json::to_string(&days).unwrap(),
            r#"{"days":["Monday","Saturday","Sunday"]}"#
        );

        let read: Days = serde_json::from_str(r#"{"days":["Mon","wednesday","FRIDAY"]}"#).unwrap();
        assert_eq!(read.days, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert!(serde_json::from_str::<Days>(r#"{"days":["Someday"]}"#).is_err());
    }

    #[test]
    fn test_naive_time_conversion_drops_seconds() {
        let naive = NaiveTime::from_hms_opt(10, 15, 42).unwrap();
        assert_eq!(TimeOfDay::from_naive_time(naive), t("10:15"));
        assert_eq!(t("10:15").to_naive_time(), NaiveTime::from_hms_opt(10, 15, 0).unwrap());
    }
}

//! US/Eastern and US/Pacific wall-clock conversion for provider timestamps.
//!
//! Alpha Vantage reports intraday bars in US/Eastern local time without an
//! offset. Both zones follow the post-2007 US daylight-saving rule: DST starts
//! on the second Sunday of March and ends on the first Sunday of November, at
//! 02:00 local time. Ambiguous and non-existent local times resolve to
//! standard time.

use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, Weekday};

use crate::domain::models::MarketStatus;

/// A US time zone described by its standard offset and abbreviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsTimeZone {
    standard_offset_hours: i8,
    standard_abbrev: &'static str,
    daylight_abbrev: &'static str,
}

pub const US_EASTERN: UsTimeZone = UsTimeZone {
    standard_offset_hours: -5,
    standard_abbrev: "EST",
    daylight_abbrev: "EDT",
};

pub const US_PACIFIC: UsTimeZone = UsTimeZone {
    standard_offset_hours: -8,
    standard_abbrev: "PST",
    daylight_abbrev: "PDT",
};

/// Wall-clock time in a US zone together with its abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedTime {
    pub local: OffsetDateTime,
    pub abbrev: &'static str,
}

impl ZonedTime {
    /// `YYYY-MM-DD HH:MM:SS ABBR`
    pub fn format(&self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let stamp = self
            .local
            .format(&format)
            .unwrap_or_else(|_| self.local.unix_timestamp().to_string());
        format!("{stamp} {}", self.abbrev)
    }
}

impl UsTimeZone {
    fn offset(self, daylight: bool) -> UtcOffset {
        let hours = self.standard_offset_hours + i8::from(daylight);
        UtcOffset::from_hms(hours, 0, 0).unwrap_or(UtcOffset::UTC)
    }

    fn abbrev(self, daylight: bool) -> &'static str {
        if daylight {
            self.daylight_abbrev
        } else {
            self.standard_abbrev
        }
    }

    /// Attach this zone's offset to a naive local time.
    pub fn localize(self, naive: PrimitiveDateTime) -> ZonedTime {
        let year = naive.year();
        // Local 02:00-03:00 in March does not exist and local 01:00-02:00 in
        // November happens twice; both resolve to standard time.
        let starts = PrimitiveDateTime::new(dst_start_date(year), hour(3));
        let ends = PrimitiveDateTime::new(dst_end_date(year), hour(1));
        let daylight = naive >= starts && naive < ends;
        ZonedTime {
            local: naive.assume_offset(self.offset(daylight)),
            abbrev: self.abbrev(daylight),
        }
    }

    /// Convert an instant into this zone's wall-clock time.
    pub fn from_instant(self, instant: OffsetDateTime) -> ZonedTime {
        let utc = instant.to_offset(UtcOffset::UTC);
        let year = utc.year();
        let standard = Duration::hours(i64::from(self.standard_offset_hours));
        // Transitions happen at 02:00 local: standard time in March,
        // daylight time in November.
        let starts = PrimitiveDateTime::new(dst_start_date(year), hour(2)).assume_utc() - standard;
        let ends = PrimitiveDateTime::new(dst_end_date(year), hour(2)).assume_utc()
            - standard
            - Duration::hours(1);
        let daylight = utc >= starts && utc < ends;
        ZonedTime {
            local: utc.to_offset(self.offset(daylight)),
            abbrev: self.abbrev(daylight),
        }
    }
}

/// Parse an Alpha Vantage bar key (`YYYY-MM-DD HH:MM:SS`, US/Eastern).
pub fn parse_eastern(raw: &str) -> Option<ZonedTime> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw.trim(), &format)
        .ok()
        .map(|naive| US_EASTERN.localize(naive))
}

/// Open on weekdays between 06:00 and 13:59 Pacific (09:30-16:00 Eastern,
/// rounded to the hour).
pub fn market_status(pacific: &ZonedTime) -> MarketStatus {
    let local = pacific.local;
    let weekend = matches!(local.weekday(), Weekday::Saturday | Weekday::Sunday);
    if !weekend && (6..=13).contains(&local.hour()) {
        MarketStatus::Open
    } else {
        MarketStatus::Closed
    }
}

fn hour(value: u8) -> Time {
    Time::from_hms(value, 0, 0).unwrap_or(Time::MIDNIGHT)
}

fn nth_sunday(year: i32, month: Month, nth: u8) -> Date {
    let first = Date::from_calendar_date(year, month, 1).unwrap_or(Date::MIN);
    let to_sunday = (7 - first.weekday().number_days_from_sunday()) % 7;
    first + Duration::days(i64::from(to_sunday) + 7 * i64::from(nth - 1))
}

fn dst_start_date(year: i32) -> Date {
    nth_sunday(year, Month::March, 2)
}

fn dst_end_date(year: i32) -> Date {
    nth_sunday(year, Month::November, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eastern_to_pacific(raw: &str) -> String {
        let eastern = parse_eastern(raw).expect("valid timestamp");
        US_PACIFIC.from_instant(eastern.local).format()
    }

    #[test]
    fn finds_transition_sundays() {
        assert_eq!(
            dst_start_date(2024),
            Date::from_calendar_date(2024, Month::March, 10).expect("date")
        );
        assert_eq!(
            dst_end_date(2024),
            Date::from_calendar_date(2024, Month::November, 3).expect("date")
        );
        assert_eq!(
            dst_start_date(2026),
            Date::from_calendar_date(2026, Month::March, 8).expect("date")
        );
    }

    #[test]
    fn winter_times_use_standard_offsets() {
        assert_eq!(eastern_to_pacific("2024-01-05 16:00:00"), "2024-01-05 13:00:00 PST");
    }

    #[test]
    fn summer_times_use_daylight_offsets() {
        assert_eq!(eastern_to_pacific("2024-07-01 09:30:00"), "2024-07-01 06:30:00 PDT");
    }

    #[test]
    fn eastern_abbreviation_follows_dst() {
        assert_eq!(parse_eastern("2024-03-10 03:00:00").expect("ts").abbrev, "EDT");
        assert_eq!(parse_eastern("2024-03-10 01:59:00").expect("ts").abbrev, "EST");
        assert_eq!(parse_eastern("2024-11-03 01:30:00").expect("ts").abbrev, "EST");
    }

    #[test]
    fn pacific_switches_three_hours_after_eastern() {
        // 07:30 UTC on the spring-forward Sunday: Eastern already on EDT,
        // Pacific still on PST.
        assert_eq!(eastern_to_pacific("2024-03-10 03:30:00"), "2024-03-09 23:30:00 PST");
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(parse_eastern("2024-01-05T16:00:00Z").is_none());
        assert!(parse_eastern("yesterday").is_none());
    }

    #[test]
    fn market_status_follows_weekday_and_hour() {
        let friday_close = US_PACIFIC.from_instant(parse_eastern("2024-01-05 16:00:00").expect("ts").local);
        assert_eq!(market_status(&friday_close), MarketStatus::Open);

        let friday_evening = US_PACIFIC.from_instant(parse_eastern("2024-01-05 18:00:00").expect("ts").local);
        assert_eq!(market_status(&friday_evening), MarketStatus::Closed);

        let saturday = US_PACIFIC.from_instant(parse_eastern("2024-01-06 12:00:00").expect("ts").local);
        assert_eq!(market_status(&saturday), MarketStatus::Closed);
    }
}

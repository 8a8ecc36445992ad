//! Textual timestamps as stored in the snapshot.
//!
//! Values live in TEXT cells in a handful of shapes (`2024-04-30 09:20:00-04:00`,
//! `2023-01-05T00:00:00Z`, `2024-04-28 17:30:00.000000`). A parsed value keeps
//! its [`TimestampLayout`] so the shifted value is written back in the same shape.

use std::fmt;

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike,
    Utc,
};

/// An instant with a fixed UTC offset, or a wall-clock reading with none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

/// How the zone was spelled in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneStyle {
    None,
    Zulu,
    Offset,
}

/// Textual shape of a parsed timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampLayout {
    /// `' '` or `'T'` between date and time.
    pub separator: char,
    /// Digits after the decimal point, 0 when absent.
    pub frac_digits: u8,
    pub zone: ZoneStyle,
}

impl Default for TimestampLayout {
    fn default() -> Self {
        Self {
            separator: ' ',
            frac_digits: 0,
            zone: ZoneStyle::None,
        }
    }
}

impl Timestamp {
    /// Parse a snapshot timestamp. Returns `None` for anything unrecognised.
    pub fn parse(raw: &str) -> Option<(Timestamp, TimestampLayout)> {
        let s = raw.trim();
        if !s.is_ascii() || s.len() < 10 {
            return None;
        }

        let (body, zone) = split_zone(s)?;
        let date = NaiveDate::parse_from_str(body.get(..10)?, "%Y-%m-%d").ok()?;

        let mut layout = TimestampLayout::default();
        let time = if body.len() == 10 {
            NaiveTime::from_hms_opt(0, 0, 0)?
        } else {
            layout.separator = match body.as_bytes()[10] {
                b' ' => ' ',
                b'T' | b't' => 'T',
                _ => return None,
            };
            let time_str = &body[11..];
            if let Some(dot) = time_str.find('.') {
                layout.frac_digits = u8::try_from(time_str.len() - dot - 1).ok()?;
            }
            NaiveTime::parse_from_str(time_str, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(time_str, "%H:%M"))
                .ok()?
        };
        let naive = NaiveDateTime::new(date, time);

        let value = match zone {
            Some((style, offset)) => {
                layout.zone = style;
                Timestamp::Zoned(offset.from_local_datetime(&naive).single()?)
            }
            None => Timestamp::Naive(naive),
        };
        Some((value, layout))
    }

    /// Render in the given layout.
    pub fn render(&self, layout: &TimestampLayout) -> String {
        let naive = self.wall_clock();
        // Stored precision is kept only when it represents the value exactly.
        let nanos = naive.nanosecond();
        let frac = match layout.frac_digits {
            0 if nanos == 0 => "",
            3 if nanos % 1_000_000 == 0 => "%.3f",
            6 if nanos % 1_000 == 0 => "%.6f",
            9 => "%.9f",
            _ => "%.f",
        };
        let fmt = format!("%Y-%m-%d{}%H:%M:%S{}", layout.separator, frac);
        let mut out = naive.format(&fmt).to_string();

        if let Timestamp::Zoned(dt) = self {
            if layout.zone == ZoneStyle::Zulu && dt.offset().local_minus_utc() == 0 {
                out.push('Z');
            } else {
                out.push_str(&dt.format("%:z").to_string());
            }
        }
        out
    }

    /// Local wall-clock reading, ignoring any zone.
    pub fn wall_clock(&self) -> NaiveDateTime {
        match self {
            Timestamp::Zoned(dt) => dt.naive_local(),
            Timestamp::Naive(n) => *n,
        }
    }

    pub fn is_zoned(&self) -> bool {
        matches!(self, Timestamp::Zoned(_))
    }

    /// `self + delta`, `None` when the result leaves chrono's range.
    pub fn checked_add(&self, delta: TimeDelta) -> Option<Timestamp> {
        match self {
            Timestamp::Zoned(dt) => dt.checked_add_signed(delta).map(Timestamp::Zoned),
            Timestamp::Naive(n) => n.checked_add_signed(delta).map(Timestamp::Naive),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Zoned(dt.fixed_offset())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Zoned(dt) => write!(f, "{}", dt.to_rfc3339()),
            Timestamp::Naive(n) => write!(f, "{}", n.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

/// Split a trailing `Z` / `±HH[:MM]` zone off the time part.
fn split_zone(s: &str) -> Option<(&str, Option<(ZoneStyle, FixedOffset)>)> {
    if s.ends_with('Z') || s.ends_with('z') {
        let utc = FixedOffset::east_opt(0)?;
        return Some((&s[..s.len() - 1], Some((ZoneStyle::Zulu, utc))));
    }
    // Hyphens inside the date part are not zone signs.
    match s[10..].rfind(['+', '-']) {
        Some(i) => {
            let at = 10 + i;
            let offset = parse_offset(&s[at..])?;
            Some((&s[..at], Some((ZoneStyle::Offset, offset))))
        }
        None => Some((s, None)),
    }
}

fn parse_offset(tz: &str) -> Option<FixedOffset> {
    let sign = match tz.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let rest = &tz[1..];
    let (hh, mm) = match rest.len() {
        2 => (rest, "00"),
        4 => (&rest[..2], &rest[2..]),
        5 if rest.as_bytes()[2] == b':' => (&rest[..2], &rest[3..]),
        _ => return None,
    };
    if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hh.parse().ok()?;
    let minutes: i32 = mm.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offset_with_microseconds() {
        let (ts, layout) = Timestamp::parse("2024-04-30 09:20:00.000000-04:00").unwrap();
        assert!(ts.is_zoned());
        assert_eq!(layout.separator, ' ');
        assert_eq!(layout.frac_digits, 6);
        assert_eq!(layout.zone, ZoneStyle::Offset);
        assert_eq!(ts.render(&layout), "2024-04-30 09:20:00.000000-04:00");
    }

    #[test]
    fn parses_zulu_rfc3339() {
        let (ts, layout) = Timestamp::parse("2023-01-05T00:00:00Z").unwrap();
        assert_eq!(layout.zone, ZoneStyle::Zulu);
        assert_eq!(ts.to_string(), "2023-01-05T00:00:00+00:00");
        assert_eq!(ts.render(&layout), "2023-01-05T00:00:00Z");
    }

    #[test]
    fn parses_naive_and_date_only() {
        let (ts, layout) = Timestamp::parse("2024-04-28 17:30:00").unwrap();
        assert!(!ts.is_zoned());
        assert_eq!(ts.render(&layout), "2024-04-28 17:30:00");

        let (ts, layout) = Timestamp::parse("2024-04-28").unwrap();
        assert_eq!(ts.render(&layout), "2024-04-28 00:00:00");
    }

    #[test]
    fn compact_offsets() {
        let (a, _) = Timestamp::parse("2024-01-01 12:00:00+0530").unwrap();
        let (b, _) = Timestamp::parse("2024-01-01 06:30:00Z").unwrap();
        match (a, b) {
            (Timestamp::Zoned(a), Timestamp::Zoned(b)) => assert_eq!(a, b),
            _ => panic!("both should be zoned"),
        }
        assert!(Timestamp::parse("2024-01-01 12:00:00+05").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse("").is_none());
        assert!(Timestamp::parse("yesterday").is_none());
        assert!(Timestamp::parse("2024-13-01 00:00:00").is_none());
        assert!(Timestamp::parse("2024-01-01 00:00:00+25:00").is_none());
        assert!(Timestamp::parse("2024-01-01X00:00:00").is_none());
    }

    #[test]
    fn shift_keeps_offset_and_layout() {
        let (ts, layout) = Timestamp::parse("2024-04-30 09:20:00-04:00").unwrap();
        let shifted = ts.checked_add(TimeDelta::days(2)).unwrap();
        assert_eq!(shifted.render(&layout), "2024-05-02 09:20:00-04:00");
    }

    #[test]
    fn finer_shift_widens_stored_precision() {
        let (ts, layout) = Timestamp::parse("2022-12-25 00:00:00.000+00:00").unwrap();
        let shifted = ts.checked_add(TimeDelta::microseconds(-1)).unwrap();
        assert_eq!(shifted.render(&layout), "2022-12-24 23:59:59.999999+00:00");

        let (ts, layout) = Timestamp::parse("2022-12-25 00:00:00.000000").unwrap();
        let shifted = ts.checked_add(TimeDelta::nanoseconds(5)).unwrap();
        assert_eq!(shifted.render(&layout), "2022-12-25 00:00:00.000000005");

        let shifted = ts.checked_add(TimeDelta::milliseconds(5)).unwrap();
        assert_eq!(shifted.render(&layout), "2022-12-25 00:00:00.005000");
    }

    #[test]
    fn subsecond_shift_is_not_truncated() {
        let (ts, layout) = Timestamp::parse("2024-04-30 09:20:00").unwrap();
        let shifted = ts.checked_add(TimeDelta::milliseconds(250)).unwrap();
        assert_eq!(shifted.render(&layout), "2024-04-30 09:20:00.250");
    }
}

//! Schedule grammar: `"<anchor>/<duration>"` strings.
//!
//! The anchor is either an absolute UTC timestamp (`2020-04-02T17:00:00Z`)
//! or a civil timestamp with a bracketed IANA zone identifier
//! (`2020-04-02T17:00:00[America/Chicago]`). Numeric UTC offsets are
//! rejected in both positions: an offset is redundant next to a zone and
//! ambiguous without one, and a fixed offset silently shifts the wall-clock
//! time once a DST transition passes.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

use crate::error::{MeetbotError, MeetbotResult};
use crate::occurrence::{next_occurrence, resolve_local};

const GUIDANCE: &str = "use either a timezone identifier (e.g., 2020-04-02T17:00:00[America/Chicago]) or UTC (e.g., 2020-04-02T17:00:00Z)";

static OFFSET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[+-]\d{2}:?\d{2}").unwrap());

/// A calendar-relative repeat period.
///
/// Month and day components are kept apart from the time component so that
/// addition can happen at the civil level: adding a month lands on the same
/// day-of-month, and adding days across a DST boundary preserves the local
/// wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub months: u32,
    pub days: u32,
    pub seconds: u64,
}

impl Period {
    /// A period of whole days.
    pub const fn from_days(days: u32) -> Self {
        Period {
            months: 0,
            days,
            seconds: 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.seconds == 0
    }

    /// Parse an ISO-8601 duration (`P28D`, `P2W`, `PT90M`, ...).
    ///
    /// Zero-length durations are rejected: a schedule that never advances
    /// would make the occurrence search loop forever.
    pub fn parse(input: &str) -> MeetbotResult<Self> {
        let parsed = iso8601::duration(input)
            .map_err(|_| MeetbotError::InvalidDuration(format!("'{input}'")))?;

        let period = match parsed {
            iso8601::Duration::YMDHMS {
                year,
                month,
                day,
                hour,
                minute,
                second,
                millisecond,
            } => {
                if millisecond != 0 {
                    return Err(MeetbotError::InvalidDuration(format!(
                        "'{input}': sub-second periods are not supported"
                    )));
                }
                Period {
                    months: year * 12 + month,
                    days: day,
                    seconds: u64::from(hour) * 3600 + u64::from(minute) * 60 + u64::from(second),
                }
            }
            iso8601::Duration::Weeks(weeks) => Period::from_days(weeks * 7),
        };

        if period.is_zero() {
            return Err(MeetbotError::InvalidDuration(format!(
                "'{input}': period must be positive"
            )));
        }

        Ok(period)
    }
}

/// A parsed recurrence schedule: an unambiguous anchor instant, the zone
/// calendar arithmetic happens in, and the repeat period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub anchor: DateTime<Utc>,
    pub timezone: Tz,
    pub period: Period,
}

impl Schedule {
    /// Parse a schedule string of the form `"<anchor>/<duration>"`.
    ///
    /// The split is on the *last* `/` because IANA zone identifiers
    /// contain slashes.
    pub fn parse(input: &str) -> MeetbotResult<Self> {
        let (anchor_str, duration_str) = match input.rfind('/') {
            Some(idx) => (&input[..idx], &input[idx + 1..]),
            None => {
                return Err(MeetbotError::InvalidDuration(format!(
                    "'{input}': missing '/<duration>' segment"
                )))
            }
        };

        let period = Period::parse(duration_str)?;
        let (anchor, timezone) = parse_anchor(anchor_str)?;

        Ok(Schedule {
            anchor,
            timezone,
            period,
        })
    }

    /// The explicit fallback schedule: weekly, anchored at the supplied
    /// "now" in UTC.
    pub fn default_weekly(now: DateTime<Utc>) -> Self {
        Schedule {
            anchor: now,
            timezone: Tz::UTC,
            period: Period::from_days(7),
        }
    }
}

/// Parse the anchor part into an absolute instant plus the zone to do
/// calendar arithmetic in.
fn parse_anchor(anchor: &str) -> MeetbotResult<(DateTime<Utc>, Tz)> {
    if OFFSET_RE.is_match(anchor) {
        return Err(MeetbotError::ScheduleFormat(format!(
            "'{anchor}': offset usage is not allowed because it's ambiguous. {GUIDANCE}"
        )));
    }

    if let Some(open) = anchor.find('[') {
        let rest = &anchor[open + 1..];
        let close = rest.find(']').ok_or_else(|| {
            MeetbotError::ScheduleFormat(format!(
                "'{anchor}': unterminated timezone bracket. {GUIDANCE}"
            ))
        })?;
        if !rest[close + 1..].is_empty() {
            return Err(MeetbotError::ScheduleFormat(format!(
                "'{anchor}': unexpected text after the timezone bracket. {GUIDANCE}"
            )));
        }

        let zone_id = &rest[..close];
        let timezone = Tz::from_str(zone_id).map_err(|_| {
            MeetbotError::ScheduleFormat(format!(
                "'{anchor}': unknown timezone '{zone_id}'. {GUIDANCE}"
            ))
        })?;

        let civil = parse_civil(&anchor[..open])
            .ok_or_else(|| MeetbotError::ScheduleFormat(format!("'{anchor}': {GUIDANCE}")))?;
        let resolved = resolve_local(timezone, civil);
        return Ok((resolved.with_timezone(&Utc), timezone));
    }

    if let Some(civil_str) = anchor.strip_suffix('Z') {
        let civil = parse_civil(civil_str)
            .ok_or_else(|| MeetbotError::ScheduleFormat(format!("'{anchor}': {GUIDANCE}")))?;
        return Ok((Utc.from_utc_datetime(&civil), Tz::UTC));
    }

    Err(MeetbotError::ScheduleFormat(format!(
        "'{anchor}': {GUIDANCE}"
    )))
}

/// Parse a civil (wall-clock) date-time; seconds and fractional seconds
/// are optional.
fn parse_civil(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Resolve the next meeting instant across all configured schedules: each
/// schedule advances independently and the earliest result wins (ties keep
/// the first).
///
/// Empty entries (and an empty collection) fall back to
/// [`Schedule::default_weekly`]. Any malformed entry fails the whole
/// resolution with that entry's error.
pub fn next_scheduled_meeting<S: AsRef<str>>(
    schedules: &[S],
    now: DateTime<Utc>,
) -> MeetbotResult<DateTime<Utc>> {
    let mut earliest: Option<DateTime<Utc>> = None;

    for entry in schedules {
        let entry = entry.as_ref().trim();
        let schedule = if entry.is_empty() {
            Schedule::default_weekly(now)
        } else {
            Schedule::parse(entry)?
        };
        let occurrence = next_occurrence(&schedule, now)?;
        if earliest.map_or(true, |e| occurrence < e) {
            earliest = Some(occurrence);
        }
    }

    match earliest {
        Some(instant) => Ok(instant),
        None => next_occurrence(&Schedule::default_weekly(now), now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn parses_utc_anchor() {
        let schedule = Schedule::parse("2020-04-02T17:00:00Z/P28D").unwrap();
        assert_eq!(schedule.anchor, utc("2020-04-02T17:00:00Z"));
        assert_eq!(schedule.timezone, Tz::UTC);
        assert_eq!(schedule.period, Period::from_days(28));
    }

    #[test]
    fn parses_utc_anchor_with_fractional_seconds() {
        let schedule = Schedule::parse("2020-04-02T17:00:00.0Z/P28D").unwrap();
        assert_eq!(schedule.anchor, utc("2020-04-02T17:00:00Z"));
    }

    #[test]
    fn parses_zoned_anchor() {
        let schedule = Schedule::parse("2020-04-02T17:00:00[America/Chicago]/P28D").unwrap();
        // 17:00 CDT (UTC-5) on April 2
        assert_eq!(schedule.anchor, utc("2020-04-02T22:00:00Z"));
        assert_eq!(schedule.timezone, chrono_tz::America::Chicago);
    }

    #[test]
    fn parses_weeks_duration() {
        let schedule = Schedule::parse("2020-04-02T17:00:00Z/P2W").unwrap();
        assert_eq!(schedule.period, Period::from_days(14));
    }

    #[test]
    fn rejects_offset_anchor() {
        let err = Schedule::parse("2020-04-02T17:00:00-06:00/P7D").unwrap_err();
        assert!(matches!(err, MeetbotError::ScheduleFormat(_)));
        assert!(err.to_string().contains("offset"));
    }

    #[test]
    fn rejects_offset_even_with_bracketed_zone() {
        let err = Schedule::parse("2020-04-02T17:00:00-0600[America/Chicago]/P7D").unwrap_err();
        assert!(matches!(err, MeetbotError::ScheduleFormat(_)));
    }

    #[test]
    fn rejects_anchor_without_zone_or_utc() {
        let err = Schedule::parse("2020-04-02T17:00:00/P7D").unwrap_err();
        assert!(err.to_string().contains("timezone identifier"));
    }

    #[test]
    fn rejects_unterminated_bracket() {
        let err = Schedule::parse("2020-04-02T17:00:00[America/Chicago/P7D").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let err = Schedule::parse("2020-04-02T17:00:00[America/Gotham]/P7D").unwrap_err();
        assert!(err.to_string().contains("America/Gotham"));
    }

    #[test]
    fn rejects_missing_duration() {
        assert!(matches!(
            Schedule::parse("2020-04-02T17:00:00Z").unwrap_err(),
            MeetbotError::InvalidDuration(_)
        ));
        assert!(matches!(
            Schedule::parse("2020-04-02T17:00:00Z/").unwrap_err(),
            MeetbotError::InvalidDuration(_)
        ));
    }

    #[test]
    fn rejects_zero_duration() {
        assert!(matches!(
            Schedule::parse("2020-04-02T17:00:00Z/P0D").unwrap_err(),
            MeetbotError::InvalidDuration(_)
        ));
        assert!(matches!(
            Schedule::parse("2020-04-02T17:00:00Z/PT0S").unwrap_err(),
            MeetbotError::InvalidDuration(_)
        ));
    }

    #[test]
    fn fall_back_local_time_resolves_to_earlier_instant() {
        // 01:30 happens twice on 2024-11-03 in Chicago; the earlier (CDT,
        // UTC-5) reading wins.
        let schedule = Schedule::parse("2024-11-03T01:30:00[America/Chicago]/P7D").unwrap();
        assert_eq!(schedule.anchor, utc("2024-11-03T06:30:00Z"));
    }

    #[test]
    fn earliest_schedule_wins() {
        // 5pm GMT April 2 every 28 days, and 1pm GMT April 16 every 28 days
        let next = next_scheduled_meeting(
            &[
                "2020-04-02T17:00:00.0Z/P28D",
                "2020-04-16T13:00:00.0Z/P28D",
            ],
            utc("2020-04-03T13:00:00Z"),
        )
        .unwrap();
        assert_eq!(next, utc("2020-04-16T13:00:00Z"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let schedules = ["2024-03-10T13:00:00Z/P7D", "2024-11-03T13:00:00Z/P7D"];
        let now = utc("2024-03-09T13:00:00Z");
        assert_eq!(
            next_scheduled_meeting(&schedules, now).unwrap(),
            next_scheduled_meeting(&schedules, now).unwrap()
        );
        assert_eq!(
            next_scheduled_meeting(&schedules, now).unwrap(),
            utc("2024-03-10T13:00:00Z")
        );
    }

    #[test]
    fn empty_collection_falls_back_to_weekly() {
        let now = utc("2020-04-03T13:00:00Z");
        let empty: [&str; 0] = [];
        assert_eq!(
            next_scheduled_meeting(&empty, now).unwrap(),
            utc("2020-04-10T13:00:00Z")
        );
    }

    #[test]
    fn empty_entry_falls_back_to_weekly() {
        let now = utc("2020-04-03T13:00:00Z");
        assert_eq!(
            next_scheduled_meeting(&[""], now).unwrap(),
            utc("2020-04-10T13:00:00Z")
        );
    }

    #[test]
    fn malformed_entry_fails_the_whole_resolution() {
        let err = next_scheduled_meeting(
            &["2020-04-02T17:00:00Z/P28D", "2020-04-16T13:00:00/P28D"],
            utc("2020-04-03T13:00:00Z"),
        )
        .unwrap_err();
        assert!(matches!(err, MeetbotError::ScheduleFormat(_)));
    }
}

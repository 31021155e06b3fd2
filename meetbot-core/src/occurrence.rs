//! Occurrence advancement: stepping a schedule forward in its own zone.
//!
//! Adding a period happens at the civil (wall-clock) level, not in absolute
//! time: "two weeks later" across a spring-forward transition is 13 days and
//! 23 hours of absolute time but the same local hour. Local times that a
//! transition skipped or repeated resolve with the zone database's
//! "compatible" normalization.

use chrono::{DateTime, Days, Duration, LocalResult, Months, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{MeetbotError, MeetbotResult};
use crate::schedule::{Period, Schedule};

/// First occurrence of `schedule` strictly after `now`.
///
/// The anchor itself is returned when it is still in the future; otherwise
/// the anchor advances by whole periods until it passes `now`. The period
/// must be positive: the parser guarantees this for parsed schedules, and
/// a hand-built zero period is rejected here rather than spinning forever.
pub fn next_occurrence(schedule: &Schedule, now: DateTime<Utc>) -> MeetbotResult<DateTime<Utc>> {
    if schedule.period.is_zero() {
        return Err(MeetbotError::InvalidDuration(
            "period must be positive".to_string(),
        ));
    }

    let mut next = schedule.anchor;
    while next <= now {
        next = add_period(next, schedule.timezone, &schedule.period);
    }
    Ok(next)
}

/// Add one period to `instant`, calendar-relative in `tz`.
///
/// Month and day components are added to the civil date-time and the result
/// resolved back to an instant; the time component is then added as exact
/// seconds, so a `PT1H` period crosses a transition by absolute time. A
/// pure-time period never goes through civil time at all; re-resolving a
/// repeated fall-back hour could otherwise undo the step.
pub fn add_period(instant: DateTime<Utc>, tz: Tz, period: &Period) -> DateTime<Utc> {
    let mut advanced = instant;
    if period.months != 0 || period.days != 0 {
        let civil = instant.with_timezone(&tz).naive_local();
        let civil = civil + Months::new(period.months) + Days::new(u64::from(period.days));
        advanced = resolve_local(tz, civil).with_timezone(&Utc);
    }
    advanced + Duration::seconds(period.seconds as i64)
}

/// Resolve a civil date-time in `tz` to an absolute instant.
///
/// A local time repeated by a fall-back transition resolves to the earlier
/// instant; a local time skipped by a spring-forward transition shifts
/// forward by the width of the gap. Both match the "compatible"
/// normalization the zone database defines for zoned arithmetic.
pub(crate) fn resolve_local(tz: Tz, civil: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&civil) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => {
            // Skipped hour. Interpreting the civil time with the offset in
            // force before the transition lands past the gap by exactly its
            // width: 02:30 in a 02:00→03:00 gap becomes 03:30.
            let before = tz
                .offset_from_utc_datetime(&(civil - Duration::hours(24)))
                .fix();
            let utc = civil - Duration::seconds(i64::from(before.local_minus_utc()));
            tz.from_utc_datetime(&utc)
        }
    }
}

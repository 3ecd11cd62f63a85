//! Whole-second calendar arithmetic built on `chrono` and `chrono-tz`.
//!
//! Everything in this module works at whole-second granularity. The
//! sub-second part of an instant is owned by [`InstantMs`](crate::InstantMs)
//! and never reaches these functions: instants handed in and returned here
//! carry zero nanoseconds.
//!
//! # Functions
//!
//! - [`parse`] — free-form date/time text → instant + its sub-second reading
//! - [`relative_modify`] — apply a relative expression ("+1 day", "tomorrow")
//! - [`add_seconds`] / [`add_duration`] — shift an instant
//! - [`diff_calendar`] — calendar-field difference between two instants
//! - [`compare_calendar`] — whole-second ordering
//! - [`parse_from_format`] — text read with an explicit chrono pattern
//! - [`format::format_datetime`] / [`format::format_duration`] — pattern rendering

pub mod format;
pub mod text;

use std::cmp::Ordering;

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{Result, TimeError};

// ── Parse options ───────────────────────────────────────────────────────────

/// Options for [`parse`].
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Timezone the parsed instant is expressed in. Text that names its own
    /// offset or zone is converted into this one.
    pub timezone: Tz,
    /// The reference "now". `None` reads the system clock at parse time.
    pub anchor: Option<DateTime<Utc>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            anchor: None,
        }
    }
}

impl ParseOptions {
    /// Use the IANA timezone `name` for parsing.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidTimezone`] if `name` is not a known zone.
    pub fn with_timezone(mut self, name: &str) -> Result<Self> {
        self.timezone = parse_timezone(name)?;
        Ok(self)
    }

    /// Pin "now" to a fixed instant.
    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// The anchor expressed in the configured timezone, sub-seconds kept.
    pub(crate) fn anchor(&self) -> DateTime<Tz> {
        self.anchor
            .unwrap_or_else(Utc::now)
            .with_timezone(&self.timezone)
    }
}

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TimeError::InvalidTimezone(format!("'{}'", name)))
}

// ── CalendarDuration ────────────────────────────────────────────────────────

/// A calendar duration at whole-second granularity.
///
/// Fields are never negative; the sign lives in `invert`. `total_days` is
/// only known for durations produced by [`diff_calendar`] and is ignored by
/// equality.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CalendarDuration {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    /// The duration is negative.
    pub invert: bool,
    /// Whole days between the two instants of a diff.
    pub total_days: Option<i64>,
}

impl PartialEq for CalendarDuration {
    fn eq(&self, other: &Self) -> bool {
        self.years == other.years
            && self.months == other.months
            && self.days == other.days
            && self.hours == other.hours
            && self.minutes == other.minutes
            && self.seconds == other.seconds
            && self.invert == other.invert
    }
}

impl Eq for CalendarDuration {}

impl CalendarDuration {
    /// The zero duration.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Parse an integer-only ISO 8601 duration: `P[nY][nM][nW][nD][T[nH][nM][nS]]`.
    ///
    /// The empty string is accepted as the zero duration.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::MalformedSpec`] for anything else that does not
    /// match, including a fractional seconds field.
    pub fn from_spec(spec: &str) -> Result<Self> {
        if spec.is_empty() {
            return Ok(Self::zero());
        }
        let malformed = || TimeError::MalformedSpec(spec.to_string());
        let bytes = spec.as_bytes();
        if bytes[0] != b'P' {
            return Err(malformed());
        }

        let mut duration = Self::zero();
        let mut pos = 1;
        let mut weeks = 0u32;

        let mut date_slots: [(u8, Option<&mut u32>); 4] = [
            (b'Y', Some(&mut duration.years)),
            (b'M', Some(&mut duration.months)),
            (b'W', Some(&mut weeks)),
            (b'D', Some(&mut duration.days)),
        ];
        pos = scan_integer_fields(bytes, pos, &mut date_slots).ok_or_else(malformed)?;

        if pos < bytes.len() && bytes[pos] == b'T' {
            pos += 1;
            let start = pos;
            let mut time_slots: [(u8, Option<&mut u32>); 3] = [
                (b'H', Some(&mut duration.hours)),
                (b'M', Some(&mut duration.minutes)),
                (b'S', Some(&mut duration.seconds)),
            ];
            pos = scan_integer_fields(bytes, pos, &mut time_slots).ok_or_else(malformed)?;
            if pos == start {
                return Err(malformed());
            }
        }
        if pos != bytes.len() {
            return Err(malformed());
        }

        duration.days = weeks
            .checked_mul(7)
            .and_then(|d| d.checked_add(duration.days))
            .ok_or_else(malformed)?;
        Ok(duration)
    }

    /// Serialize back to `P…T…S` form. The zero duration renders as `PT0S`.
    pub fn to_spec_string(&self) -> String {
        let mut spec = String::from("P");
        push_field(&mut spec, self.years, 'Y');
        push_field(&mut spec, self.months, 'M');
        push_field(&mut spec, self.days, 'D');
        if self.hours != 0 || self.minutes != 0 || self.seconds != 0 {
            spec.push('T');
            push_field(&mut spec, self.hours, 'H');
            push_field(&mut spec, self.minutes, 'M');
            push_field(&mut spec, self.seconds, 'S');
        }
        if spec.len() == 1 {
            spec.push_str("T0S");
        }
        spec
    }

    /// True when every field is zero (the sign is irrelevant).
    pub fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0
    }

    /// Render with a `%`-placeholder pattern (see [`format::format_duration`]).
    pub fn format(&self, pattern: &str) -> String {
        format::format_duration(self, pattern)
    }

    fn signed_spec(&self) -> String {
        let sign = if self.invert { "-" } else { "" };
        format!("{sign}{}", self.to_spec_string())
    }

    fn clock_seconds(&self) -> i64 {
        self.hours as i64 * 3600 + self.minutes as i64 * 60 + self.seconds as i64
    }
}

fn push_field(spec: &mut String, value: u32, designator: char) {
    if value != 0 {
        spec.push_str(&value.to_string());
        spec.push(designator);
    }
}

/// Scan `<digits><designator>` groups in the order given by `slots`, each at
/// most once. Returns the position after the last group, or `None` on a
/// designator out of order, a number without designator, or overflow.
fn scan_integer_fields(
    bytes: &[u8],
    mut pos: usize,
    slots: &mut [(u8, Option<&mut u32>)],
) -> Option<usize> {
    let mut next_slot = 0;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let value: u32 = std::str::from_utf8(&bytes[start..pos]).ok()?.parse().ok()?;
        let designator = *bytes.get(pos)?;
        let offset = slots[next_slot..]
            .iter()
            .position(|(d, _)| *d == designator)?;
        let slot = slots[next_slot + offset].1.take()?;
        *slot = value;
        next_slot += offset + 1;
        pos += 1;
    }
    Some(pos)
}

// ── Instant arithmetic ──────────────────────────────────────────────────────

/// Parse free-form date/time text. Returns the whole-second instant and the
/// microseconds the text (or the anchor, for clock-relative text) carried.
///
/// # Errors
///
/// Returns [`TimeError::CalendarParse`] if the text cannot be understood.
pub fn parse(input: &str, options: &ParseOptions) -> Result<(DateTime<Tz>, u32)> {
    text::parse(input, options)
}

/// Apply a relative modification ("+1 day", "next month", "tomorrow noon",
/// "last friday", "12:30") to `datetime`.
///
/// # Errors
///
/// Returns [`TimeError::CalendarParse`] if the text cannot be understood.
pub fn relative_modify(datetime: &DateTime<Tz>, input: &str) -> Result<DateTime<Tz>> {
    text::modify(datetime, input)
}

/// Shift an instant by a signed number of elapsed seconds.
///
/// # Errors
///
/// Returns [`TimeError::OutOfRange`] if the result cannot be represented.
pub fn add_seconds(datetime: &DateTime<Tz>, seconds: i64) -> Result<DateTime<Tz>> {
    chrono::Duration::try_seconds(seconds)
        .and_then(|delta| datetime.checked_add_signed(delta))
        .ok_or_else(|| TimeError::OutOfRange(format!("{datetime} {seconds:+} s")))
}

/// Add a calendar duration to an instant.
///
/// A positive duration moves the wall-clock date by years and months (the
/// day is clamped to the end of a shorter month) and days, keeping the time
/// of day, then adds hours/minutes/seconds as elapsed time. An inverted
/// duration undoes that in reverse order: elapsed time first, then days,
/// then months. For a duration produced by [`diff_calendar`] the two
/// directions are exact inverses, unless the earlier instant's wall-clock
/// time is repeated or skipped on the date it is moved to.
///
/// # Errors
///
/// Returns [`TimeError::OutOfRange`] if any step leaves chrono's range.
pub fn add_duration(datetime: &DateTime<Tz>, duration: &CalendarDuration) -> Result<DateTime<Tz>> {
    let months = duration.years as i64 * 12 + duration.months as i64;
    let days = duration.days as i64;
    let clock = duration.clock_seconds();
    let out_of_range = || TimeError::OutOfRange(format!("{datetime} + {}", duration.signed_spec()));

    if !duration.invert {
        let shifted = if months != 0 || days != 0 {
            advance_date(datetime, months, days).ok_or_else(out_of_range)?
        } else {
            *datetime
        };
        return add_seconds(&shifted, clock).map_err(|_| out_of_range());
    }

    let rewound = add_seconds(datetime, -clock).map_err(|_| out_of_range())?;
    if months == 0 && days == 0 {
        return Ok(rewound);
    }
    let tz = rewound.timezone();
    let local = rewound.naive_local();
    let date = local
        .date()
        .checked_sub_signed(chrono::Duration::try_days(days).ok_or_else(out_of_range)?)
        .and_then(|date| shift_months(date, -months))
        .ok_or_else(out_of_range)?;
    Ok(resolve_local(&tz, date.and_time(local.time())))
}

/// Move the wall-clock date by whole months then days, keeping the time of day.
fn advance_date(datetime: &DateTime<Tz>, months: i64, days: i64) -> Option<DateTime<Tz>> {
    let local = datetime.naive_local();
    let date = shift_months(local.date(), months)?
        .checked_add_signed(chrono::Duration::try_days(days)?)?;
    Some(resolve_local(&datetime.timezone(), date.and_time(local.time())))
}

/// The calendar-field difference between `a` and `b`, inverted when `b` is
/// earlier.
///
/// The fields always decompose forward from the earlier instant, in the
/// earlier instant's timezone, so `diff_calendar(a, b)` and
/// `diff_calendar(b, a)` differ only in `invert`. A month step is only
/// taken when the day of month exists in the target month, so adding the
/// result to the earlier instant lands exactly on the later one, and
/// subtracting it from the later one lands back on the earlier one (see
/// [`add_duration`] for the wall-clock exception).
pub fn diff_calendar(a: &DateTime<Tz>, b: &DateTime<Tz>) -> CalendarDuration {
    let (earlier, later, invert) = if a.timestamp() <= b.timestamp() {
        (*a, *b, false)
    } else {
        (*b, *a, true)
    };
    let tz = earlier.timezone();
    let later = later.with_timezone(&tz);

    let start = earlier.naive_local();
    let end = later.naive_local();

    let mut months =
        ((end.year() - start.year()) as i64 * 12 + end.month() as i64 - start.month() as i64)
            .max(0);
    while months > 0 {
        let fits = shift_months(start.date(), months)
            .filter(|date| date.day() == start.day())
            .and_then(|_| advance_date(&earlier, months, 0))
            .is_some_and(|candidate| candidate <= later);
        if fits {
            break;
        }
        months -= 1;
    }

    let month_date = shift_months(start.date(), months).unwrap_or(start.date());
    let mut days = (end.date() - month_date).num_days().max(0);
    let mut base = if months == 0 {
        earlier
    } else {
        advance_date(&earlier, months, 0).unwrap_or(earlier)
    };
    while days > 0 {
        match advance_date(&earlier, months, days) {
            Some(candidate) if candidate <= later => {
                base = candidate;
                break;
            }
            _ => days -= 1,
        }
    }

    let rest = (later - base).num_seconds().max(0);
    let total_days = (later - earlier).num_seconds() / 86_400;

    CalendarDuration {
        years: (months / 12) as u32,
        months: (months % 12) as u32,
        days: days as u32,
        hours: (rest / 3600) as u32,
        minutes: (rest % 3600 / 60) as u32,
        seconds: (rest % 60) as u32,
        invert,
        total_days: Some(total_days),
    }
}

/// Order two instants at whole-second granularity.
pub fn compare_calendar(a: &DateTime<Tz>, b: &DateTime<Tz>) -> Ordering {
    a.timestamp().cmp(&b.timestamp())
}

/// The sub-second part of any chrono datetime, in whole microseconds.
pub fn sub_second_micros<T: TimeZone>(datetime: &DateTime<T>) -> u32 {
    // Leap-second representation stores values >= 1s in the nanosecond field.
    (datetime.nanosecond() % 1_000_000_000) / 1_000
}

/// Drop the sub-second part of `datetime`.
pub fn truncate_to_second<T: TimeZone>(datetime: &DateTime<T>) -> DateTime<T> {
    datetime.clone().trunc_subsecs(0)
}

/// Build an instant from a unix timestamp in whole seconds.
///
/// # Errors
///
/// Returns [`TimeError::OutOfRange`] if the timestamp cannot be represented.
pub fn from_timestamp(seconds: i64, tz: &Tz) -> Result<DateTime<Tz>> {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.with_timezone(tz))
        .ok_or_else(|| TimeError::OutOfRange(format!("timestamp {seconds}")))
}

/// Set the wall-clock time of day. Values overflow into neighbouring days,
/// so `25:00:00` is 01:00 on the following day.
///
/// # Errors
///
/// Returns [`TimeError::OutOfRange`] if the result cannot be represented.
pub fn with_wall_time(
    datetime: &DateTime<Tz>,
    hour: i64,
    minute: i64,
    second: i64,
) -> Result<DateTime<Tz>> {
    let out_of_range = || TimeError::OutOfRange(format!("time {hour}:{minute}:{second}"));
    let seconds = hour
        .checked_mul(3600)
        .and_then(|s| s.checked_add(minute.checked_mul(60)?))
        .and_then(|s| s.checked_add(second))
        .ok_or_else(out_of_range)?;
    let midnight = datetime.date_naive().and_time(chrono::NaiveTime::MIN);
    let wall = chrono::Duration::try_seconds(seconds)
        .and_then(|delta| midnight.checked_add_signed(delta))
        .ok_or_else(out_of_range)?;
    Ok(resolve_local(&datetime.timezone(), wall))
}

/// Set the wall-clock date. Month and day overflow like [`with_wall_time`]:
/// month 13 is January of the next year, day 0 the last day of the previous
/// month.
///
/// # Errors
///
/// Returns [`TimeError::OutOfRange`] if the result cannot be represented.
pub fn with_wall_date(
    datetime: &DateTime<Tz>,
    year: i32,
    month: i64,
    day: i64,
) -> Result<DateTime<Tz>> {
    let local = datetime.naive_local();
    let date = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|first| shift_months(first, month.checked_sub(1)?))
        .and_then(|date| {
            let delta = chrono::Duration::try_days(day.checked_sub(1)?)?;
            date.checked_add_signed(delta)
        })
        .ok_or_else(|| TimeError::OutOfRange(format!("date {year}-{month}-{day}")))?;
    Ok(resolve_local(&datetime.timezone(), date.and_time(local.time())))
}

/// Parse `text` with an explicit chrono pattern (`%Y-%m-%d %H:%M:%S%.f`).
/// Returns the whole-second instant in `tz` and the microseconds read from
/// the fraction. A pattern with an offset (`%z`, `%:z`) is honored and the
/// result converted to `tz`; a date-only pattern means midnight.
///
/// # Errors
///
/// Returns [`TimeError::CalendarParse`] if the text does not match.
pub fn parse_from_format(text: &str, pattern: &str, tz: &Tz) -> Result<(DateTime<Tz>, u32)> {
    let datetime = if let Ok(fixed) = DateTime::parse_from_str(text, pattern) {
        fixed.with_timezone(tz)
    } else {
        let naive = NaiveDateTime::parse_from_str(text, pattern)
            .or_else(|_| {
                NaiveDate::parse_from_str(text, pattern)
                    .map(|date| date.and_time(chrono::NaiveTime::MIN))
            })
            .map_err(|e| {
                TimeError::CalendarParse(format!("'{text}' does not match '{pattern}': {e}"))
            })?;
        resolve_local(tz, naive)
    };
    Ok((truncate_to_second(&datetime), sub_second_micros(&datetime)))
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// Move a date by whole months, clamping the day to the target month's
/// length. `None` outside chrono's date range.
pub(crate) fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    if months == 0 {
        return Some(date);
    }
    let index = (date.year() as i64 * 12 + date.month0() as i64).checked_add(months)?;
    let year = i32::try_from(index.div_euclid(12))
        .ok()
        .filter(|year| (NaiveDate::MIN.year()..=NaiveDate::MAX.year()).contains(year))?;
    let month = index.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Number of days in `month` of `year`.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Pin a wall-clock time to the timezone. Ambiguous times (DST fall back)
/// take the earlier instant; skipped times (DST spring forward) move forward
/// past the gap.
pub(crate) fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt;
    }
    let mut candidate = naive;
    for _ in 0..4 {
        let Some(next) = candidate.checked_add_signed(chrono::Duration::minutes(30)) else {
            break;
        };
        candidate = next;
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return dt;
        }
    }
    tz.from_utc_datetime(&naive)
}

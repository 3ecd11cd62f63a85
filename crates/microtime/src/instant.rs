//! `InstantMs`: a whole-second calendar instant plus a sub-second fraction.
//!
//! The fraction is kept as seconds in `[0, 1)` and every mutating operation
//! restores that range, pushing any carry or borrow into the calendar
//! instant through [`apply_delta`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::calendar::{self, format::format_datetime, ParseOptions};
use crate::duration::DurationMs;
use crate::error::{Result, TimeError};
use crate::fixed_point::{apply_delta, to_fraction, to_microseconds, MICROS_PER_SECOND};
use crate::relative;

const DISPLAY_PATTERN: &str = "Y-m-d\\TH:i:s.uP";

/// A calendar instant with microsecond precision.
///
/// ```
/// use microtime::InstantMs;
///
/// let mut t = InstantMs::parse("2014-10-09 09:17:50.34").unwrap();
/// t.modify("+1 day previous microsecond").unwrap();
/// assert_eq!(t.format("Y-m-d H:i:s.u"), "2014-10-10 09:17:50.339999");
/// ```
#[derive(Debug, Clone)]
pub struct InstantMs {
    /// Always on a whole second.
    datetime: DateTime<Tz>,
    /// Seconds in `[0, 1)`.
    fraction: f64,
}

impl InstantMs {
    // ── Construction ────────────────────────────────────────────────────

    /// Parse date/time text in UTC, relative to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::CalendarParse`] if the text is not understood.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &ParseOptions::default())
    }

    /// Parse date/time text with an explicit timezone and anchor.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::CalendarParse`] if the text is not understood, or
    /// [`TimeError::InvalidTimezone`] for an unknown zone name in the text.
    pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Self> {
        let (datetime, micros) = calendar::parse(text, options)?;
        debug!(text, %datetime, micros, "parsed instant");
        Ok(Self {
            datetime,
            fraction: to_fraction(micros as i64),
        })
    }

    /// The current time in UTC.
    pub fn now() -> Self {
        Self::now_in(Tz::UTC)
    }

    /// The current time in `tz`.
    pub fn now_in(tz: Tz) -> Self {
        Self::from_datetime(&Utc::now(), tz)
    }

    /// Cast any chrono datetime, reading the fraction from its sub-second
    /// field (truncated to whole microseconds).
    pub fn from_datetime<T: TimeZone>(datetime: &DateTime<T>, tz: Tz) -> Self {
        let micros = calendar::sub_second_micros(datetime);
        Self {
            datetime: calendar::truncate_to_second(datetime).with_timezone(&tz),
            fraction: to_fraction(micros as i64),
        }
    }

    /// Read `text` with an explicit chrono pattern such as
    /// `"%d/%m/%Y %H:%M:%S%.f"`, placing it in `tz`. A pattern with an
    /// offset (`%z`) is honored and converted to `tz`.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::CalendarParse`] if the text does not match.
    pub fn parse_from_format(pattern: &str, text: &str, tz: Tz) -> Result<Self> {
        let (datetime, micros) = calendar::parse_from_format(text, pattern, &tz)?;
        debug!(text, pattern, %datetime, micros, "parsed instant from format");
        Ok(Self {
            datetime,
            fraction: to_fraction(micros as i64),
        })
    }

    // ── Setters ─────────────────────────────────────────────────────────

    /// Set the sub-second part. Values outside `0..=999_999` are reduced
    /// modulo one second; the calendar instant is left alone.
    pub fn set_microseconds(&mut self, microseconds: i64) -> &mut Self {
        self.fraction = to_fraction(microseconds.rem_euclid(MICROS_PER_SECOND));
        self
    }

    /// Set the wall-clock time of day. Out-of-range values roll over into
    /// neighbouring days (`25:00` is 01:00 the next day).
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] if the result cannot be represented;
    /// the instant is then left unchanged.
    pub fn set_time(
        &mut self,
        hour: i64,
        minute: i64,
        second: i64,
        microsecond: i64,
    ) -> Result<&mut Self> {
        self.datetime = calendar::with_wall_time(&self.datetime, hour, minute, second)?;
        Ok(self.set_microseconds(microsecond))
    }

    /// Set the wall-clock date, keeping the time of day. Month and day roll
    /// over like [`set_time`](Self::set_time).
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] if the result cannot be represented.
    pub fn set_date(&mut self, year: i32, month: i64, day: i64) -> Result<&mut Self> {
        self.datetime = calendar::with_wall_date(&self.datetime, year, month, day)?;
        Ok(self)
    }

    /// Set from a unix timestamp in seconds with a fractional part.
    ///
    /// The value is split with `floor`, so `-1.25` is one whole second
    /// `-2` plus `0.75`.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] for non-finite or unrepresentable
    /// timestamps.
    pub fn set_timestamp(&mut self, timestamp: f64) -> Result<&mut Self> {
        if !timestamp.is_finite() || timestamp.abs() >= i64::MAX as f64 {
            return Err(TimeError::OutOfRange(format!("timestamp {timestamp}")));
        }
        let mut whole = timestamp.floor() as i64;
        let mut micros = to_microseconds(timestamp - timestamp.floor());
        if micros >= MICROS_PER_SECOND {
            whole += 1;
            micros -= MICROS_PER_SECOND;
        }
        self.datetime = calendar::from_timestamp(whole, &self.datetime.timezone())?;
        self.fraction = to_fraction(micros);
        Ok(self)
    }

    /// Express the same instant in another timezone.
    pub fn set_timezone(&mut self, tz: Tz) -> &mut Self {
        self.datetime = self.datetime.with_timezone(&tz);
        self
    }

    // ── Arithmetic ──────────────────────────────────────────────────────

    /// Add a duration.
    ///
    /// A forward duration moves the calendar fields first and then carries
    /// the microseconds; an inverted one borrows the microseconds first and
    /// then moves the calendar fields back. Either way
    /// `a.add(&a.diff(&b, false))` lands on `b`.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::OutOfRange`] if the result cannot be represented;
    /// the instant is then left unchanged.
    pub fn add(&mut self, duration: &DurationMs) -> Result<&mut Self> {
        let delta = duration.signed_microseconds();
        let (datetime, fraction) = if duration.invert() {
            let (datetime, fraction) = carry(&self.datetime, self.fraction, delta)?;
            (calendar::add_duration(&datetime, duration.calendar())?, fraction)
        } else {
            let datetime = calendar::add_duration(&self.datetime, duration.calendar())?;
            carry(&datetime, self.fraction, delta)?
        };
        self.datetime = datetime;
        self.fraction = fraction;
        Ok(self)
    }

    /// Subtract a duration. The argument is not changed.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub fn sub(&mut self, duration: &DurationMs) -> Result<&mut Self> {
        self.add(&duration.negated())
    }

    /// The duration from `self` to `other`, negative (`invert`) when `other`
    /// is earlier. With `absolute` the result is never inverted.
    ///
    /// Microseconds are subtracted first; when the later instant has fewer
    /// microseconds a second is borrowed by moving the later instant one
    /// second back before the calendar difference is taken. The calendar
    /// fields are counted in the earlier instant's timezone, so swapping the
    /// arguments only flips `invert`.
    pub fn diff(&self, other: &InstantMs, absolute: bool) -> DurationMs {
        let invert = self.compare(other) == Ordering::Greater;
        let (earlier, later) = if invert { (other, self) } else { (self, other) };

        let mut microseconds = later.microsecond() as i64 - earlier.microsecond() as i64;
        let mut end = later.datetime;
        if microseconds < 0 {
            microseconds += MICROS_PER_SECOND;
            // `later` is at least one whole second after `earlier` here.
            end = calendar::add_seconds(&end, -1).unwrap_or(end);
        }

        let mut whole = calendar::diff_calendar(&earlier.datetime, &end);
        whole.invert = invert && !absolute;
        trace!(invert, microseconds, "computed diff");

        DurationMs::from_calendar(whole).with_microseconds(microseconds)
    }

    /// Order by calendar instant, then by microseconds.
    pub fn compare(&self, other: &InstantMs) -> Ordering {
        calendar::compare_calendar(&self.datetime, &other.datetime)
            .then_with(|| self.microsecond().cmp(&other.microsecond()))
    }

    /// Apply relative text such as `"+1 day previous microsecond"`.
    ///
    /// Microsecond phrases are cut out and summed, the rest goes to the
    /// calendar grammar, a reset keyword anywhere in the text (`today`,
    /// `tomorrow`, …) clears the fraction, and finally the summed
    /// microseconds are applied.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::CalendarParse`] if the calendar part of the text
    /// is not understood, or [`TimeError::OutOfRange`] if the result cannot be
    /// represented; the instant is then left unchanged.
    pub fn modify(&mut self, text: &str) -> Result<&mut Self> {
        let extracted = relative::extract(text);
        let datetime = calendar::relative_modify(&self.datetime, &extracted.remainder)?;
        debug!(
            text,
            remainder = %extracted.remainder,
            net_microseconds = extracted.net_microseconds,
            "modify"
        );

        let fraction = if relative::has_reset_keyword(text) {
            0.0
        } else {
            self.fraction
        };
        let (datetime, fraction) = carry(&datetime, fraction, extracted.net_microseconds)?;
        self.datetime = datetime;
        self.fraction = fraction;
        Ok(self)
    }

    // ── Reading ─────────────────────────────────────────────────────────

    /// Render with a date pattern (see [`format_datetime`]). Every `u` becomes
    /// the six-digit microseconds and every `v` the three-digit milliseconds,
    /// escaped or not.
    pub fn format(&self, pattern: &str) -> String {
        let micros = self.microsecond();
        let pattern = pattern
            .replace('u', &format!("{micros:06}"))
            .replace('v', &format!("{:03}", micros / 1_000));
        format_datetime(&self.datetime, &pattern)
    }

    /// Unix timestamp in whole seconds.
    pub fn timestamp(&self) -> i64 {
        self.datetime.timestamp()
    }

    /// Unix timestamp with the fraction added.
    pub fn timestamp_micros(&self) -> f64 {
        self.datetime.timestamp() as f64 + self.fraction
    }

    /// Microseconds within the second, `0..=999_999`.
    pub fn microsecond(&self) -> u32 {
        to_microseconds(self.fraction) as u32
    }

    /// The sub-second part as seconds in `[0, 1)`.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// The whole-second calendar instant.
    pub fn datetime(&self) -> &DateTime<Tz> {
        &self.datetime
    }

    pub fn timezone(&self) -> Tz {
        self.datetime.timezone()
    }

    /// A chrono datetime carrying the microseconds.
    pub fn to_datetime(&self) -> DateTime<Tz> {
        self.datetime + chrono::Duration::microseconds(self.microsecond() as i64)
    }
}

/// Apply a microsecond delta to `fraction`, carrying whole seconds into
/// `datetime`.
fn carry(datetime: &DateTime<Tz>, fraction: f64, delta: i64) -> Result<(DateTime<Tz>, f64)> {
    let (fraction, seconds) = apply_delta(fraction, delta);
    let datetime = if seconds != 0 {
        calendar::add_seconds(datetime, seconds)?
    } else {
        *datetime
    };
    trace!(delta, seconds, fraction, "carried microseconds");
    Ok((datetime, fraction))
}

impl PartialEq for InstantMs {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for InstantMs {}

impl PartialOrd for InstantMs {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InstantMs {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl From<DateTime<Tz>> for InstantMs {
    fn from(datetime: DateTime<Tz>) -> Self {
        let tz = datetime.timezone();
        Self::from_datetime(&datetime, tz)
    }
}

impl From<DateTime<Utc>> for InstantMs {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(&datetime, Tz::UTC)
    }
}

impl FromStr for InstantMs {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for InstantMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(DISPLAY_PATTERN))
    }
}

impl Serialize for InstantMs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

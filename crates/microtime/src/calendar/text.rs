//! Free-form date/time text.
//!
//! One scanner serves both construction ("2014-10-09 09:17:50.34",
//! "tomorrow noon", "@1412846270.5") and relative modification ("+1 day",
//! "next month", "last friday", "first day of next month"). The text is
//! split into words; each word is classified as an absolute date/time piece,
//! a number that must be followed by a unit, or a keyword. All pieces are
//! collected first and then applied in a fixed order: absolute fields,
//! calendar shifts (months, days, weekday, first/last day of), elapsed
//! clock time.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday,
};
use chrono_tz::Tz;

use super::{
    days_in_month, resolve_local, shift_months, sub_second_micros, truncate_to_second,
    ParseOptions,
};
use crate::error::{Result, TimeError};
use crate::relative::ordinal_value;

// ── Public entry points (re-exported through `calendar`) ────────────────────

/// Parse text relative to the configured anchor.
pub(crate) fn parse(input: &str, options: &ParseOptions) -> Result<(DateTime<Tz>, u32)> {
    let parsed = Scanner::new(input).scan()?;
    let anchor = options.anchor();

    let micros = if let Some((_, micros)) = parsed.time {
        micros
    } else if let Some((_, micros)) = parsed.timestamp {
        micros
    } else if parsed.resets_time() {
        0
    } else {
        sub_second_micros(&anchor)
    };

    let datetime = apply(&parsed, truncate_to_second(&anchor), Mode::Construct, input)?;
    Ok((datetime, micros))
}

/// Apply relative text to an existing instant.
pub(crate) fn modify(datetime: &DateTime<Tz>, input: &str) -> Result<DateTime<Tz>> {
    let parsed = Scanner::new(input).scan()?;
    apply(&parsed, truncate_to_second(datetime), Mode::Modify, input)
}

// ── Parsed pieces ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// A date without a time means midnight.
    Construct,
    /// A date without a time keeps the current time of day.
    Modify,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Zone {
    fn wall_clock(&self, datetime: &DateTime<Tz>) -> NaiveDateTime {
        match self {
            Zone::Named(tz) => datetime.with_timezone(tz).naive_local(),
            Zone::Fixed(offset) => datetime.with_timezone(offset).naive_local(),
        }
    }

    fn pin(&self, naive: NaiveDateTime, target: &Tz) -> DateTime<Tz> {
        match self {
            Zone::Named(tz) => resolve_local(tz, naive).with_timezone(target),
            Zone::Fixed(offset) => {
                let utc = naive - chrono::Duration::seconds(offset.local_minus_utc() as i64);
                utc.and_utc().with_timezone(target)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Fortnight,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayOf {
    First,
    Last,
}

/// A weekday to move to. `behavior` 0 = this/plain (today counts), n > 0 =
/// the n-th occurrence strictly after today, -1 = strictly before today.
#[derive(Debug, Clone, Copy)]
struct WeekdayTarget {
    weekday: Weekday,
    behavior: i64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Relative {
    years: i64,
    months: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
}

impl Relative {
    fn add(&mut self, unit: Unit, amount: i64) {
        let (field, factor) = match unit {
            Unit::Second => (&mut self.seconds, 1),
            Unit::Minute => (&mut self.minutes, 1),
            Unit::Hour => (&mut self.hours, 1),
            Unit::Day => (&mut self.days, 1),
            Unit::Week => (&mut self.days, 7),
            Unit::Fortnight => (&mut self.days, 14),
            Unit::Month => (&mut self.months, 1),
            Unit::Year => (&mut self.years, 1),
        };
        *field = field.saturating_add(amount.saturating_mul(factor));
    }

    /// "ago" flips everything parsed so far.
    fn negate(&mut self) {
        for field in [
            &mut self.years,
            &mut self.months,
            &mut self.days,
            &mut self.hours,
            &mut self.minutes,
            &mut self.seconds,
        ] {
            *field = field.saturating_neg();
        }
    }
}

#[derive(Debug, Default)]
struct Parsed {
    timestamp: Option<(i64, u32)>,
    date: Option<NaiveDate>,
    /// Month and day written without a year; the year comes from the base.
    month_day: Option<(u32, u32)>,
    time: Option<(NaiveTime, u32)>,
    zone: Option<Zone>,
    /// Time of day forced by a keyword (today, noon, tomorrow, …).
    reset_time: Option<NaiveTime>,
    relative: Relative,
    weekday: Option<WeekdayTarget>,
    day_of: Option<DayOf>,
}

impl Parsed {
    fn resets_time(&self) -> bool {
        self.has_date() || self.reset_time.is_some() || self.weekday.is_some()
    }

    fn has_date(&self) -> bool {
        self.date.is_some() || self.month_day.is_some()
    }
}

// ── Scanner ─────────────────────────────────────────────────────────────────

struct Scanner<'a> {
    input: &'a str,
    words: Vec<&'a str>,
    pos: usize,
    parsed: Parsed,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        let words = input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            input,
            words,
            pos: 0,
            parsed: Parsed::default(),
        }
    }

    fn error(&self, detail: &str) -> TimeError {
        TimeError::CalendarParse(format!("'{}': {}", self.input.trim(), detail))
    }

    fn unexpected(&self, word: &str) -> TimeError {
        self.error(&format!("unexpected '{}'", word))
    }

    fn peek(&self, offset: usize) -> Option<String> {
        self.words
            .get(self.pos + offset)
            .map(|w| w.to_ascii_lowercase())
    }

    fn scan(mut self) -> Result<Parsed> {
        while self.pos < self.words.len() {
            let word = self.words[self.pos];
            let lower = word.to_ascii_lowercase();
            self.pos += 1;

            if let Some(rest) = lower.strip_prefix('@') {
                let stamp = parse_timestamp(rest).ok_or_else(|| self.unexpected(word))?;
                self.parsed.timestamp = Some(stamp);
            } else if lower.starts_with(|c: char| c.is_ascii_digit()) {
                self.scan_numeric(word, &lower)?;
            } else if lower.starts_with(['+', '-']) {
                self.scan_signed(word, &lower)?;
            } else {
                self.scan_keyword(word, &lower)?;
            }
        }
        Ok(self.parsed)
    }

    fn scan_numeric(&mut self, word: &str, lower: &str) -> Result<()> {
        if let Some((date, time)) = parse_iso_datetime(lower) {
            self.set_date(date)?;
            if let Some((time, micros, zone)) = time {
                self.set_time(time, micros)?;
                self.set_zone(zone);
            }
        } else if let Some((time, micros, zone)) = parse_clock(lower) {
            self.set_time(time, micros)?;
            self.set_zone(zone);
        } else if let Some(date) = parse_slash_date(lower) {
            self.set_date(date)?;
        } else if let Some((amount, digits)) = parse_number(lower) {
            self.scan_amount(word, amount, false, digits)?;
        } else {
            return Err(self.unexpected(word));
        }
        Ok(())
    }

    fn scan_signed(&mut self, word: &str, lower: &str) -> Result<()> {
        if lower.contains(':') {
            let zone = parse_offset(lower).ok_or_else(|| self.unexpected(word))?;
            self.parsed.zone = Some(zone);
            return Ok(());
        }
        let (amount, digits) = parse_number(lower).ok_or_else(|| self.unexpected(word))?;
        self.scan_amount(word, amount, true, digits)
    }

    /// A number is a relative amount when a unit follows, a day of month when
    /// a month name follows, an hour when am/pm follows, and a `±HHMM`
    /// offset when it is signed, four digits long and stands alone.
    fn scan_amount(&mut self, word: &str, amount: i64, signed: bool, digits: usize) -> Result<()> {
        let next = self.peek(0);
        let next = next.as_deref();

        if let Some(unit) = next.and_then(parse_unit) {
            self.pos += 1;
            self.parsed.relative.add(unit, amount);
        } else if let Some(month) = next.and_then(parse_month).filter(|_| !signed) {
            self.pos += 1;
            let year = self.take_year();
            self.set_month_day(word, year, month, amount)?;
        } else if let Some(pm) = next.and_then(parse_meridiem).filter(|_| !signed) {
            self.pos += 1;
            let time = u32::try_from(amount)
                .ok()
                .and_then(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
                .and_then(|t| apply_meridiem(t, pm))
                .ok_or_else(|| self.unexpected(word))?;
            self.set_time(time, 0)?;
        } else if signed && digits == 4 {
            let zone = parse_offset(word).ok_or_else(|| self.unexpected(word))?;
            self.parsed.zone = Some(zone);
        } else {
            return Err(self.error(&format!("number '{}' without a unit", word)));
        }
        Ok(())
    }

    fn scan_keyword(&mut self, word: &str, lower: &str) -> Result<()> {
        match lower {
            "now" | "at" | "and" | "t" => {}
            "today" | "midnight" => self.parsed.reset_time = Some(NaiveTime::MIN),
            "noon" => self.parsed.reset_time = NaiveTime::from_hms_opt(12, 0, 0),
            "tomorrow" => {
                self.parsed.reset_time = Some(NaiveTime::MIN);
                self.parsed.relative.add(Unit::Day, 1);
            }
            "yesterday" => {
                self.parsed.reset_time = Some(NaiveTime::MIN);
                self.parsed.relative.add(Unit::Day, -1);
            }
            "ago" => self.parsed.relative.negate(),
            "utc" | "gmt" | "z" => self.parsed.zone = Some(Zone::Named(Tz::UTC)),
            "am" | "pm" | "a.m." | "p.m." => {
                let pm = lower.starts_with('p');
                let (time, micros) = self.parsed.time.ok_or_else(|| self.unexpected(word))?;
                let time = apply_meridiem(time, pm).ok_or_else(|| self.unexpected(word))?;
                self.parsed.time = Some((time, micros));
            }
            _ => {
                if let Some(weekday) = parse_weekday(lower) {
                    self.set_weekday(weekday, 0);
                } else if let Some(month) = parse_month(lower) {
                    let day = self
                        .peek(0)
                        .and_then(|w| parse_number(&w))
                        .map(|(day, _)| day)
                        .ok_or_else(|| self.error(&format!("'{}' without a day", word)))?;
                    self.pos += 1;
                    let year = self.take_year();
                    self.set_month_day(word, year, month, day)?;
                } else if let Some(value) = ordinal_value(lower) {
                    self.scan_ordinal(word, lower, value)?;
                } else if word.contains('/') {
                    let tz = word
                        .parse::<Tz>()
                        .map_err(|_| TimeError::InvalidTimezone(format!("'{}'", word)))?;
                    self.parsed.zone = Some(Zone::Named(tz));
                } else {
                    return Err(self.unexpected(word));
                }
            }
        }
        Ok(())
    }

    fn scan_ordinal(&mut self, word: &str, lower: &str, value: i64) -> Result<()> {
        let next = self.peek(0);
        let next = next.as_deref();

        if matches!(lower, "first" | "last")
            && next == Some("day")
            && self.peek(1).as_deref() == Some("of")
        {
            self.pos += 2;
            self.parsed.day_of = Some(if lower == "first" {
                DayOf::First
            } else {
                DayOf::Last
            });
        } else if let Some(unit) = next.and_then(parse_unit) {
            self.pos += 1;
            self.parsed.relative.add(unit, value);
        } else if let Some(weekday) = next.and_then(parse_weekday) {
            self.pos += 1;
            let behavior = if value < 0 { -1 } else { value };
            self.set_weekday(weekday, behavior);
        } else {
            return Err(self.unexpected(word));
        }
        Ok(())
    }

    /// Consume a following four-digit year, if there is one.
    fn take_year(&mut self) -> Option<i32> {
        let next = self.peek(0)?;
        if next.len() != 4 || !next.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year = next.parse().ok()?;
        self.pos += 1;
        Some(year)
    }

    fn set_month_day(&mut self, word: &str, year: Option<i32>, month: u32, day: i64) -> Result<()> {
        let invalid = || self.error(&format!("invalid day of month near '{}'", word));
        let day = u32::try_from(day)
            .ok()
            .filter(|day| (1..=31).contains(day))
            .ok_or_else(invalid)?;
        match year {
            Some(year) => {
                let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
                self.set_date(date)
            }
            None => {
                if self.parsed.has_date() {
                    return Err(self.error("double date specification"));
                }
                self.parsed.month_day = Some((month, day));
                Ok(())
            }
        }
    }

    fn set_date(&mut self, date: NaiveDate) -> Result<()> {
        if self.parsed.has_date() {
            return Err(self.error("double date specification"));
        }
        self.parsed.date = Some(date);
        Ok(())
    }

    fn set_time(&mut self, time: NaiveTime, micros: u32) -> Result<()> {
        if self.parsed.time.replace((time, micros)).is_some() {
            return Err(self.error("double time specification"));
        }
        Ok(())
    }

    fn set_zone(&mut self, zone: Option<Zone>) {
        if zone.is_some() {
            self.parsed.zone = zone;
        }
    }

    fn set_weekday(&mut self, weekday: Weekday, behavior: i64) {
        self.parsed.weekday = Some(WeekdayTarget { weekday, behavior });
    }
}

// ── Application ─────────────────────────────────────────────────────────────

fn apply(parsed: &Parsed, base: DateTime<Tz>, mode: Mode, input: &str) -> Result<DateTime<Tz>> {
    let tz = base.timezone();
    let out_of_range = || TimeError::OutOfRange(format!("'{}'", input.trim()));

    let mut current = match parsed.timestamp {
        Some((seconds, _)) => DateTime::from_timestamp(seconds, 0)
            .ok_or_else(out_of_range)?
            .with_timezone(&tz),
        None => base,
    };

    if parsed.resets_time() || parsed.time.is_some() {
        let zone = parsed.zone.unwrap_or(Zone::Named(tz));
        let wall = zone.wall_clock(&current);
        let date = match (parsed.date, parsed.month_day) {
            (Some(date), _) => date,
            (None, Some((month, day))) => NaiveDate::from_ymd_opt(wall.year(), month, day)
                .ok_or_else(|| {
                    TimeError::CalendarParse(format!(
                        "'{}': no day {} in month {} of {}",
                        input.trim(),
                        day,
                        month,
                        wall.year()
                    ))
                })?,
            (None, None) => wall.date(),
        };
        let time = match (parsed.time, parsed.reset_time) {
            (Some((time, _)), _) => time,
            (None, Some(time)) => time,
            (None, None) if parsed.weekday.is_some() => NaiveTime::MIN,
            (None, None) if parsed.has_date() && mode == Mode::Construct => NaiveTime::MIN,
            (None, None) => wall.time(),
        };
        current = zone.pin(date.and_time(time), &tz);
    }

    let relative = &parsed.relative;
    let months = relative
        .years
        .saturating_mul(12)
        .saturating_add(relative.months);

    if months != 0 || relative.days != 0 || parsed.weekday.is_some() || parsed.day_of.is_some() {
        let wall = current.naive_local();
        let mut date = shift_months(wall.date(), months)
            .zip(chrono::Duration::try_days(relative.days))
            .and_then(|(date, days)| date.checked_add_signed(days))
            .ok_or_else(out_of_range)?;
        if let Some(target) = parsed.weekday {
            date = move_to_weekday(date, target).ok_or_else(out_of_range)?;
        }
        date = match parsed.day_of {
            Some(DayOf::First) => date.with_day(1).unwrap_or(date),
            Some(DayOf::Last) => date
                .with_day(days_in_month(date.year(), date.month()))
                .unwrap_or(date),
            None => date,
        };
        current = resolve_local(&tz, date.and_time(wall.time()));
    }

    let clock = relative
        .hours
        .saturating_mul(3600)
        .saturating_add(relative.minutes.saturating_mul(60))
        .saturating_add(relative.seconds);
    if clock != 0 {
        let delta = chrono::Duration::try_seconds(clock).ok_or_else(out_of_range)?;
        current = current.checked_add_signed(delta).ok_or_else(out_of_range)?;
    }

    Ok(truncate_to_second(&current))
}

fn move_to_weekday(date: NaiveDate, target: WeekdayTarget) -> Option<NaiveDate> {
    let current = date.weekday().num_days_from_monday() as i64;
    let wanted = target.weekday.num_days_from_monday() as i64;
    let days = match target.behavior {
        0 => (wanted - current + 7) % 7,
        behavior if behavior > 0 => {
            let ahead = (wanted - current + 7) % 7;
            let ahead = if ahead == 0 { 7 } else { ahead };
            (behavior - 1).checked_mul(7)?.checked_add(ahead)?
        }
        _ => {
            let back = (current - wanted + 7) % 7;
            -(if back == 0 { 7 } else { back })
        }
    };
    date.checked_add_signed(chrono::Duration::try_days(days)?)
}

// ── Word parsers ────────────────────────────────────────────────────────────

/// `[+-]digits` → (value, digit count).
fn parse_number(s: &str) -> Option<(i64, usize)> {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = s.strip_prefix('+').unwrap_or(s).parse().ok()?;
    Some((value, digits.len()))
}

/// Exactly `min..=max` ASCII digits.
fn parse_digits(s: &str, min: usize, max: usize) -> Option<u32> {
    if s.len() < min || s.len() > max || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Fraction digits → microseconds; digits past the sixth are dropped.
fn fraction_micros(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut padded: String = digits.chars().take(6).collect();
    while padded.len() < 6 {
        padded.push('0');
    }
    padded.parse().ok()
}

/// `@seconds[.fraction]`, floor-split so that micros are never negative.
fn parse_timestamp(s: &str) -> Option<(i64, u32)> {
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction_micros(fraction)?),
        None => (unsigned, 0),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    if !negative {
        return Some((whole, fraction));
    }
    if fraction == 0 {
        Some((-whole, 0))
    } else {
        Some((-whole - 1, 1_000_000 - fraction))
    }
}

type Clock = (NaiveTime, u32, Option<Zone>);

/// `YYYY-MM-DD[tHH:MM[:SS[.f]][zone]]`.
fn parse_iso_datetime(s: &str) -> Option<(NaiveDate, Option<Clock>)> {
    let (date_part, time_part) = match s.split_once('t') {
        Some((date, time)) => (date, Some(time)),
        None => (s, None),
    };
    let mut fields = date_part.split('-');
    let year = parse_digits(fields.next()?, 4, 6)?;
    let month = parse_digits(fields.next()?, 1, 2)?;
    let day = parse_digits(fields.next()?, 1, 2)?;
    if fields.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;

    match time_part {
        None => Some((date, None)),
        Some(time) => Some((date, Some(parse_clock(time)?))),
    }
}

/// `HH:MM[:SS[.f]]` with an optional zone suffix, or `H[:MM]am|pm`.
fn parse_clock(s: &str) -> Option<Clock> {
    let (s, meridiem) = if let Some(rest) = s.strip_suffix("am") {
        (rest, Some(false))
    } else if let Some(rest) = s.strip_suffix("pm") {
        (rest, Some(true))
    } else {
        (s, None)
    };

    let (clock, zone) = match s.find(['z', '+', '-']) {
        Some(0) => return None,
        Some(i) => (&s[..i], Some(parse_offset(&s[i..])?)),
        None => (s, None),
    };

    let mut parts = clock.split(':');
    let hour = parse_digits(parts.next()?, 1, 2)?;
    let minute = match parts.next() {
        Some(minute) => parse_digits(minute, 2, 2)?,
        None if meridiem.is_some() => 0,
        None => return None,
    };
    let (second, micros) = match parts.next() {
        Some(second) => match second.split_once('.') {
            Some((whole, fraction)) => (parse_digits(whole, 2, 2)?, fraction_micros(fraction)?),
            None => (parse_digits(second, 2, 2)?, 0),
        },
        None => (0, 0),
    };
    if parts.next().is_some() {
        return None;
    }

    let mut time = NaiveTime::from_hms_opt(hour, minute, second)?;
    if let Some(pm) = meridiem {
        time = apply_meridiem(time, pm)?;
    }
    Some((time, micros, zone))
}

/// `m/d/Y`.
fn parse_slash_date(s: &str) -> Option<NaiveDate> {
    let mut fields = s.split('/');
    let month = parse_digits(fields.next()?, 1, 2)?;
    let day = parse_digits(fields.next()?, 1, 2)?;
    let year = parse_digits(fields.next()?, 4, 4)?;
    if fields.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// `z`, `±HH`, `±HHMM` or `±HH:MM`.
fn parse_offset(s: &str) -> Option<Zone> {
    let lower = s.to_ascii_lowercase();
    if lower == "z" {
        return Some(Zone::Named(Tz::UTC));
    }
    let sign = match lower.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let body = lower[1..].replace(':', "");
    let (hours, minutes) = match body.len() {
        2 => (parse_digits(&body, 2, 2)?, 0),
        4 => (parse_digits(&body[..2], 2, 2)?, parse_digits(&body[2..], 2, 2)?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    let seconds = sign * (hours as i32 * 3600 + minutes as i32 * 60);
    FixedOffset::east_opt(seconds).map(Zone::Fixed)
}

/// Convert a 12-hour clock reading (hour 1..=12) to 24-hour.
fn apply_meridiem(time: NaiveTime, pm: bool) -> Option<NaiveTime> {
    let hour = time.hour();
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour24 = match (hour, pm) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };
    time.with_hour(hour24)
}

fn parse_meridiem(s: &str) -> Option<bool> {
    match s {
        "am" | "a.m." => Some(false),
        "pm" | "p.m." => Some(true),
        _ => None,
    }
}

fn parse_unit(s: &str) -> Option<Unit> {
    match s {
        "sec" | "secs" | "second" | "seconds" => Some(Unit::Second),
        "min" | "mins" | "minute" | "minutes" => Some(Unit::Minute),
        "hour" | "hours" => Some(Unit::Hour),
        "day" | "days" => Some(Unit::Day),
        "week" | "weeks" => Some(Unit::Week),
        "fortnight" | "fortnights" => Some(Unit::Fortnight),
        "month" | "months" => Some(Unit::Month),
        "year" | "years" => Some(Unit::Year),
        _ => None,
    }
}

/// Parse a weekday name (full and abbreviated).
fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse a month name to number (1-12).
fn parse_month(s: &str) -> Option<u32> {
    match s {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn anchor() -> DateTime<Utc> {
        // Wednesday, February 18, 2026, 14:30:00.250000 UTC
        Utc.with_ymd_and_hms(2026, 2, 18, 14, 30, 0).unwrap()
            + chrono::Duration::microseconds(250_000)
    }

    fn options() -> ParseOptions {
        ParseOptions::default().with_anchor(anchor())
    }

    fn parse_str(s: &str) -> (String, u32) {
        let (dt, micros) = parse(s, &options()).unwrap();
        (dt.format("%Y-%m-%d %H:%M:%S").to_string(), micros)
    }

    fn modify_str(base: &str, s: &str) -> String {
        let (dt, _) = parse(base, &options()).unwrap();
        modify(&dt, s)
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    // ── absolute text ───────────────────────────────────────────────────

    #[test]
    fn test_parse_date_and_time_with_fraction() {
        assert_eq!(
            parse_str("2014-10-09 09:17:50.34"),
            ("2014-10-09 09:17:50".to_string(), 340_000)
        );
    }

    #[test]
    fn test_parse_fraction_longer_than_six_digits_truncates() {
        assert_eq!(parse_str("09:17:50.1234567").1, 123_456);
    }

    #[test]
    fn test_parse_time_only_uses_anchor_date() {
        assert_eq!(
            parse_str("12:00:00.1"),
            ("2026-02-18 12:00:00".to_string(), 100_000)
        );
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        assert_eq!(parse_str("2014-10-09"), ("2014-10-09 00:00:00".to_string(), 0));
    }

    #[test]
    fn test_parse_now_keeps_anchor_micros() {
        assert_eq!(parse_str("now"), ("2026-02-18 14:30:00".to_string(), 250_000));
        assert_eq!(parse_str(""), ("2026-02-18 14:30:00".to_string(), 250_000));
    }

    #[test]
    fn test_parse_rfc3339_offset_converts_to_target_zone() {
        assert_eq!(
            parse_str("2014-10-09T09:17:50.5+02:00"),
            ("2014-10-09 07:17:50".to_string(), 500_000)
        );
        assert_eq!(parse_str("2014-10-09T09:17:50Z").0, "2014-10-09 09:17:50");
    }

    #[test]
    fn test_parse_separate_offset_word() {
        assert_eq!(parse_str("2014-10-09 09:17:50 -0500").0, "2014-10-09 14:17:50");
    }

    #[test]
    fn test_parse_named_zone_word() {
        assert_eq!(
            parse_str("2026-07-01 12:00 America/New_York").0,
            "2026-07-01 16:00:00"
        );
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(
            parse_str("@1412846270.5"),
            ("2014-10-09 09:17:50".to_string(), 500_000)
        );
        assert_eq!(parse_str("@-1.25"), ("1969-12-31 23:59:58".to_string(), 750_000));
    }

    #[test]
    fn test_parse_month_name_dates() {
        assert_eq!(parse_str("9 october 2014").0, "2014-10-09 00:00:00");
        assert_eq!(parse_str("Oct 9, 2014 2pm").0, "2014-10-09 14:00:00");
        assert_eq!(parse_str("july 4").0, "2026-07-04 00:00:00");
    }

    #[test]
    fn test_parse_slash_date() {
        assert_eq!(parse_str("10/09/2014").0, "2014-10-09 00:00:00");
    }

    #[test]
    fn test_parse_meridiem() {
        assert_eq!(parse_str("2:30pm").0, "2026-02-18 14:30:00");
        assert_eq!(parse_str("12 am").0, "2026-02-18 00:00:00");
        assert_eq!(parse_str("11:15:00 pm").0, "2026-02-18 23:15:00");
    }

    #[test]
    fn test_parse_keywords_reset_micros() {
        assert_eq!(parse_str("tomorrow"), ("2026-02-19 00:00:00".to_string(), 0));
        assert_eq!(parse_str("yesterday noon"), ("2026-02-17 12:00:00".to_string(), 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse("not a date", &options()).unwrap_err().to_string();
        assert!(err.contains("Invalid date/time text"), "got: {err}");
        assert!(parse("2014-13-40", &options()).is_err());
        assert!(parse("5", &options()).is_err());
    }

    #[test]
    fn test_parse_rejects_double_date() {
        let err = parse("2014-10-09 2014-10-10", &options()).unwrap_err().to_string();
        assert!(err.contains("double date"), "got: {err}");
    }

    #[test]
    fn test_parse_invalid_zone_name() {
        let err = parse("12:00 Mars/Olympus", &options()).unwrap_err();
        assert!(matches!(err, TimeError::InvalidTimezone(_)));
    }

    // ── relative text ───────────────────────────────────────────────────

    #[test]
    fn test_modify_plus_one_day() {
        assert_eq!(modify_str("2014-10-09 09:17:50", "+1 day"), "2014-10-10 09:17:50");
    }

    #[test]
    fn test_modify_compound_relative() {
        assert_eq!(
            modify_str("2014-10-09 09:17:50", "+1 week 2 days -3 hours"),
            "2014-10-18 06:17:50"
        );
    }

    #[test]
    fn test_modify_ago_negates() {
        assert_eq!(modify_str("2014-10-09 09:17:50", "2 days ago"), "2014-10-07 09:17:50");
    }

    #[test]
    fn test_modify_ordinal_units() {
        assert_eq!(modify_str("2014-10-09 09:17:50", "next month"), "2014-11-09 09:17:50");
        assert_eq!(modify_str("2014-10-09 09:17:50", "last year"), "2013-10-09 09:17:50");
        assert_eq!(modify_str("2014-10-09 09:17:50", "third day"), "2014-10-12 09:17:50");
        assert_eq!(modify_str("2014-10-09 09:17:50", "this week"), "2014-10-09 09:17:50");
    }

    #[test]
    fn test_modify_tomorrow_resets_time() {
        assert_eq!(modify_str("2014-10-09 09:17:50", "tomorrow"), "2014-10-10 00:00:00");
        assert_eq!(modify_str("2014-10-09 09:17:50", "midnight"), "2014-10-09 00:00:00");
        assert_eq!(modify_str("2014-10-09 09:17:50", "tomorrow noon"), "2014-10-10 12:00:00");
    }

    #[test]
    fn test_modify_weekdays() {
        // 2014-10-09 is a Thursday.
        assert_eq!(modify_str("2014-10-09 09:17:50", "monday"), "2014-10-13 00:00:00");
        assert_eq!(modify_str("2014-10-09 09:17:50", "thursday"), "2014-10-09 00:00:00");
        assert_eq!(modify_str("2014-10-09 09:17:50", "next thursday"), "2014-10-16 00:00:00");
        assert_eq!(modify_str("2014-10-09 09:17:50", "last friday"), "2014-10-03 00:00:00");
        assert_eq!(modify_str("2014-10-09 09:17:50", "next friday 10:30am"), "2014-10-10 10:30:00");
    }

    #[test]
    fn test_modify_first_and_last_day_of() {
        assert_eq!(
            modify_str("2014-10-09 09:17:50", "first day of next month"),
            "2014-11-01 09:17:50"
        );
        assert_eq!(
            modify_str("2014-01-31 08:00:00", "last day of next month"),
            "2014-02-28 08:00:00"
        );
    }

    #[test]
    fn test_modify_date_only_keeps_time() {
        assert_eq!(modify_str("2014-10-09 09:17:50", "2015-01-02"), "2015-01-02 09:17:50");
    }

    #[test]
    fn test_modify_time_only() {
        assert_eq!(modify_str("2014-10-09 09:17:50", "12:30"), "2014-10-09 12:30:00");
    }

    #[test]
    fn test_modify_empty_is_noop() {
        assert_eq!(modify_str("2014-10-09 09:17:50", ""), "2014-10-09 09:17:50");
        assert_eq!(modify_str("2014-10-09 09:17:50", "   "), "2014-10-09 09:17:50");
    }

    #[test]
    fn test_modify_number_without_unit_fails() {
        let (dt, _) = parse("2014-10-09 09:17:50", &options()).unwrap();
        let err = modify(&dt, "+3").unwrap_err().to_string();
        assert!(err.contains("without a unit"), "got: {err}");
    }

    #[test]
    fn test_modify_huge_amount_is_out_of_range() {
        let (dt, _) = parse("2014-10-09 09:17:50", &options()).unwrap();
        let err = modify(&dt, "+9999999999 years").unwrap_err();
        assert!(matches!(err, TimeError::OutOfRange(_)));
    }

    #[test]
    fn test_modify_months_past_calendar_end_fail() {
        let (dt, _) = parse("2014-10-09 09:17:50", &options()).unwrap();
        for text in ["+3144000 months", "-3144000 months", "+262000 years", "+95000000 days"] {
            let err = modify(&dt, text).unwrap_err();
            assert!(matches!(err, TimeError::OutOfRange(_)), "{text}: {err:?}");
        }
    }

    #[test]
    fn test_modify_in_named_zone_keeps_wall_clock() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let dt = tz.with_ymd_and_hms(2026, 3, 7, 22, 0, 0).unwrap();
        let out = modify(&dt, "+1 day").unwrap();
        assert_eq!(out.naive_local().to_string(), "2026-03-08 22:00:00");
    }

    #[test]
    fn test_parse_timestamp_helper() {
        assert_eq!(parse_timestamp("10"), Some((10, 0)));
        assert_eq!(parse_timestamp("-0.5"), Some((-1, 500_000)));
        assert_eq!(parse_timestamp("x"), None);
    }

    #[test]
    fn test_parse_offset_helper() {
        assert_eq!(
            parse_offset("+05:30"),
            FixedOffset::east_opt(19_800).map(Zone::Fixed)
        );
        assert_eq!(parse_offset("-08"), FixedOffset::east_opt(-28_800).map(Zone::Fixed));
        assert_eq!(parse_offset("+5"), None);
    }
}

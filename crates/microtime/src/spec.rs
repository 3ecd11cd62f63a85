//! Duration specs with fractional seconds.
//!
//! Grammar: `P[nY][nM][nD][T[nH][nM][n[.f]S]]`, where `n` is a run of ASCII
//! digits and `f` a run of fraction digits, allowed on the seconds field
//! only. The fraction becomes the microseconds of the resulting
//! [`DurationMs`]; everything else is rebuilt as an integer-only spec and
//! handed to [`CalendarDuration::from_spec`].

use crate::calendar::CalendarDuration;
use crate::duration::DurationMs;
use crate::error::{Result, TimeError};
use crate::fixed_point::{to_microseconds, MICROS_PER_SECOND};

/// Parse a duration spec whose seconds field may carry a fraction.
///
/// `P` alone is the zero duration. A `T` with nothing after it is rejected.
///
/// ```
/// use microtime::spec::parse;
///
/// let d = parse("PT59.9S").unwrap();
/// assert_eq!(d.seconds(), 59);
/// assert_eq!(d.microseconds(), 900_000);
/// assert!(parse("PT").is_err());
/// ```
///
/// # Errors
///
/// Returns [`TimeError::MalformedSpec`] carrying the input when it does not
/// match the grammar or a field does not fit in a `u32`.
pub fn parse(spec: &str) -> Result<DurationMs> {
    let malformed = || TimeError::MalformedSpec(spec.to_string());
    let fields = Cursor::new(spec).fields().ok_or_else(malformed)?;

    let number = |text: Option<&str>| -> Result<Option<u32>> {
        text.map(|t| t.parse::<u32>().map_err(|_| malformed()))
            .transpose()
    };
    let years = number(fields.years)?;
    let months = number(fields.months)?;
    let days = number(fields.days)?;
    let hours = number(fields.hours)?;
    let minutes = number(fields.minutes)?;
    let mut seconds = number(fields.seconds)?;

    let mut microseconds = 0i64;
    if let Some(fraction) = fields.fraction {
        let value: f64 = format!("0.{fraction}").parse().map_err(|_| malformed())?;
        microseconds = to_microseconds(value);
        if microseconds == MICROS_PER_SECOND {
            microseconds = 0;
            seconds = Some(
                seconds
                    .unwrap_or(0)
                    .checked_add(1)
                    .ok_or_else(malformed)?,
            );
        }
    }

    let legacy = legacy_spec(years, months, days, hours, minutes, seconds);
    let calendar = CalendarDuration::from_spec(&legacy).map_err(|_| malformed())?;
    tracing::trace!(spec, legacy = %legacy, microseconds, "parsed duration spec");

    Ok(DurationMs::from_calendar(calendar).with_microseconds(microseconds))
}

/// Integer-only spec: empty `T` section omitted, a bare `P` becomes `""`.
fn legacy_spec(
    years: Option<u32>,
    months: Option<u32>,
    days: Option<u32>,
    hours: Option<u32>,
    minutes: Option<u32>,
    seconds: Option<u32>,
) -> String {
    let mut legacy = String::from("P");
    push_field(&mut legacy, years, 'Y');
    push_field(&mut legacy, months, 'M');
    push_field(&mut legacy, days, 'D');
    if hours.is_some() || minutes.is_some() || seconds.is_some() {
        legacy.push('T');
        push_field(&mut legacy, hours, 'H');
        push_field(&mut legacy, minutes, 'M');
        push_field(&mut legacy, seconds, 'S');
    }
    if legacy == "P" {
        legacy.clear();
    }
    legacy
}

fn push_field(spec: &mut String, value: Option<u32>, designator: char) {
    if let Some(value) = value {
        spec.push_str(&value.to_string());
        spec.push(designator);
    }
}

/// The raw digit runs of each field that was present.
#[derive(Debug, Default, PartialEq, Eq)]
struct Fields<'a> {
    years: Option<&'a str>,
    months: Option<&'a str>,
    days: Option<&'a str>,
    hours: Option<&'a str>,
    minutes: Option<&'a str>,
    seconds: Option<&'a str>,
    fraction: Option<&'a str>,
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn digits(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos > start {
            Some(&self.input[start..self.pos])
        } else {
            None
        }
    }

    /// `<digits><designator>`, or nothing (cursor untouched).
    fn field(&mut self, designator: u8) -> Option<&'a str> {
        let start = self.pos;
        if let Some(digits) = self.digits() {
            if self.eat(designator) {
                return Some(digits);
            }
        }
        self.pos = start;
        None
    }

    fn fields(mut self) -> Option<Fields<'a>> {
        if !self.eat(b'P') {
            return None;
        }
        let mut fields = Fields {
            years: self.field(b'Y'),
            months: self.field(b'M'),
            days: self.field(b'D'),
            ..Fields::default()
        };

        if self.eat(b'T') {
            fields.hours = self.field(b'H');
            fields.minutes = self.field(b'M');
            let start = self.pos;
            if let Some(whole) = self.digits() {
                let fraction = if self.eat(b'.') {
                    Some(self.digits()?)
                } else {
                    None
                };
                if self.eat(b'S') {
                    fields.seconds = Some(whole);
                    fields.fraction = fraction;
                } else {
                    self.pos = start;
                }
            }
            if fields.hours.is_none() && fields.minutes.is_none() && fields.seconds.is_none() {
                return None;
            }
        }

        (self.pos == self.input.len()).then_some(fields)
    }
}

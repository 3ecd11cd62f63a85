//! `DurationMs`: a calendar duration plus a microsecond component.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::calendar::CalendarDuration;
use crate::error::{Result, TimeError};
use crate::fixed_point::MICROS_PER_SECOND;

/// A calendar duration (years through whole seconds) with microseconds.
///
/// The calendar fields are non-negative and fixed at construction; the sign
/// of the whole duration lives in [`invert`](Self::invert) and applies to
/// the microseconds as well.
///
/// ```
/// use microtime::DurationMs;
///
/// let d: DurationMs = "P1DT0.999999S".parse().unwrap();
/// assert_eq!(d.days(), 1);
/// assert_eq!(d.microseconds(), 999_999);
/// assert_eq!(d.to_string(), "P1DT0.999999S");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationMs {
    #[serde(flatten)]
    calendar: CalendarDuration,
    microseconds: i64,
}

impl DurationMs {
    /// Parse `P[nY][nM][nD][T[nH][nM][n[.f]S]]`. See [`crate::spec::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::MalformedSpec`] when the text does not match.
    pub fn parse(spec: &str) -> Result<Self> {
        crate::spec::parse(spec)
    }

    /// The zero duration.
    pub fn zero() -> Self {
        Self::from_calendar(CalendarDuration::zero())
    }

    /// Wrap a whole-second calendar duration; microseconds start at zero.
    pub fn from_calendar(calendar: CalendarDuration) -> Self {
        Self {
            calendar,
            microseconds: 0,
        }
    }

    /// Builder form of [`set_microseconds`](Self::set_microseconds).
    pub fn with_microseconds(mut self, microseconds: i64) -> Self {
        self.microseconds = microseconds;
        self
    }

    pub fn years(&self) -> u32 {
        self.calendar.years
    }

    pub fn months(&self) -> u32 {
        self.calendar.months
    }

    pub fn days(&self) -> u32 {
        self.calendar.days
    }

    pub fn hours(&self) -> u32 {
        self.calendar.hours
    }

    pub fn minutes(&self) -> u32 {
        self.calendar.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.calendar.seconds
    }

    /// True when the duration is negative.
    pub fn invert(&self) -> bool {
        self.calendar.invert
    }

    pub fn set_invert(&mut self, invert: bool) {
        self.calendar.invert = invert;
    }

    /// A copy with the sign flipped.
    pub fn negated(&self) -> Self {
        let mut negated = self.clone();
        negated.calendar.invert = !negated.calendar.invert;
        negated
    }

    /// The microsecond component, before the duration's sign is applied.
    ///
    /// Parsed and diffed durations keep it in `0..=999_999`, but
    /// [`set_microseconds`](Self::set_microseconds) stores any `i64` as given,
    /// negative or past a whole second included.
    pub fn microseconds(&self) -> i64 {
        self.microseconds
    }

    pub fn set_microseconds(&mut self, microseconds: i64) {
        self.microseconds = microseconds;
    }

    /// The microsecond component with the sign of the duration applied.
    pub fn signed_microseconds(&self) -> i64 {
        if self.invert() {
            self.microseconds.saturating_neg()
        } else {
            self.microseconds
        }
    }

    /// Whole days between the two instants, for durations made by a diff.
    pub fn total_days(&self) -> Option<i64> {
        self.calendar.total_days
    }

    /// The whole-second calendar part.
    pub fn calendar(&self) -> &CalendarDuration {
        &self.calendar
    }

    /// True when every field and the microseconds are zero.
    pub fn is_zero(&self) -> bool {
        self.calendar.is_zero() && self.microseconds == 0
    }

    /// Exact signed length in microseconds. `None` when the duration has
    /// year or month fields, whose length depends on where it is applied.
    pub fn total_microseconds(&self) -> Option<i128> {
        if self.calendar.years != 0 || self.calendar.months != 0 {
            return None;
        }
        let seconds = self.calendar.days as i128 * 86_400
            + self.calendar.hours as i128 * 3_600
            + self.calendar.minutes as i128 * 60
            + self.calendar.seconds as i128;
        let total = seconds * MICROS_PER_SECOND as i128 + self.microseconds as i128;
        Some(if self.invert() { -total } else { total })
    }

    /// Serialize to the spec grammar, trailing fraction zeros trimmed
    /// (`PT59.9S`, `P1DT0.999999S`). The zero duration is `PT0S`. The sign is
    /// not part of the grammar; see the `Display` impl.
    pub fn to_spec_string(&self) -> String {
        let carry = self.microseconds.div_euclid(MICROS_PER_SECOND);
        let micros = self.microseconds.rem_euclid(MICROS_PER_SECOND);
        let seconds = self.calendar.seconds as i64 + carry;

        let mut spec = String::from("P");
        for (value, designator) in [
            (self.calendar.years, 'Y'),
            (self.calendar.months, 'M'),
            (self.calendar.days, 'D'),
        ] {
            if value != 0 {
                spec.push_str(&format!("{value}{designator}"));
            }
        }

        let has_time =
            self.calendar.hours != 0 || self.calendar.minutes != 0 || seconds != 0 || micros != 0;
        if has_time {
            spec.push('T');
            if self.calendar.hours != 0 {
                spec.push_str(&format!("{}H", self.calendar.hours));
            }
            if self.calendar.minutes != 0 {
                spec.push_str(&format!("{}M", self.calendar.minutes));
            }
            if seconds != 0 || micros != 0 {
                spec.push_str(&seconds.to_string());
                if micros != 0 {
                    let fraction = format!("{micros:06}");
                    spec.push('.');
                    spec.push_str(fraction.trim_end_matches('0'));
                }
                spec.push('S');
            }
        }

        if spec.len() == 1 {
            spec.push_str("T0S");
        }
        spec
    }

    /// Render with `%`-placeholders. `%U` is the microseconds padded to six
    /// digits and `%u` the bare count; everything else is handled by
    /// [`CalendarDuration::format`].
    ///
    /// ```
    /// use microtime::DurationMs;
    ///
    /// let d = DurationMs::parse("PT1H59M59.999999S").unwrap();
    /// assert_eq!(d.format("%H:%I:%S.%U"), "01:59:59.999999");
    /// assert_eq!(DurationMs::parse("PT0.05S").unwrap().format("%u us"), "50000 us");
    /// ```
    pub fn format(&self, pattern: &str) -> String {
        let pattern = pattern
            .replace("%U", &format!("{:06}", self.microseconds))
            .replace("%u", &self.microseconds.to_string());
        self.calendar.format(&pattern)
    }
}

impl Default for DurationMs {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<CalendarDuration> for DurationMs {
    fn from(calendar: CalendarDuration) -> Self {
        Self::from_calendar(calendar)
    }
}

impl FromStr for DurationMs {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DurationMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.invert() && !self.is_zero() {
            f.write_str("-")?;
        }
        f.write_str(&self.to_spec_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_spec_string_trims_fraction() {
        assert_eq!(DurationMs::parse("PT59.900S").unwrap().to_spec_string(), "PT59.9S");
        assert_eq!(
            DurationMs::parse("P1DT0.999999S").unwrap().to_spec_string(),
            "P1DT0.999999S"
        );
        assert_eq!(
            DurationMs::parse("PT0.000001S").unwrap().to_spec_string(),
            "PT0.000001S"
        );
    }

    #[test]
    fn test_to_spec_string_zero() {
        assert_eq!(DurationMs::zero().to_spec_string(), "PT0S");
        assert_eq!(DurationMs::parse("P").unwrap().to_spec_string(), "PT0S");
    }

    #[test]
    fn test_to_spec_string_normalizes_unnormalized_micros() {
        let d = DurationMs::parse("PT1S").unwrap().with_microseconds(1_500_000);
        assert_eq!(d.to_spec_string(), "PT2.5S");
    }

    #[test]
    fn test_display_sign() {
        let d = DurationMs::parse("PT0.2S").unwrap();
        assert_eq!(d.to_string(), "PT0.2S");
        assert_eq!(d.negated().to_string(), "-PT0.2S");
        assert_eq!(DurationMs::zero().negated().to_string(), "PT0S");
    }

    #[test]
    fn test_negated_leaves_original() {
        let d = DurationMs::parse("P1D").unwrap();
        let n = d.negated();
        assert!(!d.invert());
        assert!(n.invert());
        assert_eq!(n.negated(), d);
    }

    #[test]
    fn test_signed_microseconds() {
        let mut d = DurationMs::parse("PT0.25S").unwrap();
        assert_eq!(d.signed_microseconds(), 250_000);
        d.set_invert(true);
        assert_eq!(d.signed_microseconds(), -250_000);
    }

    #[test]
    fn test_microseconds_keeps_unnormalized_value() {
        let mut d = DurationMs::zero();
        d.set_microseconds(-1_500_000);
        assert_eq!(d.microseconds(), -1_500_000);
        assert_eq!(d.signed_microseconds(), -1_500_000);
        d.set_invert(true);
        assert_eq!(d.signed_microseconds(), 1_500_000);
        d.set_microseconds(i64::MIN);
        assert_eq!(d.signed_microseconds(), i64::MAX);
    }

    #[test]
    fn test_total_microseconds() {
        let d = DurationMs::parse("P1DT1H0.5S").unwrap();
        assert_eq!(d.total_microseconds(), Some(90_000_500_000));
        assert_eq!(d.negated().total_microseconds(), Some(-90_000_500_000));
        assert_eq!(DurationMs::parse("P1M").unwrap().total_microseconds(), None);
    }

    #[test]
    fn test_format_micro_placeholders() {
        let d = DurationMs::parse("PT3.000042S").unwrap();
        assert_eq!(d.format("%s.%U"), "3.000042");
        assert_eq!(d.format("%u"), "42");
        assert_eq!(d.format("%%U"), "%000042");
    }

    #[test]
    fn test_format_sign_and_fields() {
        let d = DurationMs::parse("P1DT2H").unwrap().negated();
        assert_eq!(d.format("%r%d %h"), "-1 2");
    }

    #[test]
    fn test_from_calendar() {
        let calendar = CalendarDuration::from_spec("PT5M").unwrap();
        let d: DurationMs = calendar.into();
        assert_eq!(d.minutes(), 5);
        assert_eq!(d.microseconds(), 0);
        assert_eq!(d.calendar(), &calendar);
    }

    #[test]
    fn test_from_str_error() {
        let err = "P1X".parse::<DurationMs>().unwrap_err();
        assert_eq!(err, TimeError::MalformedSpec("P1X".into()));
    }

    #[test]
    fn test_serialize_fields() {
        let d = DurationMs::parse("PT1.5S").unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["seconds"], 1);
        assert_eq!(json["microseconds"], 500_000);
        assert_eq!(json["invert"], false);
        assert!(json["total_days"].is_null());
    }
}

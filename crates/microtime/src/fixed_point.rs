//! Fixed-point seconds: the carry/borrow primitive shared by every mutating
//! operation on an [`InstantMs`](crate::InstantMs).
//!
//! The sub-second part of an instant is kept as a seconds fraction in
//! `[0, 1)`. Adding a microsecond delta may push that fraction outside the
//! interval; [`apply_delta`] folds the excess back into whole seconds and
//! reports it as a carry (positive) or borrow (negative) for the owner to
//! apply to its calendar instant.

/// There are this many microseconds in one second.
pub const MICROS_PER_SECOND: i64 = 1_000_000;

const MICROS_PER_SECOND_F: f64 = MICROS_PER_SECOND as f64;

/// Round a seconds value to 6 decimal places, half away from zero.
fn round6(seconds: f64) -> f64 {
    (seconds * MICROS_PER_SECOND_F).round() / MICROS_PER_SECOND_F
}

/// Convert a seconds fraction to an integer count of microseconds.
///
/// The value is rounded at the 6th decimal (half away from zero), so
/// `0.57` yields `570000` even though `0.57 * 1e6` is slightly below it in
/// binary floating point.
///
/// ```
/// use microtime::fixed_point::to_microseconds;
///
/// assert_eq!(to_microseconds(0.34), 340_000);
/// assert_eq!(to_microseconds(0.9999994), 999_999);
/// assert_eq!(to_microseconds(-0.25), -250_000);
/// ```
pub fn to_microseconds(fraction: f64) -> i64 {
    (fraction * MICROS_PER_SECOND_F).round() as i64
}

/// Convert an integer count of microseconds to seconds, precise to 6 decimals.
///
/// ```
/// use microtime::fixed_point::to_fraction;
///
/// assert_eq!(to_fraction(900_000), 0.9);
/// assert_eq!(to_fraction(-1), -0.000001);
/// ```
pub fn to_fraction(microseconds: i64) -> f64 {
    round6(microseconds as f64 / MICROS_PER_SECOND_F)
}

/// Add `delta_microseconds` to `current` and normalize the result to `[0, 1)`.
///
/// Returns the new fraction and the whole-second carry that the caller must
/// apply to its calendar instant so that `carry + fraction` equals
/// `current + delta / 1e6`. A zero delta returns `current` untouched with no
/// carry, so callers can skip touching calendar fields.
///
/// ```
/// use microtime::fixed_point::apply_delta;
///
/// assert_eq!(apply_delta(0.5, 600_000), (0.1, 1));
/// assert_eq!(apply_delta(0.0, -2), (0.999998, -1));
/// assert_eq!(apply_delta(0.25, 0), (0.25, 0));
/// ```
pub fn apply_delta(current: f64, delta_microseconds: i64) -> (f64, i64) {
    if delta_microseconds == 0 {
        return (current, 0);
    }

    let mut sum = current + to_fraction(delta_microseconds);
    let mut carry = 0i64;

    if sum < 0.0 {
        let borrow = (-sum).ceil();
        sum += borrow;
        carry -= borrow as i64;
    } else if sum >= 1.0 {
        let overflow = sum.floor();
        sum -= overflow;
        carry += overflow as i64;
    }

    // Floating point residue may land the sum a hair below 1.0, which rounds
    // up to a full second at 6 decimals.
    let mut fraction = round6(sum);
    if fraction >= 1.0 {
        fraction -= 1.0;
        carry += 1;
    }

    (fraction, carry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_microseconds_rounds_at_sixth_decimal() {
        assert_eq!(to_microseconds(0.57), 570_000);
        assert_eq!(to_microseconds(0.29), 290_000);
        assert_eq!(to_microseconds(0.0000006), 1);
        assert_eq!(to_microseconds(0.0000004), 0);
    }

    #[test]
    fn test_to_microseconds_zero_and_near_one() {
        assert_eq!(to_microseconds(0.0), 0);
        assert_eq!(to_microseconds(0.999999), 999_999);
        assert_eq!(to_microseconds(0.9999996), 1_000_000);
    }

    #[test]
    fn test_to_fraction_exact_six_digits() {
        assert_eq!(to_fraction(1), 0.000001);
        assert_eq!(to_fraction(340_000), 0.34);
        assert_eq!(to_fraction(999_999), 0.999999);
        assert_eq!(to_fraction(2_500_000), 2.5);
    }

    #[test]
    fn test_apply_delta_no_carry() {
        assert_eq!(apply_delta(0.1, 200_000), (0.3, 0));
    }

    #[test]
    fn test_apply_delta_zero_is_noop() {
        assert_eq!(apply_delta(0.123456, 0), (0.123456, 0));
    }

    #[test]
    fn test_apply_delta_borrow_single_second() {
        let (fraction, carry) = apply_delta(0.34, -340_001);
        assert_eq!(carry, -1);
        assert_eq!(to_microseconds(fraction), 999_999);
    }

    #[test]
    fn test_apply_delta_borrow_multiple_seconds() {
        let (fraction, carry) = apply_delta(0.5, -3_000_000);
        assert_eq!(carry, -3);
        assert_eq!(fraction, 0.5);
    }

    #[test]
    fn test_apply_delta_overflow_multiple_seconds() {
        let (fraction, carry) = apply_delta(0.75, 2_500_000);
        assert_eq!(carry, 3);
        assert_eq!(fraction, 0.25);
    }

    #[test]
    fn test_apply_delta_exact_one_second_boundary() {
        let (fraction, carry) = apply_delta(0.999999, 1);
        assert_eq!(carry, 1);
        assert_eq!(fraction, 0.0);
    }

    #[test]
    fn test_apply_delta_negative_landing_on_zero() {
        let (fraction, carry) = apply_delta(0.5, -500_000);
        assert_eq!(carry, 0);
        assert_eq!(fraction, 0.0);
    }

    #[test]
    fn test_apply_delta_fraction_always_in_unit_interval() {
        for delta in [-2_000_001, -999_999, -1, 1, 999_999, 1_000_000, 7_654_321] {
            let (fraction, _) = apply_delta(0.654321, delta);
            assert!((0.0..1.0).contains(&fraction), "delta {delta} gave {fraction}");
        }
    }
}

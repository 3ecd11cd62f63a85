//! # microtime
//!
//! Microsecond-precision instants and durations on top of whole-second
//! calendar arithmetic.
//!
//! Calendar math (months, days, DST, timezones) is done at whole-second
//! granularity by [`calendar`]. The sub-second part is carried separately and
//! folded back with exact carry/borrow, so adding, subtracting, diffing and
//! comparing never lose a microsecond to floating point drift.
//!
//! ## Modules
//!
//! - [`instant`] — `InstantMs`: parse, add/sub, diff, compare, modify, format
//! - [`duration`] — `DurationMs`: calendar fields plus microseconds
//! - [`spec`] — `P…T…S` duration specs with fractional seconds
//! - [`relative`] — microsecond phrases in relative text (`next microsecond`)
//! - [`fixed_point`] — the fraction/microsecond carry primitive
//! - [`calendar`] — whole-second calendar engine built on chrono and chrono-tz
//! - [`error`] — Error types
//!
//! ```
//! use microtime::{DurationMs, InstantMs};
//!
//! let a = InstantMs::parse("2014-10-10 10:00:00.0").unwrap();
//! let b = InstantMs::parse("2014-10-11 09:59:59.999999").unwrap();
//! let d = a.diff(&b, false);
//! assert_eq!(d, DurationMs::parse("PT23H59M59.999999S").unwrap());
//! ```

pub mod calendar;
pub mod duration;
pub mod error;
pub mod fixed_point;
pub mod instant;
pub mod relative;
pub mod spec;

pub use calendar::{parse_timezone, CalendarDuration, ParseOptions};
pub use duration::DurationMs;
pub use error::{Result, TimeError};
pub use instant::InstantMs;
pub use relative::{extract, has_reset_keyword, Extracted, MicrosecondToken};

//! Pattern rendering for instants and calendar durations.
//!
//! Instants use single-letter date patterns (`Y-m-d H:i:s`, `D, d M Y`, …)
//! with `\` escaping the next character. Durations use `%`-placeholders
//! (`%d days %H:%I:%S`).

use chrono::{DateTime, Datelike, Offset, Timelike};
use chrono_tz::{OffsetComponents, Tz};

use super::{days_in_month, sub_second_micros, CalendarDuration};

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ── Instants ────────────────────────────────────────────────────────────────

/// Render `datetime` with a date pattern.
///
/// | Letter | Output |
/// |--------|--------|
/// | `d` `j` | day of month, padded / bare |
/// | `D` `l` | weekday name, short / full |
/// | `N` `w` | ISO weekday 1-7 / weekday 0 (Sunday)-6 |
/// | `S` | English ordinal suffix of the day |
/// | `z` | day of year, starting at 0 |
/// | `W` `o` | ISO week number / ISO week-numbering year |
/// | `F` `M` `m` `n` | month name full / short, number padded / bare |
/// | `t` `L` | days in month / leap year flag |
/// | `Y` `y` | year, full / two digits |
/// | `a` `A` | am/pm, lower / upper |
/// | `g` `G` `h` `H` | hour, 12h bare / 24h bare / 12h padded / 24h padded |
/// | `i` `s` | minutes / seconds, padded |
/// | `u` `v` | microseconds / milliseconds of the value |
/// | `e` `T` `I` | zone name / abbreviation / DST flag |
/// | `O` `P` `p` `Z` | offset `+0200` / `+02:00` / `Z` for UTC / seconds |
/// | `c` `r` `U` | ISO 8601 / RFC 2822 / unix timestamp |
///
/// Any other character is copied. `\x` outputs `x` literally.
pub fn format_datetime(datetime: &DateTime<Tz>, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }
        push_letter(&mut out, datetime, c);
    }
    out
}

fn push_letter(out: &mut String, dt: &DateTime<Tz>, letter: char) {
    let weekday = dt.weekday().num_days_from_monday() as usize;
    let month = dt.month0() as usize;
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };

    let piece = match letter {
        'd' => format!("{:02}", dt.day()),
        'D' => DAY_NAMES[weekday][..3].to_string(),
        'j' => dt.day().to_string(),
        'l' => DAY_NAMES[weekday].to_string(),
        'N' => (weekday + 1).to_string(),
        'S' => ordinal_suffix(dt.day()).to_string(),
        'w' => dt.weekday().num_days_from_sunday().to_string(),
        'z' => dt.ordinal0().to_string(),
        'W' => format!("{:02}", dt.iso_week().week()),
        'F' => MONTH_NAMES[month].to_string(),
        'm' => format!("{:02}", dt.month()),
        'M' => MONTH_NAMES[month][..3].to_string(),
        'n' => dt.month().to_string(),
        't' => days_in_month(dt.year(), dt.month()).to_string(),
        'L' => u8::from(is_leap_year(dt.year())).to_string(),
        'o' => dt.iso_week().year().to_string(),
        'Y' => format!("{:04}", dt.year()),
        'y' => format!("{:02}", dt.year().rem_euclid(100)),
        'a' => String::from(if dt.hour() < 12 { "am" } else { "pm" }),
        'A' => String::from(if dt.hour() < 12 { "AM" } else { "PM" }),
        'g' => hour12.to_string(),
        'G' => dt.hour().to_string(),
        'h' => format!("{:02}", hour12),
        'H' => format!("{:02}", dt.hour()),
        'i' => format!("{:02}", dt.minute()),
        's' => format!("{:02}", dt.second()),
        'u' => format!("{:06}", sub_second_micros(dt)),
        'v' => format!("{:03}", sub_second_micros(dt) / 1_000),
        'e' => dt.timezone().name().to_string(),
        'I' => u8::from(is_dst_active(dt)).to_string(),
        'T' => dt.format("%Z").to_string(),
        'O' => format_utc_offset(dt, ""),
        'P' => format_utc_offset(dt, ":"),
        'p' => {
            if offset_seconds(dt) == 0 {
                "Z".to_string()
            } else {
                format_utc_offset(dt, ":")
            }
        }
        'Z' => offset_seconds(dt).to_string(),
        'c' => format_datetime(dt, "Y-m-d\\TH:i:sP"),
        'r' => format_datetime(dt, "D, d M Y H:i:s O"),
        'U' => dt.timestamp().to_string(),
        other => {
            out.push(other);
            return;
        }
    };
    out.push_str(&piece);
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Whether the zone is observing daylight saving time at `dt`.
fn is_dst_active(dt: &DateTime<Tz>) -> bool {
    dt.offset().dst_offset() != chrono::Duration::zero()
}

fn offset_seconds(dt: &DateTime<Tz>) -> i32 {
    dt.offset().fix().local_minus_utc()
}

/// Format the UTC offset (e.g. "-05:00" with `separator = ":"`, "+0900" without).
fn format_utc_offset(dt: &DateTime<Tz>, separator: &str) -> String {
    let offset_secs = offset_seconds(dt);
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    format!("{sign}{hours:02}{separator}{minutes:02}")
}

// ── Durations ───────────────────────────────────────────────────────────────

/// Render a calendar duration with `%`-placeholders.
///
/// `%Y %M %D %H %I %S` print the field padded to two digits, their lowercase
/// forms print it bare. `%a` is the total number of days of a diff (or
/// `(unknown)`), `%R` the sign as `+`/`-`, `%r` the sign as `-` or nothing,
/// `%%` a literal percent. Unknown placeholders are copied unchanged.
pub fn format_duration(duration: &CalendarDuration, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(code) = chars.next() else {
            out.push('%');
            break;
        };
        match code {
            'Y' => out.push_str(&format!("{:02}", duration.years)),
            'y' => out.push_str(&duration.years.to_string()),
            'M' => out.push_str(&format!("{:02}", duration.months)),
            'm' => out.push_str(&duration.months.to_string()),
            'D' => out.push_str(&format!("{:02}", duration.days)),
            'd' => out.push_str(&duration.days.to_string()),
            'H' => out.push_str(&format!("{:02}", duration.hours)),
            'h' => out.push_str(&duration.hours.to_string()),
            'I' => out.push_str(&format!("{:02}", duration.minutes)),
            'i' => out.push_str(&duration.minutes.to_string()),
            'S' => out.push_str(&format!("{:02}", duration.seconds)),
            's' => out.push_str(&duration.seconds.to_string()),
            'a' => match duration.total_days {
                Some(days) => out.push_str(&days.to_string()),
                None => out.push_str("(unknown)"),
            },
            'R' => out.push(if duration.invert { '-' } else { '+' }),
            'r' => {
                if duration.invert {
                    out.push('-');
                }
            }
            '%' => out.push('%'),
            other => {
                out.push('%');
                out.push(other);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        Tz::UTC.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_format_common_pattern() {
        let dt = utc(2014, 10, 9, 9, 17, 50);
        assert_eq!(format_datetime(&dt, "Y-m-d H:i:s"), "2014-10-09 09:17:50");
    }

    #[test]
    fn test_format_names_and_suffixes() {
        let dt = utc(2014, 10, 1, 21, 5, 0);
        assert_eq!(format_datetime(&dt, "l jS F"), "Wednesday 1st October");
        assert_eq!(format_datetime(&dt, "D, M"), "Wed, Oct");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(23), "rd");
    }

    #[test]
    fn test_format_twelve_hour_clock() {
        assert_eq!(format_datetime(&utc(2014, 10, 9, 0, 5, 0), "g:i a"), "12:05 am");
        assert_eq!(format_datetime(&utc(2014, 10, 9, 21, 5, 0), "h A G"), "09 PM 21");
    }

    #[test]
    fn test_format_escape() {
        let dt = utc(2014, 10, 9, 9, 17, 50);
        assert_eq!(format_datetime(&dt, "\\Y\\-Y"), "Y-2014");
        assert_eq!(format_datetime(&dt, "H\\h"), "09h");
    }

    #[test]
    fn test_format_iso_and_rfc() {
        let dt = utc(2014, 10, 9, 9, 17, 50);
        assert_eq!(format_datetime(&dt, "c"), "2014-10-09T09:17:50+00:00");
        assert_eq!(format_datetime(&dt, "r"), "Thu, 09 Oct 2014 09:17:50 +0000");
        assert_eq!(format_datetime(&dt, "U"), "1412846270");
        assert_eq!(format_datetime(&dt, "p"), "Z");
    }

    #[test]
    fn test_format_zone_letters() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let summer = tz.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
        assert_eq!(
            format_datetime(&summer, "e T I O P Z"),
            "America/New_York EDT 1 -0400 -04:00 -14400"
        );
        let winter = tz.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(format_datetime(&winter, "T I"), "EST 0");
    }

    #[test]
    fn test_format_dst_southern_hemisphere() {
        let tz: Tz = "Australia/Sydney".parse().unwrap();
        let january = tz.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(format_datetime(&january, "I"), "1");
    }

    #[test]
    fn test_format_calendar_numbers() {
        let dt = utc(2024, 2, 29, 0, 0, 0);
        assert_eq!(format_datetime(&dt, "t L z N w"), "29 1 59 4 4");
        assert_eq!(format_datetime(&utc(2021, 1, 3, 0, 0, 0), "W o"), "53 2020");
    }

    #[test]
    fn test_format_whole_second_value_has_zero_micros() {
        let dt = utc(2014, 10, 9, 9, 17, 50);
        assert_eq!(format_datetime(&dt, "u v"), "000000 000");
    }

    #[test]
    fn test_format_duration_fields() {
        let d = CalendarDuration::from_spec("P1Y2M3DT4H5M6S").unwrap();
        assert_eq!(format_duration(&d, "%Y-%M-%D %H:%I:%S"), "01-02-03 04:05:06");
        assert_eq!(format_duration(&d, "%y %m %d %h %i %s"), "1 2 3 4 5 6");
    }

    #[test]
    fn test_format_duration_sign() {
        let mut d = CalendarDuration::from_spec("PT1H").unwrap();
        assert_eq!(format_duration(&d, "%R%h %r"), "+1 ");
        d.invert = true;
        assert_eq!(format_duration(&d, "%R%h %r"), "-1 -");
    }

    #[test]
    fn test_format_duration_total_days() {
        let mut d = CalendarDuration::from_spec("P1D").unwrap();
        assert_eq!(format_duration(&d, "%a"), "(unknown)");
        d.total_days = Some(31);
        assert_eq!(format_duration(&d, "%a days"), "31 days");
    }

    #[test]
    fn test_format_duration_literals() {
        let d = CalendarDuration::zero();
        assert_eq!(format_duration(&d, "100%% %q %"), "100% %q %");
    }
}

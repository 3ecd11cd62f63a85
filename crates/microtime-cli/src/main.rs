//! `microtime`: microsecond-precision date/time arithmetic on the command line.
//!
//! ```text
//! microtime parse "2014-10-09 09:17:50.34"
//! microtime diff "10:00:00.4" "12:00:00.399999"
//! microtime modify "2014-10-09 09:17:50.5" "-3 microseconds tomorrow next microsecond"
//! microtime interval PT59.9S --pattern "%s.%U"
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use microtime::{DurationMs, InstantMs, ParseOptions};
use serde::Serialize;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

#[derive(Debug, Parser)]
#[command(
    name = "microtime",
    version,
    about = "Microsecond-precision date/time arithmetic",
    long_about = None
)]
struct Cli {
    /// IANA timezone used to read and print instants
    #[arg(long, global = true, env = "MICROTIME_TZ", default_value = "UTC")]
    tz: String,

    /// Fixed "now" (RFC 3339) for relative text such as "tomorrow" or "12:00"
    #[arg(long, global = true, value_parser = parse_anchor)]
    anchor: Option<DateTime<Utc>>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Read instants with this chrono pattern (e.g. "%d/%m/%Y %H:%M:%S%.f")
    /// instead of free-form text
    #[arg(long, global = true)]
    input_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse date/time text and print the instant
    Parse {
        text: String,
        /// Date pattern for the output (e.g. "Y-m-d H:i:s.u")
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Render an instant with a date pattern
    Format { text: String, pattern: String },
    /// Duration from the first instant to the second
    Diff {
        from: String,
        to: String,
        /// Never report a negative duration
        #[arg(long)]
        absolute: bool,
        /// Duration pattern for the output (e.g. "%H:%I:%S.%U")
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Add a duration spec (e.g. PT0.25S) to an instant
    Add {
        text: String,
        spec: String,
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Subtract a duration spec from an instant
    Sub {
        text: String,
        spec: String,
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Apply relative text (e.g. "+1 day previous microsecond") to an instant
    Modify {
        text: String,
        modifier: String,
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Parse a duration spec and print it normalized
    Interval {
        spec: String,
        #[arg(long)]
        pattern: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct InstantReport<'a> {
    instant: &'a InstantMs,
    timezone: &'a str,
    timestamp: i64,
    microsecond: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    formatted: Option<String>,
}

#[derive(Debug, Serialize)]
struct DurationReport<'a> {
    spec: String,
    #[serde(flatten)]
    duration: &'a DurationMs,
    #[serde(skip_serializing_if = "Option::is_none")]
    formatted: Option<String>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = Registry::default()
        .with(filter)
        .with(subscriber_fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn parse_anchor(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

fn run(cli: &Cli) -> Result<String> {
    let mut options = ParseOptions::default()
        .with_timezone(&cli.tz)
        .with_context(|| format!("--tz {}", cli.tz))?;
    if let Some(anchor) = cli.anchor {
        options = options.with_anchor(anchor);
    }
    tracing::debug!(tz = %cli.tz, anchor = ?cli.anchor, "options");

    match &cli.command {
        Command::Parse { text, pattern } => {
            let instant = read_instant(cli, text, &options)?;
            render_instant(cli, &instant, pattern.as_deref())
        }
        Command::Format { text, pattern } => {
            let instant = read_instant(cli, text, &options)?;
            render_instant(cli, &instant, Some(pattern))
        }
        Command::Diff {
            from,
            to,
            absolute,
            pattern,
        } => {
            let from = read_instant(cli, from, &options)?;
            let to = read_instant(cli, to, &options)?;
            let duration = from.diff(&to, *absolute);
            render_duration(cli, &duration, pattern.as_deref())
        }
        Command::Add {
            text,
            spec,
            pattern,
        } => {
            let mut instant = read_instant(cli, text, &options)?;
            instant
                .add(&read_duration(spec)?)
                .with_context(|| format!("cannot add '{spec}'"))?;
            render_instant(cli, &instant, pattern.as_deref())
        }
        Command::Sub {
            text,
            spec,
            pattern,
        } => {
            let mut instant = read_instant(cli, text, &options)?;
            instant
                .sub(&read_duration(spec)?)
                .with_context(|| format!("cannot subtract '{spec}'"))?;
            render_instant(cli, &instant, pattern.as_deref())
        }
        Command::Modify {
            text,
            modifier,
            pattern,
        } => {
            let mut instant = read_instant(cli, text, &options)?;
            instant
                .modify(modifier)
                .with_context(|| format!("cannot apply '{modifier}'"))?;
            render_instant(cli, &instant, pattern.as_deref())
        }
        Command::Interval { spec, pattern } => {
            let duration = read_duration(spec)?;
            render_duration(cli, &duration, pattern.as_deref())
        }
    }
}

fn read_instant(cli: &Cli, text: &str, options: &ParseOptions) -> Result<InstantMs> {
    let instant = match &cli.input_format {
        Some(pattern) => InstantMs::parse_from_format(pattern, text, options.timezone),
        None => InstantMs::parse_with(text, options),
    };
    instant.with_context(|| format!("cannot parse instant '{text}'"))
}

fn read_duration(spec: &str) -> Result<DurationMs> {
    DurationMs::parse(spec).with_context(|| format!("cannot parse duration '{spec}'"))
}

fn render_instant(cli: &Cli, instant: &InstantMs, pattern: Option<&str>) -> Result<String> {
    let formatted = pattern.map(|p| instant.format(p));
    if !cli.json {
        return Ok(formatted.unwrap_or_else(|| instant.to_string()));
    }
    let report = InstantReport {
        instant,
        timezone: instant.timezone().name(),
        timestamp: instant.timestamp(),
        microsecond: instant.microsecond(),
        formatted,
    };
    serde_json::to_string_pretty(&report).context("serializing instant")
}

fn render_duration(cli: &Cli, duration: &DurationMs, pattern: Option<&str>) -> Result<String> {
    let formatted = pattern.map(|p| duration.format(p));
    if !cli.json {
        return Ok(formatted.unwrap_or_else(|| duration.to_string()));
    }
    let report = DurationReport {
        spec: duration.to_string(),
        duration,
        formatted,
    };
    serde_json::to_string_pretty(&report).context("serializing duration")
}

//! `timex`: resolve temporal expressions and print TIMEX3 attributes as JSON.

use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use serde_json::json;
use temporal_algebra::{
    parse_duration, parse_temporal, Flags, Temporal, TemporalOp, TemporalValue, Time,
    TimeUnit, TimexAnnotator, TimexOptions,
};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "timex")]
#[command(version, about = "Resolve temporal expressions into TIMEX3 values", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an expression against an anchor time
    Resolve {
        /// Canonical value (XXXX-06, 2016-W25-1, P1W) or a name (monday, summer)
        expr: String,
        /// Anchor time: YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS
        #[arg(short, long)]
        anchor: String,
        /// Operator applied with the anchor as reference (next, prev, this, ...)
        #[arg(long)]
        op: Option<TemporalOp>,
        /// Prefer the occurrence at or before the anchor
        #[arg(long, conflicts_with_all = ["future", "closest"])]
        past: bool,
        /// Prefer the occurrence at or after the anchor
        #[arg(long, conflicts_with = "closest")]
        future: bool,
        /// Prefer the occurrence nearest the anchor
        #[arg(long)]
        closest: bool,
        /// JSON file with annotation options
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the canonical value of a duration
    Duration {
        /// TIMEX3 duration, e.g. P20Y or PT90M
        expr: String,
        /// Restrict output to this unit and finer ones (repeatable)
        #[arg(long = "force", value_name = "UNIT")]
        force: Vec<String>,
        /// Render amounts as X
        #[arg(long)]
        approx: bool,
    },
}

fn parse_anchor(s: &str) -> Result<Time> {
    let instant = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .with_context(|| format!("invalid anchor time: {s}"))?;
    Ok(Time::grounded(instant))
}

fn load_options(path: Option<&PathBuf>) -> Result<TimexOptions> {
    let Some(path) = path else {
        return Ok(TimexOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    TimexOptions::from_json_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn direction(past: bool, future: bool, closest: bool) -> Flags {
    let mut flags = Flags::NONE;
    if past {
        flags |= Flags::RESOLVE_TO_PAST;
    }
    if future {
        flags |= Flags::RESOLVE_TO_FUTURE;
    }
    if closest {
        flags |= Flags::RESOLVE_TO_CLOSEST;
    }
    flags
}

fn resolve(
    expr: &str,
    anchor: &str,
    op: Option<TemporalOp>,
    flags: Flags,
    config: Option<&PathBuf>,
) -> Result<serde_json::Value> {
    let anchor = parse_anchor(anchor)?;
    let options = load_options(config)?;
    let value = parse_temporal(expr).ok_or_else(|| anyhow!("unrecognized expression: {expr}"))?;
    debug!(%value, ?op, %flags, "parsed expression");

    let value = match op {
        Some(op) => op
            .apply(Some(&Temporal::Time(anchor.clone())), Some(&value), flags)
            .with_context(|| format!("failed to apply {op}"))?
            .ok_or_else(|| anyhow!("{op} of {expr} is empty"))?,
        None if !flags.is_empty() => value
            .resolve(&anchor, flags)
            .with_context(|| format!("failed to resolve {expr}"))?,
        None => value,
    };

    let mut annotator = TimexAnnotator::new(anchor, options);
    let attrs = annotator
        .annotate(expr, &value)
        .with_context(|| format!("failed to annotate {expr}"))?;
    Ok(serde_json::to_value(attrs)?)
}

fn duration(expr: &str, force: &[String], approx: bool) -> Result<serde_json::Value> {
    let parsed = parse_duration(expr).ok_or_else(|| anyhow!("unrecognized duration: {expr}"))?;
    let units = force
        .iter()
        .map(|name| TimeUnit::from_name(name).ok_or_else(|| anyhow!("unknown unit: {name}")))
        .collect::<Result<Vec<_>>>()?;
    let parsed = if approx { parsed.with_approx(true) } else { parsed };
    let Some(value) = parsed.timex_value_with(&units) else {
        bail!("{expr} has no canonical value");
    };
    Ok(json!({
        "type": parsed.timex_type(),
        "value": value,
    }))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let output = match &cli.command {
        Command::Resolve {
            expr,
            anchor,
            op,
            past,
            future,
            closest,
            config,
        } => resolve(expr, anchor, *op, direction(*past, *future, *closest), config.as_ref())?,
        Command::Duration { expr, force, approx } => duration(expr, force, *approx)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

//! Canonical TIMEX3-style strings for partial values, grounded spans and
//! periods.
//!
//! Three renderers live here:
//!
//! - [`format_partial`]: `2016-06`, `XXXX-WXX-1`, `19XX`, `T10:30`
//! - [`timex_date_range`]: the compact name of a grounded `[begin, end)`
//!   span (`2016-Q2`, `2016-W24-WE`, `2016-06-19TMO`), patterns tried in a
//!   fixed order
//! - [`timex_duration`]: `P2E`, `P1Y2M`, `PT2H30M`, with forced units and
//!   approximate digits

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::field::{FieldType, TimeUnit};
use crate::partial::Partial;
use crate::period::Period;

// ── Partial values ──────────────────────────────────────────────────────────

fn year_part(p: &Partial) -> Option<String> {
    if let Some(year) = p.get(FieldType::Year) {
        return Some(format!("{year:04}"));
    }
    let yoc = p.get(FieldType::YearOfCentury);
    let decade = p.get(FieldType::DecadeOfCentury);
    let century = p
        .get(FieldType::Century)
        .map_or_else(|| "XX".to_string(), |c| format!("{c:02}"));
    match (yoc, decade) {
        (Some(yoc), _) => Some(format!("{century}{yoc:02}")),
        (None, Some(decade)) => Some(format!("{century}{decade}X")),
        (None, None) if p.has_field(FieldType::Century) => Some(format!("{century}XX")),
        (None, None) => None,
    }
}

fn date_part(p: &Partial, pad_unknown: bool) -> Option<String> {
    let year = year_part(p);
    let mut tail = String::new();
    let dow = p.get(FieldType::DayOfWeek);

    if let Some(week) = p.get(FieldType::WeekOfYear) {
        tail.push_str(&format!("-W{week:02}"));
        match dow {
            Some(d) => tail.push_str(&format!("-{d}")),
            None if pad_unknown => tail.push_str("-X"),
            None => {}
        }
    } else if let Some(month) = p.get(FieldType::MonthOfYear) {
        tail.push_str(&format!("-{month:02}"));
        match (p.get(FieldType::DayOfMonth), dow) {
            (Some(day), _) => tail.push_str(&format!("-{day:02}")),
            (None, Some(d)) => tail.push_str(&format!("-WXX-{d}")),
            (None, None) if pad_unknown => tail.push_str("-XX"),
            (None, None) => {}
        }
    } else if let Some(day) = p.get(FieldType::DayOfMonth) {
        tail.push_str(&format!("-XX-{day:02}"));
    } else if let Some(quarter) = p.get(FieldType::Quarter) {
        tail.push_str(&format!("-Q{quarter}"));
    } else if let Some(half) = p.get(FieldType::HalfYear) {
        tail.push_str(&format!("-H{half}"));
    } else if let Some(doy) = p.get(FieldType::DayOfYear) {
        tail.push_str(&format!("-{doy:03}"));
    } else if let Some(d) = dow {
        tail.push_str(&format!("-WXX-{d}"));
    } else if pad_unknown && year.is_some() {
        tail.push_str("-XX-XX");
    }

    match (year, tail.is_empty()) {
        (None, true) => None,
        (Some(y), _) => Some(y + &tail),
        (None, false) => Some(format!("XXXX{tail}")),
    }
}

fn time_part(p: &Partial) -> Option<String> {
    if !p.has_time_of_day() {
        return None;
    }
    let hour = p.get(FieldType::HourOfDay).or_else(|| {
        match (p.get(FieldType::HalfDay), p.get(FieldType::HourOfHalfDay)) {
            (Some(hd), Some(h)) => Some(hd * 12 + h),
            (None, Some(h)) => Some(h),
            _ => None,
        }
    });
    let minute = p.get(FieldType::MinuteOfHour);
    let second = p.get(FieldType::SecondOfMinute);
    let millis = p.get(FieldType::MillisOfSecond);

    let mut s = String::from("T");
    match (hour, p.get(FieldType::HalfDay)) {
        (Some(h), _) => s.push_str(&format!("{h:02}")),
        (None, Some(hd)) if minute.is_none() => {
            s.push_str(if hd == 0 { "H1" } else { "H2" });
            return Some(s);
        }
        (None, _) => s.push_str("XX"),
    }
    if let Some(m) = minute {
        s.push_str(&format!(":{m:02}"));
        if let Some(sec) = second {
            s.push_str(&format!(":{sec:02}"));
            if let Some(ms) = millis {
                s.push_str(&format!(".{ms:03}"));
            }
        }
    }
    Some(s)
}

/// Renders a partial value. Unknown fields before the first known one are
/// written as `X`; unknown trailing date fields only when `pad_unknown`.
/// `None` for an empty value.
pub fn format_partial(p: &Partial, pad_unknown: bool) -> Option<String> {
    let date = date_part(p, pad_unknown);
    let time = time_part(p);
    match (date, time) {
        (None, None) => None,
        (Some(d), None) => Some(d),
        (Some(d), Some(t)) => Some(d + &t),
        (None, Some(t)) if pad_unknown => Some(format!("XXXX-XX-XX{t}")),
        (None, Some(t)) => Some(t),
    }
}

/// `YYYY-MM-DDTHH:MM:SS.sss`
pub fn format_instant(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

// ── Grounded spans ──────────────────────────────────────────────────────────

const SEASONS: [(&str, u32, u32); 4] = [
    ("SP", 3, 20),
    ("SU", 6, 21),
    ("FA", 9, 22),
    ("WI", 12, 21),
];

const DAY_QUARTERS: [(&str, u32); 4] = [("NI", 0), ("MO", 6), ("AF", 12), ("EV", 18)];

fn shifted(dt: NaiveDateTime, unit: TimeUnit, n: i64) -> Option<NaiveDateTime> {
    Period::of(unit, n).add_to(dt)
}

fn spans(begin: NaiveDateTime, end: NaiveDateTime, unit: TimeUnit, n: i64) -> bool {
    shifted(begin, unit, n) == Some(end)
}

fn at_midnight(dt: NaiveDateTime) -> bool {
    dt.time() == NaiveTime::MIN
}

fn on_hour(dt: NaiveDateTime) -> bool {
    dt.minute() == 0 && dt.second() == 0 && dt.nanosecond() == 0
}

fn season_start(year: i32, index: usize) -> Option<NaiveDateTime> {
    let (_, month, day) = SEASONS[index % 4];
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(NaiveTime::MIN))
}

fn season_name(begin: NaiveDateTime, end: NaiveDateTime) -> Option<&'static str> {
    let index = SEASONS
        .iter()
        .position(|(_, m, d)| begin.month() == *m && begin.day() == *d)?;
    let next_year = if index == 3 { begin.year() + 1 } else { begin.year() };
    (at_midnight(begin) && season_start(next_year, index + 1) == Some(end))
        .then_some(SEASONS[index].0)
}

fn day_string(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Compact TIMEX name of a grounded `[begin, end)` span.
///
/// Anything [`named_date_range`] does not recognise is rendered as `begin`
/// truncated to the finest unit of the span's length. `None` when the span
/// is empty or reversed.
pub fn timex_date_range(begin: NaiveDateTime, end: NaiveDateTime) -> Option<String> {
    if end <= begin {
        return None;
    }
    if let Some(named) = named_date_range(begin, end) {
        return Some(named);
    }
    let finest = match Period::between(begin, end).finest_unit()? {
        TimeUnit::Week => TimeUnit::Day,
        unit => unit,
    };
    let truncated = Partial::truncated_instant(begin, finest)?;
    format_partial(&truncated, false)
}

/// The calendar name of a span when it covers exactly one century, decade,
/// year, half-year, quarter, season, week, weekend, month, day, half-day,
/// quarter-day, midday, hour, minute or second. Patterns are tried in that
/// order and the first match wins.
pub fn named_date_range(begin: NaiveDateTime, end: NaiveDateTime) -> Option<String> {
    if end <= begin {
        return None;
    }
    let year = begin.year();
    let jan_1 = at_midnight(begin) && begin.month() == 1 && begin.day() == 1;
    let first_of_month = at_midnight(begin) && begin.day() == 1;

    if jan_1 && year.rem_euclid(100) == 0 && spans(begin, end, TimeUnit::Century, 1) {
        return Some(format!("{:02}XX", year.div_euclid(100)));
    }
    if jan_1 && year.rem_euclid(10) == 0 && spans(begin, end, TimeUnit::Decade, 1) {
        return Some(format!("{:03}X", year.div_euclid(10)));
    }
    if jan_1 && spans(begin, end, TimeUnit::Year, 1) {
        return Some(format!("{year:04}"));
    }
    if first_of_month && begin.month0() % 6 == 0 && spans(begin, end, TimeUnit::HalfYear, 1) {
        return Some(format!("{year:04}-H{}", begin.month0() / 6 + 1));
    }
    if first_of_month && begin.month0() % 3 == 0 && spans(begin, end, TimeUnit::Quarter, 1) {
        return Some(format!("{year:04}-Q{}", begin.month0() / 3 + 1));
    }
    if let Some(season) = season_name(begin, end) {
        return Some(format!("{year:04}-{season}"));
    }
    if at_midnight(begin) {
        let week = begin.iso_week();
        if begin.weekday() == Weekday::Mon && spans(begin, end, TimeUnit::Week, 1) {
            return Some(format!("{:04}-W{:02}", week.year(), week.week()));
        }
        if begin.weekday() == Weekday::Sat && spans(begin, end, TimeUnit::Day, 2) {
            return Some(format!("{:04}-W{:02}-WE", week.year(), week.week()));
        }
    }
    if first_of_month && spans(begin, end, TimeUnit::Month, 1) {
        return Some(begin.format("%Y-%m").to_string());
    }
    if at_midnight(begin) && spans(begin, end, TimeUnit::Day, 1) {
        return Some(day_string(begin));
    }
    if on_hour(begin) {
        let hour = begin.hour();
        if hour % 12 == 0 && spans(begin, end, TimeUnit::Hour, 12) {
            let half = if hour == 0 { "H1" } else { "H2" };
            return Some(format!("{}T{half}", day_string(begin)));
        }
        if let Some((code, _)) = DAY_QUARTERS.iter().find(|(_, h)| *h == hour) {
            if spans(begin, end, TimeUnit::Hour, 6) {
                return Some(format!("{}T{code}", day_string(begin)));
            }
        }
        if hour == 11 && spans(begin, end, TimeUnit::Hour, 2) {
            return Some(format!("{}TMI", day_string(begin)));
        }
        if spans(begin, end, TimeUnit::Hour, 1) {
            return Some(begin.format("%Y-%m-%dT%H").to_string());
        }
    }
    if begin.second() == 0 && begin.nanosecond() == 0 && spans(begin, end, TimeUnit::Minute, 1) {
        return Some(begin.format("%Y-%m-%dT%H:%M").to_string());
    }
    if begin.nanosecond() == 0 && spans(begin, end, TimeUnit::Second, 1) {
        return Some(begin.format("%Y-%m-%dT%H:%M:%S").to_string());
    }
    None
}

// ── Periods ─────────────────────────────────────────────────────────────────

const YEAR_SECTION: [TimeUnit; 6] = [
    TimeUnit::Millennium,
    TimeUnit::Century,
    TimeUnit::Decade,
    TimeUnit::Year,
    TimeUnit::Quarter,
    TimeUnit::Month,
];

fn amount(n: i64, approximate: bool) -> String {
    if approximate {
        "X".to_string()
    } else {
        n.to_string()
    }
}

/// TIMEX3 duration value of a period.
///
/// Counts are re-expressed greedily in the largest units (20 years → `P2E`,
/// 6 months → `P2Q`). Units more general than the most general `forced`
/// unit are skipped, their amount carried into the next finer unit.
/// `approximate` replaces every number with `X`.
pub fn timex_duration(period: &Period, approximate: bool, forced: &[TimeUnit]) -> String {
    let ceiling = forced.iter().max().copied();
    let allowed = |unit: TimeUnit| ceiling.is_none_or(|c| unit <= c);

    let mut months = period.total_months();
    let mut days = period.total_days();
    let mut millis = period.total_millis();
    let mut date = String::new();
    let mut time = String::new();

    for unit in YEAR_SECTION {
        let Some(factor) = unit.months_factor() else {
            continue;
        };
        if !allowed(unit) {
            continue;
        }
        if unit == TimeUnit::Quarter && months % 3 != 0 {
            continue;
        }
        let n = months / factor;
        if n != 0 {
            months -= n * factor;
            date.push_str(&amount(n, approximate));
            date.extend(unit.timex_code());
        }
    }
    days += months * 30;

    for unit in [TimeUnit::Week, TimeUnit::Day] {
        if !allowed(unit) {
            continue;
        }
        let factor = unit.days_factor().unwrap_or(1);
        let n = days / factor;
        if n != 0 {
            days -= n * factor;
            date.push_str(&amount(n, approximate));
            date.extend(unit.timex_code());
        }
    }
    millis += days * 86_400_000;

    for unit in [TimeUnit::Hour, TimeUnit::Minute] {
        if !allowed(unit) {
            continue;
        }
        let factor = unit.millis_factor().unwrap_or(1);
        let n = millis / factor;
        if n != 0 {
            millis -= n * factor;
            time.push_str(&amount(n, approximate));
            time.extend(unit.timex_code());
        }
    }
    if millis != 0 {
        if approximate {
            time.push_str("XS");
        } else if millis % 1_000 == 0 {
            time.push_str(&format!("{}S", millis / 1_000));
        } else {
            let fraction = format!("{:03}", (millis % 1_000).abs());
            let sign = if millis < 0 && millis > -1_000 { "-" } else { "" };
            time.push_str(&format!(
                "{sign}{}.{}S",
                millis / 1_000,
                fraction.trim_end_matches('0')
            ));
        }
    }

    match (date.is_empty(), time.is_empty()) {
        (true, true) if approximate => "PXD".to_string(),
        (true, true) => "P0D".to_string(),
        (_, true) => format!("P{date}"),
        (_, false) => format!("P{date}T{time}"),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

//! Reading canonical strings back into temporal values.
//!
//! Accepts what the formatters emit: date and time values (`2016-06`,
//! `XXXX-WXX-1`, `199X`, `2016-SU`, `T10:30`, `TMO`), vague labels,
//! durations (`P2E`, `PT2H30M`, `PXM`) and `/`-separated ranges. Malformed
//! input gives `None`.

use crate::constants;
use crate::duration::Duration;
use crate::field::{FieldType, TimeUnit, FULL_FIELDS};
use crate::partial::Partial;
use crate::period::Period;
use crate::range::Range;
use crate::temporal::Temporal;
use crate::time::{Time, VagueTime};

const SEASON_CODES: [&str; 4] = ["SP", "SU", "FA", "WI"];
const DAY_PART_CODES: [&str; 5] = ["MO", "AF", "EV", "NI", "MI"];

/// Any canonical string: a range, a duration, a time value, or a named
/// constant.
pub fn parse_temporal(s: &str) -> Option<Temporal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some((left, right)) = s.split_once('/') {
        return parse_range(left, right);
    }
    if is_duration(s) {
        return parse_duration(s).map(Temporal::Duration);
    }
    parse_time_value(s)
        .map(Temporal::Time)
        .or_else(|| constants::lookup(s).cloned())
}

fn is_duration(s: &str) -> bool {
    s.starts_with('P') && VagueTime::from_timex(s).is_none()
}

fn parse_range(left: &str, right: &str) -> Option<Temporal> {
    let (left, right) = (left.trim(), right.trim());
    match (is_duration(left), is_duration(right)) {
        (true, true) => Some(Temporal::Duration(Duration::range(
            Some(parse_duration(left)?),
            Some(parse_duration(right)?),
        ))),
        (false, false) => Some(Temporal::Range(Range::new(
            Some(parse_time_value(left)?),
            Some(parse_time_value(right)?),
            None,
        ))),
        (false, true) => Some(Temporal::Range(Range::new(
            Some(parse_time_value(left)?),
            None,
            Some(parse_duration(right)?),
        ))),
        (true, false) => Some(Temporal::Range(Range::new(
            None,
            Some(parse_time_value(right)?),
            Some(parse_duration(left)?),
        ))),
    }
}

// ── Time values ─────────────────────────────────────────────────────────────

/// A date and/or time value. Season, weekend and part-of-day codes produce
/// composite values; a value with every field from year to millisecond is
/// grounded.
pub fn parse_time_value(s: &str) -> Option<Time> {
    let s = s.trim();
    if let Some(vague) = VagueTime::from_timex(s) {
        return Some(Time::vague(vague));
    }
    let (date, time) = match s.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (s, None),
    };
    if date.is_empty() && time.is_none() {
        return None;
    }

    let mut partial = Partial::new();
    let mut slots: Vec<&'static str> = Vec::new();
    if !date.is_empty() {
        parse_date(date, &mut partial, &mut slots)?;
    }
    if let Some(time) = time {
        parse_time(time, &mut partial, &mut slots)?;
    }

    if slots.is_empty() {
        if partial.is_empty() {
            return None;
        }
        if FULL_FIELDS.iter().all(|f| partial.has_field(*f)) {
            return Time::partial(partial).instant().map(Time::grounded);
        }
        return Some(Time::partial(partial));
    }

    let mut slot_times = slots
        .into_iter()
        .map(|code| constants::lookup(code).and_then(Temporal::as_time).cloned());
    if partial.is_empty() && slot_times.len() == 1 {
        return slot_times.next().flatten();
    }
    let mut result = Time::partial(partial);
    for slot in slot_times {
        result = result.intersect(&slot?).ok()??;
    }
    Some(result)
}

fn set(partial: &mut Partial, field: FieldType, value: i32) -> Option<()> {
    *partial = partial.set_field(field, value).ok()?;
    Some(())
}

fn number(token: &str, width: usize) -> Option<i32> {
    if token.len() != width || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn is_unknown(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b == b'X')
}

fn parse_year(token: &str, partial: &mut Partial) -> Option<()> {
    if is_unknown(token) && token.len() == 4 {
        return Some(());
    }
    if let Some(year) = number(token, 4) {
        return set(partial, FieldType::Year, year);
    }
    let (head, tail) = token.split_at_checked(2)?;
    let century = number(head, 2)?;
    match tail {
        "XX" => set(partial, FieldType::Century, century),
        _ => {
            let (decade, x) = tail.split_at_checked(1)?;
            if x != "X" {
                return None;
            }
            set(partial, FieldType::Century, century)?;
            set(partial, FieldType::DecadeOfCentury, number(decade, 1)?)
        }
    }
}

fn day_of_week(token: &str, partial: &mut Partial, slots: &mut Vec<&'static str>) -> Option<()> {
    match token {
        "X" => Some(()),
        "WE" => {
            slots.push("WE");
            Some(())
        }
        _ => set(partial, FieldType::DayOfWeek, number(token, 1)?),
    }
}

fn week(token: &str, partial: &mut Partial) -> Option<()> {
    let w = token.strip_prefix('W')?;
    if w == "XX" {
        return Some(());
    }
    set(partial, FieldType::WeekOfYear, number(w, 2)?)
}

fn parse_date(date: &str, partial: &mut Partial, slots: &mut Vec<&'static str>) -> Option<()> {
    let tokens: Vec<&str> = date.split('-').collect();
    let (year, rest) = tokens.split_first()?;
    parse_year(year, partial)?;

    match rest {
        [] => Some(()),
        [code] if SEASON_CODES.contains(code) => {
            slots.extend(SEASON_CODES.iter().copied().filter(|c| c == code));
            Some(())
        }
        [second, tail @ ..] if second.starts_with('W') => {
            week(second, partial)?;
            match tail {
                [] => Some(()),
                [dow] => day_of_week(dow, partial, slots),
                _ => None,
            }
        }
        [code] if code.starts_with('Q') => set(partial, FieldType::Quarter, number(&code[1..], 1)?),
        [code] if code.starts_with('H') => set(partial, FieldType::HalfYear, number(&code[1..], 1)?),
        [doy] if doy.len() == 3 => set(partial, FieldType::DayOfYear, number(doy, 3)?),
        [month, tail @ ..] => {
            if !is_unknown(month) {
                set(partial, FieldType::MonthOfYear, number(month, 2)?)?;
            }
            match tail {
                [] => Some(()),
                [day] if is_unknown(day) => Some(()),
                [day] => set(partial, FieldType::DayOfMonth, number(day, 2)?),
                [w, dow] if *w == "WXX" => day_of_week(dow, partial, slots),
                _ => None,
            }
        }
    }
}

fn parse_time(time: &str, partial: &mut Partial, slots: &mut Vec<&'static str>) -> Option<()> {
    if let Some(code) = DAY_PART_CODES.iter().find(|c| **c == time) {
        slots.push(*code);
        return Some(());
    }
    match time {
        "H1" => return set(partial, FieldType::HalfDay, 0),
        "H2" => return set(partial, FieldType::HalfDay, 1),
        _ => {}
    }

    let mut parts = time.split(':');
    let hour = parts.next()?;
    if hour != "XX" {
        set(partial, FieldType::HourOfDay, number(hour, 2)?)?;
    }
    if let Some(minute) = parts.next() {
        set(partial, FieldType::MinuteOfHour, number(minute, 2)?)?;
    }
    if let Some(second) = parts.next() {
        let (whole, millis) = match second.split_once('.') {
            Some((whole, millis)) => (whole, Some(millis)),
            None => (second, None),
        };
        set(partial, FieldType::SecondOfMinute, number(whole, 2)?)?;
        if let Some(millis) = millis {
            set(partial, FieldType::MillisOfSecond, number(millis, 3)?)?;
        }
    }
    if parts.next().is_some() {
        return None;
    }
    Some(())
}

// ── Durations ───────────────────────────────────────────────────────────────

fn date_unit(code: char) -> Option<TimeUnit> {
    Some(match code {
        'L' => TimeUnit::Millennium,
        'C' => TimeUnit::Century,
        'E' => TimeUnit::Decade,
        'Y' => TimeUnit::Year,
        'Q' => TimeUnit::Quarter,
        'M' => TimeUnit::Month,
        'W' => TimeUnit::Week,
        'D' => TimeUnit::Day,
        _ => return None,
    })
}

fn time_unit(code: char) -> Option<TimeUnit> {
    Some(match code {
        'H' => TimeUnit::Hour,
        'M' => TimeUnit::Minute,
        'S' => TimeUnit::Second,
        _ => return None,
    })
}

/// A TIMEX3 duration. Any `X` amount makes the whole duration approximate,
/// each `X` counting as one unit.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let body = s.trim().strip_prefix('P')?;
    let (date, time) = match body.split_once('T') {
        Some((date, time)) if !time.is_empty() => (date, Some(time)),
        Some(_) => return None,
        None => (body, None),
    };

    let mut period = Period::new();
    let mut approximate = false;
    let mut components = 0;
    let mut read = |section: &str, unit_of: fn(char) -> Option<TimeUnit>| -> Option<()> {
        let mut amount = String::new();
        for c in section.chars() {
            if c.is_ascii_digit() || c == '.' || c == 'X' || (c == '-' && amount.is_empty()) {
                amount.push(c);
                continue;
            }
            let unit = unit_of(c)?;
            if amount.is_empty() {
                return None;
            }
            if amount.contains('X') {
                if amount != "X" {
                    return None;
                }
                approximate = true;
                period = period.clone().with(unit, 1);
            } else if let Some((whole, fraction)) = amount.split_once('.') {
                if unit != TimeUnit::Second || fraction.is_empty() || fraction.len() > 3 {
                    return None;
                }
                let negative = whole.starts_with('-');
                let whole: i64 = match whole.trim_start_matches('-') {
                    "" => 0,
                    digits => digits.parse().ok()?,
                };
                let millis: i64 = format!("{fraction:0<3}").parse().ok()?;
                let total = whole * 1_000 + millis;
                let total = if negative { -total } else { total };
                period = period.clone().with(TimeUnit::Millis, total);
            } else {
                let n: i64 = amount.parse().ok()?;
                period = period.clone().with(unit, n);
            }
            components += 1;
            amount.clear();
        }
        amount.is_empty().then_some(())
    };
    read(date, date_unit)?;
    if let Some(time) = time {
        read(time, time_unit)?;
    }
    if components == 0 {
        return None;
    }
    Some(if approximate {
        Duration::inexact(period)
    } else {
        Duration::from_period(period)
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::TemporalValue;
    use crate::time::TimeKind;

    fn round_trip(s: &str) -> String {
        parse_temporal(s).unwrap().timex_value().unwrap()
    }

    #[test]
    fn test_dates_round_trip() {
        for s in [
            "2016",
            "2016-06",
            "2016-06-19",
            "XXXX-06-19",
            "XXXX-06",
            "2016-W25",
            "2016-W25-1",
            "XXXX-WXX-1",
            "2016-Q2",
            "2016-H1",
            "199X",
            "19XX",
        ] {
            assert_eq!(round_trip(s), s, "{s}");
        }
    }

    #[test]
    fn test_times_round_trip() {
        for s in ["T10:30", "2016-06-19T10", "2016-06-19T10:30:15", "TMO", "2016-06-19TH2"] {
            assert_eq!(round_trip(s), s, "{s}");
        }
    }

    #[test]
    fn test_slot_codes() {
        assert_eq!(round_trip("2016-SU"), "2016-SU");
        assert_eq!(round_trip("2016-WI"), "2016-WI");
        assert_eq!(round_trip("XXXX-SU"), "XXXX-SU");
        assert_eq!(round_trip("2016-W24-WE"), "2016-W24-WE");
        assert_eq!(round_trip("2016-06-19TMO"), "2016-06-19TMO");
    }

    #[test]
    fn test_full_instant_is_grounded() {
        let t = parse_time_value("2016-06-19T10:30:00.000").unwrap();
        assert!(matches!(t.kind(), TimeKind::Grounded(_)));
        assert_eq!(t.timex_value().unwrap(), "2016-06-19T10:30:00.000");
    }

    #[test]
    fn test_vague_labels() {
        assert_eq!(round_trip("PRESENT_REF"), "PRESENT_REF");
        assert_eq!(round_trip("PAST_REF"), "PAST_REF");
    }

    #[test]
    fn test_durations() {
        for s in ["P2E", "P20Y", "P1W", "PT2H30M", "P1DT12H", "PXM", "PXY", "PT1.5S"] {
            let d = parse_duration(s).unwrap();
            let expected = if s == "P20Y" { "P2E" } else { s };
            assert_eq!(d.timex_value().unwrap(), expected, "{s}");
        }
        assert!(parse_duration("PXM").unwrap().is_approx());
    }

    #[test]
    fn test_ranges() {
        let r = parse_temporal("2016-06-01/2016-06-30").unwrap();
        assert_eq!(r.timex_value().unwrap(), "2016-06-01/2016-06-30");
        let open = parse_temporal("2016-06-01/P1W").unwrap();
        assert!(open.as_range().is_some());
        let between = parse_temporal("P2Y/P3Y").unwrap();
        assert!(between.as_duration().unwrap().is_range());
    }

    #[test]
    fn test_constants_fallback() {
        assert_eq!(round_trip("summer"), "XXXX-SU");
        assert_eq!(round_trip("june"), "XXXX-06");
    }

    #[test]
    fn test_malformed_is_none() {
        for s in ["", "2016-13", "2016-06-32", "20166", "P", "PT", "P2", "P2Z", "T25", "2016-W25-8", "X"] {
            assert!(parse_temporal(s).is_none(), "{s}");
        }
    }
}

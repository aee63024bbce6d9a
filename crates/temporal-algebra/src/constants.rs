//! Named temporal constants: weekdays, months, seasons, parts of the day,
//! unit durations and vague references.
//!
//! The built-in table is built once on first use and never changes. Extra
//! names (holidays, fiscal periods) come from [`ConstantProvider`]s handed
//! to [`NamedConstants::with_providers`].

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::duration::Duration;
use crate::field::{FieldType, TimeUnit};
use crate::flags::Flags;
use crate::ops::TemporalOp;
use crate::partial::Partial;
use crate::range::Range;
use crate::temporal::{StandardTemporalType, Temporal, TemporalValue};
use crate::time::{Time, VagueTime};

/// A source of additional named constants.
pub trait ConstantProvider {
    /// `(name, value)` pairs. Names are matched case-insensitively.
    fn constants(&self) -> Vec<(String, Temporal)>;
}

#[derive(Debug, Clone, Default)]
pub struct NamedConstants {
    table: HashMap<String, Temporal>,
}

static BUILTIN: LazyLock<NamedConstants> = LazyLock::new(NamedConstants::build);

const WEEKDAYS: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

const MONTHS: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

/// Season code, start (month, day), end (month, day).
const SEASONS: [(&str, &str, (i32, i32), (i32, i32)); 4] = [
    ("SPRING", "SP", (3, 20), (6, 20)),
    ("SUMMER", "SU", (6, 21), (9, 21)),
    ("FALL", "FA", (9, 22), (12, 20)),
    ("WINTER", "WI", (12, 21), (3, 19)),
];

/// Part of day, first hour, last hour.
const PARTS_OF_DAY: [(&str, &str, i32, i32); 5] = [
    ("MORNING", "MO", 6, 11),
    ("AFTERNOON", "AF", 12, 17),
    ("EVENING", "EV", 18, 23),
    ("NIGHT", "NI", 0, 5),
    ("MIDDAY", "MI", 11, 12),
];

fn normalize(name: &str) -> String {
    name.trim()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_uppercase()
}

fn fields(fields: &[(FieldType, i32)]) -> Partial {
    fields
        .iter()
        .fold(Partial::new(), |p, (field, value)| p.with(*field, *value))
}

fn ranged(begin: Partial, end: Partial, standard_type: StandardTemporalType, label: &str) -> Time {
    Time::with_range(Range::new(
        Some(Time::partial(begin)),
        Some(Time::partial(end)),
        None,
    ))
    .with_standard_type(standard_type)
    .with_label(label)
}

impl NamedConstants {
    /// The process-wide built-in table.
    pub fn builtin() -> &'static NamedConstants {
        &BUILTIN
    }

    /// The built-in table extended with each provider's constants. Later
    /// providers override earlier names.
    pub fn with_providers(providers: &[&dyn ConstantProvider]) -> NamedConstants {
        let mut constants = BUILTIN.clone();
        for provider in providers {
            for (name, value) in provider.constants() {
                constants.insert(&name, value);
            }
        }
        constants
    }

    fn insert(&mut self, name: &str, value: impl Into<Temporal>) {
        self.table.insert(normalize(name), value.into());
    }

    /// Looks a constant up by name: `"monday"`, `"Summer"`, `"next-week"` and
    /// `"NEXT WEEK"` all normalize the same way.
    pub fn get(&self, name: &str) -> Option<&Temporal> {
        self.table.get(&normalize(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn build() -> NamedConstants {
        let mut c = NamedConstants::default();

        for (i, name) in WEEKDAYS.iter().enumerate() {
            let day = Time::partial(fields(&[(FieldType::DayOfWeek, i as i32 + 1)]))
                .with_standard_type(StandardTemporalType::DayOfWeek);
            c.insert(name, day);
        }
        for (i, name) in MONTHS.iter().enumerate() {
            let month = Time::partial(fields(&[(FieldType::MonthOfYear, i as i32 + 1)]))
                .with_standard_type(StandardTemporalType::MonthOfYear);
            c.insert(name, month);
        }
        for q in 1..=4 {
            let quarter = Time::partial(fields(&[(FieldType::Quarter, q)]))
                .with_standard_type(StandardTemporalType::QuarterOfYear);
            c.insert(&format!("Q{q}"), quarter);
        }
        for h in 1..=2 {
            let half = Time::partial(fields(&[(FieldType::HalfYear, h)]))
                .with_standard_type(StandardTemporalType::HalfOfYear);
            c.insert(&format!("H{h}"), half);
        }

        for (name, code, (bm, bd), (em, ed)) in SEASONS {
            let season = ranged(
                fields(&[(FieldType::MonthOfYear, bm), (FieldType::DayOfMonth, bd)]),
                fields(&[(FieldType::MonthOfYear, em), (FieldType::DayOfMonth, ed)]),
                StandardTemporalType::SeasonOfYear,
                code,
            );
            c.insert(name, season.clone());
            c.insert(code, season);
        }
        if let Some(fall) = c.get("FALL").cloned() {
            c.insert("AUTUMN", fall);
        }

        for (name, code, first, last) in PARTS_OF_DAY {
            let part = ranged(
                fields(&[(FieldType::HourOfDay, first)]),
                fields(&[(FieldType::HourOfDay, last)]),
                StandardTemporalType::TimeOfDay,
                code,
            );
            c.insert(name, part.clone());
            c.insert(code, part);
        }
        let noon = Time::partial(fields(&[(FieldType::HourOfDay, 12), (FieldType::MinuteOfHour, 0)]))
            .with_standard_type(StandardTemporalType::TimeOfDay);
        c.insert("NOON", noon);
        let midnight = Time::partial(fields(&[(FieldType::HourOfDay, 0), (FieldType::MinuteOfHour, 0)]))
            .with_standard_type(StandardTemporalType::TimeOfDay);
        c.insert("MIDNIGHT", midnight);

        let weekend = ranged(
            fields(&[(FieldType::DayOfWeek, 6)]),
            fields(&[(FieldType::DayOfWeek, 7)]),
            StandardTemporalType::DayOfWeek,
            "WE",
        );
        c.insert("WEEKEND", weekend.clone());
        c.insert("WE", weekend);

        for unit in TimeUnit::ALL {
            if unit != TimeUnit::Era {
                c.insert(unit.name(), Duration::of(unit, 1));
            }
        }

        c.insert("NOW", Time::reference().with_standard_type(StandardTemporalType::RefTime));
        for vague in [
            VagueTime::PresentRef,
            VagueTime::PastRef,
            VagueTime::FutureRef,
            VagueTime::Unknown,
        ] {
            c.insert(vague.timex(), Time::vague(vague));
        }

        let day = Duration::of(TimeUnit::Day, 1);
        let today = Time::relative(
            Time::reference(),
            TemporalOp::This,
            Some(Temporal::Duration(day.clone())),
            Flags::NONE,
        )
        .with_standard_type(StandardTemporalType::RefDate);
        let shifted = |d: Duration| {
            Time::relative(
                today.clone(),
                TemporalOp::OffsetExact,
                Some(Temporal::Duration(d)),
                Flags::NONE,
            )
        };
        c.insert("YESTERDAY", shifted(day.negated()));
        c.insert("TOMORROW", shifted(day));
        c.insert("TODAY", today);

        c
    }
}

/// Looks a name up in the built-in table.
pub fn lookup(name: &str) -> Option<&'static Temporal> {
    BUILTIN.get(name)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sunday() -> Time {
        Time::grounded(NaiveDate::from_ymd_opt(2016, 6, 19).unwrap().and_hms_opt(10, 30, 0).unwrap())
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(lookup("monday").is_some());
        assert_eq!(lookup("Summer"), lookup("SU"));
        assert_eq!(lookup("autumn"), lookup("fall"));
        assert!(lookup("someday").is_none());
    }

    #[test]
    fn test_unresolved_forms() {
        assert_eq!(lookup("summer").unwrap().timex_value().unwrap(), "XXXX-SU");
        assert_eq!(lookup("weekend").unwrap().timex_value().unwrap(), "XXXX-WXX-WE");
        assert_eq!(lookup("morning").unwrap().timex_value().unwrap(), "TMO");
        assert_eq!(lookup("june").unwrap().timex_value().unwrap(), "XXXX-06");
        assert_eq!(lookup("week").unwrap().timex_value().unwrap(), "P1W");
    }

    #[test]
    fn test_days_relative_to_reference() {
        let resolve = |name: &str| {
            lookup(name).unwrap().resolve(&sunday(), Flags::NONE).unwrap().to_string()
        };
        assert_eq!(resolve("today"), "2016-06-19");
        assert_eq!(resolve("yesterday"), "2016-06-18");
        assert_eq!(resolve("tomorrow"), "2016-06-20");
    }

    #[test]
    fn test_resolved_season_and_weekend() {
        let summer = lookup("summer").unwrap().resolve(&sunday(), Flags::NONE).unwrap();
        assert_eq!(summer.timex_value().unwrap(), "2016-SU");
        let winter = lookup("winter").unwrap().resolve(&sunday(), Flags::NONE).unwrap();
        assert_eq!(winter.to_string(), "2016-WI");
        let weekend = lookup("weekend").unwrap().resolve(&sunday(), Flags::NONE).unwrap();
        assert_eq!(weekend.to_string(), "2016-W24-WE");
    }

    struct Holidays;

    impl ConstantProvider for Holidays {
        fn constants(&self) -> Vec<(String, Temporal)> {
            let christmas = Partial::from_fields(&[(FieldType::MonthOfYear, 12), (FieldType::DayOfMonth, 25)]).unwrap();
            vec![("Christmas".to_string(), Temporal::Time(Time::partial(christmas)))]
        }
    }

    #[test]
    fn test_providers_extend_builtin() {
        let constants = NamedConstants::with_providers(&[&Holidays]);
        assert_eq!(constants.get("christmas").unwrap().to_string(), "XXXX-12-25");
        assert!(constants.get("monday").is_some());
        assert!(NamedConstants::builtin().get("christmas").is_none());
        assert_eq!(constants.len(), NamedConstants::builtin().len() + 1);
    }
}

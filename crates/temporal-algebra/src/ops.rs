//! The operator vocabulary used to build and evaluate temporal expressions.
//!
//! Operators that need a reference time (`NEXT`, `PREV`, `THIS` and the
//! immediate variants) take it as their first argument. Given no reference
//! they return a deferred relative time that applies the operator once the
//! expression is resolved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TemporalError};
use crate::flags::Flags;
use crate::range::Range;
use crate::set::TemporalSet;
use crate::temporal::{Temporal, TemporalValue};
use crate::time::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemporalOp {
    /// The following occurrence after the one containing the reference.
    Next,
    /// The nearest occurrence strictly after the reference.
    NextImmediate,
    Prev,
    PrevImmediate,
    /// The occurrence containing the reference.
    This,
    Intersect,
    /// Shift, forgetting fields finer than the offset.
    Offset,
    OffsetExact,
    Union,
    Min,
    Max,
}

impl TemporalOp {
    pub const ALL: [TemporalOp; 11] = [
        TemporalOp::Next,
        TemporalOp::NextImmediate,
        TemporalOp::Prev,
        TemporalOp::PrevImmediate,
        TemporalOp::This,
        TemporalOp::Intersect,
        TemporalOp::Offset,
        TemporalOp::OffsetExact,
        TemporalOp::Union,
        TemporalOp::Min,
        TemporalOp::Max,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemporalOp::Next => "NEXT",
            TemporalOp::NextImmediate => "NEXT_IMMEDIATE",
            TemporalOp::Prev => "PREV",
            TemporalOp::PrevImmediate => "PREV_IMMEDIATE",
            TemporalOp::This => "THIS",
            TemporalOp::Intersect => "INTERSECT",
            TemporalOp::Offset => "OFFSET",
            TemporalOp::OffsetExact => "OFFSET_EXACT",
            TemporalOp::Union => "UNION",
            TemporalOp::Min => "MIN",
            TemporalOp::Max => "MAX",
        }
    }

    fn uses_reference(self) -> bool {
        matches!(
            self,
            TemporalOp::Next
                | TemporalOp::NextImmediate
                | TemporalOp::Prev
                | TemporalOp::PrevImmediate
                | TemporalOp::This
        )
    }

    /// Applies the operator. `Ok(None)` when the result is empty, e.g. the
    /// intersection of June and July.
    pub fn apply(
        self,
        arg1: Option<&Temporal>,
        arg2: Option<&Temporal>,
        flags: Flags,
    ) -> Result<Option<Temporal>> {
        let result = if self.uses_reference() {
            self.apply_with_reference(arg1, arg2, flags)?
        } else {
            match (arg1, arg2) {
                (Some(a), Some(b)) => self.apply_binary(a, b, flags)?,
                (Some(a), None) => self.apply_unary(a),
                (None, b) => b.cloned(),
            }
        };
        debug!(
            op = %self,
            %flags,
            result = ?result.as_ref().map(|r| r.to_string()),
            "applied temporal operator"
        );
        Ok(result)
    }

    fn apply_with_reference(
        self,
        reference: Option<&Temporal>,
        arg: Option<&Temporal>,
        flags: Flags,
    ) -> Result<Option<Temporal>> {
        let Some(arg) = arg else {
            return Ok(None);
        };
        let reference = match reference {
            None => None,
            Some(Temporal::Time(t)) => Some(t),
            Some(other) => {
                return Err(TemporalError::UnsupportedOperation(format!(
                    "{self} needs a time as reference, got {}",
                    other.full_string()
                )))
            }
        };
        let Some(reference) = reference.filter(|r| r.instant().is_some()) else {
            let base = reference.cloned().unwrap_or_else(Time::reference);
            return Ok(Some(Temporal::Time(Time::relative(
                base,
                self,
                Some(arg.clone()),
                flags,
            ))));
        };

        let unbiased = flags.without(Flags::RESOLVE_TO_MASK);
        let next = |x: &Temporal| -> Result<Option<Temporal>> {
            x.next().map(|n| n.resolve(reference, unbiased)).transpose()
        };
        let prev = |x: &Temporal| -> Result<Option<Temporal>> {
            x.prev().map(|p| p.resolve(reference, unbiased)).transpose()
        };
        let anchor = reference.instant();
        let begin = |x: &Temporal| x.range().and_then(|r| r.span()).map(|(b, _)| b);

        Ok(match self {
            TemporalOp::Next => next(arg)?,
            TemporalOp::Prev => prev(arg)?,
            TemporalOp::This => Some(match arg {
                Temporal::Duration(d) => Temporal::Time(d.to_time(reference, flags | Flags::RESOLVE_TO_THIS)),
                other => other.resolve(reference, flags | Flags::RESOLVE_TO_THIS)?,
            }),
            TemporalOp::NextImmediate => match arg {
                Temporal::Duration(d) => Some(Temporal::Time(
                    d.to_time(reference, flags | Flags::RESOLVE_TO_FUTURE),
                )),
                other => {
                    let resolved = other.resolve(reference, flags | Flags::RESOLVE_TO_FUTURE)?;
                    if begin(&resolved) <= anchor {
                        next(other)?
                    } else {
                        Some(resolved)
                    }
                }
            },
            TemporalOp::PrevImmediate => match arg {
                Temporal::Duration(d) => Some(Temporal::Time(
                    d.to_time(reference, flags | Flags::RESOLVE_TO_PAST),
                )),
                other => {
                    let resolved = other.resolve(reference, flags | Flags::RESOLVE_TO_PAST)?;
                    if begin(&resolved) >= anchor {
                        prev(other)?
                    } else {
                        Some(resolved)
                    }
                }
            },
            _ => None,
        })
    }

    fn apply_binary(self, a: &Temporal, b: &Temporal, flags: Flags) -> Result<Option<Temporal>> {
        Ok(match self {
            TemporalOp::Intersect => a.intersect(b)?,
            TemporalOp::Offset | TemporalOp::OffsetExact => {
                let Temporal::Duration(d) = b else {
                    return Err(TemporalError::UnsupportedOperation(format!(
                        "{self} needs a duration, got {}",
                        b.full_string()
                    )));
                };
                Some(match a {
                    Temporal::Time(t) => {
                        let moved = t.add(d);
                        match (self, d.granularity()) {
                            (TemporalOp::Offset, Some(unit)) => Temporal::Time(moved.discard_finer_than(unit)),
                            _ => Temporal::Time(moved),
                        }
                    }
                    Temporal::Range(r) => Temporal::Range(r.offset(d, flags)),
                    Temporal::Duration(other) => Temporal::Duration(other.add(d)),
                    Temporal::Set(_) => {
                        return Err(TemporalError::UnsupportedOperation(format!(
                            "{self} cannot shift a set"
                        )))
                    }
                })
            }
            TemporalOp::Union => Some(union(a, b)),
            TemporalOp::Min | TemporalOp::Max => Some(extreme(self, a, b)),
            _ => None,
        })
    }

    /// `MIN`/`MAX` of a lone range are its endpoints.
    fn apply_unary(self, a: &Temporal) -> Option<Temporal> {
        match (self, a) {
            (TemporalOp::Min, Temporal::Range(r)) => r.begin().cloned().map(Temporal::Time),
            (TemporalOp::Max, Temporal::Range(r)) => r.end().cloned().map(Temporal::Time),
            _ => Some(a.clone()),
        }
    }
}

/// The covering range of two grounded ranges, otherwise an explicit set.
fn union(a: &Temporal, b: &Temporal) -> Temporal {
    if let (Temporal::Range(x), Temporal::Range(y)) = (a, b) {
        if let (Some((xb, xe)), Some((yb, ye))) = (x.span(), y.span()) {
            let begin = if xb <= yb { x.begin() } else { y.begin() };
            let end = if xe >= ye { x.end() } else { y.end() };
            return Temporal::Range(Range::new(begin.cloned(), end.cloned(), None));
        }
    }
    Temporal::Set(TemporalSet::explicit([a.clone(), b.clone()]))
}

/// Earlier/later of two times, shorter/longer of two durations. Values that
/// cannot be ordered keep the first argument.
fn extreme(op: TemporalOp, a: &Temporal, b: &Temporal) -> Temporal {
    use std::cmp::Ordering;

    let ordering = match (a, b) {
        (Temporal::Duration(x), Temporal::Duration(y)) => Some(x.compare(y)),
        _ => {
            let first = |t: &Temporal| t.range().and_then(|r| r.span()).map(|(begin, _)| begin);
            match (first(a), first(b)) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => None,
            }
        }
    };
    let pick_b = match (op, ordering) {
        (TemporalOp::Min, Some(Ordering::Greater)) => true,
        (TemporalOp::Max, Some(Ordering::Less)) => true,
        _ => false,
    };
    if pick_b {
        b.clone()
    } else {
        a.clone()
    }
}

impl fmt::Display for TemporalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TemporalOp {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace(['-', ' '], "_").to_ascii_uppercase();
        TemporalOp::ALL
            .into_iter()
            .find(|op| op.name() == wanted)
            .ok_or_else(|| TemporalError::InvalidExpression(format!("unknown operator: {s}")))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Duration;
    use crate::field::{FieldType, TimeUnit};
    use crate::partial::Partial;
    use crate::time::TimeKind;
    use chrono::NaiveDate;

    fn sunday() -> Temporal {
        Temporal::Time(Time::grounded(
            NaiveDate::from_ymd_opt(2016, 6, 19).unwrap().and_hms_opt(10, 30, 0).unwrap(),
        ))
    }

    fn p(fields: &[(FieldType, i32)]) -> Temporal {
        Temporal::Time(Time::partial(Partial::from_fields(fields).unwrap()))
    }

    fn range_of(t: &Temporal) -> String {
        t.range().unwrap().timex_value().unwrap()
    }

    fn apply(op: TemporalOp, arg: Temporal) -> Temporal {
        op.apply(Some(&sunday()), Some(&arg), Flags::NONE).unwrap().unwrap()
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("next_immediate".parse::<TemporalOp>().unwrap(), TemporalOp::NextImmediate);
        assert_eq!("offset-exact".parse::<TemporalOp>().unwrap(), TemporalOp::OffsetExact);
        assert!("sideways".parse::<TemporalOp>().is_err());
    }

    #[test]
    fn test_next_and_this_weekday() {
        let monday = p(&[(FieldType::DayOfWeek, 1)]);
        assert_eq!(range_of(&apply(TemporalOp::Next, monday.clone())), "2016-06-20/2016-06-20");
        assert_eq!(range_of(&apply(TemporalOp::This, monday.clone())), "2016-06-13/2016-06-13");
        assert_eq!(range_of(&apply(TemporalOp::Prev, monday)), "2016-06-06/2016-06-06");
    }

    #[test]
    fn test_next_units() {
        let week = Temporal::Duration(Duration::of(TimeUnit::Week, 1));
        assert_eq!(range_of(&apply(TemporalOp::Next, week.clone())), "2016-06-20/2016-06-26");
        assert_eq!(range_of(&apply(TemporalOp::This, week.clone())), "2016-06-13/2016-06-19");
        assert_eq!(range_of(&apply(TemporalOp::Prev, week)), "2016-06-06/2016-06-12");
    }

    #[test]
    fn test_immediate_variants() {
        let june = p(&[(FieldType::MonthOfYear, 6)]);
        assert_eq!(apply(TemporalOp::NextImmediate, june).to_string(), "2017-06");
        let august = p(&[(FieldType::MonthOfYear, 8)]);
        assert_eq!(apply(TemporalOp::NextImmediate, august.clone()).to_string(), "2016-08");
        assert_eq!(apply(TemporalOp::PrevImmediate, august).to_string(), "2015-08");
    }

    #[test]
    fn test_missing_reference_defers() {
        let monday = p(&[(FieldType::DayOfWeek, 1)]);
        let deferred = TemporalOp::Next.apply(None, Some(&monday), Flags::NONE).unwrap().unwrap();
        let time = deferred.as_time().unwrap();
        assert!(matches!(time.kind(), TimeKind::Relative(_)));
        let resolved = time.resolve(sunday().as_time().unwrap(), Flags::NONE).unwrap();
        assert_eq!(resolved.to_string(), "2016-06-20");
    }

    #[test]
    fn test_offset_discards_finer_fields() {
        let day = p(&[
            (FieldType::Year, 2016),
            (FieldType::MonthOfYear, 6),
            (FieldType::DayOfMonth, 19),
        ]);
        let month = Temporal::Duration(Duration::of(TimeUnit::Month, 1));
        let inexact = TemporalOp::Offset.apply(Some(&day), Some(&month), Flags::NONE).unwrap().unwrap();
        assert_eq!(inexact.to_string(), "2016-07");
        let exact = TemporalOp::OffsetExact.apply(Some(&day), Some(&month), Flags::NONE).unwrap().unwrap();
        assert_eq!(exact.to_string(), "2016-07-19");
    }

    #[test]
    fn test_union_and_extremes() {
        let day = |d: i32| {
            Time::partial(
                Partial::from_fields(&[
                    (FieldType::Year, 2016),
                    (FieldType::MonthOfYear, 6),
                    (FieldType::DayOfMonth, d),
                ])
                .unwrap(),
            )
        };
        let a = Temporal::Range(Range::new(Some(day(1)), Some(day(5)), None));
        let b = Temporal::Range(Range::new(Some(day(10)), Some(day(12)), None));
        let covering = TemporalOp::Union.apply(Some(&a), Some(&b), Flags::NONE).unwrap().unwrap();
        assert_eq!(covering.to_string(), "2016-06-01/2016-06-12");

        let early = Temporal::Time(day(1));
        let late = Temporal::Time(day(9));
        let max = TemporalOp::Max.apply(Some(&early), Some(&late), Flags::NONE).unwrap().unwrap();
        assert_eq!(max, late);
        let begin = TemporalOp::Min.apply(Some(&a), None, Flags::NONE).unwrap().unwrap();
        assert_eq!(begin, early);

        let months = TemporalOp::Union
            .apply(Some(&p(&[(FieldType::MonthOfYear, 6)])), Some(&p(&[(FieldType::MonthOfYear, 7)])), Flags::NONE)
            .unwrap()
            .unwrap();
        assert_eq!(months.as_set().unwrap().members().unwrap().len(), 2);
    }
}

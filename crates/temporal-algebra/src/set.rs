//! Sets of temporal values: explicit collections and recurrences.

use std::fmt;

use serde::Serialize;

use crate::duration::Duration;
use crate::error::Result;
use crate::flags::Flags;
use crate::range::Range;
use crate::temporal::{Temporal, TemporalMeta, TemporalValue, TimexType};
use crate::time::{Time, TimeKind};

/// A recurrence: `base` every `periodicity`, optionally bounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeriodicSet {
    base: Box<Temporal>,
    periodicity: Duration,
    occurs_in: Option<Range>,
    quant: Option<String>,
    freq: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SetKind {
    Explicit(Vec<Temporal>),
    Periodic(PeriodicSet),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemporalSet {
    kind: SetKind,
    meta: TemporalMeta,
}

/// TIMEX3 `quant` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Quant {
    Each,
    Every,
}

impl fmt::Display for Quant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quant::Each => f.write_str("EACH"),
            Quant::Every => f.write_str("EVERY"),
        }
    }
}

impl TemporalSet {
    fn from_kind(kind: SetKind) -> Self {
        TemporalSet {
            kind,
            meta: TemporalMeta::default(),
        }
    }

    /// An explicit set. Nested explicit sets are flattened.
    pub fn explicit(members: impl IntoIterator<Item = Temporal>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                Temporal::Set(TemporalSet {
                    kind: SetKind::Explicit(inner),
                    ..
                }) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Self::from_kind(SetKind::Explicit(flat))
    }

    pub fn periodic(base: Temporal, periodicity: Duration) -> Self {
        Self::from_kind(SetKind::Periodic(PeriodicSet {
            base: Box::new(base),
            periodicity,
            occurs_in: None,
            quant: None,
            freq: None,
        }))
    }

    fn map_periodic(&self, f: impl FnOnce(&mut PeriodicSet)) -> TemporalSet {
        let mut set = self.clone();
        if let SetKind::Periodic(p) = &mut set.kind {
            f(p);
        }
        set
    }

    pub fn with_occurs_in(&self, range: Range) -> TemporalSet {
        self.map_periodic(|p| p.occurs_in = Some(range))
    }

    pub fn with_quant(&self, quant: impl Into<String>) -> TemporalSet {
        let quant = quant.into();
        self.map_periodic(|p| p.quant = Some(quant))
    }

    pub fn with_freq(&self, freq: impl Into<String>) -> TemporalSet {
        let freq = freq.into();
        self.map_periodic(|p| p.freq = Some(freq))
    }

    pub fn kind(&self) -> &SetKind {
        &self.kind
    }

    pub fn members(&self) -> Option<&[Temporal]> {
        match &self.kind {
            SetKind::Explicit(members) => Some(members),
            SetKind::Periodic(_) => None,
        }
    }

    fn periodic_part(&self) -> Option<&PeriodicSet> {
        match &self.kind {
            SetKind::Periodic(p) => Some(p),
            SetKind::Explicit(_) => None,
        }
    }

    pub fn base(&self) -> Option<&Temporal> {
        self.periodic_part().map(|p| p.base.as_ref())
    }

    pub fn periodicity(&self) -> Option<&Duration> {
        self.periodic_part().map(|p| &p.periodicity)
    }

    pub fn occurs_in(&self) -> Option<&Range> {
        self.periodic_part().and_then(|p| p.occurs_in.as_ref())
    }

    pub fn quant(&self) -> Option<&str> {
        self.periodic_part().and_then(|p| p.quant.as_deref())
    }

    pub fn freq(&self) -> Option<&str> {
        self.periodic_part().and_then(|p| p.freq.as_deref())
    }

    /// Explicit sets intersect member by member, dropping members with no
    /// intersection. A recurrence intersected with a range narrows its
    /// bounding window; anything else narrows the recurring base.
    pub fn intersect(&self, other: &Temporal) -> Result<Option<TemporalSet>> {
        match &self.kind {
            SetKind::Explicit(members) => {
                let mut kept = Vec::with_capacity(members.len());
                for member in members {
                    if let Some(m) = member.intersect(other)? {
                        kept.push(m);
                    }
                }
                Ok((!kept.is_empty()).then(|| TemporalSet {
                    kind: SetKind::Explicit(kept),
                    meta: self.meta.clone(),
                }))
            }
            SetKind::Periodic(p) => match other {
                Temporal::Range(range) => {
                    let window = match &p.occurs_in {
                        None => Some(range.clone()),
                        Some(current) => current.intersect(range),
                    };
                    Ok(window.map(|w| self.with_occurs_in(w)))
                }
                _ => {
                    let Some(base) = p.base.intersect(other)? else {
                        return Ok(None);
                    };
                    Ok(Some(self.map_periodic(|p| p.base = Box::new(base))))
                }
            },
        }
    }

    /// Grounds the members, or the window and base of a recurrence. A
    /// pattern base ("Monday", "weekend morning") is the recurrence itself
    /// and stays unresolved.
    pub fn resolve(&self, reference: &Time, flags: Flags) -> Result<TemporalSet> {
        match &self.kind {
            SetKind::Explicit(members) => {
                let resolved = members
                    .iter()
                    .map(|m| m.resolve(reference, flags))
                    .collect::<Result<Vec<_>>>()?;
                Ok(TemporalSet {
                    kind: SetKind::Explicit(resolved),
                    meta: self.meta.clone(),
                })
            }
            SetKind::Periodic(p) => {
                let occurs_in = p
                    .occurs_in
                    .as_ref()
                    .map(|r| r.resolve_endpoints(reference, flags))
                    .transpose()?;
                let pattern = matches!(
                    p.base.as_time().map(Time::kind),
                    Some(TimeKind::Partial(_) | TimeKind::Composite(_) | TimeKind::WithRange(_))
                );
                let base = if pattern {
                    (*p.base).clone()
                } else {
                    p.base.resolve(reference, flags)?
                };
                Ok(self.map_periodic(|p| {
                    p.occurs_in = occurs_in;
                    p.base = Box::new(base);
                }))
            }
        }
    }
}

impl TemporalValue for TemporalSet {
    fn meta(&self) -> &TemporalMeta {
        &self.meta
    }

    fn with_meta(&self, meta: TemporalMeta) -> Self {
        TemporalSet {
            kind: self.kind.clone(),
            meta,
        }
    }

    fn timex_type(&self) -> TimexType {
        TimexType::Set
    }

    /// The recurring base's value; explicit sets have none.
    fn timex_value(&self) -> Option<String> {
        match &self.kind {
            SetKind::Periodic(p) => p.base.timex_value(),
            SetKind::Explicit(_) => None,
        }
    }

    fn full_string(&self) -> String {
        match &self.kind {
            SetKind::Explicit(members) => {
                let parts: Vec<String> = members.iter().map(|m| m.full_string()).collect();
                format!("{{{}}}", parts.join(", "))
            }
            SetKind::Periodic(p) => {
                let mut s = format!("{} every {}", p.base.full_string(), p.periodicity.full_string());
                if let Some(window) = &p.occurs_in {
                    s.push_str(&format!(" in {}", window.full_string()));
                }
                s
            }
        }
    }
}

impl fmt::Display for TemporalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_string())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

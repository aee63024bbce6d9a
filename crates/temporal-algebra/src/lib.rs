//! # temporal-algebra
//!
//! Typed temporal values and their resolution against a reference time.
//!
//! A grammar layer builds leaf values ("June", "Monday", "3 weeks"),
//! combines them with operators ("next", "the 2nd ... of", intersection)
//! and, once the document's reference time is known, resolves the result
//! and renders it as a TIMEX3 value. Values may leave any calendar field
//! unset; resolution borrows what is missing from the reference and, when
//! several occurrences qualify, picks one according to the resolution
//! flags.
//!
//! ## Modules
//!
//! - [`field`]: Time units, calendar fields and their generality ordering
//! - [`partial`]: Partial calendar values and the field algebra over them
//! - [`period`]: Field-wise calendar periods
//! - [`format`]: Canonical strings for partial values, spans and periods
//! - [`temporal`]: The [`Temporal`] root type and shared metadata
//! - [`time`]: Time points: partial, composite, ordinal, relative, grounded
//! - [`duration`]: Exact, ranged and approximate lengths of time
//! - [`range`]: Intervals between two times
//! - [`set`]: Explicit and periodic sets
//! - [`ops`]: The operator vocabulary
//! - [`flags`]: Resolution and formatting flags
//! - [`index`]: Per-document id registry
//! - [`constants`]: Named weekdays, months, seasons, parts of day
//! - [`parse`]: Canonical strings back into values
//! - [`timex`]: TIMEX3 attribute emission and its options
//! - [`error`]: Error types

pub mod constants;
pub mod duration;
pub mod error;
pub mod field;
pub mod flags;
pub mod format;
pub mod index;
pub mod ops;
pub mod parse;
pub mod partial;
pub mod period;
pub mod range;
pub mod set;
pub mod temporal;
pub mod time;
pub mod timex;

pub use constants::{lookup, ConstantProvider, NamedConstants};
pub use duration::{Duration, DurationKind};
pub use error::{Result, TemporalError};
pub use field::{FieldType, TimeUnit};
pub use flags::{Flags, RangePadding};
pub use index::TimeIndex;
pub use ops::TemporalOp;
pub use parse::{parse_duration, parse_temporal, parse_time_value};
pub use partial::{Chronology, Partial};
pub use period::Period;
pub use range::Range;
pub use set::{Quant, SetKind, TemporalSet};
pub use temporal::{StandardTemporalType, Temporal, TemporalMeta, TemporalValue, TimexType};
pub use time::{CompositeTime, Slot, Time, TimeKind, VagueTime};
pub use timex::{HeuristicLevel, TimexAnnotator, TimexAttributes, TimexOptions};

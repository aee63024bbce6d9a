//! Resolution and canonical-string benchmarks.

use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion};
use temporal_algebra::{
    lookup, parse_temporal, Duration, Flags, Temporal, TemporalOp, TemporalValue, Time, TimeUnit,
};

fn anchor() -> Time {
    Time::grounded(
        NaiveDate::from_ymd_opt(2016, 6, 19)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .unwrap_or_default(),
    )
}

// ── Resolution ──────────────────────────────────────────────────────────────

fn bench_resolve_partial(c: &mut Criterion) {
    let reference = anchor();
    let june = parse_temporal("XXXX-06").unwrap_or_else(|| Temporal::Time(Time::reference()));

    c.bench_function("resolve_month_closest", |b| {
        b.iter(|| june.resolve(black_box(&reference), Flags::RESOLVE_TO_CLOSEST))
    });
}

fn bench_next_week(c: &mut Criterion) {
    let reference = Temporal::Time(anchor());
    let week = Temporal::Duration(Duration::of(TimeUnit::Week, 1));

    c.bench_function("apply_next_week", |b| {
        b.iter(|| TemporalOp::Next.apply(Some(black_box(&reference)), Some(&week), Flags::NONE))
    });
}

fn bench_composite(c: &mut Criterion) {
    let reference = anchor();
    let weekend_morning = match (lookup("weekend"), lookup("morning")) {
        (Some(we), Some(mo)) => we.intersect(mo).ok().flatten(),
        _ => None,
    };
    let Some(weekend_morning) = weekend_morning else {
        return;
    };

    c.bench_function("resolve_weekend_morning", |b| {
        b.iter(|| {
            weekend_morning
                .resolve(black_box(&reference), Flags::NONE)
                .map(|t| t.timex_value())
        })
    });
}

// ── Formatting ──────────────────────────────────────────────────────────────

fn bench_duration_timex(c: &mut Criterion) {
    let long = Duration::of(TimeUnit::Year, 20)
        .add(&Duration::of(TimeUnit::Month, 6))
        .add(&Duration::of(TimeUnit::Hour, 30));

    c.bench_function("duration_timex_value", |b| {
        b.iter(|| black_box(&long).timex_value())
    });
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_temporal_mixed", |b| {
        b.iter(|| {
            for s in ["2016-W25-1", "XXXX-SU", "PT2H30M", "2016-06-01/2016-06-30"] {
                black_box(parse_temporal(black_box(s)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_resolve_partial,
    bench_next_week,
    bench_composite,
    bench_duration_timex,
    bench_parse
);
criterion_main!(benches);

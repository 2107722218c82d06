//! Engine throughput bench: multi-ticker date walk on synthetic data.

use chanlab_core::data::Dataset;
use chanlab_core::domain::{FundamentalSnapshot, PriceRow, StrategyParameters};
use chanlab_core::engine::{run_backtest, CancelToken};
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn synthetic_dataset(tickers: usize, days: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2018, 1, 2).unwrap();
    let mut rows = Vec::with_capacity(tickers * days);
    let mut fundamentals = Vec::with_capacity(tickers);

    for t in 0..tickers {
        let ticker = format!("T{t:03}");
        let drift: f64 = rng.gen_range(-0.2..0.4);
        let mut price: f64 = rng.gen_range(20.0..200.0);
        for d in 0..days {
            price = (price + drift + rng.gen_range(-1.5..1.5)).max(1.0);
            rows.push(PriceRow {
                ticker: ticker.clone(),
                date: start + chrono::Days::new(d as u64),
                close: price,
                adjusted_close: price,
            });
        }
        fundamentals.push(FundamentalSnapshot {
            ticker,
            earnings_yield: Some(rng.gen_range(0.01..0.12)),
            book_to_market: Some(rng.gen_range(0.2..2.0)),
        });
    }
    Dataset::from_rows(rows, fundamentals).unwrap()
}

fn bench_engine(c: &mut Criterion) {
    let dataset = synthetic_dataset(25, 1260, 7);
    let params = StrategyParameters {
        entry_threshold_sigma: 1.8,
        min_r_squared: 0.3,
        min_slope: 0.0,
        window_size: 120,
        max_positions: 8,
        ..Default::default()
    };
    let cancel = CancelToken::new();

    c.bench_function("run_backtest_25x5y", |b| {
        b.iter(|| {
            let result = run_backtest(black_box(&dataset), black_box(&params), &cancel).unwrap();
            black_box(result.trades.len())
        })
    });
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);

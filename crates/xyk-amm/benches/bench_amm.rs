// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK SUITE — xyk-amm
//
// Measures performance of pool math and full engine operations.
// ZERO production code changes — benchmark-only file.
// Run: cargo bench -p xyk-amm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xyk_amm::{math, Dex, DexConfig};
use xyk_asset::TokenMetadata;

const ONE: u128 = 1_000_000_000_000_000_000;

// ─────────────────────────────────────────────────────────────────
// POOL MATH BENCHMARKS
// ─────────────────────────────────────────────────────────────────

fn bench_get_amount_out(c: &mut Criterion) {
    c.bench_function("math/get_amount_out", |b| {
        b.iter(|| {
            black_box(math::get_amount_out(
                black_box(5 * ONE),
                black_box(100_000 * ONE),
                black_box(200_000 * ONE),
            ))
        })
    });
}

fn bench_get_amount_in(c: &mut Criterion) {
    c.bench_function("math/get_amount_in", |b| {
        b.iter(|| {
            black_box(math::get_amount_in(
                black_box(5 * ONE),
                black_box(100_000 * ONE),
                black_box(200_000 * ONE),
            ))
        })
    });
}

fn bench_sqrt_product(c: &mut Criterion) {
    c.bench_function("math/sqrt_product", |b| {
        b.iter(|| black_box(math::sqrt_product(black_box(100_000 * ONE), black_box(200_000 * ONE))))
    });
}

fn bench_k_check(c: &mut Criterion) {
    let (r0, r1) = (100_000 * ONE, 200_000 * ONE);
    let amount_in = 5 * ONE;
    let out = math::get_amount_out(amount_in, r0, r1).unwrap();

    c.bench_function("math/k_after_fee_holds", |b| {
        b.iter(|| {
            black_box(math::k_after_fee_holds(
                r0 + amount_in,
                r1 - out,
                amount_in,
                0,
                r0,
                r1,
            ))
        })
    });
}

// ─────────────────────────────────────────────────────────────────
// ENGINE BENCHMARKS (dominated by the state snapshot per operation)
// ─────────────────────────────────────────────────────────────────

fn seeded_engine() -> Dex {
    let mut dex = Dex::new(DexConfig::default()).unwrap();
    for id in ["TKA", "TKB"] {
        dex.tokens_mut()
            .register(id, TokenMetadata::new(id, id, 18))
            .unwrap();
        dex.tokens_mut()
            .mint(id, "alice", 1_000_000_000 * ONE)
            .unwrap();
        dex.tokens_mut()
            .approve(id, "alice", "xyk:router", u128::MAX)
            .unwrap();
    }
    dex.add_liquidity(
        "alice",
        "TKA",
        "TKB",
        100_000 * ONE,
        200_000 * ONE,
        0,
        0,
        "alice",
        u64::MAX,
    )
    .unwrap();
    dex
}

fn bench_swap_exact_tokens(c: &mut Criterion) {
    let mut dex = seeded_engine();

    c.bench_function("engine/swap_exact_tokens_for_tokens", |b| {
        b.iter(|| {
            black_box(
                dex.swap_exact_tokens_for_tokens(
                    "alice",
                    ONE,
                    0,
                    &["TKA", "TKB"],
                    "alice",
                    u64::MAX,
                )
                .unwrap(),
            )
        })
    });
}

fn bench_add_liquidity(c: &mut Criterion) {
    let mut dex = seeded_engine();

    c.bench_function("engine/add_liquidity", |b| {
        b.iter(|| {
            black_box(
                dex.add_liquidity(
                    "alice",
                    "TKA",
                    "TKB",
                    ONE,
                    2 * ONE,
                    0,
                    0,
                    "alice",
                    u64::MAX,
                )
                .unwrap(),
            )
        })
    });
}

fn bench_state_root(c: &mut Criterion) {
    let dex = seeded_engine();

    c.bench_function("engine/state_root", |b| {
        b.iter(|| black_box(dex.state_root()))
    });
}

criterion_group!(
    benches,
    bench_get_amount_out,
    bench_get_amount_in,
    bench_sqrt_product,
    bench_k_check,
    bench_swap_exact_tokens,
    bench_add_liquidity,
    bench_state_root,
);
criterion_main!(benches);

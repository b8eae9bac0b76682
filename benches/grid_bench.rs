use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use glyph_grid::{
    extract, ControlPoint, CurveGrid, GlyphCache, OutlineError, OutlineProvider, RawOutline,
    Rect, Vec2,
};

/// Ballpark figures (release, one core): extraction of an 8-arc ring is in
/// the single-digit µs, the grid build in the tens of µs (dominated by the
/// 400 center ray casts), and a warm lookup is a hash probe. A cold insert
/// is the sum plus the atlas writes, which is fine for a cache that builds
/// each glyph exactly once.
fn ring_raw() -> RawOutline {
    fn rounded_box(lo: f32, hi: f32) -> Vec<ControlPoint> {
        let mid = (lo + hi) * 0.5;
        vec![
            ControlPoint::on(mid, lo),
            ControlPoint::conic(hi, lo),
            ControlPoint::on(hi, mid),
            ControlPoint::conic(hi, hi),
            ControlPoint::on(mid, hi),
            ControlPoint::conic(lo, hi),
            ControlPoint::on(lo, mid),
            ControlPoint::conic(lo, lo),
        ]
    }
    RawOutline {
        contours: vec![rounded_box(80.0, 920.0), rounded_box(310.0, 710.0)],
        bounds: Rect::new(Vec2::new(80.0, 80.0), Vec2::new(920.0, 920.0)),
        bearing: Vec2::new(80.0, 920.0),
        advance: 1000.0,
    }
}

struct BenchFont {
    raw: RawOutline,
}

impl OutlineProvider for BenchFont {
    fn outline(&self, _codepoint: char) -> Result<RawOutline, OutlineError> {
        Ok(self.raw.clone())
    }

    fn units_per_em(&self) -> u16 {
        1000
    }
}

fn bench_extract(c: &mut Criterion) {
    let raw = ring_raw();
    c.bench_function("outline_extract", |b| {
        b.iter(|| black_box(extract(black_box(&raw), 1.0)))
    });
}

fn bench_grid_build(c: &mut Criterion) {
    let outline = extract(&ring_raw(), 1.0);
    c.bench_function("grid_build", |b| {
        b.iter(|| CurveGrid::build(black_box(&outline.curves), outline.size, 20, 20).unwrap())
    });
}

fn bench_cold_insert(c: &mut Criterion) {
    c.bench_function("cache_cold_insert", |b| {
        b.iter_batched(
            || {
                let mut cache = GlyphCache::new();
                let id = cache.add_font(BenchFont { raw: ring_raw() });
                (cache, id)
            },
            |(mut cache, id)| {
                cache.glyph(id, 'O').unwrap();
                cache
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_warm_lookup(c: &mut Criterion) {
    let mut cache = GlyphCache::new();
    let id = cache.add_font(BenchFont { raw: ring_raw() });
    cache.glyph(id, 'O').unwrap();
    c.bench_function("cache_warm_lookup", |b| {
        b.iter(|| cache.glyph(id, black_box('O')).unwrap())
    });
}

criterion_group!(
    benches,
    bench_extract,
    bench_grid_build,
    bench_cold_insert,
    bench_warm_lookup
);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cozy_chess::Board;
use talon::search::alphabeta::{SearchParams, Searcher};

fn bench_search(c: &mut Criterion) {
    let b = Board::default();
    c.bench_function("search_depth_4_startpos", |ben| {
        ben.iter(|| {
            let mut s = Searcher::default();
            let mut p = SearchParams::default();
            p.depth = 4;
            p.use_tt = true;
            p.threads = 1;
            p.use_nullmove = true;
            p.use_lmr = true;
            let r = s.search_with_params(black_box(&b), p);
            black_box(r.nodes)
        })
    });
}

fn bench_qsearch(c: &mut Criterion) {
    let b = Board::from_fen(
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3",
        false,
    )
    .unwrap();
    c.bench_function("qsearch_midgame", |ben| {
        ben.iter(|| {
            let mut s = Searcher::default();
            black_box(s.qsearch_eval_cp(black_box(&b)))
        })
    });
}

criterion_group!(benches, bench_search, bench_qsearch);
criterion_main!(benches);

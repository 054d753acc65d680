use cozy_chess::Board;
use talon::search::alphabeta::{SearchParams, Searcher};

#[test]
fn threads_param_propagates_to_the_searcher() {
    let b = Board::default();
    let mut s = Searcher::default();
    let mut p = SearchParams::default();
    p.depth = 2;
    p.use_tt = false;
    p.threads = 4;
    let _ = s.search_with_params(&b, p);
    assert_eq!(s.get_threads(), 4, "threads param did not propagate");
}

#[test]
fn parallel_root_split_agrees_with_the_serial_search() {
    let b = Board::default();

    let mut p1 = SearchParams::default();
    p1.depth = 4;
    p1.use_tt = true;
    p1.threads = 1;
    let mut s1 = Searcher::default();
    let r1 = s1.search_with_params(&b, p1);

    let mut p4 = p1;
    p4.threads = 4;
    let mut s4 = Searcher::default();
    let r4 = s4.search_with_params(&b, p4);

    assert!(r4.bestmove.is_some());
    assert!(
        (r4.score_cp - r1.score_cp).abs() <= 100,
        "root split drifted: {} vs {}",
        r4.score_cp,
        r1.score_cp
    );
}

#[test]
fn workers_share_one_table_without_crashing() {
    // A deeper threaded search keeps all workers storing into the same
    // table; nondeterministic contents are fine, crashes are not.
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3";
    let b = Board::from_fen(fen, false).unwrap();
    let mut p = SearchParams::default();
    p.depth = 5;
    p.use_tt = true;
    p.threads = 4;
    p.use_nullmove = true;
    p.use_lmr = true;
    let mut s = Searcher::default();
    s.set_tt_capacity_mb(8);
    let r = s.search_with_params(&b, p);
    assert!(r.bestmove.is_some());
    assert!(r.nodes > 0);
}

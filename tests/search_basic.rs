use cozy_chess::Board;

#[test]
fn search_returns_a_legal_move_from_startpos() {
    use talon::search::alphabeta::Searcher;
    let b = Board::default();
    let mut s = Searcher::default();
    let r = s.search_depth(&b, 1);
    assert!(r.bestmove.is_some(), "no move found at depth 1");
}

#[test]
fn search_prefers_the_winning_queen_capture() {
    use talon::search::alphabeta::Searcher;
    // Qe2xd2 wins a queen; anything else loses one.
    let fen = "k7/8/8/8/8/8/3qQ3/7K w - - 0 1";
    let b = Board::from_fen(fen, false).expect("valid fen");
    let mut s = Searcher::default();
    let r = s.search_depth(&b, 1);
    assert_eq!(r.bestmove.as_deref(), Some("e2d2"), "expected Qxd2");
    assert!(r.score_cp > 500, "winning a queen should score high: {}", r.score_cp);
}

#[test]
fn quiescence_stand_pat_matches_eval_on_a_quiet_position() {
    use talon::search::alphabeta::Searcher;
    use talon::search::eval::eval_cp;
    let b = Board::from_fen("8/5k2/8/8/8/8/5PK1/8 w - - 0 1", false).unwrap();
    let mut s = Searcher::default();
    assert_eq!(s.qsearch_eval_cp(&b), eval_cp(&b), "no tactics means stand pat");
}

#[test]
fn deeper_search_still_reports_nodes_and_a_move() {
    use talon::search::alphabeta::{SearchParams, Searcher};
    let b = Board::default();
    let mut s = Searcher::default();
    let mut p = SearchParams::default();
    p.depth = 4;
    p.use_tt = true;
    p.threads = 1;
    p.use_nullmove = true;
    p.use_lmr = true;
    let r = s.search_with_params(&b, p);
    assert!(r.bestmove.is_some());
    assert!(r.nodes > 0);
    assert!(r.score_cp.abs() < 1000, "startpos should stay balanced: {}", r.score_cp);
}

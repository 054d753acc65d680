use cozy_chess::Board;
use talon::search::alphabeta::{SearchParams, Searcher};

#[test]
fn converges_to_the_full_window_value_on_a_quiet_position() {
    // King-and-pawn ending: every line inside the horizon keeps material
    // constant, so the aspirated score must match the full-window one.
    let b = Board::from_fen("8/5k2/8/8/8/8/5PK1/8 w - - 0 1", false).unwrap();

    let mut p = SearchParams::default();
    p.depth = 4;
    p.use_tt = true;
    p.threads = 1;

    let mut s1 = Searcher::default();
    let r1 = s1.search_with_params(&b, p);

    let mut p2 = p;
    p2.use_aspiration = true;
    p2.aspiration_window_cp = 50;
    let mut s2 = Searcher::default();
    let r2 = s2.search_with_params(&b, p2);

    assert_eq!(r2.score_cp, r1.score_cp, "aspiration changed the converged score");
    assert!(r2.nodes <= r1.nodes, "aspiration searched more nodes: {} vs {}", r2.nodes, r1.nodes);
}

#[test]
fn terminates_and_stays_close_on_a_tactical_position() {
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3";
    let b = Board::from_fen(fen, false).unwrap();

    let mut p = SearchParams::default();
    p.depth = 4;
    p.use_tt = true;
    p.threads = 1;

    let mut s1 = Searcher::default();
    let r1 = s1.search_with_params(&b, p);

    let mut p2 = p;
    p2.use_aspiration = true;
    p2.aspiration_window_cp = 50;
    let mut s2 = Searcher::default();
    let r2 = s2.search_with_params(&b, p2);

    assert!(r2.bestmove.is_some());
    assert!(
        (r2.score_cp - r1.score_cp).abs() <= 100,
        "aspiration drifted too far: {} vs {}",
        r2.score_cp,
        r1.score_cp
    );
}

#[test]
fn mate_band_scores_pass_through_the_window_loop() {
    // Iteration scores sit at the edge of the mate band; the re-search loop
    // must still terminate and keep reporting the mate.
    let b = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", false).unwrap();
    let mut p = SearchParams::default();
    p.depth = 4;
    p.use_tt = true;
    p.threads = 1;
    p.use_aspiration = true;
    p.aspiration_window_cp = 10;
    let mut s = Searcher::default();
    let r = s.search_with_params(&b, p);
    assert_eq!(r.bestmove.as_deref(), Some("a1a8"));
}

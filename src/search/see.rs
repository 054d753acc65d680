use cozy_chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_rook_moves, BitBoard,
    Board, Color, Move, Piece, Square,
};

use crate::search::eval::{opponent, piece_value};

const ORDER: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

// All pieces attacking `sq` for either side, given an occupancy that may
// already have had swapped-off pieces removed; sliders are recomputed from
// `occ` so x-ray attackers appear as the pieces in front of them vanish.
fn attackers_to(board: &Board, sq: Square, occ: BitBoard) -> BitBoard {
    let rooks = board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    let bishops = board.pieces(Piece::Bishop) | board.pieces(Piece::Queen);
    let pawns = board.pieces(Piece::Pawn);
    let att = (get_rook_moves(sq, occ) & rooks)
        | (get_bishop_moves(sq, occ) & bishops)
        | (get_knight_moves(sq) & board.pieces(Piece::Knight))
        | (get_king_moves(sq) & board.pieces(Piece::King))
        | (get_pawn_attacks(sq, Color::Black) & pawns & board.colors(Color::White))
        | (get_pawn_attacks(sq, Color::White) & pawns & board.colors(Color::Black));
    att & occ
}

fn least_valuable(board: &Board, attackers: BitBoard) -> Option<(Square, i32)> {
    for piece in ORDER {
        let subset = attackers & board.pieces(piece);
        if let Some(sq) = subset.into_iter().next() {
            return Some((sq, piece_value(piece)));
        }
    }
    None
}

/// Static exchange evaluation of `mv` in centipawns, from the side-to-move
/// perspective: the net material outcome of the capture sequence on the
/// target square assuming both sides recapture with least-valuable pieces
/// and may stop whenever continuing loses material.
pub fn see(board: &Board, mv: Move) -> i32 {
    let target = mv.to;
    let victim = board.piece_on(target).map(piece_value).unwrap_or(0);
    let attacker = match board.piece_on(mv.from) {
        Some(p) => piece_value(p),
        None => return 0,
    };

    let mut gains = [0i32; 32];
    gains[0] = victim;
    let mut depth = 0usize;
    let mut on_square = attacker;
    let mut occ = board.occupied() ^ mv.from.bitboard();
    let mut side = opponent(board.side_to_move());

    while depth + 1 < gains.len() {
        let atts = attackers_to(board, target, occ) & board.colors(side);
        let Some((sq, val)) = least_valuable(board, atts) else {
            break;
        };
        depth += 1;
        gains[depth] = on_square - gains[depth - 1];
        on_square = val;
        occ ^= sq.bitboard();
        side = opponent(side);
    }

    // Fold from the end: each side may decline the next recapture.
    for i in (1..=depth).rev() {
        gains[i - 1] = -(-gains[i - 1]).max(gains[i]);
    }
    gains[0]
}

/// True when the exchange started by `mv` nets at least `threshold`.
pub fn see_ge(board: &Board, mv: Move, threshold: i32) -> bool {
    see(board, mv) >= threshold
}

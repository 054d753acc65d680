use cozy_chess::{Board as CozyBoard, Color};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// Driver-facing position handle around a `cozy_chess::Board`. The search
/// itself borrows the inner board and never mutates it in place; children
/// are value copies, so the caller's position is identical after any search.
#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: CozyBoard::default() }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        CozyBoard::from_fen(fen, false)
            .map(|board| Self { board })
            .map_err(|e| PositionError::InvalidFen { fen: fen.to_string(), reason: format!("{e:?}") })
    }

    pub fn board(&self) -> &CozyBoard {
        &self.board
    }

    pub fn key(&self) -> u64 {
        self.board.hash()
    }

    pub fn in_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn legal_moves_count(&self) -> usize {
        let mut count = 0usize;
        self.board.generate_moves(|moves| {
            count += moves.len();
            false
        });
        count
    }

    pub fn make_move_uci(&mut self, mv_uci: &str) -> Result<(), PositionError> {
        let mut found = None;
        self.board.generate_moves(|moves| {
            for m in moves {
                if format!("{}", m) == mv_uci {
                    found = Some(m);
                    break;
                }
            }
            found.is_some()
        });
        match found {
            Some(m) => {
                self.board.play(m);
                Ok(())
            }
            None => Err(PositionError::IllegalMove(mv_uci.to_string())),
        }
    }

    pub fn set_from_start_and_moves(moves: &[String]) -> Result<Self, PositionError> {
        let mut pos = Self::startpos();
        for m in moves {
            pos.make_move_uci(m)?;
        }
        Ok(pos)
    }
}

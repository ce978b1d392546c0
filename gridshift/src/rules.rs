//! Move generation, move simulation and win detection.
//!
//! Everything here is a pure function of an explicit snapshot: a [`Board`],
//! the active [`WindowPos`] and the per-player remaining piece counts. Nothing
//! is mutated in place; probing a move yields a fresh board.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::board::{
    Board, Mark, WindowPos, ADVANCED_MOVES_THRESHOLD, STARTING_PIECES, WINDOW_SIZE,
};
use crate::GameError;

/// Window shift candidates: left, right, up, down, up-left, down-left, up-right, down-right.
pub const WINDOW_DIRECTIONS: [(i8, i8); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// The eight lines of the window, as offsets from its top-left corner.
static WINDOW_LINES: Lazy<Vec<[(usize, usize); 3]>> = Lazy::new(generate_window_lines);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Move {
    Place {
        x: usize,
        y: usize,
    },
    MoveWindow {
        dx: i8,
        dy: i8,
    },
    MovePiece {
        from_x: usize,
        from_y: usize,
        to_x: usize,
        to_y: usize,
    },
}

impl Move {
    /// Window position after this move is played from `window`.
    ///
    /// Only `MoveWindow` shifts the window; an out-of-range shift leaves it where it was.
    pub fn window_after(self, window: WindowPos) -> WindowPos {
        match self {
            Move::MoveWindow { dx, dy } => window.offset(dx, dy).unwrap_or(window),
            Move::Place { .. } | Move::MovePiece { .. } => window,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PieceCounts {
    pub x: u8,
    pub o: u8,
}

impl PieceCounts {
    pub const FULL: PieceCounts = PieceCounts {
        x: STARTING_PIECES,
        o: STARTING_PIECES,
    };

    pub fn get(&self, mark: Mark) -> u8 {
        match mark {
            Mark::X => self.x,
            Mark::O => self.o,
        }
    }

    pub(crate) fn take_one(&mut self, mark: Mark) {
        let count = match mark {
            Mark::X => &mut self.x,
            Mark::O => &mut self.o,
        };
        *count = count.saturating_sub(1);
    }
}

/// Snapshot of everything the rules need: cells, window and unplaced pieces.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PositionParts")]
pub struct Position {
    pub(crate) board: Board,
    pub(crate) window: WindowPos,
    pub(crate) remaining: PieceCounts,
}

#[derive(Deserialize)]
struct PositionParts {
    board: Board,
    window: WindowPos,
    remaining: PieceCounts,
}

impl TryFrom<PositionParts> for Position {
    type Error = GameError;

    fn try_from(parts: PositionParts) -> Result<Self, Self::Error> {
        Position::new(parts.board, parts.window, parts.remaining)
    }
}

impl Position {
    pub fn new(board: Board, window: WindowPos, remaining: PieceCounts) -> Result<Self, GameError> {
        let window = WindowPos::new(window.x, window.y)?;
        for mark in [Mark::X, Mark::O] {
            let count = remaining.get(mark);
            if count > STARTING_PIECES {
                return Err(GameError::PieceCountOutOfRange { mark, count });
            }
        }
        Ok(Self {
            board,
            window,
            remaining,
        })
    }

    pub fn initial() -> Self {
        Self {
            board: Board::empty(),
            window: WindowPos::CENTER,
            remaining: PieceCounts::FULL,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn window(&self) -> WindowPos {
        self.window
    }

    pub fn remaining(&self, mark: Mark) -> u8 {
        self.remaining.get(mark)
    }

    pub fn piece_counts(&self) -> PieceCounts {
        self.remaining
    }

    pub fn advanced_moves_unlocked(&self, mark: Mark) -> bool {
        advanced_moves_unlocked(self.remaining(mark))
    }

    pub fn legal_moves(&self, mark: Mark) -> Vec<Move> {
        enumerate_moves(
            &self.board,
            self.window,
            mark,
            self.remaining(mark),
            self.advanced_moves_unlocked(mark),
        )
    }

    pub fn is_winning_move(&self, mv: Move, mark: Mark) -> bool {
        is_winning_move(&self.board, self.window, mv, mark)
    }

    /// Does `mark` currently own a full line inside the window?
    pub fn has_win(&self, mark: Mark) -> bool {
        has_win_in_window(&self.board, self.window, mark)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::initial()
    }
}

pub fn advanced_moves_unlocked(remaining: u8) -> bool {
    remaining < ADVANCED_MOVES_THRESHOLD
}

/// Window shifts that keep the window on the board, in [`WINDOW_DIRECTIONS`] order.
pub fn valid_window_moves(window: WindowPos) -> Vec<Move> {
    WINDOW_DIRECTIONS
        .iter()
        .filter(|&&(dx, dy)| window.offset(dx, dy).is_some())
        .map(|&(dx, dy)| Move::MoveWindow { dx, dy })
        .collect()
}

/// All legal moves for `player`: placements, then window shifts, then relocations.
///
/// Placements need `remaining > 0`; shifts and relocations need `advanced`.
/// Placements and relocation sources/destinations are visited row-major
/// inside the window. An empty result means the player has no move.
pub fn enumerate_moves(
    board: &Board,
    window: WindowPos,
    player: Mark,
    remaining: u8,
    advanced: bool,
) -> Vec<Move> {
    debug_assert!(window.is_valid(), "window {window:?} off board");
    let mut moves = Vec::new();

    if remaining > 0 {
        moves.extend(
            window
                .cells()
                .filter(|&(x, y)| board.is_empty(x, y))
                .map(|(x, y)| Move::Place { x, y }),
        );
    }

    if advanced {
        moves.extend(valid_window_moves(window));

        for (from_x, from_y) in window.cells().filter(|&(x, y)| board.get(x, y) == Some(player)) {
            for (to_x, to_y) in window.cells().filter(|&(x, y)| board.is_empty(x, y)) {
                moves.push(Move::MovePiece {
                    from_x,
                    from_y,
                    to_x,
                    to_y,
                });
            }
        }
    }

    trace!(?player, remaining, advanced, count = moves.len(), "enumerated moves");
    moves
}

/// Copy of `board` with `mv` applied for `player`. Window shifts leave the cells untouched.
pub fn simulate(board: &Board, mv: Move, player: Mark) -> Board {
    let mut next = *board;
    match mv {
        Move::Place { x, y } => next.set(x, y, Some(player)),
        Move::MovePiece {
            from_x,
            from_y,
            to_x,
            to_y,
        } => {
            next.set(from_x, from_y, None);
            next.set(to_x, to_y, Some(player));
        }
        Move::MoveWindow { .. } => {}
    }
    next
}

/// True iff some row, column or diagonal of the window is entirely `player`.
pub fn has_win_in_window(board: &Board, window: WindowPos, player: Mark) -> bool {
    debug_assert!(window.is_valid(), "window {window:?} off board");
    WINDOW_LINES.iter().any(|line| {
        line.iter()
            .all(|&(dx, dy)| board.get(window.x + dx, window.y + dy) == Some(player))
    })
}

/// Would `mv`, played with `player`'s mark, leave a line for `player` in the
/// resulting window? Window shifts are judged against the shifted window.
pub fn is_winning_move(board: &Board, window: WindowPos, mv: Move, player: Mark) -> bool {
    let next = simulate(board, mv, player);
    has_win_in_window(&next, mv.window_after(window), player)
}

fn generate_window_lines() -> Vec<[(usize, usize); 3]> {
    let mut lines = Vec::with_capacity(2 * WINDOW_SIZE + 2);
    // Rows
    for row in 0..WINDOW_SIZE {
        lines.push([(0, row), (1, row), (2, row)]);
    }
    // Columns
    for col in 0..WINDOW_SIZE {
        lines.push([(col, 0), (col, 1), (col, 2)]);
    }
    // Diagonal \
    lines.push([(0, 0), (1, 1), (2, 2)]);
    // Diagonal /
    lines.push([(2, 0), (1, 1), (0, 2)]);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(rows: [&str; 5]) -> Board {
        Board::from_rows(&rows).unwrap()
    }

    #[test]
    fn empty_board_offers_nine_placements() {
        let moves = enumerate_moves(&Board::empty(), WindowPos::CENTER, Mark::X, 4, false);
        assert_eq!(moves.len(), 9);
        assert_eq!(moves[0], Move::Place { x: 1, y: 1 });
        assert_eq!(moves[1], Move::Place { x: 2, y: 1 });
        assert_eq!(moves[8], Move::Place { x: 3, y: 3 });
        assert!(moves.iter().all(|m| matches!(m, Move::Place { .. })));
    }

    #[test]
    fn window_moves_follow_direction_order() {
        let center = valid_window_moves(WindowPos::CENTER);
        let expected: Vec<Move> = WINDOW_DIRECTIONS
            .iter()
            .map(|&(dx, dy)| Move::MoveWindow { dx, dy })
            .collect();
        assert_eq!(center, expected);

        let corner = valid_window_moves(WindowPos::new(0, 0).unwrap());
        assert_eq!(
            corner,
            vec![
                Move::MoveWindow { dx: 1, dy: 0 },
                Move::MoveWindow { dx: 0, dy: 1 },
                Move::MoveWindow { dx: 1, dy: 1 },
            ]
        );
    }

    #[test]
    fn emission_order_is_place_window_relocate() {
        let b = board([".....", ".X...", ".....", ".....", "....."]);
        let moves = enumerate_moves(&b, WindowPos::CENTER, Mark::X, 2, true);
        // 8 placements, 8 shifts, 1 source x 8 destinations.
        assert_eq!(moves.len(), 8 + 8 + 8);
        assert!(moves[..8].iter().all(|m| matches!(m, Move::Place { .. })));
        assert!(moves[8..16].iter().all(|m| matches!(m, Move::MoveWindow { .. })));
        assert_eq!(
            moves[16],
            Move::MovePiece {
                from_x: 1,
                from_y: 1,
                to_x: 2,
                to_y: 1
            }
        );
        assert_eq!(
            moves[23],
            Move::MovePiece {
                from_x: 1,
                from_y: 1,
                to_x: 3,
                to_y: 3
            }
        );
    }

    #[test]
    fn relocations_ignore_pieces_outside_window() {
        let b = board(["X....", ".....", ".....", ".....", "....."]);
        let moves = enumerate_moves(&b, WindowPos::CENTER, Mark::X, 0, true);
        assert!(moves.iter().all(|m| matches!(m, Move::MoveWindow { .. })));
    }

    #[test]
    fn no_pieces_and_locked_yields_nothing() {
        let moves = enumerate_moves(&Board::empty(), WindowPos::CENTER, Mark::O, 0, false);
        assert!(moves.is_empty());
    }

    #[test]
    fn simulate_leaves_input_untouched() {
        let b = board([".....", ".X...", ".....", ".....", "....."]);
        let moved = simulate(
            &b,
            Move::MovePiece {
                from_x: 1,
                from_y: 1,
                to_x: 3,
                to_y: 2,
            },
            Mark::X,
        );
        assert_eq!(b.get(1, 1), Some(Mark::X));
        assert_eq!(moved.get(1, 1), None);
        assert_eq!(moved.get(3, 2), Some(Mark::X));

        let shifted = simulate(&b, Move::MoveWindow { dx: 1, dy: 0 }, Mark::X);
        assert_eq!(shifted, b);
    }

    #[test]
    fn detects_each_line_kind() {
        let row = board([".....", ".....", ".OOO.", ".....", "....."]);
        assert!(has_win_in_window(&row, WindowPos::CENTER, Mark::O));
        assert!(!has_win_in_window(&row, WindowPos::CENTER, Mark::X));

        let col = board([".....", "...X.", "...X.", "...X.", "....."]);
        assert!(has_win_in_window(&col, WindowPos::CENTER, Mark::X));

        let diag = board([".....", ".X...", "..X..", "...X.", "....."]);
        assert!(has_win_in_window(&diag, WindowPos::CENTER, Mark::X));

        let anti = board([".....", "...O.", "..O..", ".O...", "....."]);
        assert!(has_win_in_window(&anti, WindowPos::CENTER, Mark::O));
    }

    #[test]
    fn lines_outside_window_do_not_count() {
        let b = board(["XXX..", ".....", ".....", ".....", "....."]);
        assert!(!has_win_in_window(&b, WindowPos::CENTER, Mark::X));
        assert!(has_win_in_window(&b, WindowPos::new(0, 0).unwrap(), Mark::X));
    }

    #[test]
    fn mixed_window_is_not_a_win() {
        let b = board([".....", ".XOX.", ".OXO.", ".OXO.", "....."]);
        assert!(!has_win_in_window(&b, WindowPos::CENTER, Mark::X));
        assert!(!has_win_in_window(&b, WindowPos::CENTER, Mark::O));
    }

    #[test]
    fn window_shift_wins_against_shifted_window() {
        // X owns the top row of the board; the centered window does not see it.
        let b = board(["XXX..", ".....", ".....", ".....", "....."]);
        let up_left = Move::MoveWindow { dx: -1, dy: -1 };
        assert!(is_winning_move(&b, WindowPos::CENTER, up_left, Mark::X));
        assert!(!is_winning_move(
            &b,
            WindowPos::CENTER,
            Move::MoveWindow { dx: 1, dy: 1 },
            Mark::X
        ));
    }

    #[test]
    fn position_rejects_bad_snapshots() {
        let res = Position::new(
            Board::empty(),
            WindowPos { x: 3, y: 0 },
            PieceCounts::FULL,
        );
        assert!(matches!(res, Err(GameError::WindowOutOfBounds { .. })));

        let res = Position::new(
            Board::empty(),
            WindowPos::CENTER,
            PieceCounts { x: 5, o: 4 },
        );
        assert!(matches!(
            res,
            Err(GameError::PieceCountOutOfRange {
                mark: Mark::X,
                count: 5
            })
        ));
    }

    #[test]
    fn unlock_threshold_is_a_count() {
        assert!(!advanced_moves_unlocked(4));
        assert!(!advanced_moves_unlocked(3));
        assert!(advanced_moves_unlocked(2));
        assert!(advanced_moves_unlocked(0));
    }

    #[test]
    fn moves_serialize_tagged() {
        let json = serde_json::to_string(&Move::MoveWindow { dx: -1, dy: 0 }).unwrap();
        assert_eq!(json, r#"{"type":"move_window","dx":-1,"dy":0}"#);
        let mv: Move =
            serde_json::from_str(r#"{"type":"move_piece","from_x":1,"from_y":1,"to_x":2,"to_y":3}"#)
                .unwrap();
        assert_eq!(
            mv,
            Move::MovePiece {
                from_x: 1,
                from_y: 1,
                to_x: 2,
                to_y: 3
            }
        );
    }

    #[test]
    fn position_deserialization_validates() {
        let json = r#"{"board":[".....",".....",".....",".....","....."],"window":{"x":2,"y":3},"remaining":{"x":4,"o":4}}"#;
        assert!(serde_json::from_str::<Position>(json).is_err());
    }
}

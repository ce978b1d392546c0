//! Rules and move selection for a 5×5 board with a sliding 3×3 window.
//! Each player places up to four marks; three in a line *inside the window*
//! wins. Once a player is down to two unplaced marks they may instead shift
//! the window one step or relocate one of their marks within it.
//!
//! All engine entry points are pure: callers hand in a [`Position`] snapshot
//! and receive a [`Move`]; applying it is the job of [`Game`] or of whatever
//! owns the authoritative state.
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod board;
pub mod decision;
pub mod game;
pub mod rules;

pub use board::{Board, Mark, WindowPos, BOARD_SIZE, STARTING_PIECES, WINDOW_SIZE};
pub use decision::{decide, select_move, Decision, Reason};
pub use game::{Game, MoveOutcome, Scores};
pub use rules::{
    enumerate_moves, has_win_in_window, is_winning_move, simulate, valid_window_moves, Move,
    PieceCounts, Position,
};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid board at row {row}: {reason}")]
    ParseBoard { row: usize, reason: String },
    #[error("window position ({x}, {y}) is off the board")]
    WindowOutOfBounds { x: i64, y: i64 },
    #[error("{mark} cannot have {count} unplaced pieces")]
    PieceCountOutOfRange { mark: Mark, count: u8 },
    #[error("cell ({x}, {y}) is off the board")]
    CellOutOfBounds { x: usize, y: usize },
    #[error("cell ({x}, {y}) is outside the active window")]
    OutsideWindow { x: usize, y: usize },
    #[error("cell ({x}, {y}) is occupied")]
    CellOccupied { x: usize, y: usize },
    #[error("cell ({x}, {y}) does not hold the mover's piece")]
    NotOwnPiece { x: usize, y: usize },
    #[error("{mark} has no pieces left to place")]
    NoPiecesLeft { mark: Mark },
    #[error("{mark} cannot move the window or relocate pieces yet")]
    AdvancedMovesLocked { mark: Mark },
    #[error("window delta ({dx}, {dy}) must be one step")]
    InvalidWindowDelta { dx: i8, dy: i8 },
    #[error("the game is already over")]
    GameOver,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub position: Position,
    pub player: Mark,
    /// Fixes the random fallback; the thread-local generator is used when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    #[serde(rename = "move")]
    pub mv: Option<Move>,
    pub reason: Option<Reason>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub position: Position,
    pub player: Mark,
    #[serde(rename = "move")]
    pub mv: Move,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResponse {
    pub position: Position,
    pub winner: Option<Mark>,
    pub to_move: Mark,
}

/// Runs the decision engine for `request.player` against the other mark.
pub fn choose_move(request: MoveRequest) -> MoveResponse {
    let player = request.player;
    let decision = match request.seed {
        Some(seed) => decide(
            &request.position,
            player,
            player.opponent(),
            &mut StdRng::seed_from_u64(seed),
        ),
        None => decide(&request.position, player, player.opponent(), &mut rand::rng()),
    };
    MoveResponse {
        mv: decision.map(|d| d.mv),
        reason: decision.map(|d| d.reason),
    }
}

/// Validates and applies one move to a snapshot on behalf of `request.player`.
pub fn apply_move(request: ApplyRequest) -> Result<ApplyResponse, GameError> {
    let mut game = Game::from_position(request.position, request.player);
    let outcome = game.apply(request.mv)?;
    Ok(ApplyResponse {
        position: *game.position(),
        winner: outcome.winner,
        to_move: game.to_move(),
    })
}

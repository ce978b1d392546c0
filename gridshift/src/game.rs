//! Authoritative game state: validates and applies moves, tracks whose turn
//! it is, whether someone has won, and the running score across games.
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{Mark, BOARD_SIZE};
use crate::decision::{decide, Decision};
use crate::rules::{simulate, Move, Position};
use crate::GameError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub player: Mark,
    pub mv: Move,
    pub winner: Option<Mark>,
}

/// Games won per mark since the [`Game`] was created. Survives [`Game::reset`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub x: u32,
    pub o: u32,
}

impl Scores {
    pub fn get(&self, mark: Mark) -> u32 {
        match mark {
            Mark::X => self.x,
            Mark::O => self.o,
        }
    }

    fn record_win(&mut self, mark: Mark) {
        let score = match mark {
            Mark::X => &mut self.x,
            Mark::O => &mut self.o,
        };
        *score = score.saturating_add(1);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    position: Position,
    to_move: Mark,
    winner: Option<Mark>,
    scores: Scores,
}

impl Game {
    pub fn new() -> Self {
        Self::from_position(Position::initial(), Mark::X)
    }

    /// Resumes play from an arbitrary snapshot, e.g. one received over the wire.
    pub fn from_position(position: Position, to_move: Mark) -> Self {
        let winner = [to_move, to_move.opponent()]
            .into_iter()
            .find(|&mark| position.has_win(mark));
        Self {
            position,
            to_move,
            winner,
            scores: Scores::default(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    pub fn winner(&self) -> Option<Mark> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// Starts a fresh game; the score tally is kept.
    pub fn reset(&mut self) {
        let scores = self.scores;
        *self = Self::new();
        self.scores = scores;
    }

    /// Applies `mv` for the side to move, then checks the window for a line.
    pub fn apply(&mut self, mv: Move) -> Result<MoveOutcome, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let player = self.to_move;
        self.validate(mv, player)?;

        self.position.board = simulate(&self.position.board, mv, player);
        self.position.window = mv.window_after(self.position.window);
        if let Move::Place { .. } = mv {
            self.position.remaining.take_one(player);
        }

        // The mover takes precedence if a relocation completes lines for both sides.
        self.winner = [player, player.opponent()]
            .into_iter()
            .find(|&mark| self.position.has_win(mark));
        match self.winner {
            Some(winner) => {
                self.scores.record_win(winner);
                info!(%winner, ?mv, scores = ?self.scores, "game won");
            }
            None => self.to_move = player.opponent(),
        }
        debug!(%player, ?mv, "applied move");

        Ok(MoveOutcome {
            player,
            mv,
            winner: self.winner,
        })
    }

    /// Lets the decision engine play for the side to move.
    ///
    /// `Ok(None)` means the side to move has no legal move.
    pub fn play_ai<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<(Decision, MoveOutcome)>, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let player = self.to_move;
        let Some(decision) = decide(&self.position, player, player.opponent(), rng) else {
            return Ok(None);
        };
        let outcome = self.apply(decision.mv)?;
        Ok(Some((decision, outcome)))
    }

    fn validate(&self, mv: Move, player: Mark) -> Result<(), GameError> {
        let pos = &self.position;
        match mv {
            Move::Place { x, y } => {
                if pos.remaining(player) == 0 {
                    return Err(GameError::NoPiecesLeft { mark: player });
                }
                self.check_window_cell(x, y)?;
                if !pos.board.is_empty(x, y) {
                    return Err(GameError::CellOccupied { x, y });
                }
            }
            Move::MovePiece {
                from_x,
                from_y,
                to_x,
                to_y,
            } => {
                if !pos.advanced_moves_unlocked(player) {
                    return Err(GameError::AdvancedMovesLocked { mark: player });
                }
                self.check_window_cell(from_x, from_y)?;
                self.check_window_cell(to_x, to_y)?;
                if pos.board.get(from_x, from_y) != Some(player) {
                    return Err(GameError::NotOwnPiece {
                        x: from_x,
                        y: from_y,
                    });
                }
                if !pos.board.is_empty(to_x, to_y) {
                    return Err(GameError::CellOccupied { x: to_x, y: to_y });
                }
            }
            Move::MoveWindow { dx, dy } => {
                if !pos.advanced_moves_unlocked(player) {
                    return Err(GameError::AdvancedMovesLocked { mark: player });
                }
                if !(-1..=1).contains(&dx) || !(-1..=1).contains(&dy) || (dx, dy) == (0, 0) {
                    return Err(GameError::InvalidWindowDelta { dx, dy });
                }
                if pos.window.offset(dx, dy).is_none() {
                    return Err(GameError::WindowOutOfBounds {
                        x: pos.window.x as i64 + dx as i64,
                        y: pos.window.y as i64 + dy as i64,
                    });
                }
            }
        }
        Ok(())
    }

    fn check_window_cell(&self, x: usize, y: usize) -> Result<(), GameError> {
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            return Err(GameError::CellOutOfBounds { x, y });
        }
        if !self.position.window.contains(x, y) {
            return Err(GameError::OutsideWindow { x, y });
        }
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

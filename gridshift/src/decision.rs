//! One-ply move selection: take a win, else take the opponent's win away,
//! else play a uniformly random legal move.
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Mark;
use crate::rules::{Move, Position};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reason {
    Win,
    Block,
    Random,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Decision {
    pub mv: Move,
    pub reason: Reason,
}

/// Picks a move for `player`, or `None` when it has no legal move.
pub fn select_move<R: Rng + ?Sized>(
    position: &Position,
    player: Mark,
    opponent: Mark,
    rng: &mut R,
) -> Option<Move> {
    decide(position, player, opponent, rng).map(|d| d.mv)
}

/// Like [`select_move`], but also reports which rule produced the move.
///
/// Ties go to the first candidate in enumeration order. The block probe
/// replays each of `player`'s own candidates with `opponent`'s mark.
pub fn decide<R: Rng + ?Sized>(
    position: &Position,
    player: Mark,
    opponent: Mark,
    rng: &mut R,
) -> Option<Decision> {
    let moves = position.legal_moves(player);
    if moves.is_empty() {
        debug!(?player, "no legal move");
        return None;
    }

    let decision = if let Some(&mv) = moves
        .iter()
        .find(|&&mv| position.is_winning_move(mv, player))
    {
        Decision {
            mv,
            reason: Reason::Win,
        }
    } else if let Some(&mv) = moves
        .iter()
        .find(|&&mv| position.is_winning_move(mv, opponent))
    {
        Decision {
            mv,
            reason: Reason::Block,
        }
    } else {
        Decision {
            mv: random_choice(&moves, rng),
            reason: Reason::Random,
        }
    };

    debug!(
        ?player,
        candidates = moves.len(),
        reason = ?decision.reason,
        mv = ?decision.mv,
        "selected move"
    );
    Some(decision)
}

/// The single random draw. `moves` must be non-empty.
fn random_choice<R: Rng + ?Sized>(moves: &[Move], rng: &mut R) -> Move {
    moves[rng.random_range(0..moves.len())]
}

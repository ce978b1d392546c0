//! Board geometry: the 5×5 cell grid, the two marks, and the 3×3 active window.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GameError;

pub const BOARD_SIZE: usize = 5;
pub const WINDOW_SIZE: usize = 3;
/// Largest legal window coordinate on either axis.
pub const WINDOW_MAX: usize = BOARD_SIZE - WINDOW_SIZE;
pub const STARTING_PIECES: u8 = 4;
/// Window and piece relocation unlock once the remaining count drops below this.
pub const ADVANCED_MOVES_THRESHOLD: u8 = 3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    fn symbol(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Top-left corner of the active window, always inside `0..=WINDOW_MAX`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WindowPos {
    pub x: usize,
    pub y: usize,
}

impl WindowPos {
    pub const CENTER: WindowPos = WindowPos { x: 1, y: 1 };

    pub fn new(x: usize, y: usize) -> Result<Self, GameError> {
        if x > WINDOW_MAX || y > WINDOW_MAX {
            return Err(GameError::WindowOutOfBounds {
                x: i64::try_from(x).unwrap_or(i64::MAX),
                y: i64::try_from(y).unwrap_or(i64::MAX),
            });
        }
        Ok(Self { x, y })
    }

    /// Shifts the window by one step per axis, or `None` if it would leave the board.
    pub fn offset(self, dx: i8, dy: i8) -> Option<WindowPos> {
        let nx = self.x as i64 + dx as i64;
        let ny = self.y as i64 + dy as i64;
        let in_range = |v: i64| v >= 0 && v + WINDOW_SIZE as i64 <= BOARD_SIZE as i64;
        if in_range(nx) && in_range(ny) {
            Some(WindowPos {
                x: nx as usize,
                y: ny as usize,
            })
        } else {
            None
        }
    }

    pub fn contains(self, x: usize, y: usize) -> bool {
        (self.x..self.x + WINDOW_SIZE).contains(&x) && (self.y..self.y + WINDOW_SIZE).contains(&y)
    }

    /// Board coordinates covered by the window in row-major order (y outer, x inner).
    pub fn cells(self) -> impl Iterator<Item = (usize, usize)> {
        (self.y..self.y + WINDOW_SIZE)
            .flat_map(move |y| (self.x..self.x + WINDOW_SIZE).map(move |x| (x, y)))
    }

    pub(crate) fn is_valid(self) -> bool {
        self.x <= WINDOW_MAX && self.y <= WINDOW_MAX
    }
}

impl Default for WindowPos {
    fn default() -> Self {
        Self::CENTER
    }
}

/// The full 5×5 grid. Cells are stored row-major as `cells[y][x]`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Board {
    cells: [[Option<Mark>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses five rows of five characters: `.` empty, `X` or `O` (any case).
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, GameError> {
        if rows.len() != BOARD_SIZE {
            return Err(GameError::ParseBoard {
                row: rows.len().min(BOARD_SIZE),
                reason: format!("expected {BOARD_SIZE} rows, found {}", rows.len()),
            });
        }
        let mut board = Board::empty();
        for (y, row) in rows.iter().enumerate() {
            let chars: Vec<char> = row.as_ref().chars().collect();
            if chars.len() != BOARD_SIZE {
                return Err(GameError::ParseBoard {
                    row: y,
                    reason: format!("expected {BOARD_SIZE} cells, found {}", chars.len()),
                });
            }
            for (x, ch) in chars.into_iter().enumerate() {
                board.cells[y][x] = match ch {
                    '.' => None,
                    'X' | 'x' => Some(Mark::X),
                    'O' | 'o' => Some(Mark::O),
                    _ => {
                        return Err(GameError::ParseBoard {
                            row: y,
                            reason: format!("unexpected cell {ch:?} at column {x}"),
                        })
                    }
                };
            }
        }
        Ok(board)
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map_or('.', Mark::symbol))
                    .collect::<String>()
            })
            .collect()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Mark> {
        debug_assert!(x < BOARD_SIZE && y < BOARD_SIZE, "cell ({x}, {y}) off board");
        self.cells[y][x]
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Option<Mark>) {
        debug_assert!(x < BOARD_SIZE && y < BOARD_SIZE, "cell ({x}, {y}) off board");
        self.cells[y][x] = cell;
    }

    pub fn is_empty(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_none()
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&cell| cell == Some(mark))
            .count()
    }
}

impl TryFrom<Vec<String>> for Board {
    type Error = GameError;

    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        Board::from_rows(&rows)
    }
}

impl From<Board> for Vec<String> {
    fn from(board: Board) -> Self {
        board.to_rows()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

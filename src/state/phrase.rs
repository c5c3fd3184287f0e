use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of cells along one side of a board.
pub const GRID_SIZE: usize = 5;
/// Number of phrases a board (and therefore a ledger) must hold.
pub const BOARD_SIZE: usize = GRID_SIZE * GRID_SIZE;

/// Column letter of a board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    /// First column.
    B,
    /// Second column.
    I,
    /// Centre column.
    N,
    /// Fourth column.
    G,
    /// Last column.
    O,
}

impl Column {
    /// Columns in grid order.
    pub const ALL: [Column; GRID_SIZE] = [Column::B, Column::I, Column::N, Column::G, Column::O];

    /// Zero-based position of the column from the left edge.
    pub fn index(self) -> usize {
        match self {
            Column::B => 0,
            Column::I => 1,
            Column::N => 2,
            Column::G => 3,
            Column::O => 4,
        }
    }

    /// Column letter.
    pub fn letter(self) -> &'static str {
        match self {
            Column::B => "B",
            Column::I => "I",
            Column::N => "N",
            Column::G => "G",
            Column::O => "O",
        }
    }

    /// Parse a column letter, case-insensitively.
    pub fn from_letter(letter: &str) -> Option<Self> {
        Column::ALL
            .into_iter()
            .find(|column| column.letter().eq_ignore_ascii_case(letter))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// Grid coordinates assigned to a phrase when a board is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Grid column.
    pub column: Column,
    /// Zero-based row.
    pub row: u8,
}

impl Cell {
    /// Cell at `column`, `row`.
    pub fn new(column: Column, row: u8) -> Self {
        Self { column, row }
    }

    /// Map a post-shuffle index onto the grid: index 0 is `B0`, index 24 is `O4`.
    pub fn from_index(index: usize) -> Self {
        Self {
            column: Column::ALL[index % GRID_SIZE],
            row: (index / GRID_SIZE) as u8,
        }
    }

    /// Column letter followed by row number, e.g. `N2`.
    pub fn position(&self) -> String {
        format!("{}{}", self.column, self.row)
    }

    /// Whether the cell lies on `B0`..`O4`.
    pub fn on_diagonal(&self) -> bool {
        self.column.index() == self.row as usize
    }

    /// Whether the cell lies on `B4`..`O0`.
    pub fn on_anti_diagonal(&self) -> bool {
        self.column.index() + self.row as usize == GRID_SIZE - 1
    }
}

/// A statement or event players watch out for.
///
/// The ledger copy never carries a [`Cell`]; every board holds its own copy
/// with board-local selection, coordinates and display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    /// Stable identifier shared by the ledger and every board.
    pub id: String,
    /// Text shown to the audience.
    pub text: String,
    /// Selection state.
    #[serde(default)]
    pub selected: bool,
    /// Grid cell on a board; `None` for ledger phrases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<Cell>,
    /// Position in ledger listings.
    #[serde(default)]
    pub display_order: usize,
}

impl Phrase {
    /// Unselected phrase with no cell.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            selected: false,
            cell: None,
            display_order: 0,
        }
    }

    /// Position string of the board cell, if the phrase has been placed.
    pub fn position(&self) -> Option<String> {
        self.cell.as_ref().map(Cell::position)
    }

    /// Strip board-local attributes so the phrase can live on the ledger.
    pub(crate) fn detached(mut self) -> Self {
        self.selected = false;
        self.cell = None;
        self.display_order = 0;
        self
    }
}

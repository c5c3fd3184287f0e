use std::{
    collections::{HashMap, HashSet},
    time::{SystemTime, UNIX_EPOCH},
};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{
    phrase::{BOARD_SIZE, Cell, Column, GRID_SIZE, Phrase},
    player::Player,
};

/// Source of the seed used to shuffle freshly generated boards.
pub trait SeedSource: Send + Sync {
    /// Seed for the next shuffle.
    fn seed(&self) -> u64;
}

/// Seeds from the wall clock; used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockSeed;

impl SeedSource for ClockSeed {
    fn seed(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default()
    }
}

/// Always yields the same seed, making board layouts reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedSeed(pub u64);

impl SeedSource for FixedSeed {
    fn seed(&self) -> u64 {
        self.0
    }
}

/// A complete line of selected cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BingoLine {
    /// A full B-I-N-G-O column.
    Column(Column),
    /// A full row.
    Row(u8),
    /// `B0` to `O4`.
    Diagonal,
    /// `B4` to `O0`.
    AntiDiagonal,
}

impl BingoLine {
    /// Whether `cell` lies on this line.
    pub fn contains(&self, cell: &Cell) -> bool {
        match self {
            BingoLine::Column(column) => cell.column == *column,
            BingoLine::Row(row) => cell.row == *row,
            BingoLine::Diagonal => cell.on_diagonal(),
            BingoLine::AntiDiagonal => cell.on_anti_diagonal(),
        }
    }
}

/// Outcome of re-evaluating a board after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BingoTransition {
    /// No bingo before or after.
    None,
    /// Bingo reached for the first time.
    Declared,
    /// Bingo was already declared and still holds.
    Held,
    /// A previously declared bingo no longer holds.
    Lost,
}

impl BingoTransition {
    /// `true` for [`BingoTransition::Declared`] and [`BingoTransition::Held`].
    pub fn has_bingo(self) -> bool {
        matches!(self, BingoTransition::Declared | BingoTransition::Held)
    }
}

/// One player's shuffled view of the game's phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Identifier.
    pub id: Uuid,
    /// Game the item belongs to.
    pub game_id: Uuid,
    /// Owner of the board.
    pub player: Player,
    /// Sticky flag set when a bingo is first declared and cleared when it no longer holds.
    #[serde(default)]
    pub bingo_declared: bool,
    /// Identifier of the pre-selected free square, if the pool has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_phrase: Option<String>,
    /// Board phrases keyed by identifier.
    pub phrases: HashMap<String, Phrase>,
}

impl Board {
    /// Shuffle a copy of the ledger phrases and lay them out on the grid.
    ///
    /// When `free_square` names a phrase text present in the pool, that phrase
    /// is swapped into the centre cell and starts selected.
    pub fn generate(
        game_id: Uuid,
        player: Player,
        ledger_phrases: &[Phrase],
        seed: &dyn SeedSource,
        free_square: Option<&str>,
    ) -> Self {
        let mut shuffled = ledger_phrases.to_vec();
        let mut rng = StdRng::seed_from_u64(seed.seed());
        shuffled.shuffle(&mut rng);

        for phrase in &mut shuffled {
            phrase.selected = false;
        }

        let centre = BOARD_SIZE / 2;
        let free_index = free_square.and_then(|text| shuffled.iter().position(|p| p.text == text));
        if let Some(index) = free_index {
            if centre < shuffled.len() {
                shuffled.swap(index, centre);
                shuffled[centre].selected = true;
            }
        }
        let free_phrase = free_index
            .and_then(|_| shuffled.get(centre))
            .map(|phrase| phrase.id.clone());

        let phrases = shuffled
            .into_iter()
            .enumerate()
            .map(|(index, mut phrase)| {
                phrase.cell = Some(Cell::from_index(index));
                phrase.display_order = index;
                (phrase.id.clone(), phrase)
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            game_id,
            player,
            bingo_declared: false,
            free_phrase,
            phrases,
        }
    }

    /// Flip the local selection of a phrase. Unknown identifiers are ignored.
    pub fn toggle_selection(&mut self, phrase_id: &str) -> Option<&Phrase> {
        let phrase = self.phrases.get_mut(phrase_id)?;
        phrase.selected = !phrase.selected;
        Some(phrase)
    }

    /// Set the local selection of a phrase, returning whether it changed.
    pub fn set_selection(&mut self, phrase_id: &str, selected: bool) -> Option<bool> {
        let phrase = self.phrases.get_mut(phrase_id)?;
        let changed = phrase.selected != selected;
        phrase.selected = selected;
        Some(changed)
    }

    /// Lines whose every cell is selected.
    pub fn completed_lines(&self) -> Vec<BingoLine> {
        let mut columns = [0usize; GRID_SIZE];
        let mut rows = [0usize; GRID_SIZE];
        let mut diagonal = 0;
        let mut anti_diagonal = 0;

        let selected_cells = self
            .phrases
            .values()
            .filter(|phrase| phrase.selected)
            .filter_map(|phrase| phrase.cell)
            .filter(|cell| (cell.row as usize) < GRID_SIZE);

        for cell in selected_cells {
            columns[cell.column.index()] += 1;
            rows[cell.row as usize] += 1;
            if cell.on_diagonal() {
                diagonal += 1;
            }
            if cell.on_anti_diagonal() {
                anti_diagonal += 1;
            }
        }

        let mut lines = Vec::new();
        for column in Column::ALL {
            if columns[column.index()] == GRID_SIZE {
                lines.push(BingoLine::Column(column));
            }
        }
        for (row, count) in rows.iter().enumerate() {
            if *count == GRID_SIZE {
                lines.push(BingoLine::Row(row as u8));
            }
        }
        if diagonal == GRID_SIZE {
            lines.push(BingoLine::Diagonal);
        }
        if anti_diagonal == GRID_SIZE {
            lines.push(BingoLine::AntiDiagonal);
        }
        lines
    }

    /// True iff some row, column or diagonal is fully selected.
    pub fn evaluate_bingo(&self) -> bool {
        !self.completed_lines().is_empty()
    }

    /// Re-run the detector and store the result in `bingo_declared`.
    pub fn refresh_bingo(&mut self) -> BingoTransition {
        let was = self.bingo_declared;
        let now = self.evaluate_bingo();
        self.bingo_declared = now;
        match (was, now) {
            (false, false) => BingoTransition::None,
            (false, true) => BingoTransition::Declared,
            (true, true) => BingoTransition::Held,
            (true, false) => BingoTransition::Lost,
        }
    }

    /// Identifiers of phrases sitting on a completed line.
    pub fn winning_phrase_ids(&self) -> HashSet<String> {
        let lines = self.completed_lines();
        self.phrases
            .values()
            .filter(|phrase| {
                phrase
                    .cell
                    .is_some_and(|cell| lines.iter().any(|line| line.contains(&cell)))
            })
            .map(|phrase| phrase.id.clone())
            .collect()
    }

    /// Copy text from an edited phrase while keeping the local selection and layout.
    pub fn apply_phrase_edit(&mut self, phrase: &Phrase) -> bool {
        let Some(local) = self.phrases.get_mut(&phrase.id) else {
            return false;
        };
        local.text = phrase.text.clone();
        true
    }

    /// Whether `id` is the board's free phrase.
    pub fn is_free_phrase(&self, phrase_id: &str) -> bool {
        self.free_phrase.as_deref() == Some(phrase_id)
    }

    /// Phrases sorted by their display order.
    pub fn by_display_order(&self) -> Vec<&Phrase> {
        let mut phrases: Vec<_> = self.phrases.values().collect();
        phrases.sort_by_key(|phrase| phrase.display_order);
        phrases
    }

    /// Mask the owner's e-mail unless it is `keep`.
    pub fn obscure(&mut self, keep: &str) {
        self.player.obscure(keep);
    }
}

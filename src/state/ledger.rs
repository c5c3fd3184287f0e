use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{
    phrase::Phrase,
    player::{Player, Players},
};

/// The phrase pool handed to a new game does not fit a board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Pool size differs from the board size.
    #[error("phrase pool holds {actual} phrases, a board needs exactly {expected}")]
    PhraseCount {
        /// Squares on a board.
        expected: usize,
        /// Phrases in the pool.
        actual: usize,
    },
    /// Two phrases share an identifier.
    #[error("phrase `{id}` appears more than once in the pool")]
    DuplicatePhrase {
        /// Repeated phrase identifier.
        id: String,
    },
}

/// A ledger phrase together with the players who currently have it selected.
///
/// `phrase.selected` is true exactly when `players` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Master phrase.
    pub phrase: Phrase,
    /// Players who selected the phrase.
    #[serde(default)]
    pub players: Players,
}

impl Record {
    fn new(phrase: Phrase) -> Self {
        Self {
            phrase,
            players: Players::new(),
        }
    }

    /// Number of distinct players who selected the phrase.
    pub fn count(&self) -> usize {
        self.players.len()
    }

    fn sync_selected(&mut self) {
        self.phrase.selected = !self.players.is_empty();
    }
}

/// Game-wide master list of phrases and their selectors.
///
/// Populated once; only selector membership changes afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Record>", into = "Vec<Record>")]
pub struct Ledger {
    records: IndexMap<String, Record>,
}

impl Ledger {
    /// Build the ledger from the phrase source, rejecting pools that do not fill a board.
    pub fn load(phrases: Vec<Phrase>, board_size: usize) -> Result<Self, ConfigurationError> {
        if phrases.len() != board_size {
            return Err(ConfigurationError::PhraseCount {
                expected: board_size,
                actual: phrases.len(),
            });
        }

        let mut records = IndexMap::with_capacity(phrases.len());
        for phrase in phrases {
            let phrase = phrase.detached();
            if records.contains_key(&phrase.id) {
                return Err(ConfigurationError::DuplicatePhrase { id: phrase.id });
            }
            records.insert(phrase.id.clone(), Record::new(phrase));
        }

        Ok(Self { records })
    }

    /// Flip `player`'s membership in the selectors of `phrase_id`.
    ///
    /// Returns `None` when the phrase is not part of the ledger.
    pub fn toggle_selection(&mut self, phrase_id: &str, player: &Player) -> Option<&Record> {
        let selected = !self.find_record(phrase_id)?.players.contains(&player.email);
        self.set_selection(phrase_id, player, selected)
    }

    /// Make `player`'s membership in the selectors of `phrase_id` match `selected`.
    pub fn set_selection(
        &mut self,
        phrase_id: &str,
        player: &Player,
        selected: bool,
    ) -> Option<&Record> {
        let record = self.records.get_mut(phrase_id)?;
        if selected {
            record.players.add(player.clone());
        } else {
            record.players.remove(&player.email);
        }
        record.sync_selected();
        Some(record)
    }

    /// Record of a phrase by identifier.
    pub fn find_record(&self, phrase_id: &str) -> Option<&Record> {
        self.records.get(phrase_id)
    }

    /// Ledger phrases in load order, used to seed new boards.
    pub fn phrases(&self) -> Vec<Phrase> {
        self.records
            .values()
            .map(|record| record.phrase.clone())
            .collect()
    }

    /// Records in pool order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every selection made by the player with `email`.
    pub fn remove_player(&mut self, email: &str) {
        for record in self.records.values_mut() {
            record.players.remove(email);
            record.sync_selected();
        }
    }

    /// Replace the text of a phrase and clear its selectors.
    ///
    /// Returns `false` when the phrase is unknown.
    pub fn reset_phrase(&mut self, phrase: &Phrase) -> bool {
        let Some(record) = self.records.get_mut(&phrase.id) else {
            return false;
        };
        record.phrase.text = phrase.text.clone();
        record.players = Players::new();
        record.sync_selected();
        true
    }

    /// Mask every selector e-mail except `keep`.
    pub fn obscure(&mut self, keep: &str) {
        for record in self.records.values_mut() {
            record.players.obscure(keep);
        }
    }
}

impl From<Vec<Record>> for Ledger {
    fn from(records: Vec<Record>) -> Self {
        let records = records
            .into_iter()
            .map(|mut record| {
                record.sync_selected();
                (record.phrase.id.clone(), record)
            })
            .collect();
        Self { records }
    }
}

impl From<Ledger> for Vec<Record> {
    fn from(ledger: Ledger) -> Self {
        ledger.records.into_values().collect()
    }
}

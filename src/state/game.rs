use std::{collections::HashMap, time::SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::{
        BoardEntity, GameEntity, GameListItemEntity, MessageEntity, PhraseEntity, PlayerEntity,
        RecordEntity,
    },
    state::{
        audit::{Report, Reports},
        board::{BingoTransition, Board, SeedSource},
        ledger::{ConfigurationError, Ledger, Record},
        message::{Message, Operation, Recipient},
        phrase::{Cell, Column, Phrase},
        player::{Player, Players},
    },
};

/// Aggregate for one play session: the master ledger, every board and the message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name chosen by the creator.
    pub name: String,
    /// Inactive games are kept for history but no longer listed.
    pub active: bool,
    /// Creation time.
    pub created_at: SystemTime,
    /// Everyone who got a board, in arrival order.
    pub players: Players,
    /// Subset of players allowed to manage the game.
    pub admins: Players,
    /// Phrase ledger of the game.
    pub ledger: Ledger,
    /// Boards keyed by identifier.
    #[serde(default)]
    pub boards: HashMap<Uuid, Board>,
    /// Message log, oldest first.
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Listing entry for a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Whether the game still accepts play.
    pub active: bool,
    /// Creation time.
    pub created_at: SystemTime,
    /// Number of players with a board.
    pub player_count: usize,
}

impl Game {
    /// Start a game owned by `creator`, who becomes both its first admin and player.
    pub fn new(
        name: impl Into<String>,
        creator: Player,
        phrases: Vec<Phrase>,
        board_size: usize,
    ) -> Result<Self, ConfigurationError> {
        let ledger = Ledger::load(phrases, board_size)?;
        let mut players = Players::new();
        players.add(creator.clone());
        let mut admins = Players::new();
        admins.add(creator);

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            active: true,
            created_at: SystemTime::now(),
            players,
            admins,
            ledger,
            boards: HashMap::new(),
            messages: Vec::new(),
        })
    }

    /// Board owned by `email`.
    pub fn board_for_player(&self, email: &str) -> Option<&Board> {
        self.boards.values().find(|board| board.player.email == email)
    }

    /// Return the player's board, generating one from the ledger on first access.
    ///
    /// The boolean is `true` when the board was created by this call.
    pub fn new_board(
        &mut self,
        player: Player,
        seed: &dyn SeedSource,
        free_square: Option<&str>,
    ) -> (&Board, bool) {
        if let Some(id) = self.board_for_player(&player.email).map(|board| board.id) {
            return (&self.boards[&id], false);
        }

        let board = Board::generate(
            self.id,
            player.clone(),
            &self.ledger.phrases(),
            seed,
            free_square,
        );
        self.players.add(player);
        let id = board.id;
        self.boards.insert(id, board);
        (&self.boards[&id], true)
    }

    /// Insert or replace a board loaded from elsewhere, registering its player.
    pub fn upsert_board(&mut self, board: Board) {
        self.players.add(board.player.clone());
        self.boards.insert(board.id, board);
    }

    /// Remove a board and withdraw its player's ledger selections.
    ///
    /// Players and admins are left untouched so the player can rejoin.
    pub fn delete_board(&mut self, board_id: Uuid) -> Option<Board> {
        let board = self.boards.remove(&board_id)?;
        self.ledger.remove_player(&board.player.email);
        Some(board)
    }

    /// Toggle the player's selection of a phrase on the ledger.
    pub fn select(&mut self, phrase_id: &str, player: &Player) -> Option<Record> {
        self.ledger.toggle_selection(phrase_id, player).cloned()
    }

    /// Set the player's selection of a phrase on the ledger.
    pub fn record_selection(
        &mut self,
        phrase_id: &str,
        player: &Player,
        selected: bool,
    ) -> Option<Record> {
        self.ledger
            .set_selection(phrase_id, player, selected)
            .cloned()
    }

    /// Corroboration report for every selected phrase on `board`, free square excluded.
    pub fn check_board(&self, board: &Board) -> Reports {
        let total = self.boards.len();
        let winning = board.winning_phrase_ids();

        let reports = board
            .by_display_order()
            .into_iter()
            .filter(|phrase| phrase.selected && !board.is_free_phrase(&phrase.id))
            .map(|phrase| Report {
                phrase: phrase.clone(),
                count: self
                    .ledger
                    .find_record(&phrase.id)
                    .map(Record::count)
                    .unwrap_or_default(),
                total,
                on_winning_line: winning.contains(&phrase.id),
            })
            .collect();

        Reports::new(reports)
    }

    /// Apply an edited phrase to the ledger and every board.
    ///
    /// The edited square is reset everywhere (free squares excepted). Boards whose
    /// declared bingo relied on it are re-evaluated; the identifiers of boards that
    /// lost their bingo are returned. `None` means the phrase is not in this game.
    pub fn update_phrase(&mut self, phrase: &Phrase) -> Option<Vec<Uuid>> {
        if !self.ledger.reset_phrase(phrase) {
            return None;
        }

        let mut rescinded = Vec::new();
        for board in self.boards.values_mut() {
            let on_winning_line =
                board.bingo_declared && board.winning_phrase_ids().contains(&phrase.id);

            board.apply_phrase_edit(phrase);
            if !board.is_free_phrase(&phrase.id) {
                board.set_selection(&phrase.id, false);
            }

            if on_winning_line && board.refresh_bingo() == BingoTransition::Lost {
                rescinded.push(board.id);
            }
        }

        Some(rescinded)
    }

    /// Mask every e-mail except `keep`.
    pub fn obscure(&mut self, keep: &str) {
        self.players.obscure(keep);
        self.admins.obscure(keep);
        self.ledger.obscure(keep);
        for board in self.boards.values_mut() {
            board.obscure(keep);
        }
    }

    /// Whether `player` may manage this game.
    pub fn is_admin(&self, player: &Player) -> bool {
        self.admins.contains(&player.email)
    }

    /// Grant game admin rights, adding the player to the game if needed.
    pub fn add_admin(&mut self, player: Player) -> bool {
        self.players.add(player.clone());
        self.admins.add(player)
    }

    /// Revoke game admin rights.
    pub fn remove_admin(&mut self, email: &str) -> bool {
        self.admins.remove(email)
    }

    /// Append messages to the log.
    pub fn post(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// Messages addressed to `player`.
    pub fn messages_for(&self, player: &Player) -> Vec<&Message> {
        let is_admin = self.is_admin(player);
        self.messages
            .iter()
            .filter(|message| message.is_for(&player.email, is_admin))
            .collect()
    }

    /// Listing entry for this game.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id,
            name: self.name.clone(),
            active: self.active,
            created_at: self.created_at,
            player_count: self.players.len(),
        }
    }
}

impl From<PhraseEntity> for Phrase {
    fn from(value: PhraseEntity) -> Self {
        let cell = match (value.column.as_deref().and_then(Column::from_letter), value.row) {
            (Some(column), Some(row)) => Some(Cell::new(column, row)),
            _ => None,
        };
        Self {
            id: value.id,
            text: value.text,
            selected: value.selected,
            cell,
            display_order: value.display_order,
        }
    }
}

impl From<Phrase> for PhraseEntity {
    fn from(value: Phrase) -> Self {
        Self {
            id: value.id,
            text: value.text,
            selected: value.selected,
            column: value.cell.map(|cell| cell.column.letter().to_owned()),
            row: value.cell.map(|cell| cell.row),
            display_order: value.display_order,
        }
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            name: value.name,
            email: value.email,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            name: value.name,
            email: value.email,
        }
    }
}

impl From<RecordEntity> for Record {
    fn from(value: RecordEntity) -> Self {
        Self {
            phrase: value.phrase.into(),
            players: value.players.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Record> for RecordEntity {
    fn from(value: Record) -> Self {
        Self {
            phrase: value.phrase.into(),
            players: value.players.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<BoardEntity> for Board {
    fn from(value: BoardEntity) -> Self {
        Self {
            id: value.id,
            game_id: value.game_id,
            player: value.player.into(),
            bingo_declared: value.bingo_declared,
            free_phrase: value.free_phrase,
            phrases: value
                .phrases
                .into_iter()
                .map(|phrase| (phrase.id.clone(), phrase.into()))
                .collect(),
        }
    }
}

impl From<Board> for BoardEntity {
    fn from(value: Board) -> Self {
        let mut phrases: Vec<PhraseEntity> =
            value.phrases.into_values().map(Into::into).collect();
        phrases.sort_by_key(|phrase| phrase.display_order);
        Self {
            id: value.id,
            game_id: value.game_id,
            player: value.player.into(),
            bingo_declared: value.bingo_declared,
            free_phrase: value.free_phrase,
            phrases,
        }
    }
}

impl From<MessageEntity> for Message {
    fn from(value: MessageEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            audience: value.audience.into_iter().map(Recipient::from).collect(),
            bingo: value.bingo,
            operation: value
                .operation
                .as_deref()
                .filter(|operation| operation.eq_ignore_ascii_case("reset"))
                .map(|_| Operation::Reset),
            created_at: value.created_at,
            received_by: value.received_by.into_iter().collect(),
        }
    }
}

impl From<(Uuid, Message)> for MessageEntity {
    fn from((game_id, value): (Uuid, Message)) -> Self {
        Self {
            id: value.id,
            game_id,
            text: value.text,
            audience: value.audience.into_iter().map(String::from).collect(),
            bingo: value.bingo,
            operation: value.operation.map(|Operation::Reset| "reset".to_owned()),
            created_at: value.created_at,
            received_by: value.received_by.into_iter().collect(),
        }
    }
}

impl From<(GameEntity, Vec<BoardEntity>, Vec<MessageEntity>)> for Game {
    fn from(
        (game, boards, messages): (GameEntity, Vec<BoardEntity>, Vec<MessageEntity>),
    ) -> Self {
        let records: Vec<Record> = game.records.into_iter().map(Into::into).collect();
        let mut messages: Vec<Message> = messages.into_iter().map(Into::into).collect();
        messages.sort_by_key(|message| message.created_at);

        Self {
            id: game.id,
            name: game.name,
            active: game.active,
            created_at: game.created_at,
            players: game.players.into_iter().map(Into::into).collect(),
            admins: game.admins.into_iter().map(Into::into).collect(),
            ledger: Ledger::from(records),
            boards: boards
                .into_iter()
                .map(|board| (board.id, board.into()))
                .collect(),
            messages,
        }
    }
}

impl From<Game> for GameEntity {
    fn from(value: Game) -> Self {
        let records: Vec<Record> = value.ledger.into();
        Self {
            id: value.id,
            name: value.name,
            active: value.active,
            created_at: value.created_at,
            players: value.players.into_iter().map(Into::into).collect(),
            admins: value.admins.into_iter().map(Into::into).collect(),
            records: records.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<GameListItemEntity> for GameSummary {
    fn from(value: GameListItemEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            active: value.active,
            created_at: value.created_at,
            player_count: value.player_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        board::FixedSeed,
        phrase::BOARD_SIZE,
        player::OBSCURED_EMAIL,
    };

    fn phrases() -> Vec<Phrase> {
        (1..=BOARD_SIZE)
            .map(|n| Phrase::new(n.to_string(), format!("phrase {n}")))
            .collect()
    }

    fn game() -> Game {
        Game::new("Standup", Player::new("A", "a@x.com"), phrases(), BOARD_SIZE).unwrap()
    }

    fn board_id(game: &mut Game, player: &Player, seed: u64) -> Uuid {
        game.new_board(player.clone(), &FixedSeed(seed), None).0.id
    }

    fn select_row(game: &mut Game, board_id: Uuid, row: u8) -> Vec<String> {
        let board = game.boards.get_mut(&board_id).unwrap();
        let player = board.player.clone();
        let ids: Vec<String> = board
            .phrases
            .values()
            .filter(|phrase| phrase.cell.is_some_and(|cell| cell.row == row))
            .map(|phrase| phrase.id.clone())
            .collect();
        for id in &ids {
            board.set_selection(id, true);
        }
        board.refresh_bingo();
        for id in &ids {
            game.record_selection(id, &player, true);
        }
        ids
    }

    #[test]
    fn creator_is_admin_and_player() {
        let mut game = game();
        let a = Player::new("A", "a@x.com");
        let b = Player::new("B", "b@x.com");

        assert!(game.is_admin(&a));
        assert!(!game.is_admin(&b));
        assert!(game.players.contains("a@x.com"));

        game.add_admin(b.clone());
        assert!(game.is_admin(&b));
        assert!(game.remove_admin("b@x.com"));
        assert!(!game.is_admin(&b));
    }

    #[test]
    fn new_board_returns_existing_board_for_same_player() {
        let mut game = game();
        let p = Player::new("P", "p@x.com");

        let (first, created) = game.new_board(p.clone(), &FixedSeed(1), None);
        let first = first.id;
        assert!(created);

        let (second, created) = game.new_board(p, &FixedSeed(2), None);
        assert!(!created);
        assert_eq!(second.id, first);
        assert_eq!(game.boards.len(), 1);
        assert!(game.players.contains("p@x.com"));
    }

    #[test]
    fn delete_board_keeps_players_and_strips_selections() {
        let mut game = game();
        let p = Player::new("P", "p@x.com");
        let id = board_id(&mut game, &p, 3);
        game.select("5", &p);

        let removed = game.delete_board(id).unwrap();
        assert_eq!(removed.player, p);
        assert!(game.boards.is_empty());
        assert!(game.players.contains("p@x.com"));
        assert!(!game.ledger.find_record("5").unwrap().phrase.selected);
        assert!(game.delete_board(id).is_none());
    }

    #[test]
    fn select_twice_leaves_record_empty() {
        let mut game = game();
        let p = Player::new("P", "p@x.com");
        game.select("1", &p);
        let record = game.select("1", &p).unwrap();
        assert!(!record.phrase.selected);
        assert!(record.players.is_empty());
    }

    #[test]
    fn lone_bingo_is_dubious_until_corroborated() {
        let mut game = game();
        let p = Player::new("P", "p@x.com");
        let q = Player::new("Q", "q@x.com");
        let pid = board_id(&mut game, &p, 5);
        board_id(&mut game, &q, 6);

        let row = select_row(&mut game, pid, 0);
        let board = game.boards[&pid].clone();
        let reports = game.check_board(&board);
        assert_eq!(reports.len(), 5);
        assert!(reports.iter().all(|report| report.total == 2));
        assert!(reports.is_dubious());

        for id in &row {
            game.record_selection(id, &q, true);
        }
        assert!(!game.check_board(&board).is_dubious());
    }

    #[test]
    fn editing_a_winning_phrase_rescinds_bingo() {
        let mut game = game();
        let p = Player::new("P", "p@x.com");
        let pid = board_id(&mut game, &p, 8);
        let row = select_row(&mut game, pid, 2);
        assert!(game.boards[&pid].bingo_declared);

        let edited = Phrase::new(row[0].clone(), "reworded");
        let rescinded = game.update_phrase(&edited).unwrap();

        assert_eq!(rescinded, vec![pid]);
        let board = &game.boards[&pid];
        assert!(!board.bingo_declared);
        assert_eq!(board.phrases[&row[0]].text, "reworded");
        assert!(!board.phrases[&row[0]].selected);
        assert!(game.ledger.find_record(&row[0]).unwrap().players.is_empty());
    }

    #[test]
    fn editing_an_unrelated_phrase_keeps_bingo() {
        let mut game = game();
        let p = Player::new("P", "p@x.com");
        let pid = board_id(&mut game, &p, 8);
        let row = select_row(&mut game, pid, 2);
        let other = (1..=BOARD_SIZE)
            .map(|n| n.to_string())
            .find(|id| !row.contains(id))
            .unwrap();

        let rescinded = game.update_phrase(&Phrase::new(other, "new")).unwrap();
        assert!(rescinded.is_empty());
        assert!(game.boards[&pid].bingo_declared);
        assert!(game.update_phrase(&Phrase::new("missing", "x")).is_none());
    }

    #[test]
    fn obscure_masks_everyone_but_the_viewer() {
        let mut game = game();
        let b = Player::new("B", "b@x.com");
        board_id(&mut game, &b, 4);
        game.select("2", &b);

        game.obscure("a@x.com");

        let emails: Vec<_> = game.players.iter().map(|p| p.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", OBSCURED_EMAIL]);
        assert_eq!(game.players.len(), 2);
        assert!(game.boards.values().all(|board| board.player.email == OBSCURED_EMAIL));
        let record = game.ledger.find_record("2").unwrap();
        assert_eq!(record.count(), 1);
        assert!(record.players.contains(OBSCURED_EMAIL));
    }

    #[test]
    fn messages_are_filtered_by_audience() {
        let mut game = game();
        let a = Player::new("A", "a@x.com");
        let p = Player::new("P", "p@x.com");
        game.post([
            Message::new("everyone").to(Recipient::All),
            Message::new("admins").to(Recipient::Admin),
            Message::new("p only").to_player("p@x.com"),
        ]);

        let texts = |player: &Player| {
            game.messages_for(player)
                .into_iter()
                .map(|m| m.text.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(texts(&a), vec!["everyone", "admins"]);
        assert_eq!(texts(&p), vec!["everyone", "p only"]);
    }

    #[test]
    fn entity_conversion_preserves_board_layout() {
        let mut game = game();
        let p = Player::new("P", "p@x.com");
        let pid = board_id(&mut game, &p, 12);
        let board = game.boards[&pid].clone();

        let entity = BoardEntity::from(board.clone());
        assert_eq!(entity.phrases[0].column.as_deref(), Some("B"));
        assert_eq!(Board::from(entity), board);
    }
}

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        board::PhraseSummary,
        format_system_time, parse_system_time,
        player::PlayerSummary,
        validation::{validate_not_blank, validate_timestamp},
    },
    state::{
        game::{Game, GameSummary},
        ledger::Record,
    },
};

/// Payload used to start a new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct NewGameRequest {
    /// Game name.
    #[validate(custom(function = "validate_not_blank"), length(max = 100))]
    pub name: String,
}

/// Paging parameters for game listings.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct GamesQuery {
    /// Maximum number of games; defaults to the configured page size.
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
    /// Only games created before this RFC 3339 timestamp.
    #[validate(custom(function = "validate_timestamp"))]
    pub before: Option<String>,
}

impl GamesQuery {
    /// Cursor as a timestamp, if one was given.
    pub fn before(&self) -> Option<SystemTime> {
        self.before.as_deref().and_then(parse_system_time)
    }
}

/// Listing entry for a game.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameListItem {
    /// Game identifier.
    pub id: Uuid,
    /// Game name.
    pub name: String,
    /// Whether the game is active.
    pub active: bool,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Number of players.
    pub player_count: usize,
}

impl From<GameSummary> for GameListItem {
    fn from(summary: GameSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            active: summary.active,
            created_at: format_system_time(summary.created_at),
            player_count: summary.player_count,
        }
    }
}

/// Ledger entry: a phrase and who selected it.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordSummary {
    /// Master phrase.
    pub phrase: PhraseSummary,
    /// Players who selected it.
    pub players: Vec<PlayerSummary>,
    /// Number of selectors.
    pub count: usize,
}

impl From<&Record> for RecordSummary {
    fn from(record: &Record) -> Self {
        Self {
            phrase: PhraseSummary::from(&record.phrase),
            players: record.players.iter().map(PlayerSummary::from).collect(),
            count: record.count(),
        }
    }
}

/// Full game snapshot.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameResponse {
    /// Game identifier.
    pub id: Uuid,
    /// Game name.
    pub name: String,
    /// Whether the game is active.
    pub active: bool,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// Players with a board.
    pub players: Vec<PlayerSummary>,
    /// Game admins.
    pub admins: Vec<PlayerSummary>,
    /// Phrase ledger.
    pub records: Vec<RecordSummary>,
    /// Number of boards.
    pub board_count: usize,
}

impl From<&Game> for GameResponse {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            name: game.name.clone(),
            active: game.active,
            created_at: format_system_time(game.created_at),
            players: game.players.iter().map(PlayerSummary::from).collect(),
            admins: game.admins.iter().map(PlayerSummary::from).collect(),
            records: game.ledger.records().map(RecordSummary::from).collect(),
            board_count: game.boards.len(),
        }
    }
}

/// Games removed by a purge.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurgeResponse {
    /// Identifiers of removed games.
    pub purged: Vec<Uuid>,
}

/// Number of entries dropped by a cache clear.
#[derive(Debug, Serialize, ToSchema)]
pub struct CacheClearResponse {
    /// Number of cache entries dropped.
    pub evicted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn games_query_parses_before() {
        let query = GamesQuery {
            limit: Some(10),
            before: Some("2024-05-01T12:00:00Z".into()),
        };
        assert!(query.validate().is_ok());
        assert!(query.before().is_some());
        assert!(GamesQuery::default().before().is_none());
    }

    #[test]
    fn games_query_bounds_limit() {
        let query = GamesQuery {
            limit: Some(0),
            before: None,
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn new_game_name_must_not_be_blank() {
        let request = NewGameRequest { name: "  ".into() };
        assert!(request.validate().is_err());
    }
}

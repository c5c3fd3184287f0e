use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{player::PlayerSummary, validation::validate_not_blank},
    state::{board::Board, phrase::Phrase},
};

/// Game a board request refers to, passed as `?g=`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GameQuery {
    /// Game identifier.
    pub g: Uuid,
}

/// One square of a board, or one phrase of a game ledger.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PhraseSummary {
    /// Phrase identifier.
    pub id: String,
    /// Phrase text.
    pub text: String,
    /// Whether the phrase is selected.
    pub selected: bool,
    /// Grid position such as `N2`, absent for ledger phrases.
    pub position: Option<String>,
    /// Position in ledger listings.
    pub display_order: usize,
}

impl From<&Phrase> for PhraseSummary {
    fn from(phrase: &Phrase) -> Self {
        Self {
            id: phrase.id.clone(),
            text: phrase.text.clone(),
            selected: phrase.selected,
            position: phrase.position(),
            display_order: phrase.display_order,
        }
    }
}

/// A player's board, squares in display order.
#[derive(Debug, Serialize, ToSchema)]
pub struct BoardResponse {
    /// Board identifier.
    pub id: Uuid,
    /// Game identifier.
    pub game_id: Uuid,
    /// Owner of the board.
    pub player: PlayerSummary,
    /// Whether the board holds a bingo.
    pub bingo: bool,
    /// Squares in grid order.
    pub phrases: Vec<PhraseSummary>,
}

impl From<&Board> for BoardResponse {
    fn from(board: &Board) -> Self {
        Self {
            id: board.id,
            game_id: board.game_id,
            player: PlayerSummary::from(&board.player),
            bingo: board.bingo_declared,
            phrases: board
                .by_display_order()
                .into_iter()
                .map(PhraseSummary::from)
                .collect(),
        }
    }
}

/// Selection of one square on a board.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RecordRequest {
    /// Board identifier.
    pub board: Uuid,
    /// Game identifier.
    pub game: Uuid,
    /// Phrase identifier.
    #[validate(custom(function = "validate_not_blank"))]
    pub phrase: String,
    /// New selection state.
    pub selected: bool,
}

/// New text for an existing phrase.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PhraseUpdateRequest {
    /// Phrase identifier.
    #[validate(custom(function = "validate_not_blank"))]
    pub id: String,
    /// Replacement text.
    #[validate(custom(function = "validate_not_blank"), length(max = 200))]
    pub text: String,
}

impl From<PhraseUpdateRequest> for Phrase {
    fn from(request: PhraseUpdateRequest) -> Self {
        Phrase::new(request.id, request.text.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{board::FixedSeed, player::Player};

    #[test]
    fn board_response_lists_squares_in_display_order() {
        let phrases: Vec<Phrase> = (0..25)
            .map(|i| Phrase::new(i.to_string(), format!("phrase {i}")))
            .collect();
        let board = Board::generate(
            Uuid::new_v4(),
            Player::new("Pat", "pat@x.com"),
            &phrases,
            &FixedSeed(3),
            None,
        );

        let response = BoardResponse::from(&board);
        assert_eq!(response.phrases.len(), 25);
        assert!(
            response
                .phrases
                .windows(2)
                .all(|pair| pair[0].display_order < pair[1].display_order)
        );
        assert_eq!(response.phrases[0].position.as_deref(), Some("B0"));
    }

    #[test]
    fn record_request_rejects_blank_phrase() {
        let request = RecordRequest {
            board: Uuid::new_v4(),
            game: Uuid::new_v4(),
            phrase: " ".into(),
            selected: true,
        };
        assert!(request.validate().is_err());
    }
}

mod common;

use bingo_back::{
    dao::game_store::GameStore,
    error::ServiceError,
    services::game_service,
    state::{board::Board, game::Game, message::Operation, phrase::Phrase},
};
use common::{alice, bob, carol, setup};
use uuid::Uuid;

/// Phrase identifiers of one board row, left to right.
fn row_ids(board: &Board, row: u8) -> Vec<String> {
    let mut cells: Vec<_> = board
        .phrases
        .values()
        .filter_map(|phrase| {
            let cell = phrase.cell?;
            (cell.row == row).then(|| (cell.column.index(), phrase.id.clone()))
        })
        .collect();
    cells.sort();
    cells.into_iter().map(|(_, id)| id).collect()
}

fn texts(game: &Game) -> Vec<&str> {
    game.messages.iter().map(|m| m.text.as_str()).collect()
}

#[tokio::test]
async fn new_game_seeds_phrase_pool_and_announces_start() {
    let (state, store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();

    assert_eq!(store.calls("load_phrases"), 1);
    assert_eq!(game.ledger.len(), 25);
    assert!(game.is_admin(&alice()));
    assert_eq!(texts(&game), vec!["Game has begun!"]);

    game_service::new_game(&state, "Retro", &alice()).await.unwrap();
    assert_eq!(store.calls("load_phrases"), 1);
}

#[tokio::test]
async fn board_is_created_once_per_player() {
    let (state, store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();

    let first = game_service::get_board_for_player(&state, &bob(), game.id).await.unwrap();
    let again = game_service::get_board_for_player(&state, &bob(), game.id).await.unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(first.phrases.len(), 25);
    assert_eq!(store.calls("save_board"), 1);

    let free = first.free_phrase.as_ref().unwrap();
    assert!(first.phrases[free].selected);
    assert_eq!(first.phrases[free].position().as_deref(), Some("N2"));

    let game = game_service::get_game(&state, game.id).await.unwrap();
    assert!(game.players.contains(&bob().email));
    let messages = texts(&game);
    assert!(messages.contains(&"<strong>Bob</strong> got a board and joined the game."));
    assert!(messages.contains(&"<strong>Bob</strong> rejoined the game."));
}

#[tokio::test]
async fn lone_bingo_is_flagged_dubious() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    let board = game_service::get_board_for_player(&state, &alice(), game.id).await.unwrap();

    let mut latest = board.clone();
    for id in row_ids(&board, 0) {
        latest = game_service::record_select(&state, board.id, game.id, &id, true)
            .await
            .unwrap();
    }
    assert!(latest.bingo_declared);

    let game = game_service::get_game(&state, game.id).await.unwrap();
    let messages = texts(&game);
    assert!(messages.contains(&"<strong>Alice</strong> just got <em><strong>BINGO</strong></em> on their board."));
    assert!(messages.contains(&"<strong>Alice</strong> might have just declared a dubious <em><strong>BINGO</strong></em> on their board."));
    let corroborations = messages
        .iter()
        .filter(|text| text.ends_with("of the other 0 players"))
        .count();
    assert_eq!(corroborations, 5);
}

#[tokio::test]
async fn corroborated_bingo_is_not_dubious() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    let alice_board = game_service::get_board_for_player(&state, &alice(), game.id).await.unwrap();
    let line = row_ids(&alice_board, 0);

    for player in [bob(), carol()] {
        let board = game_service::get_board_for_player(&state, &player, game.id).await.unwrap();
        for id in &line {
            game_service::record_select(&state, board.id, game.id, id, true)
                .await
                .unwrap();
        }
    }
    for id in &line {
        game_service::record_select(&state, alice_board.id, game.id, id, true)
            .await
            .unwrap();
    }

    let game = game_service::get_game(&state, game.id).await.unwrap();
    let messages = texts(&game);
    assert!(messages.iter().any(|text| text.starts_with("<strong>Alice</strong> just got")));
    assert!(!messages.iter().any(|text| text.starts_with("<strong>Alice</strong> might have")));
    assert_eq!(game.ledger.find_record(&line[0]).unwrap().count(), 3);
}

#[tokio::test]
async fn unselecting_clears_bingo_and_ledger() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    let board = game_service::get_board_for_player(&state, &alice(), game.id).await.unwrap();
    let line = row_ids(&board, 0);
    for id in &line {
        game_service::record_select(&state, board.id, game.id, id, true)
            .await
            .unwrap();
    }

    let board = game_service::record_select(&state, board.id, game.id, &line[2], false)
        .await
        .unwrap();
    assert!(!board.bingo_declared);
    assert!(!board.phrases[&line[2]].selected);

    let game = game_service::get_game(&state, game.id).await.unwrap();
    assert_eq!(game.ledger.find_record(&line[2]).unwrap().count(), 0);
    assert_eq!(game.ledger.find_record(&line[1]).unwrap().count(), 1);
}

#[tokio::test]
async fn repeated_or_unknown_selection_writes_nothing() {
    let (state, store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    let board = game_service::get_board_for_player(&state, &alice(), game.id).await.unwrap();
    let id = row_ids(&board, 0).remove(0);

    game_service::record_select(&state, board.id, game.id, &id, true)
        .await
        .unwrap();
    assert_eq!(store.calls("save_selection"), 1);

    game_service::record_select(&state, board.id, game.id, &id, true)
        .await
        .unwrap();
    let unchanged = game_service::record_select(&state, board.id, game.id, "nope", true)
        .await
        .unwrap();
    assert_eq!(store.calls("save_selection"), 1);
    assert!(unchanged.phrases[&id].selected);
}

#[tokio::test]
async fn editing_a_winning_phrase_rescinds_bingo() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    let board = game_service::get_board_for_player(&state, &bob(), game.id).await.unwrap();
    let line = row_ids(&board, 0);
    for id in &line {
        game_service::record_select(&state, board.id, game.id, id, true)
            .await
            .unwrap();
    }

    let edited = Phrase::new(line[0].clone(), "Someone says synergy");
    let game = game_service::update_game_phrases(&state, game.id, edited)
        .await
        .unwrap();

    let board = &game.boards[&board.id];
    assert!(!board.bingo_declared);
    assert!(!board.phrases[&line[0]].selected);
    assert_eq!(board.phrases[&line[0]].text, "Someone says synergy");

    let record = game.ledger.find_record(&line[0]).unwrap();
    assert_eq!(record.count(), 0);
    assert_eq!(record.phrase.text, "Someone says synergy");

    let messages = texts(&game);
    assert!(messages.contains(&"A square has been changed and reset for all players. "));
    assert!(messages.iter().any(|text| text.contains("rescinded your")));
    assert!(messages.contains(&"<strong>Bob</strong> just lost their <em><strong>BINGO</strong></em>"));

    let stored = game_service::get_board(&state, board.id, game.id).await.unwrap();
    assert!(!stored.bingo_declared);
}

#[tokio::test]
async fn editing_an_unknown_phrase_is_not_found() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    let result =
        game_service::update_game_phrases(&state, game.id, Phrase::new("999", "Nope")).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn deleting_a_board_resets_the_player() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    let board = game_service::get_board_for_player(&state, &bob(), game.id).await.unwrap();
    let id = row_ids(&board, 1).remove(0);
    game_service::record_select(&state, board.id, game.id, &id, true)
        .await
        .unwrap();

    game_service::delete_board(&state, board.id, game.id).await.unwrap();

    let game = game_service::get_game(&state, game.id).await.unwrap();
    assert!(game.boards.is_empty());
    assert_eq!(game.ledger.find_record(&id).unwrap().count(), 0);
    let reset = game.messages.last().unwrap();
    assert_eq!(reset.operation, Some(Operation::Reset));
    assert!(reset.is_for(&bob().email, false));

    let fresh = game_service::get_board_for_player(&state, &bob(), game.id).await.unwrap();
    assert_ne!(fresh.id, board.id);
    assert!(!fresh.phrases[&id].selected);
}

#[tokio::test]
async fn inactive_game_deals_no_new_boards() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    let board = game_service::get_board_for_player(&state, &alice(), game.id).await.unwrap();

    game_service::deactivate_game(&state, game.id).await.unwrap();

    let result = game_service::get_board_for_player(&state, &bob(), game.id).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    let rejoined = game_service::get_board_for_player(&state, &alice(), game.id).await.unwrap();
    assert_eq!(rejoined.id, board.id);

    let id = row_ids(&board, 0).remove(0);
    let result = game_service::record_select(&state, board.id, game.id, &id, true).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn acknowledged_messages_are_marked_received() {
    let (state, store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    game_service::get_board_for_player(&state, &bob(), game.id).await.unwrap();

    let messages = game_service::list_messages(&state, game.id, &bob()).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.is_pending_for(&bob().email)));

    let acked = game_service::acknowledge_message(&state, game.id, messages[0].id, &bob())
        .await
        .unwrap();
    assert!(!acked.is_pending_for(&bob().email));
    assert_eq!(store.calls("acknowledge_message"), 1);

    game_service::acknowledge_message(&state, game.id, messages[0].id, &bob())
        .await
        .unwrap();
    assert_eq!(store.calls("acknowledge_message"), 1);

    let stored = store.inner.list_messages(game.id).await.unwrap();
    assert!(stored[0].received_by.contains(&bob().email));
}

#[tokio::test]
async fn viewers_see_masked_emails() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    game_service::get_board_for_player(&state, &bob(), game.id).await.unwrap();

    let seen_by_bob = game_service::get_game_for_viewer(&state, game.id, &bob(), false)
        .await
        .unwrap();
    assert!(seen_by_bob.players.contains(&bob().email));
    assert!(!seen_by_bob.players.contains(&alice().email));

    let seen_by_alice = game_service::get_game_for_viewer(&state, game.id, &alice(), false)
        .await
        .unwrap();
    assert!(seen_by_alice.players.contains(&bob().email));
}

#[tokio::test]
async fn rejoining_with_a_bingo_re_reports_it_to_the_player() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    let board = game_service::get_board_for_player(&state, &alice(), game.id).await.unwrap();
    for id in row_ids(&board, 0) {
        game_service::record_select(&state, board.id, game.id, &id, true)
            .await
            .unwrap();
    }
    let before = game_service::get_game(&state, game.id).await.unwrap().messages.len();

    let again = game_service::get_board_for_player(&state, &alice(), game.id).await.unwrap();
    assert!(again.bingo_declared);

    let game = game_service::get_game(&state, game.id).await.unwrap();
    let fresh = &game.messages[before..];
    assert_eq!(fresh[0].text, "<strong>Alice</strong> rejoined the game.");
    let held = fresh
        .iter()
        .find(|m| m.text == "<strong>You</strong> already had <em><strong>BINGO</strong></em> on your board.")
        .unwrap();
    assert!(held.bingo);
    assert!(held.is_for(&alice().email, false));
    assert!(!held.is_for(&bob().email, false));
    assert!(fresh.iter().any(|m| m.text.contains("redeclared a dubious")));
}

#[tokio::test]
async fn unknown_games_leave_no_gate_behind() {
    let (state, _store) = setup().await;
    for _ in 0..50 {
        let err = game_service::get_board_for_player(&state, &bob(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
    assert_eq!(state.gate_count(), 0);

    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    game_service::get_board_for_player(&state, &bob(), game.id).await.unwrap();
    assert_eq!(state.gate_count(), 1);
}

mod common;

use bingo_back::{
    config::AppConfig,
    error::ServiceError,
    services::{admin_service, game_service},
};
use common::{alice, bob, carol, setup, setup_with};

#[tokio::test]
async fn empty_admin_list_is_seeded_with_placeholder() {
    let (state, store) = setup().await;
    let admins = admin_service::get_admins(&state).await.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].email, admin_service::PLACEHOLDER_ADMIN);
    assert!(admin_service::is_admin(&state, admin_service::PLACEHOLDER_ADMIN).await.unwrap());

    admin_service::get_admins(&state).await.unwrap();
    assert_eq!(store.calls("add_admin"), 1);
}

#[tokio::test]
async fn global_admins_can_be_added_and_removed() {
    let (state, _store) = setup().await;
    admin_service::add_admin(&state, alice()).await.unwrap();
    assert!(admin_service::is_admin(&state, &alice().email).await.unwrap());
    assert!(admin_service::require_global_admin(&state, &alice()).await.is_ok());
    assert!(matches!(
        admin_service::require_global_admin(&state, &bob()).await,
        Err(ServiceError::Unauthorized(_))
    ));

    assert!(admin_service::delete_admin(&state, &alice().email).await.unwrap());
    assert!(!admin_service::delete_admin(&state, &alice().email).await.unwrap());
    assert!(!admin_service::is_admin(&state, &alice().email).await.unwrap());
}

#[tokio::test]
async fn game_admin_rights_follow_membership() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();

    assert!(admin_service::require_game_admin(&state, game.id, &alice()).await.is_ok());
    assert!(matches!(
        admin_service::require_game_admin(&state, game.id, &bob()).await,
        Err(ServiceError::Unauthorized(_))
    ));

    admin_service::add_admin(&state, carol()).await.unwrap();
    assert!(admin_service::require_game_admin(&state, game.id, &carol()).await.is_ok());

    let game = admin_service::add_game_admin(&state, game.id, bob()).await.unwrap();
    assert!(game.is_admin(&bob()));
    assert!(game.players.contains(&bob().email));
    assert!(admin_service::require_game_admin(&state, game.id, &bob()).await.is_ok());

    let bob_games = game_service::get_games_for_key(&state, &bob().email, None, None)
        .await
        .unwrap();
    assert_eq!(bob_games.len(), 1);
}

#[tokio::test]
async fn last_game_admin_cannot_be_removed() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();

    let result = admin_service::remove_game_admin(&state, game.id, &alice().email).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    let result = admin_service::remove_game_admin(&state, game.id, &bob().email).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    admin_service::add_game_admin(&state, game.id, bob()).await.unwrap();
    let game = admin_service::remove_game_admin(&state, game.id, &alice().email)
        .await
        .unwrap();
    assert!(!game.is_admin(&alice()));
    assert!(game.is_admin(&bob()));

    admin_service::clear_cache(&state);
    let reloaded = game_service::get_game(&state, game.id).await.unwrap();
    assert!(!reloaded.is_admin(&alice()));
}

#[tokio::test]
async fn purge_removes_games_past_retention() {
    let (state, _store) = setup_with(AppConfig::default().with_purge_after_days(0)).await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();
    game_service::get_board_for_player(&state, &bob(), game.id).await.unwrap();

    let purged = admin_service::purge_old_games(&state).await.unwrap();
    assert_eq!(purged, vec![game.id]);
    assert!(matches!(
        game_service::get_game(&state, game.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn purge_keeps_recent_games() {
    let (state, _store) = setup().await;
    let game = game_service::new_game(&state, "Standup", &alice()).await.unwrap();

    assert!(admin_service::purge_old_games(&state).await.unwrap().is_empty());
    assert!(game_service::get_game(&state, game.id).await.is_ok());
}

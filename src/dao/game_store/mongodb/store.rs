use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, Document, doc},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        ADMIN_COLLECTION, BOARD_COLLECTION, GAME_COLLECTION, MESSAGE_COLLECTION,
        MongoAdminDocument, MongoBoardDocument, MongoGameDocument, MongoMessageDocument,
        MongoPhraseDocument, PHRASE_COLLECTION, doc_id, player_doc,
    },
};
use crate::dao::{
    game_store::GameStore,
    models::{
        BoardEntity, GameEntity, GameListItemEntity, MessageEntity, PhraseEntity, PlayerEntity,
    },
    storage::{StorageError, StorageResult},
};

/// MongoDB-backed [`GameStore`]. Games, boards, messages, phrases and admins
/// each live in their own collection.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn index(keys: Document, name: &str, unique: bool) -> mongodb::IndexModel {
    mongodb::IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(Some(name.to_owned()))
                .unique(Some(unique))
                .build(),
        )
        .build()
}

fn active_before(before: SystemTime) -> Document {
    doc! {
        "active": true,
        "created_at": { "$lt": DateTime::from_system_time(before) },
    }
}

/// Array filter for ledger records whose selector set is empty, optionally
/// narrowed to one phrase.
fn emptied_records(phrase_id: Option<&str>) -> Document {
    let mut filter = doc! {"rec.players": {"$size": 0}};
    if let Some(phrase_id) = phrase_id {
        filter.insert("rec.phrase.id", phrase_id);
    }
    filter
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let indexes = [
            (
                GAME_COLLECTION,
                "active,created_at",
                index(doc! {"active": 1, "created_at": -1}, "game_listing_idx", false),
            ),
            (
                GAME_COLLECTION,
                "players.email",
                index(doc! {"players.email": 1}, "game_player_idx", false),
            ),
            (
                BOARD_COLLECTION,
                "game_id,player.email",
                index(
                    doc! {"game_id": 1, "player.email": 1},
                    "board_player_idx",
                    true,
                ),
            ),
            (
                MESSAGE_COLLECTION,
                "game_id,created_at",
                index(doc! {"game_id": 1, "created_at": 1}, "message_game_idx", false),
            ),
        ];

        let database = self.database().await;
        for (collection, keys, model) in indexes {
            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: keys,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync + Serialize + DeserializeOwned,
    {
        self.database().await.collection::<T>(name)
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.collection(GAME_COLLECTION).await
    }

    async fn boards(&self) -> Collection<MongoBoardDocument> {
        self.collection(BOARD_COLLECTION).await
    }

    async fn messages(&self) -> Collection<MongoMessageDocument> {
        self.collection(MESSAGE_COLLECTION).await
    }

    async fn phrases(&self) -> Collection<MongoPhraseDocument> {
        self.collection(PHRASE_COLLECTION).await
    }

    async fn admins(&self) -> Collection<MongoAdminDocument> {
        self.collection(ADMIN_COLLECTION).await
    }

    async fn get_phrases(&self) -> MongoResult<Vec<PhraseEntity>> {
        let documents: Vec<MongoPhraseDocument> = self
            .phrases()
            .await
            .find(doc! {})
            .sort(doc! {"_id": 1})
            .await
            .map_err(MongoDaoError::query("list phrases", PHRASE_COLLECTION))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query("list phrases", PHRASE_COLLECTION))?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_phrase(&self, phrase: PhraseEntity) -> MongoResult<()> {
        let filter = doc_id(&phrase.id);
        let document: MongoPhraseDocument = phrase.into();
        let collection = self.phrases().await;
        collection
            .replace_one(filter, &document)
            .upsert(true)
            .await
            .map_err(MongoDaoError::query("save phrase", PHRASE_COLLECTION))?;
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        self.games()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(MongoDaoError::query("load game", GAME_COLLECTION))?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_games(&self, filter: Document, limit: usize) -> MongoResult<Vec<GameListItemEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(filter)
            .sort(doc! {"created_at": -1})
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .map_err(MongoDaoError::query("list games", GAME_COLLECTION))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query("list games", GAME_COLLECTION))?;

        documents
            .into_iter()
            .map(|document| GameEntity::try_from(document).map(Into::into))
            .collect()
    }

    async fn games_created_before(&self, cutoff: SystemTime) -> MongoResult<Vec<Uuid>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(doc! {"created_at": { "$lt": DateTime::from_system_time(cutoff) }})
            .await
            .map_err(MongoDaoError::query("list old games", GAME_COLLECTION))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query("list old games", GAME_COLLECTION))?;

        documents
            .into_iter()
            .map(|document| GameEntity::try_from(document).map(|game| game.id))
            .collect()
    }

    async fn save_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        self.games()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(MongoDaoError::update_game(id, "save"))?;
        Ok(())
    }

    async fn update_game(&self, id: Uuid, update: Document, action: &'static str) -> MongoResult<()> {
        self.games()
            .await
            .update_one(doc_id(id), update)
            .await
            .map_err(MongoDaoError::update_game(id, action))?;
        Ok(())
    }

    async fn delete_game(&self, id: Uuid) -> MongoResult<bool> {
        let game_filter = doc! {"game_id": id.to_string()};
        self.boards()
            .await
            .delete_many(game_filter.clone())
            .await
            .map_err(MongoDaoError::query("delete boards", BOARD_COLLECTION))?;
        self.messages()
            .await
            .delete_many(game_filter)
            .await
            .map_err(MongoDaoError::query("delete messages", MESSAGE_COLLECTION))?;

        let result = self
            .games()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(MongoDaoError::update_game(id, "delete"))?;
        Ok(result.deleted_count > 0)
    }

    async fn list_boards(&self, game_id: Uuid) -> MongoResult<Vec<BoardEntity>> {
        let documents: Vec<MongoBoardDocument> = self
            .boards()
            .await
            .find(doc! {"game_id": game_id.to_string()})
            .await
            .map_err(MongoDaoError::query("list boards", BOARD_COLLECTION))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query("list boards", BOARD_COLLECTION))?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_board(&self, filter: Document) -> MongoResult<Option<BoardEntity>> {
        self.boards()
            .await
            .find_one(filter)
            .await
            .map_err(MongoDaoError::query("load board", BOARD_COLLECTION))?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn save_board(&self, board: BoardEntity) -> MongoResult<()> {
        let (id, game_id) = (board.id, board.game_id);
        let document: MongoBoardDocument = board.into();
        let player = player_doc(document.player());
        let registered = self
            .games()
            .await
            .update_one(doc_id(game_id), doc! {"$addToSet": {"players": player}})
            .await
            .map_err(MongoDaoError::update_game(game_id, "register board player"))?;
        if registered.matched_count == 0 {
            return Err(MongoDaoError::UnknownGame {
                board_id: id,
                game_id,
            });
        }

        self.boards()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(MongoDaoError::query("save board", BOARD_COLLECTION))?;
        Ok(())
    }

    async fn delete_board(&self, id: Uuid, game_id: Uuid) -> MongoResult<bool> {
        let filter = doc! {"_id": id.to_string(), "game_id": game_id.to_string()};
        let Some(board) = self.find_board(filter.clone()).await? else {
            return Ok(false);
        };

        self.boards()
            .await
            .delete_one(filter)
            .await
            .map_err(MongoDaoError::query("delete board", BOARD_COLLECTION))?;

        self.update_game(
            game_id,
            doc! {"$pull": {"records.$[].players": {"email": board.player.email.as_str()}}},
            "withdraw board selections",
        )
        .await?;
        self.clear_emptied_records(game_id, None, "withdraw board selections")
            .await?;
        Ok(true)
    }

    /// Unset `phrase.selected` on records left without selectors.
    async fn clear_emptied_records(
        &self,
        game_id: Uuid,
        phrase_id: Option<&str>,
        action: &'static str,
    ) -> MongoResult<()> {
        self.games()
            .await
            .update_one(
                doc_id(game_id),
                doc! {"$set": {"records.$[rec].phrase.selected": false}},
            )
            .array_filters(vec![emptied_records(phrase_id)])
            .await
            .map_err(MongoDaoError::update_game(game_id, action))?;
        Ok(())
    }

    async fn save_selection(
        &self,
        game_id: Uuid,
        phrase_id: String,
        player: PlayerEntity,
        selected: bool,
    ) -> MongoResult<()> {
        let update = if selected {
            doc! {
                "$addToSet": {"records.$[rec].players": player_doc(&player)},
                "$set": {"records.$[rec].phrase.selected": true},
            }
        } else {
            doc! {"$pull": {"records.$[rec].players": {"email": player.email.as_str()}}}
        };

        self.games()
            .await
            .update_one(doc_id(game_id), update)
            .array_filters(vec![doc! {"rec.phrase.id": phrase_id.as_str()}])
            .await
            .map_err(MongoDaoError::update_game(game_id, "save selection"))?;
        if !selected {
            self.clear_emptied_records(game_id, Some(&phrase_id), "save selection")
                .await?;
        }
        Ok(())
    }

    async fn update_phrase(&self, game_id: Uuid, phrase: PhraseEntity) -> MongoResult<()> {
        self.games()
            .await
            .update_one(
                doc_id(game_id),
                doc! {"$set": {
                    "records.$[rec].phrase.text": phrase.text.as_str(),
                    "records.$[rec].phrase.selected": false,
                    "records.$[rec].players": [],
                }},
            )
            .array_filters(vec![doc! {"rec.phrase.id": phrase.id.as_str()}])
            .await
            .map_err(MongoDaoError::update_game(game_id, "update phrase"))?;
        Ok(())
    }

    async fn list_messages(&self, game_id: Uuid) -> MongoResult<Vec<MessageEntity>> {
        let documents: Vec<MongoMessageDocument> = self
            .messages()
            .await
            .find(doc! {"game_id": game_id.to_string()})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(MongoDaoError::query("list messages", MESSAGE_COLLECTION))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query("list messages", MESSAGE_COLLECTION))?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn add_messages(&self, messages: Vec<MessageEntity>) -> MongoResult<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let documents: Vec<MongoMessageDocument> = messages.into_iter().map(Into::into).collect();
        self.messages()
            .await
            .insert_many(documents)
            .await
            .map_err(MongoDaoError::query("add messages", MESSAGE_COLLECTION))?;
        Ok(())
    }

    async fn acknowledge_message(
        &self,
        game_id: Uuid,
        message_id: Uuid,
        email: String,
    ) -> MongoResult<bool> {
        let result = self
            .messages()
            .await
            .update_one(
                doc! {"_id": message_id.to_string(), "game_id": game_id.to_string()},
                doc! {"$addToSet": {"received_by": email}},
            )
            .await
            .map_err(MongoDaoError::query("acknowledge message", MESSAGE_COLLECTION))?;
        Ok(result.matched_count > 0)
    }

    async fn add_admin(&self, admin: PlayerEntity) -> MongoResult<()> {
        let filter = doc_id(&admin.email);
        let document: MongoAdminDocument = admin.into();
        self.admins()
            .await
            .replace_one(filter, &document)
            .upsert(true)
            .await
            .map_err(MongoDaoError::query("add admin", ADMIN_COLLECTION))?;
        Ok(())
    }

    async fn delete_admin(&self, email: String) -> MongoResult<bool> {
        let result = self
            .admins()
            .await
            .delete_one(doc_id(email))
            .await
            .map_err(MongoDaoError::query("delete admin", ADMIN_COLLECTION))?;
        Ok(result.deleted_count > 0)
    }

    async fn list_admins(&self) -> MongoResult<Vec<PlayerEntity>> {
        let documents: Vec<MongoAdminDocument> = self
            .admins()
            .await
            .find(doc! {})
            .await
            .map_err(MongoDaoError::query("list admins", ADMIN_COLLECTION))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query("list admins", ADMIN_COLLECTION))?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn is_admin(&self, email: String) -> MongoResult<bool> {
        let count = self
            .admins()
            .await
            .count_documents(doc_id(email))
            .await
            .map_err(MongoDaoError::query("check admin", ADMIN_COLLECTION))?;
        Ok(count > 0)
    }
}

impl GameStore for MongoGameStore {
    fn get_phrases(&self) -> BoxFuture<'static, StorageResult<Vec<PhraseEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.get_phrases().await.map_err(Into::into) })
    }

    fn load_phrases(&self, phrases: Vec<PhraseEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for phrase in phrases {
                store.save_phrase(phrase).await?;
            }
            Ok::<(), StorageError>(())
        })
    }

    fn update_master_phrase(&self, phrase: PhraseEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_phrase(phrase).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn list_boards(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<BoardEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_boards(game_id).await.map_err(Into::into) })
    }

    fn list_messages(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MessageEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_messages(game_id).await.map_err(Into::into) })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn set_game_active(&self, id: Uuid, active: bool) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_game(id, doc! {"$set": {"active": active}}, "set active")
                .await
                .map_err(Into::into)
        })
    }

    fn set_game_admins(
        &self,
        id: Uuid,
        players: Vec<PlayerEntity>,
        admins: Vec<PlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let players: Vec<Document> = players.iter().map(player_doc).collect();
            let admins: Vec<Document> = admins.iter().map(player_doc).collect();
            store
                .update_game(
                    id,
                    doc! {
                        "$addToSet": {"players": {"$each": players}},
                        "$set": {"admins": admins},
                    },
                    "set admins",
                )
                .await
                .map_err(Into::into)
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn list_active_games(
        &self,
        limit: usize,
        before: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_games(active_before(before), limit)
                .await
                .map_err(Into::into)
        })
    }

    fn list_games_for_player(
        &self,
        email: String,
        limit: usize,
        before: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<GameListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut filter = active_before(before);
            filter.insert("players.email", email);
            store.list_games(filter, limit).await.map_err(Into::into)
        })
    }

    fn games_created_before(
        &self,
        cutoff: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<Uuid>>> {
        let store = self.clone();
        Box::pin(async move { store.games_created_before(cutoff).await.map_err(Into::into) })
    }

    fn find_board(
        &self,
        id: Uuid,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_board(doc! {"_id": id.to_string(), "game_id": game_id.to_string()})
                .await
                .map_err(Into::into)
        })
    }

    fn find_board_for_player(
        &self,
        game_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<BoardEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_board(doc! {"game_id": game_id.to_string(), "player.email": email})
                .await
                .map_err(Into::into)
        })
    }

    fn save_board(&self, board: BoardEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_board(board).await.map_err(Into::into) })
    }

    fn delete_board(&self, id: Uuid, game_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_board(id, game_id).await.map_err(Into::into) })
    }

    fn save_selection(
        &self,
        game_id: Uuid,
        phrase_id: String,
        player: PlayerEntity,
        selected: bool,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_selection(game_id, phrase_id, player, selected)
                .await
                .map_err(Into::into)
        })
    }

    fn update_phrase(
        &self,
        game_id: Uuid,
        phrase: PhraseEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_phrase(game_id, phrase).await.map_err(Into::into) })
    }

    fn add_messages(&self, messages: Vec<MessageEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.add_messages(messages).await.map_err(Into::into) })
    }

    fn acknowledge_message(
        &self,
        game_id: Uuid,
        message_id: Uuid,
        email: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .acknowledge_message(game_id, message_id, email)
                .await
                .map_err(Into::into)
        })
    }

    fn add_admin(&self, admin: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.add_admin(admin).await.map_err(Into::into) })
    }

    fn delete_admin(&self, email: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_admin(email).await.map_err(Into::into) })
    }

    fn list_admins(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_admins().await.map_err(Into::into) })
    }

    fn is_admin(&self, email: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.is_admin(email).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emptied_record_filter_targets_records_without_selectors() {
        assert_eq!(
            emptied_records(None),
            doc! {"rec.players": {"$size": 0}}
        );
        assert_eq!(
            emptied_records(Some("7")),
            doc! {"rec.players": {"$size": 0}, "rec.phrase.id": "7"}
        );
    }
}

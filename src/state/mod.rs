pub mod audit;
/// Player boards and bingo detection.
pub mod board;
/// Game aggregate.
pub mod game;
/// Per-game phrase ledger.
pub mod ledger;
/// Game message log.
pub mod message;
/// Phrases and grid cells.
pub mod phrase;
/// Player identity.
pub mod player;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, watch};
use uuid::Uuid;

use crate::{
    cache::Cache,
    config::AppConfig,
    dao::game_store::GameStore,
    error::ServiceError,
    state::board::{ClockSeed, SeedSource},
};

/// Shared handle passed to handlers and services.
pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, cache, configuration and seed source.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    cache: Cache,
    config: AppConfig,
    seed: Arc<dyn SeedSource>,
    degraded: watch::Sender<bool>,
    game_gates: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_seed(config, Arc::new(ClockSeed))
    }

    /// Same as [`AppState::new`] with an explicit board shuffle seed source.
    pub fn with_seed(config: AppConfig, seed: Arc<dyn SeedSource>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            game_store: RwLock::new(None),
            cache: Cache::new(config.cache_enabled()),
            config,
            seed,
            degraded: degraded_tx,
            game_gates: DashMap::new(),
        })
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current game store, or [`ServiceError::Degraded`] while storage is unhealthy.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        if self.is_degraded().await {
            return Err(ServiceError::Degraded);
        }
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Read-through cache.
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Seed source used when dealing new boards.
    pub fn seed(&self) -> &dyn SeedSource {
        self.seed.as_ref()
    }

    /// Serialize read-modify-write cycles on one game's cached snapshot.
    pub async fn lock_game(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let gate = self.game_gates.entry(id).or_default().clone();
        gate.lock_owned().await
    }

    /// Drop the gate of a deleted game.
    pub fn forget_game(&self, id: Uuid) {
        self.game_gates.remove(&id);
    }

    /// Drop the gate of `id` unless a request still holds or awaits it.
    pub fn release_idle_gate(&self, id: Uuid) {
        self.game_gates
            .remove_if(&id, |_, gate| Arc::strong_count(gate) == 1);
    }

    /// Number of games with a live gate.
    pub fn gate_count(&self) -> usize {
        self.game_gates.len()
    }
}

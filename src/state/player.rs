use serde::{Deserialize, Serialize};

/// Placeholder written over e-mail addresses hidden from the viewer.
pub const OBSCURED_EMAIL: &str = "xxxxxx@xxxxxx.xxx";

/// A human taking part in a game, identified by e-mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name.
    pub name: String,
    /// Identity of the player.
    pub email: String,
}

impl Player {
    /// Player with a name and e-mail.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Mask the e-mail unless it is `keep`.
    pub fn obscure(&mut self, keep: &str) {
        if self.email != keep {
            self.email = OBSCURED_EMAIL.to_owned();
        }
    }
}

/// Ordered set of players keyed by e-mail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Players(Vec<Player>);

impl Players {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the player unless someone with the same e-mail is present.
    pub fn add(&mut self, player: Player) -> bool {
        if self.contains(&player.email) {
            return false;
        }
        self.0.push(player);
        true
    }

    /// Remove the player with the given e-mail, returning whether one was present.
    pub fn remove(&mut self, email: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|player| player.email != email);
        before != self.0.len()
    }

    /// Whether the set holds `email`.
    pub fn contains(&self, email: &str) -> bool {
        self.0.iter().any(|player| player.email == email)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Players in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.0.iter()
    }

    /// Mask every e-mail except `keep`, keeping entries and their order.
    pub fn obscure(&mut self, keep: &str) {
        for player in &mut self.0 {
            player.obscure(keep);
        }
    }
}

impl FromIterator<Player> for Players {
    fn from_iter<T: IntoIterator<Item = Player>>(iter: T) -> Self {
        let mut players = Players::new();
        for player in iter {
            players.add(player);
        }
        players
    }
}

impl IntoIterator for Players {
    type Item = Player;
    type IntoIter = std::vec::IntoIter<Player>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

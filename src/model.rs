//! Entity model
//!
//! Users, the scores they own, and the joined read view handed back to
//! callers. The request-side shapes (`NewUser`, `UserUpdate`, `NewScore`)
//! live here as well so the service and the protocol agree on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Game name used when a new score does not name one
pub const DEFAULT_GAME: &str = "Meatball surgery";

/// Highest score the boundary accepts
pub const MAX_SCORE: u8 = 100;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            /// Accepts both the hyphenated and the 32 hex digit simple form
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

entity_id! {
    /// Identifier of a [`User`]
    UserId
}

entity_id! {
    /// Identifier of a [`ScoreEntry`]
    ScoreId
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    /// Build a user from creation fields under a freshly generated id
    pub fn create(new_user: NewUser) -> Self {
        Self {
            id: UserId::random(),
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
        }
    }

    /// Apply a partial update. Only fields that are present and non-empty
    /// overwrite the stored value.
    pub fn apply(&mut self, update: UserUpdate) {
        fn overwrite(slot: &mut String, value: Option<String>) {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }

        overwrite(&mut self.username, update.username);
        overwrite(&mut self.first_name, update.first_name);
        overwrite(&mut self.last_name, update.last_name);
        overwrite(&mut self.email, update.email);
    }
}

/// A stored score, referencing its owner by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: ScoreId,
    pub game: String,
    pub score: u8,
    pub user_id: UserId,
}

impl ScoreEntry {
    /// Build an entry from creation fields under a freshly generated id
    pub fn create(new_score: NewScore) -> Self {
        Self {
            id: ScoreId::random(),
            game: new_score.game,
            score: new_score.score,
            user_id: new_score.user_id,
        }
    }
}

/// Read view of a score with its owner embedded. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullScore {
    pub id: ScoreId,
    pub game: String,
    pub score: u8,
    pub user: User,
}

impl FullScore {
    /// Compose an entry with the current record of its owner
    pub fn join(entry: &ScoreEntry, user: User) -> Self {
        Self {
            id: entry.id,
            game: entry.game.clone(),
            score: entry.score,
            user,
        }
    }
}

/// Fields required to create a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Partial user update; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Fields required to record a score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScore {
    #[serde(default = "default_game")]
    pub game: String,
    pub score: u8,
    pub user_id: UserId,
}

fn default_game() -> String {
    DEFAULT_GAME.to_string()
}

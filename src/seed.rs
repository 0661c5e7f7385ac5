//! Demo snapshot generator

use rand::Rng;

use crate::model::{DEFAULT_GAME, MAX_SCORE, NewScore, NewUser, ScoreEntry, User};
use crate::store::Store;

/// Scores generated for every seeded user
pub const SCORES_PER_USER: usize = 5;

const USERS: [(&str, &str, &str, &str); 3] = [
    ("hawkeye", "Benjamin", "Pierce", "hawk@example.com"),
    ("trapper", "John", "McIntyre", "trap@example.com"),
    ("best_surgeon_burns", "Frank", "Burns", "frank@example.com"),
];

/// Build a store with three users holding five random scores each
pub fn generate() -> Store {
    let mut rng = rand::rng();
    let mut store = Store::new();

    for (username, first_name, last_name, email) in USERS {
        let user = User::create(NewUser {
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
        });

        for _ in 0..SCORES_PER_USER {
            let entry = ScoreEntry::create(NewScore {
                game: DEFAULT_GAME.to_string(),
                score: rng.random_range(0..=MAX_SCORE),
                user_id: user.id,
            });
            store.scores.insert(entry.id, entry);
        }
        store.users.insert(user.id, user);
    }

    store
}

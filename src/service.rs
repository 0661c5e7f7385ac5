//! Operation layer over the store
//!
//! Every operation, reads included, runs under one process-wide async
//! mutex, so a read never observes half of a write and every join sees
//! the latest committed user record. The guard is dropped on every exit
//! path, including the error paths.

use thiserror::Error;
use tokio::sync::Mutex;

use crate::model::{
    FullScore, MAX_SCORE, NewScore, NewUser, ScoreEntry, ScoreId, User, UserId, UserUpdate,
};
use crate::store::Store;

/// Failures surfaced by [`Service`] operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// A new score named a user that does not exist
    #[error("user {0} does not exist")]
    UnknownUser(UserId),
    /// A stored score references a user that has since been deleted
    #[error("score {score_id} references missing user {user_id}")]
    DanglingUser { score_id: ScoreId, user_id: UserId },
}

/// Inclusive score range and optional owner filter for [`Service::list_scores`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreFilter {
    pub user_id: Option<UserId>,
    pub lower: u8,
    pub upper: u8,
}

impl Default for ScoreFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            lower: 0,
            upper: MAX_SCORE,
        }
    }
}

impl ScoreFilter {
    fn matches(&self, entry: &ScoreEntry) -> bool {
        self.lower <= entry.score
            && entry.score <= self.upper
            && self.user_id.is_none_or(|id| id == entry.user_id)
    }
}

/// Sole query and mutation surface over a [`Store`]
pub struct Service {
    store: Mutex<Store>,
}

impl Service {
    /// Take ownership of a loaded store
    pub fn new(store: Store) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    pub async fn list_users(&self) -> Vec<User> {
        let store = self.store.lock().await;
        store.users.values().cloned().collect()
    }

    pub async fn get_user(&self, user_id: UserId) -> Option<User> {
        let store = self.store.lock().await;
        store.users.get(&user_id).cloned()
    }

    /// Insert a new user under a freshly generated id
    pub async fn add_user(&self, new_user: NewUser) -> User {
        let mut store = self.store.lock().await;
        let user = User::create(new_user);
        store.users.insert(user.id, user.clone());
        user
    }

    /// Overwrite every field of `update` that is present and non-empty.
    /// Returns `None` when the user does not exist.
    pub async fn update_user(&self, user_id: UserId, update: UserUpdate) -> Option<User> {
        let mut store = self.store.lock().await;
        let user = store.users.get_mut(&user_id)?;
        user.apply(update);
        Some(user.clone())
    }

    /// Remove a user if present. Scores owned by the user are kept.
    pub async fn delete_user(&self, user_id: UserId) {
        let mut store = self.store.lock().await;
        store.users.shift_remove(&user_id);
    }

    /// Scores within `filter`, each joined with the current record of its
    /// owner. Scores whose owner no longer exists are left out.
    pub async fn list_scores(&self, filter: ScoreFilter) -> Vec<FullScore> {
        let store = self.store.lock().await;
        store
            .scores
            .values()
            .filter(|entry| filter.matches(entry))
            .filter_map(|entry| {
                let user = store.users.get(&entry.user_id)?;
                Some(FullScore::join(entry, user.clone()))
            })
            .collect()
    }

    /// Look up a score and join it with its owner
    pub async fn get_score(&self, score_id: ScoreId) -> Result<Option<FullScore>, ServiceError> {
        let store = self.store.lock().await;
        let Some(entry) = store.scores.get(&score_id) else {
            return Ok(None);
        };
        match store.users.get(&entry.user_id) {
            Some(user) => Ok(Some(FullScore::join(entry, user.clone()))),
            None => Err(ServiceError::DanglingUser {
                score_id,
                user_id: entry.user_id,
            }),
        }
    }

    /// Record a score for an existing user. The score collection is left
    /// untouched when the user is unknown.
    pub async fn add_score(&self, new_score: NewScore) -> Result<FullScore, ServiceError> {
        let mut store = self.store.lock().await;
        let user = store
            .users
            .get(&new_score.user_id)
            .cloned()
            .ok_or(ServiceError::UnknownUser(new_score.user_id))?;

        let entry = ScoreEntry::create(new_score);
        let full = FullScore::join(&entry, user);
        store.scores.insert(entry.id, entry);
        Ok(full)
    }

    /// Remove a score if present
    pub async fn delete_score(&self, score_id: ScoreId) {
        let mut store = self.store.lock().await;
        store.scores.shift_remove(&score_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            first_name: "Frank".to_string(),
            last_name: "Burns".to_string(),
            email: format!("{}@example.com", username),
        }
    }

    fn new_score(user_id: UserId, score: u8) -> NewScore {
        NewScore {
            game: "Meatball surgery".to_string(),
            score,
            user_id,
        }
    }

    fn ids(users: &[User]) -> HashSet<UserId> {
        users.iter().map(|u| u.id).collect()
    }

    #[tokio::test]
    async fn test_add_and_get_user() {
        let svc = Service::new(Store::new());
        let user = svc.add_user(new_user("burns")).await;

        assert_eq!(svc.get_user(user.id).await, Some(user.clone()));
        assert_eq!(svc.list_users().await, vec![user]);
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let svc = Service::new(Store::new());
        assert_eq!(svc.get_user(UserId::random()).await, None);
    }

    #[tokio::test]
    async fn test_list_users_tracks_adds_and_deletes() {
        let svc = Service::new(Store::new());
        let a = svc.add_user(new_user("a")).await;
        let b = svc.add_user(new_user("b")).await;
        let c = svc.add_user(new_user("c")).await;

        svc.delete_user(b.id).await;
        svc.delete_user(b.id).await;
        svc.delete_user(UserId::random()).await;

        let users = svc.list_users().await;
        assert_eq!(users.len(), 2);
        assert_eq!(ids(&users), HashSet::from([a.id, c.id]));
    }

    #[tokio::test]
    async fn test_update_user_partial() {
        let svc = Service::new(Store::new());
        let user = svc.add_user(new_user("burns")).await;

        let updated = svc
            .update_user(
                user.id,
                UserUpdate {
                    username: Some("ferret_face".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, user.id);
        assert_eq!(updated.username, "ferret_face");
        assert_eq!(updated.first_name, user.first_name);
        assert_eq!(svc.get_user(user.id).await, Some(updated));
    }

    #[tokio::test]
    async fn test_update_user_empty_string_is_no_change() {
        let svc = Service::new(Store::new());
        let user = svc.add_user(new_user("burns")).await;

        let updated = svc
            .update_user(
                user.id,
                UserUpdate {
                    last_name: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated, user);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let svc = Service::new(Store::new());
        let result = svc.update_user(UserId::random(), UserUpdate::default()).await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_add_score_joins_user() {
        let svc = Service::new(Store::new());
        let user = svc.add_user(new_user("hawkeye")).await;
        let full = svc.add_score(new_score(user.id, 88)).await.unwrap();

        assert_eq!(full.user, user);
        assert_eq!(full.score, 88);
        assert_eq!(svc.get_score(full.id).await, Ok(Some(full)));
    }

    #[tokio::test]
    async fn test_add_score_unknown_user() {
        let svc = Service::new(Store::new());
        let user = svc.add_user(new_user("hawkeye")).await;
        svc.add_score(new_score(user.id, 10)).await.unwrap();

        let stranger = UserId::random();
        let result = svc.add_score(new_score(stranger, 50)).await;

        assert_eq!(result, Err(ServiceError::UnknownUser(stranger)));

        let store = svc.store.lock().await;
        assert_eq!(store.scores.len(), 1);
        assert!(store.scores.values().all(|s| s.user_id == user.id));
    }

    #[tokio::test]
    async fn test_join_reflects_user_update() {
        let svc = Service::new(Store::new());
        let user = svc.add_user(new_user("trapper")).await;
        let full = svc.add_score(new_score(user.id, 40)).await.unwrap();

        let updated = svc
            .update_user(
                user.id,
                UserUpdate {
                    email: Some("john@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fetched = svc.get_score(full.id).await.unwrap().unwrap();
        assert_eq!(fetched.user, updated);

        let listed = svc.list_scores(ScoreFilter::default()).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user.email, "john@example.com");
    }

    #[tokio::test]
    async fn test_list_scores_bounds_and_owner() {
        let svc = Service::new(Store::new());
        let a = svc.add_user(new_user("a")).await;
        let b = svc.add_user(new_user("b")).await;
        for score in [0, 25, 50, 75, 100] {
            svc.add_score(new_score(a.id, score)).await.unwrap();
            svc.add_score(new_score(b.id, score)).await.unwrap();
        }

        let all = svc.list_scores(ScoreFilter::default()).await;
        assert_eq!(all.len(), 10);

        let mid = svc
            .list_scores(ScoreFilter {
                user_id: None,
                lower: 25,
                upper: 75,
            })
            .await;
        assert_eq!(mid.len(), 6);
        assert!(mid.iter().all(|s| (25..=75).contains(&s.score)));

        let exact = svc
            .list_scores(ScoreFilter {
                user_id: Some(b.id),
                lower: 50,
                upper: 50,
            })
            .await;
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].score, 50);
        assert_eq!(exact[0].user, b);

        let inverted = svc
            .list_scores(ScoreFilter {
                user_id: None,
                lower: 80,
                upper: 20,
            })
            .await;
        assert!(inverted.is_empty());
    }

    #[tokio::test]
    async fn test_delete_score() {
        let svc = Service::new(Store::new());
        let user = svc.add_user(new_user("a")).await;
        let full = svc.add_score(new_score(user.id, 5)).await.unwrap();

        svc.delete_score(full.id).await;
        svc.delete_score(full.id).await;

        assert_eq!(svc.get_score(full.id).await, Ok(None));
        assert!(svc.list_scores(ScoreFilter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_deleted_user_leaves_dangling_scores() {
        let svc = Service::new(Store::new());
        let keep = svc.add_user(new_user("keep")).await;
        let gone = svc.add_user(new_user("gone")).await;
        let kept = svc.add_score(new_score(keep.id, 30)).await.unwrap();
        let orphan = svc.add_score(new_score(gone.id, 60)).await.unwrap();

        svc.delete_user(gone.id).await;

        assert_eq!(
            svc.get_score(orphan.id).await,
            Err(ServiceError::DanglingUser {
                score_id: orphan.id,
                user_id: gone.id,
            })
        );
        assert_eq!(svc.list_scores(ScoreFilter::default()).await, vec![kept]);

        // Deleting the orphan afterwards is still allowed
        svc.delete_score(orphan.id).await;
        assert_eq!(svc.get_score(orphan.id).await, Ok(None));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_score_loses_nothing() {
        const N: usize = 200;

        let mut store = Store::new();
        let user = User::create(new_user("solo"));
        store.users.insert(user.id, user.clone());
        let svc = Arc::new(Service::new(store));

        let tasks = (0..N).map(|i| {
            let svc = Arc::clone(&svc);
            let user_id = user.id;
            tokio::spawn(async move { svc.add_score(new_score(user_id, (i % 101) as u8)).await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let scores = svc.list_scores(ScoreFilter::default()).await;
        assert_eq!(scores.len(), N);
        let unique: HashSet<ScoreId> = scores.iter().map(|s| s.id).collect();
        assert_eq!(unique.len(), N);
    }

    #[tokio::test]
    async fn test_loaded_snapshot_lists_everything() {
        let store = crate::seed::generate();
        let expected_users: HashSet<UserId> = store.users.keys().copied().collect();
        let expected_scores: HashSet<ScoreId> = store.scores.keys().copied().collect();
        let raw = store.to_json().unwrap();

        let svc = Service::new(Store::from_json(&raw).unwrap());

        let users = svc.list_users().await;
        assert_eq!(users.len(), 3);
        assert_eq!(ids(&users), expected_users);

        let scores = svc.list_scores(ScoreFilter::default()).await;
        assert_eq!(scores.len(), 15);
        let listed: HashSet<ScoreId> = scores.iter().map(|s| s.id).collect();
        assert_eq!(listed, expected_scores);
    }
}

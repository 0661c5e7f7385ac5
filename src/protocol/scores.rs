use async_trait::async_trait;
use serde::Deserialize;

use crate::model::{NewScore, ScoreId, UserId};
use crate::protocol::command::Command;
use crate::protocol::response::{Response, status};
use crate::protocol::validate;
use crate::service::Service;

/// LIST_SCORES [user_id] [lower_bound] [upper_bound]
#[derive(Debug, Deserialize)]
pub struct ListScoresCmd {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub lower_bound: Option<u32>,
    #[serde(default)]
    pub upper_bound: Option<u32>,
}

#[async_trait]
impl Command for ListScoresCmd {
    async fn execute(&self, service: &Service) -> Response {
        match validate::score_filter(self.user_id, self.lower_bound, self.upper_bound) {
            Ok(filter) => Response::ok(service.list_scores(filter).await),
            Err(e) => e.into(),
        }
    }
}

/// GET_SCORE score_id
#[derive(Debug, Deserialize)]
pub struct GetScoreCmd {
    pub score_id: ScoreId,
}

#[async_trait]
impl Command for GetScoreCmd {
    async fn execute(&self, service: &Service) -> Response {
        match service.get_score(self.score_id).await {
            Ok(Some(score)) => Response::ok(score),
            Ok(None) => Response::error(
                status::NOT_FOUND,
                format!("Score {} not found", self.score_id),
            ),
            Err(e) => e.into(),
        }
    }
}

/// CREATE_SCORE score
#[derive(Debug, Deserialize)]
pub struct CreateScoreCmd {
    pub score: NewScore,
}

#[async_trait]
impl Command for CreateScoreCmd {
    async fn execute(&self, service: &Service) -> Response {
        if let Err(e) = validate::new_score(&self.score) {
            return e.into();
        }
        match service.add_score(self.score.clone()).await {
            Ok(score) => Response::with_status(status::CREATED, score),
            Err(e) => e.into(),
        }
    }
}

/// DELETE_SCORE score_id
#[derive(Debug, Deserialize)]
pub struct DeleteScoreCmd {
    pub score_id: ScoreId,
}

#[async_trait]
impl Command for DeleteScoreCmd {
    async fn execute(&self, service: &Service) -> Response {
        service.delete_score(self.score_id).await;
        Response::empty()
    }
}

use async_trait::async_trait;
use serde::Deserialize;

use crate::model::{NewUser, UserId, UserUpdate};
use crate::protocol::command::Command;
use crate::protocol::response::{Response, status};
use crate::protocol::validate;
use crate::service::Service;

fn user_not_found(user_id: UserId) -> Response {
    Response::error(status::NOT_FOUND, format!("User {} not found", user_id))
}

/// LIST_USERS
#[derive(Debug, Deserialize)]
pub struct ListUsersCmd {}

#[async_trait]
impl Command for ListUsersCmd {
    async fn execute(&self, service: &Service) -> Response {
        Response::ok(service.list_users().await)
    }
}

/// GET_USER user_id
#[derive(Debug, Deserialize)]
pub struct GetUserCmd {
    pub user_id: UserId,
}

#[async_trait]
impl Command for GetUserCmd {
    async fn execute(&self, service: &Service) -> Response {
        match service.get_user(self.user_id).await {
            Some(user) => Response::ok(user),
            None => user_not_found(self.user_id),
        }
    }
}

/// CREATE_USER user
#[derive(Debug, Deserialize)]
pub struct CreateUserCmd {
    pub user: NewUser,
}

#[async_trait]
impl Command for CreateUserCmd {
    async fn execute(&self, service: &Service) -> Response {
        if let Err(e) = validate::new_user(&self.user) {
            return e.into();
        }
        let user = service.add_user(self.user.clone()).await;
        Response::with_status(status::CREATED, user)
    }
}

/// UPDATE_USER user_id user
#[derive(Debug, Deserialize)]
pub struct UpdateUserCmd {
    pub user_id: UserId,
    #[serde(default)]
    pub user: UserUpdate,
}

#[async_trait]
impl Command for UpdateUserCmd {
    async fn execute(&self, service: &Service) -> Response {
        if let Err(e) = validate::user_update(&self.user) {
            return e.into();
        }
        match service.update_user(self.user_id, self.user.clone()).await {
            Some(user) => Response::with_status(status::ACCEPTED, user),
            None => user_not_found(self.user_id),
        }
    }
}

/// DELETE_USER user_id
#[derive(Debug, Deserialize)]
pub struct DeleteUserCmd {
    pub user_id: UserId,
}

#[async_trait]
impl Command for DeleteUserCmd {
    async fn execute(&self, service: &Service) -> Response {
        service.delete_user(self.user_id).await;
        Response::empty()
    }
}

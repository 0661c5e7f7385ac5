use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::protocol::frame::{FrameError, Parser};
use crate::protocol::response::{Response, status};
use crate::protocol::{scores, users};
use crate::service::Service;

/// A decoded request, ready to run against the service
#[async_trait]
pub trait Command: Send + Sync {
    async fn execute(&self, service: &Service) -> Response;
}

type Builder = fn(Map<String, Value>) -> Result<Box<dyn Command>, serde_json::Error>;

fn build<C>(args: Map<String, Value>) -> Result<Box<dyn Command>, serde_json::Error>
where
    C: Command + DeserializeOwned + 'static,
{
    let cmd: C = serde_json::from_value(Value::Object(args))?;
    Ok(Box::new(cmd))
}

/// Maps command names onto their argument decoders
pub struct CommandFactory {
    builders: HashMap<&'static str, Builder>,
}

impl CommandFactory {
    /// Register every supported command
    pub fn init() -> Self {
        let mut factory = Self {
            builders: HashMap::new(),
        };
        factory.register("list_users", build::<users::ListUsersCmd>);
        factory.register("get_user", build::<users::GetUserCmd>);
        factory.register("create_user", build::<users::CreateUserCmd>);
        factory.register("update_user", build::<users::UpdateUserCmd>);
        factory.register("delete_user", build::<users::DeleteUserCmd>);
        factory.register("list_scores", build::<scores::ListScoresCmd>);
        factory.register("get_score", build::<scores::GetScoreCmd>);
        factory.register("create_score", build::<scores::CreateScoreCmd>);
        factory.register("delete_score", build::<scores::DeleteScoreCmd>);
        factory
    }

    fn register(&mut self, name: &'static str, builder: Builder) {
        self.builders.insert(name, builder);
    }

    /// Decode a request line into a command
    pub fn parse(&self, line: &[u8]) -> Result<(String, Box<dyn Command>), FrameError> {
        let (op, args) = Parser::decode(line)?;
        let builder = self
            .builders
            .get(op.as_str())
            .ok_or_else(|| FrameError::UnknownCommand(op.clone()))?;
        match builder(args) {
            Ok(cmd) => Ok((op, cmd)),
            Err(source) => Err(FrameError::InvalidArguments { op, source }),
        }
    }

    /// Parse and execute a request line, always producing a response
    pub async fn execute(&self, line: &[u8], service: &Service) -> Response {
        match self.parse(line) {
            Ok((op, cmd)) => {
                let response = cmd.execute(service).await;
                if response.is_success() {
                    debug!(op = %op, status = response.status, "command executed");
                } else {
                    info!(op = %op, status = response.status, error = ?response.error, "command failed");
                }
                response
            }
            Err(e) => {
                debug!(error = %e, "rejected request");
                Response::from(e)
            }
        }
    }
}

impl From<FrameError> for Response {
    fn from(err: FrameError) -> Self {
        let code = match err {
            FrameError::InvalidArguments { .. } => status::UNPROCESSABLE,
            _ => status::BAD_REQUEST,
        };
        Self::error(code, err.to_string())
    }
}

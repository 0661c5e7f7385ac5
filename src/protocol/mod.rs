//! Request protocol
//!
//! Newline-delimited JSON requests of the form `{"op": "<name>", ...args}`,
//! each answered by one JSON line carrying a status and a body or error.

pub mod command;
pub mod frame;
pub mod response;
pub mod scores;
pub mod users;
pub mod validate;

pub use command::CommandFactory;
pub use frame::Parser;
pub use response::Response;

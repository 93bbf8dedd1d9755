//! Arena error codes

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    #[error("Unknown strategy `{0}`")]
    UnknownStrategy(String),

    #[error("A custom strategy named `{0}` already exists")]
    DuplicateStrategy(String),

    #[error("`{0}` is a built-in strategy and cannot be replaced or removed")]
    BuiltinStrategy(String),

    #[error("Strategy name must not be empty")]
    EmptyName,

    #[error("Strategy logic must not be empty")]
    EmptyLogic,

    #[error("No opponent available")]
    NoOpponent,
}

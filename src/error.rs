// error.rs - Error Types
// All error enums used by the bot live here so that startup code, the persistence
// adapter and the command handlers share one vocabulary.
//
// Startup errors (ConfigError, RegistryError) are fatal.
// CommandError is the tagged failure half of a handler result; the session turns it
// into a reply and never lets it escape further.

use thiserror::Error;

/// Problems found while reading configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("{key} is still set to the placeholder value")]
    Placeholder { key: &'static str },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Problems found while building the command registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("verb '{verb}' is declared by both '{first}' and '{second}'")]
    DuplicateVerb {
        verb: String,
        first: String,
        second: String,
    },

    #[error("command '{0}' declares no verbs")]
    NoVerbs(String),

    /// Empty or containing a space; such a verb could never be routed to
    #[error("command '{command}' declares unroutable verb '{verb}'")]
    InvalidVerb { command: String, verb: String },
}

/// Key-value store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record does not exist (or has an empty username, which counts as the same thing)
    #[error("user not found")]
    NotFound,

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("malformed field '{field}': '{value}'")]
    Malformed { field: &'static str, value: String },
}

/// Image board failures
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BoardError {
    /// What chat users see. The inner detail only goes to the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            BoardError::Http(_) => "Couldn't reach the image board.",
            BoardError::Status(_) => "The image board returned an error.",
            BoardError::Parse(_) => "The image board sent a response I couldn't read.",
        }
    }
}

/// Broad classification of a handler failure, for logging and for callers that
/// want to branch without matching every variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    NotFound,
    Network,
    Permission,
    Execution,
    Storage,
    Unsupported,
}

/// Failure half of a command result. `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArgs(String),

    #[error("No results found.")]
    NoResults,

    #[error("{0}")]
    NotFound(String),

    #[error("{}", .0.user_message())]
    Board(#[from] BoardError),

    #[error("You don't have permission to use that command.")]
    PermissionDenied,

    #[error("Command failed: {0}")]
    Execution(String),

    #[error("Couldn't open {0}.")]
    MissingFile(String),

    #[error("That command needs the database, which isn't enabled.")]
    StorageDisabled,

    #[error("Database error. ({0})")]
    Storage(StoreError),

    #[error("{0}")]
    Unsupported(String),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::InvalidArgs(_) => ErrorKind::Usage,
            CommandError::NoResults | CommandError::NotFound(_) | CommandError::MissingFile(_) => {
                ErrorKind::NotFound
            }
            CommandError::Board(_) => ErrorKind::Network,
            CommandError::PermissionDenied => ErrorKind::Permission,
            CommandError::Execution(_) => ErrorKind::Execution,
            CommandError::StorageDisabled | CommandError::Storage(_) => ErrorKind::Storage,
            CommandError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CommandError::NotFound("That user isn't in the database yet.".to_string()),
            other => CommandError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_user_facing_not_found() {
        let err: CommandError = StoreError::NotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "That user isn't in the database yet.");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CommandError::PermissionDenied.kind(), ErrorKind::Permission);
        assert_eq!(CommandError::NoResults.kind(), ErrorKind::NotFound);
        assert_eq!(CommandError::StorageDisabled.kind(), ErrorKind::Storage);
        assert_eq!(CommandError::InvalidArgs("x".into()).to_string(), "x");
    }

    #[test]
    fn test_board_errors_hide_detail() {
        let parse = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = CommandError::from(BoardError::Parse(parse));
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.to_string(), "The image board sent a response I couldn't read.");

        let err = CommandError::from(BoardError::Status(503));
        assert_eq!(err.to_string(), "The image board returned an error.");
        assert!(!err.to_string().contains("503"));
    }
}

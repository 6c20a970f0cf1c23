//! Error types shared across the looper library

/// Result type for looper operations
pub type Result<T> = std::result::Result<T, LooperError>;

/// Error types for looper operations
#[derive(thiserror::Error, Debug)]
pub enum LooperError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

/// Failures reported by a player handle
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The widget exists but has not finished loading
    #[error("player is not ready")]
    NotReady,

    /// The widget was torn down; no further commands will succeed
    #[error("player has been destroyed")]
    Destroyed,

    #[error("player command failed: {0}")]
    Command(String),
}

use thiserror::Error;

/// Rejected user input. Nothing is persisted or sent when one of these is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a name")]
    MissingName,
    #[error("Please select at least one device")]
    MissingDevices,
    #[error("Please enter a message")]
    MissingMessage,
}

/// Failures talking to the hub.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("unexpected response: {0}")]
    Protocol(String),
    #[error("{0} cannot be fetched from the hub")]
    Unsupported(&'static str),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory available")]
    NoConfigDir,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
    #[error("hub URL and access token are not configured")]
    NotConfigured,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("send failed: {0}")]
    Dispatch(#[source] RemoteError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no group with id {0}")]
    UnknownGroup(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

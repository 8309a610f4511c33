use std::path::PathBuf;
use thiserror::Error;

use crate::store::diff::EmptyObservation;

/// Failure reaching or reading the listing page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("configured css selectors failed to compile")]
    Selectors,
}

/// Failure delivering a message to the notification sink.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("telegram rejected the message: {description}")]
    Rejected { description: String },
}

/// Failure persisting the snapshot file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not determine data directory")]
    DataDir,

    #[error("could not create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not write snapshot to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure loading or validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory, pass --config explicitly")]
    NoConfigDir,

    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("telegram.bot_token is unset or still the placeholder, fill in a real bot token")]
    PlaceholderToken,

    #[error("telegram.chat_id is unset or still the placeholder, fill in a real chat id")]
    PlaceholderChatId,

    #[error("{field} is not a valid url: {source}")]
    Url {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{field} is not a valid duration: {source}")]
    Duration {
        field: &'static str,
        #[source]
        source: humantime::DurationError,
    },

    #[error("schedule intervals must be greater than zero")]
    ZeroInterval,

    #[error("schedule.min_interval exceeds schedule.max_interval")]
    IntervalOrder,

    #[error("selectors.{field} is not a valid css selector")]
    Selector { field: &'static str },
}

/// A pass-aborting condition. Notification and persistence failures are
/// reported in the pass summary instead, they never abort a pass.
#[derive(Debug, Error)]
pub enum PassError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    EmptyObservation(#[from] EmptyObservation),
}

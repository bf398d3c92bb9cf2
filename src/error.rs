//! # Error Handling
//!
//! This module defines the centralized error type for the `batch-tool`
//! library. It uses the `thiserror` library to create an `Error` enum that
//! covers the failure modes of the catalog, the resolver, the execution
//! engine and the concrete per-repository tasks.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors. Each
//!   variant carries the context needed to render a useful message in a
//!   repository's output section (`ERROR: <message>`).
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Errors are grouped roughly as follows:
//!
//! - Configuration problems, which are checked once before any work starts.
//! - Catalog and REST API failures.
//! - Per-repository command and git failures.
//! - Output channel misuse (pushing after the consumer went away, closing a
//!   sink twice).
//! - Wrapped library errors (I/O, YAML, JSON, HTTP, URL parsing).

use thiserror::Error;

/// Main error type for batch-tool operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A setting required by the current command is empty.
    #[error("{key} is required - set it in the config file, as a flag or in the environment")]
    MissingSetting { key: String },

    /// A setting is present but holds an unusable value.
    #[error("Invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },

    /// A command-line target does not name a repository.
    #[error("invalid repository name '{raw}'")]
    InvalidTarget { raw: String },

    /// A git command failed for a repository.
    #[error("git {command} failed for {target}: {stderr}")]
    GitCommand {
        command: String,
        target: String,
        stderr: String,
    },

    /// The repository is on the branch that changes must never be made on.
    #[error("skipping operation - {branch} is the source branch")]
    OnSourceBranch { branch: String },

    /// An external command could not be started or exited unsuccessfully.
    #[error("{command}: {message}")]
    Command { command: String, message: String },

    /// The REST API answered with a non-success status.
    #[error("error {status}: {body}")]
    Api {
        url: String,
        status: u16,
        body: String,
    },

    /// A network operation failed before a response was received.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// The repository catalog could not be built.
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// A remote record is missing a field or has the wrong shape.
    #[error("{record} record: field '{field}' {message}")]
    Record {
        record: String,
        field: String,
        message: String,
    },

    /// Something that was looked up does not exist.
    #[error("{what}")]
    NotFound { what: String },

    /// The reading side of a repository's output buffer has gone away.
    #[error("output for {target} is no longer being read")]
    OutputClosed { target: String },

    /// A repository's output buffer was closed more than once.
    #[error("output for {target} was already closed")]
    SinkAlreadyClosed { target: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An HTTP client error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the layout engine
//!
//! The `LayoutSaver` facade reports failures as `bool` plus a log line; the
//! typed errors here are what the `try_*` variants return.

use std::path::PathBuf;

use thiserror::Error;

/// Decoding failures while reading a layout stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("layout stream ended early: needed {needed} bytes, {remaining} left")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("string byte length {0} is not a whole number of UTF-16 units")]
    OddStringLength(u32),

    #[error("string is not valid UTF-16")]
    InvalidString,

    #[error("invalid {what} tag {tag}")]
    InvalidTag { what: &'static str, tag: i32 },

    #[error("negative {what} count {count}")]
    NegativeCount { what: &'static str, count: i32 },

    #[error("rect edges ({left}, {top}) to ({right}, {bottom}) are out of range")]
    InvalidRect {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },

    #[error("layout tree nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Failures of the persistent settings store
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file '{path}' is malformed: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no settings directory available")]
    NoSettingsDir,

    #[error("organization and application must be plain names, got '{organization}/{application}'")]
    InvalidIdentity {
        organization: String,
        application: String,
    },
}

/// Errors raised by the registry and the layout saver
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("organization and application names must both be set, each a single path segment")]
    MissingIdentity,

    #[error("refusing to serialize insane layout: {}", .0.join("; "))]
    InsaneRegistry(Vec<String>),

    #[error("layout payload is empty")]
    EmptyPayload,

    #[error("malformed layout payload: {0}")]
    Stream(#[from] StreamError),

    #[error("no main window named '{0}'; create it before restoring")]
    UnknownMainWindow(String),

    #[error("no panel named '{0}'")]
    UnknownPanel(String),

    #[error("a {kind} named '{name}' already exists")]
    DuplicateName { kind: &'static str, name: String },

    #[error("invalid name for a {0}: names must not be empty")]
    EmptyName(&'static str),

    #[error("panel '{0}' is closed; reopen it first")]
    PanelClosed(String),

    #[error("window no longer exists")]
    StaleWindow,

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

//! Typed errors for the cache-or-fetch core.
//!
//! Every variant carries a message suitable for direct display; the
//! presentation layer shows these strings as-is.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DexError {
  /// The identifier resolved neither locally nor remotely.
  #[error("'{0}' was not found")]
  NotFound(String),

  /// Transport failure or an unexpected status from the remote source.
  #[error("remote source unavailable: {0}")]
  RemoteUnavailable(String),

  /// A remote document was missing an expected field or reference.
  #[error("malformed remote document: {0}")]
  MalformedDocument(String),

  /// Both sides of a comparison failed to resolve.
  #[error("neither '{left}' nor '{right}' was found")]
  NeitherFound { left: String, right: String },

  /// The comparison was given the same identifier twice.
  #[error("please select two different Pokémon to compare")]
  InvalidComparison,

  /// Local storage failure.
  #[error("storage error: {0}")]
  Storage(String),
}

pub type Result<T, E = DexError> = std::result::Result<T, E>;

impl From<rusqlite::Error> for DexError {
  fn from(e: rusqlite::Error) -> Self {
    DexError::Storage(e.to_string())
  }
}

impl From<serde_json::Error> for DexError {
  fn from(e: serde_json::Error) -> Self {
    DexError::Storage(format!("failed to (de)serialize stored value: {}", e))
  }
}

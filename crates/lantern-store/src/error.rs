//! Store error type.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use lantern_arena::ArenaError;

/// Errors raised by the record store.
#[derive(Debug)]
pub enum StoreError {
    /// A record referenced by id does not exist.
    MissingRecord {
        /// The table searched.
        table: &'static str,
        /// The raw row id.
        id: u32,
    },
    /// Reading or writing the store file failed.
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The store document could not be encoded or decoded.
    Serde(serde_json::Error),
    /// The statement arena could not be created.
    Arena(ArenaError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRecord { table, id } => write!(f, "no row {id} in table '{table}'"),
            Self::Io { path, source } => write!(f, "store file {}: {source}", path.display()),
            Self::Serde(e) => write!(f, "store document: {e}"),
            Self::Arena(e) => write!(f, "statement arena: {e}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serde(e) => Some(e),
            Self::Arena(e) => Some(e),
            Self::MissingRecord { .. } => None,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e)
    }
}

impl From<ArenaError> for StoreError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HbnbError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Data corruption: {message}")]
    DataCorruption { message: String },
    #[error("Parse error: {message}")]
    Parse { message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("{0}")]
    Rejected(#[from] Rejection),
}

/// A command refused during validation. These are reported to the user
/// verbatim and never leave the store modified.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("** class name missing **")]
    ClassNameMissing,
    #[error("** class doesn't exist **")]
    ClassDoesntExist,
    #[error("** instance id missing **")]
    InstanceIdMissing,
    #[error("** no instance found **")]
    NoInstanceFound,
    #[error("** attribute name missing **")]
    AttributeNameMissing,
    #[error("** value missing **")]
    ValueMissing,
}

pub type Result<T> = std::result::Result<T, HbnbError>;

// Helper conversions
impl From<rusqlite::Error> for HbnbError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}

impl From<config::ConfigError> for HbnbError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|e| HbnbError::Lock(e.to_string()))
}

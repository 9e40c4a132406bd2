use thiserror::Error;

use crate::crypto::EncryptionError;
use crate::models::ItemId;

/// Errors surfaced by the item store and its database layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be opened or its schema could not be created.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A read, write or transaction failed against an open store.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The item id does not refer to a stored item.
    #[error("Item {0} not found")]
    NotFound(ItemId),

    /// The item violates a write precondition.
    #[error("Invalid item: {0}")]
    InvalidItem(&'static str),

    /// Passed through from the encryption collaborator untouched.
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
}

impl StoreError {
    /// Returns true for errors caused by caller input rather than storage.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidItem(_))
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, StoreError>;

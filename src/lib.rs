pub mod crypto;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod utils;

pub use crypto::{Cipher, EncryptionError};
pub use db::Database;
pub use error::{Result, StoreError};
pub use models::{Item, ItemBuilder, ItemId, Tag, TagId, TrashItem};
pub use store::{ItemStore, MemoryItemStore, SqliteItemStore};

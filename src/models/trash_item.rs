use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Denormalized snapshot of an item at the moment it was trashed.
///
/// Has no link back to the live tables; tags are flattened into a single
/// space-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashItem {
    /// Row id in the trash table (unrelated to the former item id).
    pub id: i64,
    /// Title at the time of trashing.
    pub title: String,
    /// Content at the time of trashing, still sealed if `encrypted`.
    pub content: String,
    /// Tag names joined with single spaces.
    pub tags: String,
    /// Whether `content` was ciphertext.
    pub encrypted: bool,
    /// When the item was moved to the trash.
    #[serde(with = "time::serde::rfc3339")]
    pub trashed_at: OffsetDateTime,
}

impl TrashItem {
    /// Flattens tag names the way they are stored in the trash table.
    pub fn flatten_tags(tags: &[String]) -> String {
        tags.join(" ")
    }

    /// Splits the flattened tag string back into names.
    ///
    /// Exact inverse of [`TrashItem::flatten_tags`] for stored tag names,
    /// which never contain whitespace (see [`crate::Tag::clean_title`]).
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split_whitespace().collect()
    }
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{ItemId, Tag};

/// A short text note annotated with free-form tags.
///
/// An item without an `id` has not been persisted yet. The `timestamp` is
/// owned by the store: it is overwritten on every write and whatever the
/// caller puts there is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Database identifier, `None` until the first write.
    pub id: Option<ItemId>,
    /// Short title.
    pub title: String,
    /// Body text, ciphertext when `encrypted` is set.
    pub content: String,
    /// Whether `content` was produced by a [`Cipher`](crate::Cipher).
    pub encrypted: bool,
    /// Time of the last write.
    #[serde(with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    /// Tag names; identity is case-insensitive.
    pub tags: Vec<String>,
}

impl Item {
    /// Creates an unsaved, unencrypted item.
    ///
    /// # Examples
    ///
    /// ```
    /// use recap::Item;
    ///
    /// let item = Item::new("Groceries", "milk, eggs", ["home", "errands"]);
    /// assert!(item.id.is_none());
    /// assert_eq!(item.tags, vec!["home", "errands"]);
    /// ```
    pub fn new<I, S>(title: impl Into<String>, content: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            encrypted: false,
            timestamp: None,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true once the item has been written.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns true if the item carries `tag`, compared by [`Tag::key`].
    pub fn has_tag(&self, tag: &str) -> bool {
        let key = Tag::key(tag);
        self.tags.iter().any(|t| Tag::key(t) == key)
    }
}

/// Builder for constructing `Item` instances with optional fields.
///
/// # Examples
///
/// ```
/// use recap::{ItemBuilder, ItemId};
///
/// let item = ItemBuilder::new()
///     .id(ItemId::new(1))
///     .title("Todo")
///     .content("write the report")
///     .build();
///
/// assert_eq!(item.id, Some(ItemId::new(1)));
/// assert!(item.tags.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ItemBuilder {
    id: Option<ItemId>,
    title: Option<String>,
    content: Option<String>,
    encrypted: bool,
    timestamp: Option<OffsetDateTime>,
    tags: Vec<String>,
}

impl ItemBuilder {
    /// Creates a new `ItemBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the item ID.
    pub fn id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the encrypted flag.
    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Sets the last-write timestamp.
    pub fn timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the tag names.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Builds the `Item`. Missing title or content become empty strings,
    /// which the store rejects on write.
    pub fn build(self) -> Item {
        Item {
            id: self.id,
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            encrypted: self.encrypted,
            timestamp: self.timestamp,
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_is_unsaved() {
        let item = Item::new("t", "c", ["a"]);

        assert!(!item.is_persisted());
        assert!(!item.encrypted);
        assert_eq!(item.timestamp, None);
    }

    #[test]
    fn has_tag_ignores_case_and_padding() {
        let item = Item::new("t", "c", ["Work"]);

        assert!(item.has_tag("work"));
        assert!(item.has_tag(" WORK "));
        assert!(!item.has_tag("home"));
        assert!(Item::new("t", "c", ["Ärger"]).has_tag("ÄRGER"));
    }

    #[test]
    fn builder_sets_all_fields() {
        let now = OffsetDateTime::now_utc();
        let item = ItemBuilder::new()
            .id(ItemId::new(9))
            .title("Title")
            .content("Body")
            .encrypted(true)
            .timestamp(now)
            .tags(vec!["x".to_string()])
            .build();

        assert_eq!(item.id, Some(ItemId::new(9)));
        assert!(item.encrypted);
        assert_eq!(item.timestamp, Some(now));
        assert_eq!(item.tags, vec!["x"]);
    }

    #[test]
    fn item_serializes_timestamp_as_rfc3339() {
        let item = ItemBuilder::new()
            .id(ItemId::new(1))
            .title("t")
            .content("c")
            .timestamp(time::macros::datetime!(2024-05-01 12:00 UTC))
            .build();

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
        assert_eq!(json["id"], 1);

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}

use serde::{Deserialize, Serialize};

use super::TagId;

/// A tag row: a label shared by any number of items.
///
/// Titles are unique under case-insensitive comparison (Unicode lowercase, see
/// [`Tag::key`]), so `Work` and `work`, or `Über` and `über`, name the same
/// tag. The first spelling written is the one stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    title: String,
}

impl Tag {
    /// Creates a new tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use recap::{Tag, TagId};
    ///
    /// let tag = Tag::new(TagId::new(1), "rust");
    /// assert_eq!(tag.id(), TagId::new(1));
    /// assert_eq!(tag.title(), "rust");
    /// ```
    pub fn new(id: TagId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    /// Returns the tag's unique identifier.
    pub fn id(&self) -> TagId {
        self.id
    }

    /// Returns the stored spelling of the tag.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns true if `name` identifies this tag.
    pub fn matches(&self, name: &str) -> bool {
        Self::key(&self.title) == Self::key(name)
    }

    /// Cleans a raw tag name: trims it and joins its words with `-`.
    ///
    /// Tag names never contain whitespace, so a trash snapshot's space-joined
    /// tag string splits back into the same names.
    ///
    /// ```
    /// use recap::Tag;
    ///
    /// assert_eq!(Tag::clean_title("  to \t do "), "to-do");
    /// assert_eq!(Tag::clean_title("   "), "");
    /// ```
    pub fn clean_title(name: &str) -> String {
        name.split_whitespace().collect::<Vec<_>>().join("-")
    }

    /// Identity key of a tag name, stored in `tags.title_key`.
    ///
    /// Two names denote the same tag exactly when their keys are equal.
    pub fn key(name: &str) -> String {
        Self::clean_title(name).to_lowercase()
    }
}

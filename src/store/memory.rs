use std::collections::BTreeMap;

use super::{ItemStore, validate, write_timestamp};
use crate::error::{Result, StoreError};
use crate::models::{Item, ItemId, Tag, TagId, TrashItem};
use crate::utils::normalize_tags;

/// In-memory [`ItemStore`] with the same observable semantics as the SQLite
/// store. Nothing survives the value being dropped.
///
/// Every operation validates before it mutates, so a failed call leaves the
/// store untouched.
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    items: BTreeMap<ItemId, Item>,
    tags: Vec<Tag>,
    trash: Vec<TrashItem>,
    last_item_id: i64,
}

impl MemoryItemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored spelling of `name`, registering it if unseen.
    fn canonical_tag(&mut self, name: &str) -> String {
        if let Some(existing) = self.tags.iter().find(|t| t.matches(name)) {
            return existing.title().to_string();
        }
        let id = TagId::new(self.tags.len() as i64 + 1);
        self.tags.push(Tag::new(id, name));
        name.to_string()
    }
}

impl ItemStore for MemoryItemStore {
    fn write(&mut self, mut item: Item) -> Result<Item> {
        validate(&item)?;
        let id = match item.id {
            Some(id) if !self.items.contains_key(&id) => return Err(StoreError::NotFound(id)),
            Some(id) => id,
            None => {
                self.last_item_id += 1;
                ItemId::new(self.last_item_id)
            }
        };

        let requested = normalize_tags(&item.tags);
        item.tags = requested
            .iter()
            .map(|name| self.canonical_tag(name))
            .collect();
        item.id = Some(id);
        item.timestamp = Some(write_timestamp());

        self.items.insert(id, item.clone());
        // Callers get back their own spelling, as with the SQLite store.
        item.tags = requested;
        Ok(item)
    }

    fn read(&mut self, tags: &[&str]) -> Result<Vec<Item>> {
        let tags = normalize_tags(tags);
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .items
            .values()
            .filter(|item| tags.iter().any(|tag| item.has_tag(tag)))
            .cloned()
            .collect())
    }

    fn trash(&mut self, item: &Item) -> Result<TrashItem> {
        let id = item
            .id
            .ok_or(StoreError::InvalidItem("item has not been written"))?;
        let stored = self.items.remove(&id).ok_or(StoreError::NotFound(id))?;

        let trashed = TrashItem {
            id: self.trash.len() as i64 + 1,
            tags: TrashItem::flatten_tags(&stored.tags),
            title: stored.title,
            content: stored.content,
            encrypted: stored.encrypted,
            trashed_at: write_timestamp(),
        };
        self.trash.push(trashed.clone());
        Ok(trashed)
    }

    fn tags(&mut self) -> Result<Vec<String>> {
        let mut titles: Vec<String> = self.tags.iter().map(|t| t.title().to_string()).collect();
        titles.sort_by_key(|t| Tag::key(t));
        Ok(titles)
    }

    fn get(&mut self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.items.get(&id).cloned())
    }

    fn trashed(&mut self) -> Result<Vec<TrashItem>> {
        Ok(self.trash.iter().rev().cloned().collect())
    }
}

//! Item store: create, update, read-by-tags and trash over the schema.

mod memory;

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use time::OffsetDateTime;
use tracing::debug;

use crate::Database;
use crate::error::{Result, StoreError};
use crate::models::{Item, ItemBuilder, ItemId, Tag, TagId, TrashItem};
use crate::utils::normalize_tags;

pub use memory::MemoryItemStore;

/// Operations every item store provides.
///
/// Each call is atomic: it either completes or leaves storage as it was.
/// Implementations agree on observable behavior so callers and tests can
/// swap the SQLite store for [`MemoryItemStore`].
pub trait ItemStore {
    /// Inserts an item without an id, or updates the item with that id.
    ///
    /// Returns the item as stored: id assigned, timestamp set, tags
    /// normalized. Afterwards the item's stored tag set equals the given one.
    fn write(&mut self, item: Item) -> Result<Item>;

    /// Returns every item carrying at least one of `tags`, each with its full
    /// tag set. An empty `tags` slice yields no items.
    fn read(&mut self, tags: &[&str]) -> Result<Vec<Item>>;

    /// Moves a stored item into the trash and returns the snapshot.
    fn trash(&mut self, item: &Item) -> Result<TrashItem>;

    /// Returns every tag title, referenced or not.
    fn tags(&mut self) -> Result<Vec<String>>;

    /// Looks up a single live item.
    fn get(&mut self, id: ItemId) -> Result<Option<Item>>;

    /// Lists trash snapshots, newest first.
    fn trashed(&mut self) -> Result<Vec<TrashItem>>;
}

/// Rejects items with a blank title or content.
pub(crate) fn validate(item: &Item) -> Result<()> {
    if item.title.trim().is_empty() {
        return Err(StoreError::InvalidItem("title cannot be empty"));
    }
    if item.content.trim().is_empty() {
        return Err(StoreError::InvalidItem("content cannot be empty"));
    }
    Ok(())
}

/// Current time at the one-second resolution stored in the database.
pub(crate) fn write_timestamp() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}

/// SQLite-backed [`ItemStore`].
///
/// # Examples
///
/// ```
/// use recap::{Item, ItemStore, SqliteItemStore};
///
/// # fn main() -> recap::Result<()> {
/// let mut store = SqliteItemStore::in_memory()?;
///
/// let item = store.write(Item::new("Standup", "notes from today", ["work", "daily"]))?;
/// assert!(item.id.is_some());
///
/// let found = store.read(&["WORK"])?;
/// assert_eq!(found.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct SqliteItemStore {
    db: Database,
}

impl SqliteItemStore {
    /// Creates a store over an already opened database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens (and if needed creates) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Opens a throwaway in-memory store.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::in_memory()?))
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Releases the connection. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        self.db.close()
    }
}

impl ItemStore for SqliteItemStore {
    fn write(&mut self, mut item: Item) -> Result<Item> {
        validate(&item)?;
        let tags = normalize_tags(&item.tags);
        let now = write_timestamp();

        let id = self.db.with_transaction(|tx| {
            let id = match item.id {
                None => insert_item(tx, &item, now)?,
                Some(id) => {
                    update_item(tx, id, &item, now)?;
                    id
                }
            };
            link_tags(tx, id, &tags)?;
            if item.id.is_some() {
                unlink_stale_tags(tx, id, &tags)?;
            }
            Ok(id)
        })?;

        debug!(item_id = %id, tags = tags.len(), "item written");
        item.id = Some(id);
        item.timestamp = Some(now);
        item.tags = tags;
        Ok(item)
    }

    fn read(&mut self, tags: &[&str]) -> Result<Vec<Item>> {
        let tags = normalize_tags(tags);
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let items = self.db.with_transaction(|tx| {
            let placeholders = vec!["?"; tags.len()].join(", ");
            let query = format!(
                "SELECT DISTINCT i.id, i.title, i.content, i.encrypted, i.updated_at
                 FROM items i
                 JOIN item_tags it ON it.item_id = i.id
                 JOIN tags t ON t.id = it.tag_id
                 WHERE t.title_key IN ({placeholders})
                 ORDER BY i.id"
            );

            let keys = tags.iter().map(|tag| Tag::key(tag));
            let mut stmt = tx.prepare(&query)?;
            let rows = stmt.query_map(params_from_iter(keys), item_from_row)?;
            let mut items = Vec::new();
            for row_result in rows {
                items.push(row_result?);
            }

            // Full tag set per item, not just the tags that matched.
            for item in &mut items {
                if let Some(id) = item.id {
                    item.tags = tag_titles(tx, id)?;
                }
            }
            Ok(items)
        })?;

        debug!(queried = tags.len(), found = items.len(), "items read");
        Ok(items)
    }

    fn trash(&mut self, item: &Item) -> Result<TrashItem> {
        let id = item
            .id
            .ok_or(StoreError::InvalidItem("item has not been written"))?;
        let now = write_timestamp();

        let trashed = self.db.with_transaction(|tx| {
            let stored = load_item(tx, id)?.ok_or(StoreError::NotFound(id))?;
            let tags = TrashItem::flatten_tags(&stored.tags);

            tx.execute(
                "INSERT INTO trash_items (title, content, tags, encrypted, trashed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    stored.title,
                    stored.content,
                    tags,
                    stored.encrypted,
                    now.unix_timestamp()
                ],
            )?;
            let trash_id = tx.last_insert_rowid();

            // Links first: the foreign key on item_tags.item_id is enforced.
            tx.execute("DELETE FROM item_tags WHERE item_id = ?1", [id.get()])?;
            tx.execute("DELETE FROM items WHERE id = ?1", [id.get()])?;

            Ok(TrashItem {
                id: trash_id,
                title: stored.title,
                content: stored.content,
                tags,
                encrypted: stored.encrypted,
                trashed_at: now,
            })
        })?;

        debug!(item_id = %id, trash_id = trashed.id, "item trashed");
        Ok(trashed)
    }

    fn tags(&mut self) -> Result<Vec<String>> {
        self.db.with_transaction(|tx| {
            let mut stmt = tx.prepare("SELECT title FROM tags ORDER BY title_key")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut titles = Vec::new();
            for row_result in rows {
                titles.push(row_result?);
            }
            Ok(titles)
        })
    }

    fn get(&mut self, id: ItemId) -> Result<Option<Item>> {
        self.db.with_transaction(|tx| load_item(tx, id))
    }

    fn trashed(&mut self) -> Result<Vec<TrashItem>> {
        self.db.with_transaction(|tx| {
            let mut stmt = tx.prepare(
                "SELECT id, title, content, tags, encrypted, trashed_at
                 FROM trash_items
                 ORDER BY trashed_at DESC, id DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(TrashItem {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    tags: row.get(3)?,
                    encrypted: row.get(4)?,
                    trashed_at: timestamp_from_sql(row.get(5)?, 5)?,
                })
            })?;

            let mut trashed = Vec::new();
            for row_result in rows {
                trashed.push(row_result?);
            }
            Ok(trashed)
        })
    }
}

fn insert_item(conn: &Connection, item: &Item, now: OffsetDateTime) -> Result<ItemId> {
    conn.execute(
        "INSERT INTO items (title, content, encrypted, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![item.title, item.content, item.encrypted, now.unix_timestamp()],
    )?;
    Ok(ItemId::new(conn.last_insert_rowid()))
}

fn update_item(conn: &Connection, id: ItemId, item: &Item, now: OffsetDateTime) -> Result<()> {
    let changed = conn.execute(
        "UPDATE items SET title = ?1, content = ?2, encrypted = ?3, updated_at = ?4 WHERE id = ?5",
        params![
            item.title,
            item.content,
            item.encrypted,
            now.unix_timestamp(),
            id.get()
        ],
    )?;

    if changed == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

/// Gets or creates a tag by title.
///
/// Lookup goes through `title_key`, so it ignores case; a new tag keeps the
/// caller's spelling.
fn get_or_create_tag(conn: &Connection, title: &str) -> Result<Tag> {
    let key = Tag::key(title);
    let existing = conn
        .query_row("SELECT id, title FROM tags WHERE title_key = ?1", [&key], tag_from_row)
        .optional()?;

    if let Some(tag) = existing {
        return Ok(tag);
    }

    conn.execute("INSERT INTO tags (title, title_key) VALUES (?1, ?2)", params![title, key])?;
    debug!(title, "tag created");
    Ok(Tag::new(TagId::new(conn.last_insert_rowid()), title))
}

/// Links each tag to the item unless the link already exists.
fn link_tags(conn: &Connection, item_id: ItemId, tags: &[String]) -> Result<()> {
    for title in tags {
        let tag = get_or_create_tag(conn, title)?;

        let linked: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM item_tags WHERE item_id = ?1 AND tag_id = ?2)",
            [item_id.get(), tag.id().get()],
            |row| row.get(0),
        )?;

        if !linked {
            conn.execute(
                "INSERT INTO item_tags (item_id, tag_id) VALUES (?1, ?2)",
                [item_id.get(), tag.id().get()],
            )?;
        }
    }
    Ok(())
}

/// Deletes links to tags that are no longer in the item's tag set.
///
/// Candidates are collected before any delete runs.
fn unlink_stale_tags(conn: &Connection, item_id: ItemId, tags: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT it.id, t.id, t.title
         FROM item_tags it
         JOIN tags t ON t.id = it.tag_id
         WHERE it.item_id = ?1",
    )?;
    let rows = stmt.query_map([item_id.get()], |row| {
        let link_id: i64 = row.get(0)?;
        let tag = Tag::new(TagId::new(row.get(1)?), row.get::<_, String>(2)?);
        Ok((link_id, tag))
    })?;

    let mut stale = Vec::new();
    for row_result in rows {
        let (link_id, tag) = row_result?;
        if !tags.iter().any(|wanted| tag.matches(wanted)) {
            stale.push(link_id);
        }
    }

    for link_id in &stale {
        conn.execute("DELETE FROM item_tags WHERE id = ?1", [link_id])?;
    }
    if !stale.is_empty() {
        debug!(item_id = %item_id, removed = stale.len(), "stale tag links removed");
    }
    Ok(())
}

fn load_item(conn: &Connection, id: ItemId) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            "SELECT id, title, content, encrypted, updated_at FROM items WHERE id = ?1",
            [id.get()],
            item_from_row,
        )
        .optional()?;

    match item {
        Some(mut item) => {
            item.tags = tag_titles(conn, id)?;
            Ok(Some(item))
        }
        None => Ok(None),
    }
}

fn tag_titles(conn: &Connection, id: ItemId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.title
         FROM tags t
         JOIN item_tags it ON it.tag_id = t.id
         WHERE it.item_id = ?1
         ORDER BY it.id",
    )?;
    let rows = stmt.query_map([id.get()], |row| row.get::<_, String>(0))?;

    let mut titles = Vec::new();
    for row_result in rows {
        titles.push(row_result?);
    }
    Ok(titles)
}

/// Maps `id, title, content, encrypted, updated_at` to an item without tags.
fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let id: i64 = row.get(0)?;
    let title: String = row.get(1)?;
    let content: String = row.get(2)?;
    let encrypted: bool = row.get(3)?;
    let updated_at: i64 = row.get(4)?;

    Ok(ItemBuilder::new()
        .id(ItemId::new(id))
        .title(title)
        .content(content)
        .encrypted(encrypted)
        .timestamp(timestamp_from_sql(updated_at, 4)?)
        .build())
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    let id: i64 = row.get(0)?;
    let title: String = row.get(1)?;
    Ok(Tag::new(TagId::new(id), title))
}

fn timestamp_from_sql(seconds: i64, column: usize) -> rusqlite::Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Integer,
            Box::new(e),
        )
    })
}

#[cfg(test)]
#[path = "store/tests.rs"]
mod tests;

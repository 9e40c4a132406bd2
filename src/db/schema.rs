/// Complete database schema for the item store.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
/// All statements are run in a single transaction.
pub const INITIAL_SCHEMA: &str = r#"
-- Items table: live notes. AUTOINCREMENT keeps ids of trashed items from being reused.
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    encrypted INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL
);

-- Tags table: title keeps the first spelling, title_key is its lowercase fold
-- (computed in Rust, since SQLite's NOCASE and lower() only fold ASCII)
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    title_key TEXT NOT NULL UNIQUE
);

-- Junction table: links items to tags (many-to-many), one row per pair
CREATE TABLE IF NOT EXISTS item_tags (
    id INTEGER PRIMARY KEY,
    item_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    UNIQUE (item_id, tag_id),
    FOREIGN KEY (item_id) REFERENCES items(id),
    FOREIGN KEY (tag_id) REFERENCES tags(id)
);

-- Trash: denormalized snapshots of removed items, no foreign keys
CREATE TABLE IF NOT EXISTS trash_items (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    tags TEXT NOT NULL,
    encrypted INTEGER NOT NULL DEFAULT 0,
    trashed_at INTEGER NOT NULL
);

-- Reverse lookup for tag reads; (item_id, tag_id) is covered by the UNIQUE index
CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag_id);

-- Index for listing the trash newest first
CREATE INDEX IF NOT EXISTS idx_trash_items_trashed ON trash_items(trashed_at);
"#;

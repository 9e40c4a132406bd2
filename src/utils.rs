//! Shared helpers for tag handling and database location.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::Tag;

/// Environment variable overriding the default database location.
pub const DATABASE_ENV: &str = "RECAP_DB";

/// Parses comma-separated tags from a string.
///
/// Splits on commas, trims whitespace from each tag, and filters out empty strings.
///
/// # Examples
///
/// ```
/// use recap::utils::parse_tags;
///
/// let tags = parse_tags("rust, learning, ");
/// assert_eq!(tags, vec!["rust", "learning"]);
/// ```
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Cleans a caller-supplied tag set before it reaches storage.
///
/// Cleans each name with [`Tag::clean_title`] (trimmed, inner whitespace
/// joined with `-`), drops blanks and removes duplicates by [`Tag::key`],
/// keeping the first spelling seen.
///
/// # Examples
///
/// ```
/// use recap::utils::normalize_tags;
///
/// let tags = vec!["Work".to_string(), " work ".to_string(), "".to_string(), "to do".to_string()];
/// assert_eq!(normalize_tags(&tags), vec!["Work", "to-do"]);
/// ```
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|tag| Tag::clean_title(tag.as_ref()))
        .filter(|tag| !tag.is_empty() && seen.insert(tag.to_lowercase()))
        .collect()
}

/// Gets the database path.
///
/// Uses `$RECAP_DB` when set, otherwise `{data_dir}/recap/recap.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// # Errors
///
/// Returns an error if the data directory cannot be determined.
pub fn get_database_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(DATABASE_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("recap").join("recap.db"))
}

/// Ensures the parent directory of the database file exists.
///
/// Creates the directory structure if it doesn't exist using `create_dir_all`.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

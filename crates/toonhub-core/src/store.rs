//! Entry store
//!
//! The `EntryStore` owns the full entry collection in memory and keeps the
//! on-disk snapshot in sync: it hydrates once when opened and re-serializes
//! the whole collection after every successful mutation.
//!
//! ## Hydration
//!
//! A missing snapshot starts an empty store. A snapshot that fails to read
//! or parse also starts an empty store (the unreadable file is moved to a
//! backup first), so startup never fails on bad data.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = EntryStore::open()?;
//!
//! store.add(entry)?;
//! let visible = store.filtered("slayer", CategoryFilter::All);
//! ```

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::models::{Comment, ContentEntry};
use crate::query::{self, CategoryFilter};
use crate::storage::{SnapshotPersistence, StorageError};

/// Display name recorded on comments written without a signed-in identity
pub const GUEST_NAME: &str = "Guest";

/// Errors from entry store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field is missing or malformed
    #[error("validation error: {0}")]
    Validation(String),

    /// No entry with the given id
    #[error("no entry with id '{0}'")]
    NotFound(String),

    /// The snapshot write failed; the mutation is still applied in memory
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Owner of the entry collection
///
/// The store is the only writer of the collection. Mutations take
/// `&mut self`, so read-modify-write sequences are serialized by ownership
/// and no two mutations can interleave on the persisted snapshot.
pub struct EntryStore {
    /// The entry collection, newest first
    entries: Vec<ContentEntry>,
    /// Snapshot persistence handler
    persistence: SnapshotPersistence,
}

impl EntryStore {
    /// Open the store, hydrating from the persisted snapshot
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the store with a specific configuration
    ///
    /// Read or parse failures fall back to an empty collection rather than
    /// failing startup; the unreadable snapshot is kept as a backup.
    pub fn open_with_config(config: Config) -> Result<Self> {
        let persistence = SnapshotPersistence::new(config);

        let entries = match persistence.load() {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(err) => {
                let backup = persistence.backup_corrupt();
                warn!(
                    error = %err,
                    backup = ?backup,
                    "Could not read entry snapshot, starting with an empty collection"
                );
                Vec::new()
            }
        };

        Ok(Self {
            entries,
            persistence,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        self.persistence.config()
    }

    /// All entries, creation order, newest first
    pub fn entries(&self) -> &[ContentEntry] {
        &self.entries
    }

    /// Number of entries in the store
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by id
    pub fn get(&self, id: &str) -> Option<&ContentEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entries matching a search term and category selector
    pub fn filtered(&self, search_term: &str, category: CategoryFilter) -> Vec<&ContentEntry> {
        query::filter(&self.entries, search_term, category)
    }

    /// Add a new entry at the front of the collection
    ///
    /// Fails if the title is blank or no link has a non-blank URL.
    pub fn add(&mut self, entry: ContentEntry) -> Result<(), StoreError> {
        if entry.title.trim().is_empty() {
            return Err(StoreError::Validation(
                "entry title must not be empty".to_string(),
            ));
        }
        if !entry.links.iter().any(|link| !link.url.trim().is_empty()) {
            return Err(StoreError::Validation(
                "entry must have at least one mirror link".to_string(),
            ));
        }

        self.entries.insert(0, entry);
        self.persist()
    }

    /// Record one view of the entry with the given id
    pub fn record_view(&mut self, id: &str) -> Result<(), StoreError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        entry.register_view();
        self.persist()
    }

    /// Append a comment to the entry with the given id
    ///
    /// The comment records the acting display name, falling back to
    /// [`GUEST_NAME`] when none is present. Returns the created comment.
    pub fn append_comment(
        &mut self,
        id: &str,
        author_display_name: Option<&str>,
        text: &str,
    ) -> Result<Comment, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::Validation(
                "comment text must not be empty".to_string(),
            ));
        }

        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let author = author_display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(GUEST_NAME);
        let comment = Comment::new(author, text);
        entry.prepend_comment(comment.clone());

        self.persist()?;
        Ok(comment)
    }

    /// Re-serialize the whole collection to disk
    ///
    /// The in-memory mutation has already been applied when this runs; a
    /// write failure is logged and returned without rolling it back.
    fn persist(&self) -> Result<(), StoreError> {
        if let Err(err) = self.persistence.save(&self.entries) {
            warn!(
                error = %err,
                suggestion = err.recovery_suggestion().unwrap_or(""),
                "Failed to write entry snapshot, keeping the change in memory"
            );
            return Err(StoreError::Storage(err));
        }
        Ok(())
    }
}

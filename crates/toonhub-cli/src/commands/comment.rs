//! Comment command handlers

use anyhow::{Context, Result};

use toonhub_core::EntryStore;

use crate::commands::{auth, entry};
use crate::output::Output;

/// Add a comment to an entry
///
/// Signed-out users may comment; the comment is attributed to "Guest".
pub async fn create(
    store: &mut EntryStore,
    entry_id: String,
    text: String,
    output: &Output,
) -> Result<()> {
    let id = entry::resolve_entry_id(store, &entry_id)?;

    let user = auth::current_user(store.config()).await;
    let author = user.as_ref().map(|u| u.username.as_str());

    let comment = store
        .append_comment(&id, author, &text)
        .context("Failed to add the comment")?;

    output.success(&format!("Commented as {}", comment.user));
    Ok(())
}

/// List comments on an entry
pub fn list(store: &EntryStore, entry_id: String, output: &Output) -> Result<()> {
    let id = entry::resolve_entry_id(store, &entry_id)?;

    let entry = store
        .get(&id)
        .ok_or_else(|| anyhow::anyhow!("Entry not found: {}", id))?;
    output.print_comments(entry);
    Ok(())
}

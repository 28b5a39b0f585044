//! Entry command handlers

use anyhow::{bail, Context, Result};
use clap::Args;

use toonhub_core::{
    Category, CategoryFilter, Config, ContentAutofill, EntryStore, GeminiAutofill, ShortLink,
    SubmissionForm,
};

use crate::commands::auth;
use crate::output::Output;

/// Arguments for `entry create`
#[derive(Args)]
pub struct CreateArgs {
    /// Entry title
    pub title: String,

    /// Category (anime, cartoon, app, game)
    #[arg(short, long, default_value = "anime")]
    pub category: String,

    /// Download mirror, as URL or LABEL=URL (repeatable)
    #[arg(short, long = "link")]
    pub links: Vec<String>,

    /// Comma-separated tags
    #[arg(short, long)]
    pub tags: Option<String>,

    /// Description text
    #[arg(short, long)]
    pub description: Option<String>,

    /// Thumbnail URL
    #[arg(long)]
    pub thumbnail: Option<String>,

    /// Safety rating (safe, caution, unknown)
    #[arg(long)]
    pub safety: Option<String>,

    /// Draft description, tags, and thumbnail with AI
    #[arg(long)]
    pub autofill: bool,
}

/// Share a new entry
pub async fn create(store: &mut EntryStore, args: CreateArgs, output: &Output) -> Result<()> {
    let category: Category = args
        .category
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut form = SubmissionForm::new(args.title, category);

    if let Some(description) = args.description {
        form.description = description;
    }
    if let Some(thumbnail) = args.thumbnail {
        form.thumbnail_url = thumbnail;
    }
    if let Some(tags) = args.tags {
        form.tags_field = tags;
    }
    if let Some(safety) = args.safety {
        form.safety_rating = safety.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    for raw in &args.links {
        form.links.push(parse_link_arg(raw));
    }

    let user = auth::current_user(store.config()).await;
    if user.is_none() {
        bail!("You need to sign in to share a mirror. Run `toonhub login --email <email>` first.");
    }

    if args.autofill {
        run_autofill(&mut form, store.config(), output).await?;
    }

    let entry = form.submit(user.as_ref())?;
    let id = entry.id.clone();

    store.add(entry).context("Failed to share the entry")?;

    output.success(&format!("Shared entry: {}", id));
    if let Some(entry) = store.get(&id) {
        output.print_entry(entry);
    }

    Ok(())
}

/// List entries, filtered by search term and category
pub fn list(
    store: &EntryStore,
    search: Option<String>,
    category: String,
    output: &Output,
) -> Result<()> {
    let category: CategoryFilter = category.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let term = search.unwrap_or_default();

    let hits = store.filtered(&term, category);
    output.print_entries(&hits);
    Ok(())
}

/// Show a single entry and record the view
pub fn show(store: &mut EntryStore, id: String, output: &Output) -> Result<()> {
    let id = resolve_entry_id(store, &id)?;

    store.record_view(&id).context("Failed to record the view")?;

    let entry = store
        .get(&id)
        .ok_or_else(|| anyhow::anyhow!("Entry not found: {}", id))?;
    output.print_entry(entry);
    Ok(())
}

/// Draft metadata with the configured AI model
///
/// A missing API key is a hard error; a failed generation degrades to the
/// fields as entered.
async fn run_autofill(form: &mut SubmissionForm, config: &Config, output: &Output) -> Result<()> {
    form.begin_autofill()?;

    let autofill = match GeminiAutofill::from_config(config) {
        Ok(client) => client,
        Err(err) => {
            form.autofill_failed();
            bail!("Autofill is unavailable: {}", err);
        }
    };

    output.message("Drafting description, tags, and thumbnail...");

    match autofill.generate(&form.title, form.category).await {
        Ok(suggestion) => {
            form.apply_autofill(suggestion);
            output.message("Autofill applied.");
        }
        Err(err) => {
            form.autofill_failed();
            if !output.is_quiet() {
                eprintln!(
                    "⚠ Autofill failed: {}. Continuing with the fields as entered.",
                    err
                );
            }
        }
    }

    Ok(())
}

/// Parse a --link argument: either a bare URL or LABEL=URL
///
/// A blank label is fine; display falls back to "Server N".
pub(crate) fn parse_link_arg(raw: &str) -> ShortLink {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return ShortLink::new("", raw);
    }
    match raw.split_once('=') {
        Some((label, url)) => ShortLink::new(label.trim(), url.trim()),
        None => ShortLink::new("", raw),
    }
}

/// Resolve an entry ID (supports full ID or prefix)
pub(crate) fn resolve_entry_id(store: &EntryStore, id: &str) -> Result<String> {
    if store.get(id).is_some() {
        return Ok(id.to_string());
    }

    let matches: Vec<_> = store
        .entries()
        .iter()
        .filter(|e| e.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No entry found matching: {}", id),
        1 => Ok(matches[0].id.clone()),
        _ => {
            eprintln!("Multiple entries match '{}':", id);
            for entry in &matches {
                eprintln!("  {} - {}", entry.id, entry.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use toonhub_core::ContentEntry;

    fn test_store(temp_dir: &TempDir) -> EntryStore {
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        EntryStore::open_with_config(config).unwrap()
    }

    fn sample_entry(title: &str) -> ContentEntry {
        let mut entry = ContentEntry::new(title, Category::Anime, "u-1", "erin");
        entry
            .links
            .push(ShortLink::new("", "https://drive.google.com/file/d/abc"));
        entry
    }

    #[test]
    fn test_parse_link_arg_bare_url() {
        let link = parse_link_arg("https://drive.google.com/file/d/abc");
        assert_eq!(link.label, "");
        assert_eq!(link.url, "https://drive.google.com/file/d/abc");
    }

    #[test]
    fn test_parse_link_arg_labeled() {
        let link = parse_link_arg("Mirror 2=https://drive.google.com/file/d/xyz");
        assert_eq!(link.label, "Mirror 2");
        assert_eq!(link.url, "https://drive.google.com/file/d/xyz");
    }

    #[test]
    fn test_parse_link_arg_keeps_equals_in_url() {
        let link = parse_link_arg("Mirror=https://drive.google.com/open?id=abc");
        assert_eq!(link.label, "Mirror");
        assert_eq!(link.url, "https://drive.google.com/open?id=abc");
    }

    #[test]
    fn test_resolve_entry_id_by_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        store.add(sample_entry("Demon Slayer")).unwrap();
        let full_id = store.entries()[0].id.clone();

        let resolved = resolve_entry_id(&store, &full_id[..8]).unwrap();
        assert_eq!(resolved, full_id);
    }

    #[test]
    fn test_resolve_entry_id_unknown() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        let result = resolve_entry_id(&store, "zzzz");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_entry_id_ambiguous() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = test_store(&temp_dir);
        store.add(sample_entry("First")).unwrap();
        store.add(sample_entry("Second")).unwrap();

        // The empty prefix matches both entries
        let result = resolve_entry_id(&store, "");
        assert!(result.is_err());
    }
}

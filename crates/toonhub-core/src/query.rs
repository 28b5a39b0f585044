//! Entry filtering
//!
//! Derives the visible subset of entries from a free-text search term and a
//! category selector. Pure functions over the collection: no ranking or
//! scoring, the input order is preserved.

use crate::models::{Category, ContentEntry};

/// Category selector for browsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Match every category
    #[default]
    All,
    /// Match one specific category
    Only(Category),
}

impl CategoryFilter {
    /// Whether an entry passes this selector
    pub fn matches(self, entry: &ContentEntry) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => entry.category == category,
        }
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "All"),
            CategoryFilter::Only(category) => write!(f, "{}", category),
        }
    }
}

impl std::str::FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse::<Category>().map(CategoryFilter::Only).map_err(|_| {
            format!(
                "unknown category filter '{}' (expected all, anime, cartoon, app, or game)",
                s.trim()
            )
        })
    }
}

/// Select the entries matching a search term and category
///
/// The term matches case-insensitively against the title or any tag; the
/// empty term matches everything. The result is a subsequence of `entries`.
pub fn filter<'a>(
    entries: &'a [ContentEntry],
    search_term: &str,
    category: CategoryFilter,
) -> Vec<&'a ContentEntry> {
    let term = search_term.to_lowercase();

    entries
        .iter()
        .filter(|entry| matches_term(entry, &term) && category.matches(entry))
        .collect()
}

/// Case-insensitive substring match on title or any tag
///
/// `term` must already be lowercased. The empty term matches everything.
fn matches_term(entry: &ContentEntry, term: &str) -> bool {
    entry.title.to_lowercase().contains(term)
        || entry.tags.iter().any(|tag| tag.to_lowercase().contains(term))
}

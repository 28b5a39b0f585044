//! Data models for ToonHub
//!
//! Defines the core data structures: ContentEntry, Comment, and ShortLink.
//! Serialized field names (camelCase) and millisecond timestamps match the
//! snapshot layout this app has always written, so old snapshots load
//! without migration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder rating assigned at creation; no vote mechanism exists yet
pub const DEFAULT_RATING: f64 = 4.5;

/// Generate an opaque id for entries and comments
pub fn fresh_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Content category for an entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Category {
    Anime,
    Cartoon,
    App,
    Game,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Anime => "Anime",
            Category::Cartoon => "Cartoon",
            Category::App => "App",
            Category::Game => "Game",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anime" => Ok(Category::Anime),
            "cartoon" => Ok(Category::Cartoon),
            "app" => Ok(Category::App),
            "game" => Ok(Category::Game),
            other => Err(format!(
                "unknown category '{}' (expected anime, cartoon, app, or game)",
                other
            )),
        }
    }
}

/// Community-facing content-risk label
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SafetyRating {
    Safe,
    Caution,
    Unknown,
}

impl std::fmt::Display for SafetyRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SafetyRating::Safe => "Safe",
            SafetyRating::Caution => "Caution",
            SafetyRating::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for SafetyRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "safe" => Ok(SafetyRating::Safe),
            "caution" => Ok(SafetyRating::Caution),
            "unknown" => Ok(SafetyRating::Unknown),
            other => Err(format!(
                "unknown safety rating '{}' (expected safe, caution, or unknown)",
                other
            )),
        }
    }
}

/// A mirror location for an entry's content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortLink {
    /// Display label, may be empty
    pub label: String,
    /// The mirror URL
    pub url: String,
}

impl ShortLink {
    /// Create a new mirror link
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    /// Label to show for this link, falling back to "Server N" (1-based)
    pub fn display_label(&self, index: usize) -> String {
        if self.label.trim().is_empty() {
            format!("Server {}", index + 1)
        } else {
            self.label.clone()
        }
    }
}

/// A comment on an entry
///
/// Immutable once created. `user` is a display-name snapshot taken at
/// creation time, not a live reference to an identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    /// Unique identifier
    pub id: String,
    /// Display name of the commenter at the time of writing
    pub user: String,
    /// Comment body
    pub text: String,
    /// When this comment was written
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment with a fresh id and the current time
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            user: user.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A single shared piece of content with metadata, mirrors, and comments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    /// Unique identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Content category
    pub category: Category,
    /// Card image URL
    pub thumbnail_url: String,
    /// Tags for search, ordered, duplicates allowed
    pub tags: Vec<String>,
    /// Mirror links, validated against the trusted host at submission
    pub links: Vec<ShortLink>,
    /// Identity id of the submitter, copied at creation
    pub author_id: String,
    /// Display name of the submitter, copied at creation
    pub author_name: String,
    /// When this entry was created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Community rating
    pub rating: f64,
    /// View counter, only ever increments
    pub views: u64,
    /// Comments, newest first
    pub comments: Vec<Comment>,
    /// Content-risk label; absent on entries from older snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_rating: Option<SafetyRating>,
}

impl ContentEntry {
    /// Create a new entry with the given title, category, and author
    pub fn new(
        title: impl Into<String>,
        category: Category,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
    ) -> Self {
        Self {
            id: fresh_id(),
            title: title.into(),
            description: String::new(),
            category,
            thumbnail_url: String::new(),
            tags: Vec::new(),
            links: Vec::new(),
            author_id: author_id.into(),
            author_name: author_name.into(),
            created_at: Utc::now(),
            rating: DEFAULT_RATING,
            views: 0,
            comments: Vec::new(),
            safety_rating: None,
        }
    }

    /// Record one view of this entry
    pub fn register_view(&mut self) {
        self.views += 1;
    }

    /// Insert a comment at the front (newest first)
    pub fn prepend_comment(&mut self, comment: Comment) {
        self.comments.insert(0, comment);
    }
}

//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use toonhub_core::ContentEntry;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single entry in full (links, tags, comments)
    pub fn print_entry(&self, entry: &ContentEntry) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", entry.id);
                println!("Title:       {}", entry.title);
                println!("Category:    {}", entry.category);
                println!("Author:      {}", entry.author_name);
                println!("Rating:      {:.1}", entry.rating);
                println!("Views:       {}", entry.views);
                if let Some(safety) = entry.safety_rating {
                    println!("Safety:      {}", safety);
                }
                if !entry.tags.is_empty() {
                    println!("Tags:        {}", entry.tags.join(", "));
                }
                if !entry.description.is_empty() {
                    println!("Description: {}", truncate_line(&entry.description, 70));
                }
                println!("Shared:      {}", entry.created_at.format("%Y-%m-%d %H:%M"));

                if !entry.links.is_empty() {
                    println!();
                    println!("── Mirrors ({}) ──", entry.links.len());
                    for (index, link) in entry.links.iter().enumerate() {
                        println!("{}: {}", link.display_label(index), link.url);
                    }
                }

                if !entry.comments.is_empty() {
                    println!();
                    println!("── Comments ({}) ──", entry.comments.len());
                    for comment in &entry.comments {
                        println!(
                            "[{}] {}: {}",
                            comment.timestamp.format("%Y-%m-%d"),
                            comment.user,
                            truncate_line(&comment.text, 60)
                        );
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(entry).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", entry.id);
            }
        }
    }

    /// Print a list of entries
    pub fn print_entries(&self, entries: &[&ContentEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No entries found.");
                    return;
                }
                for entry in entries {
                    let comments_indicator = if entry.comments.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", entry.comments.len())
                    };
                    println!(
                        "{} | {}{} | {} | {} view(s)",
                        short_id(&entry.id),
                        truncate(&entry.title, 35),
                        comments_indicator,
                        entry.category,
                        entry.views
                    );
                }
                println!("\n{} entry(ies)", entries.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(entries).unwrap());
            }
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.id);
                }
            }
        }
    }

    /// Print comments for a specific entry
    pub fn print_comments(&self, entry: &ContentEntry) {
        match self.format {
            OutputFormat::Human => {
                println!("Comments on: {} - {}", short_id(&entry.id), entry.title);
                println!();

                if entry.comments.is_empty() {
                    println!("No comments on this entry.");
                    return;
                }

                for comment in &entry.comments {
                    println!("────────────────────────────────────────");
                    println!(
                        "{}  {}",
                        comment.user,
                        comment.timestamp.format("%Y-%m-%d %H:%M")
                    );
                    println!();
                    println!("{}", comment.text);
                    println!();
                }
                println!("{} comment(s)", entry.comments.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&entry.comments).unwrap());
            }
            OutputFormat::Quiet => {
                for comment in &entry.comments {
                    println!("{}", comment.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// First 8 characters of an id, or all of it when shorter
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Truncate a string to max length in bytes, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        // The cut must land on a character boundary
        let mut cut = max_len.saturating_sub(3);
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &s[..cut])
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

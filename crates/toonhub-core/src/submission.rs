//! Submission pipeline
//!
//! Validates and normalizes a new-entry form and builds the `ContentEntry`
//! handed to the store. The form is a small state machine so an AI-autofill
//! request in flight cannot race a submit or a second autofill request.

use thiserror::Error;

use crate::autofill::AutofillSuggestion;
use crate::models::{Category, ContentEntry, SafetyRating, ShortLink};
use crate::session::User;

/// Host substring every mirror URL must contain
pub const TRUSTED_MIRROR_HOST: &str = "drive.google.com";

/// Thumbnail used when the form leaves the cover image blank
pub const PLACEHOLDER_THUMBNAIL: &str =
    "https://images.unsplash.com/photo-1560972550-aba3456b5564?auto=format&fit=crop&q=80&w=400";

/// Stock image used for AI-suggested thumbnails; the keyword is appended
const SUGGESTED_THUMBNAIL_BASE: &str =
    "https://images.unsplash.com/photo-1578632738981-4330ce5b5022?auto=format&fit=crop&q=80&w=400";

/// Errors from building or autofilling a submission
#[derive(Error, Debug, PartialEq)]
pub enum SubmitError {
    /// Submitting requires a signed-in identity
    #[error("sign in to share a mirror")]
    AuthRequired,

    /// The title field is blank
    #[error("a title is required")]
    TitleRequired,

    /// No link remains after dropping blank URLs
    #[error("at least one mirror link is required")]
    NoLinks,

    /// A link points outside the trusted mirror host
    #[error("mirror '{0}' is not a Google Drive link")]
    UntrustedLink(String),

    /// An autofill request is already outstanding
    #[error("an autofill request is already in flight")]
    AutofillInFlight,

    /// The form was already submitted and is closed
    #[error("this form was already submitted")]
    AlreadySubmitted,
}

/// Lifecycle of a submission form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// Fields are editable, nothing pending
    Editing,
    /// An autofill request is outstanding; field edits stay allowed
    AutofillPending,
    /// Terminal: the entry was built and handed to the store
    Submitted,
}

/// An in-progress entry submission
///
/// Fields are edited freely; `submit` runs the validation pipeline and
/// builds the entry. Autofill only ever touches this form, never the store.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    /// Entry title
    pub title: String,
    /// Entry category
    pub category: Category,
    /// Free-text description
    pub description: String,
    /// Cover image URL; blank falls back to [`PLACEHOLDER_THUMBNAIL`]
    pub thumbnail_url: String,
    /// Mirror links as typed; blank URLs are dropped at submit
    pub links: Vec<ShortLink>,
    /// Comma-separated tags as typed
    pub tags_field: String,
    /// Community safety label
    pub safety_rating: SafetyRating,
    state: FormState,
}

impl SubmissionForm {
    /// Create a form for the given title and category
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            category,
            description: String::new(),
            thumbnail_url: String::new(),
            links: Vec::new(),
            tags_field: String::new(),
            safety_rating: SafetyRating::Unknown,
            state: FormState::Editing,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> FormState {
        self.state
    }

    /// Mark an autofill request as started
    ///
    /// Requires a title, and rejects a second request while one is
    /// outstanding.
    pub fn begin_autofill(&mut self) -> Result<(), SubmitError> {
        match self.state {
            FormState::Submitted => Err(SubmitError::AlreadySubmitted),
            FormState::AutofillPending => Err(SubmitError::AutofillInFlight),
            FormState::Editing => {
                if self.title.trim().is_empty() {
                    return Err(SubmitError::TitleRequired);
                }
                self.state = FormState::AutofillPending;
                Ok(())
            }
        }
    }

    /// Apply a completed autofill suggestion
    ///
    /// Overwrites description, tags, thumbnail, and safety rating with the
    /// generated values and makes the form editable again.
    pub fn apply_autofill(&mut self, suggestion: AutofillSuggestion) {
        self.description = suggestion.description;
        self.tags_field = suggestion.tags.join(", ");
        self.thumbnail_url = suggested_thumbnail_url(&suggestion.suggested_thumbnail);
        self.safety_rating = suggestion.safety_rating;
        if self.state == FormState::AutofillPending {
            self.state = FormState::Editing;
        }
    }

    /// Record an autofill failure, leaving every field untouched
    pub fn autofill_failed(&mut self) {
        if self.state == FormState::AutofillPending {
            self.state = FormState::Editing;
        }
    }

    /// Validate the form and build the entry
    ///
    /// Checks run in user-facing order: identity, title, links, tags. On
    /// success the form closes (terminal state); on failure it stays
    /// editable with the error returned.
    pub fn submit(&mut self, acting_user: Option<&User>) -> Result<ContentEntry, SubmitError> {
        match self.state {
            FormState::Submitted => return Err(SubmitError::AlreadySubmitted),
            FormState::AutofillPending => return Err(SubmitError::AutofillInFlight),
            FormState::Editing => {}
        }

        let user = acting_user.ok_or(SubmitError::AuthRequired)?;

        if self.title.trim().is_empty() {
            return Err(SubmitError::TitleRequired);
        }

        let links: Vec<ShortLink> = self
            .links
            .iter()
            .filter(|link| !link.url.trim().is_empty())
            .cloned()
            .collect();
        if links.is_empty() {
            return Err(SubmitError::NoLinks);
        }
        if let Some(bad) = links.iter().find(|link| !is_trusted_mirror(&link.url)) {
            return Err(SubmitError::UntrustedLink(bad.url.clone()));
        }

        let mut entry = ContentEntry::new(
            self.title.clone(),
            self.category,
            user.id.as_str(),
            user.username.as_str(),
        );
        entry.description = self.description.clone();
        entry.thumbnail_url = if self.thumbnail_url.trim().is_empty() {
            PLACEHOLDER_THUMBNAIL.to_string()
        } else {
            self.thumbnail_url.clone()
        };
        entry.tags = parse_tags(&self.tags_field);
        entry.links = links;
        entry.safety_rating = Some(self.safety_rating);

        self.state = FormState::Submitted;
        Ok(entry)
    }
}

/// Whether a URL points at the trusted mirror host
pub fn is_trusted_mirror(url: &str) -> bool {
    url.contains(TRUSTED_MIRROR_HOST)
}

/// Parse the comma-separated tags field
///
/// Pieces are trimmed, empties dropped, order preserved, duplicates kept.
pub fn parse_tags(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Thumbnail URL for an AI-suggested keyword
pub fn suggested_thumbnail_url(keyword: &str) -> String {
    format!("{}&q={}", SUGGESTED_THUMBNAIL_BASE, keyword)
}

//! ToonHub Core Library
//!
//! This crate provides the core functionality for ToonHub, a community hub
//! for sharing and discovering animated content, apps, and games.
//!
//! # Architecture
//!
//! - **Snapshot store**: entries live in memory and are persisted as a
//!   single JSON snapshot after every mutation
//! - **Hosted identity**: sign-in state comes from a GoTrue-style provider
//!   behind the `IdentityProvider` trait
//! - **AI autofill**: submission metadata can be drafted by a generative
//!   model behind the `ContentAutofill` trait
//!
//! All queries are served directly from the in-memory entry list.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = EntryStore::open()?;
//!
//! // Share a mirror
//! let mut entry = ContentEntry::new("Space Rangers", Category::Cartoon, "u-1", "erin");
//! entry.links.push(ShortLink::new("Mirror 1", "https://drive.google.com/file/d/abc"));
//! store.add(entry)?;
//!
//! // Browse
//! let hits = store.filtered("space", CategoryFilter::All);
//! ```
//!
//! # Modules
//!
//! - `store`: entry collection with persistence (main entry point)
//! - `models`: data structures for entries, links, and comments
//! - `query`: search and category filtering
//! - `submission`: share-form state machine and validation
//! - `autofill`: AI-assisted metadata drafting
//! - `session`: identity provider client and session tracking
//! - `storage`: JSON snapshot persistence
//! - `config`: application configuration

pub mod autofill;
pub mod config;
pub mod models;
pub mod query;
pub mod session;
pub mod storage;
pub mod store;
pub mod submission;

pub use autofill::{AutofillError, AutofillSuggestion, ContentAutofill, GeminiAutofill};
pub use config::Config;
pub use models::{Category, Comment, ContentEntry, SafetyRating, ShortLink};
pub use query::{filter, CategoryFilter};
pub use session::{
    HostedAuthClient, IdentityProvider, ProviderSession, SessionChange, SessionError,
    SessionManager, SignUpOutcome, User,
};
pub use storage::{SnapshotPersistence, StorageError};
pub use store::{EntryStore, StoreError};
pub use submission::{FormState, SubmissionForm, SubmitError};

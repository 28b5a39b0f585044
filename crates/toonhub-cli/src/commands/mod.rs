//! Command handlers

pub mod auth;
pub mod comment;
pub mod config;
pub mod entry;
pub mod status;

//! Status command handler

use anyhow::Result;

use toonhub_core::EntryStore;

use crate::commands::auth;
use crate::output::{Output, OutputFormat};

/// Show store and session status
pub async fn show(store: &EntryStore, output: &Output) -> Result<()> {
    let config = store.config();
    let user = auth::current_user(config).await;

    let auth_configured = config.auth_url.is_some() && config.auth_anon_key.is_some();
    let autofill_configured = config.ai_api_key.is_some();
    let snapshot_exists = config.entries_path().exists();

    let comment_count: usize = store.entries().iter().map(|e| e.comments.len()).sum();
    let view_total: u64 = store.entries().iter().map(|e| e.views).sum();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "session": {
                        "signed_in": user.is_some(),
                        "username": user.as_ref().map(|u| u.username.clone())
                    },
                    "services": {
                        "auth_configured": auth_configured,
                        "autofill_configured": autofill_configured
                    },
                    "storage": {
                        "data_dir": config.data_dir,
                        "snapshot_exists": snapshot_exists
                    },
                    "counts": {
                        "entries": store.len(),
                        "comments": comment_count,
                        "views": view_total
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", store.len());
        }
        OutputFormat::Human => {
            println!("ToonHub Status");
            println!("==============");
            println!();
            println!("Session:");
            match &user {
                Some(user) => println!("  Signed in as {}", user.username),
                None => println!("  Not signed in"),
            }
            println!();
            println!("Services:");
            println!(
                "  Auth:     {}",
                if auth_configured {
                    "configured"
                } else {
                    "not configured"
                }
            );
            println!(
                "  Autofill: {}",
                if autofill_configured {
                    "configured"
                } else {
                    "not configured"
                }
            );
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!(
                "  Snapshot: {}",
                if snapshot_exists { "present" } else { "none yet" }
            );
            println!();
            println!("Contents:");
            println!("  Entries:  {}", store.len());
            println!("  Comments: {}", comment_count);
            println!("  Views:    {}", view_total);
        }
    }

    Ok(())
}

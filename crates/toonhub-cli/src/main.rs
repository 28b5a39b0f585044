//! ToonHub CLI
//!
//! Command-line interface for ToonHub - community content sharing.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use toonhub_core::EntryStore;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "toonhub")]
#[command(about = "ToonHub - share and discover animated content, apps, and games")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage entries
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Sign in to your account
    Login {
        /// Email address (prompts for the password)
        #[arg(long, conflicts_with_all = ["github", "token"])]
        email: Option<String>,
        /// Start a GitHub sign-in in the browser
        #[arg(long, conflicts_with = "token")]
        github: bool,
        /// Complete an external sign-in with its access token
        #[arg(long)]
        token: Option<String>,
    },
    /// Create an account
    Signup {
        /// Email address (prompts for the password)
        #[arg(long)]
        email: String,
    },
    /// Sign out of the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show store and session status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum EntryCommands {
    /// Share a new entry
    #[command(alias = "add")]
    Create(commands::entry::CreateArgs),
    /// List entries
    #[command(alias = "ls")]
    List {
        /// Search in titles and tags
        #[arg(short, long)]
        search: Option<String>,
        /// Filter by category (anime, cartoon, app, game, or "all")
        #[arg(short, long, default_value = "all")]
        category: String,
    },
    /// Show entry details (records a view)
    Show {
        /// Entry ID (full or prefix)
        id: String,
    },
    /// Manage comments on an entry
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },
}

#[derive(Subcommand)]
enum CommentCommands {
    /// Add a comment to an entry
    #[command(alias = "add")]
    Create {
        /// Entry ID (full or prefix)
        entry_id: String,
        /// Comment text
        text: String,
    },
    /// List comments on an entry
    #[command(alias = "ls")]
    List {
        /// Entry ID (full or prefix)
        entry_id: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, auth_url, auth_anon_key, ai_api_key, ai_model)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match cli.command {
        Commands::Entry { command } => handle_entry_command(command, &output).await,
        Commands::Login {
            email,
            github,
            token,
        } => commands::auth::login(email, github, token, &output).await,
        Commands::Signup { email } => commands::auth::signup(email, &output).await,
        Commands::Logout => commands::auth::logout(&output).await,
        Commands::Whoami => commands::auth::whoami(&output).await,
        Commands::Status => {
            let store = EntryStore::open()?;
            commands::status::show(&store, &output).await
        }
        Commands::Config { command } => handle_config_command(command, &output),
    }
}

async fn handle_entry_command(command: EntryCommands, output: &Output) -> Result<()> {
    let mut store = EntryStore::open()?;

    match command {
        EntryCommands::Create(args) => commands::entry::create(&mut store, args, output).await,
        EntryCommands::List { search, category } => {
            commands::entry::list(&store, search, category, output)
        }
        EntryCommands::Show { id } => commands::entry::show(&mut store, id, output),
        EntryCommands::Comment { command } => match command {
            CommentCommands::Create { entry_id, text } => {
                commands::comment::create(&mut store, entry_id, text, output).await
            }
            CommentCommands::List { entry_id } => {
                commands::comment::list(&store, entry_id, output)
            }
        },
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
        Some(ConfigCommands::Path) => commands::config::path(),
    }
}

/// Initialize logging to stderr
///
/// Only active when the TOONHUB_LOG environment variable is set, so normal
/// command output stays clean.
fn init_logging() {
    let Ok(log_level) = std::env::var("TOONHUB_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!("toonhub_core={},toonhub={}", log_level, log_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

//! caremind CLI — the main entry point.
//!
//! Commands:
//! - `chat`         — Converse with the assistant (one-shot or interactive)
//! - `specialist`   — Ask the specialist-matching engine for a referral
//! - `ingest`       — Index a document for retrieval
//! - `conversations`— List, show, or delete stored conversations

use clap::{Parser, Subcommand};

mod commands;
mod runtime;

#[derive(Parser)]
#[command(
    name = "caremind",
    about = "caremind — conversational healthcare assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Continue an existing conversation
        #[arg(short, long)]
        conversation: Option<String>,

        /// User the conversation belongs to
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Ask for a specialist recommendation
    Specialist {
        /// The symptom or request to match against
        query: String,

        /// Reuse an existing session for repeat-query deduplication
        #[arg(short, long)]
        session: Option<String>,

        /// User email the session belongs to
        #[arg(short, long, default_value = "local@caremind")]
        email: String,

        /// Print the raw reply as JSON instead of formatted cards
        #[arg(long)]
        json: bool,
    },

    /// Chunk, embed, and index a document for retrieval
    Ingest {
        /// Path to a plain-text document
        path: std::path::PathBuf,

        /// Document id (defaults to the file stem)
        #[arg(short, long)]
        id: Option<String>,

        /// User the document belongs to
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Inspect stored conversations
    Conversations {
        #[command(subcommand)]
        action: commands::conversations::Action,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat {
            message,
            conversation,
            user,
        } => commands::chat::run(message, conversation, &user).await?,
        Commands::Specialist {
            query,
            session,
            email,
            json,
        } => commands::specialist::run(&query, session, &email, json).await?,
        Commands::Ingest { path, id, user } => commands::ingest::run(&path, id, &user).await?,
        Commands::Conversations { action } => commands::conversations::run(action).await?,
    }

    Ok(())
}

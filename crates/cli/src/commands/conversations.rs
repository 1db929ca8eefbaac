//! `caremind conversations` — List, show, and delete stored conversations.

use crate::runtime::{self, CliError};
use caremind_core::message::{ConversationId, Role};
use caremind_engine::StateManager;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Action {
    /// List a user's conversations, newest first
    List {
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Print a conversation transcript
    Show { id: String },

    /// Delete a conversation
    Delete { id: String },
}

pub async fn run(action: Action) -> Result<(), CliError> {
    let config = runtime::load_config()?;
    let (conversations, _sessions) = runtime::build_stores(&config).await?;
    let state = StateManager::new(conversations);

    match action {
        Action::List { user } => {
            let summaries = state.list_for_user(&user).await?;
            if summaries.is_empty() {
                println!("  No conversations for {user}");
                return Ok(());
            }
            for summary in summaries {
                println!(
                    "  {}  {}  {}",
                    summary.id,
                    summary.created_at.format("%Y-%m-%d %H:%M"),
                    summary.title.as_deref().unwrap_or("(untitled)"),
                );
            }
        }
        Action::Show { id } => {
            let history = state.get_history(&ConversationId::from(id)).await?;
            for message in history {
                let role = match message.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => "system",
                };
                println!("  {role}: {}", message.content.flatten());
            }
        }
        Action::Delete { id } => {
            let id = ConversationId::from(id);
            state.delete(&id).await?;
            println!("  Deleted {id}");
        }
    }

    Ok(())
}

//! `caremind chat` — Interactive or single-message chat mode.

use crate::runtime::{self, CliError};
use caremind_core::message::{ConversationId, Message};
use caremind_engine::ChatOrchestrator;
use std::io::{BufRead, Write};

pub async fn run(
    message: Option<String>,
    conversation: Option<String>,
    user: &str,
) -> Result<(), CliError> {
    let config = runtime::load_config()?;

    let provider = runtime::build_provider(&config)?;
    let index = runtime::build_index(&config)?;
    let (conversations, _sessions) = runtime::build_stores(&config).await?;
    let config_source = runtime::build_config_source(&config);

    let orchestrator = ChatOrchestrator::new(provider, index, conversations, config_source)
        .with_retrieval(config.retrieval.top_k, config.retrieval.keep);

    let mut conversation_id = conversation.map(ConversationId::from);

    if let Some(msg) = message {
        // Single message mode
        let outcome = orchestrator
            .handle_turn(vec![Message::user(msg.as_str())], user, conversation_id)
            .await?;
        println!("{}", outcome.reply);
        eprintln!();
        eprintln!("  [{} — conversation {}]", outcome.chat_title, outcome.conversation_id);
    } else {
        // Interactive mode
        println!();
        println!("  caremind — type your message and press Enter.");
        println!("  Type 'exit' or Ctrl+C to quit.");
        println!();

        let stdin = std::io::stdin();
        print!("  You > ");
        std::io::stdout().flush()?;

        for line in stdin.lock().lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                print!("  You > ");
                std::io::stdout().flush()?;
                continue;
            }
            if trimmed == "exit" {
                break;
            }

            match orchestrator
                .handle_turn(
                    vec![Message::user(trimmed)],
                    user,
                    conversation_id.clone(),
                )
                .await
            {
                Ok(outcome) => {
                    println!();
                    for line in outcome.reply.lines() {
                        println!("  Assistant > {line}");
                    }
                    println!();
                    conversation_id = Some(outcome.conversation_id);
                }
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    println!();
                }
            }

            print!("  You > ");
            std::io::stdout().flush()?;
        }

        println!();
        println!("  Goodbye!");
    }

    // let background turn writes land before the process exits
    orchestrator.wait_idle().await;
    Ok(())
}

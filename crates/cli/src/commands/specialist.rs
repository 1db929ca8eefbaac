//! `caremind specialist` — One specialist-matching query.

use crate::runtime::{self, CliError};
use caremind_core::message::SessionId;
use caremind_engine::SpecialistEngine;

pub async fn run(
    query: &str,
    session: Option<String>,
    email: &str,
    json: bool,
) -> Result<(), CliError> {
    let config = runtime::load_config()?;

    let provider = runtime::build_provider(&config)?;
    let index = runtime::build_index(&config)?;
    let (_conversations, sessions) = runtime::build_stores(&config).await?;
    let config_source = runtime::build_config_source(&config);

    let engine = SpecialistEngine::new(provider, index, sessions, config_source);

    let session_id = match session {
        Some(id) => SessionId::from(id),
        None => engine.start_session(email).await?,
    };

    let reply = engine
        .handle_specialist_query(query, email, &session_id)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        eprintln!("  [session {session_id}]");
        return Ok(());
    }

    println!();
    for card in &reply.specialists {
        println!("  {}", card.response_message);
        if !card.name.is_empty() {
            println!("    Name:           {}", card.name);
            println!("    Specialization: {}", card.specialization);
            println!("    Registration:   {}", card.registration);
            if !card.doctor_description.is_empty() {
                println!("    About:          {}", card.doctor_description);
            }
        }
        println!();
    }
    eprintln!("  [session {session_id} — pass --session to keep follow-ups deduplicated]");

    Ok(())
}

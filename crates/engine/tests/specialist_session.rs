//! Specialist-matching session tests against in-memory backends.

use caremind_core::error::Error;
use caremind_core::message::SessionId;
use caremind_core::model_config::SharedModelConfig;
use caremind_core::reply::{SpecialistCard, SpecialistReply};
use caremind_core::store::{SessionStore, SpecialistQueryEntry};
use caremind_engine::contract::SPECIALIST_ERROR_MESSAGE;
use caremind_engine::specialist::SpecialistEngine;
use caremind_engine::test_helpers::{FailingProvider, SequentialMockProvider};
use caremind_index::InMemoryIndex;
use caremind_store::InMemoryStore;
use chrono::Utc;
use std::sync::Arc;

fn card_json(name: &str) -> String {
    format!(
        r#"{{"specialists":[{{
            "response_message": "{name} can help with that.",
            "Name": "{name}",
            "Specialization": "Orthopedics",
            "Registration": "CRM 12345",
            "Image": "https://example.com/doc.png",
            "doctor_description": "Joint specialist"
        }}]}}"#
    )
}

struct Harness {
    provider: Arc<SequentialMockProvider>,
    sessions: Arc<InMemoryStore>,
    engine: SpecialistEngine,
}

fn harness(responses: Vec<String>) -> Harness {
    let provider = Arc::new(SequentialMockProvider::new(responses));
    let sessions = Arc::new(InMemoryStore::new());
    let engine = SpecialistEngine::new(
        provider.clone(),
        Arc::new(InMemoryIndex::new()),
        sessions.clone(),
        Arc::new(SharedModelConfig::default()),
    );
    Harness {
        provider,
        sessions,
        engine,
    }
}

#[tokio::test]
async fn new_session_starts_empty() {
    let h = harness(vec![]);
    let session = h.engine.start_session("a@b.com").await.unwrap();

    let history = h
        .engine
        .get_session_history("a@b.com", &session)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn missing_session_history_is_not_found() {
    let h = harness(vec![]);
    let err = h
        .engine
        .get_session_history("a@b.com", &SessionId::from("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn query_appends_entry_with_recommendation() {
    let h = harness(vec![card_json("Dr. Silva")]);
    let session = h.engine.start_session("a@b.com").await.unwrap();

    let reply = h
        .engine
        .handle_specialist_query("knee pain after running", "a@b.com", &session)
        .await
        .unwrap();
    assert_eq!(reply.specialists[0].name, "Dr. Silva");

    let history = h
        .engine
        .get_session_history("a@b.com", &session)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].query, "knee pain after running");
    assert_eq!(history[0].recommended, vec!["Dr. Silva"]);
}

#[tokio::test]
async fn similar_query_excludes_previous_recommendation() {
    let h = harness(vec![card_json("Dr. Silva"), card_json("Dr. Prado")]);
    let session = h.engine.start_session("a@b.com").await.unwrap();

    h.engine
        .handle_specialist_query("knee pain after running", "a@b.com", &session)
        .await
        .unwrap();
    h.engine
        .handle_specialist_query(
            "I still have knee pain after running every day",
            "a@b.com",
            &session,
        )
        .await
        .unwrap();

    let requests = h.provider.requests();
    let first_system = requests[0].messages[0].content.flatten();
    let second_system = requests[1].messages[0].content.flatten();
    assert!(!first_system.contains("NOTE:"));
    assert!(second_system.contains("NOTE:"));
    assert!(second_system.contains("Dr. Silva"));
}

#[tokio::test]
async fn unrelated_query_gets_no_exclusion_note() {
    let h = harness(vec![card_json("Dr. Silva"), card_json("Dr. Prado")]);
    let session = h.engine.start_session("a@b.com").await.unwrap();

    h.engine
        .handle_specialist_query("knee pain after running", "a@b.com", &session)
        .await
        .unwrap();
    h.engine
        .handle_specialist_query("itchy skin rash on my arm", "a@b.com", &session)
        .await
        .unwrap();

    let second_system = h.provider.requests()[1].messages[0].content.flatten();
    assert!(!second_system.contains("NOTE:"));
}

#[tokio::test]
async fn dedup_scan_is_limited_to_recent_entries() {
    let h = harness(vec![card_json("Dr. Prado")]);
    let session = SessionId::new();
    h.sessions.create_session("a@b.com", &session).await.unwrap();

    // one old similar entry pushed out of the window by five newer ones
    let mut entries = vec![("knee pain after running", "Dr. Old")];
    entries.extend([
        ("headache", "Dr. A"),
        ("back pain", "Dr. B"),
        ("fever", "Dr. C"),
        ("cough", "Dr. D"),
        ("insomnia", "Dr. E"),
    ]);
    for (query, name) in entries {
        h.sessions
            .append_entry(
                "a@b.com",
                &session,
                SpecialistQueryEntry {
                    query: query.into(),
                    recommended: vec![name.into()],
                    response: SpecialistReply {
                        specialists: vec![],
                    },
                    timestamp: Utc::now(),
                },
            )
            .await
            .unwrap();
    }

    h.engine
        .handle_specialist_query("knee pain after running", "a@b.com", &session)
        .await
        .unwrap();

    let system = h.provider.requests()[0].messages[0].content.flatten();
    assert!(!system.contains("Dr. Old"));
}

#[tokio::test]
async fn specialist_requests_are_deterministic_temperature() {
    let h = harness(vec![card_json("Dr. Silva")]);
    let session = h.engine.start_session("a@b.com").await.unwrap();

    h.engine
        .handle_specialist_query("knee pain after running", "a@b.com", &session)
        .await
        .unwrap();

    let request = &h.provider.requests()[0];
    assert_eq!(request.temperature, 0.0);
}

#[tokio::test]
async fn provider_failure_yields_fallback_card_and_still_appends() {
    let sessions = Arc::new(InMemoryStore::new());
    let engine = SpecialistEngine::new(
        Arc::new(FailingProvider),
        Arc::new(InMemoryIndex::new()),
        sessions.clone(),
        Arc::new(SharedModelConfig::default()),
    );
    let session = engine.start_session("a@b.com").await.unwrap();

    let reply = engine
        .handle_specialist_query("knee pain after running", "a@b.com", &session)
        .await
        .unwrap();

    let card: &SpecialistCard = &reply.specialists[0];
    assert_eq!(card.response_message, SPECIALIST_ERROR_MESSAGE);
    assert!(card.name.is_empty());

    let history = engine
        .get_session_history("a@b.com", &session)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].recommended.is_empty());
}

#[tokio::test]
async fn prose_reply_becomes_advisory_card() {
    let h = harness(vec![
        "Drink water and rest; you don't need a specialist yet.".to_string(),
    ]);
    let session = h.engine.start_session("a@b.com").await.unwrap();

    let reply = h
        .engine
        .handle_specialist_query("mild headache", "a@b.com", &session)
        .await
        .unwrap();

    assert_eq!(reply.specialists.len(), 1);
    assert!(reply.specialists[0]
        .response_message
        .contains("Drink water and rest"));
    assert!(reply.specialists[0].name.is_empty());
}

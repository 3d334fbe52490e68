//! End-to-end scenarios for the orchestrator with a scripted generator.

use super::support::{
    franchise_store, memory_store, trigram_embedder, ReadOnlyIndex, ScriptedClient,
    DEFAULT_REPLY, FRANCHISE_DOCS,
};
use crate::index::SqliteIndex;
use crate::rag::{
    ChatMessage, DomainScope, Outcome, RagOrchestrator, RagRequest, Upload, USER_UPLOAD_SOURCE,
};
use crate::store::VectorStore;
use crate::types::SOURCE_KEY;
use consult_core::config::DomainConfig;
use consult_core::{AppConfig, AppError};
use consult_llm::{Generator, Provider};
use consult_prompt::PromptLibrary;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const REFUSAL: &str = "Sorry, as a Franchise Consultant, your question is not within my scope.";

fn orchestrator(store: Arc<VectorStore>, client: Arc<ScriptedClient>) -> RagOrchestrator {
    let generator = Arc::new(Generator::new(client, "test-model"));
    RagOrchestrator::new(
        store,
        generator,
        &PromptLibrary::builtin().unwrap(),
        DomainScope::from(&DomainConfig::default()),
    )
}

#[tokio::test]
async fn test_franchise_question_is_answered() {
    let client = ScriptedClient::replying(&["Each franchisee gets a protected area."]);
    let rag = orchestrator(franchise_store().await, client.clone());

    let response = rag
        .answer(RagRequest::new("What about territory rules?").with_top_k(2))
        .await
        .unwrap();

    assert_eq!(response.outcome, Outcome::Answered);
    assert_eq!(response.answer, "Each franchisee gets a protected area.");
    assert_ne!(response.answer, REFUSAL);
    assert_eq!(response.context.len(), 2);
    for doc in FRANCHISE_DOCS {
        assert!(response.context.iter().any(|c| c == doc));
    }
    assert_eq!(response.standalone_query, "What about territory rules?");
    assert!(!response.used_user_docs);
    assert!(!response.saved_user_docs);

    // No history, so the answer is the only generation call
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_empty_store_refuses() {
    let client = ScriptedClient::replying(&[]);
    let rag = orchestrator(memory_store(), client.clone());

    let response = rag
        .answer(RagRequest::new("What is the capital of France?"))
        .await
        .unwrap();

    assert_eq!(response.outcome, Outcome::Refused);
    assert_eq!(response.answer, REFUSAL);
    assert!(response.context.is_empty());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_saved_upload_grows_store_by_one() {
    let store = franchise_store().await;
    let before = store.list_all().await.unwrap().len();
    let rag = orchestrator(store.clone(), ScriptedClient::replying(&[]));

    let response = rag
        .answer(
            RagRequest::new("Summarize my disclosure document")
                .with_upload(Upload::new("fdd.txt", "Item 12 describes the territory."))
                .with_save(true),
        )
        .await
        .unwrap();

    assert!(response.used_user_docs);
    assert!(response.saved_user_docs);
    assert!(response.warning.is_none());
    assert_eq!(
        response.context.last().unwrap(),
        "Item 12 describes the territory."
    );

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), before + 1);

    let saved = all.last().unwrap();
    assert_eq!(saved.text, "Item 12 describes the territory.");
    assert_eq!(saved.metadata.get(SOURCE_KEY).unwrap(), USER_UPLOAD_SOURCE);
    assert_eq!(saved.metadata.get("name").unwrap(), "fdd.txt");
}

#[tokio::test]
async fn test_unsaved_upload_is_used_but_not_stored() {
    let store = franchise_store().await;
    let rag = orchestrator(store.clone(), ScriptedClient::replying(&[]));

    let response = rag
        .answer(
            RagRequest::new("Summarize my notes")
                .with_upload(Upload::new("notes.txt", "Royalty is 6%."))
                .with_save(false),
        )
        .await
        .unwrap();

    assert!(response.used_user_docs);
    assert!(!response.saved_user_docs);
    assert_eq!(store.count().await.unwrap(), FRANCHISE_DOCS.len());
}

#[tokio::test]
async fn test_upload_alone_is_enough_context() {
    let client = ScriptedClient::replying(&[]);
    let store = memory_store();
    let rag = orchestrator(store.clone(), client.clone());

    let response = rag
        .answer(RagRequest::new("What does my file say?").with_upload(Upload::new(
            "notes.txt",
            "Renewal term is ten years.",
        )))
        .await
        .unwrap();

    assert_eq!(response.outcome, Outcome::Answered);
    assert_eq!(response.answer, DEFAULT_REPLY);
    assert_eq!(response.context, vec!["Renewal term is ten years.".to_string()]);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_blank_upload_does_not_count() {
    let client = ScriptedClient::replying(&[]);
    let rag = orchestrator(memory_store(), client.clone());

    let response = rag
        .answer(RagRequest::new("Anything?").with_upload(Upload::new("blank.txt", "  \n")))
        .await
        .unwrap();

    assert_eq!(response.outcome, Outcome::Refused);
    assert!(!response.used_user_docs);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_history_rewrites_but_answers_original_question() {
    let client = ScriptedClient::replying(&[
        "What are the franchise territory rules?",
        "Territories are exclusive.",
    ]);
    let rag = orchestrator(franchise_store().await, client.clone());
    let history = vec![
        ChatMessage::user("I want to open a franchise."),
        ChatMessage::assistant("Happy to help with that."),
    ];

    let response = rag
        .answer(RagRequest::new("What about territory?").with_history(history))
        .await
        .unwrap();

    assert_eq!(client.calls(), 2);
    assert_eq!(
        response.standalone_query,
        "What are the franchise territory rules?"
    );
    assert_eq!(response.answer, "Territories are exclusive.");

    let answer_prompt = &client.prompts()[1];
    assert!(answer_prompt.contains("User: I want to open a franchise.\n"));
    assert!(answer_prompt.contains("Question:\nWhat about territory?"));
    assert!(!answer_prompt.contains("Question:\nWhat are the franchise territory rules?"));
}

#[tokio::test]
async fn test_answer_prompt_carries_domain_restriction() {
    let client = ScriptedClient::replying(&[]);
    let rag = orchestrator(franchise_store().await, client.clone());

    rag.answer(RagRequest::new("Tell me about fees"))
        .await
        .unwrap();

    let prompt = &client.prompts()[0];
    assert!(prompt.contains("As a Franchise Consultant"));
    assert!(prompt.contains("franchises, franchising, and business consulting"));
    assert!(prompt.contains("\"I'm only specialized in giving franchise consulting answers.\""));
    assert!(prompt.contains(FRANCHISE_DOCS[1]));
}

#[tokio::test]
async fn test_generation_failure_propagates_without_saving() {
    let store = franchise_store().await;
    let rag = orchestrator(store.clone(), ScriptedClient::failing());

    let result = rag
        .answer(RagRequest::new("Fees?").with_upload(Upload::new("a.txt", "upload text")))
        .await;

    assert!(matches!(result, Err(AppError::GenerationUnavailable(_))));
    assert_eq!(store.count().await.unwrap(), FRANCHISE_DOCS.len());
}

#[tokio::test]
async fn test_rewrite_failure_still_answers() {
    let client = ScriptedClient::failing_first(1, &["Fees are monthly."]);
    let rag = orchestrator(franchise_store().await, client.clone());

    let response = rag
        .answer(RagRequest::new("Fees?").with_history(vec![ChatMessage::user("hi")]))
        .await
        .unwrap();

    assert_eq!(client.calls(), 2);
    assert_eq!(response.standalone_query, "Fees?");
    assert_eq!(response.answer, "Fees are monthly.");
}

#[tokio::test]
async fn test_unconfigured_secondary_is_generation_unavailable() {
    let client = ScriptedClient::replying(&[]);
    let rag = orchestrator(franchise_store().await, client.clone());

    let result = rag
        .answer(RagRequest::new("Fees?").with_provider(Provider::Secondary))
        .await;

    assert!(matches!(result, Err(AppError::GenerationUnavailable(_))));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_blank_query_is_invalid() {
    let rag = orchestrator(memory_store(), ScriptedClient::replying(&[]));
    let result = rag.answer(RagRequest::new("   ")).await;
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_save_failure_becomes_warning() {
    let inner = SqliteIndex::open_in_memory().unwrap();
    let store = Arc::new(VectorStore::new(
        Arc::new(ReadOnlyIndex { inner }),
        trigram_embedder(),
    ));
    store
        .upsert(FRANCHISE_DOCS[0].to_string(), Some("base".to_string()), None)
        .await
        .unwrap();

    let rag = orchestrator(store.clone(), ScriptedClient::replying(&["answer"]));
    let response = rag
        .answer(RagRequest::new("Territory?").with_upload(Upload::new("u.txt", "upload")))
        .await
        .unwrap();

    assert_eq!(response.outcome, Outcome::Answered);
    assert_eq!(response.answer, "answer");
    assert!(response.used_user_docs);
    assert!(!response.saved_user_docs);
    assert!(response.warning.unwrap().contains("not saved"));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_admin_operations() {
    let rag = orchestrator(memory_store(), ScriptedClient::replying(&[]));

    let added = rag
        .update_base_vectors(vec!["Fee schedule".to_string(), "Territory map".to_string()])
        .await
        .unwrap();
    assert_eq!(added, 2);

    let listed = rag.list_vectors().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].text, "Fee schedule");

    let id = rag
        .upsert_vector("Updated fee schedule".to_string(), Some(listed[0].id.clone()), None)
        .await
        .unwrap();
    assert_eq!(id, listed[0].id);

    let listed = rag.list_vectors().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].text, "Updated fee schedule");

    assert!(rag.delete_vector(&id).await.unwrap());
    assert!(!rag.delete_vector(&id).await.unwrap());
    assert_eq!(rag.list_vectors().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_from_config_uses_workspace_overrides() {
    let temp = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.workspace = temp.path().to_path_buf();
    config.domain.name = "Tax".to_string();
    config.retrieval.top_k = 1;

    let prompts_dir = config.prompts_dir();
    fs::create_dir_all(&prompts_dir).unwrap();
    fs::write(
        prompts_dir.join("rag.answer.yml"),
        "id: rag.answer\ntitle: Short\napiVersion: \"1.0\"\ncreatedBy: test\n\
         variables: [domain, context, question]\n\
         template: \"{{domain}} | {{context}} | {{question}}\"\n",
    )
    .unwrap();

    let client = ScriptedClient::replying(&[]);
    let generator = Arc::new(Generator::new(client.clone(), "test-model"));
    let rag = RagOrchestrator::from_config(&config, franchise_store().await, generator).unwrap();

    let response = rag.answer(RagRequest::new("Fees?")).await.unwrap();
    assert_eq!(response.context.len(), 1);
    assert!(client.prompts()[0].starts_with("Tax | "));
    assert!(client.prompts()[0].ends_with(" | Fees?"));
}

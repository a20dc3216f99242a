use std::env;
use std::fs;

use anyhow::Result;
use test_utils::run_stream_sse_fixture;
use test_utils::session_fixture;
use tokio::sync::mpsc;

use super::PlaygroundBackend;
use crate::domain::models::AgentBackend;
use crate::domain::models::Event;
use crate::domain::models::Role;
use crate::domain::models::RunRequest;
use crate::domain::services::AuthStore;
use crate::infrastructure::api::ApiClient;

impl PlaygroundBackend {
    fn with_url(url: String, name: &str) -> PlaygroundBackend {
        let path = env::temp_dir()
            .join(format!("dcfdesk-playground-test-{}", std::process::id()))
            .join(format!("{name}.json"));
        let _ = fs::remove_file(&path);

        return PlaygroundBackend::new(ApiClient::new(&url, AuthStore::new(path)), "200");
    }
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1/playground/status")
        .with_status(200)
        .create();

    let backend = PlaygroundBackend::with_url(server.url(), "health");
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks_when_unreachable() {
    let backend = PlaygroundBackend::with_url("http://127.0.0.1:1".to_string(), "unreachable");
    let res = backend.health_check().await;

    insta::assert_snapshot!(res.unwrap_err().to_string(), @"The agent playground is not running at http://127.0.0.1:1");
}

#[tokio::test]
async fn it_lists_sessions() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1/playground/agents/analyst/sessions")
        .with_status(200)
        .with_body(r#"[{"session_id":"s-100","title":"How did revenue change?","created_at":1717000000}]"#)
        .create();

    let backend = PlaygroundBackend::with_url(server.url(), "sessions");
    let sessions = backend.list_sessions("analyst").await?;

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].title, "How did revenue change?");
    mock.assert();

    return Ok(());
}

#[tokio::test]
async fn it_loads_session_transcripts() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1/playground/agents/analyst/sessions/s-100")
        .with_status(200)
        .with_body(session_fixture())
        .create();

    let backend = PlaygroundBackend::with_url(server.url(), "session");
    let messages = backend.get_session("analyst", "s-100").await?.to_messages();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].content, "Revenue grew 12%.");
    assert_eq!(messages[1].tool_names(), vec!["get_income_statement"]);
    mock.assert();

    return Ok(());
}

#[tokio::test]
async fn it_deletes_sessions() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("DELETE", "/v1/playground/agents/analyst/sessions/s-100")
        .with_status(200)
        .create();

    let backend = PlaygroundBackend::with_url(server.url(), "delete");
    backend.delete_session("analyst", "s-100").await?;

    mock.assert();

    return Ok(());
}

#[tokio::test]
async fn it_streams_server_sent_events() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/playground/agents/analyst/runs")
        .match_body(mockito::Matcher::Regex(
            r#"name="session_id"\r\n\r\ns-99"#.to_string(),
        ))
        .with_status(200)
        .with_body(run_stream_sse_fixture())
        .create();

    let backend = PlaygroundBackend::with_url(server.url(), "run");
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    backend
        .run(
            RunRequest {
                run_id: 3,
                agent_id: "analyst".to_string(),
                message: "Summarise".to_string(),
                session_id: "s-99".to_string(),
            },
            &tx,
        )
        .await?;
    drop(tx);

    let mut count = 0;
    while let Some(event) = rx.recv().await {
        assert!(matches!(event, Event::RunChunk(3, _)));
        count += 1;
    }
    assert_eq!(count, 4);
    mock.assert();

    return Ok(());
}

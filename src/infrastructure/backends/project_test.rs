use std::env;
use std::fs;

use anyhow::bail;
use anyhow::Result;
use test_utils::agents_fixture;
use test_utils::run_stream_fixture;
use tokio::sync::mpsc;

use super::ProjectBackend;
use crate::domain::models::AgentBackend;
use crate::domain::models::Event;
use crate::domain::models::RunEvent;
use crate::domain::models::RunRequest;
use crate::domain::models::StreamChunk;
use crate::domain::services::AuthStore;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::Scope;

impl ProjectBackend {
    fn with_url(url: String, name: &str) -> ProjectBackend {
        let path = env::temp_dir()
            .join(format!("dcfdesk-project-test-{}", std::process::id()))
            .join(format!("{name}.json"));
        let _ = fs::remove_file(&path);

        return ProjectBackend::new(
            ApiClient::new(&url, AuthStore::new(path)),
            Scope::new("t1", "p1"),
            "200",
        );
    }
}

fn request() -> RunRequest {
    return RunRequest {
        run_id: 7,
        agent_id: "analyst".to_string(),
        message: "How did revenue change?".to_string(),
        session_id: "".to_string(),
    };
}

fn to_chunk(event: Option<Event>) -> Result<(u64, StreamChunk)> {
    match event {
        Some(Event::RunChunk(run_id, chunk)) => return Ok((run_id, chunk)),
        _ => bail!("Wrong type from recv"),
    }
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/v1/tenants/t1/projects/p1/workspace/status")
        .with_status(200)
        .create();

    let backend = ProjectBackend::with_url(server.url(), "health-ok");
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/v1/tenants/t1/projects/p1/workspace/status")
        .with_status(503)
        .create();

    let backend = ProjectBackend::with_url(server.url(), "health-fail");
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_lists_agents() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/v1/tenants/t1/projects/p1/agents")
        .with_status(200)
        .with_body(agents_fixture())
        .create();

    let backend = ProjectBackend::with_url(server.url(), "agents");
    let agents = backend.list_agents().await?;

    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0].value, "analyst");
    assert_eq!(agents[0].label, "Financial Analyst");
    assert_eq!(agents[0].model, "gpt-4o");
    assert!(agents[0].storage);
    assert_eq!(agents[1].model, "gpt-4o-mini");
    assert!(!agents[1].storage);
    mock.assert();

    return Ok(());
}

#[tokio::test]
async fn it_lists_no_sessions_when_missing() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/v1/tenants/t1/projects/p1/agents/analyst/sessions")
        .with_status(404)
        .create();

    let backend = ProjectBackend::with_url(server.url(), "sessions");
    let sessions = backend.list_sessions("analyst").await?;

    assert!(sessions.is_empty());
    mock.assert();

    return Ok(());
}

#[tokio::test]
async fn it_rejects_session_loading() {
    let backend = ProjectBackend::with_url("http://localhost:1".to_string(), "unsupported");
    let res = backend.get_session("analyst", "s-100").await;

    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Loading past sessions is not supported by the project backend");
}

#[tokio::test]
async fn it_streams_run_chunks() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/v1/tenants/t1/projects/p1/agents/analyst/run")
        .match_body(mockito::Matcher::Regex(
            r#"name="stream"\r\n\r\ntrue"#.to_string(),
        ))
        .with_status(200)
        .with_body(run_stream_fixture())
        .create();

    let backend = ProjectBackend::with_url(server.url(), "run");
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    backend.run(request(), &tx).await?;
    drop(tx);

    let (run_id, first) = to_chunk(rx.recv().await)?;
    assert_eq!(run_id, 7);
    assert_eq!(first.event, RunEvent::RunStarted);
    assert_eq!(first.session_id, Some("s-100".to_string()));

    let mut rest = vec![];
    while let Some(event) = rx.recv().await {
        rest.push(to_chunk(Some(event))?.1.event);
    }
    assert_eq!(
        rest,
        vec![
            RunEvent::RunResponse,
            RunEvent::Other,
            RunEvent::RunResponse,
            RunEvent::RunCompleted,
        ]
    );
    mock.assert();

    return Ok(());
}

#[tokio::test]
async fn it_fails_runs_on_error_statuses() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/v1/tenants/t1/projects/p1/agents/analyst/run")
        .with_status(500)
        .with_body(r#"{"detail":"Agent crashed"}"#)
        .create();

    let backend = ProjectBackend::with_url(server.url(), "run-fail");
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let res = backend.run(request(), &tx).await;

    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Agent crashed");
    assert!(rx.try_recv().is_err());
    mock.assert();
}

#[tokio::test]
async fn it_fails_runs_on_malformed_chunks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/v1/tenants/t1/projects/p1/agents/analyst/run")
        .with_status(200)
        .with_body("{\"event\":\"RunStarted\"}\n<html>oops</html>\n")
        .create();

    let backend = ProjectBackend::with_url(server.url(), "run-malformed");
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let res = backend.run(request(), &tx).await;

    assert!(res.is_err());
    assert!(matches!(rx.try_recv(), Ok(Event::RunChunk(7, _))));
    mock.assert();
}

/// Streamed body of a successful agent run: newline delimited, cumulative
/// content, with tool calls and a final completion.
pub fn run_stream_fixture() -> String {
    return [
        r#"{"event":"RunStarted","session_id":"s-100","run_id":"r-1","agent_id":"analyst","created_at":1717000000,"content":"Run started"}"#,
        r#"{"event":"RunResponse","session_id":"s-100","content":"Acme's revenue","created_at":1717000001}"#,
        r#"{"event":"ToolCallStarted","session_id":"s-100","content":""}"#,
        r#"{"event":"RunResponse","session_id":"s-100","content":"Acme's revenue grew 12%.","tools":[{"tool_name":"get_income_statement","tool_args":{"project_id":"p1"}}]}"#,
        r#"{"event":"RunCompleted","session_id":"s-100","content":"Acme's revenue grew 12%.","created_at":1717000002}"#,
    ]
    .join("\n");
}

/// Same run as `run_stream_fixture`, framed as server-sent events with some
/// objects packed on one line.
pub fn run_stream_sse_fixture() -> String {
    return [
        r#"data: {"event":"RunStarted","session_id":"s-100","created_at":1717000000}"#,
        "",
        r#"data: {"event":"RunResponse","content":"Acme's revenue"}{"event":"RunResponse","content":"Acme's revenue grew 12%."}"#,
        "",
        r#"data: {"event":"RunCompleted","content":"Acme's revenue grew 12%."}"#,
        "",
    ]
    .join("\n");
}

pub fn agents_fixture() -> &'static str {
    return r#"[
    {"agent_id":"analyst","name":"Financial Analyst","model":{"name":"OpenAIChat","model":"gpt-4o","provider":"OpenAI"},"storage":true},
    {"agent_id":"reader","name":"Document Reader","model":"gpt-4o-mini","storage":false}
]"#;
}

pub fn session_fixture() -> &'static str {
    return r#"{
    "session_id": "s-100",
    "agent_id": "analyst",
    "memory": {
        "runs": [
            {
                "message": {"role": "user", "content": "How did revenue change?", "created_at": 1717000000},
                "response": {"content": "Revenue grew 12%.", "created_at": 1717000002, "tools": [{"tool_name": "get_income_statement"}]}
            }
        ]
    }
}"#;
}

use serde_json::json;

use super::content_delta;
use super::PlaygroundState;
use super::SendOutcome;
use super::StreamState;
use crate::domain::models::ExtraData;
use crate::domain::models::Message;
use crate::domain::models::ReasoningStep;
use crate::domain::models::ResponseAudio;
use crate::domain::models::Role;
use crate::domain::models::RunContent;
use crate::domain::models::RunEvent;
use crate::domain::models::RunRequest;
use crate::domain::models::SessionEntry;
use crate::domain::models::StreamChunk;
use crate::domain::models::ToolCall;

fn started(session_id: &str, created_at: i64) -> StreamChunk {
    return StreamChunk {
        event: RunEvent::RunStarted,
        session_id: Some(session_id.to_string()),
        created_at: Some(created_at),
        ..StreamChunk::default()
    };
}

fn response(text: &str) -> StreamChunk {
    return StreamChunk::with_text(RunEvent::RunResponse, text);
}

fn tool(name: &str) -> ToolCall {
    return ToolCall {
        tool_name: name.to_string(),
        ..ToolCall::default()
    };
}

fn state() -> PlaygroundState {
    return PlaygroundState::new(Some("analyst".to_string()), None, true);
}

fn send(state: &mut PlaygroundState, input: &str) -> u64 {
    match state.begin_send(input, 1000) {
        SendOutcome::Started(request) => return request.run_id,
        outcome => panic!("unexpected outcome {outcome:?}"),
    }
}

fn last(state: &PlaygroundState) -> &Message {
    return state.messages.last().unwrap();
}

mod begin_send {
    use super::*;

    #[test]
    fn it_appends_user_and_placeholder() {
        let mut state = state();
        let outcome = state.begin_send("Value Acme", 1000);

        assert_eq!(
            outcome,
            SendOutcome::Started(RunRequest {
                run_id: 1,
                agent_id: "analyst".to_string(),
                message: "Value Acme".to_string(),
                session_id: "".to_string(),
            })
        );
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, Role::User);
        assert_eq!(state.messages[0].content, "Value Acme");
        assert_eq!(state.messages[0].created_at, 1000);
        assert_eq!(state.messages[1].role, Role::Agent);
        assert_eq!(state.messages[1].content, "");
        assert_eq!(state.messages[1].created_at, 1001);
        assert!(state.messages[1].tool_calls.is_empty());
        assert!(!state.messages[1].streaming_error);
        assert_eq!(state.stream_state, StreamState::Streaming);
        assert!(!state.input_focused);
    }

    #[test]
    fn it_sends_the_current_session() {
        let mut state = PlaygroundState::new(Some("analyst".to_string()), Some("s9".to_string()), true);
        match state.begin_send("hi", 1) {
            SendOutcome::Started(request) => assert_eq!(request.session_id, "s9"),
            outcome => panic!("unexpected outcome {outcome:?}"),
        }
    }

    #[test]
    fn it_is_a_noop_without_an_agent() {
        let mut state = PlaygroundState::new(None, None, true);
        let before = state.clone();

        assert_eq!(state.begin_send("hi", 1), SendOutcome::MissingAgent);
        assert_eq!(state, before);
    }

    #[test]
    fn it_rejects_sends_while_streaming() {
        let mut state = state();
        send(&mut state, "first");
        let before = state.clone();

        assert_eq!(state.begin_send("second", 2000), SendOutcome::Busy);
        assert_eq!(state, before);
    }

    #[test]
    fn it_drops_a_failed_exchange_before_resending() {
        let mut state = state();
        let run_id = send(&mut state, "first");
        state.fail(run_id, "connection reset");
        state.finish(run_id);
        assert!(last(&state).streaming_error);

        send(&mut state, "retry");

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].content, "retry");
        assert_eq!(state.messages[1].content, "");
        assert_eq!(state.streaming_error_message, None);
    }

    #[test]
    fn it_drops_a_failed_exchange_behind_notices() {
        let mut state = state();
        let run_id = send(&mut state, "first");
        state.fail(run_id, "connection reset");
        state.finish(run_id);
        state.messages.push(Message::new(Role::System, "Help text", 1500));

        send(&mut state, "second");

        let roles = state
            .messages
            .iter()
            .map(|e| return e.role)
            .collect::<Vec<Role>>();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Agent]);
        assert_eq!(state.messages[1].content, "second");
    }

    #[test]
    fn it_keeps_tabs_in_the_input() {
        let mut state = state();
        send(&mut state, "rev\tcost");

        assert_eq!(state.messages[0].content, "rev\tcost");
    }

    #[test]
    fn it_keeps_successful_exchanges() {
        let mut state = state();
        let run_id = send(&mut state, "first");
        state.apply_chunk(run_id, &response("one"));
        state.finish(run_id);

        send(&mut state, "second");

        assert_eq!(state.messages.len(), 4);
        assert_eq!(state.messages[1].content, "one");
    }
}

mod chunks {
    use super::*;

    #[test]
    fn it_appends_cumulative_deltas() {
        let mut state = state();
        let run_id = send(&mut state, "greet");

        for text in ["Hello", "Hello, world", "Hello, world!"] {
            state.apply_chunk(run_id, &response(text));
        }

        assert_eq!(last(&state).content, "Hello, world!");
    }

    #[test]
    fn it_keeps_tabs_in_cumulative_content() {
        let mut state = state();
        let run_id = send(&mut state, "table");

        for text in ["a\tb", "a\tb\tc"] {
            state.apply_chunk(run_id, &response(text));
        }

        assert_eq!(last(&state).content, "a\tb\tc");
    }

    #[test]
    fn it_folds_into_the_agent_message_behind_notices() {
        let mut state = state();
        let run_id = send(&mut state, "greet");
        state.apply_chunk(run_id, &response("Hello"));
        state.messages.push(Message::new(Role::System, "Notice", 1500));

        state.apply_chunk(run_id, &response("Hello, world"));

        assert_eq!(state.messages[1].content, "Hello, world");
        assert_eq!(last(&state).content, "Notice");
    }

    #[test]
    fn it_replaces_content_on_completion() {
        let mut state = state();
        let run_id = send(&mut state, "greet");
        state.apply_chunk(run_id, &response("Draft"));
        state.apply_chunk(
            run_id,
            &StreamChunk::with_text(RunEvent::RunCompleted, "Final."),
        );

        assert_eq!(last(&state).content, "Final.");
    }

    #[test]
    fn it_keeps_content_when_completion_has_none() {
        let mut state = state();
        let run_id = send(&mut state, "greet");
        state.apply_chunk(run_id, &response("Streamed"));
        state.apply_chunk(run_id, &StreamChunk::new(RunEvent::RunCompleted));

        assert_eq!(last(&state).content, "Streamed");
    }

    #[test]
    fn it_serializes_structured_completions() {
        let mut state = state();
        let run_id = send(&mut state, "value");
        state.apply_chunk(
            run_id,
            &StreamChunk {
                event: RunEvent::RunCompleted,
                content: Some(RunContent::Structured(json!({"ev": 1200}))),
                ..StreamChunk::default()
            },
        );

        assert_eq!(last(&state).content, r#"{"ev":1200}"#);
    }

    #[test]
    fn it_renders_structured_responses_as_json_blocks() {
        let mut state = state();
        let run_id = send(&mut state, "value");
        state.apply_chunk(
            run_id,
            &StreamChunk {
                event: RunEvent::RunResponse,
                content: Some(RunContent::Structured(json!({"ev": 1200}))),
                ..StreamChunk::default()
            },
        );

        insta::assert_snapshot!(last(&state).content, @r###"
        ```json
        {
          "ev": 1200
        }
        ```
        "###);
    }

    #[test]
    fn it_merges_tools_and_extra_data() {
        let mut state = state();
        let run_id = send(&mut state, "value");
        state.apply_chunk(
            run_id,
            &StreamChunk {
                tools: Some(vec![tool("get_income_statement")]),
                extra_data: Some(ExtraData {
                    reasoning_steps: Some(vec![ReasoningStep {
                        title: Some("Load".to_string()),
                        ..ReasoningStep::default()
                    }]),
                    references: None,
                }),
                created_at: Some(5000),
                ..response("Loading")
            },
        );
        state.apply_chunk(
            run_id,
            &StreamChunk {
                tools: Some(vec![]),
                ..response("Loading data")
            },
        );

        let message = last(&state);
        assert_eq!(message.content, "Loading data");
        assert_eq!(message.tool_names(), vec!["get_income_statement"]);
        assert_eq!(message.created_at, 5000);
        assert_eq!(
            message
                .extra_data
                .as_ref()
                .and_then(|e| return e.reasoning_steps.as_ref())
                .map(|e| return e.len()),
            Some(1)
        );
    }

    #[test]
    fn it_concatenates_audio_transcripts() {
        let mut state = state();
        let run_id = send(&mut state, "speak");
        for part in ["Hel", "lo"] {
            state.apply_chunk(
                run_id,
                &StreamChunk {
                    event: RunEvent::RunResponse,
                    response_audio: Some(ResponseAudio {
                        transcript: Some(part.to_string()),
                        ..ResponseAudio::default()
                    }),
                    ..StreamChunk::default()
                },
            );
        }

        let transcript = last(&state)
            .response_audio
            .as_ref()
            .and_then(|e| return e.transcript.clone());
        assert_eq!(transcript, Some("Hello".to_string()));
        assert_eq!(last(&state).content, "");
    }

    #[test]
    fn it_ignores_unknown_events() {
        let mut state = state();
        let run_id = send(&mut state, "hi");
        let before = state.clone();
        state.apply_chunk(run_id, &StreamChunk::new(RunEvent::Other));

        assert_eq!(state, before);
    }

    #[test]
    fn it_ignores_chunks_after_completion() {
        let mut state = state();
        let run_id = send(&mut state, "hi");
        state.apply_chunk(run_id, &StreamChunk::with_text(RunEvent::RunCompleted, "Done"));
        state.apply_chunk(run_id, &response("Done and more"));
        state.fail(run_id, "late failure");

        assert_eq!(last(&state).content, "Done");
        assert!(!last(&state).streaming_error);
        assert_eq!(state.streaming_error_message, None);
    }

    #[test]
    fn it_ignores_chunks_from_stale_runs() {
        let mut state = state();
        let first = send(&mut state, "first");
        state.abort();
        let second = send(&mut state, "second");
        state.apply_chunk(first, &response("stale"));
        state.apply_chunk(second, &response("fresh"));

        assert_eq!(state.messages.len(), 2);
        assert_eq!(last(&state).content, "fresh");
    }
}

mod sessions {
    use super::*;

    #[test]
    fn it_registers_new_sessions_once() {
        let mut state = state();
        let run_id = send(&mut state, "Value Acme");
        state.apply_chunk(run_id, &started("s1", 42));
        state.apply_chunk(run_id, &started("s1", 43));

        assert_eq!(state.session_id, Some("s1".to_string()));
        assert_eq!(
            state.sessions,
            vec![SessionEntry {
                session_id: "s1".to_string(),
                title: "Value Acme".to_string(),
                created_at: 42,
            }]
        );
    }

    #[test]
    fn it_inserts_new_sessions_first() {
        let mut state = state();
        state.sessions = vec![SessionEntry {
            session_id: "old".to_string(),
            title: "Earlier".to_string(),
            created_at: 1,
        }];
        let run_id = send(&mut state, "hi");
        state.apply_chunk(
            run_id,
            &StreamChunk {
                event: RunEvent::ReasoningStarted,
                session_id: Some("new".to_string()),
                ..StreamChunk::default()
            },
        );

        assert_eq!(state.sessions[0].session_id, "new");
        assert_eq!(state.sessions[1].session_id, "old");
    }

    #[test]
    fn it_skips_registration_without_storage() {
        let mut state = PlaygroundState::new(Some("analyst".to_string()), None, false);
        let run_id = send(&mut state, "hi");
        state.apply_chunk(run_id, &started("s1", 1));

        assert_eq!(state.session_id, Some("s1".to_string()));
        assert!(state.sessions.is_empty());
    }

    #[test]
    fn it_does_not_register_the_continued_session() {
        let mut state = PlaygroundState::new(Some("analyst".to_string()), Some("s1".to_string()), true);
        let run_id = send(&mut state, "follow up");
        state.apply_chunk(run_id, &started("s1", 1));

        assert!(state.sessions.is_empty());
    }

    #[test]
    fn it_rolls_back_sessions_on_run_error() {
        let mut state = state();
        let run_id = send(&mut state, "hi");
        state.apply_chunk(run_id, &started("s1", 1));
        state.apply_chunk(
            run_id,
            &StreamChunk::with_text(RunEvent::RunError, "Model overloaded"),
        );
        state.finish(run_id);

        assert!(last(&state).streaming_error);
        assert!(state.sessions.is_empty());
        assert_eq!(
            state.streaming_error_message,
            Some("Model overloaded".to_string())
        );
        assert_eq!(state.stream_state, StreamState::Idle);
        assert!(state.input_focused);
    }

    #[test]
    fn it_rolls_back_sessions_on_transport_failure() {
        let mut state = state();
        state.sessions = vec![SessionEntry {
            session_id: "keep".to_string(),
            title: "Earlier".to_string(),
            created_at: 1,
        }];
        let run_id = send(&mut state, "hi");
        state.apply_chunk(run_id, &started("s2", 1));
        state.fail(run_id, "error decoding response body");
        state.finish(run_id);

        assert_eq!(state.sessions.len(), 1);
        assert_eq!(state.sessions[0].session_id, "keep");
        assert!(last(&state).streaming_error);
    }

    #[test]
    fn it_starts_fresh_sessions() {
        let mut state = PlaygroundState::new(Some("analyst".to_string()), Some("s1".to_string()), true);
        state.messages.push(Message::user("hi", 1));
        state.start_new_session();

        assert!(state.messages.is_empty());
        assert_eq!(state.session_id, None);
    }
}

mod abort {
    use super::*;

    #[test]
    fn it_flags_the_exchange_and_goes_idle() {
        let mut state = state();
        send(&mut state, "hi");
        state.abort();

        assert!(last(&state).streaming_error);
        assert_eq!(state.stream_state, StreamState::Idle);
        assert_eq!(state.active_run_id(), None);
        assert!(state.input_focused);
    }

    #[test]
    fn it_hands_input_back_only_when_the_run_finishes() {
        let mut state = state();
        let run_id = send(&mut state, "hi");
        assert!(!state.input_focused);

        state.fail(run_id, "connection reset");
        assert!(!state.input_focused);

        state.finish(run_id);
        assert!(state.input_focused);
    }

    #[test]
    fn it_is_a_noop_when_idle() {
        let mut state = state();
        let before = state.clone();
        state.abort();

        assert_eq!(state, before);
    }
}

mod delta {
    use super::*;

    #[test]
    fn it_takes_the_suffix_of_extending_content() {
        assert_eq!(content_delta("Hello", "Hello, world"), ", world");
        assert_eq!(content_delta("", "Hello"), "Hello");
        assert_eq!(content_delta("Hello", "Hello"), "");
    }

    #[test]
    fn it_removes_the_first_occurrence_otherwise() {
        assert_eq!(content_delta("world", "Hello world"), "Hello ");
        assert_eq!(content_delta("abc", "xyz"), "xyz");
    }
}

#[cfg(test)]
#[path = "stream_assembler_test.rs"]
mod tests;

use crate::domain::models::json_markdown;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::RunContent;
use crate::domain::models::RunEvent;
use crate::domain::models::RunRequest;
use crate::domain::models::SessionEntry;
use crate::domain::models::StreamChunk;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Started(RunRequest),
    /// A run is already in flight. Nothing was changed.
    Busy,
    /// No agent is selected. Nothing was changed.
    MissingAgent,
}

/// Bookkeeping for the invocation currently being folded.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RunProgress {
    run_id: u64,
    input: String,
    previous_session: Option<String>,
    registered_session: Option<String>,
    last_content: String,
    open: bool,
}

/// Returns the part of `current` that has not been seen yet, given the
/// previously received cumulative content.
pub fn content_delta(previous: &str, current: &str) -> String {
    if let Some(suffix) = current.strip_prefix(previous) {
        return suffix.to_string();
    }

    tracing::warn!(
        previous_len = previous.len(),
        current_len = current.len(),
        "cumulative content does not extend the previous chunk"
    );

    return current.replacen(previous, "", 1);
}

/// Chat transcript plus everything needed to fold a streamed agent run into
/// it. All transitions are synchronous; the network side feeds chunks in.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaygroundState {
    pub messages: Vec<Message>,
    pub sessions: Vec<SessionEntry>,
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    pub has_storage: bool,
    pub stream_state: StreamState,
    pub streaming_error_message: Option<String>,
    pub input_focused: bool,
    run_counter: u64,
    run: Option<RunProgress>,
}

impl Default for PlaygroundState {
    fn default() -> PlaygroundState {
        return PlaygroundState::new(None, None, false);
    }
}

impl PlaygroundState {
    pub fn new(
        agent_id: Option<String>,
        session_id: Option<String>,
        has_storage: bool,
    ) -> PlaygroundState {
        return PlaygroundState {
            messages: vec![],
            sessions: vec![],
            session_id,
            agent_id,
            has_storage,
            stream_state: StreamState::Idle,
            streaming_error_message: None,
            input_focused: true,
            run_counter: 0,
            run: None,
        };
    }

    pub fn is_streaming(&self) -> bool {
        return self.stream_state == StreamState::Streaming;
    }

    /// Id of the run currently streaming, if any.
    pub fn active_run_id(&self) -> Option<u64> {
        if !self.is_streaming() {
            return None;
        }

        return self.run.as_ref().map(|run| return run.run_id);
    }

    /// Starts a new invocation: repairs a previously failed exchange, appends
    /// the user message and an empty agent message, and returns the request
    /// the backend should run.
    pub fn begin_send(&mut self, input: &str, now: i64) -> SendOutcome {
        if self.is_streaming() {
            return SendOutcome::Busy;
        }

        let agent_id = match &self.agent_id {
            Some(agent_id) if !agent_id.is_empty() => agent_id.to_string(),
            _ => return SendOutcome::MissingAgent,
        };

        self.drop_failed_exchange();

        self.messages.push(Message::user(input, now));
        self.messages.push(Message::agent_placeholder(now + 1));

        self.run_counter += 1;
        self.run = Some(RunProgress {
            run_id: self.run_counter,
            input: input.to_string(),
            previous_session: self.session_id.clone(),
            registered_session: None,
            last_content: "".to_string(),
            open: true,
        });
        self.stream_state = StreamState::Streaming;
        self.streaming_error_message = None;
        self.input_focused = false;

        return SendOutcome::Started(RunRequest {
            run_id: self.run_counter,
            agent_id,
            message: input.to_string(),
            session_id: self.session_id.clone().unwrap_or_default(),
        });
    }

    /// Folds one chunk into the transcript. Chunks for other runs, or that
    /// arrive after the run was closed, are ignored.
    pub fn apply_chunk(&mut self, run_id: u64, chunk: &StreamChunk) {
        if !self.is_open_run(run_id) {
            tracing::debug!(run_id, event = ?chunk.event, "dropping chunk for inactive run");
            return;
        }

        match chunk.event {
            RunEvent::RunStarted | RunEvent::ReasoningStarted => {
                self.on_started(chunk);
            }
            RunEvent::RunResponse => {
                self.on_response(chunk);
            }
            RunEvent::RunCompleted => {
                self.on_completed(chunk);
            }
            RunEvent::RunError => {
                self.fail(run_id, &chunk.error_text());
            }
            RunEvent::Other => {}
        }
    }

    /// Marks the open run as failed and rolls back the session it registered.
    pub fn fail(&mut self, run_id: u64, error: &str) {
        if !self.is_open_run(run_id) {
            tracing::warn!(run_id, error, "run failure reported after the run closed");
            return;
        }

        if let Some(message) = self.open_agent_message() {
            message.streaming_error = true;
        }
        self.streaming_error_message = Some(error.to_string());

        let registered = self
            .run
            .as_mut()
            .and_then(|run| {
                run.open = false;
                return run.registered_session.take();
            });
        if let Some(session_id) = registered {
            if self.has_storage {
                self.sessions.retain(|e| return e.session_id != session_id);
            }
        }
    }

    /// Always called once the invocation ends, however it ended.
    pub fn finish(&mut self, run_id: u64) {
        let is_current = self
            .run
            .as_ref()
            .map(|run| return run.run_id == run_id)
            .unwrap_or(false);
        if !is_current {
            return;
        }

        if let Some(run) = self.run.as_mut() {
            run.open = false;
        }
        self.stream_state = StreamState::Idle;
        self.input_focused = true;
    }

    /// Stops waiting on the current run. The exchange is kept and flagged so
    /// the next send replaces it.
    pub fn abort(&mut self) {
        if let Some(run_id) = self.active_run_id() {
            self.fail(run_id, "The run was cancelled");
            self.finish(run_id);
        }
    }

    /// Clears the transcript so the next send starts a fresh session.
    pub fn start_new_session(&mut self) {
        if self.is_streaming() {
            return;
        }

        self.messages.clear();
        self.session_id = None;
        self.streaming_error_message = None;
        self.run = None;
    }

    /// Replaces the transcript with a stored session.
    pub fn load_session(&mut self, session_id: &str, messages: Vec<Message>) {
        if self.is_streaming() {
            return;
        }

        self.session_id = Some(session_id.to_string());
        self.messages = messages;
        self.streaming_error_message = None;
        self.run = None;
    }

    fn is_open_run(&self, run_id: u64) -> bool {
        return self
            .run
            .as_ref()
            .map(|run| return run.run_id == run_id && run.open)
            .unwrap_or(false);
    }

    /// Index of the last user or agent message. System notices added while
    /// a run is open or after it failed are not part of the exchange.
    fn last_exchange_index(&self) -> Option<usize> {
        return self
            .messages
            .iter()
            .rposition(|e| return e.role != Role::System);
    }

    fn open_agent_message(&mut self) -> Option<&mut Message> {
        let idx = self.last_exchange_index()?;
        return self.messages.get_mut(idx).filter(|e| return e.is_agent());
    }

    fn drop_failed_exchange(&mut self) {
        let idx = match self.last_exchange_index() {
            Some(idx) if idx >= 1 => idx,
            _ => return,
        };

        let failed = self.messages[idx].is_agent()
            && self.messages[idx].streaming_error
            && self.messages[idx - 1].role == Role::User;
        if failed {
            self.messages.drain(idx - 1..=idx);
        }
    }

    fn on_started(&mut self, chunk: &StreamChunk) {
        let session_id = match &chunk.session_id {
            Some(session_id) if !session_id.is_empty() => session_id.to_string(),
            _ => return,
        };
        self.session_id = Some(session_id.to_string());

        let run = match self.run.as_mut() {
            Some(run) => run,
            None => return,
        };
        if !self.has_storage || run.previous_session.as_deref() == Some(session_id.as_str()) {
            return;
        }
        if self.sessions.iter().any(|e| return e.session_id == session_id) {
            return;
        }

        self.sessions.insert(
            0,
            SessionEntry {
                session_id: session_id.to_string(),
                title: run.input.to_string(),
                created_at: chunk.created_at.unwrap_or_default(),
            },
        );
        run.registered_session = Some(session_id);
    }

    fn on_response(&mut self, chunk: &StreamChunk) {
        let idx = match self.last_exchange_index() {
            Some(idx) => idx,
            None => return,
        };
        let run = match self.run.as_mut() {
            Some(run) => run,
            None => return,
        };
        let message = match self.messages.get_mut(idx).filter(|e| return e.is_agent()) {
            Some(message) => message,
            None => return,
        };

        match &chunk.content {
            Some(RunContent::Text(text)) => {
                message.append(&content_delta(&run.last_content, text));
                run.last_content = text.to_string();

                if let Some(tools) = &chunk.tools {
                    if !tools.is_empty() {
                        message.tool_calls = tools.clone();
                    }
                }
                if let Some(extra_data) = &chunk.extra_data {
                    message.merge_extra_data(extra_data);
                }
                if let Some(created_at) = chunk.created_at {
                    message.created_at = created_at;
                }
                if chunk.images.is_some() {
                    message.images = chunk.images.clone();
                }
                if chunk.videos.is_some() {
                    message.videos = chunk.videos.clone();
                }
                if chunk.audio.is_some() {
                    message.audio = chunk.audio.clone();
                }
            }
            Some(RunContent::Structured(value)) => {
                let block = json_markdown(value);
                message.append(&block);
                run.last_content = block;
            }
            None => {
                if let Some(transcript) = chunk.transcript() {
                    message.append_transcript(transcript);
                }
            }
        }
    }

    fn on_completed(&mut self, chunk: &StreamChunk) {
        if let Some(message) = self.open_agent_message() {
            if let Some(content) = &chunk.content {
                message.content = content.to_final_text();
            }
            if let Some(tools) = &chunk.tools {
                if !tools.is_empty() {
                    message.tool_calls = tools.clone();
                }
            }
            if chunk.images.is_some() {
                message.images = chunk.images.clone();
            }
            if chunk.videos.is_some() {
                message.videos = chunk.videos.clone();
            }
            if chunk.response_audio.is_some() {
                message.response_audio = chunk.response_audio.clone();
            }
            if let Some(created_at) = chunk.created_at {
                message.created_at = created_at;
            }
            if let Some(extra_data) = &chunk.extra_data {
                message.merge_extra_data(extra_data);
            }
        }

        if let Some(run) = self.run.as_mut() {
            run.open = false;
        }
    }
}

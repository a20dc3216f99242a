#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::actions::help_text;
use super::BubbleList;
use super::PlaygroundState;
use super::Scroll;
use super::SendOutcome;
use crate::domain::models::Action;
use crate::domain::models::AgentOption;
use crate::domain::models::BackendBox;
use crate::domain::models::Loading;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::SlashCommand;
use crate::domain::models::StreamChunk;

pub struct AppState<'a> {
    pub agent: Option<AgentOption>,
    pub bubble_list: BubbleList<'a>,
    pub last_known_height: u16,
    pub last_known_width: u16,
    pub loading: Loading,
    pub playground: PlaygroundState,
    pub scroll: Scroll,
}

impl<'a> AppState<'a> {
    pub fn new(username: &str) -> AppState<'a> {
        return AppState {
            agent: None,
            bubble_list: BubbleList::new(username, "Agent"),
            last_known_height: 0,
            last_known_width: 0,
            loading: Loading::default(),
            playground: PlaygroundState::default(),
            scroll: Scroll::default(),
        };
    }

    /// Connects to the backend, resolves the agent, and restores the requested
    /// session when the agent keeps history. Problems are reported in the
    /// transcript rather than failing startup.
    pub async fn load(
        &mut self,
        backend: &BackendBox,
        agent_id: Option<String>,
        session_id: Option<String>,
        now: i64,
    ) -> Result<()> {
        let backend_name = backend.name();
        if let Err(err) = backend.health_check().await {
            self.add_message(Message::new(
                Role::System,
                &format!("Hey, it looks like the {backend_name} backend isn't reachable. Check the api-url setting before we start talking.\n\nError: {err}"),
                now,
            ));
            return Ok(());
        }

        let agents = backend.list_agents().await?;
        let agent = agent_id
            .as_ref()
            .and_then(|id| return agents.iter().find(|e| return &e.value == id))
            .cloned();

        let agent = match agent {
            Some(agent) => agent,
            None => {
                let requested = agent_id.unwrap_or_default();
                tracing::warn!(agent_id = %requested, "agent not found");
                self.add_message(Message::new(
                    Role::System,
                    &format!("Agent '{requested}' was not found. Run `dcfdesk agents` to list the agents you can talk to."),
                    now,
                ));
                return Ok(());
            }
        };

        let user_title = self.bubble_list.user_title().to_string();
        self.bubble_list = BubbleList::new(&user_title, &agent.label);
        self.playground = PlaygroundState::new(
            Some(agent.value.to_string()),
            session_id.clone(),
            agent.storage,
        );

        if agent.storage {
            self.playground.sessions = backend.list_sessions(&agent.value).await?;
        }

        if let Some(session_id) = session_id.filter(|e| return !e.is_empty()) {
            match backend.get_session(&agent.value, &session_id).await {
                Ok(record) => {
                    self.playground.load_session(&session_id, record.to_messages());
                }
                Err(err) => {
                    tracing::warn!(session_id = %session_id, error = ?err, "failed to load session");
                    self.add_message(Message::new(
                        Role::System,
                        &format!("Session {session_id} could not be loaded, replies will continue it anyway.\n\nError: {err}"),
                        now,
                    ));
                }
            }
        }

        if self.playground.messages.is_empty() {
            self.add_message(Message::new(
                Role::System,
                &format!(
                    "Hey there! {} ({}) is ready. Type /help to see what you can do.",
                    agent.label, agent.model
                ),
                now,
            ));
        }

        self.agent = Some(agent);
        self.sync_dependants();
        self.scroll.last();

        return Ok(());
    }

    /// Returns `(should_break, should_continue)` for the input loop.
    pub fn handle_slash_commands(&mut self, input: &str, now: i64) -> Result<(bool, bool)> {
        let command = match SlashCommand::parse(input) {
            Some(command) => command,
            None => return Ok((false, false)),
        };

        if command.is_quit() {
            return Ok((true, false));
        }

        if command.is_new_session() {
            if self.playground.is_streaming() {
                return Ok((false, true));
            }
            self.playground.start_new_session();
            self.add_message(Message::new(
                Role::System,
                "Started a new session. Your next message opens a fresh thread.",
                now,
            ));
            return Ok((false, true));
        }

        if command.is_help() {
            self.add_message(Message::new(Role::System, &help_text(), now));
            return Ok((false, true));
        }

        return Ok((false, false));
    }

    /// Sends the input to the agent. Returns false when nothing was sent.
    pub fn submit(
        &mut self,
        input: &str,
        now: i64,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<bool> {
        match self.playground.begin_send(input, now) {
            SendOutcome::Started(request) => {
                tx.send(Action::AgentRun(request))?;
                self.sync_dependants();
                self.scroll.last();
                return Ok(true);
            }
            SendOutcome::Busy => {
                tracing::debug!("ignoring input while a run is streaming");
                return Ok(false);
            }
            SendOutcome::MissingAgent => {
                tracing::warn!("no agent selected, input ignored");
                return Ok(false);
            }
        }
    }

    /// Stops the streaming run, if any.
    pub fn abort(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        if !self.playground.is_streaming() {
            return Ok(());
        }

        tx.send(Action::AgentAbort())?;
        self.playground.abort();
        self.sync_dependants();

        return Ok(());
    }

    pub fn handle_run_chunk(&mut self, run_id: u64, chunk: StreamChunk) {
        self.playground.apply_chunk(run_id, &chunk);
        self.sync_dependants();
    }

    pub fn handle_run_failed(&mut self, run_id: u64, err: &str) {
        self.playground.fail(run_id, err);
        self.sync_dependants();
    }

    pub fn handle_run_finished(&mut self, run_id: u64) {
        self.playground.finish(run_id);
        self.sync_dependants();
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    pub fn add_message(&mut self, message: Message) {
        self.playground.messages.push(message);
        self.sync_dependants();
        self.scroll.last();
    }

    fn sync_dependants(&mut self) {
        self.bubble_list
            .set_messages(&self.playground.messages, self.last_known_width as usize);

        self.scroll
            .set_state(self.bubble_list.len() as u16, self.last_known_height);

        if self.playground.is_streaming() {
            self.scroll.last();
        }
    }
}

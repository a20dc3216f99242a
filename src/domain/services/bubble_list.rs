use std::collections::HashMap;

use ratatui::prelude::Backend;
use ratatui::prelude::Rect;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::Bubble;
use super::BubbleAlignment;
use crate::domain::models::Message;
use crate::domain::models::Role;

#[cfg(test)]
#[path = "bubble_list_test.rs"]
mod tests;

struct BubbleCacheEntry<'a> {
    content_len: usize,
    tool_count: usize,
    streaming_error: bool,
    lines: Vec<Line<'a>>,
}

impl BubbleCacheEntry<'_> {
    fn matches(&self, message: &Message) -> bool {
        return self.content_len == message.content.len()
            && self.tool_count == message.tool_calls.len()
            && self.streaming_error == message.streaming_error;
    }
}

/// Rendered transcript. Bubbles are cached per message index and rebuilt
/// when the message changes or the width does.
pub struct BubbleList<'a> {
    cache: HashMap<usize, BubbleCacheEntry<'a>>,
    line_width: usize,
    lines_len: usize,
    agent_title: String,
    user_title: String,
}

impl<'a> BubbleList<'a> {
    pub fn new(user_title: &str, agent_title: &str) -> BubbleList<'a> {
        return BubbleList {
            cache: HashMap::new(),
            line_width: 0,
            lines_len: 0,
            agent_title: agent_title.to_string(),
            user_title: user_title.to_string(),
        };
    }

    pub fn user_title(&self) -> &str {
        return &self.user_title;
    }

    fn title(&self, role: &Role) -> String {
        match role {
            Role::User => return self.user_title.to_string(),
            Role::Agent | Role::Tool => return self.agent_title.to_string(),
            Role::System => return env!("CARGO_PKG_NAME").to_string(),
        }
    }

    pub fn set_messages(&mut self, messages: &[Message], line_width: usize) {
        if self.line_width != line_width {
            self.cache.clear();
            self.line_width = line_width;
        }
        self.cache.retain(|idx, _| return *idx < messages.len());

        self.lines_len = messages
            .iter()
            .enumerate()
            .map(|(idx, message)| {
                if let Some(cache_entry) = self.cache.get(&idx) {
                    if cache_entry.matches(message) {
                        return cache_entry.lines.len();
                    }
                }

                let mut align = BubbleAlignment::Left;
                if message.role == Role::User {
                    align = BubbleAlignment::Right;
                }

                let title = self.title(&message.role);
                let bubble_lines = Bubble::new(message, align, &title, line_width).as_lines();
                let bubble_line_len = bubble_lines.len();

                self.cache.insert(
                    idx,
                    BubbleCacheEntry {
                        content_len: message.content.len(),
                        tool_count: message.tool_calls.len(),
                        streaming_error: message.streaming_error,
                        lines: bubble_lines,
                    },
                );

                return bubble_line_len;
            })
            .sum();
    }

    pub fn len(&self) -> usize {
        return self.lines_len;
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect, scroll: u16) {
        let mut indexes: Vec<usize> = self.cache.keys().cloned().collect();
        indexes.sort();
        let lines: Vec<Line<'a>> = indexes
            .iter()
            .filter_map(|idx| return self.cache.get(idx))
            .flat_map(|entry| return entry.lines.to_owned())
            .collect();

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default())
                .scroll((scroll, 0)),
            rect,
        );
    }
}

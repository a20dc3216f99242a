#[cfg(test)]
#[path = "bubble_test.rs"]
mod tests;

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use crate::domain::models::Message;
use crate::domain::models::Role;

#[derive(PartialEq, Eq)]
pub enum BubbleAlignment {
    Left,
    Right,
}

pub struct BubbleConfig {
    pub bubble_padding: usize,
    pub border_elements_length: usize,
    pub outer_padding_percentage: f32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Text,
    Code,
    Tool,
}

pub struct Bubble<'a> {
    alignment: BubbleAlignment,
    message: &'a Message,
    title: String,
    window_max_width: usize,
}

fn fill(text: &str, total: usize, used: usize) -> String {
    return text.repeat(total.saturating_sub(used));
}

/// Greedy word wrap on character counts. Words longer than the line are
/// hard split.
fn wrap(line: &str, max_line_length: usize) -> Vec<String> {
    if max_line_length == 0 || line.chars().count() <= max_line_length {
        return vec![line.to_string()];
    }

    let mut wrapped = vec![];
    let mut current = String::new();
    for word in line.split(' ') {
        let mut word = word.to_string();
        while word.chars().count() > max_line_length {
            if !current.is_empty() {
                wrapped.push(current);
                current = String::new();
            }
            let head = word.chars().take(max_line_length).collect::<String>();
            word = word.chars().skip(max_line_length).collect::<String>();
            wrapped.push(head);
        }

        let current_len = current.chars().count();
        if current_len == 0 {
            current = word;
        } else if current_len + 1 + word.chars().count() <= max_line_length {
            current.push(' ');
            current.push_str(&word);
        } else {
            wrapped.push(current);
            current = word;
        }
    }
    wrapped.push(current);

    return wrapped;
}

impl<'a> Bubble<'a> {
    pub fn new(
        message: &'a Message,
        alignment: BubbleAlignment,
        title: &str,
        window_max_width: usize,
    ) -> Bubble<'a> {
        return Bubble {
            alignment,
            message,
            title: title.to_string(),
            window_max_width,
        };
    }

    pub fn style_config() -> BubbleConfig {
        return BubbleConfig {
            // Unicode character border + padding.
            bubble_padding: 8,
            // left border + left padding + right padding + right border + scrollbar.
            border_elements_length: 5,
            outer_padding_percentage: 0.04,
        };
    }

    /// Message body split into typed lines: text, fenced code, and one line
    /// per tool the agent called.
    fn body(&self) -> Vec<(LineKind, String)> {
        let mut body = vec![];
        let mut in_codeblock = false;
        for line in self.message.content.lines() {
            let line = line.replace('\t', "  ");
            if line.trim().starts_with("```") {
                in_codeblock = !in_codeblock;
                body.push((LineKind::Code, line));
            } else if in_codeblock {
                body.push((LineKind::Code, line));
            } else {
                body.push((LineKind::Text, line));
            }
        }

        if body.is_empty() {
            if self.message.streaming_error {
                body.push((LineKind::Text, "No response".to_string()));
            } else {
                body.push((LineKind::Text, "...".to_string()));
            }
        }

        let tools = self.message.tool_names();
        if !tools.is_empty() {
            body.push((LineKind::Text, "".to_string()));
            for tool in tools {
                body.push((LineKind::Tool, format!("[tool] {tool}")));
            }
        }

        return body;
    }

    pub fn as_lines(&self) -> Vec<Line<'static>> {
        let body = self.body();
        let max_line_length = self.get_max_line_length(&body);

        let mut lines = vec![];
        for (kind, text) in body {
            for segment in wrap(&text, max_line_length) {
                lines.push(self.spans_to_line(kind, segment, max_line_length));
            }
        }

        return self.wrap_lines_in_bubble(lines, max_line_length);
    }

    fn spans_to_line(
        &self,
        kind: LineKind,
        text: String,
        max_line_length: usize,
    ) -> Line<'static> {
        let text_len = text.chars().count();
        let padding = fill(" ", max_line_length, text_len);
        let style = match kind {
            LineKind::Text => Style::default(),
            LineKind::Code => Style {
                fg: Some(Color::Cyan),
                ..Style::default()
            },
            LineKind::Tool => Style {
                fg: Some(Color::Yellow),
                ..Style::default()
            },
        };

        let mut wrapped_spans = vec![
            self.highlight_span("│ ".to_string()),
            Span::styled(text, style),
            self.highlight_span(format!("{padding} │")),
        ];

        let outer_bubble_padding = fill(
            " ",
            self.window_max_width,
            max_line_length + Bubble::style_config().bubble_padding,
        );

        if self.alignment == BubbleAlignment::Left {
            wrapped_spans.push(Span::from(outer_bubble_padding));
            return Line::from(wrapped_spans);
        }

        let mut line_spans = vec![Span::from(outer_bubble_padding)];
        line_spans.extend(wrapped_spans);

        return Line::from(line_spans);
    }

    fn get_max_line_length(&self, body: &[(LineKind, String)]) -> usize {
        let style_config = Bubble::style_config();
        // Add a minimum 4% of padding on the side.
        let min_bubble_padding_length = ((self.window_max_width as f32
            * style_config.outer_padding_percentage)
            .ceil()) as usize;
        let line_border_width = style_config.border_elements_length + min_bubble_padding_length;

        let mut max_line_length = body
            .iter()
            .map(|(_, line)| return line.chars().count())
            .max()
            .unwrap_or(0);

        let available = self.window_max_width.saturating_sub(line_border_width);
        if max_line_length > available {
            max_line_length = available;
        }

        let title_len = self.title.chars().count();
        if max_line_length < title_len {
            max_line_length = title_len;
        }

        return max_line_length;
    }

    fn wrap_lines_in_bubble(
        &self,
        lines: Vec<Line<'static>>,
        max_line_length: usize,
    ) -> Vec<Line<'static>> {
        // Add 2 for the vertical bars.
        let title_len = self.title.chars().count();
        let top_bar = format!(
            "╭{}{}╮",
            self.title,
            fill("─", max_line_length + 2, title_len)
        );
        let bottom_bar = format!("╰{}╯", "─".repeat(max_line_length + 2));
        let bar_bubble_padding = fill(
            " ",
            self.window_max_width,
            max_line_length + Bubble::style_config().bubble_padding,
        );

        let mut res = vec![];
        if self.alignment == BubbleAlignment::Left {
            res.push(self.highlight_line(format!("{top_bar}{bar_bubble_padding}")));
            res.extend(lines);
            res.push(self.highlight_line(format!("{bottom_bar}{bar_bubble_padding}")));
        } else {
            res.push(self.highlight_line(format!("{bar_bubble_padding}{top_bar}")));
            res.extend(lines);
            res.push(self.highlight_line(format!("{bar_bubble_padding}{bottom_bar}")));
        }

        return res;
    }

    fn highlight_span(&self, text: String) -> Span<'static> {
        if self.message.streaming_error {
            return Span::styled(
                text,
                Style {
                    fg: Some(Color::Red),
                    ..Style::default()
                },
            );
        } else if self.message.role == Role::System {
            return Span::styled(
                text,
                Style {
                    fg: Some(Color::Rgb(138, 85, 63)), // Brown
                    ..Style::default()
                },
            );
        }

        return Span::from(text);
    }

    fn highlight_line(&self, text: String) -> Line<'static> {
        return Line::from(self.highlight_span(text));
    }
}

use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;

pub struct TextArea {}

impl<'a> TextArea {
    pub fn default() -> tui_textarea::TextArea<'a> {
        return TextArea::with_title("Message the agent (Enter to send)");
    }

    /// Input box shown while a run is streaming. Typing is blocked until the
    /// run ends.
    pub fn busy() -> tui_textarea::TextArea<'a> {
        return TextArea::with_title("Agent is responding (CTRL+C to stop)");
    }

    pub fn with_title(title: &str) -> tui_textarea::TextArea<'a> {
        let mut textarea = tui_textarea::TextArea::default();
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(title.to_string())
                .padding(Padding::new(1, 1, 0, 0)),
        );

        return textarea;
    }
}

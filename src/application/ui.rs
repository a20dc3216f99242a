use std::io;

use anyhow::Result;
use chrono::Utc;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::Terminal;
use tokio::sync::mpsc;
#[cfg(feature = "dev")]
use tui_textarea::Input;
#[cfg(feature = "dev")]
use tui_textarea::Key;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::Event;
use crate::domain::models::TextArea;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;

fn now() -> i64 {
    return Utc::now().timestamp();
}

fn input_textarea<'a>(app_state: &AppState<'_>) -> tui_textarea::TextArea<'a> {
    if let Some(err) = &app_state.playground.streaming_error_message {
        return TextArea::with_title(&format!(
            "Last reply failed: {err}. Send again to retry"
        ));
    }

    return TextArea::default();
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<'_>,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut events = EventsService::new(rx);
    let mut textarea = input_textarea(app_state);
    let busy_textarea = TextArea::busy();

    #[cfg(feature = "dev")]
    {
        let test_str = "Walk me through how the discount rate changes the valuation.";
        for char in test_str.chars() {
            textarea.input(Input {
                key: Key::Char(char),
                ctrl: false,
                alt: false,
            });
        }
    }

    loop {
        terminal.draw(|frame| {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![Constraint::Min(1), Constraint::Max(4)])
                .split(frame.size());

            if layout[0].width != app_state.last_known_width
                || layout[0].height != app_state.last_known_height
            {
                app_state.set_rect(layout[0]);
            }

            app_state
                .bubble_list
                .render(frame, layout[0], app_state.scroll.position);

            if !app_state.playground.input_focused {
                let waiting_for_text = app_state
                    .playground
                    .messages
                    .last()
                    .map(|e| return e.content.is_empty())
                    .unwrap_or(true);
                if waiting_for_text {
                    app_state.loading.render(frame, layout[1]);
                } else {
                    frame.render_widget(busy_textarea.widget(), layout[1]);
                }
            } else {
                frame.render_widget(textarea.widget(), layout[1]);
            }
        })?;

        let was_focused = app_state.playground.input_focused;
        match events.next().await? {
            Event::RunChunk(run_id, chunk) => {
                app_state.handle_run_chunk(run_id, chunk);
            }
            Event::RunFailed(run_id, err) => {
                app_state.handle_run_failed(run_id, &err);
            }
            Event::RunFinished(run_id) => {
                app_state.handle_run_finished(run_id);
            }
            Event::UITick() => {
                app_state.loading.tick();
            }
            Event::UIScrollDown() => {
                app_state.scroll.down();
            }
            Event::UIScrollUp() => {
                app_state.scroll.up();
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::KeyboardCTRLC() => {
                if !app_state.playground.is_streaming() {
                    break;
                }
                app_state.abort(&tx)?;
            }
            Event::KeyboardEnter() => {
                if !app_state.playground.input_focused {
                    continue;
                }

                let input_str = textarea.lines().join("\n");
                if input_str.trim().is_empty() {
                    continue;
                }

                let (should_break, should_continue) =
                    app_state.handle_slash_commands(&input_str, now())?;
                if should_break {
                    break;
                }
                if should_continue {
                    textarea = input_textarea(app_state);
                    continue;
                }

                if app_state.submit(&input_str, now(), &tx)? {
                    textarea = input_textarea(app_state);
                }
            }
            Event::KeyboardPaste(text) => {
                if app_state.playground.input_focused {
                    for char in text.replace("\r\n", "\n").chars() {
                        if char == '\n' || char == '\r' {
                            textarea.insert_newline();
                        } else {
                            textarea.insert_char(char);
                        }
                    }
                }
            }
            Event::KeyboardCharInput(input) => {
                if app_state.playground.input_focused {
                    textarea.input(input);
                }
            }
        }

        // The run ended, however it ended. Hand the input box back.
        if !was_focused && app_state.playground.input_focused {
            textarea = input_textarea(app_state);
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
    backend: BackendBox,
) -> Result<()> {
    let mut app_state = AppState::new(&Config::get(ConfigKey::Username));
    app_state
        .load(
            &backend,
            Config::get_opt(ConfigKey::Agent),
            Config::get_opt(ConfigKey::SessionID),
            now(),
        )
        .await?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    start_loop(&mut terminal, &mut app_state, tx, rx).await?;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return Ok(());
}

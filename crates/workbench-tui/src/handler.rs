use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use workbench_core::Mode;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::IngestFinished(result) => app.finish_ingestion(result),
        AppEvent::QueryFinished(ticket, result) => app.finish_query(ticket, result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_file_picker {
        handle_file_picker(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to the input box
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
            app.input_cursor = app.workbench.input.chars().count();
        }

        // Half-page scroll (must be before plain 'u' to match first)
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_up(10),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_down(10),

        // Ingestion
        KeyCode::Char('o') => app.open_file_picker(),
        KeyCode::Char('u') => app.submit_ingestion(),

        // Mode selection
        KeyCode::Char('m') => app.toggle_mode(),
        KeyCode::Char('1') => app.set_mode(Mode::Simple),
        KeyCode::Char('2') => app.set_mode(Mode::Agentic),

        KeyCode::Char('c') => app.show_contexts = !app.show_contexts,

        // Transcript scrolling
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Char('g') => app.scroll_up(u16::MAX),
        KeyCode::Char('G') => app.scroll_to_latest(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.submit_query(),
        _ => edit_line(&mut app.workbench.input, &mut app.input_cursor, key.code),
    }
}

fn handle_file_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_file_picker(),
        KeyCode::Enter => app.confirm_file_picker(),
        _ => {
            edit_line(&mut app.file_input, &mut app.file_input_cursor, key.code);
            app.file_picker_error = None;
        }
    }
}

/// Single-line editing shared by the chat input and the file picker
fn edit_line(text: &mut String, cursor: &mut usize, code: KeyCode) {
    match code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = text.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = text.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = text.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(3),
        MouseEventKind::ScrollDown => app.scroll_down(3),
        _ => {}
    }
}

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::debug;
use workbench_core::{ApiError, ChatResponse, IngestResponse, Mode, QueryTicket, RagClient, Workbench};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub workbench: Workbench,

    // Chat input
    pub input_cursor: usize, // cursor position in workbench.input (chars)

    // Transcript view
    pub scroll_from_bottom: u16, // 0 follows the newest message
    pub scroll_limit: u16,       // rows hidden above the view at the last draw
    pub show_contexts: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // File picker popup
    pub show_file_picker: bool,
    pub file_input: String,
    pub file_input_cursor: usize,
    pub file_picker_error: Option<String>,

    pub client: RagClient,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(client: RagClient, mode: Mode, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            workbench: Workbench::new(mode),

            input_cursor: 0,

            scroll_from_bottom: 0,
            scroll_limit: 0,
            show_contexts: false,

            animation_frame: 0,

            show_file_picker: false,
            file_input: String::new(),
            file_input_cursor: 0,
            file_picker_error: None,

            client,
            events,
        }
    }

    /// Send the pending input to the backend. The user turn shows up right
    /// away; the answer arrives later as `AppEvent::QueryFinished`.
    pub fn submit_query(&mut self) {
        let Some(ticket) = self.workbench.submit_input() else {
            return;
        };
        self.input_cursor = 0;
        self.scroll_to_latest();

        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = ticket.send(&client).await;
            let _ = tx.send(AppEvent::QueryFinished(ticket, result));
        });
    }

    pub fn finish_query(&mut self, ticket: QueryTicket, result: Result<ChatResponse, ApiError>) {
        self.workbench.finish_query(&ticket, result);
        self.scroll_to_latest();
    }

    /// Upload the selected file, if any
    pub fn submit_ingestion(&mut self) {
        let Some(ticket) = self.workbench.begin_ingestion() else {
            return;
        };

        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = ticket.send(&client).await;
            let _ = tx.send(AppEvent::IngestFinished(result));
        });
    }

    pub fn finish_ingestion(&mut self, result: Result<IngestResponse, ApiError>) {
        self.workbench.finish_ingestion(result);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.workbench.set_mode(mode);
    }

    pub fn toggle_mode(&mut self) {
        let next = self.workbench.mode().toggled();
        self.set_mode(next);
    }

    // File picker

    pub fn open_file_picker(&mut self) {
        self.show_file_picker = true;
        self.file_input = self
            .workbench
            .upload()
            .selected_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.file_input_cursor = self.file_input.chars().count();
        self.file_picker_error = None;
    }

    pub fn close_file_picker(&mut self) {
        self.show_file_picker = false;
        self.file_input.clear();
        self.file_input_cursor = 0;
        self.file_picker_error = None;
    }

    /// Select the typed path if it names an existing PDF; otherwise keep the
    /// picker open with an explanation.
    pub fn confirm_file_picker(&mut self) {
        match validate_pdf_path(&self.file_input) {
            Ok(path) => {
                debug!(path = %path.display(), "file selected");
                self.workbench.select_file(path);
                self.close_file_picker();
            }
            Err(reason) => self.file_picker_error = Some(reason),
        }
    }

    // Transcript scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self
            .scroll_from_bottom
            .saturating_add(lines)
            .min(self.scroll_limit);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn scroll_to_latest(&mut self) {
        self.scroll_from_bottom = 0;
    }

    /// Record how far the transcript can scroll at the current size
    pub fn set_scroll_limit(&mut self, limit: u16) {
        self.scroll_limit = limit;
        self.scroll_from_bottom = self.scroll_from_bottom.min(limit);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.workbench.is_loading() || self.workbench.upload().is_uploading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

/// File-picker restriction: an existing file with a `.pdf` extension.
/// A leading `~` expands to the home directory.
pub fn validate_pdf_path(input: &str) -> Result<PathBuf, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Enter a path to a PDF file".to_string());
    }

    let path = match trimmed.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(trimmed),
        },
        None => PathBuf::from(trimmed),
    };

    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err("Only .pdf files can be ingested".to_string());
    }
    if !path.is_file() {
        return Err(format!("No such file: {}", path.display()));
    }
    Ok(path)
}

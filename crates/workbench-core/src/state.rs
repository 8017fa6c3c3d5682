//! UI-agnostic conversation state
//!
//! `Workbench` is the single state container behind every front end. Front
//! ends mutate it through the transition methods below and re-derive their
//! view from it afterwards. Network calls happen outside: a `begin_*` /
//! `submit_*` transition hands out a ticket, the caller runs the request, and
//! the matching `finish_*` transition applies the outcome.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::mode::Mode;
use crate::models::{ChatResponse, IngestResponse, Message};
use crate::workflow::{IngestTicket, QueryTicket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    InProgress,
    Success,
    Error,
}

/// Ingestion lifecycle of the currently selected file
#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub selected_file: Option<PathBuf>,
    pub status: UploadStatus,
    pub status_message: String,
}

impl UploadState {
    pub fn is_uploading(&self) -> bool {
        self.status == UploadStatus::InProgress
    }

    /// File name of the selection, for display
    pub fn selected_name(&self) -> Option<String> {
        self.selected_file.as_ref().map(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbench {
    transcript: Vec<Message>,
    upload: UploadState,
    mode: Mode,
    loading: bool,
    /// Pending chat input
    pub input: String,
}

impl Workbench {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Only affects queries submitted from now on
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!(from = self.mode.as_str(), to = mode.as_str(), "mode changed");
        }
        self.mode = mode;
    }

    // Ingestion workflow

    pub fn select_file(&mut self, path: impl AsRef<Path>) {
        self.upload.selected_file = Some(path.as_ref().to_path_buf());
        self.upload.status = UploadStatus::Idle;
        self.upload.status_message.clear();
    }

    /// Mark an upload as started. `None` when no file is selected.
    pub fn begin_ingestion(&mut self) -> Option<IngestTicket> {
        let path = self.upload.selected_file.clone()?;
        self.upload.status = UploadStatus::InProgress;
        Some(IngestTicket { path })
    }

    /// Apply the outcome of an upload. The latest completion wins, even if the
    /// selection changed in the meantime.
    pub fn finish_ingestion(&mut self, result: Result<IngestResponse, ApiError>) {
        match result {
            Ok(receipt) => {
                info!(file = %receipt.filename, chunks = receipt.chunks_count, "document ingested");
                self.upload.status = UploadStatus::Success;
                self.upload.status_message = format!(
                    "Successfully ingested: {} ({} chunks)",
                    receipt.filename, receipt.chunks_count
                );
            }
            Err(err) => {
                warn!(error = %err, "ingestion failed");
                debug!(error = ?err, "ingestion error details");
                self.upload.status = UploadStatus::Error;
                self.upload.status_message = err.user_message("Upload failed");
            }
        }
    }

    // Chat workflow

    /// Submit the pending input, see [`Workbench::submit_query`]
    pub fn submit_input(&mut self) -> Option<QueryTicket> {
        let text = self.input.clone();
        self.submit_query(&text)
    }

    /// Append the user turn, clear the input, and raise the loading flag.
    ///
    /// Blank text is ignored. The returned ticket pins the mode in effect now.
    pub fn submit_query(&mut self, text: &str) -> Option<QueryTicket> {
        if text.trim().is_empty() {
            return None;
        }
        self.transcript.push(Message::user(text));
        self.input.clear();
        self.loading = true;
        Some(QueryTicket {
            mode: self.mode,
            query: text.to_string(),
        })
    }

    /// Append the assistant turn for a finished query and drop the loading flag
    pub fn finish_query(&mut self, ticket: &QueryTicket, result: Result<ChatResponse, ApiError>) {
        match result {
            Ok(response) => {
                info!(
                    mode = ticket.mode.as_str(),
                    sources = response.sources.len(),
                    "answer received"
                );
                self.transcript.push(Message::assistant(response));
            }
            Err(err) => {
                warn!(mode = ticket.mode.as_str(), error = %err, "chat query failed");
                debug!(error = ?err, "chat error details");
                let reason = err.detail().map(str::to_string).unwrap_or_else(|| err.to_string());
                self.transcript.push(Message::failure(format!("Error: {}", reason)));
            }
        }
        self.loading = false;
    }
}

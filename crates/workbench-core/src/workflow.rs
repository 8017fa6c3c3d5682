//! Request tickets and one-shot drivers for the two workflows
//!
//! Interactive front ends spawn `ticket.send(..)` and feed the result back
//! into the `Workbench` when it arrives. Scripted callers can use
//! [`submit_ingestion`] / [`submit_query`], which do the whole round trip
//! inline.

use std::path::PathBuf;

use crate::client::RagClient;
use crate::error::ApiError;
use crate::mode::Mode;
use crate::models::{ChatResponse, IngestResponse};
use crate::state::Workbench;

/// An upload that has been started but not finished
#[derive(Debug, Clone)]
pub struct IngestTicket {
    pub path: PathBuf,
}

impl IngestTicket {
    pub async fn send(&self, client: &RagClient) -> Result<IngestResponse, ApiError> {
        client.ingest(&self.path).await
    }
}

/// A chat query that has been submitted but not answered
#[derive(Debug, Clone)]
pub struct QueryTicket {
    /// Mode in effect at submission time
    pub mode: Mode,
    pub query: String,
}

impl QueryTicket {
    pub async fn send(&self, client: &RagClient) -> Result<ChatResponse, ApiError> {
        client.chat(self.mode, &self.query).await
    }
}

/// Upload the selected file and record the outcome. Returns `false` when no
/// file was selected.
pub async fn submit_ingestion(workbench: &mut Workbench, client: &RagClient) -> bool {
    let Some(ticket) = workbench.begin_ingestion() else {
        return false;
    };
    let result = ticket.send(client).await;
    workbench.finish_ingestion(result);
    true
}

/// Ask one question and record the answer (or the failure) in the
/// transcript. Returns `false` for blank text.
pub async fn submit_query(workbench: &mut Workbench, client: &RagClient, text: &str) -> bool {
    let Some(ticket) = workbench.submit_query(text) else {
        return false;
    };
    let result = ticket.send(client).await;
    workbench.finish_query(&ticket, result);
    true
}

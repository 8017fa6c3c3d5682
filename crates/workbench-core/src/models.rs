//! Transcript types and the wire format of the RAG backend
//!
//! Transcript types are shared by every front end and don't depend on any
//! UI framework. Wire types mirror the JSON bodies of `/ingest`,
//! `/chat/simple` and `/chat/agentic`.

use serde::{Deserialize, Serialize};

/// The role of a transcript entry's author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A passage the backend cited while answering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Originating document, usually the uploaded filename
    pub source: String,
    /// 1-based page within the document
    pub page: u32,
    /// Excerpt of the cited chunk
    pub content: String,
}

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    /// Raw retrieved snippets, only returned by the simple pipeline
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<String>,
    /// Set on assistant turns that stand in for a failed request
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
            contexts: Vec::new(),
            error: false,
        }
    }

    pub fn assistant(response: ChatResponse) -> Self {
        Self {
            role: Role::Assistant,
            content: response.answer,
            sources: response.sources,
            contexts: response.contexts,
            error: false,
        }
    }

    /// Assistant turn standing in for a failed request
    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources: Vec::new(),
            contexts: Vec::new(),
            error: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub contexts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestResponse {
    pub filename: String,
    pub chunks_count: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body of a non-2xx response (`{"detail": ...}`)
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// String details pass through; structured ones (validation errors) are
    /// rendered as compact JSON.
    pub(crate) fn into_detail(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agentic_response_without_contexts() {
        let body = r#"{"answer": "42", "sources": [{"source": "doc.pdf", "page": 3, "content": "..."}]}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.answer, "42");
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].page, 3);
        assert!(response.contexts.is_empty());
    }

    #[test]
    fn test_assistant_message_keeps_source_order() {
        let response = ChatResponse {
            answer: "a".to_string(),
            sources: vec![
                Source { source: "b.pdf".into(), page: 2, content: String::new() },
                Source { source: "a.pdf".into(), page: 1, content: String::new() },
                Source { source: "b.pdf".into(), page: 2, content: String::new() },
            ],
            contexts: vec!["ctx".into()],
        };
        let msg = Message::assistant(response);
        assert_eq!(msg.role, Role::Assistant);
        let names: Vec<&str> = msg.sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf", "b.pdf"]);
        assert_eq!(msg.contexts, vec!["ctx".to_string()]);
    }

    #[test]
    fn test_error_body_detail_variants() {
        let text: ErrorBody = serde_json::from_str(r#"{"detail": "bad file"}"#).unwrap();
        assert_eq!(text.into_detail().as_deref(), Some("bad file"));

        let missing: ErrorBody = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(missing.into_detail(), None);

        let structured: ErrorBody =
            serde_json::from_str(r#"{"detail": [{"msg": "field required"}]}"#).unwrap();
        assert_eq!(structured.into_detail().as_deref(), Some(r#"[{"msg":"field required"}]"#));
    }

    #[test]
    fn test_user_message_serializes_without_empty_lists() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));

        let failed = serde_json::to_value(Message::failure("Error: down")).unwrap();
        assert_eq!(failed["error"], serde_json::json!(true));
    }
}

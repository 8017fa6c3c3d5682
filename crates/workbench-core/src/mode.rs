use serde::{Deserialize, Serialize};

/// Which backend pipeline answers chat queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Simple,
    Agentic,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Simple => "simple",
            Mode::Agentic => "agentic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Some(Mode::Simple),
            "agentic" => Some(Mode::Agentic),
            _ => None,
        }
    }

    pub fn all() -> Vec<Mode> {
        vec![Mode::Simple, Mode::Agentic]
    }

    /// Tab label shown in the mode selector
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Simple => "Simple RAG (Retrieve-Read)",
            Mode::Agentic => "Agentic RAG (LangGraph)",
        }
    }

    /// Short name used in status lines ("Simple", "Agentic")
    pub fn title(&self) -> &'static str {
        match self {
            Mode::Simple => "Simple",
            Mode::Agentic => "Agentic",
        }
    }

    /// Backend path this mode posts chat queries to
    pub fn endpoint(&self) -> &'static str {
        match self {
            Mode::Simple => "/chat/simple",
            Mode::Agentic => "/chat/agentic",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::Simple => Mode::Agentic,
            Mode::Agentic => Mode::Simple,
        }
    }
}

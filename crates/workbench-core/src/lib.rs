pub mod client;
pub mod config;
pub mod error;
pub mod mode;
pub mod models;
pub mod state;
pub mod workflow;

// Re-export main types for convenience
pub use client::RagClient;
pub use config::Config;
pub use error::ApiError;
pub use mode::Mode;
pub use models::{ChatResponse, IngestResponse, Message, Role, Source};
pub use state::{UploadState, UploadStatus, Workbench};
pub use workflow::{IngestTicket, QueryTicket};

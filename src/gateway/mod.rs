pub mod client;
pub mod fallback;
pub mod types;

pub use client::{ChatModel, CompletionClient, MockChatModel};
pub use types::{ChatMessage, ContentPart, GenerateOptions, MessageContent, Role};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// No credential configured. Resolved locally by the offline fallback;
    /// never surfaced through `CompletionClient::generate`.
    #[error("no API credential configured")]
    MissingCredential,

    #[error("network error: {0}")]
    Network(String),

    #[error("completion endpoint returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("response parsing error: {0}")]
    ResponseParsing(String),

    #[error("streaming error: {0}")]
    Stream(String),
}

pub mod client;
pub mod parser;
pub mod prompt;
pub mod summary;

pub use client::*;
pub use parser::*;
pub use prompt::*;
pub use summary::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("language model client not configured — set OPENAI_API_KEY")]
    ClientUnconfigured,

    #[error("cannot reach the completion endpoint at {0}")]
    Connection(String),

    #[error("completion request timed out after {0}s")]
    Timeout(u64),

    #[error("completion endpoint returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("response parsing error: {0}")]
    ResponseParsing(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("no parameters to summarize")]
    NoParameters,
}

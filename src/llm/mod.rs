pub mod client;

pub use client::{LLMClient, LlmCollaborator, RetryPolicy};

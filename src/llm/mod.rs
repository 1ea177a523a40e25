pub mod gemini;
pub mod prompt;
pub mod provider;
pub mod types;

pub use gemini::{GeminiChat, GeminiEmbeddings};
pub use provider::{CompletionProvider, EmbeddingProvider, ProviderError};
pub use types::{ChatMessage, ChatRequest};

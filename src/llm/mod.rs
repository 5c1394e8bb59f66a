pub mod groq;
pub mod provider;
pub mod service;
pub mod types;


pub use groq::GroqProvider;
pub use provider::{FragmentReceiver, LlmProvider};
pub use service::GenerationService;
pub use types::{ChatMessage, ChatRequest, GenerateParams};

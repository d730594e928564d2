pub mod llm;

pub use llm::{BlockingModel, ChatMessage, JsonSchemaFormat, LLMClient, LanguageModel, ResponseFormat};

pub mod factory;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod openrouter;

pub use factory::create_provider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use openrouter::OpenRouterProvider;

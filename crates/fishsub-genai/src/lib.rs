//! GenAI call envelope (C1): prompt registry, retry policy, and the bounded
//! gateway that funnels every classify/extract/evaluate call through a
//! single process-wide semaphore.

pub mod gateway;
pub mod prompts;
pub mod retry;

pub use gateway::{GenAiGateway, GenAiProvider, HttpGenAiProvider, ProviderError};
pub use prompts::{default_registry, Prompt, PromptRegistry};

pub mod gateway;
pub mod gemini;
pub mod prompt;

// Re-export commonly used items
pub use gateway::{GenerationGateway, GenerationOutcome, TextCompletion};
pub use gemini::{GeminiCompletion, GeminiConfig};
pub use prompt::{PromptAssembler, ADVISOR_PERSONA};

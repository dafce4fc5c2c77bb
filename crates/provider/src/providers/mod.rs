//! Generative-text provider implementations.

mod gemini;
mod groq;

pub use gemini::GeminiClient;
pub use groq::GroqClient;

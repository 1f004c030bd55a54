//! Generative provider implementations
//!
//! Concrete implementations of the `RankingProvider` trait. Each provider
//! is a single-attempt client: transport or parse trouble surfaces as a
//! `CollaboratorError` and the engines recover via their fallback paths.

pub mod gemini;

pub use gemini::{GeminiClient, GeminiProvider};

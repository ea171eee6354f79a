//! Generative backend
//!
//! The insight generator talks to exactly one seam: `generate(prompt)` in,
//! free text out. Any non-success is surfaced as an error for the caller to
//! treat as a recoverable stage failure, never propagated further.

pub mod gemini;

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Issues one blocking generation call
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub use gemini::GeminiBackend;

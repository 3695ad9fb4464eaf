//! Service layer for the remote APIs.
//!
//! This module contains the clients for:
//! - Text generation (`GeminiClient`, behind the `TextGenerator` trait)
//! - Account sessions (`AuthClient`)
//! - Prompt construction (`prompts`)

pub mod auth;
pub mod gemini;
pub mod prompts;

pub use auth::{AuthClient, SignUpOutcome};
pub use gemini::{GeminiClient, KeyCheck, TextGenerator};

// src/models/mod.rs

//! Domain models for the pitch generator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod pitch;
mod session;

// Re-export all public types
pub use config::{
    BackendConfig, BackendKind, Config, GeminiConfig, LoggingConfig, PathsConfig, RetryConfig,
};
pub use pitch::{Colors, LandingCopy, NewPitch, Pitch, PitchData, PitchId, TargetAudience};
pub use session::{AuthUser, Session};

// src/lib.rs

//! Pitchcraft Library
//!
//! Turns a one-line startup idea into a structured pitch and landing page
//! with the Gemini API, and keeps the results per user in a Supabase table
//! or a local JSON file.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

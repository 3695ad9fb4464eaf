//! Pitch pipeline stages.
//!
//! - `extract`: model output to `PitchData`
//! - `landing`: landing page cleanup and fallback template
//! - `generate`: prompt, parse and save a pitch (`run_generate`)
//! - `browse`: search, filter and sort saved pitches

pub mod browse;
pub mod extract;
pub mod generate;
pub mod landing;

pub use browse::{BrowseSummary, PitchQuery, SortOrder, industries};
pub use extract::parse_pitch;
pub use generate::{GeneratedPitch, PitchGenerator, run_generate};
pub use landing::{LandingPage, LandingSource, fallback_template, strip_code_fences};

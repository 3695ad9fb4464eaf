// src/pipeline/generate.rs

//! Pitch generation pipeline.

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{NewPitch, Pitch, PitchData};
use crate::pipeline::extract::parse_pitch;
use crate::pipeline::landing::LandingPage;
use crate::services::TextGenerator;
use crate::services::prompts::{landing_prompt, pitch_prompt};
use crate::storage::PitchStore;
use crate::utils::console;

/// A parsed pitch and, when requested, its landing page.
#[derive(Debug, Clone)]
pub struct GeneratedPitch {
    pub data: PitchData,
    pub landing: Option<LandingPage>,
}

impl GeneratedPitch {
    pub fn into_new_pitch(self, user_id: &str) -> NewPitch {
        NewPitch::new(user_id, self.data, self.landing.map(|page| page.html))
    }
}

/// Drives a [`TextGenerator`] through the pitch and landing prompts.
pub struct PitchGenerator<G> {
    generator: G,
}

impl<G: TextGenerator> PitchGenerator<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Generate a pitch for `idea`.
    ///
    /// Pitch failures are returned as-is. Landing failures degrade to the
    /// built-in template.
    pub async fn generate(&self, idea: &str, with_landing: bool) -> Result<GeneratedPitch> {
        let idea = idea.trim();
        if idea.is_empty() {
            return Err(AppError::validation("startup idea must not be empty"));
        }

        log::info!("Generating pitch for: {}", idea);
        let reply = self.generator.generate_text(&pitch_prompt(idea)).await?;
        let data = parse_pitch(&reply)?;
        log::info!("Parsed pitch '{}' ({})", data.name, data.industry);

        let landing = if with_landing {
            Some(self.landing(&data).await)
        } else {
            None
        };

        Ok(GeneratedPitch { data, landing })
    }

    async fn landing(&self, data: &PitchData) -> LandingPage {
        match self.generator.generate_text(&landing_prompt(data)).await {
            Ok(reply) => LandingPage::from_model_output(&reply, data),
            Err(e) => {
                log::warn!("Landing page generation failed, using the built-in template: {}", e);
                LandingPage::fallback(data)
            }
        }
    }
}

/// Generate a pitch and save it for `user_id`.
pub async fn run_generate<G: TextGenerator>(
    generator: &PitchGenerator<G>,
    store: &dyn PitchStore,
    user_id: &str,
    idea: &str,
    with_landing: bool,
) -> Result<Pitch> {
    let start_time = Utc::now();
    console::header("Pitch Generation");

    let generated = generator.generate(idea, with_landing).await?;
    if let Some(page) = &generated.landing {
        console::sub_item(&format!("Landing page: {:?} ({} bytes)", page.source, page.html.len()));
    }

    let pitch = store.insert(generated.into_new_pitch(user_id)).await?;

    let elapsed = Utc::now() - start_time;
    console::success(&format!(
        "Saved '{}' as {} in {:.1}s",
        pitch.display_name(),
        pitch.id,
        elapsed.num_milliseconds() as f64 / 1000.0
    ));

    Ok(pitch)
}

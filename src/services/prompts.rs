// src/services/prompts.rs

//! Prompt templates sent to the generation endpoint.

use crate::models::PitchData;

/// Prompt asking for the structured pitch JSON for an idea.
pub fn pitch_prompt(idea: &str) -> String {
    format!(
        r##"
ACT AS A PROFESSIONAL STARTUP CONSULTANT. Generate a comprehensive startup pitch package from this idea: "{idea}"

Return ONLY valid JSON with this exact structure:
{{
  "name": "Creative startup name",
  "tagline": "Catchy one-liner",
  "elevator_pitch": "2-4 sentence compelling story",
  "problem": "Clear problem statement",
  "solution": "Innovative solution description",
  "target_audience": {{
    "description": "Primary customer description",
    "segments": ["segment 1", "segment 2", "segment 3"]
  }},
  "unique_value_proposition": "What makes it unique vs competitors",
  "landing_copy": {{
    "headline": "Attention-grabbing headline",
    "subheadline": "Supporting description",
    "call_to_action": "Action-oriented CTA"
  }},
  "industry": "Relevant industry",
  "colors": {{
    "primary": "#hex",
    "secondary": "#hex",
    "accent": "#hex",
    "neutral": "#hex"
  }},
  "logo_ideas": ["creative idea 1", "creative idea 2", "creative idea 3"]
}}

IMPORTANT: Return ONLY the JSON object, no other text."##,
        idea = idea.trim()
    )
}

/// Prompt asking for a complete landing page for a parsed pitch.
pub fn landing_prompt(pitch: &PitchData) -> String {
    let colors = serde_json::to_string(&pitch.colors).unwrap_or_default();
    format!(
        r#"Create a stunning, modern landing page HTML for: {name} - {tagline}

Details:
- Problem: {problem}
- Solution: {solution}
- UVP: {uvp}
- Colors: {colors}
- Audience: {audience}

Requirements:
- Use Tailwind CSS CDN
- Modern glass morphism design
- Fully responsive layout
- Smooth animations
- Professional startup aesthetic
- Include: Hero, Features, Testimonials, CTA, Footer
- Add interactive elements
- IMPORTANT: Do NOT use any external images (no Unsplash, no external URLs)
- Use CSS gradients, emoji icons, and solid colors for visual elements
- Use placeholder text for testimonials instead of external images
- Create visual appeal through typography, gradients, and geometric shapes

Return ONLY complete HTML code:"#,
        name = pitch.name,
        tagline = pitch.tagline,
        problem = pitch.problem,
        solution = pitch.solution,
        uvp = pitch.unique_value_proposition,
        colors = colors,
        audience = pitch.target_audience.description,
    )
}

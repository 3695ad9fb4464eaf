// src/pipeline/landing.rs

//! Landing page HTML: cleanup of generated markup and the built-in fallback.

use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;

use crate::models::PitchData;
use crate::utils::escape_html;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").expect("valid regex")
});

/// Where a landing page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingSource {
    /// Written by the model
    Generated,
    /// Built from [`fallback_template`]
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingPage {
    pub html: String,
    pub source: LandingSource,
}

impl LandingPage {
    /// Wrap model output, falling back to the template when it is blank.
    pub fn from_model_output(text: &str, pitch: &PitchData) -> Self {
        let html = strip_code_fences(text);
        if html.trim().is_empty() {
            log::warn!("Model returned an empty landing page, using the built-in template");
            return Self::fallback(pitch);
        }
        Self {
            html: html.to_string(),
            source: LandingSource::Generated,
        }
    }

    pub fn fallback(pitch: &PitchData) -> Self {
        Self {
            html: fallback_template(pitch),
            source: LandingSource::Fallback,
        }
    }
}

/// Remove one Markdown code fence wrapping the whole text.
pub fn strip_code_fences(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => text.trim(),
    }
}

/// A self-contained landing page built from the pitch alone.
///
/// Every interpolated value is HTML-escaped.
pub fn fallback_template(pitch: &PitchData) -> String {
    let name = escape_html(&pitch.name);
    let tagline = escape_html(&pitch.tagline);
    let headline = escape_html(non_blank(&pitch.landing_copy.headline, &pitch.name));
    let subheadline = escape_html(non_blank(&pitch.landing_copy.subheadline, &pitch.tagline));
    let cta = escape_html(non_blank(
        &pitch.landing_copy.call_to_action,
        PitchData::DEFAULT_CALL_TO_ACTION,
    ));
    let problem = escape_html(&pitch.problem);
    let solution = escape_html(&pitch.solution);
    let primary = escape_html(&pitch.colors.primary);
    let secondary = escape_html(&pitch.colors.secondary);
    let accent = escape_html(&pitch.colors.accent);
    let year = Utc::now().year();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name} - {tagline}</title>
    <style>
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{ font-family: system-ui, -apple-system, "Segoe UI", sans-serif; color: #111827; background: #ffffff; }}
        .wrap {{ max-width: 960px; margin: 0 auto; padding: 0 24px; }}
        nav {{ display: flex; justify-content: space-between; align-items: center; padding: 16px 24px; border-bottom: 1px solid #e5e7eb; }}
        nav .brand {{ font-weight: 700; font-size: 1.25rem; }}
        .btn {{ display: inline-block; border: none; border-radius: 12px; padding: 14px 28px; font-weight: 600; font-size: 1rem; cursor: pointer; }}
        .hero {{ background: linear-gradient(135deg, {primary}, {secondary}); color: #ffffff; padding: 96px 0; text-align: center; }}
        .hero h1 {{ font-size: 3rem; margin-bottom: 24px; }}
        .hero p {{ font-size: 1.25rem; opacity: 0.9; margin-bottom: 32px; }}
        .hero .btn {{ background: #ffffff; color: {primary}; }}
        section.block {{ padding: 80px 0; text-align: center; }}
        section.block h2 {{ font-size: 2rem; margin-bottom: 24px; }}
        section.block p {{ font-size: 1.125rem; color: #4b5563; line-height: 1.7; }}
        .tinted {{ background: linear-gradient(135deg, {primary}20, {secondary}20); }}
        .cta {{ background: #111827; color: #ffffff; }}
        .cta p {{ color: #d1d5db; margin-bottom: 32px; }}
        .cta .btn {{ background: {accent}; color: #ffffff; }}
        footer {{ background: #1f2937; color: #ffffff; padding: 48px 0; text-align: center; }}
    </style>
</head>
<body>
    <nav>
        <span class="brand">{name}</span>
        <button class="btn" style="background: {primary}; color: #ffffff;">Get Started</button>
    </nav>

    <section class="hero">
        <div class="wrap">
            <h1>{headline}</h1>
            <p>{subheadline}</p>
            <button class="btn">{cta}</button>
        </div>
    </section>

    <section class="block">
        <div class="wrap">
            <h2>The Problem We Solve</h2>
            <p>{problem}</p>
        </div>
    </section>

    <section class="block tinted">
        <div class="wrap">
            <h2>Our Solution</h2>
            <p>{solution}</p>
        </div>
    </section>

    <section class="block cta">
        <div class="wrap">
            <h2>Ready to Get Started?</h2>
            <p>Join the future with {name}</p>
            <button class="btn">Start Your Journey</button>
        </div>
    </section>

    <footer>
        <div class="wrap">
            <p>&copy; {year} {name}. All rights reserved.</p>
        </div>
    </footer>
</body>
</html>
"#
    )
}

fn non_blank<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

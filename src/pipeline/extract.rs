// src/pipeline/extract.rs

//! Turns free-form model output into a [`PitchData`].
//!
//! 1. Take the greedy span from the first `{` to the last `}`.
//! 2. Parse it strictly; on failure apply a lenient cleanup (single quotes,
//!    trailing commas) and parse again.
//! 3. Coerce the object field by field, then fill blanks with defaults.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::PitchData;

static QUOTED_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'\s*:\s*'").expect("valid regex"));

static SINGLE_QUOTED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([{\[,])\s*'([^']+?)'\s*([:,\]}])"#).expect("valid regex"));

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

/// Upper bound on re-quoting passes; each pass fixes at least one token.
const MAX_REPAIR_PASSES: usize = 64;

/// The greedy `{ ... }` span of `text`.
pub fn extract_json_object(text: &str) -> Result<&str> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(AppError::parse("could not find a JSON object in the response")),
    }
}

/// Best-effort cleanup of almost-JSON.
pub fn repair_json(candidate: &str) -> String {
    let mut fixed = QUOTED_COLON.replace_all(candidate, "\": \"").into_owned();

    // Matches consume their closing delimiter, so adjacent tokens need
    // another pass.
    for _ in 0..MAX_REPAIR_PASSES {
        let next = SINGLE_QUOTED_TOKEN.replace_all(&fixed, "$1\"$2\"$3");
        if next == fixed {
            break;
        }
        fixed = next.into_owned();
    }

    TRAILING_COMMA.replace_all(&fixed, "$1").into_owned()
}

/// Parse model output into a pitch with defaults applied.
pub fn parse_pitch(text: &str) -> Result<PitchData> {
    let candidate = extract_json_object(text)?;

    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(strict) => {
            log::debug!("Strict JSON parse failed ({}), attempting repair", strict);
            let repaired = repair_json(candidate);
            serde_json::from_str(&repaired)
                .map_err(|e| AppError::parse(format!("invalid JSON after cleanup: {e}")))?
        }
    };

    let Value::Object(object) = value else {
        return Err(AppError::parse("model output is not a JSON object"));
    };

    Ok(PitchData::from(Value::Object(object)).with_defaults())
}

// src/pipeline/browse.rs

//! Filtering and ordering of a user's saved pitches.

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::Pitch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    /// Case-insensitive by display name
    Name,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "name" => Ok(Self::Name),
            other => Err(AppError::validation(format!(
                "unknown sort order '{other}' (expected newest, oldest or name)"
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Name => "name",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PitchQuery {
    /// Case-insensitive substring of name, tagline or industry
    pub search: Option<String>,
    /// Exact industry; `None` keeps every industry
    pub industry: Option<String>,
    pub sort: SortOrder,
}

/// "Showing N of M".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowseSummary {
    pub shown: usize,
    pub total: usize,
}

impl fmt::Display for BrowseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Showing {} of {} pitches", self.shown, self.total)
    }
}

impl PitchQuery {
    fn matches(&self, pitch: &Pitch) -> bool {
        let industry_ok = match self.industry.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(wanted) => pitch.industry.as_deref() == Some(wanted),
        };
        if !industry_ok {
            return false;
        }

        let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return true;
        };
        let needle = needle.to_lowercase();
        [
            pitch.generated_data.name.as_str(),
            pitch.generated_data.tagline.as_str(),
            pitch.industry.as_deref().unwrap_or_default(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// The matching pitches in the requested order.
    pub fn apply<'a>(&self, pitches: &'a [Pitch]) -> (Vec<&'a Pitch>, BrowseSummary) {
        let mut shown: Vec<&Pitch> = pitches.iter().filter(|p| self.matches(p)).collect();

        match self.sort {
            SortOrder::Newest => shown.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Oldest => shown.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::Name => shown.sort_by_cached_key(|p| p.display_name().to_lowercase()),
        }

        let summary = BrowseSummary {
            shown: shown.len(),
            total: pitches.len(),
        };
        (shown, summary)
    }
}

/// Distinct non-empty industries in first-seen order.
pub fn industries(pitches: &[Pitch]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for industry in pitches.iter().filter_map(|p| p.industry.as_deref()) {
        let industry = industry.trim();
        if !industry.is_empty() && !seen.iter().any(|s| s == industry) {
            seen.push(industry.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PitchData, PitchId};
    use chrono::{Duration, Utc};

    fn pitch(id: &str, name: &str, tagline: &str, industry: Option<&str>, age_days: i64) -> Pitch {
        Pitch {
            id: PitchId::from(id),
            user_id: "u1".into(),
            title: name.into(),
            short_description: tagline.into(),
            industry: industry.map(Into::into),
            tone: None,
            language: None,
            generated_data: PitchData {
                name: name.into(),
                tagline: tagline.into(),
                ..PitchData::default()
            },
            landing_code: None,
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    fn sample() -> Vec<Pitch> {
        vec![
            pitch("1", "brewly", "Coffee on autopilot", Some("Food"), 3),
            pitch("2", "Aerodesk", "Desks that float", Some("Technology"), 1),
            pitch("3", "Medikit", "Health at home", Some("Health"), 2),
            pitch("4", "Snackbox", "Office snacks", Some("Food"), 0),
            pitch("5", "Nameless", "No industry yet", None, 5),
        ]
    }

    fn ids(rows: &[&Pitch]) -> Vec<String> {
        rows.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn default_query_is_newest_first() {
        let pitches = sample();
        let (rows, summary) = PitchQuery::default().apply(&pitches);
        assert_eq!(ids(&rows), vec!["4", "2", "3", "1", "5"]);
        assert_eq!(summary, BrowseSummary { shown: 5, total: 5 });
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let pitches = sample();
        let query = PitchQuery {
            search: Some("COFFEE".into()),
            ..PitchQuery::default()
        };
        assert_eq!(ids(&query.apply(&pitches).0), vec!["1"]);

        let query = PitchQuery {
            search: Some("food".into()),
            ..PitchQuery::default()
        };
        assert_eq!(ids(&query.apply(&pitches).0), vec!["4", "1"]);
    }

    #[test]
    fn search_ignores_row_columns_outside_generated_data() {
        let mut row = pitch("6", "Quillo", "Notes for teams", Some("Productivity"), 4);
        row.title = "Legacy title".into();
        row.short_description = "Spreadsheets reimagined".into();
        let pitches = vec![row];

        let query = PitchQuery {
            search: Some("spreadsheets".into()),
            ..PitchQuery::default()
        };
        assert!(query.apply(&pitches).0.is_empty());

        let query = PitchQuery {
            search: Some("legacy".into()),
            ..PitchQuery::default()
        };
        assert!(query.apply(&pitches).0.is_empty());

        let query = PitchQuery {
            search: Some("notes".into()),
            ..PitchQuery::default()
        };
        assert_eq!(ids(&query.apply(&pitches).0), vec!["6"]);
    }

    #[test]
    fn industry_filter_is_exact() {
        let pitches = sample();
        let query = PitchQuery {
            industry: Some("Food".into()),
            sort: SortOrder::Oldest,
            ..PitchQuery::default()
        };
        let (rows, summary) = query.apply(&pitches);
        assert_eq!(ids(&rows), vec!["1", "4"]);
        assert_eq!(summary.to_string(), "Showing 2 of 5 pitches");

        let query = PitchQuery {
            industry: Some("foo".into()),
            ..PitchQuery::default()
        };
        assert!(query.apply(&pitches).0.is_empty());
    }

    #[test]
    fn name_sort_ignores_case() {
        let pitches = sample();
        let query = PitchQuery {
            sort: SortOrder::Name,
            ..PitchQuery::default()
        };
        assert_eq!(ids(&query.apply(&pitches).0), vec!["2", "1", "3", "5", "4"]);
    }

    #[test]
    fn industries_are_distinct_in_first_seen_order() {
        assert_eq!(industries(&sample()), vec!["Food", "Technology", "Health"]);
    }

    #[test]
    fn sort_order_parsing() {
        assert_eq!("Name".parse::<SortOrder>().unwrap(), SortOrder::Name);
        assert_eq!("oldest".parse::<SortOrder>().unwrap(), SortOrder::Oldest);
        assert!("random".parse::<SortOrder>().is_err());
    }
}

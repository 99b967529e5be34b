use serde::Deserialize;
use tracing::warn;

use super::types::KeywordRecord;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Numeric value, or 0 for anything non-numeric, negative or non-finite.
    pub fn as_number(&self) -> f64 {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Cell::Bool(_) => 0.0,
        };
        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }

    pub fn is_yes(&self) -> bool {
        match self {
            Cell::Bool(b) => *b,
            Cell::Text(s) => s.trim().eq_ignore_ascii_case("yes"),
            Cell::Number(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawKeywordRow {
    pub project: Option<String>,
    pub keyword: Option<String>,
    pub msv: Option<Cell>,
    #[serde(alias = "position")]
    pub current_position: Option<Cell>,
    #[serde(alias = "aio")]
    pub ai_overview: Option<Cell>,
    #[serde(alias = "fs")]
    pub featured_snippet: Option<Cell>,
    #[serde(alias = "url")]
    pub current_url: Option<String>,
}

impl RawKeywordRow {
    pub fn into_record(self) -> Option<KeywordRecord> {
        let project = self
            .project
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())?;
        Some(KeywordRecord {
            project,
            keyword: self.keyword.unwrap_or_default().trim().to_string(),
            msv: self.msv.as_ref().map_or(0.0, Cell::as_number),
            current_position: self.current_position.as_ref().map_or(0.0, Cell::as_number),
            has_featured_snippet: self.featured_snippet.as_ref().is_some_and(Cell::is_yes),
            has_ai_overview: self.ai_overview.as_ref().is_some_and(Cell::is_yes),
            current_url: self
                .current_url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        })
    }
}

pub fn coerce_rows(rows: impl IntoIterator<Item = RawKeywordRow>) -> Vec<KeywordRecord> {
    let mut records = Vec::new();
    for (idx, row) in rows.into_iter().enumerate() {
        let keyword = row.keyword.clone().unwrap_or_default();
        match row.into_record() {
            Some(record) => records.push(record),
            None => warn!(
                row = idx + 1,
                keyword = %keyword,
                "skipping keyword row without a project"
            ),
        }
    }
    records
}

//! Canonical grant record.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One grant, normalized to the canonical schema.
///
/// `title` and `description` are only mutable through setters so that
/// [`Record::text_blob`] can never drift out of sync with its source fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: u64,
    title: String,
    description: String,
    /// Funding organisation name.
    pub funder: String,
    /// Awarded amount in currency-agnostic units. Never negative.
    pub amount: f64,
    /// Parsed award date. `None` when the source cell was empty or year-only.
    pub award_date: Option<NaiveDate>,
    /// Award year, derived from the date or a year-only source cell.
    pub year: Option<i32>,
    /// Award month (1-12), derived from the date.
    pub month: Option<u32>,
    /// Optional region / area tag.
    pub region: Option<String>,
    text_blob: String,
}

impl Record {
    /// Builds a record, deriving `year`/`month` from `award_date` and the
    /// text blob from `title` + `description`.
    pub fn new(
        id: u64,
        title: impl Into<String>,
        description: impl Into<String>,
        funder: impl Into<String>,
        amount: f64,
        award_date: Option<NaiveDate>,
        region: Option<String>,
    ) -> Self {
        let title = title.into();
        let description = description.into();
        let text_blob = compose_text_blob(&title, &description);
        Self {
            id,
            title,
            description,
            funder: funder.into(),
            amount: amount.max(0.0),
            award_date,
            year: award_date.map(|d| d.year()),
            month: award_date.map(|d| d.month()),
            region,
            text_blob,
        }
    }

    /// Stable identifier, derived from row position at load time.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Deterministic concatenation of title and description, the text every
    /// matcher scores against.
    #[inline]
    pub fn text_blob(&self) -> &str {
        &self.text_blob
    }

    /// Replaces the title and recomputes the text blob.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.text_blob = compose_text_blob(&self.title, &self.description);
    }

    /// Replaces the description and recomputes the text blob.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.text_blob = compose_text_blob(&self.title, &self.description);
    }

    /// Overrides the derived year for records loaded from year-only sources.
    pub(crate) fn set_year_only(&mut self, year: i32) {
        self.award_date = None;
        self.year = Some(year);
        self.month = None;
    }
}

fn compose_text_blob(title: &str, description: &str) -> String {
    let title = title.trim();
    let description = description.trim();
    if description.is_empty() {
        title.to_string()
    } else if title.is_empty() {
        description.to_string()
    } else {
        format!("{title}. {description}")
    }
}

//! Structured attribute filtering.
//!
//! Pure functions over an immutable dataset: no hidden state, no allocation
//! beyond the candidate vector.


use std::collections::BTreeSet;

use crate::dataset::{Dataset, Record};

/// Inclusive year range, both bounds included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    /// Builds a range; bounds are swapped if given in reverse order.
    pub fn new(start: i32, end: i32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// A single-year range.
    pub fn single(year: i32) -> Self {
        Self::new(year, year)
    }

    #[inline]
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

/// Zero or more dimension predicates, combined by logical AND.
///
/// Within a dimension the selection is an OR (set membership). An empty
/// dimension passes every record, matching the "no filter chosen = show all"
/// policy. The default value is the identity filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Funder names to keep; empty means no funder filter.
    pub funders: BTreeSet<String>,
    /// Region names to keep; empty means no region filter.
    pub regions: BTreeSet<String>,
    /// Award-year range; `None` means no year filter. Records with a null
    /// derived year are excluded whenever this dimension is active.
    pub years: Option<YearRange>,
}

impl FilterSpec {
    /// The identity filter (passes every record).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a funder to the selection.
    pub fn with_funder(mut self, funder: impl Into<String>) -> Self {
        self.funders.insert(funder.into());
        self
    }

    /// Adds a region to the selection.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.regions.insert(region.into());
        self
    }

    /// Sets the award-year range.
    pub fn with_years(mut self, range: YearRange) -> Self {
        self.years = Some(range);
        self
    }

    /// Returns `true` if no dimension is active.
    pub fn is_identity(&self) -> bool {
        self.funders.is_empty() && self.regions.is_empty() && self.years.is_none()
    }

    /// Returns `true` if `record` passes every active dimension.
    pub fn matches(&self, record: &Record) -> bool {
        if !self.funders.is_empty() && !self.funders.contains(&record.funder) {
            return false;
        }
        if !self.regions.is_empty() {
            match &record.region {
                Some(region) if self.regions.contains(region) => {}
                _ => return false,
            }
        }
        if let Some(range) = self.years {
            match record.year {
                Some(year) if range.contains(year) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Applies the filter, preserving original dataset order.
pub fn apply<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> Vec<&'a Record> {
    dataset
        .records()
        .iter()
        .filter(|record| spec.matches(record))
        .collect()
}

//! Canonical schema and the header alias table.
//!
//! Input files from different publishers spell the same column several ways.
//! The alias table is consulted once at load time; everything downstream sees
//! canonical field names only.

/// Canonical fields the engine operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Description,
    Funder,
    Amount,
    AwardDate,
    Region,
}

impl Field {
    /// Canonical name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Funder => "funder",
            Field::Amount => "amount",
            Field::AwardDate => "award_date",
            Field::Region => "region",
        }
    }

    /// Recognized header spellings, matched case-insensitively after trimming.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::Title => &["title", "grant title", "gtitle"],
            Field::Description => &[
                "description",
                "description of grant",
                "grant description",
            ],
            Field::Funder => &["funder", "funder name", "funding organisation"],
            Field::Amount => &[
                "amount",
                "amount awarded",
                "amount awarded (gbp)",
                "award amount",
            ],
            // "award year" carries year-only values; the loader handles that.
            Field::AwardDate => &["award_date", "award date", "date awarded", "award year"],
            Field::Region => &["region", "area", "recipient region"],
        }
    }

    /// Fields that must resolve for a load to succeed.
    pub const REQUIRED: [Field; 5] = [
        Field::Title,
        Field::Description,
        Field::Funder,
        Field::Amount,
        Field::AwardDate,
    ];
}

/// Column indices of the canonical fields within one input file.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub title: usize,
    pub description: usize,
    pub funder: usize,
    pub amount: usize,
    pub award_date: usize,
    pub region: Option<usize>,
}

impl ColumnMap {
    /// Resolves headers against the alias table.
    ///
    /// Returns `Err` with **every** unresolved required field, not just the
    /// first, so callers can report the full schema gap at once.
    pub fn resolve(headers: &[String]) -> Result<Self, Vec<&'static str>> {
        let lowered: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let find = |field: Field| -> Option<usize> {
            field
                .aliases()
                .iter()
                .find_map(|alias| lowered.iter().position(|h| h == alias))
        };

        let mut missing = Vec::new();
        let mut index_of = |field: Field| match find(field) {
            Some(idx) => idx,
            None => {
                missing.push(field.name());
                usize::MAX
            }
        };

        let title = index_of(Field::Title);
        let description = index_of(Field::Description);
        let funder = index_of(Field::Funder);
        let amount = index_of(Field::Amount);
        let award_date = index_of(Field::AwardDate);
        let region = find(Field::Region);

        if missing.is_empty() {
            Ok(Self {
                title,
                description,
                funder,
                amount,
                award_date,
                region,
            })
        } else {
            Err(missing)
        }
    }

    /// Returns `true` if the award-date column is a year-only column.
    pub fn date_is_year_only(headers: &[String]) -> bool {
        headers
            .iter()
            .any(|h| h.trim().eq_ignore_ascii_case("award year"))
            && !headers.iter().any(|h| {
                let h = h.trim().to_lowercase();
                h == "award_date" || h == "award date" || h == "date awarded"
            })
    }
}

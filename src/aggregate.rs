use crate::models::{ListingRecord, PortalId, ResultSet};
use crate::scrapers::SearchFilter;

/// Post-hoc filters applied after every portal has been scraped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFilters {
    pub max_price: Option<i64>,
    pub min_price: Option<i64>,
    /// Square meters, read from the record's area text
    pub min_area: Option<u32>,
    /// Bedrooms, read from the record's rooms text
    pub min_rooms: Option<u32>,
    /// Case-insensitive; a record passes when its title contains any of them
    pub keywords: Vec<String>,
    /// Exclude records missing any optional field
    pub drop_incomplete: bool,
}

impl ExtraFilters {
    /// Re-apply the search's own bounds, since portals do not always honour them
    pub fn from_search(filter: &SearchFilter) -> Self {
        Self {
            max_price: Some(i64::from(filter.max_price)),
            min_area: Some(filter.min_area),
            min_rooms: Some(filter.min_rooms),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &ListingRecord) -> bool {
        if self.max_price.is_some_and(|max| record.price > max) {
            return false;
        }
        if self.min_price.is_some_and(|min| record.price < min) {
            return false;
        }
        if let Some(min) = self.min_area {
            if !at_least(record.area.as_deref(), min) {
                return false;
            }
        }
        if let Some(min) = self.min_rooms {
            if !at_least(record.rooms.as_deref(), min) {
                return false;
            }
        }
        if !self.keywords.is_empty() {
            let title = record.title.to_lowercase();
            if !self.keywords.iter().any(|k| title.contains(&k.to_lowercase())) {
                return false;
            }
        }
        if self.drop_incomplete && !record.is_complete() {
            return false;
        }
        true
    }
}

// Absent or unparsable values fail the bound
fn at_least(field: Option<&str>, min: u32) -> bool {
    field.and_then(leading_number).is_some_and(|value| value >= min)
}

/// First run of digits in `text`: "75 m²" is 75, "3 hab." is 3, "Estudio" is `None`
pub fn leading_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Concatenate per-portal records in query order and drop the ones failing `filters`.
/// No deduplication across portals and no reordering.
pub fn aggregate(per_portal: &[(PortalId, Vec<ListingRecord>)], filters: &ExtraFilters) -> ResultSet {
    let records = per_portal
        .iter()
        .flat_map(|(_, records)| records.iter())
        .filter(|record| filters.matches(record))
        .cloned()
        .collect();

    ResultSet::new(records)
}

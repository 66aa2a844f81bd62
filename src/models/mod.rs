use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text written in place of an optional field the portal markup did not carry
pub const PLACEHOLDER: &str = "N/A";

/// Rental portal a listing was scraped from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum PortalId {
    Idealista,
    Fotocasa,
    Spotahome,
    Yaencontre,
}

impl PortalId {
    pub const ALL: [PortalId; 4] = [
        PortalId::Idealista,
        PortalId::Fotocasa,
        PortalId::Spotahome,
        PortalId::Yaencontre,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PortalId::Idealista => "Idealista",
            PortalId::Fotocasa => "Fotocasa",
            PortalId::Spotahome => "Spotahome",
            PortalId::Yaencontre => "Yaencontre",
        }
    }
}

impl fmt::Display for PortalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PortalId {
    type Err = UnknownPortal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PortalId::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPortal(wanted.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown portal: {0}")]
pub struct UnknownPortal(pub String);

/// One normalized listing card.
///
/// Field order is the column order of every tabular export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub portal: PortalId,
    pub title: String,
    /// Monthly rent with every non-digit stripped
    pub price: i64,
    #[serde(with = "placeholder")]
    pub rooms: Option<String>,
    #[serde(with = "placeholder")]
    pub area: Option<String>,
    #[serde(with = "placeholder")]
    pub location: Option<String>,
    pub url: String,
    pub retrieved_at: NaiveDate,
}

impl ListingRecord {
    pub fn rooms_or_placeholder(&self) -> &str {
        self.rooms.as_deref().unwrap_or(PLACEHOLDER)
    }

    pub fn area_or_placeholder(&self) -> &str {
        self.area.as_deref().unwrap_or(PLACEHOLDER)
    }

    pub fn location_or_placeholder(&self) -> &str {
        self.location.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// True when every optional field was present in the source markup
    pub fn is_complete(&self) -> bool {
        self.rooms.is_some() && self.area.is_some() && self.location.is_some()
    }
}

/// Serde adapter writing `None` as the placeholder and reading it back as `None`
pub mod placeholder {
    use super::PLACEHOLDER;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(PLACEHOLDER))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == PLACEHOLDER {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Final portal-tagged listings of one search, in portal query order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<ListingRecord>,
}

impl ResultSet {
    pub fn new(records: Vec<ListingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ListingRecord> {
        self.records.iter()
    }

    pub fn count_for(&self, portal: PortalId) -> usize {
        self.records.iter().filter(|r| r.portal == portal).count()
    }

    pub fn into_records(self) -> Vec<ListingRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ListingRecord;
    type IntoIter = std::slice::Iter<'a, ListingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portal_names_parse_case_insensitively() {
        assert_eq!("fotocasa".parse::<PortalId>(), Ok(PortalId::Fotocasa));
        assert_eq!(" YAENCONTRE ".parse::<PortalId>(), Ok(PortalId::Yaencontre));
        assert!("habitaclia".parse::<PortalId>().is_err());
    }

    #[test]
    fn completeness_requires_all_optional_fields() {
        let mut record = ListingRecord {
            portal: PortalId::Idealista,
            title: "Piso en Chamberí".to_string(),
            price: 1000,
            rooms: Some("2 hab.".to_string()),
            area: Some("70 m²".to_string()),
            location: Some("Chamberí, Madrid".to_string()),
            url: "https://www.idealista.com/inmueble/1/".to_string(),
            retrieved_at: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        };
        assert!(record.is_complete());

        record.area = None;
        assert!(!record.is_complete());
        assert_eq!(record.area_or_placeholder(), PLACEHOLDER);
    }
}

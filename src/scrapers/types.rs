use crate::models::PortalId;
use serde::{Deserialize, Serialize};

/// Search constraints collected from the user, consumed by the URL builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// City or area to search in, lowercased
    pub location: String,
    /// Maximum monthly rent (EUR)
    pub max_price: u32,
    /// Minimum number of bedrooms
    pub min_rooms: u32,
    /// Minimum size in square meters
    pub min_area: u32,
    /// Portals to query, in selection order, without repeats
    pub portals: Vec<PortalId>,
}

impl SearchFilter {
    pub fn new(
        location: &str,
        max_price: u32,
        min_rooms: u32,
        min_area: u32,
        portals: impl IntoIterator<Item = PortalId>,
    ) -> Self {
        let mut selected: Vec<PortalId> = Vec::new();
        for portal in portals {
            if !selected.contains(&portal) {
                selected.push(portal);
            }
        }

        Self {
            location: location.trim().to_lowercase(),
            max_price,
            min_rooms,
            min_area,
            portals: selected,
        }
    }
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::new(
            "madrid",
            1100,
            2,
            60,
            [PortalId::Idealista, PortalId::Fotocasa],
        )
    }
}

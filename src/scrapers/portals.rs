//! Per-portal descriptors: where to search, how to fetch, and which selectors
//! turn a results page into listing records.
//!
//! Adding a portal means adding a descriptor here; the extractor and the search
//! runner are shared.

use crate::models::PortalId;
use crate::scrapers::types::SearchFilter;
use std::time::Duration;

/// How a portal's results page has to be retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Server-rendered; a plain GET returns the cards
    Http,
    /// Cards are rendered by script; needs a browser session
    Browser,
}

/// Where a field value lives on a matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Text,
    Attr(&'static str),
}

/// One attempt at locating a field inside a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub selector: &'static str,
    pub source: FieldSource,
    /// Position among the selector's matches inside the card
    pub nth: usize,
}

impl Probe {
    pub const fn text(selector: &'static str) -> Self {
        Self {
            selector,
            source: FieldSource::Text,
            nth: 0,
        }
    }

    pub const fn attr(selector: &'static str, name: &'static str) -> Self {
        Self {
            selector,
            source: FieldSource::Attr(name),
            nth: 0,
        }
    }

    pub const fn nth(self, nth: usize) -> Self {
        Self { nth, ..self }
    }
}

/// Probes tried in order; the first one yielding a non-empty value wins
pub type FieldRule = &'static [Probe];

/// Selector set for one portal's listing cards
#[derive(Debug, Clone, Copy)]
pub struct CardSelectors {
    pub card: &'static str,
    pub title: FieldRule,
    pub price: FieldRule,
    pub link: FieldRule,
    pub rooms: FieldRule,
    pub area: FieldRule,
    pub location: FieldRule,
}

#[derive(Debug, Clone, Copy)]
pub struct PortalDescriptor {
    pub portal: PortalId,
    /// Links found on cards are resolved against this
    pub base_url: &'static str,
    pub strategy: FetchStrategy,
    /// Element whose presence means the cards have rendered
    pub ready_selector: &'static str,
    pub selectors: CardSelectors,
    /// Fixed pause after each fetch of this portal
    pub delay: Duration,
    url_template: fn(&SearchFilter, &str) -> String,
}

impl PortalDescriptor {
    /// Search-results URL for `filter`. Values go in verbatim; the portal decides
    /// what to do with ranges it does not support.
    pub fn search_url(&self, filter: &SearchFilter) -> String {
        let location = urlencoding::encode(&filter.location);
        (self.url_template)(filter, &location)
    }
}

fn idealista_url(f: &SearchFilter, location: &str) -> String {
    format!(
        "https://www.idealista.com/alquiler-viviendas/{}/con-precio-hasta_{},metros-cuadrados-mas-de_{},de-{}-dormitorios/",
        location, f.max_price, f.min_area, f.min_rooms
    )
}

fn fotocasa_url(f: &SearchFilter, location: &str) -> String {
    format!(
        "https://www.fotocasa.es/es/alquiler/viviendas/{}/todas-las-zonas/l?maxPrice={}&minRooms={}&minSurface={}",
        location, f.max_price, f.min_rooms, f.min_area
    )
}

// Spotahome has no surface filter in its path scheme
fn spotahome_url(f: &SearchFilter, location: &str) -> String {
    format!(
        "https://www.spotahome.com/es/s/{}/for-rent:apartments/bedrooms:{}/budget=0-{}",
        location, f.min_rooms, f.max_price
    )
}

fn yaencontre_url(f: &SearchFilter, location: &str) -> String {
    format!(
        "https://www.yaencontre.com/alquiler/pisos/{}/f-{}-habitaciones,-{}euros,{}m2",
        location, f.min_rooms, f.max_price, f.min_area
    )
}

pub const IDEALISTA: PortalDescriptor = PortalDescriptor {
    portal: PortalId::Idealista,
    base_url: "https://www.idealista.com",
    strategy: FetchStrategy::Browser,
    ready_selector: "article.item-info-container",
    selectors: CardSelectors {
        card: "article.item-info-container",
        title: &[Probe::attr("a.item-link", "title"), Probe::text("a.item-link")],
        price: &[Probe::text("span.price"), Probe::text("span.item-price")],
        link: &[Probe::attr("a.item-link", "href")],
        rooms: &[Probe::text("span.item-detail").nth(0)],
        area: &[Probe::text("span.item-detail").nth(1)],
        location: &[Probe::text("span.location"), Probe::text("span.item-location")],
    },
    delay: Duration::from_millis(3000),
    url_template: idealista_url,
};

pub const FOTOCASA: PortalDescriptor = PortalDescriptor {
    portal: PortalId::Fotocasa,
    base_url: "https://www.fotocasa.es",
    strategy: FetchStrategy::Browser,
    ready_selector: "div.re-Card",
    selectors: CardSelectors {
        card: "div.re-Card",
        title: &[Probe::text("h3.re-Card-title"), Probe::text("span.re-Card-title")],
        price: &[Probe::text("span.re-Card-price")],
        link: &[Probe::attr("a.re-Card-link", "href")],
        rooms: &[
            Probe::text("span.re-Card-feature").nth(0),
            Probe::text("li.re-CardFeatures-feature").nth(0),
        ],
        area: &[
            Probe::text("span.re-Card-feature").nth(1),
            Probe::text("li.re-CardFeatures-feature").nth(1),
        ],
        location: &[Probe::text("span.re-Card-location")],
    },
    delay: Duration::from_millis(1500),
    url_template: fotocasa_url,
};

pub const SPOTAHOME: PortalDescriptor = PortalDescriptor {
    portal: PortalId::Spotahome,
    base_url: "https://www.spotahome.com",
    strategy: FetchStrategy::Browser,
    ready_selector: "article.homecard",
    selectors: CardSelectors {
        card: "article.homecard",
        title: &[
            Probe::text("h3.homecard__title"),
            Probe::attr("a.homecard__link", "title"),
        ],
        price: &[Probe::text("span.homecard__price"), Probe::text("p.homecard-price")],
        link: &[Probe::attr("a.homecard__link", "href")],
        rooms: &[Probe::text("span.homecard__bedrooms")],
        area: &[Probe::text("span.homecard__area")],
        location: &[Probe::text("span.homecard__address")],
    },
    delay: Duration::from_millis(5000),
    url_template: spotahome_url,
};

pub const YAENCONTRE: PortalDescriptor = PortalDescriptor {
    portal: PortalId::Yaencontre,
    base_url: "https://www.yaencontre.com",
    strategy: FetchStrategy::Http,
    ready_selector: "article.property-card",
    selectors: CardSelectors {
        card: "article.property-card",
        title: &[
            Probe::attr("h3.property-title a", "title"),
            Probe::text("h3.property-title"),
        ],
        price: &[Probe::text("span.price")],
        link: &[
            Probe::attr("a.property-link", "href"),
            Probe::attr("h3.property-title a", "href"),
        ],
        rooms: &[Probe::text("li.features__item--rooms")],
        area: &[Probe::text("li.features__item--area")],
        location: &[Probe::text("p.location")],
    },
    delay: Duration::from_millis(8000),
    url_template: yaencontre_url,
};

/// The set of portals this build knows how to search
#[derive(Debug, Clone)]
pub struct PortalRegistry {
    descriptors: Vec<PortalDescriptor>,
}

impl PortalRegistry {
    pub fn builtin() -> Self {
        Self::with_descriptors(vec![IDEALISTA, FOTOCASA, SPOTAHOME, YAENCONTRE])
    }

    pub fn with_descriptors(descriptors: Vec<PortalDescriptor>) -> Self {
        Self { descriptors }
    }

    pub fn get(&self, portal: PortalId) -> Option<&PortalDescriptor> {
        self.descriptors.iter().find(|d| d.portal == portal)
    }

    pub fn descriptors(&self) -> &[PortalDescriptor] {
        &self.descriptors
    }

    /// `None` when the portal has no descriptor in this registry
    pub fn build_url(&self, portal: PortalId, filter: &SearchFilter) -> Option<String> {
        self.get(portal).map(|d| d.search_url(filter))
    }

    /// Same as [`build_url`](Self::build_url) for a portal given by name
    pub fn build_url_by_name(&self, portal: &str, filter: &SearchFilter) -> Option<String> {
        let portal: PortalId = portal.parse().ok()?;
        self.build_url(portal, filter)
    }
}

impl Default for PortalRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

//! Rental listing scout for Spanish portals (Idealista, Fotocasa, Spotahome,
//! Yaencontre): builds each portal's search URL from one filter, fetches and
//! parses the results pages, merges the listings and exports them.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod present;
pub mod scrapers;
pub mod search;

pub use aggregate::{aggregate, ExtraFilters};
pub use error::{DriverInitError, ExtractionError, FetchError};
pub use models::{ListingRecord, PortalId, ResultSet, PLACEHOLDER};
pub use scrapers::{PortalRegistry, SearchFilter};
pub use search::{SearchOptions, SearchReport, SearchRunner};

pub mod browser;
pub mod extract;
pub mod http;
pub mod portals;
pub mod traits;
pub mod types;

pub use browser::{BrowserConfig, BrowserSession};
pub use extract::{Extraction, Extractor, MAX_RESULTS};
pub use http::HttpFetcher;
pub use portals::{FetchStrategy, PortalDescriptor, PortalRegistry};
pub use traits::PageFetcher;
pub use types::SearchFilter;

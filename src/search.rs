//! Sequential search across the selected portals.
//!
//! Each portal is fetched and parsed to completion before the next one starts.
//! A portal failure is recorded in the report and never stops the loop.

use crate::error::{ExtractionError, FetchError};
use crate::models::{ListingRecord, PortalId};
use crate::scrapers::{
    Extractor, FetchStrategy, PageFetcher, PortalDescriptor, PortalRegistry, SearchFilter,
    MAX_RESULTS,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Cap on records kept per portal
    pub max_results: usize,
    /// Sleep each portal's fixed delay after fetching it
    pub pause_between_requests: bool,
    /// Write every fetched page here as `<portal>.html`
    pub debug_dir: Option<PathBuf>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS,
            pause_between_requests: true,
            debug_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum PortalStatus {
    Completed {
        records: Vec<ListingRecord>,
        skipped: Vec<ExtractionError>,
        truncated: usize,
    },
    Failed(FetchError),
    /// No usable descriptor for the portal
    Unsupported(String),
}

#[derive(Debug)]
pub struct PortalOutcome {
    pub portal: PortalId,
    pub url: Option<String>,
    pub status: PortalStatus,
}

impl PortalOutcome {
    pub fn records(&self) -> &[ListingRecord] {
        match &self.status {
            PortalStatus::Completed { records, .. } => records,
            _ => &[],
        }
    }
}

/// Per-portal outcomes of one search, in query order
#[derive(Debug, Default)]
pub struct SearchReport {
    outcomes: Vec<PortalOutcome>,
}

impl SearchReport {
    pub fn outcomes(&self) -> &[PortalOutcome] {
        &self.outcomes
    }

    /// Records grouped by portal, ready for aggregation
    pub fn per_portal(&self) -> Vec<(PortalId, Vec<ListingRecord>)> {
        self.outcomes
            .iter()
            .map(|o| (o.portal, o.records().to_vec()))
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.outcomes.iter().map(|o| o.records().len()).sum()
    }

    pub fn failed_portals(&self) -> Vec<PortalId> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, PortalStatus::Completed { .. }))
            .map(|o| o.portal)
            .collect()
    }

    /// Log every portal's result once, after the whole search has run.
    /// An empty search is announced by the presenter, not here.
    pub fn log_summary(&self) {
        for outcome in &self.outcomes {
            match &outcome.status {
                PortalStatus::Completed {
                    records,
                    skipped,
                    truncated,
                } => {
                    info!("{}: {} listings", outcome.portal, records.len());
                    if *truncated > 0 {
                        info!("{}: {} more listings over the cap were dropped", outcome.portal, truncated);
                    }
                    for reason in skipped {
                        warn!("{}: skipped {}", outcome.portal, reason);
                    }
                }
                PortalStatus::Failed(e) => warn!("{}: {}", outcome.portal, e),
                PortalStatus::Unsupported(reason) => warn!("{}: {}", outcome.portal, reason),
            }
        }
    }
}

/// Runs one search. Fetchers are borrowed; the caller owns their lifetime.
pub struct SearchRunner<'a> {
    registry: &'a PortalRegistry,
    http: &'a dyn PageFetcher,
    browser: Option<&'a dyn PageFetcher>,
    options: SearchOptions,
}

impl<'a> SearchRunner<'a> {
    pub fn new(registry: &'a PortalRegistry, http: &'a dyn PageFetcher, options: SearchOptions) -> Self {
        Self {
            registry,
            http,
            browser: None,
            options,
        }
    }

    pub fn with_browser(mut self, browser: &'a dyn PageFetcher) -> Self {
        self.browser = Some(browser);
        self
    }

    /// True when any selected portal can only be fetched through a browser
    pub fn needs_browser(registry: &PortalRegistry, filter: &SearchFilter) -> bool {
        filter.portals.iter().any(|p| {
            registry
                .get(*p)
                .is_some_and(|d| d.strategy == FetchStrategy::Browser)
        })
    }

    pub async fn run(&self, filter: &SearchFilter) -> SearchReport {
        let mut report = SearchReport::default();

        for (i, &portal) in filter.portals.iter().enumerate() {
            info!("Searching {}...", portal);
            // Nothing follows the last portal, so its pause would only delay the results
            let pause = self.options.pause_between_requests && i + 1 < filter.portals.len();
            let outcome = match self.registry.get(portal) {
                Some(descriptor) => self.run_portal(descriptor, filter, pause).await,
                None => PortalOutcome {
                    portal,
                    url: None,
                    status: PortalStatus::Unsupported("no search descriptor registered".to_string()),
                },
            };
            report.outcomes.push(outcome);
        }

        report
    }

    async fn run_portal(
        &self,
        descriptor: &PortalDescriptor,
        filter: &SearchFilter,
        pause: bool,
    ) -> PortalOutcome {
        let portal = descriptor.portal;
        let url = descriptor.search_url(filter);

        let extractor = match Extractor::new(descriptor) {
            Ok(extractor) => extractor,
            Err(e) => {
                return PortalOutcome {
                    portal,
                    url: Some(url),
                    status: PortalStatus::Unsupported(format!("{:#}", e)),
                }
            }
        };

        let fetcher = match descriptor.strategy {
            FetchStrategy::Http => Some(self.http),
            FetchStrategy::Browser => self.browser,
        };
        let Some(fetcher) = fetcher else {
            return PortalOutcome {
                portal,
                status: PortalStatus::Failed(FetchError::BrowserUnavailable { url: url.clone() }),
                url: Some(url),
            };
        };

        info!("Fetching {} via {}", url, fetcher.strategy_name());
        let fetched = fetcher.fetch(&url, descriptor.ready_selector).await;

        if pause {
            tokio::time::sleep(descriptor.delay).await;
        }

        let status = match fetched {
            Ok(html) => {
                self.dump_page(portal, &html).await;
                let extraction = extractor.extract(&html, self.options.max_results);
                PortalStatus::Completed {
                    records: extraction.records,
                    skipped: extraction.skipped,
                    truncated: extraction.truncated,
                }
            }
            Err(e) => PortalStatus::Failed(e),
        };

        PortalOutcome {
            portal,
            url: Some(url),
            status,
        }
    }

    async fn dump_page(&self, portal: PortalId, html: &str) {
        let Some(dir) = &self.options.debug_dir else {
            return;
        };

        let path = dir.join(format!("{}.html", portal.name().to_lowercase()));
        let written = match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&path, html).await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => info!("Saved page HTML to {} ({} bytes)", path.display(), html.len()),
            Err(e) => warn!("Could not save page HTML to {}: {}", path.display(), e),
        }
    }
}

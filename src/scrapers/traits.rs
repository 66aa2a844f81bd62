use crate::error::FetchError;
use async_trait::async_trait;

/// Common trait for the ways a portal results page can be retrieved.
/// Server-rendered portals go through plain HTTP, script-heavy ones through a browser.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Return the page HTML. `ready_selector` marks listing content; fetchers that
    /// render script wait for it, plain HTTP fetchers ignore it.
    async fn fetch(&self, url: &str, ready_selector: &str) -> Result<String, FetchError>;

    /// Short name used in logs
    fn strategy_name(&self) -> &'static str;
}

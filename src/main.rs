use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use rental_scout::config::Cli;
use rental_scout::export;
use rental_scout::present::render;
use rental_scout::scrapers::{BrowserSession, HttpFetcher, PortalRegistry};
use rental_scout::{aggregate, SearchRunner};
use std::io;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🏠 Rental Scout");
    info!("==============");

    let filter = cli.search_filter();
    let registry = PortalRegistry::builtin();
    let http = HttpFetcher::new(cli.http_timeout())?;

    info!(
        "Searching {} for {} (≤ {} €, ≥ {} rooms, ≥ {} m²)",
        filter
            .portals
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", "),
        filter.location,
        filter.max_price,
        filter.min_rooms,
        filter.min_area
    );

    // The browser only lives for this search; dropping it shuts Chrome down
    let browser = if SearchRunner::needs_browser(&registry, &filter) {
        match BrowserSession::launch(cli.browser_config()) {
            Ok(session) => Some(session),
            Err(e) => {
                error!("🚨 {}", e);
                return Err(e.into());
            }
        }
    } else {
        None
    };

    let report = {
        let mut runner = SearchRunner::new(&registry, &http, cli.search_options());
        if let Some(session) = &browser {
            runner = runner.with_browser(session);
        }
        runner.run(&filter).await
    };
    drop(browser);

    report.log_summary();

    let results = aggregate(&report.per_portal(), &cli.extra_filters(&filter));
    info!(
        "✅ {} listings kept out of {} scraped",
        results.len(),
        report.total_records()
    );

    render(&results, cli.view, &mut io::stdout().lock())?;

    if let Some(format) = cli.export {
        if results.is_empty() {
            info!("Nothing to export");
        } else {
            export::save(
                &results,
                format,
                &cli.output_dir,
                &filter.location,
                Utc::now().date_naive(),
            )
            .await?;
        }
    }

    Ok(())
}

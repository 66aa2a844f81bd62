use crate::aggregate::ExtraFilters;
use crate::export::ExportFormat;
use crate::models::PortalId;
use crate::present::View;
use crate::scrapers::{BrowserConfig, SearchFilter, MAX_RESULTS};
use crate::search::SearchOptions;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Search Spanish rental portals and list the matching flats
#[derive(Parser, Debug, Clone)]
#[command(name = "rental-scout", version)]
pub struct Cli {
    /// City or area, as the portals spell it in their URLs
    #[arg(short, long, default_value = "madrid")]
    pub location: String,

    /// Maximum monthly rent in EUR
    #[arg(long, default_value_t = 1100, value_parser = clap::value_parser!(u32).range(500..=3000))]
    pub max_price: u32,

    /// Minimum number of bedrooms
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=5))]
    pub min_rooms: u32,

    /// Minimum surface in square meters
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(40..=200))]
    pub min_area: u32,

    /// Portals to search, in order
    #[arg(short, long, value_enum, value_delimiter = ',', default_values_t = [PortalId::Idealista, PortalId::Fotocasa])]
    pub portals: Vec<PortalId>,

    /// Drop listings below this rent
    #[arg(long)]
    pub min_price: Option<i64>,

    /// Keep only listings whose title contains one of these words (repeatable)
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// Drop listings missing rooms, area or location
    #[arg(long)]
    pub drop_incomplete: bool,

    #[arg(long, value_enum, default_value_t = View::Cards)]
    pub view: View,

    /// Also write the results to a file
    #[arg(short, long, value_enum)]
    pub export: Option<ExportFormat>,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Listings kept per portal
    #[arg(long, default_value_t = MAX_RESULTS)]
    pub max_results: usize,

    #[arg(long, env = "SCOUT_HTTP_TIMEOUT", default_value_t = 30)]
    pub http_timeout_secs: u64,

    #[arg(long, env = "SCOUT_PAGE_TIMEOUT", default_value_t = 45)]
    pub page_timeout_secs: u64,

    /// How long to wait for listing cards to render
    #[arg(long, env = "SCOUT_WAIT_TIMEOUT", default_value_t = 30)]
    pub wait_timeout_secs: u64,

    /// Chrome/Chromium binary
    #[arg(long, env = "CHROME_BIN")]
    pub chrome_bin: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Skip the fixed pause after each portal
    #[arg(long)]
    pub no_delay: bool,

    /// Save each fetched page here for selector debugging
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,
}

impl Cli {
    pub fn search_filter(&self) -> SearchFilter {
        SearchFilter::new(
            &self.location,
            self.max_price,
            self.min_rooms,
            self.min_area,
            self.portals.iter().copied(),
        )
    }

    pub fn extra_filters(&self, filter: &SearchFilter) -> ExtraFilters {
        ExtraFilters {
            min_price: self.min_price,
            keywords: self.keywords.clone(),
            drop_incomplete: self.drop_incomplete,
            ..ExtraFilters::from_search(filter)
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_results: self.max_results,
            pause_between_requests: !self.no_delay,
            debug_dir: self.debug_dir.clone(),
        }
    }

    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            headless: !self.headful,
            chrome_bin: self.chrome_bin.clone(),
            page_timeout: Duration::from_secs(self.page_timeout_secs),
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_usual_search() {
        let cli = Cli::try_parse_from(["rental-scout"]).unwrap();
        let filter = cli.search_filter();

        assert_eq!(filter, SearchFilter::default());
        assert_eq!(cli.view, View::Cards);
        assert_eq!(cli.export, None);
        assert!(cli.search_options().pause_between_requests);
    }

    #[test]
    fn parses_portals_filters_and_output() {
        let cli = Cli::try_parse_from([
            "rental-scout",
            "--location",
            "Valencia",
            "--max-price",
            "900",
            "--portals",
            "yaencontre,spotahome",
            "-k",
            "terraza",
            "-k",
            "ático",
            "--min-price",
            "600",
            "--export",
            "xlsx",
            "--view",
            "table",
            "--no-delay",
        ])
        .unwrap();

        let filter = cli.search_filter();
        assert_eq!(filter.location, "valencia");
        assert_eq!(filter.portals, vec![PortalId::Yaencontre, PortalId::Spotahome]);

        let extra = cli.extra_filters(&filter);
        assert_eq!(extra.max_price, Some(900));
        assert_eq!(extra.min_price, Some(600));
        assert_eq!(extra.min_area, Some(60));
        assert_eq!(extra.keywords, vec!["terraza", "ático"]);

        assert_eq!(cli.export, Some(ExportFormat::Xlsx));
        assert_eq!(cli.view, View::Table);
        assert!(!cli.search_options().pause_between_requests);
    }

    #[test]
    fn rejects_values_outside_the_slider_ranges() {
        assert!(Cli::try_parse_from(["rental-scout", "--max-price", "100"]).is_err());
        assert!(Cli::try_parse_from(["rental-scout", "--min-rooms", "9"]).is_err());
        assert!(Cli::try_parse_from(["rental-scout", "--portals", "habitaclia"]).is_err());
    }
}

use crate::error::ExtractionError;
use crate::models::{ListingRecord, PortalId};
use crate::scrapers::portals::{FieldRule, FieldSource, PortalDescriptor};
use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Cards per portal kept after extraction
pub const MAX_RESULTS: usize = 50;

/// Outcome of parsing one results page
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extraction {
    pub records: Vec<ListingRecord>,
    /// Cards dropped because a mandatory field was unusable
    pub skipped: Vec<ExtractionError>,
    /// Well-formed cards dropped by the per-portal cap
    pub truncated: usize,
}

struct CompiledProbe {
    selector: Selector,
    source: FieldSource,
    nth: usize,
}

/// Generic card extractor driven by a [`PortalDescriptor`]
pub struct Extractor {
    portal: PortalId,
    base: Url,
    card: Selector,
    title: Vec<CompiledProbe>,
    price: Vec<CompiledProbe>,
    link: Vec<CompiledProbe>,
    rooms: Vec<CompiledProbe>,
    area: Vec<CompiledProbe>,
    location: Vec<CompiledProbe>,
}

fn parse_selector(portal: PortalId, raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| anyhow!("invalid {} selector {:?}: {:?}", portal, raw, e))
}

fn compile(portal: PortalId, rule: FieldRule) -> Result<Vec<CompiledProbe>> {
    rule.iter()
        .map(|probe| -> Result<CompiledProbe> {
            Ok(CompiledProbe {
                selector: parse_selector(portal, probe.selector)?,
                source: probe.source,
                nth: probe.nth,
            })
        })
        .collect()
}

/// Collapse runs of whitespace and trim; `None` when nothing is left
fn clean(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Strip every non-digit and parse what remains.
///
/// Assumes one whole-euro figure per listing: "1.100 €/mes" is 1100, but a
/// decimal or ranged price is read as one long number.
pub fn parse_price(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

impl Extractor {
    pub fn new(descriptor: &PortalDescriptor) -> Result<Self> {
        let portal = descriptor.portal;
        let s = &descriptor.selectors;

        Ok(Self {
            portal,
            base: Url::parse(descriptor.base_url)
                .with_context(|| format!("invalid base url for {}", portal))?,
            card: parse_selector(portal, s.card)?,
            title: compile(portal, s.title)?,
            price: compile(portal, s.price)?,
            link: compile(portal, s.link)?,
            rooms: compile(portal, s.rooms)?,
            area: compile(portal, s.area)?,
            location: compile(portal, s.location)?,
        })
    }

    pub fn portal(&self) -> PortalId {
        self.portal
    }

    /// Parse a results page, stamping records with today's date
    pub fn extract(&self, html: &str, max_results: usize) -> Extraction {
        self.extract_on(html, max_results, Utc::now().date_naive())
    }

    pub fn extract_on(&self, html: &str, max_results: usize, retrieved_at: NaiveDate) -> Extraction {
        let document = Html::parse_document(html);
        let mut extraction = Extraction::default();

        for (index, card) in document.select(&self.card).enumerate() {
            match self.extract_card(index, card, retrieved_at) {
                Ok(record) => {
                    debug!("{} card {}: {} ({} EUR)", self.portal, index, record.title, record.price);
                    extraction.records.push(record);
                }
                Err(reason) => {
                    debug!("{} skipped {}", self.portal, reason);
                    extraction.skipped.push(reason);
                }
            }
        }

        if extraction.records.len() > max_results {
            extraction.truncated = extraction.records.len() - max_results;
            extraction.records.truncate(max_results);
        }

        extraction
    }

    fn extract_card(
        &self,
        index: usize,
        card: ElementRef<'_>,
        retrieved_at: NaiveDate,
    ) -> Result<ListingRecord, ExtractionError> {
        let missing = |field| ExtractionError::MissingField { index, field };

        let title = first_value(card, &self.title).ok_or_else(|| missing("title"))?;
        let raw_price = first_value(card, &self.price).ok_or_else(|| missing("price"))?;
        let href = first_value(card, &self.link).ok_or_else(|| missing("link"))?;

        let price = parse_price(&raw_price).ok_or(ExtractionError::InvalidPrice {
            index,
            raw: raw_price.clone(),
        })?;
        let invalid_link = || ExtractionError::InvalidLink { index, href: href.clone() };
        let url = self.base.join(&href).map_err(|_| invalid_link())?;
        // javascript:, mailto: and tel: links survive the join untouched
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid_link());
        }

        Ok(ListingRecord {
            portal: self.portal,
            title,
            price,
            rooms: first_value(card, &self.rooms),
            area: first_value(card, &self.area),
            location: first_value(card, &self.location),
            url: url.to_string(),
            retrieved_at,
        })
    }
}

fn first_value(card: ElementRef<'_>, probes: &[CompiledProbe]) -> Option<String> {
    probes.iter().find_map(|probe| {
        let element = card.select(&probe.selector).nth(probe.nth)?;
        match probe.source {
            FieldSource::Text => clean(&element.text().collect::<String>()),
            FieldSource::Attr(name) => element.value().attr(name).and_then(clean),
        }
    })
}

/// One-shot extraction for callers without a cached [`Extractor`]
pub fn extract(descriptor: &PortalDescriptor, html: &str, max_results: usize) -> Result<Extraction> {
    Ok(Extractor::new(descriptor)?.extract(html, max_results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PLACEHOLDER;
    use crate::scrapers::portals::{PortalRegistry, FOTOCASA, IDEALISTA, SPOTAHOME, YAENCONTRE};

    fn idealista_card(title: &str, price: &str, details: &[&str], href: &str) -> String {
        let details: String = details
            .iter()
            .map(|d| format!(r#"<span class="item-detail">{d}</span>"#))
            .collect();
        format!(
            r#"<article class="item-info-container">
                 <a class="item-link" title="{title}" href="{href}">{title}</a>
                 <div><span class="price">{price}</span></div>
                 <div class="item-detail-char">{details}</div>
                 <span class="location">Chamberí, Madrid</span>
               </article>"#
        )
    }

    fn page(cards: &[String]) -> String {
        format!("<html><body><main>{}</main></body></html>", cards.join("\n"))
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn builtin_descriptors_compile() {
        for descriptor in PortalRegistry::builtin().descriptors() {
            assert!(Extractor::new(descriptor).is_ok(), "{} selectors", descriptor.portal);
        }
    }

    #[test]
    fn well_formed_cards_all_extracted() {
        let html = page(&[
            idealista_card("Piso en Chamberí", "1.050 €/mes", &["2 hab.", "70 m²"], "/inmueble/1/"),
            idealista_card("Ático en Lavapiés", "980€/mes", &["3 hab.", "85 m²"], "/inmueble/2/"),
            idealista_card("Estudio en Sol", "700 €", &["1 hab.", "35 m²"], "/inmueble/3/"),
        ]);

        let extraction = Extractor::new(&IDEALISTA).unwrap().extract_on(&html, MAX_RESULTS, date());

        assert_eq!(extraction.records.len(), 3);
        assert!(extraction.skipped.is_empty());

        let first = &extraction.records[0];
        assert_eq!(first.portal, PortalId::Idealista);
        assert_eq!(first.title, "Piso en Chamberí");
        assert_eq!(first.price, 1050);
        assert_eq!(first.rooms.as_deref(), Some("2 hab."));
        assert_eq!(first.area.as_deref(), Some("70 m²"));
        assert_eq!(first.location.as_deref(), Some("Chamberí, Madrid"));
        assert_eq!(first.url, "https://www.idealista.com/inmueble/1/");
        assert_eq!(first.retrieved_at, date());
    }

    #[test]
    fn missing_optional_field_keeps_record() {
        let html = page(&[
            idealista_card("Piso A", "900 €", &["2 hab."], "/inmueble/1/"),
            idealista_card("Piso B", "950 €", &["2 hab.", "60 m²"], "/inmueble/2/"),
        ]);

        let extraction = Extractor::new(&IDEALISTA).unwrap().extract(&html, MAX_RESULTS);

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].area, None);
        assert_eq!(extraction.records[0].area_or_placeholder(), PLACEHOLDER);
    }

    #[test]
    fn missing_mandatory_field_skips_only_that_card() {
        let no_price = r#"<article class="item-info-container">
                <a class="item-link" title="Sin precio" href="/inmueble/9/">Sin precio</a>
            </article>"#
            .to_string();
        let html = page(&[
            idealista_card("Piso A", "900 €", &["2 hab.", "60 m²"], "/inmueble/1/"),
            no_price,
            idealista_card("Piso C", "1.000 €", &["2 hab.", "65 m²"], "/inmueble/3/"),
        ]);

        let extraction = Extractor::new(&IDEALISTA).unwrap().extract(&html, MAX_RESULTS);

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(
            extraction.skipped,
            vec![ExtractionError::MissingField { index: 1, field: "price" }]
        );
    }

    #[test]
    fn non_navigable_link_skips_the_card() {
        let html = page(&[
            idealista_card("Piso A", "900 €", &["2 hab.", "60 m²"], "javascript:void(0)"),
            idealista_card("Piso B", "950 €", &["2 hab.", "60 m²"], "mailto:info@idealista.com"),
            idealista_card("Piso C", "1.000 €", &["2 hab.", "65 m²"], "/inmueble/3/"),
        ]);

        let extraction = Extractor::new(&IDEALISTA).unwrap().extract(&html, MAX_RESULTS);

        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].url, "https://www.idealista.com/inmueble/3/");
        assert_eq!(
            extraction.skipped,
            vec![
                ExtractionError::InvalidLink { index: 0, href: "javascript:void(0)".to_string() },
                ExtractionError::InvalidLink { index: 1, href: "mailto:info@idealista.com".to_string() },
            ]
        );
    }

    #[test]
    fn oversized_price_is_not_a_whole_number() {
        let html = page(&[idealista_card(
            "Piso A",
            "1.100.000.000.000.000.000.000 €",
            &[],
            "/inmueble/1/",
        )]);
        let extraction = Extractor::new(&IDEALISTA).unwrap().extract(&html, MAX_RESULTS);

        assert!(extraction.records.is_empty());
        let message = extraction.skipped[0].to_string();
        assert!(message.ends_with("is not a whole number"), "{message}");
        assert!(!message.contains("no digits"));
    }

    #[test]
    fn spotahome_card_extracted() {
        let html = r#"<article class="homecard">
                <a class="homecard__link" href="/es/madrid/for-rent:apartments/412345" title="Apartamento en Malasaña">
                  <h3 class="homecard__title">Apartamento de 2 dormitorios en Malasaña</h3>
                </a>
                <p class="homecard-price">1.025 €/mes</p>
                <span class="homecard__bedrooms">2 dormitorios</span>
                <span class="homecard__address">Calle del Pez, Madrid</span>
            </article>"#;

        let extraction = Extractor::new(&SPOTAHOME).unwrap().extract(html, MAX_RESULTS);
        let record = &extraction.records[0];

        assert_eq!(record.portal, PortalId::Spotahome);
        assert_eq!(record.title, "Apartamento de 2 dormitorios en Malasaña");
        assert_eq!(record.price, 1025);
        assert_eq!(record.rooms.as_deref(), Some("2 dormitorios"));
        assert_eq!(record.area, None);
        assert_eq!(record.location.as_deref(), Some("Calle del Pez, Madrid"));
        assert_eq!(record.url, "https://www.spotahome.com/es/madrid/for-rent:apartments/412345");
    }

    #[test]
    fn price_without_digits_is_rejected() {
        let html = page(&[idealista_card("Piso A", "A consultar", &[], "/inmueble/1/")]);
        let extraction = Extractor::new(&IDEALISTA).unwrap().extract(&html, MAX_RESULTS);

        assert!(extraction.records.is_empty());
        assert!(matches!(
            extraction.skipped[0],
            ExtractionError::InvalidPrice { index: 0, .. }
        ));
    }

    #[test]
    fn fallback_probe_used_when_first_misses() {
        // title attribute absent, link text used instead
        let html = page(&[r#"<article class="item-info-container">
                <a class="item-link" href="https://www.idealista.com/inmueble/7/">  Dúplex
                   en Malasaña </a>
                <span class="item-price">1.250 €/mes</span>
            </article>"#
            .to_string()]);

        let extraction = Extractor::new(&IDEALISTA).unwrap().extract(&html, MAX_RESULTS);
        let record = &extraction.records[0];

        assert_eq!(record.title, "Dúplex en Malasaña");
        assert_eq!(record.price, 1250);
        assert_eq!(record.url, "https://www.idealista.com/inmueble/7/");
        assert_eq!(record.location, None);
    }

    #[test]
    fn positional_features_on_fotocasa() {
        let html = r#"<div class="re-Card">
                <a class="re-Card-link" href="/es/alquiler/vivienda/madrid/123">
                  <h3 class="re-Card-title">Piso en Retiro</h3>
                </a>
                <span class="re-Card-price">1.090 €/mes</span>
                <span class="re-Card-feature">3 habs.</span>
                <span class="re-Card-feature">90 m²</span>
                <span class="re-Card-location">Retiro, Madrid</span>
            </div>"#;

        let extraction = Extractor::new(&FOTOCASA).unwrap().extract(html, MAX_RESULTS);
        let record = &extraction.records[0];

        assert_eq!(record.rooms.as_deref(), Some("3 habs."));
        assert_eq!(record.area.as_deref(), Some("90 m²"));
        assert_eq!(record.url, "https://www.fotocasa.es/es/alquiler/vivienda/madrid/123");
    }

    #[test]
    fn output_capped_per_portal() {
        let cards: Vec<String> = (0..60)
            .map(|i| idealista_card(&format!("Piso {i}"), "900 €", &[], &format!("/inmueble/{i}/")))
            .collect();

        let extraction = Extractor::new(&IDEALISTA).unwrap().extract(&page(&cards), MAX_RESULTS);

        assert_eq!(extraction.records.len(), MAX_RESULTS);
        assert_eq!(extraction.truncated, 10);
        assert_eq!(extraction.records[49].title, "Piso 49");
    }

    #[test]
    fn page_without_cards_is_empty_not_an_error() {
        let extraction = extract(&YAENCONTRE, "<html><body>Sin resultados</body></html>", 10).unwrap();
        assert_eq!(extraction, Extraction::default());
    }

    #[test]
    fn parse_price_strips_currency_and_separators() {
        assert_eq!(parse_price("1.100 €/mes"), Some(1100));
        assert_eq!(parse_price("€ 950"), Some(950));
        assert_eq!(parse_price("consultar"), None);
    }
}

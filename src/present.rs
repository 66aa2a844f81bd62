use crate::models::ResultSet;
use std::io::{self, Write};

pub const NO_RESULTS: &str = "⚠️  No results found";

const TITLE_WIDTH: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum View {
    /// One block per listing
    Cards,
    /// One row per listing
    Table,
}

pub fn render<W: Write>(results: &ResultSet, view: View, out: &mut W) -> io::Result<()> {
    if results.is_empty() {
        return writeln!(out, "{}", NO_RESULTS);
    }

    writeln!(out, "📊 Listings found: {}", results.len())?;
    writeln!(out)?;

    match view {
        View::Cards => render_cards(results, out),
        View::Table => render_table(results, out),
    }
}

fn render_cards<W: Write>(results: &ResultSet, out: &mut W) -> io::Result<()> {
    for (i, record) in results.iter().enumerate() {
        writeln!(out, "{}. {} ({} €)", i + 1, record.title, record.price)?;
        writeln!(out, "   Location: {}", record.location_or_placeholder())?;
        writeln!(out, "   Portal: {}", record.portal)?;
        writeln!(
            out,
            "   {} · {}",
            record.rooms_or_placeholder(),
            record.area_or_placeholder()
        )?;
        writeln!(out, "   URL: {}", record.url)?;
        writeln!(out)?;
    }
    Ok(())
}

fn shorten(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width - 1).collect();
        short.push('…');
        short
    }
}

fn render_table<W: Write>(results: &ResultSet, out: &mut W) -> io::Result<()> {
    let header = ["Portal", "Title", "Price", "Rooms", "Area", "Location", "URL"];
    let rows: Vec<[String; 7]> = results
        .iter()
        .map(|r| {
            [
                r.portal.to_string(),
                shorten(&r.title, TITLE_WIDTH),
                r.price.to_string(),
                r.rooms_or_placeholder().to_string(),
                r.area_or_placeholder().to_string(),
                r.location_or_placeholder().to_string(),
                r.url.clone(),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(header.to_vec()))?;
    writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    )?;
    for row in &rows {
        writeln!(out, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

//! Deck price totals and per-line breakdowns.
//!
//! Totals are returned at full precision; [`round_cents`] and [`format_price`]
//! are for presentation and persistence.

use crate::catalog::CardCatalog;
use crate::models::{PriceLine, SavedCard};

use super::state::Deck;

/// Sum of unit price times count over every entry.
pub fn total_price(deck: &Deck, catalog: &CardCatalog) -> f64 {
    deck.entries()
        .iter()
        .map(|e| catalog.resolve_price(&e.card_id, e.basic_energy) * f64::from(e.count))
        .sum()
}

/// One line per entry, in deck order.
pub fn price_breakdown(deck: &Deck, catalog: &CardCatalog) -> Vec<PriceLine> {
    deck.entries()
        .iter()
        .map(|e| {
            let unit_price = catalog.resolve_price(&e.card_id, e.basic_energy);
            let external_link = if unit_price > 0.0 {
                catalog
                    .lookup(&e.card_id)
                    .and_then(|c| c.tcgplayer_url())
                    .map(str::to_string)
            } else {
                None
            };
            PriceLine {
                name: e.name.clone(),
                count: e.count,
                unit_price,
                line_total: unit_price * f64::from(e.count),
                external_link,
            }
        })
        .collect()
}

/// Price of a persisted card list, rounded to cents.
///
/// Cards the catalog no longer knows contribute nothing.
pub fn saved_cards_price(cards: &[SavedCard], catalog: &CardCatalog) -> f64 {
    let total: f64 = cards
        .iter()
        .map(|line| {
            let basic = catalog.lookup(&line.id).is_some_and(|c| c.is_basic_energy());
            catalog.resolve_price(&line.id, basic) * f64::from(line.count)
        })
        .sum();
    round_cents(total)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Two-decimal dollar string, e.g. `$12.50`.
pub fn format_price(value: f64) -> String {
    format!("${value:.2}")
}

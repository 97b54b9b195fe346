use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PriceLine: One row of a deck's price breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PriceLine {
    pub name: String,
    pub count: u32,
    pub unit_price: f64,
    pub line_total: f64,
    /// TCGplayer link, only when the card has a URL and a positive price.
    pub external_link: Option<String>,
}

// ---------------------------------------------------------------------------
// DeckSummary: Derived display values kept in step with the deck
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeckSummary {
    pub total_count: u32,
    /// Full precision; round only for display.
    pub total_price: f64,
}

use serde::{Deserialize, Serialize};

use crate::config;

// ---------------------------------------------------------------------------
// Card: One printing from the catalog API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    pub supertype: Supertype,
    #[serde(default)]
    pub subtypes: Vec<String>,
    /// Element types (e.g. "Water", "Psychic").
    #[serde(default)]
    pub types: Vec<String>,
    pub set: CardSet,
    #[serde(default)]
    pub number: String,
    pub rarity: Option<String>,
    pub images: Option<CardImages>,
    pub tcgplayer: Option<TcgPlayer>,
}

impl Card {
    /// True for basic energy, which is exempt from the per-name copy cap
    /// and always priced at zero.
    pub fn is_basic_energy(&self) -> bool {
        self.supertype == Supertype::Energy
            && self.subtypes.iter().any(|s| s.eq_ignore_ascii_case("basic"))
    }

    pub fn is_ace_spec(&self) -> bool {
        self.rarity_contains(config::ACE_SPEC_MARKER)
    }

    pub fn is_radiant(&self) -> bool {
        self.rarity_contains(config::RADIANT_MARKER)
    }

    fn rarity_contains(&self, marker: &str) -> bool {
        self.rarity.as_deref().is_some_and(|r| r.contains(marker))
    }

    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.subtypes.iter().any(|s| s.eq_ignore_ascii_case(subtype))
    }

    /// Price quotes in resolution order: holofoil market, normal market,
    /// reverse holofoil market, holofoil mid, normal mid.
    pub fn price_candidates(&self) -> [Option<f64>; 5] {
        let Some(prices) = self.tcgplayer.as_ref().and_then(|t| t.prices.as_ref()) else {
            return [None; 5];
        };
        let market = |q: &Option<PriceQuote>| q.as_ref().and_then(|q| q.market);
        let mid = |q: &Option<PriceQuote>| q.as_ref().and_then(|q| q.mid);
        [
            market(&prices.holofoil),
            market(&prices.normal),
            market(&prices.reverse_holofoil),
            mid(&prices.holofoil),
            mid(&prices.normal),
        ]
    }

    /// First available quote, or 0 when the card carries no price data.
    pub fn market_price(&self) -> f64 {
        self.price_candidates()
            .into_iter()
            .flatten()
            .next()
            .unwrap_or(0.0)
    }

    /// TCGplayer product page, if known.
    pub fn tcgplayer_url(&self) -> Option<&str> {
        self.tcgplayer.as_ref().and_then(|t| t.url.as_deref())
    }

    /// Short set code used in decklists: `ptcgoCode`, falling back to the set id.
    pub fn set_code(&self) -> &str {
        self.set.ptcgo_code.as_deref().unwrap_or(&self.set.id)
    }
}

// ---------------------------------------------------------------------------
// Supertype
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Supertype {
    #[serde(rename = "Pokémon")]
    Pokemon,
    Trainer,
    Energy,
    #[serde(other)]
    Other,
}

impl Supertype {
    pub fn label(&self) -> &'static str {
        match self {
            Supertype::Pokemon => "Pokémon",
            Supertype::Trainer => "Trainer",
            Supertype::Energy => "Energy",
            Supertype::Other => "Other",
        }
    }
}

// ---------------------------------------------------------------------------
// Nested card objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    pub id: String,
    pub name: String,
    pub ptcgo_code: Option<String>,
    pub series: Option<String>,
    pub images: Option<SetImages>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetImages {
    pub symbol: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardImages {
    pub small: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcgPlayer {
    pub url: Option<String>,
    pub updated_at: Option<String>,
    pub prices: Option<TcgPrices>,
}

/// Quotes per finish. Finishes missing from the API response stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcgPrices {
    pub holofoil: Option<PriceQuote>,
    pub normal: Option<PriceQuote>,
    pub reverse_holofoil: Option<PriceQuote>,
    #[serde(rename = "1stEditionHolofoil")]
    pub first_edition_holofoil: Option<PriceQuote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub low: Option<f64>,
    pub mid: Option<f64>,
    pub high: Option<f64>,
    pub market: Option<f64>,
    pub direct_low: Option<f64>,
}

//! Shared test fixtures for the deck builder integration tests.
//!
//! Provides a small card catalog covering every rule the deck model cares
//! about (copy cap, basic energy, ACE SPEC, Radiant, mid-only pricing) and a
//! `DeckBuilder` over an in-memory store with the catalog installed.

#![allow(dead_code)]

use std::sync::Arc;

use ptcg_deckbuilder::models::{Card, SavedCard};
use ptcg_deckbuilder::{CardCatalog, DeckBuilder};
use serde_json::json;

pub const SQUIRTLE: &str = "sv3pt5-7";
pub const RESEARCH_SVI: &str = "sv1-189";
pub const RESEARCH_SSH: &str = "swsh1-178";
pub const WATER_ENERGY: &str = "sve-3";
pub const PRIME_CATCHER: &str = "sv4-157";
pub const MASTER_BALL: &str = "sv5-153";
pub const RADIANT_GRENINJA: &str = "swsh10-46";
pub const RADIANT_CHARIZARD: &str = "pgo-11";
pub const NEST_BALL: &str = "sv1-181";

fn set(id: &str, name: &str, code: &str) -> serde_json::Value {
    json!({ "id": id, "name": name, "ptcgoCode": code })
}

fn priced(url: Option<&str>, prices: serde_json::Value) -> serde_json::Value {
    json!({ "url": url, "prices": prices })
}

fn sample_cards() -> Vec<Card> {
    let cards = json!([
        {
            "id": SQUIRTLE, "name": "Squirtle", "supertype": "Pokémon",
            "subtypes": ["Basic"], "types": ["Water"], "number": "7", "rarity": "Common",
            "set": set("sv3pt5", "151", "MEW"),
            "tcgplayer": priced(Some("https://prices.example/sv3pt5-7"), json!({"normal": {"market": 0.2, "mid": 0.3}}))
        },
        {
            "id": RESEARCH_SVI, "name": "Professor's Research", "supertype": "Trainer",
            "subtypes": ["Supporter"], "number": "189", "rarity": "Rare",
            "set": set("sv1", "Scarlet & Violet", "SVI"),
            "tcgplayer": priced(Some("https://prices.example/sv1-189"), json!({"normal": {"market": 0.5}}))
        },
        {
            "id": RESEARCH_SSH, "name": "Professor's Research", "supertype": "Trainer",
            "subtypes": ["Supporter"], "number": "178", "rarity": "Rare Holo",
            "set": set("swsh1", "Sword & Shield", "SSH"),
            "tcgplayer": priced(None, json!({"holofoil": {"market": 0.75}}))
        },
        {
            "id": WATER_ENERGY, "name": "Water Energy", "supertype": "Energy",
            "subtypes": ["Basic"], "number": "3",
            "set": set("sve", "Scarlet & Violet Energies", "SVE"),
            "tcgplayer": priced(Some("https://prices.example/sve-3"), json!({"normal": {"market": 0.1}}))
        },
        {
            "id": PRIME_CATCHER, "name": "Prime Catcher", "supertype": "Trainer",
            "subtypes": ["Item", "ACE SPEC"], "number": "157", "rarity": "ACE SPEC Rare",
            "set": set("sv5", "Temporal Forces", "TEF"),
            "tcgplayer": priced(Some("https://prices.example/sv5-157"), json!({"normal": {"market": 3.0}}))
        },
        {
            "id": MASTER_BALL, "name": "Master Ball", "supertype": "Trainer",
            "subtypes": ["Item", "ACE SPEC"], "number": "153", "rarity": "ACE SPEC Rare",
            "set": set("sv5", "Temporal Forces", "TEF"),
            "tcgplayer": priced(Some("https://prices.example/sv5-153"), json!({"normal": {"market": 2.0}}))
        },
        {
            "id": RADIANT_GRENINJA, "name": "Radiant Greninja", "supertype": "Pokémon",
            "subtypes": ["Basic", "Radiant"], "types": ["Water"], "number": "46", "rarity": "Radiant Rare",
            "set": set("swsh10", "Astral Radiance", "ASR"),
            "tcgplayer": priced(Some("https://prices.example/swsh10-46"), json!({"holofoil": {"market": 1.5}}))
        },
        {
            "id": RADIANT_CHARIZARD, "name": "Radiant Charizard", "supertype": "Pokémon",
            "subtypes": ["Basic", "Radiant"], "types": ["Fire"], "number": "11", "rarity": "Radiant Rare",
            "set": set("pgo", "Pokémon GO", "PGO"),
            "tcgplayer": priced(Some("https://prices.example/pgo-11"), json!({"holofoil": {"market": 4.0}}))
        },
        {
            "id": NEST_BALL, "name": "Nest Ball", "supertype": "Trainer",
            "subtypes": ["Item"], "number": "181", "rarity": "Uncommon",
            "set": set("sv1", "Scarlet & Violet", "SVI"),
            "tcgplayer": priced(None, json!({"normal": {"mid": 2.5}}))
        }
    ]);
    serde_json::from_value(cards).unwrap()
}

pub fn catalog() -> Arc<CardCatalog> {
    Arc::new(CardCatalog::new(sample_cards()))
}

pub fn card(id: &str) -> Card {
    catalog().lookup(id).cloned().unwrap()
}

pub fn saved(id: &str, count: u32) -> SavedCard {
    let card = card(id);
    SavedCard {
        id: card.id.clone(),
        name: card.name.clone(),
        set: card.set.name.clone(),
        count,
        set_code: Some(card.set_code().to_string()),
        number: Some(card.number.clone()),
        supertype: Some(card.supertype),
    }
}

/// A `DeckBuilder` over an in-memory store with the sample catalog installed.
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn sdk() -> (DeckBuilder, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let sdk = DeckBuilder::builder()
        .cache_dir(tmp_dir.path())
        .offline(true)
        .build()
        .unwrap();
    sdk.install_catalog(catalog());
    (sdk, tmp_dir)
}

/// Register and verify a user, returning its id.
pub fn user(sdk: &DeckBuilder, username: &str) -> i64 {
    let registration = sdk
        .users()
        .register(username, &format!("{username}@example.com"), "$2b$hash")
        .unwrap();
    sdk.users()
        .verify_email(&registration.verification_token)
        .unwrap();
    registration.user_id
}

//! Plain-text decklists in the format other deck tools paste.
//!
//! ```text
//! Pokémon: 2
//! 2 Squirtle MEW 7
//!
//! Energy: 10
//! 10 Water Energy SVE 3
//! ```

use std::fmt::Write;

use crate::models::{SavedCard, Supertype};

use super::state::Deck;

const GROUPS: [Supertype; 3] = [Supertype::Pokemon, Supertype::Trainer, Supertype::Energy];

const MISSING: &str = "???";

struct Line<'a> {
    count: u32,
    name: &'a str,
    set_code: &'a str,
    number: &'a str,
    group: Supertype,
}

/// Decklist for a deck under construction. Entries whose supertype is not
/// one of the three groups are left out.
pub fn deck_to_text(deck: &Deck) -> String {
    let lines = deck.entries().iter().map(|e| Line {
        count: e.count,
        name: &e.name,
        set_code: non_empty(&e.set_code),
        number: non_empty(&e.number),
        group: e.supertype,
    });
    render(lines)
}

/// Decklist for a persisted card list. Lines without a supertype are
/// grouped under Trainer.
pub fn saved_cards_to_text(cards: &[SavedCard]) -> String {
    let lines = cards.iter().map(|c| Line {
        count: c.count,
        name: &c.name,
        set_code: c.set_code.as_deref().map_or(MISSING, non_empty),
        number: c.number.as_deref().map_or(MISSING, non_empty),
        group: match c.supertype {
            Some(Supertype::Pokemon) => Supertype::Pokemon,
            Some(Supertype::Energy) => Supertype::Energy,
            _ => Supertype::Trainer,
        },
    });
    render(lines)
}

fn non_empty(s: &str) -> &str {
    if s.is_empty() {
        MISSING
    } else {
        s
    }
}

fn render<'a>(lines: impl Iterator<Item = Line<'a>>) -> String {
    let lines: Vec<Line<'a>> = lines.collect();
    let mut out = String::new();
    for group in GROUPS {
        let members: Vec<&Line<'_>> = lines.iter().filter(|l| l.group == group).collect();
        if members.is_empty() {
            continue;
        }
        let total: u32 = members.iter().map(|l| l.count).sum();
        let _ = writeln!(out, "{}: {total}", group.label());
        for l in members {
            let _ = writeln!(out, "{} {} {} {}", l.count, l.name, l.set_code, l.number);
        }
        out.push('\n');
    }
    out.trim().to_string()
}

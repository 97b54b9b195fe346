//! Community listing: paging, sorting, search, votes and copies.

mod common;

use common::*;
use ptcg_deckbuilder::models::{DeckSaveRequest, VoteDirection, VoteTally};
use ptcg_deckbuilder::queries::{CommunitySort, ListParams};
use ptcg_deckbuilder::{DeckBuilder, DeckError};

fn publish(sdk: &DeckBuilder, owner: i64, name: &str, cards: Vec<(&str, u32)>) -> i64 {
    let request = DeckSaveRequest {
        name: name.into(),
        cards: cards.into_iter().map(|(id, n)| saved(id, n)).collect(),
        is_public: true,
        publish: None,
    };
    sdk.decks().create(owner, request).unwrap().id
}

fn set_created(sdk: &DeckBuilder, id: i64, at: &str) {
    sdk.connection()
        .execute_update(
            "UPDATE decks SET created_at = ? WHERE id = ?",
            &[at.into(), id.into()],
        )
        .unwrap();
}

fn set_votes(sdk: &DeckBuilder, id: i64, up: i64, down: i64) {
    sdk.connection()
        .execute_update(
            "UPDATE decks SET upvotes = ?, downvotes = ? WHERE id = ?",
            &[up.into(), down.into(), id.into()],
        )
        .unwrap();
}

fn listed(sdk: &DeckBuilder, params: ListParams) -> Vec<i64> {
    sdk.community()
        .list(&params)
        .unwrap()
        .decks
        .into_iter()
        .map(|d| d.id)
        .collect()
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[test]
fn only_public_decks_are_listed() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    let public = publish(&sdk, owner, "Shown", vec![(SQUIRTLE, 1)]);
    sdk.decks()
        .create(
            owner,
            DeckSaveRequest {
                name: "Hidden".into(),
                cards: vec![saved(SQUIRTLE, 1)],
                ..Default::default()
            },
        )
        .unwrap();

    let page = sdk.community().list(&ListParams::default()).unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.decks[0].id, public);
    assert_eq!(page.decks[0].username, "misty");
}

#[test]
fn sorts_by_date_votes_and_price() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    let cheap = publish(&sdk, owner, "Cheap", vec![(SQUIRTLE, 1)]);
    let pricey = publish(&sdk, owner, "Pricey", vec![(RADIANT_CHARIZARD, 1)]);
    let middle = publish(&sdk, owner, "Middle", vec![(NEST_BALL, 1)]);

    set_created(&sdk, cheap, "2024-03-01T00:00:00.000000Z");
    set_created(&sdk, pricey, "2024-01-01T00:00:00.000000Z");
    set_created(&sdk, middle, "2024-02-01T00:00:00.000000Z");
    set_votes(&sdk, cheap, 1, 3);
    set_votes(&sdk, pricey, 5, 0);
    set_votes(&sdk, middle, 2, 2);

    let by = |sort| {
        listed(
            &sdk,
            ListParams {
                sort,
                ..Default::default()
            },
        )
    };
    assert_eq!(by(CommunitySort::Recent), [cheap, middle, pricey]);
    assert_eq!(by(CommunitySort::Oldest), [pricey, middle, cheap]);
    assert_eq!(by(CommunitySort::Votes), [pricey, middle, cheap]);
    assert_eq!(by(CommunitySort::LeastVotes), [cheap, middle, pricey]);
    assert_eq!(by(CommunitySort::Price), [cheap, middle, pricey]);
    assert_eq!(by(CommunitySort::Expensive), [pricey, middle, cheap]);
}

#[test]
fn pages_do_not_overlap() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    let ids: Vec<i64> = (0..5)
        .map(|i| publish(&sdk, owner, &format!("Deck {i}"), vec![(SQUIRTLE, 1)]))
        .collect();
    for id in &ids {
        set_created(&sdk, *id, "2024-01-01T00:00:00.000000Z");
    }

    let fetch = |page| {
        sdk.community()
            .list(&ListParams {
                page,
                per_page: 2,
                ..Default::default()
            })
            .unwrap()
    };
    let first = fetch(1);
    assert_eq!(first.total_count, 5);

    let mut seen: Vec<i64> = Vec::new();
    for n in 1..=3 {
        seen.extend(fetch(n).decks.into_iter().map(|d| d.id));
    }
    assert_eq!(seen, ids);
    assert!(fetch(4).decks.is_empty());
}

#[test]
fn search_matches_deck_name_substring() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    let lugia = publish(&sdk, owner, "Lugia VSTAR", vec![(SQUIRTLE, 1)]);
    publish(&sdk, owner, "Gardevoir ex", vec![(SQUIRTLE, 1)]);

    let page = sdk
        .community()
        .list(&ListParams {
            search: Some("lugia".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.decks[0].id, lugia);
}

#[test]
fn huge_page_numbers_return_an_empty_page() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    publish(&sdk, owner, "Water Box", vec![(SQUIRTLE, 1)]);

    let page = sdk
        .community()
        .list(&ListParams {
            page: usize::MAX,
            per_page: usize::MAX,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.total_count, 1);
    assert!(page.decks.is_empty());

    assert_eq!(sdk.community().list(&ListParams::default()).unwrap().decks.len(), 1);
}

#[test]
fn search_wildcards_match_literally() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    let sale = publish(&sdk, owner, "100% Water", vec![(SQUIRTLE, 1)]);
    publish(&sdk, owner, "1000 Water", vec![(SQUIRTLE, 1)]);
    let snake = publish(&sdk, owner, "water_box", vec![(SQUIRTLE, 1)]);
    publish(&sdk, owner, "waterXbox", vec![(SQUIRTLE, 1)]);

    let search = |text: &str| {
        listed(
            &sdk,
            ListParams {
                search: Some(text.into()),
                ..Default::default()
            },
        )
    };
    assert_eq!(search("0%"), [sale]);
    assert_eq!(search("r_b"), [snake]);
}

// ---------------------------------------------------------------------------
// vote
// ---------------------------------------------------------------------------

#[test]
fn repeat_vote_is_rejected_and_switch_moves_one_vote() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    let voter = user(&sdk, "ash");
    let deck = publish(&sdk, owner, "Water Box", vec![(SQUIRTLE, 1)]);

    let tally = sdk.community().vote(voter, deck, VoteDirection::Up).unwrap();
    assert_eq!(tally, VoteTally { upvotes: 1, downvotes: 0 });

    let err = sdk.community().vote(voter, deck, VoteDirection::Up).unwrap_err();
    assert!(matches!(err, DeckError::Conflict(_)));
    let unchanged = sdk.community().get(deck).unwrap().unwrap();
    assert_eq!((unchanged.upvotes, unchanged.downvotes), (1, 0));

    let switched = sdk.community().vote(voter, deck, VoteDirection::Down).unwrap();
    assert_eq!(switched, VoteTally { upvotes: 0, downvotes: 1 });
}

#[test]
fn votes_from_different_users_accumulate() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    let deck = publish(&sdk, owner, "Water Box", vec![(SQUIRTLE, 1)]);
    for name in ["ash", "brock", "gary"] {
        let voter = user(&sdk, name);
        sdk.community().vote(voter, deck, VoteDirection::from_upvote(name != "gary")).unwrap();
    }
    let listed = sdk.community().get(deck).unwrap().unwrap();
    assert_eq!((listed.upvotes, listed.downvotes), (2, 1));
    assert_eq!(listed.score(), 1);
}

#[test]
fn private_or_missing_decks_cannot_be_voted_on() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    let voter = user(&sdk, "ash");
    let private = sdk
        .decks()
        .create(
            owner,
            DeckSaveRequest {
                name: "Hidden".into(),
                cards: vec![saved(SQUIRTLE, 1)],
                ..Default::default()
            },
        )
        .unwrap();

    for id in [private.id, 4242] {
        assert!(matches!(
            sdk.community().vote(voter, id, VoteDirection::Up),
            Err(DeckError::NotFound(_))
        ));
    }
}

// ---------------------------------------------------------------------------
// copy
// ---------------------------------------------------------------------------

#[test]
fn copy_creates_private_deck_for_caller() {
    let (sdk, _tmp) = sdk();
    let owner = user(&sdk, "misty");
    let fan = user(&sdk, "ash");
    let source = publish(&sdk, owner, "Water Box", vec![(SQUIRTLE, 2), (NEST_BALL, 1)]);

    let copy = sdk.community().copy(fan, source).unwrap();
    assert_eq!(copy.user_id, fan);
    assert_eq!(copy.deck_name, "Water Box (Copy)");
    assert!(!copy.is_public);
    assert_eq!(copy.cards_price, 2.9);
    assert_eq!((copy.upvotes, copy.downvotes), (0, 0));

    let again = sdk.community().copy(fan, source).unwrap();
    assert_eq!(again.deck_name, "Water Box (Copy) (1)");
}

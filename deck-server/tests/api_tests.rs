/// API integration tests
/// Drives the full router against an in-memory store and a fixture catalog
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use deck_server::auth::AuthService;
use deck_server::error::Result as ApiResult;
use deck_server::mailer::Mailer;
use deck_server::AppState;
use ptcg_deckbuilder::{CardCatalog, DeckBuilder};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

const PASSWORD: &str = "Sup3r#Secret";

/// Captures verification links instead of sending them.
#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(String, String)>>,
}

impl Outbox {
    fn token_for(&self, email: &str) -> String {
        let sent = self.sent.lock().unwrap();
        let (_, link) = sent.iter().rev().find(|(to, _)| to == email).unwrap();
        link.split("token=").nth(1).unwrap().to_string()
    }
}

impl Mailer for Outbox {
    fn send_verification(&self, to: &str, _username: &str, link: &str) -> ApiResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), link.to_string()));
        Ok(())
    }
}

fn fixture_catalog() -> Arc<CardCatalog> {
    let cards = json!([
        {
            "id": "sv3pt5-7", "name": "Squirtle", "supertype": "Pokémon",
            "subtypes": ["Basic"], "number": "7", "rarity": "Common",
            "set": {"id": "sv3pt5", "name": "151", "ptcgoCode": "MEW"},
            "tcgplayer": {"prices": {"normal": {"market": 0.25}}}
        },
        {
            "id": "sv1-181", "name": "Nest Ball", "supertype": "Trainer",
            "subtypes": ["Item"], "number": "181", "rarity": "Uncommon",
            "set": {"id": "sv1", "name": "Scarlet & Violet", "ptcgoCode": "SVI"},
            "tcgplayer": {"prices": {"normal": {"mid": 2.5}}}
        },
        {
            "id": "sve-3", "name": "Water Energy", "supertype": "Energy",
            "subtypes": ["Basic"], "number": "3",
            "set": {"id": "sve", "name": "Scarlet & Violet Energies", "ptcgoCode": "SVE"},
            "tcgplayer": {"prices": {"normal": {"market": 0.1}}}
        }
    ]);
    Arc::new(CardCatalog::new(serde_json::from_value(cards).unwrap()))
}

struct TestApp {
    router: Router,
    outbox: Arc<Outbox>,
    _cache: TempDir,
}

async fn create_test_app() -> TestApp {
    let cache = TempDir::new().unwrap();
    let sdk = DeckBuilder::builder()
        .cache_dir(cache.path())
        .offline(true)
        .build_async()
        .await
        .unwrap();
    sdk.install_catalog(fixture_catalog()).await.unwrap();

    let outbox = Arc::new(Outbox::default());
    let state = Arc::new(AppState {
        sdk,
        auth: Arc::new(AuthService::new("test-secret-key".to_string(), 1).with_bcrypt_cost(4)),
        mailer: outbox.clone(),
        base_url: "http://deck.test".to_string(),
    });

    TestApp {
        router: deck_server::app(state),
        outbox,
        _cache: cache,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    async fn register(&self, username: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": PASSWORD,
            })),
        )
        .await
    }

    async fn login(&self, username: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": username, "password": PASSWORD })),
        )
        .await
    }

    /// Register, verify and log in. Returns `(token, user id)`.
    async fn signed_in(&self, username: &str) -> (String, i64) {
        let (status, _) = self.register(username).await;
        assert_eq!(status, StatusCode::CREATED);
        let token = self.outbox.token_for(&format!("{username}@example.com"));
        let (status, _) = self
            .send(Method::GET, &format!("/verify-email?token={token}"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.login(username).await;
        assert_eq!(status, StatusCode::OK);
        (
            body["token"].as_str().unwrap().to_string(),
            body["userId"].as_i64().unwrap(),
        )
    }

    async fn save_deck(&self, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, "/save-deck", Some(token), Some(body)).await
    }
}

fn water_box(public: bool) -> Value {
    json!({
        "deckName": "Water Box",
        "isPublic": public,
        "cards": [
            {"id": "sv3pt5-7", "name": "Squirtle", "set": "151", "count": 4},
            {"id": "sve-3", "name": "Water Energy", "set": "Scarlet & Violet Energies", "count": 8}
        ]
    })
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_register_verify_login_flow() {
    let app = create_test_app().await;

    let (status, body) = app.register("ash").await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["message"].as_str().unwrap().contains("verify"));

    let (status, body) = app.login("ash").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please verify your email before logging in.");

    let token = app.outbox.token_for("ash@example.com");
    assert_eq!(token.len(), 64);
    let (status, body) = app
        .send(Method::GET, &format!("/verify-email?token={token}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Email verified! You may now log in.");

    let (status, body) = app.login("ash@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ash");
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn test_register_validation() {
    let app = create_test_app().await;

    let (status, body) = app
        .send(Method::POST, "/register", None, Some(json!({ "username": "ash" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "All fields are required.");

    let (status, _) = app
        .send(
            Method::POST,
            "/register",
            None,
            Some(json!({ "username": "ash", "email": "ash@example.com", "password": "weak" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.register("ash").await.0, StatusCode::CREATED);
    let (status, body) = app.register("ash").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already"));
}

#[tokio::test]
async fn test_bad_verification_token() {
    let app = create_test_app().await;
    let (status, body) = app
        .send(Method::GET, "/verify-email?token=deadbeef", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired token.");
}

#[tokio::test]
async fn test_wrong_password() {
    let app = create_test_app().await;
    app.signed_in("ash").await;
    let (status, body) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "ash", "password": "Wr0ng#Password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid username or password.");
}

#[tokio::test]
async fn test_user_info_and_update() {
    let app = create_test_app().await;
    let (token, _) = app.signed_in("ash").await;

    let (status, body) = app.send(Method::GET, "/user-info", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "username": "ash", "email": "ash@example.com" }));

    let (status, body) = app
        .send(
            Method::PUT,
            "/update-user",
            Some(&token),
            Some(json!({ "field": "username", "value": "ketchum" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "ketchum");

    let (status, _) = app
        .send(
            Method::PUT,
            "/update-user",
            Some(&token),
            Some(json!({ "field": "password", "value": "N3w#Password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "ketchum", "password": "N3w#Password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::PUT,
            "/update-user",
            Some(&token),
            Some(json!({ "field": "is_verified", "value": "false" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = create_test_app().await;

    let (status, _) = app.send(Method::GET, "/load-decks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::GET, "/load-decks", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token.");
}

// ---------------------------------------------------------------------------
// Decks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_deck_lifecycle() {
    let app = create_test_app().await;
    let (token, user_id) = app.signed_in("misty").await;

    let (status, deck) = app.save_deck(&token, water_box(false)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(deck["deck_name"], "Water Box");
    assert_eq!(deck["user_id"], user_id);
    assert_eq!(deck["cards_price"], 1.0);
    let id = deck["id"].as_i64().unwrap();

    let (_, second) = app.save_deck(&token, water_box(false)).await;
    assert_eq!(second["deck_name"], "Water Box (1)");

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/save-deck/{id}"),
            Some(&token),
            Some(json!({
                "userId": user_id,
                "deckName": "Water Box",
                "isPublic": false,
                "cards": [{"id": "sv1-181", "name": "Nest Ball", "set": "Scarlet & Violet", "count": 2}],
                "description": "Budget list",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["cards_price"], 5.0);
    assert_eq!(updated["description"], "Budget list");

    let (status, body) = app.send(Method::GET, "/load-decks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decks"].as_array().unwrap().len(), 2);

    let (status, loaded) = app
        .send(Method::GET, &format!("/load-deck/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["cards"][0]["name"], "Nest Ball");

    let (status, _) = app
        .send(Method::DELETE, &format!("/delete-deck/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::GET, &format!("/load-deck/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_decks_are_private_to_their_owner() {
    let app = create_test_app().await;
    let (owner_token, owner_id) = app.signed_in("misty").await;
    let (other_token, _) = app.signed_in("gary").await;

    let (_, deck) = app.save_deck(&owner_token, water_box(false)).await;
    let id = deck["id"].as_i64().unwrap();

    let (status, _) = app
        .send(Method::GET, &format!("/load-deck/{id}"), Some(&other_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Claiming someone else's id in the body is refused outright.
    let mut body = water_box(false);
    body["userId"] = json!(owner_id);
    let (status, _) = app
        .send(Method::PUT, &format!("/save-deck/{id}"), Some(&other_token), Some(body))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::DELETE, &format!("/delete-deck/{id}"), Some(&other_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::GET, "/load-deck/9999", Some(&owner_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_deck_is_rejected() {
    let app = create_test_app().await;
    let (token, _) = app.signed_in("misty").await;
    let (status, _) = app
        .save_deck(&token, json!({ "deckName": "Nothing", "cards": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Community
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_public_listing_votes_and_copies() {
    let app = create_test_app().await;
    let (owner_token, _) = app.signed_in("misty").await;
    let (fan_token, fan_id) = app.signed_in("ash").await;

    let (_, deck) = app.save_deck(&owner_token, water_box(true)).await;
    let id = deck["id"].as_i64().unwrap();
    app.save_deck(&owner_token, water_box(false)).await;

    let (status, page) = app
        .send(
            Method::GET,
            "/public-decks?sort=sideways&page=1&perPage=5",
            Some(&fan_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalCount"], 1);
    assert_eq!(page["decks"][0]["username"], "misty");

    let vote = |upvote: bool| json!({ "upvote": upvote });
    let uri = format!("/vote-deck/{id}");

    let (status, tally) = app.send(Method::POST, &uri, Some(&fan_token), Some(vote(true))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally, json!({ "upvotes": 1, "downvotes": 0 }));

    let (status, _) = app.send(Method::POST, &uri, Some(&fan_token), Some(vote(true))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, tally) = app.send(Method::POST, &uri, Some(&fan_token), Some(vote(false))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally, json!({ "upvotes": 0, "downvotes": 1 }));

    let (status, copy) = app
        .send(Method::POST, &format!("/copy-deck/{id}"), Some(&fan_token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(copy["user_id"], fan_id);
    assert_eq!(copy["deck_name"], "Water Box (Copy)");
    assert_eq!(copy["is_public"], false);
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cards"], 3);
}

#[tokio::test]
async fn test_huge_page_number_keeps_server_usable() {
    let app = create_test_app().await;
    let (token, _) = app.signed_in("misty").await;
    app.save_deck(&token, water_box(true)).await;

    let (status, page) = app
        .send(
            Method::GET,
            "/public-decks?page=18446744073709551615&perPage=18446744073709551615",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalCount"], 1);
    assert_eq!(page["decks"], json!([]));

    let (status, page) = app
        .send(Method::GET, "/public-decks", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["decks"].as_array().unwrap().len(), 1);
}

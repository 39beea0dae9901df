use async_trait::async_trait;
use auction_listings::error::AuctionError;
use auction_listings::handlers::{self, AppState};
use auction_listings::identity::{
    IdentityStore, InMemoryIdentityStore, SharedIdentityStore, UserRef,
};
use auction_listings::store::InMemoryStore;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

const OWNER: &str = "owner-token";
const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";

/// Tracing setup shared by every test in this binary
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Session lookup that always fails, like a session table that is down
struct UnavailableIdentityStore;

#[async_trait]
impl IdentityStore for UnavailableIdentityStore {
    async fn current_user(&self, _session: &str) -> Result<Option<UserRef>, AuctionError> {
        Err(AuctionError::Internal("session table unavailable".to_string()))
    }
}

/// Boots the router on an ephemeral port with in-memory stores
async fn spawn_app() -> String {
    let identity = InMemoryIdentityStore::new();
    identity.insert_session(OWNER, UserRef(1)).unwrap();
    identity.insert_session(ALICE, UserRef(2)).unwrap();
    identity.insert_session(BOB, UserRef(3)).unwrap();

    spawn_app_with(Arc::new(identity)).await
}

async fn spawn_app_with(identity: SharedIdentityStore) -> String {
    init_tracing();

    let state = AppState::new(InMemoryStore::new_shared(), identity);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, handlers::routes(state).into_make_service())
            .await
            .unwrap();
    });

    format!("http://{addr}")
}

async fn create_listing(client: &Client, base: &str, title: &str, category: &str) -> i64 {
    let response = client
        .post(format!("{base}/listings"))
        .bearer_auth(OWNER)
        .json(&json!({
            "title": title,
            "description": "integration test listing",
            "starting_price": "10.00",
            "category": category,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let listing: Value = response.json().await.unwrap();
    listing["id"].as_i64().unwrap()
}

async fn bid(client: &Client, base: &str, token: &str, id: i64, amount: &str) -> (StatusCode, Value) {
    let response = client
        .post(format!("{base}/listings/{id}/bids"))
        .bearer_auth(token)
        .json(&json!({ "amount": amount }))
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

/// Bid, close and winner resolution
#[tokio::test]
async fn test_auction_lifecycle() {
    let base = spawn_app().await;
    let client = Client::new();
    let id = create_listing(&client, &base, "Painting", "Art").await;

    let (status, _) = bid(&client, &base, ALICE, id, "15.00").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = bid(&client, &base, BOB, id, "15.00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "LOW_BID");
    assert_eq!(body["current_price"], "15.00");

    let (status, body) = bid(&client, &base, BOB, id, "20.00").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["current_price"], "20.00");

    let response = client
        .get(format!("{base}/listings/{id}/winner"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .post(format!("{base}/listings/{id}/close"))
        .bearer_auth(ALICE)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post(format!("{base}/listings/{id}/close"))
        .bearer_auth(OWNER)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let closed: Value = response.json().await.unwrap();
    assert_eq!(closed["listing"]["active"], false);
    assert_eq!(closed["outcome"]["outcome"], "winner");

    let (status, body) = bid(&client, &base, ALICE, id, "100.00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_ENDED");

    let winner: Value = client
        .get(format!("{base}/listings/{id}/winner"))
        .bearer_auth(BOB)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(winner["result"]["outcome"], "winner");
    assert_eq!(winner["result"]["user"], 3);
    assert_eq!(winner["result"]["amount"], "20.00");
    assert_eq!(winner["you_won"], true);

    let detail: Value = client
        .get(format!("{base}/listings/{id}"))
        .bearer_auth(ALICE)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["bid_count"], 2);
    assert_eq!(detail["current_price"], "20.00");
    assert_eq!(detail["you_won"], false);
}

#[tokio::test]
async fn test_authentication_and_not_found() {
    let base = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("{base}/listings"))
        .json(&json!({ "title": "Lamp", "starting_price": "1.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "AUTH_REQUIRED");

    let response = client
        .get(format!("{base}/watchlist"))
        .bearer_auth("stale-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{base}/listings/404"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (status, body) = bid(&client, &base, ALICE, 404, "5.00").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_identity_failure_is_not_anonymous() {
    let base = spawn_app_with(Arc::new(UnavailableIdentityStore)).await;
    let client = Client::new();

    let response = client
        .get(format!("{base}/listings/1"))
        .bearer_auth(ALICE)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INTERNAL");
    assert_eq!(body["error"], "internal server error");

    let response = client
        .get(format!("{base}/listings/1/winner"))
        .bearer_auth(ALICE)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Without a token the lookup is skipped and the request stays anonymous.
    let response = client
        .get(format!("{base}/listings/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_watchlist() {
    let base = spawn_app().await;
    let client = Client::new();
    let id = create_listing(&client, &base, "Clock", "Home").await;

    for expected in ["Added to watchlist", "Already added to watchlist"] {
        let body: Value = client
            .post(format!("{base}/watchlist"))
            .bearer_auth(ALICE)
            .json(&json!({ "listing_id": id }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["message"], expected);
    }

    let watched: Vec<Value> = client
        .get(format!("{base}/watchlist"))
        .bearer_auth(ALICE)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(watched.len(), 1);
    assert_eq!(watched[0]["id"], id);

    for _ in 0..2 {
        let response = client
            .delete(format!("{base}/watchlist/{id}"))
            .bearer_auth(ALICE)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let watched: Vec<Value> = client
        .get(format!("{base}/watchlist"))
        .bearer_auth(ALICE)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(watched.is_empty());
}

#[tokio::test]
async fn test_comments_and_categories() {
    let base = spawn_app().await;
    let client = Client::new();
    let id = create_listing(&client, &base, "Guitar", "Music").await;
    create_listing(&client, &base, "Kettle", "Home").await;

    for text in ["Is it tuned?", "Yes"] {
        let response = client
            .post(format!("{base}/listings/{id}/comments"))
            .bearer_auth(BOB)
            .json(&json!({ "text": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let comments: Vec<Value> = client
        .get(format!("{base}/listings/{id}/comments"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["text"], "Is it tuned?");
    assert_eq!(comments[1]["author"], 3);

    let categories: Vec<String> = client
        .get(format!("{base}/categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(categories, vec!["Home", "Music"]);

    let music: Vec<Value> = client
        .get(format!("{base}/categories/Music"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(music.len(), 1);
    assert_eq!(music[0]["current_price"], "10.00");
}

#[tokio::test]
async fn test_update_and_cascade_delete() {
    let base = spawn_app().await;
    let client = Client::new();
    let id = create_listing(&client, &base, "Desk", "Home").await;

    let response = client
        .patch(format!("{base}/listings/{id}"))
        .bearer_auth(OWNER)
        .json(&json!({ "title": "Oak desk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["title"], "Oak desk");

    bid(&client, &base, ALICE, id, "12.00").await;
    let response = client
        .patch(format!("{base}/listings/{id}"))
        .bearer_auth(OWNER)
        .json(&json!({ "starting_price": "1.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    client
        .post(format!("{base}/watchlist"))
        .bearer_auth(ALICE)
        .json(&json!({ "listing_id": id }))
        .send()
        .await
        .unwrap();

    let response = client
        .delete(format!("{base}/listings/{id}"))
        .bearer_auth(ALICE)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .delete(format!("{base}/listings/{id}"))
        .bearer_auth(OWNER)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{base}/listings/{id}/bids"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let watched: Vec<Value> = client
        .get(format!("{base}/watchlist"))
        .bearer_auth(ALICE)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(watched.is_empty());
}

/// Concurrent bidding
#[tokio::test]
async fn test_concurrent_bidding() {
    let base = spawn_app().await;
    let client = Client::new();
    let id = create_listing(&client, &base, "Bike", "Sport").await;

    let mut handles = vec![];
    for i in 1..=50 {
        let client = client.clone();
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            bid(&client, &base, ALICE, id, &format!("{}.00", 10 + i)).await
        }));
    }

    let mut successful_bids = 0;
    let mut failed_bids = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == StatusCode::CREATED {
            successful_bids += 1;
        } else {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code"], "LOW_BID");
            failed_bids += 1;
        }
    }
    info!(
        "successful bids: {}, failed bids: {}",
        successful_bids, failed_bids
    );

    let history: Value = client
        .get(format!("{base}/listings/{id}/bids"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["current_price"], "60.00");

    let amounts: Vec<rust_decimal::Decimal> = history["bids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|bid| bid["amount"].as_str().unwrap().parse().unwrap())
        .collect();
    assert_eq!(amounts.len(), successful_bids);
    assert!(amounts.windows(2).all(|w| w[0] < w[1]));
}

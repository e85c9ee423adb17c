//! Memo endpoint tests.

mod helpers;

use axum::http::StatusCode;
use helpers::client;
use serde_json::{Value, json};

const ALICE: &str = "alice@example.com";
const BOB: &str = "bob@example.com";
const CAROL: &str = "carol@example.com";

fn direct(to: &str) -> Value {
    json!({ "to": to, "subject": "lunch", "message": "noon?" })
}

// === Send ===

#[tokio::test]
async fn send_memo_returns_201_with_id() {
    let response = client()
        .post_json(Some(ALICE), "/api/memos", direct(BOB))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(body["status"], "sent");
    assert_eq!(body["message"], "Memo sent successfully");
}

#[tokio::test]
async fn send_memo_without_identity_is_400() {
    client()
        .post_json(None, "/api/memos", direct(BOB))
        .await
        .assert_error(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_memo_without_recipient_is_400() {
    let body = client()
        .post_json(Some(ALICE), "/api/memos", json!({ "subject": "s", "message": "m" }))
        .await
        .assert_error(StatusCode::BAD_REQUEST);

    assert!(body["message"].as_str().unwrap().contains("'to'"));
}

#[tokio::test]
async fn send_memo_with_blank_subject_or_message_is_400() {
    let client = client();

    for (field, body) in [
        ("subject", json!({ "to": BOB, "message": "noon?" })),
        ("subject", json!({ "to": BOB, "subject": "  ", "message": "noon?" })),
        ("message", json!({ "to": BOB, "subject": "lunch" })),
        ("message", json!({ "to": BOB, "subject": "lunch", "message": "" })),
    ] {
        let error = client
            .post_json(Some(ALICE), "/api/memos", body)
            .await
            .assert_error(StatusCode::BAD_REQUEST);
        assert!(error["message"].as_str().unwrap().contains(field));
    }

    let sent: Vec<Value> = client.get_as(ALICE, "/api/memos/sent").await.json();
    assert!(sent.is_empty());
}

#[tokio::test]
async fn send_memo_rejects_ttl_out_of_range() {
    let client = client();

    for ttl in [0, -3, 366] {
        let mut memo = direct(BOB);
        memo["ttlDays"] = json!(ttl);

        let body = client
            .post_json(Some(ALICE), "/api/memos", memo)
            .await
            .assert_error(StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("ttlDays"));
    }
}

#[tokio::test]
async fn send_memo_with_malformed_json_is_400() {
    let client = client();
    let response = client
        .post_json(Some(ALICE), "/api/memos", json!("not an object"))
        .await;

    response.assert_error(StatusCode::BAD_REQUEST);
}

// === Read ===

#[tokio::test]
async fn get_memo_by_id() {
    let client = client();
    let mut memo = direct(BOB);
    memo["ttlDays"] = json!(3);
    let id = client.send_memo(ALICE, memo).await;

    let response = client.get(&format!("/api/memos/{}", id)).await;
    response.assert_status(StatusCode::OK);

    let memo: Value = response.json();
    assert_eq!(memo["id"], id.as_str());
    assert_eq!(memo["from"], ALICE);
    assert_eq!(memo["to"], BOB);
    assert_eq!(memo["status"], "sent");
    assert_eq!(memo["isBroadcast"], false);
    assert_eq!(memo["ttlDays"], 3);
    assert!(memo["createdAt"].is_string());
    assert!(memo.get("deliveredAt").is_none());
}

#[tokio::test]
async fn get_unknown_memo_is_404() {
    client()
        .get("/api/memos/does-not-exist")
        .await
        .assert_error(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sent_and_received_lists() {
    let client = client();
    let id = client.send_memo(ALICE, direct(BOB)).await;

    let sent: Vec<Value> = client.get_as(ALICE, "/api/memos/sent").await.json();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["id"], id.as_str());

    let received: Vec<Value> = client.get_as(BOB, "/api/memos/received").await.json();
    assert_eq!(received.len(), 1);

    let unrelated: Vec<Value> = client.get_as(CAROL, "/api/memos/received").await.json();
    assert!(unrelated.is_empty());
}

#[tokio::test]
async fn list_without_identity_is_400() {
    client()
        .get("/api/memos/received")
        .await
        .assert_error(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lists_are_paginated_newest_first() {
    let client = client();
    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(client.send_memo(ALICE, direct(BOB)).await);
        // Distinct created_at values.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let page: Vec<Value> = client
        .get_as(ALICE, "/api/memos/sent?limit=2&offset=1")
        .await
        .json();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["id"], ids[3].as_str());
    assert_eq!(page[1]["id"], ids[2].as_str());

    // Invalid values fall back to limit=20, offset=0.
    let page: Vec<Value> = client
        .get_as(ALICE, "/api/memos/sent?limit=500&offset=-1")
        .await
        .json();
    assert_eq!(page.len(), 5);

    let page: Vec<Value> = client
        .get_as(ALICE, "/api/memos/sent?limit=abc")
        .await
        .json();
    assert_eq!(page.len(), 5);
}

// === Broadcast ===

#[tokio::test]
async fn broadcast_reaches_everyone() {
    let client = client();
    let id = client
        .send_memo(
            ALICE,
            json!({ "subject": "all hands", "message": "3pm", "isBroadcast": true }),
        )
        .await;

    for user in [BOB, CAROL, "someone-new@example.com"] {
        let received: Vec<Value> = client.get_as(user, "/api/memos/received").await.json();
        assert_eq!(received.len(), 1, "broadcast missing for {}", user);
        assert_eq!(received[0]["id"], id.as_str());
        assert_eq!(received[0]["to"], "broadcast");
    }
}

#[tokio::test]
async fn sentinel_recipient_is_a_broadcast() {
    let client = client();
    let id = client.send_memo(ALICE, direct("broadcast")).await;

    let memo: Value = client.get(&format!("/api/memos/{}", id)).await.json();
    assert_eq!(memo["isBroadcast"], true);
}

// === Status ===

#[tokio::test]
async fn mark_delivered_removes_from_inbox() {
    let client = client();
    let id = client.send_memo(ALICE, direct(BOB)).await;
    let uri = format!("/api/memos/{}/status", id);

    // Prime the cached inbox.
    let before: Vec<Value> = client.get_as(BOB, "/api/memos/received").await.json();
    assert_eq!(before.len(), 1);

    client
        .put_json(&uri, json!({ "status": "delivered" }))
        .await
        .assert_status(StatusCode::OK);

    let after: Vec<Value> = client.get_as(BOB, "/api/memos/received").await.json();
    assert!(after.is_empty());

    let memo: Value = client.get(&format!("/api/memos/{}", id)).await.json();
    assert_eq!(memo["status"], "delivered");
    assert!(memo["deliveredAt"].is_string());
}

#[tokio::test]
async fn mark_delivered_twice_is_404() {
    let client = client();
    let id = client.send_memo(ALICE, direct(BOB)).await;
    let uri = format!("/api/memos/{}/status", id);

    client
        .put_json(&uri, json!({ "status": "delivered" }))
        .await
        .assert_status(StatusCode::OK);
    client
        .put_json(&uri, json!({ "status": "delivered" }))
        .await
        .assert_error(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_back_to_sent_is_400() {
    let client = client();
    let id = client.send_memo(ALICE, direct(BOB)).await;

    client
        .put_json(&format!("/api/memos/{}/status", id), json!({ "status": "sent" }))
        .await
        .assert_error(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_status_value_is_400() {
    let client = client();
    let id = client.send_memo(ALICE, direct(BOB)).await;
    let uri = format!("/api/memos/{}/status", id);

    client
        .put_json(&uri, json!({ "status": "archived" }))
        .await
        .assert_error(StatusCode::BAD_REQUEST);
    client
        .put_raw(&uri, "{")
        .await
        .assert_error(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_of_unknown_memo_is_404() {
    client()
        .put_json("/api/memos/nope/status", json!({ "status": "delivered" }))
        .await
        .assert_error(StatusCode::NOT_FOUND);
}

// === Delete ===

#[tokio::test]
async fn delete_memo_then_404() {
    let client = client();
    let id = client.send_memo(ALICE, direct(BOB)).await;
    let uri = format!("/api/memos/{}", id);

    // Cache it first.
    client.get(&uri).await.assert_status(StatusCode::OK);

    let response = client.delete(&uri).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["message"], "Memo deleted successfully");

    client.get(&uri).await.assert_error(StatusCode::NOT_FOUND);
    client.delete(&uri).await.assert_error(StatusCode::NOT_FOUND);

    let sent: Vec<Value> = client.get_as(ALICE, "/api/memos/sent").await.json();
    assert!(sent.is_empty());
}

// === Users ===

#[tokio::test]
async fn users_lists_participants_sorted() {
    let client = client();
    client.send_memo(CAROL, direct(ALICE)).await;
    client.send_memo(BOB, direct("broadcast")).await;

    let users: Vec<String> = client.get("/api/users").await.json();
    assert_eq!(users, vec![ALICE, BOB, CAROL]);
}

#[tokio::test]
async fn users_empty_initially() {
    let users: Vec<String> = client().get("/api/users").await.json();
    assert!(users.is_empty());
}

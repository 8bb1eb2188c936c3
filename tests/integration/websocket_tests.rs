#[path = "../common/helpers.rs"]
mod helpers;

use serde_json::json;
use tokio_tungstenite::tungstenite;

use dashboard_relay::auth::AccountDirectory;

use helpers::{TestClient, start_server, user};

#[tokio::test]
async fn test_chat_reaches_both_parties_with_same_metadata() {
    let server = start_server().await;
    let (addr, store) = (server.addr, server.store.clone());
    let alice = user("alice");
    let bob = user("bob");

    let mut a = TestClient::connect(addr, &alice.token).await.unwrap();
    let mut b = TestClient::connect(addr, &bob.token).await.unwrap();
    a.wait_for_roster(&[alice.id, bob.id]).await;
    b.wait_for_roster(&[alice.id, bob.id]).await;

    a.send_json(json!({
        "type": "chat",
        "receiver_id": bob.id,
        "content": "hello bob",
    }))
    .await;

    let to_bob = b.next_of_type("chat").await;
    let echo = a.next_of_type("chat").await;

    assert_eq!(to_bob["content"], "hello bob");
    assert_eq!(to_bob["sender_id"], alice.id.to_string());
    assert_eq!(to_bob["receiver_id"], bob.id.to_string());
    assert_eq!(to_bob["sender"]["username"], "alice");
    assert_eq!(to_bob["id"], echo["id"]);
    assert_eq!(to_bob["created_at"], echo["created_at"]);

    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_client_supplied_sender_is_ignored() {
    let addr = start_server().await.addr;
    let alice = user("alice");
    let bob = user("bob");

    let mut a = TestClient::connect(addr, &alice.token).await.unwrap();
    let mut b = TestClient::connect(addr, &bob.token).await.unwrap();
    a.wait_for_roster(&[alice.id, bob.id]).await;
    b.wait_for_roster(&[alice.id, bob.id]).await;

    a.send_json(json!({
        "type": "chat",
        "sender_id": bob.id,
        "receiver_id": bob.id,
        "content": "spoofed",
    }))
    .await;

    let frame = b.next_of_type("chat").await;
    assert_eq!(frame["sender_id"], alice.id.to_string());
}

#[tokio::test]
async fn test_typing_is_relayed_but_not_stored() {
    let server = start_server().await;
    let (addr, store) = (server.addr, server.store.clone());
    let alice = user("alice");
    let bob = user("bob");

    let mut a = TestClient::connect(addr, &alice.token).await.unwrap();
    let mut b = TestClient::connect(addr, &bob.token).await.unwrap();
    a.wait_for_roster(&[alice.id, bob.id]).await;
    b.wait_for_roster(&[alice.id, bob.id]).await;

    a.send_json(json!({ "type": "typing", "receiver_id": bob.id })).await;
    let typing = b.next_of_type("typing").await;
    assert_eq!(typing["username"], "alice");
    assert_eq!(typing["sender_id"], alice.id.to_string());

    a.send_json(json!({ "type": "typing_stop", "receiver_id": bob.id }))
        .await;
    b.next_of_type("typing_stop").await;

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_disconnect_updates_presence() {
    let addr = start_server().await.addr;
    let alice = user("alice");
    let bob = user("bob");

    let mut a = TestClient::connect(addr, &alice.token).await.unwrap();
    let mut b = TestClient::connect(addr, &bob.token).await.unwrap();
    a.wait_for_roster(&[alice.id, bob.id]).await;
    b.wait_for_roster(&[alice.id, bob.id]).await;

    a.close().await;

    let frame = b.wait_for_roster(&[bob.id]).await;
    assert_eq!(frame["users"][0]["username"], "bob");
}

#[tokio::test]
async fn test_second_session_of_same_user_listed_once() {
    let addr = start_server().await.addr;
    let alice = user("alice");

    let mut first = TestClient::connect(addr, &alice.token).await.unwrap();
    first.wait_for_roster(&[alice.id]).await;

    let _second = TestClient::connect_with_header(addr, &alice.token)
        .await
        .unwrap();
    let frame = first.wait_for_roster(&[alice.id]).await;
    assert_eq!(frame["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upgrade_without_token_is_rejected() {
    let addr = start_server().await.addr;

    let err = TestClient::connect(addr, "").await.err().unwrap();
    match err {
        tungstenite::Error::Http(response) => assert_eq!(response.status(), 401),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_upgrade_with_forged_token_is_rejected() {
    let addr = start_server().await.addr;

    let forged = dashboard_relay::auth::jwt::issue_token(
        b"wrong-secret",
        uuid::Uuid::new_v4(),
        "mallory",
        "admin",
        chrono::Duration::hours(1),
    )
    .unwrap();

    let result = TestClient::connect(addr, &forged).await;
    assert!(matches!(result, Err(tungstenite::Error::Http(_))));
}

#[tokio::test]
async fn test_bearer_header_is_accepted_on_chat_path() {
    let addr = start_server().await.addr;
    let alice = user("alice");

    let mut client = TestClient::connect_with_header(addr, &alice.token)
        .await
        .unwrap();
    let frame = client.wait_for_roster(&[alice.id]).await;
    assert_eq!(frame["users"][0]["username"], "alice");
}

#[tokio::test]
async fn test_admin_disconnect_closes_socket_and_updates_presence() {
    let server = start_server().await;
    let alice = user("alice");
    let bob = user("bob");

    let mut a = TestClient::connect(server.addr, &alice.token).await.unwrap();
    let mut b = TestClient::connect(server.addr, &bob.token).await.unwrap();
    a.wait_for_roster(&[alice.id, bob.id]).await;
    b.wait_for_roster(&[alice.id, bob.id]).await;

    let alice_conn = server
        .hub
        .connections()
        .await
        .into_iter()
        .find(|c| c.user_id == alice.id)
        .unwrap()
        .id;
    assert!(server.hub.disconnect(alice_conn).await);

    a.expect_close().await;
    b.wait_for_roster(&[bob.id]).await;

    let remaining = server.hub.connections().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, bob.id);
}

#[tokio::test]
async fn test_inactive_account_is_refused_before_upgrade() {
    let server = start_server().await;
    let alice = user("alice");
    server.accounts.set_active(alice.id, false).await;

    let err = TestClient::connect(server.addr, &alice.token)
        .await
        .err()
        .unwrap();
    match err {
        tungstenite::Error::Http(response) => assert_eq!(response.status(), 401),
        other => panic!("unexpected error: {other}"),
    }
    assert!(server.hub.connections().await.is_empty());
}

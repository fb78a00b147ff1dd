//! Registry and fan-out behaviour of the real-time hub, without sockets.

use assert_matches::assert_matches;
use axum::extract::ws::Message;
use pulseboard_api::ws::{ConnectionState, HubError, HubUser, RealtimeHub, ServerMessage};
use pulseboard_core::roles::Role;
use tokio::sync::mpsc::UnboundedReceiver;

fn user(id: i64) -> HubUser {
    HubUser {
        id,
        email: format!("user{id}@example.com"),
        role: Role::User,
    }
}

/// Pop the next queued frame and decode it as JSON.
fn next_json(rx: &mut UnboundedReceiver<Message>) -> serde_json::Value {
    match rx.try_recv() {
        Ok(Message::Text(text)) => serde_json::from_str(text.as_str()).expect("frame should be JSON"),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn broadcast_skips_unauthenticated_connections() {
    let hub = RealtimeHub::new();
    let mut anon = hub.register("anon".into()).await;
    let mut authed = hub.register("authed".into()).await;
    hub.authenticate("authed", user(1)).await.unwrap();

    let delivered = hub.broadcast(&ServerMessage::Pong).await;

    assert_eq!(delivered, 1);
    assert!(anon.try_recv().is_err());
    let frame = next_json(&mut authed);
    assert_eq!(frame["type"], "pong");
    assert!(frame["timestamp"].is_string());
}

#[tokio::test]
async fn state_machine_transitions() {
    let hub = RealtimeHub::new();
    let _rx = hub.register("c1".into()).await;
    assert_eq!(hub.state("c1").await, Some(ConnectionState::Connected));

    assert_eq!(
        hub.subscribe("c1", None).await,
        Err(HubError::NotAuthenticated)
    );

    hub.authenticate("c1", user(7)).await.unwrap();
    assert_eq!(hub.state("c1").await, Some(ConnectionState::Authenticated));
    assert_eq!(hub.user_id("c1").await, Some(7));

    let channels = hub.subscribe("c1", None).await.unwrap();
    assert_eq!(channels, vec!["metrics", "alerts", "audit"]);
    assert_eq!(hub.state("c1").await, Some(ConnectionState::Subscribed));

    // Re-authenticating keeps the subscription.
    hub.authenticate("c1", user(8)).await.unwrap();
    assert_eq!(hub.state("c1").await, Some(ConnectionState::Subscribed));
    assert_eq!(hub.user_id("c1").await, Some(8));
    assert_eq!(hub.channels("c1").await.len(), 3);

    hub.remove("c1").await;
    assert_eq!(hub.state("c1").await, None);
    assert_eq!(hub.connection_count().await, 0);
}

#[tokio::test]
async fn explicit_channels_are_recorded() {
    let hub = RealtimeHub::new();
    let _rx = hub.register("c1".into()).await;
    hub.authenticate("c1", user(1)).await.unwrap();

    let channels = hub
        .subscribe("c1", Some(vec!["metrics".to_string()]))
        .await
        .unwrap();
    assert_eq!(channels, vec!["metrics"]);
    assert_eq!(hub.channels("c1").await, vec!["metrics"]);
}

#[tokio::test]
async fn unknown_connection_is_reported() {
    let hub = RealtimeHub::new();
    assert_matches!(
        hub.authenticate("ghost", user(1)).await,
        Err(HubError::UnknownConnection)
    );
    assert!(!hub.send_to("ghost", &ServerMessage::Pong).await);
}

#[tokio::test]
async fn broadcast_to_users_filters_by_id() {
    let hub = RealtimeHub::new();
    let mut a = hub.register("a".into()).await;
    let mut b = hub.register("b".into()).await;
    let mut c = hub.register("c".into()).await;
    hub.authenticate("a", user(1)).await.unwrap();
    hub.authenticate("b", user(2)).await.unwrap();
    hub.authenticate("c", user(1)).await.unwrap();

    let delivered = hub
        .broadcast_to_users(&[1], &ServerMessage::error("only for one"))
        .await;

    assert_eq!(delivered, 2);
    assert_eq!(next_json(&mut a)["message"], "only for one");
    assert_eq!(next_json(&mut c)["type"], "error");
    assert!(b.try_recv().is_err());
}

#[tokio::test]
async fn broadcast_to_roles_filters_by_role() {
    let hub = RealtimeHub::new();
    let mut member = hub.register("member".into()).await;
    let mut admin = hub.register("admin".into()).await;
    let mut root = hub.register("root".into()).await;
    let mut anon = hub.register("anon".into()).await;
    hub.authenticate("member", user(1)).await.unwrap();
    hub.authenticate("admin", HubUser { role: Role::Admin, ..user(2) }).await.unwrap();
    hub.authenticate("root", HubUser { role: Role::SuperAdmin, ..user(3) }).await.unwrap();

    let delivered = hub
        .broadcast_to_roles(&[Role::Admin, Role::SuperAdmin], &ServerMessage::Pong)
        .await;

    assert_eq!(delivered, 2);
    assert_eq!(next_json(&mut admin)["type"], "pong");
    assert_eq!(next_json(&mut root)["type"], "pong");
    assert!(member.try_recv().is_err());
    assert!(anon.try_recv().is_err());
}

#[tokio::test]
async fn send_to_reaches_unauthenticated_connection() {
    let hub = RealtimeHub::new();
    let mut rx = hub.register("c1".into()).await;

    assert!(hub.send_to("c1", &ServerMessage::error("Token required")).await);
    let frame = next_json(&mut rx);
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["message"], "Token required");
}

#[tokio::test]
async fn closed_receivers_are_pruned_on_broadcast() {
    let hub = RealtimeHub::new();
    let rx = hub.register("dead".into()).await;
    let mut live = hub.register("live".into()).await;
    hub.authenticate("dead", user(1)).await.unwrap();
    hub.authenticate("live", user(2)).await.unwrap();
    drop(rx);

    let delivered = hub.broadcast(&ServerMessage::Pong).await;

    assert_eq!(delivered, 1);
    assert_eq!(hub.connection_count().await, 1);
    assert_eq!(next_json(&mut live)["type"], "pong");
}

#[tokio::test]
async fn per_connection_order_is_preserved() {
    let hub = RealtimeHub::new();
    let mut rx = hub.register("c1".into()).await;
    hub.authenticate("c1", user(1)).await.unwrap();

    for i in 0..5 {
        hub.broadcast(&ServerMessage::error(format!("msg-{i}"))).await;
    }
    for i in 0..5 {
        assert_eq!(next_json(&mut rx)["message"], format!("msg-{i}"));
    }
}

#[tokio::test]
async fn shutdown_closes_everything() {
    let hub = RealtimeHub::new();
    let mut a = hub.register("a".into()).await;
    let mut b = hub.register("b".into()).await;
    hub.authenticate("a", user(1)).await.unwrap();
    assert_eq!(hub.authenticated_count().await, 1);

    hub.shutdown().await;

    assert_eq!(hub.connection_count().await, 0);
    assert_matches!(a.try_recv(), Ok(Message::Close(None)));
    assert_matches!(b.try_recv(), Ok(Message::Close(None)));
}

//! End-to-end tests for the login flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use shared_map::{Error, LoginClient, LoginState};

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn login_resolves_on_server_acknowledgment() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        let text = msg.into_text().unwrap();
        let mut fields = text.as_str().splitn(3, ':');
        assert_eq!(fields.next(), Some("lreq"));
        let id = fields.next().unwrap().to_owned();
        assert_eq!(fields.next(), Some("alice"));

        ws.send(Message::Text(format!("lres:{}:welcome", id).into()))
            .await
            .unwrap();

        // Keep the connection open until the client is done
        let _ = timeout(WAIT, ws.next()).await;
    });

    let client = LoginClient::new(url);
    client.login("alice").await.unwrap();
    assert_eq!(client.state(), LoginState::Redirecting);

    server.abort();
}

#[tokio::test]
async fn login_times_out_without_acknowledgment() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // Swallow the request, never reply
        let _ = timeout(WAIT, ws.next()).await;
        let _ = timeout(WAIT, ws.next()).await;
    });

    let client = LoginClient::new(url).with_timeout(Duration::from_millis(200));
    let err = client.login("bob").await.unwrap_err();
    assert!(matches!(err, Error::LoginTimeout));
    assert_eq!(client.state(), LoginState::Disconnected);

    server.abort();
}

#[tokio::test]
async fn login_ids_are_monotonic_across_attempts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let mut seen = Vec::new();
        for _ in 0..2 {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
            let text = msg.into_text().unwrap();
            let id = text.as_str().split(':').nth(1).unwrap().to_owned();
            seen.push(id.clone());
            ws.send(Message::Text(format!("lres:{}:ok", id).into()))
                .await
                .unwrap();
            let _ = timeout(WAIT, ws.next()).await;
        }
        seen
    });

    let client = LoginClient::new(url);
    client.login("carol").await.unwrap();
    client.login("carol").await.unwrap();

    let seen = server.await.unwrap();
    assert_eq!(seen, ["0", "1"]);
}

//! Common test utilities - TabletopTest harness for end-to-end testing

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use tabletopd::{Config, Server};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Test harness that runs a real tabletopd server on a random port
pub struct TabletopTest {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl TabletopTest {
    /// Start a new test server instance with an in-memory database
    pub async fn start() -> Result<Self> {
        Self::start_with_db(None).await
    }

    /// Start a test server, optionally on an on-disk database
    pub async fn start_with_db(db_path: Option<String>) -> Result<Self> {
        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let config = Config {
            bind_addr: addr,
            db_path,
        };

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();

        // Run the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until the server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Make a PATCH request with JSON body
    pub async fn patch<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .patch(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .delete(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Get direct access to the database for test assertions
    pub fn db(&self) -> Arc<tabletopd::db::Database> {
        self.server.db()
    }

    /// Shutdown the server gracefully
    pub fn shutdown(&self) {
        self.server.shutdown();
    }

    /// Create a session via the API and return its id
    pub async fn create_session(&self, name: &str) -> Result<String> {
        let resp = self
            .post("/sessions", &serde_json::json!({ "name": name }))
            .await?;
        anyhow::ensure!(resp.status() == 201, "session create failed: {}", resp.status());
        let body: serde_json::Value = resp.json().await?;
        Ok(body["id"].as_str().unwrap().to_string())
    }

    /// Add a combatant via the API and return its id
    pub async fn add_combatant(
        &self,
        session_id: &str,
        body: &serde_json::Value,
    ) -> Result<String> {
        let resp = self
            .post(&format!("/sessions/{}/combatants", session_id), body)
            .await?;
        anyhow::ensure!(resp.status() == 201, "combatant create failed: {}", resp.status());
        let body: serde_json::Value = resp.json().await?;
        Ok(body["id"].as_str().unwrap().to_string())
    }

    /// Get the WebSocket URL for a session viewer
    pub fn ws_url(&self, session_id: &str, name: &str) -> String {
        format!(
            "ws://{}/ws?session_id={}&name={}",
            self.addr, session_id, name
        )
    }

    /// Connect a viewer and wait for its own `user_joined` event,
    /// which guarantees the registration is visible to broadcasts.
    pub async fn connect_viewer(&self, session_id: &str, name: &str) -> Result<WsClient> {
        let (ws_stream, _) = connect_async(&self.ws_url(session_id, name)).await?;
        let (write, read) = ws_stream.split();
        let mut client = WsClient { write, read };

        let joined = client.expect("user_joined").await?;
        anyhow::ensure!(
            joined["data"]["name"] == name,
            "unexpected join ack: {}",
            joined
        );
        Ok(client)
    }
}

/// WebSocket viewer client for testing
pub struct WsClient {
    write: futures_util::stream::SplitSink<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        Message,
    >,
    read: futures_util::stream::SplitStream<
        tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
    >,
}

impl WsClient {
    /// Send a keep-alive ping message
    pub async fn send_ping(&mut self) -> Result<()> {
        let msg = serde_json::json!({ "type": "ping" });
        self.write
            .send(Message::Text(msg.to_string().into()))
            .await?;
        Ok(())
    }

    /// Ask the server to roll dice for this viewer
    pub async fn send_roll(&mut self, notation: &str) -> Result<()> {
        let msg = serde_json::json!({ "type": "roll", "notation": notation });
        self.write
            .send(Message::Text(msg.to_string().into()))
            .await?;
        Ok(())
    }

    /// Close the connection cleanly
    pub async fn close(mut self) -> Result<()> {
        self.write.send(Message::Close(None)).await?;
        Ok(())
    }

    /// Receive the next event as JSON (5 second timeout)
    pub async fn recv_json(&mut self) -> Result<serde_json::Value> {
        let deadline = Duration::from_secs(5);
        loop {
            let frame = tokio::time::timeout(deadline, self.read.next())
                .await
                .map_err(|_| anyhow::anyhow!("timed out waiting for event"))?;
            match frame {
                Some(Ok(Message::Text(text))) => {
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Close(_))) | None => {
                    anyhow::bail!("WebSocket closed");
                }
                _ => continue, // Skip binary/ping/pong frames
            }
        }
    }

    /// Receive events until one of the given type arrives
    pub async fn expect(&mut self, event_type: &str) -> Result<serde_json::Value> {
        for _ in 0..20 {
            let event = self.recv_json().await?;
            if event["type"] == event_type {
                return Ok(event);
            }
        }
        anyhow::bail!("no {} event within 20 messages", event_type)
    }

    /// Collect everything that arrives within the window
    pub async fn drain(&mut self, window: Duration) -> Vec<serde_json::Value> {
        let mut events = Vec::new();
        let deadline = tokio::time::Instant::now() + window;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, self.read.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => {
                    if let Ok(event) = serde_json::from_str(&text) {
                        events.push(event);
                    }
                }
                Ok(Some(Ok(_))) => continue,
                _ => break,
            }
        }
        events
    }
}

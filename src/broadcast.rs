//! Viewer registry and event fan-out
//!
//! Tracks every connected viewer and pushes events to all viewers of
//! a session. Delivery is best-effort and fire-and-forget: a send
//! that fails because a viewer is gone or hopelessly behind evicts
//! that viewer, and never blocks delivery to the rest. Reconnecting
//! clients re-fetch state over the REST surface; the channel carries
//! live deltas only.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::events::Event;

/// A connected viewer of one session
#[derive(Debug)]
pub struct Viewer {
    pub viewer_id: String,
    pub name: String,
    pub session_id: String,
    pub sender: mpsc::Sender<Event>,
}

/// Registry of all active viewer connections
#[derive(Debug, Default)]
pub struct ConnectionManager {
    viewers: RwLock<HashMap<String, Viewer>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly connected viewer
    pub async fn register(&self, viewer: Viewer) {
        debug!(
            viewer = %viewer.viewer_id,
            session = %viewer.session_id,
            "viewer connected"
        );
        self.viewers
            .write()
            .await
            .insert(viewer.viewer_id.clone(), viewer);
    }

    /// Remove a viewer, returning its record if it was still present
    pub async fn unregister(&self, viewer_id: &str) -> Option<Viewer> {
        self.viewers.write().await.remove(viewer_id)
    }

    /// Push an event to every viewer of the session.
    ///
    /// Sends never block: a viewer whose channel is closed or full is
    /// dropped from the registry and skipped.
    pub async fn broadcast(&self, session_id: &str, event: Event) {
        let mut stale = Vec::new();

        {
            let viewers = self.viewers.read().await;
            for viewer in viewers.values() {
                if viewer.session_id != session_id {
                    continue;
                }
                if viewer.sender.try_send(event.clone()).is_err() {
                    stale.push(viewer.viewer_id.clone());
                }
            }
        }

        if !stale.is_empty() {
            let mut viewers = self.viewers.write().await;
            for viewer_id in stale {
                warn!(viewer = %viewer_id, event = event.kind(), "dropping unreachable viewer");
                viewers.remove(&viewer_id);
            }
        }
    }
}

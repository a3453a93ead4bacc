use crate::models::ArticleView;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// ChangeEvent
///
/// A notification published after a successful mutation. Serializes to the
/// wire shape `{"event": "article:create", "data": {...}}` so subscribers can
/// dispatch on the event name.
///
/// Creation carries the full enriched article (the same payload the HTTP
/// caller received); deletion carries only the identifier, since the deleted
/// resource has no owner context left to attach. Updates do not publish at
/// all: subscribers are told about existence changes only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ChangeEvent {
    #[serde(rename = "article:create")]
    ArticleCreated(ArticleView),
    #[serde(rename = "article:delete")]
    ArticleDeleted { id: Uuid },
}

/// Buffered events per subscriber before the oldest are dropped. A slow
/// subscriber that falls further behind than this misses events rather than
/// applying backpressure to the mutation path.
const EVENT_BUFFER: usize = 64;

/// ChangeNotifier
///
/// Fire-and-forget broadcast hub for change events, built on a tokio broadcast
/// channel. Constructed explicitly at startup and injected through the
/// application state; tests substitute nothing, they just call `subscribe`
/// on the same instance the handlers publish to.
///
/// There is no delivery guarantee, no replay of missed events, and no
/// acknowledgment: a subscriber that is not connected at publish time simply
/// misses the event.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    /// publish
    ///
    /// Broadcasts an event to all currently connected subscribers. Must not
    /// block or fail the mutation's response path: the only possible send
    /// error means nobody is listening, and that is swallowed here.
    pub fn publish(&self, event: ChangeEvent) {
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(receivers, "change event published");
            }
            Err(_) => {
                tracing::debug!("change event dropped; no connected subscribers");
            }
        }
    }

    /// Attaches a new subscriber. Events published before this call are not
    /// replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

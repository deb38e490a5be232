// ABOUTME: Typed publish/subscribe bus for cross-cutting console notifications.
// ABOUTME: Wraps a tokio broadcast channel; dropping a receiver unsubscribes it.

use tokio::sync::broadcast;

/// Everything the console reacts to out-of-band: HTTP status classes surfaced
/// by the request client, plus auth lifecycle transitions. Payload fields are
/// the ones consumers actually read; there is no replay of missed events.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    Unauthorized {
        url: Option<String>,
        message: Option<String>,
    },
    Forbidden {
        url: Option<String>,
        message: Option<String>,
    },
    ServerError {
        status: u16,
        message: Option<String>,
    },
    NetworkError {
        message: String,
    },
    ValidationError {
        fields: Vec<(String, String)>,
    },
    NotFound {
        url: String,
    },
    Login {
        user_id: String,
    },
    Logout,
    RequestBlocked {
        url: String,
    },
    AccountLocked,
    TenantError {
        tenant_id: String,
        message: String,
    },
}

/// Discriminant of a [`ConsoleEvent`], for subscribers that filter by topic
/// without destructuring payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    Unauthorized,
    Forbidden,
    ServerError,
    NetworkError,
    ValidationError,
    NotFound,
    Login,
    Logout,
    RequestBlocked,
    AccountLocked,
    TenantError,
}

impl ConsoleEvent {
    pub fn topic(&self) -> EventTopic {
        match self {
            ConsoleEvent::Unauthorized { .. } => EventTopic::Unauthorized,
            ConsoleEvent::Forbidden { .. } => EventTopic::Forbidden,
            ConsoleEvent::ServerError { .. } => EventTopic::ServerError,
            ConsoleEvent::NetworkError { .. } => EventTopic::NetworkError,
            ConsoleEvent::ValidationError { .. } => EventTopic::ValidationError,
            ConsoleEvent::NotFound { .. } => EventTopic::NotFound,
            ConsoleEvent::Login { .. } => EventTopic::Login,
            ConsoleEvent::Logout => EventTopic::Logout,
            ConsoleEvent::RequestBlocked { .. } => EventTopic::RequestBlocked,
            ConsoleEvent::AccountLocked => EventTopic::AccountLocked,
            ConsoleEvent::TenantError { .. } => EventTopic::TenantError,
        }
    }
}

/// Process-wide fire-and-forget event bus. Cloning shares the underlying
/// channel; a [`subscribe`](EventBus::subscribe) receiver acts as its own
/// disposer — drop it to unsubscribe.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ConsoleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Publish an event to all current subscribers. No delivery-order
    /// guarantee across unrelated listeners; zero subscribers is not an error.
    pub fn publish(&self, event: ConsoleEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

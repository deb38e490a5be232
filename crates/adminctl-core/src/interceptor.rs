// ABOUTME: Login interceptor: reacts to unauthorized events with a throttled, resumable re-auth prompt.
// ABOUTME: Forbidden never opens the prompt; that path belongs to the guard chain.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::events::{ConsoleEvent, EventBus};
use crate::session::{Account, SessionHandle, TokenPair};

/// Default window inside which repeated unauthorized events are ignored.
pub const THROTTLE_WINDOW: Duration = Duration::from_millis(2000);

/// Whether the re-auth prompt is showing, and where to resume afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptState {
    Idle,
    Open { resume_url: String },
}

/// Event-driven re-authentication state machine. Feed it bus events via
/// [`handle_event`](LoginInterceptor::handle_event); it opens at most one
/// prompt per throttle window and never on public routes.
pub struct LoginInterceptor {
    session: SessionHandle,
    bus: EventBus,
    prompt: PromptState,
    throttle: Duration,
    last_open: Option<Instant>,
    handling: bool,
    is_public_route: Box<dyn Fn(&str) -> bool + Send + Sync>,
    on_cache_invalidate: Option<Box<dyn Fn() + Send + Sync>>,
}

impl LoginInterceptor {
    pub fn new(
        session: SessionHandle,
        bus: EventBus,
        is_public_route: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            session,
            bus,
            prompt: PromptState::Idle,
            throttle: THROTTLE_WINDOW,
            last_open: None,
            handling: false,
            is_public_route: Box::new(is_public_route),
            on_cache_invalidate: None,
        }
    }

    pub fn with_throttle(mut self, window: Duration) -> Self {
        self.throttle = window;
        self
    }

    /// Hook invoked on successful re-login, before the prompt closes. The
    /// consumer clears its query cache here.
    pub fn with_cache_invalidator(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_cache_invalidate = Some(Box::new(f));
        self
    }

    pub fn prompt(&self) -> &PromptState {
        &self.prompt
    }

    pub fn is_open(&self) -> bool {
        matches!(self.prompt, PromptState::Open { .. })
    }

    /// Drive the state machine with one bus event. Returns true when the
    /// prompt transitioned to open.
    pub async fn handle_event(&mut self, event: &ConsoleEvent, current_path: &str) -> bool {
        match event {
            ConsoleEvent::Unauthorized { .. } => self.try_open(current_path).await,
            // Authenticated elsewhere (another flow or tab): stand down.
            ConsoleEvent::Login { .. } => {
                if self.is_open() {
                    debug!("login observed while prompt open; auto-closing");
                    self.prompt = PromptState::Idle;
                }
                false
            }
            ConsoleEvent::Forbidden { .. } => false,
            _ => false,
        }
    }

    async fn try_open(&mut self, current_path: &str) -> bool {
        if self.handling || self.is_open() {
            debug!("unauthorized ignored: prompt already active");
            return false;
        }
        if let Some(last) = self.last_open {
            if last.elapsed() < self.throttle {
                debug!("unauthorized ignored: inside throttle window");
                self.bus.publish(ConsoleEvent::RequestBlocked {
                    url: current_path.to_string(),
                });
                return false;
            }
        }
        if (self.is_public_route)(current_path) {
            debug!(path = current_path, "unauthorized ignored: public route");
            return false;
        }

        self.handling = true;
        let authenticated = self.session.is_authenticated().await;
        self.handling = false;

        if authenticated {
            debug!("unauthorized ignored: session already authenticated");
            return false;
        }

        info!(resume = current_path, "session expired; opening login prompt");
        self.last_open = Some(Instant::now());
        self.prompt = PromptState::Open {
            resume_url: current_path.to_string(),
        };
        true
    }

    /// Successful re-login inside the prompt: install the session, invalidate
    /// caches, publish `Login`, close, and hand back the URL captured at
    /// interception time.
    pub async fn complete_login(&mut self, tokens: TokenPair, account: Account) -> Option<String> {
        let PromptState::Open { resume_url } = self.prompt.clone() else {
            return None;
        };

        if let Some(invalidate) = &self.on_cache_invalidate {
            invalidate();
        }
        // establish() publishes the Login event for other listeners
        self.session.establish(tokens, account).await;
        self.prompt = PromptState::Idle;
        info!(resume = %resume_url, "re-login complete");
        Some(resume_url)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}

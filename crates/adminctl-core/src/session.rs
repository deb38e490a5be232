// ABOUTME: Process-wide session state: token pair, tenant selection, and the loaded account.
// ABOUTME: All auth mutation goes through SessionHandle; permission predicates fail closed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::events::{ConsoleEvent, EventBus};

/// Role key that grants admin screens.
pub const ROLE_ADMIN: &str = "admin";
/// Role key that grants super-admin screens. Implies admin.
pub const ROLE_SUPER_ADMIN: &str = "superadmin";

/// An access/refresh token pair. `expires_at` absent means non-expiring
/// (static CLI tokens).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => at <= Utc::now(),
            None => false,
        }
    }
}

/// The account payload resolved for the authenticated user, as served by
/// `GET /admin/account`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub user_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub locked: bool,
}

/// Three-state load result for account data. Guards and predicates treat
/// anything but `Loaded` as "no access".
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AccountState {
    #[default]
    NotLoaded,
    Loaded(Account),
    Failed(String),
}

impl AccountState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AccountState::NotLoaded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AccountState::Failed(_))
    }

    pub fn account(&self) -> Option<&Account> {
        match self {
            AccountState::Loaded(account) => Some(account),
            _ => None,
        }
    }

    /// Fail-closed: `NotLoaded` and `Failed` never grant a permission.
    pub fn has_permission(&self, key: &str) -> bool {
        self.account()
            .is_some_and(|a| a.permissions.iter().any(|p| p == key))
    }

    pub fn has_role(&self, key: &str) -> bool {
        self.account().is_some_and(|a| a.roles.iter().any(|r| r == key))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN) || self.has_role(ROLE_SUPER_ADMIN)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(ROLE_SUPER_ADMIN)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    tokens: Option<TokenPair>,
    user_id: Option<String>,
    tenant_id: Option<String>,
    account: AccountState,
}

/// Shared handle to the single mutable auth state. Every write path lives
/// here; other components read through the accessors and never mutate
/// directly.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<SessionState>>,
    bus: EventBus,
}

impl SessionHandle {
    pub fn new(bus: EventBus) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            bus,
        }
    }

    /// True iff a non-expired access token is held.
    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.tokens.as_ref().is_some_and(|t| !t.is_expired())
    }

    pub async fn access_token(&self) -> Option<String> {
        let state = self.state.read().await;
        state
            .tokens
            .as_ref()
            .filter(|t| !t.is_expired())
            .map(|t| t.access_token.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        let state = self.state.read().await;
        state.tokens.as_ref().map(|t| t.refresh_token.clone())
    }

    pub async fn tenant_id(&self) -> Option<String> {
        self.state.read().await.tenant_id.clone()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.state.read().await.user_id.clone()
    }

    pub async fn account(&self) -> AccountState {
        self.state.read().await.account.clone()
    }

    /// Set or clear the token pair. Clearing (`None`) is the logout path: it
    /// also drops identity and account data and publishes `Logout`. Setting
    /// new tokens (refresh) keeps identity untouched and publishes nothing.
    pub async fn update_tokens(&self, tokens: Option<TokenPair>) {
        let cleared = tokens.is_none();
        {
            let mut state = self.state.write().await;
            state.tokens = tokens;
            if cleared {
                state.user_id = None;
                state.tenant_id = None;
                state.account = AccountState::NotLoaded;
            }
        }
        if cleared {
            self.bus.publish(ConsoleEvent::Logout);
        }
    }

    /// Login path: install tokens and identity in one step and publish
    /// `Login`.
    pub async fn establish(&self, tokens: TokenPair, account: Account) {
        let user_id = account.user_id.clone();
        {
            let mut state = self.state.write().await;
            state.tokens = Some(tokens);
            state.user_id = Some(account.user_id.clone());
            state.tenant_id = account.tenant_id.clone();
            state.account = AccountState::Loaded(account);
        }
        self.bus.publish(ConsoleEvent::Login { user_id });
    }

    /// Switch the active tenant. Navigation after a switch is the caller's
    /// responsibility.
    pub async fn switch_tenant(&self, tenant_id: &str) {
        let mut state = self.state.write().await;
        state.tenant_id = Some(tenant_id.to_string());
    }

    /// Record the result of an account load. Written by the account fetch
    /// flow only.
    pub async fn set_account(&self, account: AccountState) {
        let mut state = self.state.write().await;
        if let AccountState::Loaded(ref a) = account {
            state.user_id = Some(a.user_id.clone());
            if state.tenant_id.is_none() {
                state.tenant_id = a.tenant_id.clone();
            }
        }
        state.account = account;
    }

    pub async fn has_permission(&self, key: &str) -> bool {
        self.state.read().await.account.has_permission(key)
    }

    pub async fn has_role(&self, key: &str) -> bool {
        self.state.read().await.account.has_role(key)
    }

    pub async fn is_admin(&self) -> bool {
        self.state.read().await.account.is_admin()
    }

    pub async fn is_super_admin(&self) -> bool {
        self.state.read().await.account.is_super_admin()
    }
}

// ABOUTME: Auth API flows: login, token refresh, logout, and the account load feeding the guards.
// ABOUTME: All session mutation still goes through SessionHandle; this module only drives it.

use adminctl_core::error::ConsoleError;
use adminctl_core::events::ConsoleEvent;
use adminctl_core::session::{Account, AccountState, SessionHandle, TokenPair};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::http::HttpClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    account: Account,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn token_pair(access: String, refresh: String, expires_in: Option<i64>) -> TokenPair {
    TokenPair {
        access_token: access,
        refresh_token: refresh,
        expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
    }
}

/// The login/refresh/logout surface of the admin API.
#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// POST `/auth/login`. On success the session is established (which
    /// publishes `Login`); a locked account is rejected and announced on the
    /// bus.
    pub async fn login(
        &self,
        session: &SessionHandle,
        username: &str,
        password: &str,
        tenant: Option<&str>,
    ) -> Result<Account, ConsoleError> {
        let body = json!({
            "username": username,
            "password": password,
            "tenant": tenant,
        });
        let value = self.http.post("/auth/login", &body).await?;
        let resp: LoginResponse = serde_json::from_value(value)?;

        if resp.account.locked {
            self.http.bus().publish(ConsoleEvent::AccountLocked);
            return Err(ConsoleError::Http {
                status: 423,
                message: "account locked".to_string(),
            });
        }

        let tokens = token_pair(resp.access_token, resp.refresh_token, resp.expires_in);
        session.establish(tokens, resp.account.clone()).await;
        info!(user = %resp.account.user_id, "logged in");
        Ok(resp.account)
    }

    /// POST `/auth/refresh` with the held refresh token. Identity and account
    /// data are untouched; only the token pair rotates.
    pub async fn refresh(&self, session: &SessionHandle) -> Result<(), ConsoleError> {
        let refresh_token = session
            .refresh_token()
            .await
            .ok_or_else(|| ConsoleError::Config("no refresh token held".into()))?;

        let body = json!({ "refreshToken": refresh_token });
        let value = self.http.post("/auth/refresh", &body).await?;
        let resp: RefreshResponse = serde_json::from_value(value)?;

        session
            .update_tokens(Some(token_pair(
                resp.access_token,
                resp.refresh_token,
                resp.expires_in,
            )))
            .await;
        Ok(())
    }

    /// POST `/auth/logout`, then clear local state regardless of the server
    /// outcome. Clearing publishes `Logout`.
    pub async fn logout(&self, session: &SessionHandle) {
        if let Err(e) = self.http.post("/auth/logout", &json!({})).await {
            warn!("logout request failed, clearing local session anyway: {e}");
        }
        session.update_tokens(None).await;
    }

    /// GET `/admin/account` and record the result as the session's account
    /// state. Failures are recorded as `Failed` so predicates stay closed.
    pub async fn load_account(&self, session: &SessionHandle) -> Result<Account, ConsoleError> {
        match self.http.get_typed::<Account>("/admin/account").await {
            Ok(account) => {
                session
                    .set_account(AccountState::Loaded(account.clone()))
                    .await;
                Ok(account)
            }
            Err(e) => {
                session.set_account(AccountState::Failed(e.to_string())).await;
                Err(e)
            }
        }
    }
}

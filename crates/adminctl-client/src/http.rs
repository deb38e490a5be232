// ABOUTME: Request client wrapping reqwest: base URL, bearer/tenant header injection, JSON bodies.
// ABOUTME: Maps HTTP status classes to bus events exactly once per failed request.

use adminctl_core::error::{AuthKind, ConsoleError};
use adminctl_core::events::{ConsoleEvent, EventBus};
use adminctl_core::session::SessionHandle;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Header carrying the active tenant on every request.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// The single seam between console logic and the network. Swapping the HTTP
/// library underneath is fine as long as the event-emission contract holds.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    session: SessionHandle,
    bus: EventBus,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, session: SessionHandle, bus: EventBus) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: reqwest::Client::new(),
            base_url,
            session,
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub async fn get(&self, path: &str) -> Result<Value, ConsoleError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ConsoleError> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, ConsoleError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ConsoleError> {
        self.send(Method::DELETE, path, None).await
    }

    /// GET decoded straight into a typed model.
    pub async fn get_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        let value = self.get(path).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ConsoleError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "request");

        let mut req = self.inner.request(method, &url);
        if let Some(token) = self.session.access_token().await {
            req = req.bearer_auth(token);
        }
        if let Some(tenant) = self.session.tenant_id().await {
            req = req.header(TENANT_HEADER, tenant);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let message = e.to_string();
                self.bus.publish(ConsoleEvent::NetworkError {
                    message: message.clone(),
                });
                return Err(ConsoleError::Network(message));
            }
        };

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if status.is_success() {
            if text.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        Err(self.classify(status, path, &text))
    }

    /// Translate a failed response into an error, publishing the matching
    /// event. Exactly one event per failed request.
    fn classify(&self, status: StatusCode, path: &str, body: &str) -> ConsoleError {
        let message = extract_message(body);
        let url = path.to_string();

        match status {
            StatusCode::UNAUTHORIZED => {
                self.bus.publish(ConsoleEvent::Unauthorized {
                    url: Some(url),
                    message: message.clone(),
                });
                ConsoleError::Auth(AuthKind::Unauthorized)
            }
            StatusCode::FORBIDDEN => {
                self.bus.publish(ConsoleEvent::Forbidden {
                    url: Some(url),
                    message: message.clone(),
                });
                ConsoleError::Auth(AuthKind::Forbidden)
            }
            StatusCode::NOT_FOUND => {
                self.bus.publish(ConsoleEvent::NotFound { url });
                ConsoleError::Http {
                    status: 404,
                    message: message.unwrap_or_else(|| "not found".to_string()),
                }
            }
            StatusCode::LOCKED => {
                self.bus.publish(ConsoleEvent::AccountLocked);
                ConsoleError::Http {
                    status: 423,
                    message: message.unwrap_or_else(|| "account locked".to_string()),
                }
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let fields = extract_field_errors(body);
                if fields.is_empty() {
                    ConsoleError::Http {
                        status: status.as_u16(),
                        message: message.unwrap_or_else(|| status.to_string()),
                    }
                } else {
                    self.bus.publish(ConsoleEvent::ValidationError {
                        fields: fields.clone(),
                    });
                    ConsoleError::Validation { fields }
                }
            }
            s if s.is_server_error() => {
                self.bus.publish(ConsoleEvent::ServerError {
                    status: s.as_u16(),
                    message: message.clone(),
                });
                ConsoleError::Http {
                    status: s.as_u16(),
                    message: message.unwrap_or_else(|| s.to_string()),
                }
            }
            s => ConsoleError::Http {
                status: s.as_u16(),
                message: message.unwrap_or_else(|| s.to_string()),
            },
        }
    }
}

/// Pull a human-readable message out of a JSON error body, if there is one.
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str())
        .map(String::from)
}

/// Field-level errors arrive as `{"errors": {"field": "message", ...}}`.
fn extract_field_errors(body: &str) -> Vec<(String, String)> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };
    let Some(Value::Object(errors)) = value.get("errors") else {
        return Vec::new();
    };
    errors
        .iter()
        .filter_map(|(field, msg)| msg.as_str().map(|m| (field.clone(), m.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_extraction_prefers_message_over_error() {
        assert_eq!(
            extract_message(r#"{"message": "broken", "error": "other"}"#),
            Some("broken".to_string())
        );
        assert_eq!(
            extract_message(r#"{"error": "denied"}"#),
            Some("denied".to_string())
        );
        assert_eq!(extract_message("not json"), None);
        assert_eq!(extract_message(r#"{"status": 500}"#), None);
    }

    #[test]
    fn field_errors_parse_from_errors_object() {
        let fields = extract_field_errors(r#"{"errors": {"name": "required", "email": "invalid"}}"#);
        assert_eq!(fields.len(), 2);
        assert!(fields.contains(&("name".to_string(), "required".to_string())));
    }

    #[test]
    fn field_errors_empty_for_other_shapes() {
        assert!(extract_field_errors(r#"{"message": "nope"}"#).is_empty());
        assert!(extract_field_errors("garbage").is_empty());
    }
}

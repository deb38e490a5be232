// ABOUTME: Error taxonomy shared by the console core and the API client layer.
// ABOUTME: Factory and controller code propagates these with `?`; only the auth layer reacts locally.

use thiserror::Error;

/// Which half of the auth failure space an error belongs to. Only
/// `Unauthorized` (401) may open the login prompt; `Forbidden` (403) is the
/// guard chain's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Unauthorized,
    Forbidden,
}

impl std::fmt::Display for AuthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthKind::Unauthorized => write!(f, "unauthorized"),
            AuthKind::Forbidden => write!(f, "forbidden"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("network error: {0}")]
    Network(String),

    #[error("http {status}: {message}")]
    Http { status: u16, message: String },

    #[error("validation failed on {} field(s)", fields.len())]
    Validation { fields: Vec<(String, String)> },

    #[error("auth error: {0}")]
    Auth(AuthKind),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl ConsoleError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ConsoleError::Auth(_))
    }

    /// The HTTP status this error corresponds to, where one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Http { status, .. } => Some(*status),
            ConsoleError::Auth(AuthKind::Unauthorized) => Some(401),
            ConsoleError::Auth(AuthKind::Forbidden) => Some(403),
            _ => None,
        }
    }
}

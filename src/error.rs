use serde::Deserialize;

/// Failures reported by a [`crate::backend::Backend`] implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Request(String),

    /// The platform answered with a non-success status. `message` is the
    /// platform's own text and is what callers show to the user.
    #[error("{message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    /// A response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: String,
}

impl BackendError {
    /// Builds an [`BackendError::Api`] from a status and raw error body.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(body) {
            Ok(parsed) if !parsed.message.is_empty() => Self::Api {
                status,
                kind: parsed.kind,
                message: parsed.message,
            },
            _ => Self::Api {
                status,
                kind: String::new(),
                message: if body.trim().is_empty() {
                    format!("request failed with status {status}")
                } else {
                    body.trim().to_string()
                },
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced by gateway operations and the profile flows built on them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The platform acknowledged a write but returned no usable record.
    #[error("{0} was not created")]
    MissingRecord(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("no user is signed in")]
    NotSignedIn,
}

//! Error types for the gateway client.

use thiserror::Error;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur while talking to the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),

    #[error("connection to gateway failed: {0}")]
    Connection(String),

    /// The session expired; log in again and retry.
    #[error("gateway session expired, login required")]
    LoginRequired,

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("gateway returned error {code}: {message}")]
    Api { code: u32, message: String },

    #[error("unexpected gateway response: {0}")]
    UnexpectedResponse(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GatewayError {
    /// Map an `<error><code>` envelope to an error variant.
    pub fn from_code(code: u32, message: String) -> Self {
        match code {
            100003 | 125002 | 125003 => Self::LoginRequired,
            108001 => Self::Auth("wrong username".to_string()),
            108002 | 108006 => Self::Auth("wrong username or password".to_string()),
            108007 => Self::Auth("too many login attempts".to_string()),
            _ => Self::Api { code, message },
        }
    }

    /// Transport failures become `Connection`; everything else stays `Http`.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Connection(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_codes_require_login() {
        for code in [100003, 125002, 125003] {
            assert!(matches!(
                GatewayError::from_code(code, String::new()),
                GatewayError::LoginRequired
            ));
        }
    }

    #[test]
    fn credential_codes_are_auth_errors() {
        for code in [108001, 108002, 108006, 108007] {
            assert!(matches!(
                GatewayError::from_code(code, String::new()),
                GatewayError::Auth(_)
            ));
        }
    }

    #[test]
    fn other_codes_keep_code_and_message() {
        let err = GatewayError::from_code(100002, "unsupported".to_string());
        assert!(matches!(err, GatewayError::Api { code: 100002, .. }));
        assert_eq!(err.to_string(), "gateway returned error 100002: unsupported");
    }
}

//! Login password encoding.
//!
//! Firmware advertising `password_type = 4` expects
//! `base64(hex(sha256(username + base64(hex(sha256(password))) + token))))`;
//! older firmware takes plain `base64(password)`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordType {
    Base64,
    Sha256,
}

impl PasswordType {
    /// Parse the `password_type` field of `state-login`; unknown values
    /// fall back to SHA-256, which every current firmware uses.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "0" => Self::Base64,
            _ => Self::Sha256,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Base64 => "0",
            Self::Sha256 => "4",
        }
    }
}

pub fn encode_password(username: &str, password: &str, token: &str, kind: PasswordType) -> String {
    match kind {
        PasswordType::Base64 => STANDARD.encode(password),
        PasswordType::Sha256 => {
            let inner = STANDARD.encode(hex::encode(Sha256::digest(password.as_bytes())));
            let outer = hex::encode(Sha256::digest(format!("{username}{inner}{token}").as_bytes()));
            STANDARD.encode(outer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_encoding_matches_firmware() {
        let encoded = encode_password("admin", "admin", "abc123", PasswordType::Sha256);
        assert_eq!(
            encoded,
            "NjQwZDNlNDI5ZDFiMzg5ZTI0YTM4OGE5ZmI3M2U5ZWJmMWQ3ZmIwMDFhY2E0NzcwNDlhMGJhNTcxYWY5OWEyOA=="
        );
    }

    #[test]
    fn sha256_encoding_depends_on_token() {
        let a = encode_password("admin", "admin", "one", PasswordType::Sha256);
        let b = encode_password("admin", "admin", "two", PasswordType::Sha256);
        assert_ne!(a, b);
    }

    #[test]
    fn base64_encoding_ignores_token() {
        assert_eq!(
            encode_password("admin", "admin", "abc123", PasswordType::Base64),
            "YWRtaW4="
        );
    }

    #[test]
    fn password_type_codes() {
        assert_eq!(PasswordType::from_code("4"), PasswordType::Sha256);
        assert_eq!(PasswordType::from_code("0"), PasswordType::Base64);
        assert_eq!(PasswordType::from_code(""), PasswordType::Sha256);
        assert_eq!(PasswordType::Sha256.code(), "4");
    }
}

//! Credential protection backed by keyed blake3.

use floorplan_engine::{CredentialProtector, ProtectedToken};

const KEY_CONTEXT: &str = "floorplan credentials v1";

/// Protects secrets as hex-encoded keyed blake3 hashes.
///
/// The key is derived from the service secret, so tokens from one deployment
/// do not verify in another.
pub struct Blake3Protector {
    key: [u8; 32],
}

impl Blake3Protector {
    pub fn new(service_secret: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, service_secret.as_bytes()),
        }
    }

    /// Use the configured secret, or a fixed development key without one.
    pub fn from_config(auth_secret: Option<&str>) -> Self {
        match auth_secret {
            Some(secret) => Self::new(secret),
            None => {
                tracing::warn!("AUTH_SECRET not set; using development credential key");
                Self::new("development")
            }
        }
    }

    fn hash(&self, secret: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.key, secret.as_bytes())
    }
}

impl CredentialProtector for Blake3Protector {
    fn protect(&self, secret: &str) -> ProtectedToken {
        ProtectedToken::new(self.hash(secret).to_hex().to_string())
    }

    fn verify(&self, candidate: &str, token: &ProtectedToken) -> bool {
        match blake3::Hash::from_hex(token.as_str()) {
            // Hash equality is constant time
            Ok(expected) => self.hash(candidate) == expected,
            Err(_) => false,
        }
    }
}

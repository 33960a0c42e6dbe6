//! Users, roles and the credential boundary.
//!
//! The engine never hashes or encrypts anything itself. A
//! [`CredentialProtector`] turns a secret into an opaque token once, at
//! construction, and only the token is kept.

use crate::UserId;
use serde::{Deserialize, Serialize};

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May resolve conflicts and administer plans
    Admin,
    #[default]
    Member,
}

/// Opaque output of a [`CredentialProtector`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtectedToken(String);

impl ProtectedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ProtectedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProtectedToken(..)")
    }
}

/// Protects and verifies credentials.
pub trait CredentialProtector: Send + Sync {
    /// Turn a plaintext secret into an opaque token.
    fn protect(&self, secret: &str) -> ProtectedToken;

    /// Check a candidate secret against a token produced by [`Self::protect`].
    fn verify(&self, candidate: &str, token: &ProtectedToken) -> bool;
}

/// A user of the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    username: String,
    role: Role,
    credential: ProtectedToken,
}

impl User {
    /// Create a user, protecting `secret` immediately.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        role: Role,
        secret: &str,
        protector: &dyn CredentialProtector,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            credential: protector.protect(secret),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Check a login attempt.
    pub fn authenticate(&self, candidate: &str, protector: &dyn CredentialProtector) -> bool {
        protector.verify(candidate, &self.credential)
    }
}

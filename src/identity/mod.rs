//! Identity collaborator.
//!
//! The game only needs one thing from the identity provider: a stable
//! unique id for the signed-in user, used to key ledger storage. The
//! `IdentityProvider` trait keeps that contract narrow; the shipped
//! implementation is a static bearer-token table loaded from config,
//! standing in for a real external provider.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::AuthConfig;

/// A resolved, signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable unique id, the key for all per-user state.
    pub id: String,
}

/// Abstraction over the external identity provider.
///
/// Implementors map a presented credential to an identity, or to
/// `None` when the credential does not resolve to a signed-in user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer credential to the current user, if any.
    async fn current_user(&self, credential: &str) -> Result<Option<Identity>>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}

/// Static token → user-id table.
pub struct BearerTokens {
    tokens: HashMap<String, String>,
}

impl BearerTokens {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(cfg.tokens.clone())
    }
}

#[async_trait]
impl IdentityProvider for BearerTokens {
    async fn current_user(&self, credential: &str) -> Result<Option<Identity>> {
        Ok(self
            .tokens
            .get(credential)
            .map(|id| Identity { id: id.clone() }))
    }

    fn name(&self) -> &str {
        "bearer-tokens"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

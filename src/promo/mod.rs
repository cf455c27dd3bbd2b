//! Promotional redemption — server-verified one-time tokens.
//!
//! The legacy flow compared a user-supplied code against a
//! client-embedded secret and granted funds client-side. Here the
//! tokens live server-side only (config and/or an env var, the same
//! way other secrets are referenced), each token is consumable exactly
//! once, and every successful redemption leaves an audit record.

use anyhow::Result;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, PromoConfig};
use crate::types::GameError;

/// Audit record for one consumed token.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub id: Uuid,
    pub user_id: String,
    pub at: DateTime<Utc>,
}

struct TokenSlot {
    value: Secret<String>,
    redemption: Option<Redemption>,
}

/// The set of issued one-time tokens and their redemption state.
pub struct PromoBook {
    grant_balance: u64,
    tokens: Mutex<Vec<TokenSlot>>,
}

impl PromoBook {
    pub fn new(grant_balance: u64, tokens: Vec<String>) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|value| TokenSlot {
                value: Secret::new(value),
                redemption: None,
            })
            .collect();
        PromoBook {
            grant_balance,
            tokens: Mutex::new(tokens),
        }
    }

    /// Build from config: inline token values plus any referenced via
    /// a comma-separated env var.
    pub fn from_config(cfg: &PromoConfig) -> Result<Self> {
        let mut tokens = cfg.tokens.clone();
        if let Some(env_name) = &cfg.tokens_env {
            let raw = AppConfig::resolve_env(env_name)?;
            tokens.extend(
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from),
            );
        }
        if tokens.is_empty() {
            warn!("No promo tokens configured — redemption will always fail");
        }
        Ok(Self::new(cfg.grant_balance, tokens))
    }

    pub fn grant_balance(&self) -> u64 {
        self.grant_balance
    }

    pub fn token_count(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    /// Redeem a code for the configured grant.
    ///
    /// An unknown code and an already-consumed code are kept apart in
    /// the taxonomy but surface the same transient "Invalid coupon"
    /// message to the user.
    pub fn redeem(&self, user_id: &str, code: &str) -> Result<u64, GameError> {
        let mut tokens = self.tokens.lock().unwrap();
        let slot = match tokens
            .iter_mut()
            .find(|slot| slot.value.expose_secret() == code)
        {
            Some(slot) => slot,
            None => {
                debug!(user_id, "Unknown promo code presented");
                return Err(GameError::InvalidCoupon);
            }
        };

        if slot.redemption.is_some() {
            warn!(user_id, "Attempt to reuse a consumed promo token");
            return Err(GameError::CouponAlreadyRedeemed);
        }

        let redemption = Redemption {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            at: Utc::now(),
        };
        info!(
            redemption_id = %redemption.id,
            user_id,
            grant = self.grant_balance,
            "Promo token redeemed"
        );
        slot.redemption = Some(redemption);

        Ok(self.grant_balance)
    }

    /// All redemptions so far, for audit.
    pub fn redemptions(&self) -> Vec<Redemption> {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .filter_map(|slot| slot.redemption.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! GOLDFLIP — Double-or-Nothing Coin Flip Wagering Service
//!
//! Entry point. Loads configuration, initialises structured logging,
//! connects the balance store, wires the identity and promo
//! collaborators, and serves the HTTP presentation contract with
//! graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use goldflip::config::AppConfig;
use goldflip::game::flip::ThreadRngFlip;
use goldflip::identity::{BearerTokens, IdentityProvider};
use goldflip::promo::PromoBook;
use goldflip::server;
use goldflip::server::routes::ServiceState;
use goldflip::store::SqliteStore;

const BANNER: &str = r#"
   ____  ___  _     ____  _____ _     ___ ____
  / ___|/ _ \| |   |  _ \|  ___| |   |_ _|  _ \
 | |  _| | | | |   | | | | |_  | |    | || |_) |
 | |_| | |_| | |___| |_| |  _| | |___ | ||  __/
  \____|\___/|_____|____/|_|   |_____|___|_|

  Double or Nothing · 50/50 Chance · Pure Luck
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        port = cfg.server.port,
        starting_balance = cfg.game.starting_balance,
        flip_delay_ms = cfg.game.flip_delay_ms,
        reset_delay_ms = cfg.game.reset_delay_ms,
        history_limit = cfg.game.history_limit,
        "GOLDFLIP starting up"
    );

    // -- Wire collaborators ------------------------------------------------

    let store = SqliteStore::connect(&cfg.server.database_url).await?;

    let identity = BearerTokens::from_config(&cfg.auth);
    info!(
        provider = identity.name(),
        tokens = cfg.auth.tokens.len(),
        "Identity provider ready"
    );

    let promos = PromoBook::from_config(&cfg.promo)?;
    info!(
        tokens = promos.token_count(),
        grant = promos.grant_balance(),
        "Promo book loaded"
    );

    let state = Arc::new(ServiceState::new(
        cfg.game.clone(),
        Arc::new(store),
        Arc::new(identity),
        Arc::new(ThreadRngFlip),
        promos,
    ));

    // -- Serve -------------------------------------------------------------

    server::serve(state, cfg.server.port).await?;

    info!("GOLDFLIP shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("goldflip=info"));

    let json_logging = std::env::var("GOLDFLIP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

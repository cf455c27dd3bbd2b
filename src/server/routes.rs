//! API route handlers and the settlement driver.
//!
//! All endpoints return JSON. State is shared via `Arc<ServiceState>`;
//! each user's session sits behind its own async mutex, which gives
//! every session a single logical thread of control. The fixed
//! presentational delays (flip animation, result display) live only in
//! the driver task here — settlement semantics never depend on them.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use tracing::{error, info};

use crate::config::GameConfig;
use crate::game::flip::FlipSource;
use crate::game::session::{Session, SessionView, SubmitOutcome};
use crate::identity::{Identity, IdentityProvider};
use crate::ledger;
use crate::promo::PromoBook;
use crate::store::BalanceStore;
use crate::types::{CoinSide, FlipRecord, GameError};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServiceState {
    pub game: GameConfig,
    pub sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    pub store: Arc<dyn BalanceStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub flip: Arc<dyn FlipSource>,
    pub promos: PromoBook,
}

impl ServiceState {
    pub fn new(
        game: GameConfig,
        store: Arc<dyn BalanceStore>,
        identity: Arc<dyn IdentityProvider>,
        flip: Arc<dyn FlipSource>,
        promos: PromoBook,
    ) -> Self {
        Self {
            game,
            sessions: RwLock::new(HashMap::new()),
            store,
            identity,
            flip,
            promos,
        }
    }
}

pub type AppState = Arc<ServiceState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct SideRequest {
    pub side: CoinSide,
}

#[derive(Debug, Deserialize)]
pub struct PromoRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// HTTP-mapped error wrapper around the domain taxonomy.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        let status = match e {
            GameError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GameError::InvalidCoupon | GameError::CouponAlreadyRedeemed => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            GameError::InsufficientBalance { .. } => StatusCode::CONFLICT,
            GameError::Storage(_) | GameError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: e.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = %e, "Internal error");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Authentication and session lookup
// ---------------------------------------------------------------------------

/// Resolve the bearer credential to an identity. Without one, the only
/// affordance is signing in — no wager state exists.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, ApiError> {
    let credential = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    match state.identity.current_user(credential).await {
        Ok(Some(identity)) => Ok(identity),
        Ok(None) => Err(GameError::Unauthenticated.into()),
        Err(e) => Err(ApiError::from(e)),
    }
}

/// Fetch the user's session, creating it from the store on first
/// access (fresh users start at the configured balance, persisted).
async fn session_for(state: &AppState, user_id: &str) -> Result<Arc<Mutex<Session>>, ApiError> {
    if let Some(session) = state.sessions.read().await.get(user_id) {
        return Ok(session.clone());
    }

    let wallet = ledger::load_or_init(
        state.store.as_ref(),
        user_id,
        state.game.starting_balance,
    )
    .await?;

    let mut sessions = state.sessions.write().await;
    let session = sessions
        .entry(user_id.to_string())
        .or_insert_with(|| {
            Arc::new(Mutex::new(Session::new(
                user_id,
                wallet,
                state.game.history_limit,
            )))
        })
        .clone();
    Ok(session)
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/session
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let session = session_for(&state, &identity.id).await?;
    let view = session.lock().await.view(state.game.leaderboard_threshold);
    Ok(Json(view))
}

/// POST /api/wager/amount
pub async fn select_amount(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AmountRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let session = session_for(&state, &identity.id).await?;
    let mut session = session.lock().await;
    session.select_amount(req.amount);
    Ok(Json(session.view(state.game.leaderboard_threshold)))
}

/// POST /api/wager/side
pub async fn select_side(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SideRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let session = session_for(&state, &identity.id).await?;
    let mut session = session.lock().await;
    session.select_side(req.side);
    Ok(Json(session.view(state.game.leaderboard_threshold)))
}

/// POST /api/wager/submit
///
/// A valid submission debits the stake, goes in-flight, and schedules
/// the settlement driver. An invalid one changes nothing and returns
/// the unchanged view — the silent no-op contract.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionView>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let session = session_for(&state, &identity.id).await?;

    let (outcome, balance, view) = {
        let mut session = session.lock().await;
        let outcome = session.submit()?;
        (
            outcome,
            session.balance(),
            session.view(state.game.leaderboard_threshold),
        )
    };

    if matches!(outcome, SubmitOutcome::Accepted { .. }) {
        // Persist the reservation: a crash mid-flight leaves the
        // player down the stake, never up.
        ledger::sync(state.store.as_ref(), &identity.id, balance).await;
        spawn_settlement(state.clone(), identity.id.clone(), session);
    }

    Ok(Json(view))
}

/// GET /api/history
pub async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FlipRecord>>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let session = session_for(&state, &identity.id).await?;
    let history = session.lock().await.history().snapshot();
    Ok(Json(history))
}

/// POST /api/promo/redeem
pub async fn redeem_promo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PromoRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let identity = authenticate(&state, &headers).await?;
    let grant = state.promos.redeem(&identity.id, &req.code)?;

    let session = session_for(&state, &identity.id).await?;
    let (balance, view) = {
        let mut session = session.lock().await;
        session.apply_grant(grant);
        (
            session.balance(),
            session.view(state.game.leaderboard_threshold),
        )
    };
    ledger::sync(state.store.as_ref(), &identity.id, balance).await;

    Ok(Json(view))
}

/// POST /api/session/signout
///
/// Tears down the in-memory wallet state; the balance lives on in the
/// remote store.
pub async fn signout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let identity = authenticate(&state, &headers).await?;

    let session = state.sessions.write().await.remove(&identity.id);
    if let Some(session) = session {
        let balance = session.lock().await.balance();
        ledger::sync(state.store.as_ref(), &identity.id, balance).await;
    }
    info!(user_id = %identity.id, "Signed out — wallet state torn down");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Settlement driver
// ---------------------------------------------------------------------------

/// Drive one in-flight wager to completion.
///
/// Strict order, per wager: the (presentational) flip delay, then
/// resolution, settlement, persistence, the (presentational) display
/// delay, and finally the reset that re-enables submission.
pub(crate) fn spawn_settlement(
    state: AppState,
    user_id: String,
    session: Arc<Mutex<Session>>,
) {
    tokio::spawn(async move {
        sleep(Duration::from_millis(state.game.flip_delay_ms)).await;

        let flipped = state.flip.flip();
        let balance = {
            let mut session = session.lock().await;
            if session.settle(flipped).is_none() {
                error!(%user_id, "Settlement driver found no in-flight wager");
                return;
            }
            session.balance()
        };

        ledger::sync(state.store.as_ref(), &user_id, balance).await;

        sleep(Duration::from_millis(state.game.reset_delay_ms)).await;
        session.lock().await.reset();
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

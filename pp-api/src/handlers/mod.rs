//! API Handlers
//!
//! One module per route group. Handlers take the caller from
//! [`AuthClaims`](crate::auth::AuthClaims), call a service and wrap the
//! result in the envelope.

pub mod admin;
pub mod auth;
pub mod diamonds;
pub mod economy;
pub mod education;
pub mod game;
pub mod habits;
pub mod health;
pub mod marketplace;
pub mod players;
pub mod social;
pub mod tips;
pub mod tokens;

use uuid::Uuid;

use crate::cache::keys;
use crate::metrics::record_economy_operation;
use crate::state::AppState;

/// Drop cached stats for players whose balances just changed
pub(crate) async fn invalidate_players(state: &AppState, player_ids: &[Uuid]) {
    let keys: Vec<String> = player_ids.iter().map(|id| keys::stats(*id)).collect();
    state.cache.invalidate_all(&keys).await;
}

/// Count a balance-changing call and pass its result through
pub(crate) fn tracked<T, E>(operation: &str, result: Result<T, E>) -> Result<T, E> {
    record_economy_operation(operation, result.is_ok());
    result
}

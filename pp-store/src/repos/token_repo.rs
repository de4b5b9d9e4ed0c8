//! Movement Token Repository

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{
    LedgerEntry, MovementTokenEntity, NewMovementToken, PlayerEntity, TokenHoldingEntity,
};
use crate::error::StoreResult;

/// Purchase step: token and buyer. The buyer's holding grows by the change
/// in circulating supply.
pub type TokenPurchaseMutation<'a> = Box<
    dyn FnOnce(&mut MovementTokenEntity, &mut PlayerEntity) -> StoreResult<Vec<LedgerEntry>>
        + Send
        + 'a,
>;

#[async_trait]
pub trait MovementTokenRepository: Send + Sync {
    /// Conflicts on a duplicate symbol
    async fn create_token(&self, new: NewMovementToken) -> StoreResult<MovementTokenEntity>;

    async fn get_token(&self, id: Uuid) -> StoreResult<Option<MovementTokenEntity>>;

    /// Largest market cap first
    async fn list_tokens(&self, limit: i64) -> StoreResult<Vec<MovementTokenEntity>>;

    async fn purchase_token<'a>(
        &self,
        token_id: Uuid,
        buyer_id: Uuid,
        mutation: TokenPurchaseMutation<'a>,
    ) -> StoreResult<(MovementTokenEntity, TokenHoldingEntity, PlayerEntity)>;

    async fn list_holdings(&self, player_id: Uuid) -> StoreResult<Vec<TokenHoldingEntity>>;
}

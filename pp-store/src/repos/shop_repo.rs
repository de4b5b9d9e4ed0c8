//! Shop Repository

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{LedgerEntry, NewShopItem, PlayerEntity, ShopItemEntity, ShopPurchaseEntity};
use crate::error::StoreResult;

pub type ShopMutation<'a> = Box<
    dyn FnOnce(&mut ShopItemEntity, &mut PlayerEntity) -> StoreResult<Vec<LedgerEntry>> + Send + 'a,
>;

#[async_trait]
pub trait ShopRepository: Send + Sync {
    async fn create_item(&self, new: NewShopItem) -> StoreResult<ShopItemEntity>;

    async fn get_item(&self, id: Uuid) -> StoreResult<Option<ShopItemEntity>>;

    async fn list_items(&self, active_only: bool) -> StoreResult<Vec<ShopItemEntity>>;

    /// Atomically apply a purchase and record it
    async fn purchase_item<'a>(
        &self,
        player_id: Uuid,
        item_id: Uuid,
        quantity: i64,
        mutation: ShopMutation<'a>,
    ) -> StoreResult<(ShopPurchaseEntity, PlayerEntity)>;
}

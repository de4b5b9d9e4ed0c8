//! Tip Service

use pp_core::logging::operations;
use pp_core::{validate_amount, GameConfig, TipKind, TransactionKind};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::entities::{NewTip, TipDirection, TipEntity};
use crate::error::{StoreError, StoreResult};
use crate::repos::Store;

pub const MAX_TIP_MESSAGE_LEN: usize = 280;

pub struct TipService {
    store: Arc<dyn Store>,
    config: GameConfig,
}

impl TipService {
    pub fn new(store: Arc<dyn Store>, config: GameConfig) -> Self {
        Self { store, config }
    }

    /// Send a tip or gift of power tokens
    pub async fn send(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: i64,
        kind: TipKind,
        message: Option<String>,
    ) -> StoreResult<TipEntity> {
        validate_amount(amount)?;
        if sender_id == recipient_id {
            return Err(StoreError::validation("cannot tip yourself"));
        }
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        if message
            .as_ref()
            .map_or(false, |m| m.chars().count() > MAX_TIP_MESSAGE_LEN)
        {
            return Err(StoreError::validation(format!(
                "tip message must be at most {} characters",
                MAX_TIP_MESSAGE_LEN
            )));
        }

        let label = kind.as_str();
        let tip = self
            .store
            .send_tip(
                NewTip {
                    sender_id,
                    recipient_id,
                    amount,
                    kind: label.to_string(),
                    message,
                },
                Box::new(move |sender, recipient| {
                    let sent = sender
                        .debit_tokens(amount, TransactionKind::TipSent, format!("Sent {}", label))?
                        .with_counterparty(recipient.id);
                    let received = recipient
                        .credit_tokens(amount, TransactionKind::TipReceived, format!("Received {}", label))?
                        .with_counterparty(sender.id);
                    Ok(vec![sent, received])
                }),
            )
            .await?;

        info!(
            player_id = %sender_id,
            operation = operations::TIP,
            amount,
            recipient_id = %recipient_id,
            kind = label,
            "Tip sent"
        );
        Ok(tip)
    }

    pub async fn list(
        &self,
        player_id: Uuid,
        direction: TipDirection,
        limit: Option<i64>,
    ) -> StoreResult<Vec<TipEntity>> {
        self.store
            .list_tips(player_id, direction, self.config.page_size(limit))
            .await
    }
}

//! People Power Store
//!
//! Persistence and the service layer for the People Power platform.
//!
//! # Backends
//!
//! - [`MemoryStore`]: everything behind one lock; used by tests and by the
//!   API when no database URL is configured
//! - [`PgStore`]: PostgreSQL through `sqlx`, one transaction per mutation
//!
//! # Usage
//!
//! ```ignore
//! use pp_store::{MemoryStore, Services};
//! use pp_core::GameConfig;
//! use std::sync::Arc;
//!
//! async fn example() -> Result<(), pp_store::StoreError> {
//!     let services = Services::new(Arc::new(MemoryStore::new()), GameConfig::default());
//!     let login = services.game.login(42, "alice").await?;
//!     let tap = services.game.tap(login.player.id, 10).await?;
//!     println!("earned {}", tap.tokens_earned);
//!     Ok(())
//! }
//! ```

pub mod entities;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repos;
pub mod schema;
pub mod services;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::{PgConfig, PgStore, DEFAULT_MAX_CONNECTIONS};
pub use repos::Store;
pub use services::Services;

//! Row entities
//!
//! Each struct maps one-to-one onto a table in [`crate::schema`]. Enum-like
//! columns are stored as their `as_str()` names.

pub mod game;
pub mod growth;
pub mod ledger;
pub mod marketplace;
pub mod movement;
pub mod player;
pub mod shop;
pub mod social;

pub use game::*;
pub use growth::*;
pub use ledger::*;
pub use marketplace::*;
pub use movement::*;
pub use player::*;
pub use shop::*;
pub use social::*;

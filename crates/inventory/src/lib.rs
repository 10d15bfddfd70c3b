//! Inventory domain module: material masters and on-hand stock.
//!
//! Deterministic domain logic only (no IO, no storage).

pub mod item;

pub use item::{
    AdjustStock, InventoryCommand, InventoryEvent, InventoryItem, ItemRegistered, RegisterItem,
    StockAdjusted, StockPolicy,
};

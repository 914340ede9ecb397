// Shared domain types — used by the engine, the store and the dashboard.
// None of those layers depends on another; all import from this module.

pub mod item;

pub use item::*;

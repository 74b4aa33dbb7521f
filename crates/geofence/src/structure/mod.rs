//! Structures and the forest they form.
//!
//! - `types`: the `Structure` record, its `TriggerBand` and `StructureType`.
//! - `hierarchy`: forest building, relationship queries, cycle-safe re-parenting.

pub mod hierarchy;
mod types;

pub use hierarchy::{
    ancestors, build_forest, can_reparent, descendants, relationships, set_parent, Relationships,
    TreeNode,
};
pub use types::{normalize_code, Structure, StructureType, TriggerBand};

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

// Runtime instance handles.
new_key_type! {
    /// Identifies a station placed in the kitchen.
    pub struct StationId;
    /// Identifies a live plate.
    pub struct PlateId;
}

/// Identifies an item definition in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identifies a recipe definition in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a meal definition in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MealId(pub u32);

/// Identifies a rank definition in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RankId(pub u32);

/// Identifies an active order. Sequential, so ids sort by creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

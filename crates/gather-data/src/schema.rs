//! Serde data file structs for kitchen content definitions.
//!
//! These structs define the on-disk format for items, recipes, meals and
//! ranks. They are deserialized from RON, JSON, or TOML data files and then
//! resolved into catalog definitions by the loader. Every cross-reference
//! is written as a display name.

use gather_core::catalog::{Complexity, IngredientCategory, PlateRole, Rgba, StationKind};
use serde::Deserialize;

fn default_true() -> bool {
    true
}

// ===========================================================================
// Items
// ===========================================================================

/// An item definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(default)]
    pub category: IngredientCategory,
    #[serde(default)]
    pub plate_role: PlateRole,
    /// Inventory stack limit. Omitted means the catalog default.
    #[serde(default)]
    pub max_stack: Option<u32>,
    #[serde(default = "default_true")]
    pub can_get_dirty: bool,
    /// False for tools and containers such as plates.
    #[serde(default = "default_true")]
    pub ingredient: bool,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// An (item, amount) line, supporting both the short tuple form and the
/// full form with named fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ItemAmountData {
    /// Short form: `("Flour", 2)`.
    Short(String, u32),
    Full { item: String, amount: u32 },
}

impl ItemAmountData {
    pub fn item(&self) -> &str {
        match self {
            ItemAmountData::Short(item, _) | ItemAmountData::Full { item, .. } => item,
        }
    }

    pub fn amount(&self) -> u32 {
        match self {
            ItemAmountData::Short(_, amount) | ItemAmountData::Full { amount, .. } => *amount,
        }
    }
}

fn default_steps() -> u32 {
    1
}

/// A recipe definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    #[serde(default)]
    pub stations: Vec<StationKind>,
    pub inputs: Vec<ItemAmountData>,
    /// Raw item that may replace the single input.
    #[serde(default)]
    pub alternate: Option<String>,
    pub outputs: Vec<ItemAmountData>,
    /// Seconds.
    #[serde(default)]
    pub cook_time: f64,
    #[serde(default = "default_steps")]
    pub progress_steps: u32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub vfx_colors: Option<[Rgba; 2]>,
}

// ===========================================================================
// Meals and ranks
// ===========================================================================

/// A meal definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct MealData {
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub categories: Vec<IngredientCategory>,
    #[serde(default)]
    pub complexity: Complexity,
}

/// A rank definition. Ranks unlock in file order.
#[derive(Debug, Clone, Deserialize)]
pub struct RankData {
    pub name: String,
    #[serde(default)]
    pub min_meals_delivered: u32,
    #[serde(default)]
    pub max_orders_active: u32,
    #[serde(default)]
    pub meals: Vec<String>,
}

// ===========================================================================
// TOML wrappers
// ===========================================================================

// TOML has no top-level arrays, so list files wrap them in a named table.

#[derive(Debug, Clone, Deserialize)]
pub struct TomlItems {
    pub items: Vec<ItemData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlRecipes {
    pub recipes: Vec<RecipeData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlMeals {
    pub meals: Vec<MealData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlRanks {
    pub ranks: Vec<RankData>,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_defaults() {
        let item: ItemData = ron::from_str(r#"(name: "Tomato")"#).unwrap();
        assert_eq!(item.category, IngredientCategory::None);
        assert_eq!(item.plate_role, PlateRole::Any);
        assert!(item.max_stack.is_none());
        assert!(item.can_get_dirty);
        assert!(item.ingredient);
    }

    #[test]
    fn item_enums_from_json() {
        let item: ItemData = serde_json::from_str(
            r#"{"name": "Water", "category": "Liquid", "can_get_dirty": false}"#,
        )
        .unwrap();
        assert_eq!(item.category, IngredientCategory::Liquid);
        assert!(!item.can_get_dirty);
    }

    #[test]
    fn recipe_lines_accept_both_forms() {
        let recipe: RecipeData = ron::from_str(
            r#"(
                name: "Dough",
                stations: [Mixing],
                inputs: [("Flour", 2), (item: "Water", amount: 1)],
                outputs: [("Dough", 1)],
                cook_time: 4.0,
            )"#,
        )
        .unwrap();
        assert_eq!(recipe.inputs[0].item(), "Flour");
        assert_eq!(recipe.inputs[0].amount(), 2);
        assert_eq!(recipe.inputs[1].item(), "Water");
        assert_eq!(recipe.inputs[1].amount(), 1);
        assert_eq!(recipe.progress_steps, 1);
        assert!(recipe.visible);
        assert_eq!(recipe.stations, vec![StationKind::Mixing]);
    }

    #[test]
    fn recipes_from_toml() {
        let wrapper: TomlRecipes = toml::from_str(
            r#"
[[recipes]]
name = "Sliced Tomato"
stations = ["Cutting"]
inputs = [["Tomato", 1]]
outputs = [{ item = "Sliced Tomato", amount = 1 }]
progress_steps = 3
vfx_colors = [[0.9, 0.1, 0.1, 1.0], [1.0, 0.4, 0.3, 1.0]]
"#,
        )
        .unwrap();
        let recipe = &wrapper.recipes[0];
        assert_eq!(recipe.progress_steps, 3);
        assert_eq!(recipe.outputs[0].item(), "Sliced Tomato");
        assert!(recipe.vfx_colors.is_some());
    }

    #[test]
    fn meal_and_rank_defaults() {
        let meal: MealData = ron::from_str(r#"(name: "Salad", categories: [Vegetable])"#).unwrap();
        assert!(meal.items.is_empty());
        assert_eq!(meal.complexity, Complexity::Easy);

        let rank: RankData = ron::from_str(r#"(name: "Apprentice")"#).unwrap();
        assert_eq!(rank.min_meals_delivered, 0);
        assert_eq!(rank.max_orders_active, 0);
    }
}

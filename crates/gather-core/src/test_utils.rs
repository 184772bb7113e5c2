//! Shared fixtures for tests: a small kitchen catalog with fixed ids.
//!
//! Registration order is fixed, so the id helpers below are stable.

use crate::catalog::*;
use crate::config::{KitchenConfig, OrderConfig};
use crate::fixed::secs;
use crate::id::{ItemId, MealId, RankId, RecipeId};

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

pub fn raw_egg() -> ItemId {
    ItemId(0)
}
pub fn cracked_egg() -> ItemId {
    ItemId(1)
}
pub fn omelet() -> ItemId {
    ItemId(2)
}
pub fn burnt_omelet() -> ItemId {
    ItemId(3)
}
pub fn flour() -> ItemId {
    ItemId(4)
}
pub fn water() -> ItemId {
    ItemId(5)
}
pub fn dough() -> ItemId {
    ItemId(6)
}
pub fn tomato() -> ItemId {
    ItemId(7)
}
pub fn sliced_tomato() -> ItemId {
    ItemId(8)
}
pub fn bread() -> ItemId {
    ItemId(9)
}
pub fn cheese() -> ItemId {
    ItemId(10)
}
pub fn salt() -> ItemId {
    ItemId(11)
}
pub fn plate_item() -> ItemId {
    ItemId(12)
}
pub fn lettuce() -> ItemId {
    ItemId(13)
}

// ---------------------------------------------------------------------------
// Recipes, meals, ranks
// ---------------------------------------------------------------------------

pub fn omelet_recipe() -> RecipeId {
    RecipeId(0)
}
pub fn burn_omelet_recipe() -> RecipeId {
    RecipeId(1)
}
pub fn slice_tomato_recipe() -> RecipeId {
    RecipeId(2)
}
pub fn dough_recipe() -> RecipeId {
    RecipeId(3)
}

pub fn omelet_plate() -> MealId {
    MealId(0)
}
pub fn sandwich() -> MealId {
    MealId(1)
}
pub fn tomato_toast() -> MealId {
    MealId(2)
}

pub fn apprentice() -> RankId {
    RankId(0)
}
pub fn line_cook() -> RankId {
    RankId(1)
}
pub fn chef() -> RankId {
    RankId(2)
}

/// Colours used by the tomato slicing recipe.
pub const SLICE_COLORS: [Rgba; 2] = [[0.9, 0.1, 0.1, 1.0], [1.0, 0.4, 0.3, 1.0]];

/// Builder with the sample catalog registered, for tests that add more.
pub fn sample_builder() -> CatalogBuilder {
    use IngredientCategory::*;

    let mut b = CatalogBuilder::new();
    let raw_egg = b.register_item(ItemDef::new("Raw Egg").category(Protein));
    let cracked = b.register_item(ItemDef::new("Cracked Egg").category(Protein));
    let omelet = b.register_item(
        ItemDef::new("Omelet")
            .category(Protein)
            .plate_role(PlateRole::Main),
    );
    let burnt = b.register_item(ItemDef::new("Burnt Omelet"));
    let flour = b.register_item(ItemDef::new("Flour").category(Carb));
    let water = b.register_item(ItemDef::new("Water").category(Liquid).always_clean());
    let dough = b.register_item(ItemDef::new("Dough").category(Carb));
    let tomato = b.register_item(ItemDef::new("Tomato").category(Vegetable));
    let sliced = b.register_item(
        ItemDef::new("Sliced Tomato")
            .category(Vegetable)
            .plate_role(PlateRole::Top),
    );
    let bread = b.register_item(
        ItemDef::new("Bread")
            .category(Carb)
            .plate_role(PlateRole::Main),
    );
    let cheese = b.register_item(
        ItemDef::new("Cheese")
            .category(Protein)
            .plate_role(PlateRole::Top),
    );
    b.register_item(ItemDef::new("Salt").category(Spice).always_clean());
    b.register_item(
        ItemDef::new("Plate")
            .not_ingredient()
            .always_clean()
            .max_stack(1),
    );
    b.register_item(ItemDef::new("Lettuce").category(Vegetable));

    b.register_recipe(
        RecipeDef::new("Omelet")
            .station(StationKind::FryingPan)
            .input(cracked, 1)
            .alternate(raw_egg)
            .output(omelet, 1)
            .cook_time(secs(5.0)),
    );
    b.register_recipe(
        RecipeDef::new("Burnt Omelet")
            .station(StationKind::FryingPan)
            .input(omelet, 1)
            .output(burnt, 1)
            .cook_time(secs(3.0))
            .hidden(),
    );
    b.register_recipe(
        RecipeDef::new("Sliced Tomato")
            .station(StationKind::Cutting)
            .input(tomato, 1)
            .output(sliced, 1)
            .progress_steps(3)
            .vfx_colors(SLICE_COLORS),
    );
    b.register_recipe(
        RecipeDef::new("Dough")
            .station(StationKind::Mixing)
            .input(flour, 2)
            .input(water, 1)
            .output(dough, 1)
            .cook_time(secs(4.0)),
    );

    let omelet_plate = b.register_meal(MealDef::new("Omelet Plate").item(omelet));
    let sandwich = b.register_meal(
        MealDef::new("Sandwich")
            .item(bread)
            .item(cheese)
            .category(Vegetable)
            .complexity(Complexity::Medium),
    );
    let toast = b.register_meal(
        MealDef::new("Tomato Toast")
            .item(bread)
            .item(sliced)
            .complexity(Complexity::Medium),
    );

    b.register_rank(
        RankDef::new("Apprentice", 0)
            .max_orders_active(2)
            .meal(omelet_plate),
    );
    b.register_rank(
        RankDef::new("Line Cook", 2)
            .max_orders_active(3)
            .meal(sandwich),
    );
    b.register_rank(RankDef::new("Chef", 5).meal(toast));
    b
}

pub fn sample_catalog() -> Catalog {
    sample_builder()
        .build()
        .expect("sample catalog is valid")
}

/// Deterministic config: orders every 10s, 100s windows, cheap stations.
pub fn test_config() -> KitchenConfig {
    KitchenConfig {
        orders: OrderConfig {
            min_interval: 10.0,
            max_interval: 10.0,
            min_window: 100.0,
            max_window: 100.0,
            ..OrderConfig::default()
        },
        ..KitchenConfig::default()
    }
}

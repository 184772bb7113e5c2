//! Immutable item, recipe, meal and rank definitions.
//!
//! A [`CatalogBuilder`] collects definitions during startup and validates
//! every cross-reference in [`CatalogBuilder::build`]. The resulting
//! [`Catalog`] is frozen and shared behind an `Arc` by the kitchen.
//!
//! Names resolve case- and space-insensitively, so `"Cracked Egg"`,
//! `"cracked egg"` and `"CrackedEgg"` all find the same item.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::fixed::Seconds;
use crate::id::*;

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Broad ingredient family used by category requirements on meals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IngredientCategory {
    Protein,
    Carb,
    Vegetable,
    Spice,
    Liquid,
    #[default]
    None,
}

impl IngredientCategory {
    pub fn label(self) -> &'static str {
        match self {
            IngredientCategory::Protein => "protein",
            IngredientCategory::Carb => "carb",
            IngredientCategory::Vegetable => "vegetable",
            IngredientCategory::Spice => "spice",
            IngredientCategory::Liquid => "liquid",
            IngredientCategory::None => "ingredient",
        }
    }
}

/// Where an ingredient sits on a plate. Presentation only, never matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlateRole {
    #[default]
    Any,
    Main,
    Top,
}

/// Meal difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Complexity {
    #[default]
    Easy,
    Medium,
    Hard,
    VeryHigh,
}

/// The kind of station a recipe runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StationKind {
    /// A plain counter. Holds anything, processes nothing.
    #[default]
    None,
    FryingPan,
    Oven,
    Pot,
    Cutting,
    Mixing,
    Washing,
}

impl StationKind {
    /// Pass-through stations hold items no recipe uses and accept dirty ones.
    pub fn is_pass_through(self) -> bool {
        matches!(self, StationKind::None | StationKind::Washing)
    }

    /// Stations driven by the timed cooking machine.
    pub fn is_cooking(self) -> bool {
        matches!(
            self,
            StationKind::FryingPan | StationKind::Oven | StationKind::Pot
        )
    }
}

/// RGBA colour used to tint processing effects.
pub type Rgba = [f32; 4];

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// An item definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDef {
    pub name: String,
    pub max_stack: u32,
    pub category: IngredientCategory,
    pub plate_role: PlateRole,
    pub can_get_dirty: bool,
    pub is_ingredient: bool,
}

impl ItemDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            max_stack: 20,
            category: IngredientCategory::None,
            plate_role: PlateRole::Any,
            can_get_dirty: true,
            is_ingredient: true,
        }
    }

    #[must_use]
    pub fn max_stack(mut self, max_stack: u32) -> Self {
        self.max_stack = max_stack.max(1);
        self
    }

    #[must_use]
    pub fn category(mut self, category: IngredientCategory) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn plate_role(mut self, role: PlateRole) -> Self {
        self.plate_role = role;
        self
    }

    /// The item never carries a dirty flag.
    #[must_use]
    pub fn always_clean(mut self) -> Self {
        self.can_get_dirty = false;
        self
    }

    /// Tools and containers (plates) that are not food.
    #[must_use]
    pub fn not_ingredient(mut self) -> Self {
        self.is_ingredient = false;
        self
    }
}

/// A recipe input or output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemAmount {
    pub item: ItemId,
    pub amount: u32,
}

impl ItemAmount {
    pub fn new(item: ItemId, amount: u32) -> Self {
        Self { item, amount }
    }
}

/// A recipe definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDef {
    pub name: String,
    pub stations: Vec<StationKind>,
    pub inputs: Vec<ItemAmount>,
    /// Raw item that may stand in for the single input.
    pub alternate_input: Option<ItemId>,
    pub outputs: Vec<ItemAmount>,
    pub cook_time: Seconds,
    pub progress_steps: u32,
    pub visible_in_cookbook: bool,
    pub vfx_colors: Option<[Rgba; 2]>,
}

impl RecipeDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stations: Vec::new(),
            inputs: Vec::new(),
            alternate_input: None,
            outputs: Vec::new(),
            cook_time: Seconds::ZERO,
            progress_steps: 1,
            visible_in_cookbook: true,
            vfx_colors: None,
        }
    }

    #[must_use]
    pub fn station(mut self, kind: StationKind) -> Self {
        if !self.stations.contains(&kind) {
            self.stations.push(kind);
        }
        self
    }

    #[must_use]
    pub fn input(mut self, item: ItemId, amount: u32) -> Self {
        self.inputs.push(ItemAmount::new(item, amount));
        self
    }

    #[must_use]
    pub fn alternate(mut self, item: ItemId) -> Self {
        self.alternate_input = Some(item);
        self
    }

    #[must_use]
    pub fn output(mut self, item: ItemId, amount: u32) -> Self {
        self.outputs.push(ItemAmount::new(item, amount));
        self
    }

    #[must_use]
    pub fn cook_time(mut self, time: Seconds) -> Self {
        self.cook_time = time;
        self
    }

    #[must_use]
    pub fn progress_steps(mut self, steps: u32) -> Self {
        self.progress_steps = steps.max(1);
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible_in_cookbook = false;
        self
    }

    #[must_use]
    pub fn vfx_colors(mut self, colors: [Rgba; 2]) -> Self {
        self.vfx_colors = Some(colors);
        self
    }

    /// Whether `item` is an input line or the alternate input.
    pub fn uses(&self, item: ItemId) -> bool {
        self.alternate_input == Some(item) || self.inputs.iter().any(|i| i.item == item)
    }

    /// The alternate input, only honoured on single-input recipes.
    pub fn substitute_for_single_input(&self) -> Option<ItemId> {
        if self.inputs.len() == 1 {
            self.alternate_input
        } else {
            None
        }
    }

    pub fn primary_output(&self) -> Option<ItemAmount> {
        self.outputs.first().copied()
    }
}

/// A meal customers can order.
#[derive(Debug, Clone, PartialEq)]
pub struct MealDef {
    pub name: String,
    pub items: Vec<ItemId>,
    pub categories: Vec<IngredientCategory>,
    pub complexity: Complexity,
}

impl MealDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: Vec::new(),
            categories: Vec::new(),
            complexity: Complexity::Easy,
        }
    }

    #[must_use]
    pub fn item(mut self, item: ItemId) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn category(mut self, category: IngredientCategory) -> Self {
        self.categories.push(category);
        self
    }

    #[must_use]
    pub fn complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    /// Number of plate ingredients the meal needs at minimum.
    pub fn required_count(&self) -> usize {
        self.items.len() + self.categories.len()
    }
}

/// A progression rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankDef {
    pub name: String,
    pub min_meals_delivered: u32,
    /// Order cap applied on unlock. Zero leaves the cap unchanged.
    pub max_orders_active: u32,
    pub meals: Vec<MealId>,
}

impl RankDef {
    pub fn new(name: &str, min_meals_delivered: u32) -> Self {
        Self {
            name: name.to_string(),
            min_meals_delivered,
            max_orders_active: 0,
            meals: Vec::new(),
        }
    }

    #[must_use]
    pub fn max_orders_active(mut self, max: u32) -> Self {
        self.max_orders_active = max;
        self
    }

    #[must_use]
    pub fn meal(mut self, meal: MealId) -> Self {
        self.meals.push(meal);
        self
    }
}

/// Normalizes a display name into a lookup key.
pub fn name_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Catalog`].
/// Three-phase lifecycle: registration -> lookup/validation -> `build()`.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<ItemDef>,
    item_names: HashMap<String, ItemId>,
    recipes: Vec<RecipeDef>,
    recipe_names: HashMap<String, RecipeId>,
    meals: Vec<MealDef>,
    meal_names: HashMap<String, MealId>,
    ranks: Vec<RankDef>,
    duplicates: Vec<String>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_item(&mut self, def: ItemDef) -> ItemId {
        let id = ItemId(self.items.len() as u32);
        self.note_name(&def.name, |b, key| b.item_names.insert(key, id).is_some());
        self.items.push(def);
        id
    }

    pub fn register_recipe(&mut self, def: RecipeDef) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.note_name(&def.name, |b, key| b.recipe_names.insert(key, id).is_some());
        self.recipes.push(def);
        id
    }

    pub fn register_meal(&mut self, def: MealDef) -> MealId {
        let id = MealId(self.meals.len() as u32);
        self.note_name(&def.name, |b, key| b.meal_names.insert(key, id).is_some());
        self.meals.push(def);
        id
    }

    /// Ranks unlock in registration order.
    pub fn register_rank(&mut self, def: RankDef) -> RankId {
        let id = RankId(self.ranks.len() as u32);
        self.ranks.push(def);
        id
    }

    fn note_name(&mut self, name: &str, insert: impl FnOnce(&mut Self, String) -> bool) {
        if insert(self, name_key(name)) {
            self.duplicates.push(name.to_string());
        }
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_names.get(&name_key(name)).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_names.get(&name_key(name)).copied()
    }

    pub fn meal_id(&self, name: &str) -> Option<MealId> {
        self.meal_names.get(&name_key(name)).copied()
    }

    /// Validate every reference and freeze the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if let Some(name) = self.duplicates.first() {
            return Err(CatalogError::DuplicateName(name.clone()));
        }
        let item_count = self.items.len() as u32;
        let check_item = |item: ItemId| {
            if item.0 < item_count {
                Ok(())
            } else {
                Err(CatalogError::InvalidItemRef(item))
            }
        };

        for recipe in &self.recipes {
            for line in recipe.inputs.iter().chain(&recipe.outputs) {
                check_item(line.item)?;
            }
            if let Some(alt) = recipe.alternate_input {
                check_item(alt)?;
                if recipe.inputs.len() != 1 {
                    return Err(CatalogError::AlternateOnMultiInput(recipe.name.clone()));
                }
            }
            if recipe.outputs.is_empty() {
                return Err(CatalogError::NoOutputs(recipe.name.clone()));
            }
        }
        for meal in &self.meals {
            for &item in &meal.items {
                check_item(item)?;
            }
        }
        let meal_count = self.meals.len() as u32;
        for rank in &self.ranks {
            if let Some(bad) = rank.meals.iter().find(|m| m.0 >= meal_count) {
                return Err(CatalogError::InvalidMealRef(*bad));
            }
        }

        let mut by_station: HashMap<StationKind, Vec<RecipeId>> = HashMap::new();
        for (index, recipe) in self.recipes.iter().enumerate() {
            for kind in &recipe.stations {
                by_station
                    .entry(*kind)
                    .or_default()
                    .push(RecipeId(index as u32));
            }
        }
        let all_recipes = (0..self.recipes.len() as u32).map(RecipeId).collect();

        Ok(Catalog {
            items: self.items,
            item_names: self.item_names,
            recipes: self.recipes,
            recipe_names: self.recipe_names,
            meals: self.meals,
            meal_names: self.meal_names,
            ranks: self.ranks,
            by_station,
            all_recipes,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after build.
#[derive(Debug)]
pub struct Catalog {
    items: Vec<ItemDef>,
    item_names: HashMap<String, ItemId>,
    recipes: Vec<RecipeDef>,
    recipe_names: HashMap<String, RecipeId>,
    meals: Vec<MealDef>,
    meal_names: HashMap<String, MealId>,
    ranks: Vec<RankDef>,
    by_station: HashMap<StationKind, Vec<RecipeId>>,
    all_recipes: Vec<RecipeId>,
}

impl Catalog {
    pub fn get_item(&self, id: ItemId) -> Option<&ItemDef> {
        self.items.get(id.0 as usize)
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn get_meal(&self, id: MealId) -> Option<&MealDef> {
        self.meals.get(id.0 as usize)
    }

    pub fn get_rank(&self, id: RankId) -> Option<&RankDef> {
        self.ranks.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_names.get(&name_key(name)).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_names.get(&name_key(name)).copied()
    }

    pub fn meal_id(&self, name: &str) -> Option<MealId> {
        self.meal_names.get(&name_key(name)).copied()
    }

    /// Display name of an item, or `"?"` for an unknown id.
    pub fn item_name(&self, id: ItemId) -> &str {
        self.get_item(id).map_or("?", |def| def.name.as_str())
    }

    /// Whether the item's dirty flag can ever be set.
    pub fn can_get_dirty(&self, id: ItemId) -> bool {
        self.get_item(id).is_some_and(|def| def.can_get_dirty)
    }

    pub fn max_stack(&self, id: ItemId) -> u32 {
        self.get_item(id).map_or(1, |def| def.max_stack)
    }

    pub fn category(&self, id: ItemId) -> IngredientCategory {
        self.get_item(id)
            .map_or(IngredientCategory::None, |def| def.category)
    }

    /// Recipes valid at a station kind, in registration order. A kind with
    /// no recipes of its own gets the full list.
    pub fn recipes_for_station(&self, kind: StationKind) -> &[RecipeId] {
        match self.by_station.get(&kind) {
            Some(list) if !list.is_empty() => list,
            _ => &self.all_recipes,
        }
    }

    pub fn recipe_ids(&self) -> impl Iterator<Item = RecipeId> + '_ {
        self.all_recipes.iter().copied()
    }

    pub fn rank_ids(&self) -> impl Iterator<Item = RankId> {
        (0..self.ranks.len() as u32).map(RankId)
    }

    pub fn visible_recipe_count(&self) -> usize {
        self.recipes.iter().filter(|r| r.visible_in_cookbook).count()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn meal_count(&self) -> usize {
        self.meals.len()
    }

    pub fn rank_count(&self) -> usize {
        self.ranks.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate definition name: {0}")]
    DuplicateName(String),
    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemId),
    #[error("invalid meal reference: {0:?}")]
    InvalidMealRef(MealId),
    #[error("recipe {0} declares an alternate input but has more than one input")]
    AlternateOnMultiInput(String),
    #[error("recipe {0} has no outputs")]
    NoOutputs(String),
}

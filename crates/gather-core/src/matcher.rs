//! Recipe matching.
//!
//! Pure functions over the catalog: given the item types held by a station
//! and the station's candidate recipes, find the recipe they satisfy.
//! Quantities are not compared here; the mixer checks them separately.

use crate::catalog::Catalog;
use crate::id::{ItemId, RecipeId};

/// Find the first candidate whose inputs pair up with `held`.
///
/// Both lists are sorted by item name and compared pairwise. A held item
/// matches its paired input by identity, or by being the recipe's alternate
/// input when the recipe has exactly one input. Recipes with no inputs
/// never match.
pub fn find_match(catalog: &Catalog, held: &[ItemId], candidates: &[RecipeId]) -> Option<RecipeId> {
    if held.is_empty() {
        return None;
    }
    let held = sorted_by_name(catalog, held.iter().copied());

    candidates.iter().copied().find(|&id| {
        let Some(recipe) = catalog.get_recipe(id) else {
            return false;
        };
        if recipe.inputs.len() != held.len() {
            return false;
        }
        let required = sorted_by_name(catalog, recipe.inputs.iter().map(|line| line.item));
        let alternate = recipe.substitute_for_single_input();
        held.iter()
            .zip(&required)
            .all(|(h, r)| h == r || alternate == Some(*h))
    })
}

/// Whether any candidate uses `item` as an input or alternate input.
pub fn any_recipe_uses(catalog: &Catalog, item: ItemId, candidates: &[RecipeId]) -> bool {
    candidates
        .iter()
        .filter_map(|id| catalog.get_recipe(*id))
        .any(|recipe| recipe.uses(item))
}

/// Whether adding `candidate` to `occupants` still leaves a subset of some
/// recipe's inputs.
///
/// With no occupants, any recipe listing the candidate as an input accepts
/// it. Otherwise the distinct occupant types plus the candidate must fit
/// within one recipe's input types.
pub fn can_accept_as_next(
    catalog: &Catalog,
    occupants: &[ItemId],
    candidate: ItemId,
    candidates: &[RecipeId],
) -> bool {
    let recipes = || candidates.iter().filter_map(|id| catalog.get_recipe(*id));

    if occupants.is_empty() {
        return recipes().any(|r| r.inputs.iter().any(|line| line.item == candidate));
    }

    let mut combined: Vec<ItemId> = Vec::with_capacity(occupants.len() + 1);
    for item in occupants.iter().copied().chain(std::iter::once(candidate)) {
        if !combined.contains(&item) {
            combined.push(item);
        }
    }

    recipes().any(|recipe| {
        recipe.inputs.len() >= combined.len()
            && combined
                .iter()
                .all(|item| recipe.inputs.iter().any(|line| line.item == *item))
    })
}

fn sorted_by_name(catalog: &Catalog, items: impl Iterator<Item = ItemId>) -> Vec<ItemId> {
    let mut items: Vec<ItemId> = items.collect();
    items.sort_by(|a, b| catalog.item_name(*a).cmp(catalog.item_name(*b)).then(a.cmp(b)));
    items
}

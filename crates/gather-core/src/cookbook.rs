use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, StationKind};
use crate::id::RecipeId;

/// Recipes the player has produced at least once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookbook {
    discovered: Vec<RecipeId>,
}

impl Cookbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completion. Returns true the first time a visible recipe
    /// is seen; hidden recipes are never recorded.
    pub fn record(&mut self, catalog: &Catalog, recipe: RecipeId) -> bool {
        let visible = catalog
            .get_recipe(recipe)
            .is_some_and(|r| r.visible_in_cookbook);
        if !visible || self.discovered.contains(&recipe) {
            return false;
        }
        self.discovered.push(recipe);
        true
    }

    pub fn is_discovered(&self, recipe: RecipeId) -> bool {
        self.discovered.contains(&recipe)
    }

    pub fn discovered(&self) -> &[RecipeId] {
        &self.discovered
    }

    pub fn discovered_for_station(&self, catalog: &Catalog, kind: StationKind) -> Vec<RecipeId> {
        let at_station = catalog.recipes_for_station(kind);
        self.discovered
            .iter()
            .copied()
            .filter(|id| at_station.contains(id))
            .collect()
    }

    /// Discovered over visible, for the cookbook's progress display.
    pub fn progress(&self, catalog: &Catalog) -> (usize, usize) {
        (self.discovered.len(), catalog.visible_recipe_count())
    }
}

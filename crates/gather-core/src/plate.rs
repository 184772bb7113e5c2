//! Plates: a short ordered list of single-unit ingredients that can be
//! checked against a meal.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, MealDef, PlateRole};
use crate::id::ItemId;
use crate::rejection::{PlateMismatch, Rejection};
use crate::slot::Slot;

/// A plate instance. Lives in the kitchen's plate arena; slots refer to it
/// through [`crate::slot::SlotPayload::Plate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    /// The plate-as-an-item.
    item: ItemId,
    ingredients: Vec<Slot>,
    capacity: usize,
}

/// Visual placement of a plate's ingredients by plate role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlateLayout {
    pub main: Option<ItemId>,
    pub any: Vec<ItemId>,
    pub top: Vec<ItemId>,
}

impl Plate {
    pub fn new(item: ItemId, capacity: usize) -> Self {
        Self {
            item,
            ingredients: Vec::new(),
            capacity,
        }
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ingredients(&self) -> &[Slot] {
        &self.ingredients
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ingredients.len() >= self.capacity
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.ingredients.iter().filter_map(Slot::item).collect()
    }

    /// Move exactly one unit of `source` onto the plate.
    pub fn add_ingredient(&mut self, source: &mut Slot, remove_from_source: bool) -> Result<(), Rejection> {
        let Some(item) = source.item() else {
            return Err(Rejection::NothingToTake);
        };
        if source.is_plate() {
            return Err(Rejection::WrongStation { item });
        }
        if self.is_full() {
            return Err(Rejection::PlateFull);
        }
        if source.is_dirty() {
            return Err(Rejection::DirtyOnPlate { item });
        }
        self.ingredients.push(Slot::new(item, 1));
        if remove_from_source {
            source.remove_amount(1);
        }
        Ok(())
    }

    pub fn remove_last(&mut self) -> Option<Slot> {
        self.ingredients.pop()
    }

    pub fn last(&self) -> Option<&Slot> {
        self.ingredients.last()
    }

    /// Put an ingredient back on top, bypassing the checks. Used to undo a
    /// `remove_last` whose destination refused it.
    pub(crate) fn restore_last(&mut self, slot: Slot) {
        if !slot.is_empty() {
            self.ingredients.push(slot);
        }
    }

    pub fn layout(&self, catalog: &Catalog) -> PlateLayout {
        let mut layout = PlateLayout::default();
        for item in self.ingredients.iter().filter_map(Slot::item) {
            match catalog.get_item(item).map(|def| def.plate_role) {
                Some(PlateRole::Main) if layout.main.is_none() => layout.main = Some(item),
                Some(PlateRole::Top) => layout.top.push(item),
                _ => layout.any.push(item),
            }
        }
        layout
    }

    /// Check the plate against a meal. Exact items are checked in the
    /// meal's order, then the ingredient count, then categories; the first
    /// miss is reported. Each listed item or category claims its own
    /// ingredient, so a meal naming an item twice needs two of it. Surplus
    /// ingredients are tolerated.
    pub fn matches_meal(&self, catalog: &Catalog, meal: &MealDef) -> Result<(), PlateMismatch> {
        if self.ingredients.is_empty() {
            return Err(PlateMismatch::Empty);
        }
        let mut remaining = self.item_ids();
        for &required in &meal.items {
            let Some(pos) = remaining.iter().position(|item| *item == required) else {
                return Err(PlateMismatch::MissingItem(required));
            };
            remaining.remove(pos);
        }

        let need = meal.required_count();
        if self.ingredients.len() < need {
            return Err(PlateMismatch::TooFewIngredients {
                have: self.ingredients.len(),
                need,
            });
        }
        for &category in &meal.categories {
            let Some(pos) = remaining
                .iter()
                .position(|item| catalog.category(*item) == category)
            else {
                return Err(PlateMismatch::MissingCategory(category));
            };
            remaining.remove(pos);
        }
        Ok(())
    }
}

//! Player actions that were refused.
//!
//! A rejection is not an error: nothing changes in the kitchen and the
//! player sees a short thought explaining why.

use crate::catalog::{Catalog, IngredientCategory, StationKind};
use crate::id::ItemId;

/// Why a plate does not satisfy a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateMismatch {
    Empty,
    TooFewIngredients { have: usize, need: usize },
    MissingItem(ItemId),
    MissingCategory(IngredientCategory),
    NoActiveOrders,
}

/// A refused player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No recipe at this station uses the item.
    WrongStation { item: ItemId },
    /// Dirty items only go on washing stations and counters.
    Dirty { item: ItemId },
    StationFull,
    /// The matching stack already holds the per-type cap.
    StackFull { item: ItemId },
    InventoryFull,
    /// A plate is already in hand.
    HandsFull,
    /// The item would not lead to any recipe with what is already there.
    WontCombine { kind: StationKind },
    PlateFull,
    DirtyOnPlate { item: ItemId },
    NoPlate,
    NothingToTake,
    Plate(PlateMismatch),
    NotEnoughMoney { cost: u32 },
    UnknownStation,
}

impl Rejection {
    /// The thought shown to the player.
    pub fn thought(&self, catalog: &Catalog) -> String {
        match self {
            Rejection::WrongStation { .. } => "Hmm... I don't think this will work here.".into(),
            Rejection::Dirty { .. } => "This ingredient is dirty, I need to wash it first.".into(),
            Rejection::StationFull => "I can't fit any more ingredients...".into(),
            Rejection::StackFull { item } => {
                format!("There's no room for more {} here.", catalog.item_name(*item))
            }
            Rejection::InventoryFull => "I need to free up some space in my inventory.".into(),
            Rejection::HandsFull => "My hands are full.".into(),
            Rejection::WontCombine { kind } if *kind == StationKind::Mixing => {
                "This ingredient won't mix into anything useful...".into()
            }
            Rejection::WontCombine { .. } => "This ingredient won't work with this...".into(),
            Rejection::PlateFull => "This plate is full.".into(),
            Rejection::DirtyOnPlate { .. } => {
                "I need to wash this ingredient before serving it!".into()
            }
            Rejection::NoPlate => "I need a plate to serve this.".into(),
            Rejection::NothingToTake => "There's nothing to take here.".into(),
            Rejection::Plate(mismatch) => mismatch.thought(catalog),
            Rejection::NotEnoughMoney { cost } => format!("I need {cost} coins for that."),
            Rejection::UnknownStation => "There's nothing there.".into(),
        }
    }
}

impl PlateMismatch {
    pub fn thought(&self, catalog: &Catalog) -> String {
        match self {
            PlateMismatch::Empty | PlateMismatch::TooFewIngredients { .. } => {
                "It does not seem like this meal has been ordered.".into()
            }
            PlateMismatch::MissingItem(item) => {
                let name = catalog.item_name(*item);
                format!("I need to add {} {name} before serving.", article(name))
            }
            PlateMismatch::MissingCategory(category) => {
                format!("I need to add some sort of {}.", category.label())
            }
            PlateMismatch::NoActiveOrders => "Nobody has ordered anything yet.".into(),
        }
    }
}

impl From<PlateMismatch> for Rejection {
    fn from(mismatch: PlateMismatch) -> Self {
        Rejection::Plate(mismatch)
    }
}

/// "an" before a vowel, "a" otherwise.
pub fn article(name: &str) -> &'static str {
    match name.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogBuilder, ItemDef};

    #[test]
    fn article_follows_first_letter() {
        assert_eq!(article("Egg"), "an");
        assert_eq!(article("onion"), "an");
        assert_eq!(article("Cheese"), "a");
        assert_eq!(article(""), "a");
    }

    #[test]
    fn missing_item_names_the_ingredient() {
        let mut b = CatalogBuilder::new();
        let cheese = b.register_item(ItemDef::new("Cheese"));
        let egg = b.register_item(ItemDef::new("Egg"));
        let catalog = b.build().unwrap();
        assert_eq!(
            Rejection::from(PlateMismatch::MissingItem(cheese)).thought(&catalog),
            "I need to add a Cheese before serving."
        );
        assert_eq!(
            PlateMismatch::MissingItem(egg).thought(&catalog),
            "I need to add an Egg before serving."
        );
        assert_eq!(
            PlateMismatch::MissingCategory(IngredientCategory::Vegetable).thought(&catalog),
            "I need to add some sort of vegetable."
        );
    }

    #[test]
    fn mixer_and_pan_phrase_differently() {
        let catalog = CatalogBuilder::new().build().unwrap();
        let mixer = Rejection::WontCombine { kind: StationKind::Mixing }.thought(&catalog);
        let pan = Rejection::WontCombine { kind: StationKind::FryingPan }.thought(&catalog);
        assert_ne!(mixer, pan);
    }
}

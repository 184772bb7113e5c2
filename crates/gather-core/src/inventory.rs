use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{Catalog, ItemAmount};
use crate::id::{ItemId, PlateId};
use crate::slot::{Slot, SlotPayload};

/// The player's hands: a fixed row of slots, one of them selected, plus an
/// optional plate carried on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Slot>,
    selected: usize,
    held_plate: Option<PlateId>,
}

impl Inventory {
    /// A size of 0 is clamped to 1.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![Slot::empty(); size.max(1)],
            selected: 0,
            held_plate: None,
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Slot::is_empty)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> &Slot {
        &self.slots[self.selected]
    }

    pub fn selected_mut(&mut self) -> &mut Slot {
        &mut self.slots[self.selected]
    }

    /// Select a slot. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.slots.len() {
            warn!(index, size = self.slots.len(), "slot index out of range");
            return false;
        }
        self.selected = index;
        true
    }

    pub fn held_plate(&self) -> Option<PlateId> {
        self.held_plate
    }

    pub fn set_held_plate(&mut self, plate: Option<PlateId>) {
        self.held_plate = plate;
    }

    /// Store as much of `source` as fits: top up matching stacks first,
    /// then fill empty slots, never past the item's max stack. Returns
    /// true when at least one unit was stored.
    pub fn try_add(&mut self, catalog: &Catalog, source: &mut Slot, remove_from_source: bool) -> bool {
        let Some(item) = source.item() else {
            return false;
        };
        let max = catalog.max_stack(item);
        let mut left = source.amount();

        for slot in self.slots.iter_mut().filter(|s| s.stacks_with(source)) {
            if left == 0 {
                break;
            }
            let add = max.saturating_sub(slot.amount()).min(left);
            if add > 0 {
                slot.add_amount(add);
                if source.timer() > slot.timer() {
                    slot.set_timer(source.timer());
                }
                left -= add;
            }
        }
        for slot in self.slots.iter_mut().filter(|s| s.is_empty()) {
            if left == 0 {
                break;
            }
            let add = max.min(left);
            *slot = Slot::new(item, add)
                .with_dirty(source.is_dirty())
                .with_timer(source.timer())
                .with_payload(SlotPayload::Item);
            left -= add;
        }

        let stored = source.amount() - left;
        if remove_from_source {
            source.remove_amount(stored);
        }
        stored > 0
    }

    /// An empty slot, or a non-full stack of the same item and dirtiness.
    pub fn has_space_for(&self, catalog: &Catalog, item: ItemId, dirty: bool) -> bool {
        let max = catalog.max_stack(item);
        self.slots.iter().any(|slot| {
            slot.is_empty()
                || (slot.item() == Some(item) && slot.is_dirty() == dirty && slot.amount() < max)
        })
    }

    /// Total amount of `item` across all slots.
    pub fn count(&self, item: ItemId) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.item() == Some(item))
            .map(Slot::amount)
            .sum()
    }

    pub fn has_items(&self, cost: &[ItemAmount]) -> bool {
        cost.iter().all(|line| self.count(line.item) >= line.amount)
    }

    /// Remove a set of items, all or nothing.
    pub fn remove_items(&mut self, cost: &[ItemAmount]) -> bool {
        if !self.has_items(cost) {
            return false;
        }
        for line in cost {
            let mut left = line.amount;
            for slot in self.slots.iter_mut().filter(|s| s.item() == Some(line.item)) {
                if left == 0 {
                    break;
                }
                left -= slot.remove_amount(left);
            }
        }
        true
    }

    /// Empty the selected slot, returning what it held.
    pub fn take_selected(&mut self) -> Slot {
        self.slots[self.selected].take()
    }

    /// Replace a slot wholesale. Used when restoring a save.
    pub(crate) fn put(&mut self, index: usize, slot: Slot) {
        if let Some(target) = self.slots.get_mut(index) {
            *target = slot;
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ItemAmount};
use crate::fixed::Seconds;
use crate::id::{ItemId, PlateId};

/// What a slot looks like in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotPayload {
    /// No visible counterpart (empty slots, liquids on a station).
    #[default]
    None,
    /// A plain item with a visible counterpart.
    Item,
    /// The slot is a plate carrying its own ingredient list.
    Plate(PlateId),
}

/// The atomic unit of (item, amount, dirty) moved between containers.
///
/// Invariant: `amount > 0` exactly when `item` is set. Any operation that
/// drops the amount to zero clears the slot, including its payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    item: Option<ItemId>,
    amount: u32,
    dirty: bool,
    payload: SlotPayload,
    /// Remaining cook time carried with the slot between stations.
    timer: Seconds,
}

impl Slot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A visible stack of `amount` items. Zero yields an empty slot.
    pub fn new(item: ItemId, amount: u32) -> Self {
        let mut slot = Self::default();
        slot.set_item(item, amount);
        slot
    }

    /// A slot standing for a plate instance.
    pub fn plate(plate_item: ItemId, plate: PlateId) -> Self {
        let mut slot = Self::new(plate_item, 1);
        slot.payload = SlotPayload::Plate(plate);
        slot
    }

    #[must_use]
    pub fn with_dirty(mut self, dirty: bool) -> Self {
        if self.item.is_some() {
            self.dirty = dirty;
        }
        self
    }

    #[must_use]
    pub fn with_timer(mut self, timer: Seconds) -> Self {
        self.timer = timer;
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: SlotPayload) -> Self {
        if self.item.is_some() {
            self.payload = payload;
        }
        self
    }

    pub fn item(&self) -> Option<ItemId> {
        self.item
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn payload(&self) -> SlotPayload {
        self.payload
    }

    pub fn timer(&self) -> Seconds {
        self.timer
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    pub fn plate_id(&self) -> Option<PlateId> {
        match self.payload {
            SlotPayload::Plate(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_plate(&self) -> bool {
        self.plate_id().is_some()
    }

    pub fn item_amount(&self) -> Option<ItemAmount> {
        self.item.map(|item| ItemAmount::new(item, self.amount))
    }

    /// Same item and same dirtiness, so the two may share a stack.
    pub fn stacks_with(&self, other: &Slot) -> bool {
        self.item.is_some() && self.item == other.item && self.dirty == other.dirty
    }

    /// Replace the contents, keeping dirtiness and payload. A zero amount
    /// clears the slot.
    pub fn set_item(&mut self, item: ItemId, amount: u32) {
        if amount == 0 {
            self.clear();
            return;
        }
        if self.item.is_none() && self.payload == SlotPayload::None {
            self.payload = SlotPayload::Item;
        }
        self.item = Some(item);
        self.amount = amount;
    }

    /// Add to a non-empty slot. Adding to an empty slot does nothing.
    pub fn add_amount(&mut self, amount: u32) {
        if self.item.is_some() {
            self.amount = self.amount.saturating_add(amount);
        }
    }

    /// Remove up to `amount` and return how many were removed. Removing
    /// everything clears the slot.
    pub fn remove_amount(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.amount);
        self.amount -= removed;
        if self.amount == 0 {
            self.clear();
        }
        removed
    }

    /// Set the dirty flag. Ignored for items that cannot get dirty.
    pub fn set_dirty(&mut self, catalog: &Catalog, dirty: bool) {
        match self.item {
            Some(item) if !dirty || catalog.can_get_dirty(item) => self.dirty = dirty,
            _ => {}
        }
    }

    pub fn set_timer(&mut self, timer: Seconds) {
        self.timer = timer;
    }

    pub fn set_payload(&mut self, payload: SlotPayload) {
        if self.item.is_some() {
            self.payload = payload;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Move the whole slot out, leaving this one empty.
    pub fn take(&mut self) -> Slot {
        std::mem::take(self)
    }
}

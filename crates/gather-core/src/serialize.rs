//! Save games.
//!
//! A save is a versioned header followed by the persisted kitchen state,
//! encoded with `bitcode`. Catalog entries are written by name so a save
//! survives catalog reordering; names the loading catalog does not know
//! are skipped with a warning instead of failing the load.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::warn;

use crate::catalog::{Catalog, StationKind};
use crate::config::{ConfigError, KitchenConfig};
use crate::economy::Wallet;
use crate::fixed::{Seconds, Ticks};
use crate::id::{ItemId, PlateId};
use crate::kitchen::Kitchen;
use crate::plate::Plate;
use crate::processing::{CookState, ProcessingSnapshot};
use crate::rng::SimRng;
use crate::slot::{Slot, SlotPayload};
use crate::station::{Pose, Station, placed_payload};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a kitchen save.
pub const SAVE_MAGIC: u32 = 0x6A6E_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while writing a save.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur while reading a save.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SAVE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("save from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Save header
// ---------------------------------------------------------------------------

/// Header at the start of every save.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaveHeader {
    pub magic: u32,
    pub version: u32,
    /// Steps taken when the save was written.
    pub tick: Ticks,
    /// Simulated seconds when the save was written.
    pub elapsed: Seconds,
}

impl SaveHeader {
    pub fn new(tick: Ticks, elapsed: Seconds) -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: FORMAT_VERSION,
            tick,
            elapsed,
        }
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if self.magic != SAVE_MAGIC {
            return Err(LoadError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(LoadError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(LoadError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Persisted shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedOrder {
    pub meal: String,
    pub remaining: Seconds,
    pub total: Seconds,
}

/// One occupied slot. `index` is the station position or inventory slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSlot {
    pub item: String,
    pub amount: u32,
    pub dirty: bool,
    pub timer: Seconds,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlate {
    pub item: String,
    pub ingredients: Vec<SavedSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedStation {
    pub kind: StationKind,
    pub capacity: u32,
    pub pose: Pose,
    pub ingredients: Vec<SavedSlot>,
    /// A plate resting on the station.
    pub plate: Option<SavedPlate>,
    /// Cutting or washing counter.
    pub progress: u32,
    /// Cooking or mixing countdown.
    pub timer: Seconds,
    pub recipe: Option<String>,
    pub cook_state: CookState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedInventory {
    pub slots: Vec<SavedSlot>,
    pub selected: u32,
    pub held_plate: Option<SavedPlate>,
}

/// Everything a save persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub header: SaveHeader,
    pub orders: Vec<SavedOrder>,
    pub next_order_in: Seconds,
    pub rng: SimRng,
    pub stations: Vec<SavedStation>,
    pub inventory: SavedInventory,
    pub money: u32,
    pub delivered: u32,
    pub unlocked_ranks: u32,
    pub discovered: Vec<String>,
}

impl SaveGame {
    /// Decode and validate a save.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        let save: SaveGame =
            bitcode::deserialize(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
        save.header.validate()?;
        Ok(save)
    }

    pub fn encode(&self) -> Result<Vec<u8>, SaveError> {
        bitcode::serialize(self).map_err(|e| SaveError::Encode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

fn save_slot(catalog: &Catalog, slot: &Slot, index: usize) -> Option<SavedSlot> {
    let item = slot.item()?;
    Some(SavedSlot {
        item: catalog.item_name(item).to_string(),
        amount: slot.amount(),
        dirty: slot.is_dirty(),
        timer: slot.timer(),
        index: index as u32,
    })
}

fn save_plate(catalog: &Catalog, plate: &Plate) -> SavedPlate {
    SavedPlate {
        item: catalog.item_name(plate.item()).to_string(),
        ingredients: plate
            .ingredients()
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| save_slot(catalog, slot, i))
            .collect(),
    }
}

impl Kitchen {
    /// Capture the persisted state.
    pub fn to_save_game(&self) -> SaveGame {
        let catalog = &self.catalog;

        let orders = self
            .orders
            .orders()
            .iter()
            .filter(|order| !order.is_finished())
            .filter_map(|order| {
                Some(SavedOrder {
                    meal: catalog.get_meal(order.meal())?.name.clone(),
                    remaining: order.remaining(),
                    total: order.total(),
                })
            })
            .collect();

        let stations = self
            .stations
            .values()
            .map(|station| {
                let mut plate = None;
                let mut ingredients = Vec::new();
                for (index, slot) in station.occupants().iter().enumerate() {
                    match slot.plate_id().and_then(|id| self.plates.get(id)) {
                        Some(p) => plate = Some(save_plate(catalog, p)),
                        None => ingredients.extend(save_slot(catalog, slot, index)),
                    }
                }
                let snapshot = station.snapshot();
                SavedStation {
                    kind: station.kind(),
                    capacity: station.stack().capacity() as u32,
                    pose: station.pose(),
                    ingredients,
                    plate,
                    progress: snapshot.progress,
                    timer: snapshot.timer,
                    recipe: snapshot
                        .recipe
                        .and_then(|id| catalog.get_recipe(id))
                        .map(|r| r.name.clone()),
                    cook_state: snapshot.cook_state,
                }
            })
            .collect();

        let inventory = SavedInventory {
            slots: self
                .inventory
                .slots()
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| save_slot(catalog, slot, i))
                .collect(),
            selected: self.inventory.selected_index() as u32,
            held_plate: self.held_plate().map(|p| save_plate(catalog, p)),
        };

        SaveGame {
            header: SaveHeader::new(self.tick, self.elapsed),
            orders,
            next_order_in: self.orders.next_order_in(),
            rng: self.orders.rng().clone(),
            stations,
            inventory,
            money: self.wallet.money(),
            delivered: self.ranks.delivered(),
            unlocked_ranks: self.ranks.unlocked().len() as u32,
            discovered: self
                .cookbook
                .discovered()
                .iter()
                .filter_map(|id| catalog.get_recipe(*id))
                .map(|r| r.name.clone())
                .collect(),
        }
    }

    /// Encode the kitchen as a save.
    pub fn save(&self) -> Result<Vec<u8>, SaveError> {
        self.to_save_game().encode()
    }

    /// Rebuild a kitchen from save bytes.
    pub fn load(catalog: Arc<Catalog>, config: KitchenConfig, bytes: &[u8]) -> Result<Kitchen, LoadError> {
        let save = SaveGame::decode(bytes)?;
        Self::from_save_game(catalog, config, save)
    }

    /// Rebuild a kitchen from a decoded save.
    pub fn from_save_game(catalog: Arc<Catalog>, config: KitchenConfig, save: SaveGame) -> Result<Kitchen, LoadError> {
        let mut kitchen = Kitchen::blank(Arc::clone(&catalog), config)?;
        kitchen.tick = save.header.tick;
        kitchen.elapsed = save.header.elapsed;

        // Progression first: ranks decide the order cap and meal pool.
        let ranks = kitchen
            .ranks
            .restore(&catalog, save.delivered, save.unlocked_ranks as usize);
        kitchen.apply_rank_unlocks(&ranks, false);
        kitchen.wallet = Wallet::new(save.money);
        for name in &save.discovered {
            match catalog.recipe_id(name) {
                Some(id) => {
                    kitchen.cookbook.record(&catalog, id);
                }
                None => warn!(recipe = %name, "unknown recipe in save, skipped"),
            }
        }

        for order in &save.orders {
            match catalog.meal_id(&order.meal) {
                Some(meal) => {
                    kitchen.orders.restore_order(meal, order.total, order.remaining);
                }
                None => warn!(meal = %order.meal, "unknown meal in save, order skipped"),
            }
        }
        kitchen
            .orders
            .restore_timing(save.next_order_in, save.rng.clone());

        let plate_capacity = kitchen.config.plate_capacity;
        for saved in &save.stations {
            let mut station = Station::new(
                &catalog,
                saved.kind,
                saved.capacity as usize,
                kitchen.config.per_type_cap,
                kitchen.config.washing_threshold,
                saved.pose,
            );
            let mut occupants: Vec<(usize, Slot)> = saved
                .ingredients
                .iter()
                .filter_map(|s| load_slot(&catalog, s).map(|slot| (s.index as usize, slot)))
                .collect();
            if let Some(plate) = &saved.plate
                && let Some((id, item)) = load_plate(&catalog, &mut kitchen.plates, plate, plate_capacity)
            {
                occupants.insert(0, (0, Slot::plate(item, id)));
            }
            let recipe = saved.recipe.as_deref().and_then(|name| {
                let id = catalog.recipe_id(name);
                if id.is_none() {
                    warn!(recipe = %name, "unknown recipe in save, progress reset");
                }
                id
            });
            let snapshot = ProcessingSnapshot {
                progress: saved.progress,
                timer: saved.timer,
                recipe,
                cook_state: saved.cook_state,
            };
            station.restore(&catalog, occupants, snapshot);
            kitchen.stations.insert(station);
        }

        for saved in &save.inventory.slots {
            if let Some(mut slot) = load_slot(&catalog, saved) {
                slot.set_payload(SlotPayload::Item);
                kitchen.inventory.put(saved.index as usize, slot);
            }
        }
        kitchen.inventory.select(save.inventory.selected as usize);
        if let Some(plate) = &save.inventory.held_plate
            && let Some((id, _)) = load_plate(&catalog, &mut kitchen.plates, plate, plate_capacity)
        {
            kitchen.inventory.set_held_plate(Some(id));
        }

        Ok(kitchen)
    }
}

// ---------------------------------------------------------------------------
// Restore helpers
// ---------------------------------------------------------------------------

fn load_slot(catalog: &Catalog, saved: &SavedSlot) -> Option<Slot> {
    let Some(item) = catalog.item_id(&saved.item) else {
        warn!(item = %saved.item, "unknown item in save, skipped");
        return None;
    };
    let mut slot = Slot::new(item, saved.amount)
        .with_timer(saved.timer)
        .with_payload(placed_payload(catalog, item));
    slot.set_dirty(catalog, saved.dirty);
    (!slot.is_empty()).then_some(slot)
}

fn load_plate(
    catalog: &Catalog,
    plates: &mut SlotMap<PlateId, Plate>,
    saved: &SavedPlate,
    capacity: usize,
) -> Option<(PlateId, ItemId)> {
    let Some(item) = catalog.item_id(&saved.item) else {
        warn!(item = %saved.item, "unknown plate item in save, plate skipped");
        return None;
    };
    let mut plate = Plate::new(item, capacity);
    for ingredient in &saved.ingredients {
        if let Some(slot) = load_slot(catalog, ingredient) {
            plate.restore_last(slot);
        }
    }
    Some((plates.insert(plate), item))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::secs;
    use crate::test_utils::*;

    fn kitchen() -> Kitchen {
        Kitchen::new(Arc::new(sample_catalog()), test_config()).unwrap()
    }

    #[test]
    fn header_rejects_bad_magic_and_versions() {
        let mut header = SaveHeader::new(0, Seconds::ZERO);
        assert!(header.validate().is_ok());
        header.version = FORMAT_VERSION + 1;
        assert!(matches!(header.validate(), Err(LoadError::FutureVersion(_))));
        header.version = 0;
        assert!(matches!(header.validate(), Err(LoadError::UnsupportedVersion(0))));
        header.magic = 0xDEAD_BEEF;
        assert!(matches!(header.validate(), Err(LoadError::InvalidMagic(0xDEAD_BEEF))));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            Kitchen::load(Arc::new(sample_catalog()), test_config(), &[1, 2, 3]),
            Err(LoadError::Decode(_))
        ));
    }

    #[test]
    fn save_load_keeps_progress() {
        let mut k = kitchen();
        let board = k.add_station(StationKind::Cutting, 1, Pose::at(1.0, 0.0, 2.0));
        k.step(secs(1.0));
        k.pick_up(tomato(), 1, false).unwrap();
        k.interact(board).unwrap();
        k.interact_alternate(board).unwrap();
        k.pick_up(flour(), 4, true).unwrap();

        let bytes = k.save().unwrap();
        let loaded = Kitchen::load(Arc::new(sample_catalog()), test_config(), &bytes).unwrap();

        assert_eq!(loaded.tick(), k.tick());
        assert_eq!(loaded.wallet().money(), k.wallet().money());
        assert_eq!(loaded.orders().orders().len(), 1);
        assert_eq!(loaded.orders().orders()[0].remaining(), k.orders().orders()[0].remaining());
        assert_eq!(loaded.orders().rng(), k.orders().rng());
        assert_eq!(loaded.inventory().count(flour()), 4);
        assert!(loaded.inventory().slot(0).unwrap().is_dirty());

        let (_, station) = loaded.stations().next().unwrap();
        assert_eq!(station.pose(), Pose::at(1.0, 0.0, 2.0));
        assert_eq!(station.occupants()[0].item(), Some(tomato()));
        assert_eq!(station.snapshot().progress, 1);
        assert_eq!(loaded.ranks().unlocked(), k.ranks().unlocked());
        assert_eq!(loaded.orders().max_active(), 2);
    }

    #[test]
    fn unknown_names_are_skipped() {
        let mut k = kitchen();
        k.step(secs(1.0));
        k.pick_up(cheese(), 1, false).unwrap();
        let mut save = k.to_save_game();
        save.orders[0].meal = "Mystery Stew".into();
        save.inventory.slots[0].item = "Moon Cheese".into();

        let loaded = Kitchen::from_save_game(Arc::new(sample_catalog()), test_config(), save).unwrap();
        assert!(loaded.orders().orders().is_empty());
        assert_eq!(loaded.inventory().count(cheese()), 0);
    }

    #[test]
    fn plates_survive_on_stations_and_in_hand() {
        let mut k = kitchen();
        let counter = k.add_station(StationKind::None, 2, Pose::default());
        k.take_plate(plate_item()).unwrap();
        k.pick_up(bread(), 1, false).unwrap();
        k.interact(counter).unwrap();
        k.take_plate(plate_item()).unwrap();
        k.pick_up(omelet(), 1, false).unwrap();

        let loaded = Kitchen::load(Arc::new(sample_catalog()), test_config(), &k.save().unwrap()).unwrap();
        assert_eq!(loaded.held_plate().unwrap().item_ids(), vec![omelet()]);
        let (_, station) = loaded.stations().next().unwrap();
        let placed = station.occupants()[0].plate_id().unwrap();
        assert_eq!(loaded.plate(placed).unwrap().item_ids(), vec![bread()]);
    }
}

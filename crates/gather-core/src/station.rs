//! Stations: a bounded, ordered set of ingredient slots plus the
//! processing machine for the station's kind.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, IngredientCategory, StationKind};
use crate::fixed::Seconds;
use crate::id::{ItemId, RecipeId};
use crate::matcher::{any_recipe_uses, can_accept_as_next, find_match};
use crate::processing::{ProcessResult, ProcessingSnapshot, ProcessingState};
use crate::rejection::Rejection;
use crate::slot::{Slot, SlotPayload};

/// World placement of a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Pose {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..Default::default()
        }
    }
}

/// Payload for an item placed on a station. Liquids have no visible
/// counterpart.
pub(crate) fn placed_payload(catalog: &Catalog, item: ItemId) -> SlotPayload {
    if catalog.category(item) == IngredientCategory::Liquid {
        SlotPayload::None
    } else {
        SlotPayload::Item
    }
}

// ---------------------------------------------------------------------------
// StationSlotStack
// ---------------------------------------------------------------------------

/// Ordered occupant slots. Index is placement position.
///
/// Items of the same type and dirtiness share one stack capped at
/// `per_type_cap`; a new type takes the next free position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSlotStack {
    slots: Vec<Slot>,
    capacity: usize,
    per_type_cap: u32,
}

impl StationSlotStack {
    pub fn new(capacity: usize, per_type_cap: u32) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            per_type_cap: per_type_cap.max(1),
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn per_type_cap(&self) -> u32 {
        self.per_type_cap
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn first(&self) -> Option<&Slot> {
        self.slots.first()
    }

    pub fn first_mut(&mut self) -> Option<&mut Slot> {
        self.slots.first_mut()
    }

    pub fn last(&self) -> Option<&Slot> {
        self.slots.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut Slot> {
        self.slots.last_mut()
    }

    /// One entry per occupant slot.
    pub fn item_types(&self) -> Vec<ItemId> {
        self.slots.iter().filter_map(Slot::item).collect()
    }

    fn find_stack(&self, candidate: &Slot) -> Option<usize> {
        self.slots.iter().position(|slot| slot.stacks_with(candidate))
    }

    /// Whether `candidate` could be stored without looking at recipes.
    pub fn can_hold(&self, candidate: &Slot) -> bool {
        match self.find_stack(candidate) {
            Some(index) => self.slots[index].amount() < self.per_type_cap,
            None => !self.is_full() && !self.first().is_some_and(Slot::is_plate),
        }
    }

    /// Merge `candidate` into its stack or place it at the next free
    /// position. Returns how many units were stored.
    pub fn insert(&mut self, candidate: &Slot, payload: SlotPayload) -> Result<u32, Rejection> {
        let Some(item) = candidate.item() else {
            return Err(Rejection::NothingToTake);
        };
        if let Some(index) = self.find_stack(candidate) {
            let stack = &mut self.slots[index];
            let add = self.per_type_cap.saturating_sub(stack.amount()).min(candidate.amount());
            if add == 0 {
                return Err(Rejection::StackFull { item });
            }
            stack.add_amount(add);
            return Ok(add);
        }
        if self.is_full() {
            return Err(Rejection::StationFull);
        }
        let amount = match payload {
            SlotPayload::Plate(_) => 1,
            _ => candidate.amount().min(self.per_type_cap),
        };
        self.slots.push(
            Slot::new(item, amount)
                .with_dirty(candidate.is_dirty())
                .with_timer(candidate.timer())
                .with_payload(payload),
        );
        Ok(amount)
    }

    /// Append a slot as-is. Fails when every position is taken.
    pub fn push(&mut self, slot: Slot) -> bool {
        if self.is_full() || slot.is_empty() {
            return false;
        }
        self.slots.push(slot);
        true
    }

    /// Detach the slot at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<Slot> {
        (index < self.slots.len()).then(|| self.slots.remove(index))
    }

    pub(crate) fn restore_at(&mut self, index: usize, slot: Slot) {
        if !slot.is_empty() {
            let index = index.min(self.slots.len());
            self.slots.insert(index, slot);
        }
    }

    pub fn set_all_timers(&mut self, timer: Seconds) {
        for slot in &mut self.slots {
            slot.set_timer(timer);
        }
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }

    /// Drop slots emptied by partial removals.
    pub(crate) fn retain_occupied(&mut self) {
        self.slots.retain(|slot| !slot.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

/// A placed station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    kind: StationKind,
    stack: StationSlotStack,
    recipes: Vec<RecipeId>,
    processing: ProcessingState,
    pose: Pose,
}

impl Station {
    pub fn new(
        catalog: &Catalog,
        kind: StationKind,
        capacity: usize,
        per_type_cap: u32,
        washing_threshold: u32,
        pose: Pose,
    ) -> Self {
        Self {
            kind,
            stack: StationSlotStack::new(capacity, per_type_cap),
            recipes: catalog.recipes_for_station(kind).to_vec(),
            processing: ProcessingState::for_kind(kind, washing_threshold),
            pose,
        }
    }

    pub fn kind(&self) -> StationKind {
        self.kind
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn stack(&self) -> &StationSlotStack {
        &self.stack
    }

    pub fn occupants(&self) -> &[Slot] {
        self.stack.slots()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn recipes(&self) -> &[RecipeId] {
        &self.recipes
    }

    pub fn processing(&self) -> &ProcessingState {
        &self.processing
    }

    /// The recipe the occupants currently satisfy.
    pub fn current_match(&self, catalog: &Catalog) -> Option<RecipeId> {
        find_match(catalog, &self.stack.item_types(), &self.recipes)
    }

    /// Apply the alternate-input rule: a raw item that is the alternate
    /// input of a single-input recipe is stored as one unit of that
    /// recipe's real input.
    fn substitute(&self, catalog: &Catalog, source: &Slot) -> Option<Slot> {
        let item = source.item()?;
        let recipe = find_match(catalog, &[item], &self.recipes).and_then(|id| catalog.get_recipe(id))?;
        if recipe.substitute_for_single_input() != Some(item) {
            return None;
        }
        let input = recipe.inputs.first()?;
        Some(
            Slot::new(input.item, 1)
                .with_dirty(source.is_dirty())
                .with_timer(source.timer()),
        )
    }

    /// The item `source` would be stored as.
    pub fn effective_item(&self, catalog: &Catalog, source: &Slot) -> Option<ItemId> {
        self.substitute(catalog, source)
            .and_then(|slot| slot.item())
            .or(source.item())
    }

    /// Whether `source` could be stored here, ignoring recipes.
    pub fn can_hold(&self, catalog: &Catalog, source: &Slot) -> bool {
        match self.substitute(catalog, source) {
            Some(effective) => self.stack.can_hold(&effective),
            None => self.stack.can_hold(source),
        }
    }

    /// Whether adding `source` keeps the occupants on track for a recipe.
    pub fn can_accept_as_next(&self, catalog: &Catalog, source: &Slot) -> bool {
        let Some(item) = self.effective_item(catalog, source) else {
            return false;
        };
        can_accept_as_next(catalog, &self.stack.item_types(), item, &self.recipes)
    }

    /// Store `source` (or as much of it as the per-type cap allows).
    ///
    /// Refused when no recipe here uses the item on a processing station,
    /// when a dirty item meets a processing station, or when there is no
    /// room. A plate moves whole; otherwise the stored units are taken from
    /// `source` when `remove_from_source` is set.
    pub fn add_ingredient(
        &mut self,
        catalog: &Catalog,
        source: &mut Slot,
        remove_from_source: bool,
    ) -> Result<u32, Rejection> {
        let Some(item) = source.item() else {
            return Err(Rejection::NothingToTake);
        };
        if !self.kind.is_pass_through() && !any_recipe_uses(catalog, item, &self.recipes) {
            return Err(Rejection::WrongStation { item });
        }
        if !self.kind.is_pass_through() && source.is_dirty() {
            return Err(Rejection::Dirty { item });
        }

        let substituted = self.substitute(catalog, source);
        let stored = substituted.as_ref().unwrap_or(&*source);
        let payload = match source.payload() {
            SlotPayload::Plate(plate) => SlotPayload::Plate(plate),
            _ => stored.item().map_or(SlotPayload::Item, |i| placed_payload(catalog, i)),
        };
        let placed = self.stack.insert(stored, payload)?;

        if remove_from_source {
            if source.is_plate() {
                source.clear();
            } else {
                source.remove_amount(placed);
                source.set_timer(Seconds::ZERO);
            }
        }
        Ok(placed)
    }

    /// React to a completed add: re-match and re-arm the machine.
    pub fn after_add(&mut self, catalog: &Catalog) -> ProcessResult {
        self.processing.on_added(&mut self.stack, catalog, &self.recipes)
    }

    /// Detach the occupant at `index` and let the machine re-validate.
    pub fn remove_at(&mut self, catalog: &Catalog, index: usize) -> Option<(Slot, ProcessResult)> {
        let slot = self.stack.remove_at(index)?;
        let result = self.processing.on_removed(&mut self.stack, catalog, &self.recipes);
        Some((slot, result))
    }

    /// Put back a slot whose removal could only partly complete.
    pub(crate) fn restore_at(&mut self, catalog: &Catalog, index: usize, slot: Slot) -> ProcessResult {
        self.stack.restore_at(index, slot);
        self.processing.on_added(&mut self.stack, catalog, &self.recipes)
    }

    /// Re-validate after units were taken from an occupant in place.
    pub(crate) fn after_remove(&mut self, catalog: &Catalog) -> ProcessResult {
        self.stack.retain_occupied();
        self.processing.on_removed(&mut self.stack, catalog, &self.recipes)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.stack.slots_mut().get_mut(index)
    }

    /// Cut or wash once. `None` when this kind has no alternate action.
    pub fn alternate(&mut self, catalog: &Catalog) -> Option<ProcessResult> {
        self.processing.alternate(&mut self.stack, catalog, &self.recipes)
    }

    pub fn tick(&mut self, catalog: &Catalog, dt: Seconds) -> ProcessResult {
        self.processing.tick(&mut self.stack, catalog, &self.recipes, dt)
    }

    pub fn snapshot(&self) -> ProcessingSnapshot {
        self.processing.snapshot()
    }

    /// Place saved occupants at their recorded indices and resume progress.
    pub(crate) fn restore(&mut self, catalog: &Catalog, occupants: Vec<(usize, Slot)>, snapshot: ProcessingSnapshot) {
        let mut occupants = occupants;
        occupants.sort_by_key(|(index, _)| *index);
        for (_, slot) in occupants {
            self.stack.push(slot);
        }
        self.processing
            .restore(snapshot, &mut self.stack, catalog, &self.recipes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::secs;
    use crate::processing::CookState;
    use crate::test_utils::*;

    fn station(kind: StationKind, capacity: usize) -> Station {
        let catalog = sample_catalog();
        Station::new(&catalog, kind, capacity, 3, 3, Pose::default())
    }

    fn add(station: &mut Station, slot: Slot) -> Result<u32, Rejection> {
        let catalog = sample_catalog();
        let mut source = slot;
        let placed = station.add_ingredient(&catalog, &mut source, true)?;
        station.after_add(&catalog);
        Ok(placed)
    }

    fn cook_state(station: &Station) -> CookState {
        match station.processing() {
            ProcessingState::Cooking(m) => m.state,
            other => panic!("not a cooking station: {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Stack rules
    // -----------------------------------------------------------------------

    #[test]
    fn same_item_merges_up_to_cap() {
        let mut counter = station(StationKind::None, 3);
        assert_eq!(add(&mut counter, Slot::new(tomato(), 2)), Ok(2));
        assert_eq!(add(&mut counter, Slot::new(tomato(), 2)), Ok(1));
        assert_eq!(counter.occupants().len(), 1);
        assert_eq!(counter.occupants()[0].amount(), 3);
        assert_eq!(
            add(&mut counter, Slot::new(tomato(), 1)),
            Err(Rejection::StackFull { item: tomato() })
        );
    }

    #[test]
    fn spillover_stays_in_source() {
        let catalog = sample_catalog();
        let mut counter = station(StationKind::None, 3);
        let mut source = Slot::new(flour(), 5);
        assert_eq!(counter.add_ingredient(&catalog, &mut source, true), Ok(3));
        assert_eq!(source.amount(), 2);
    }

    #[test]
    fn capacity_limits_distinct_types() {
        let mut counter = station(StationKind::None, 2);
        add(&mut counter, Slot::new(tomato(), 1)).unwrap();
        add(&mut counter, Slot::new(bread(), 1)).unwrap();
        assert_eq!(add(&mut counter, Slot::new(cheese(), 1)), Err(Rejection::StationFull));
    }

    #[test]
    fn wrong_item_for_processing_station_is_refused() {
        let mut board = station(StationKind::Cutting, 3);
        assert_eq!(
            add(&mut board, Slot::new(cheese(), 1)),
            Err(Rejection::WrongStation { item: cheese() })
        );
        assert!(board.is_empty());
    }

    #[test]
    fn dirty_items_only_on_pass_through() {
        let mut board = station(StationKind::Cutting, 3);
        assert_eq!(
            add(&mut board, Slot::new(tomato(), 1).with_dirty(true)),
            Err(Rejection::Dirty { item: tomato() })
        );
        let mut sink = station(StationKind::Washing, 1);
        assert_eq!(add(&mut sink, Slot::new(tomato(), 1).with_dirty(true)), Ok(1));
    }

    #[test]
    fn liquids_have_no_presence() {
        let mut mixer = station(StationKind::Mixing, 3);
        add(&mut mixer, Slot::new(water(), 1)).unwrap();
        assert_eq!(mixer.occupants()[0].payload(), SlotPayload::None);
        add(&mut mixer, Slot::new(flour(), 1)).unwrap();
        assert_eq!(mixer.occupants()[1].payload(), SlotPayload::Item);
    }

    #[test]
    fn alternate_input_is_stored_as_real_input() {
        let catalog = sample_catalog();
        let mut pan = station(StationKind::FryingPan, 3);
        let mut eggs = Slot::new(raw_egg(), 4);
        assert!(pan.can_accept_as_next(&catalog, &eggs));
        assert_eq!(pan.add_ingredient(&catalog, &mut eggs, true), Ok(1));
        assert_eq!(eggs.amount(), 3);
        assert_eq!(pan.occupants()[0].item(), Some(cracked_egg()));
    }

    #[test]
    fn remove_at_detaches() {
        let catalog = sample_catalog();
        let mut counter = station(StationKind::None, 3);
        add(&mut counter, Slot::new(tomato(), 1)).unwrap();
        add(&mut counter, Slot::new(bread(), 1)).unwrap();
        let (slot, _) = counter.remove_at(&catalog, 0).unwrap();
        assert_eq!(slot.item(), Some(tomato()));
        assert_eq!(counter.occupants()[0].item(), Some(bread()));
        assert!(counter.remove_at(&catalog, 5).is_none());
    }

    // -----------------------------------------------------------------------
    // Cooking
    // -----------------------------------------------------------------------

    #[test]
    fn cooking_runs_full_cycle() {
        let catalog = sample_catalog();
        let dt = secs(0.5);
        let mut pan = station(StationKind::FryingPan, 3);
        add(&mut pan, Slot::new(cracked_egg(), 1)).unwrap();
        assert_eq!(pan.processing().recipe(), Some(omelet_recipe()));

        pan.tick(&catalog, dt);
        assert_eq!(cook_state(&pan), CookState::Frying);

        let mut completed = Vec::new();
        for _ in 0..10 {
            completed.extend(pan.tick(&catalog, dt).completed);
        }
        assert_eq!(completed, vec![omelet_recipe()]);
        assert_eq!(pan.occupants()[0].item(), Some(omelet()));
        assert_eq!(cook_state(&pan), CookState::Finished);

        // Hold period equals the burn recipe's cook time.
        for _ in 0..6 {
            pan.tick(&catalog, dt);
        }
        assert_eq!(cook_state(&pan), CookState::Burnt);
        assert_eq!(pan.occupants()[0].item(), Some(burnt_omelet()));

        pan.tick(&catalog, dt);
        assert_eq!(cook_state(&pan), CookState::Idle);
        for _ in 0..20 {
            assert!(pan.tick(&catalog, dt).completed.is_empty());
        }
        assert_eq!(pan.occupants()[0].item(), Some(burnt_omelet()));
    }

    #[test]
    fn cooking_mirrors_timer_onto_slots() {
        let catalog = sample_catalog();
        let mut pan = station(StationKind::FryingPan, 3);
        add(&mut pan, Slot::new(cracked_egg(), 1)).unwrap();
        pan.tick(&catalog, secs(1.0));
        pan.tick(&catalog, secs(1.0));
        assert_eq!(pan.occupants()[0].timer(), secs(4.0));

        let (carried, _) = pan.remove_at(&catalog, 0).unwrap();
        assert_eq!(carried.timer(), secs(4.0));
        assert_eq!(cook_state(&pan), CookState::Idle);

        // Placing it back resumes from the carried time.
        add(&mut pan, carried).unwrap();
        match pan.processing() {
            ProcessingState::Cooking(m) => assert_eq!(m.timer, secs(4.0)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn cooking_chain_stops_on_revisited_recipe() {
        use crate::catalog::{CatalogBuilder, ItemDef, RecipeDef};
        let mut b = CatalogBuilder::new();
        let a = b.register_item(ItemDef::new("Batter"));
        let c = b.register_item(ItemDef::new("Crepe"));
        b.register_recipe(
            RecipeDef::new("Crepe")
                .station(StationKind::Pot)
                .input(a, 1)
                .output(c, 1)
                .cook_time(secs(1.0)),
        );
        b.register_recipe(
            RecipeDef::new("Unbake")
                .station(StationKind::Pot)
                .input(c, 1)
                .output(a, 1)
                .cook_time(secs(1.0)),
        );
        let catalog = b.build().unwrap();
        let mut pot = Station::new(&catalog, StationKind::Pot, 1, 3, 3, Pose::default());
        let mut source = Slot::new(a, 1);
        pot.add_ingredient(&catalog, &mut source, true).unwrap();
        pot.after_add(&catalog);

        let mut completions = 0;
        for _ in 0..50 {
            completions += pot.tick(&catalog, secs(0.5)).completed.len();
        }
        assert_eq!(completions, 1);
        assert!(!pot.processing().is_running());
    }

    // -----------------------------------------------------------------------
    // Cutting and washing
    // -----------------------------------------------------------------------

    #[test]
    fn cutting_completes_after_progress_steps() {
        let catalog = sample_catalog();
        let mut board = station(StationKind::Cutting, 1);
        add(&mut board, Slot::new(tomato(), 1)).unwrap();

        let first = board.alternate(&catalog).unwrap();
        assert_eq!(first.step.map(|s| (s.progress, s.steps)), Some((1, 3)));
        assert!(first.step.unwrap().colors.is_some());
        board.alternate(&catalog);
        let last = board.alternate(&catalog).unwrap();
        assert_eq!(last.completed, vec![slice_tomato_recipe()]);
        assert_eq!(board.occupants()[0].item(), Some(sliced_tomato()));

        // Nothing further to cut.
        assert!(board.alternate(&catalog).unwrap().step.is_none());
    }

    #[test]
    fn cutting_progress_resets_when_ingredient_leaves() {
        let catalog = sample_catalog();
        let mut board = station(StationKind::Cutting, 1);
        add(&mut board, Slot::new(tomato(), 1)).unwrap();
        board.alternate(&catalog);
        board.remove_at(&catalog, 0).unwrap();
        assert_eq!(board.snapshot().progress, 0);
    }

    #[test]
    fn washing_clears_dirt_after_threshold() {
        let catalog = sample_catalog();
        let mut sink = station(StationKind::Washing, 1);
        add(&mut sink, Slot::new(lettuce(), 2).with_dirty(true)).unwrap();
        assert!(sink.alternate(&catalog).unwrap().washed.is_none());
        assert!(sink.alternate(&catalog).unwrap().washed.is_none());
        let done = sink.alternate(&catalog).unwrap();
        assert_eq!(done.washed, Some(lettuce()));
        assert!(!sink.occupants()[0].is_dirty());
        assert_eq!(sink.occupants()[0].amount(), 2);

        // Clean items do not advance the counter.
        assert!(sink.alternate(&catalog).unwrap().step.is_none());
    }

    // -----------------------------------------------------------------------
    // Mixing
    // -----------------------------------------------------------------------

    #[test]
    fn mixer_waits_for_full_quantities() {
        let catalog = sample_catalog();
        let mut mixer = station(StationKind::Mixing, 3);
        add(&mut mixer, Slot::new(flour(), 1)).unwrap();
        add(&mut mixer, Slot::new(water(), 1)).unwrap();
        assert!(!mixer.processing().is_running());
        add(&mut mixer, Slot::new(flour(), 1)).unwrap();
        assert!(mixer.processing().is_running());

        let mut completed = Vec::new();
        for _ in 0..8 {
            completed.extend(mixer.tick(&catalog, secs(0.5)).completed);
        }
        assert_eq!(completed, vec![dough_recipe()]);
        assert_eq!(mixer.occupants().len(), 1);
        assert_eq!(mixer.occupants()[0].item(), Some(dough()));
    }

    #[test]
    fn mixer_aborts_when_quantity_drops() {
        let catalog = sample_catalog();
        let mut mixer = station(StationKind::Mixing, 3);
        add(&mut mixer, Slot::new(flour(), 2)).unwrap();
        add(&mut mixer, Slot::new(water(), 1)).unwrap();
        assert!(mixer.processing().is_running());
        mixer.tick(&catalog, secs(1.0));

        mixer.slot_mut(0).unwrap().remove_amount(1);
        let result = mixer.tick(&catalog, secs(1.0));
        assert!(result.aborted);
        assert!(!mixer.processing().is_running());
        for _ in 0..10 {
            assert!(mixer.tick(&catalog, secs(1.0)).completed.is_empty());
        }
        assert_eq!(mixer.occupants()[0].amount(), 1);
    }
}

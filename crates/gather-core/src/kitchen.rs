//! The kitchen: owns every station, plate and order and orchestrates the
//! per-frame simulation pipeline.
//!
//! # Architecture
//!
//! The `Kitchen` owns:
//! - The immutable [`Catalog`] (shared through an `Arc`)
//! - The player [`Inventory`] and the plates arena
//! - The stations arena, each [`Station`] with its processing machine
//! - The [`MealOrderEngine`], [`RankTracker`], [`Wallet`] and [`Cookbook`]
//! - An [`EventBus`] for typed kitchen events
//! - A [`CommandQueue`] of player intents and a [`Scheduler`] of deferred
//!   tasks
//!
//! # Step pipeline
//!
//! Each [`Kitchen::step`] runs:
//! 1. **Commands** -- apply queued player actions in submission order
//! 2. **Orders** -- advance order timers, sweep finished orders, maybe spawn
//! 3. **Stations** -- advance every processing machine
//! 4. **Deferred** -- fire scheduled tasks that came due
//! 5. **Delivery** -- hand buffered events to listeners
//!
//! Player actions can also be applied directly (`interact`, `deliver`, ...)
//! between steps; their events are delivered with the next step.

use std::sync::Arc;

use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::catalog::{Catalog, StationKind};
use crate::command::{Command, CommandQueue};
use crate::config::{ConfigError, KitchenConfig};
use crate::cookbook::Cookbook;
use crate::economy::Wallet;
use crate::event::{Event, EventBus};
use crate::fixed::{Seconds, Ticks};
use crate::id::{ItemId, MealId, OrderId, PlateId, RankId, StationId};
use crate::inventory::Inventory;
use crate::order::{MealOrderEngine, OrderMilestone};
use crate::plate::Plate;
use crate::processing::ProcessResult;
use crate::rank::RankTracker;
use crate::rejection::Rejection;
use crate::scheduler::{Scheduler, TaskId};
use crate::slot::Slot;
use crate::station::{Pose, Station};

/// Thought shown when a customer gives up.
const EXPIRED_THOUGHT: &str = "Oops... Too slow...";

/// Work scheduled on the kitchen clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deferred {
    ClearThought,
}

// ---------------------------------------------------------------------------
// Kitchen
// ---------------------------------------------------------------------------

/// A running kitchen.
#[derive(Debug)]
pub struct Kitchen {
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) config: KitchenConfig,
    pub(crate) tick: Ticks,
    pub(crate) elapsed: Seconds,

    pub(crate) inventory: Inventory,
    pub(crate) stations: SlotMap<StationId, Station>,
    pub(crate) plates: SlotMap<PlateId, Plate>,

    pub(crate) orders: MealOrderEngine,
    pub(crate) ranks: RankTracker,
    pub(crate) wallet: Wallet,
    pub(crate) cookbook: Cookbook,

    /// Typed events, delivered at the end of every step.
    pub event_bus: EventBus,
    pub(crate) commands: CommandQueue,
    pub(crate) scheduler: Scheduler<Deferred>,

    pub(crate) thought: Option<String>,
    pub(crate) thought_task: Option<TaskId>,
    thought_duration: Seconds,
}

impl Kitchen {
    /// Create an empty kitchen. Ranks reachable with zero deliveries are
    /// unlocked immediately.
    pub fn new(catalog: Arc<Catalog>, config: KitchenConfig) -> Result<Self, ConfigError> {
        let mut kitchen = Self::blank(catalog, config)?;
        let catalog = Arc::clone(&kitchen.catalog);
        let starting = kitchen.ranks.unlock_reached(&catalog);
        kitchen.apply_rank_unlocks(&starting, true);
        Ok(kitchen)
    }

    /// A kitchen with no progression applied. Used by `new` and save loading.
    pub(crate) fn blank(catalog: Arc<Catalog>, config: KitchenConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inventory: Inventory::new(config.inventory_slots),
            orders: MealOrderEngine::new(&config.orders)?,
            thought_duration: config.thought_duration()?,
            wallet: Wallet::new(config.starting_money),
            event_bus: EventBus::new(config.event_buffer_capacity),
            commands: CommandQueue::with_max_history(config.command_history),
            catalog,
            config,
            tick: 0,
            elapsed: Seconds::ZERO,
            stations: SlotMap::with_key(),
            plates: SlotMap::with_key(),
            ranks: RankTracker::new(),
            cookbook: Cookbook::new(),
            scheduler: Scheduler::new(),
            thought: None,
            thought_task: None,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Number of completed steps.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    /// Simulated seconds since the kitchen opened.
    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id)
    }

    pub fn stations(&self) -> impl Iterator<Item = (StationId, &Station)> {
        self.stations.iter()
    }

    pub fn plate(&self, id: PlateId) -> Option<&Plate> {
        self.plates.get(id)
    }

    /// The plate in the player's hands.
    pub fn held_plate(&self) -> Option<&Plate> {
        self.inventory.held_plate().and_then(|id| self.plates.get(id))
    }

    pub fn orders(&self) -> &MealOrderEngine {
        &self.orders
    }

    pub fn ranks(&self) -> &RankTracker {
        &self.ranks
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn cookbook(&self) -> &Cookbook {
        &self.cookbook
    }

    pub fn commands(&self) -> &CommandQueue {
        &self.commands
    }

    /// What the player is currently thinking, if anything.
    pub fn thought(&self) -> Option<&str> {
        self.thought.as_deref()
    }

    // -----------------------------------------------------------------------
    // Stations
    // -----------------------------------------------------------------------

    /// Place a station with `slots` placement positions.
    pub fn add_station(&mut self, kind: StationKind, slots: usize, pose: Pose) -> StationId {
        let station = Station::new(
            &self.catalog,
            kind,
            slots,
            self.config.per_type_cap,
            self.config.washing_threshold,
            pose,
        );
        let id = self.stations.insert(station);
        debug!(?kind, slots, "station placed");
        self.event_bus.emit(Event::StationPlaced {
            station: id,
            kind,
            tick: self.tick,
        });
        id
    }

    /// Buy and place a station.
    pub fn purchase_station(
        &mut self,
        kind: StationKind,
        slots: usize,
        pose: Pose,
        cost: u32,
    ) -> Result<StationId, Rejection> {
        if !self.wallet.try_spend(cost) {
            return Err(self.reject(Rejection::NotEnoughMoney { cost }));
        }
        self.emit_money(-i64::from(cost));
        Ok(self.add_station(kind, slots, pose))
    }

    // -----------------------------------------------------------------------
    // Commands and stepping
    // -----------------------------------------------------------------------

    /// Queue a player action for the next step.
    pub fn submit(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Apply one command immediately.
    pub fn execute(&mut self, command: Command) -> Result<(), Rejection> {
        match command {
            Command::Interact { station } => self.interact(station),
            Command::InteractAlternate { station } => self.interact_alternate(station),
            Command::SelectSlot { index } => {
                self.select_slot(index);
                Ok(())
            }
            Command::TakePlate { plate_item } => self.take_plate(plate_item).map(|_| ()),
            Command::PickUp {
                item,
                amount,
                dirty,
            } => self.pick_up(item, amount, dirty),
            Command::Deliver => self.deliver().map(|_| ()),
            Command::Trash => self.trash(),
        }
    }

    /// Advance the kitchen by `dt` seconds.
    pub fn step(&mut self, dt: Seconds) {
        let dt = dt.max(Seconds::ZERO);

        // Phase 1: player commands.
        for command in self.commands.drain(self.tick) {
            // Rejections already surfaced as a thought and an event.
            let _ = self.execute(command);
        }

        // Phase 2: orders update before they spawn.
        self.phase_orders(dt);

        // Phase 3: station machines.
        self.phase_stations(dt);

        // Phase 4: deferred tasks.
        for task in self.scheduler.advance(dt) {
            match task {
                Deferred::ClearThought => {
                    self.thought = None;
                    self.thought_task = None;
                }
            }
        }

        // Phase 5: events.
        self.event_bus.deliver();

        self.tick += 1;
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn phase_orders(&mut self, dt: Seconds) {
        let catalog = Arc::clone(&self.catalog);
        let result = self.orders.tick(dt, self.ranks.current_meals(&catalog));

        for (order, meal, milestone) in result.milestones {
            self.event_bus.emit(Event::OrderMilestone {
                order,
                meal,
                milestone,
                tick: self.tick,
            });
            if milestone == OrderMilestone::Expired {
                self.say(EXPIRED_THOUGHT.to_string());
            }
        }
        if let Some((order, meal, time_limit)) = result.created {
            self.event_bus.emit(Event::OrderCreated {
                order,
                meal,
                time_limit,
                tick: self.tick,
            });
        }
    }

    fn phase_stations(&mut self, dt: Seconds) {
        let catalog = Arc::clone(&self.catalog);
        let ids: Vec<StationId> = self.stations.keys().collect();
        for id in ids {
            let Some(station) = self.stations.get_mut(id) else {
                continue;
            };
            let result = station.tick(&catalog, dt);
            self.apply_result(id, result);
        }
    }

    // -----------------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------------

    /// Primary interaction with a station.
    pub fn interact(&mut self, station: StationId) -> Result<(), Rejection> {
        self.try_interact(station).map_err(|r| self.reject(r))
    }

    /// Secondary interaction: cut, wash, or move plate contents.
    pub fn interact_alternate(&mut self, station: StationId) -> Result<(), Rejection> {
        self.try_interact_alternate(station)
            .map_err(|r| self.reject(r))
    }

    pub fn select_slot(&mut self, index: usize) -> bool {
        self.inventory.select(index)
    }

    /// Pick up a fresh plate from the plates table.
    pub fn take_plate(&mut self, plate_item: ItemId) -> Result<PlateId, Rejection> {
        self.try_take_plate(plate_item).map_err(|r| self.reject(r))
    }

    /// Pick up loose items. With a plate in hand one unit goes onto it.
    pub fn pick_up(&mut self, item: ItemId, amount: u32, dirty: bool) -> Result<(), Rejection> {
        self.try_pick_up(item, amount, dirty)
            .map_err(|r| self.reject(r))
    }

    /// Serve the held plate. On success the plate is consumed, the reward
    /// paid and the delivery counted towards the next rank.
    pub fn deliver(&mut self) -> Result<OrderId, Rejection> {
        self.try_deliver().map_err(|r| self.reject(r))
    }

    /// Throw away the held plate, or else the selected slot.
    pub fn trash(&mut self) -> Result<(), Rejection> {
        self.try_trash().map_err(|r| self.reject(r))
    }

    /// Debug helper: fulfil the oldest order without a plate.
    pub fn complete_first_order(&mut self) -> Option<OrderId> {
        let (order, meal) = self.orders.complete_first()?;
        self.finish_delivery(order, meal);
        Some(order)
    }

    /// Drop every order; a new one spawns on the next step.
    pub fn reset_orders(&mut self) {
        self.orders.reset();
    }

    fn try_interact(&mut self, id: StationId) -> Result<(), Rejection> {
        let kind = self
            .stations
            .get(id)
            .ok_or(Rejection::UnknownStation)?
            .kind();
        if kind.is_cooking() || kind == StationKind::Mixing {
            self.interact_processing(id, kind)
        } else {
            self.interact_counter(id)
        }
    }

    /// Counters, cutting boards and sinks.
    fn interact_counter(&mut self, id: StationId) -> Result<(), Rejection> {
        let catalog = Arc::clone(&self.catalog);
        let station = self
            .stations
            .get_mut(id)
            .ok_or(Rejection::UnknownStation)?;

        if let Some(plate_id) = self.inventory.held_plate()
            && station.is_empty()
        {
            let plate_item = self
                .plates
                .get(plate_id)
                .map(Plate::item)
                .ok_or(Rejection::NoPlate)?;
            let mut source = Slot::plate(plate_item, plate_id);
            station.add_ingredient(&catalog, &mut source, true)?;
            self.inventory.set_held_plate(None);
            let result = station.after_add(&catalog);
            self.emit_added(id, plate_item, 1);
            self.apply_result(id, result);
            return Ok(());
        }

        let selected = self.inventory.selected().clone();
        if let Some(item) = selected.item() {
            if let Some(plate_id) = station.occupants().first().and_then(Slot::plate_id) {
                let plate = self.plates.get_mut(plate_id).ok_or(Rejection::NoPlate)?;
                plate.add_ingredient(self.inventory.selected_mut(), true)?;
                self.emit_added(id, item, 1);
                return Ok(());
            }
            if station.can_hold(&catalog, &selected) {
                let stored = station.effective_item(&catalog, &selected).unwrap_or(item);
                let placed = station.add_ingredient(&catalog, self.inventory.selected_mut(), true)?;
                let result = station.after_add(&catalog);
                self.emit_added(id, stored, placed);
                self.apply_result(id, result);
                return Ok(());
            }
        }

        if station.is_empty() {
            return Err(match selected.item() {
                Some(_) => Rejection::StationFull,
                None => Rejection::NothingToTake,
            });
        }
        self.take_last(id)
    }

    /// Cooking stations and mixers.
    fn interact_processing(&mut self, id: StationId, kind: StationKind) -> Result<(), Rejection> {
        let catalog = Arc::clone(&self.catalog);
        let station = self
            .stations
            .get_mut(id)
            .ok_or(Rejection::UnknownStation)?;
        let selected = self.inventory.selected().clone();

        let Some(item) = selected.item() else {
            if station.is_empty() {
                return Err(Rejection::NothingToTake);
            }
            return self.take_last(id);
        };
        if !station.can_accept_as_next(&catalog, &selected) {
            return Err(Rejection::WontCombine { kind });
        }
        let stored = station.effective_item(&catalog, &selected).unwrap_or(item);
        let placed = station.add_ingredient(&catalog, self.inventory.selected_mut(), true)?;
        let result = station.after_add(&catalog);
        self.emit_added(id, stored, placed);
        self.apply_result(id, result);
        Ok(())
    }

    /// Take the last occupant: a plate goes to the hands, anything else
    /// onto the held plate (one unit) or into the inventory.
    fn take_last(&mut self, id: StationId) -> Result<(), Rejection> {
        let catalog = Arc::clone(&self.catalog);
        let station = self
            .stations
            .get_mut(id)
            .ok_or(Rejection::UnknownStation)?;
        let index = station
            .occupants()
            .len()
            .checked_sub(1)
            .ok_or(Rejection::NothingToTake)?;
        let last = station.occupants()[index].clone();
        let item = last.item().ok_or(Rejection::NothingToTake)?;

        if let Some(plate_id) = last.plate_id() {
            if self.inventory.held_plate().is_some() {
                return Err(Rejection::HandsFull);
            }
            let (_, result) = station
                .remove_at(&catalog, index)
                .ok_or(Rejection::NothingToTake)?;
            self.inventory.set_held_plate(Some(plate_id));
            self.emit_removed(id, item, 1);
            self.apply_result(id, result);
            return Ok(());
        }

        let taken = if let Some(plate_id) = self.inventory.held_plate() {
            let plate = self.plates.get_mut(plate_id).ok_or(Rejection::NoPlate)?;
            let slot = station.slot_mut(index).ok_or(Rejection::NothingToTake)?;
            plate.add_ingredient(slot, true)?;
            1
        } else {
            if !self.inventory.has_space_for(&catalog, item, last.is_dirty()) {
                return Err(Rejection::InventoryFull);
            }
            let slot = station.slot_mut(index).ok_or(Rejection::NothingToTake)?;
            let before = slot.amount();
            self.inventory.try_add(&catalog, slot, true);
            before - slot.amount()
        };
        let result = station.after_remove(&catalog);
        self.emit_removed(id, item, taken);
        self.apply_result(id, result);
        Ok(())
    }

    fn try_interact_alternate(&mut self, id: StationId) -> Result<(), Rejection> {
        let catalog = Arc::clone(&self.catalog);
        let station = self
            .stations
            .get_mut(id)
            .ok_or(Rejection::UnknownStation)?;
        let placed_plate = station.occupants().first().and_then(Slot::plate_id);

        if placed_plate.is_none()
            && let Some(result) = station.alternate(&catalog)
        {
            self.apply_result(id, result);
            return Ok(());
        }

        // Held plate: its last ingredient moves onto the station.
        if let Some(plate_id) = self.inventory.held_plate() {
            let plate = self.plates.get_mut(plate_id).ok_or(Rejection::NoPlate)?;
            let mut ingredient = plate.last().cloned().ok_or(Rejection::NothingToTake)?;
            let item = ingredient.item().ok_or(Rejection::NothingToTake)?;
            let stored = station.effective_item(&catalog, &ingredient).unwrap_or(item);
            station.add_ingredient(&catalog, &mut ingredient, true)?;
            plate.remove_last();
            let result = station.after_add(&catalog);
            self.emit_added(id, stored, 1);
            self.apply_result(id, result);
            return Ok(());
        }

        // Placed plate: its last ingredient moves into the inventory.
        if let Some(plate_id) = placed_plate {
            let plate = self.plates.get_mut(plate_id).ok_or(Rejection::NoPlate)?;
            let last = plate.last().ok_or(Rejection::NothingToTake)?;
            let item = last.item().ok_or(Rejection::NothingToTake)?;
            if !self.inventory.has_space_for(&catalog, item, last.is_dirty()) {
                return Err(Rejection::InventoryFull);
            }
            if let Some(mut ingredient) = plate.remove_last()
                && !self.inventory.try_add(&catalog, &mut ingredient, true)
            {
                plate.restore_last(ingredient);
                return Err(Rejection::InventoryFull);
            }
            self.emit_removed(id, item, 1);
        }
        Ok(())
    }

    fn try_take_plate(&mut self, plate_item: ItemId) -> Result<PlateId, Rejection> {
        if self.inventory.held_plate().is_some() {
            return Err(Rejection::HandsFull);
        }
        if self.catalog.get_item(plate_item).is_none() {
            warn!(item = plate_item.0, "unknown plate item");
            return Err(Rejection::NothingToTake);
        }
        let id = self
            .plates
            .insert(Plate::new(plate_item, self.config.plate_capacity));
        self.inventory.set_held_plate(Some(id));
        Ok(id)
    }

    fn try_pick_up(&mut self, item: ItemId, amount: u32, dirty: bool) -> Result<(), Rejection> {
        let catalog = Arc::clone(&self.catalog);
        if catalog.get_item(item).is_none() {
            warn!(item = item.0, "pick up of unknown item ignored");
            return Err(Rejection::NothingToTake);
        }
        let mut source = Slot::new(item, amount);
        if source.is_empty() {
            return Err(Rejection::NothingToTake);
        }
        source.set_dirty(&catalog, dirty);

        if let Some(plate_id) = self.inventory.held_plate() {
            let plate = self.plates.get_mut(plate_id).ok_or(Rejection::NoPlate)?;
            return plate.add_ingredient(&mut source, true);
        }
        if !self.inventory.try_add(&catalog, &mut source, true) {
            return Err(Rejection::InventoryFull);
        }
        Ok(())
    }

    fn try_deliver(&mut self) -> Result<OrderId, Rejection> {
        let plate_id = self.inventory.held_plate().ok_or(Rejection::NoPlate)?;
        let plate = self.plates.get(plate_id).ok_or(Rejection::NoPlate)?;
        let (order, meal) = self.orders.deliver(&self.catalog, plate)?;

        self.plates.remove(plate_id);
        self.inventory.set_held_plate(None);
        self.finish_delivery(order, meal);
        Ok(order)
    }

    fn finish_delivery(&mut self, order: OrderId, meal: MealId) {
        self.event_bus.emit(Event::OrderCompleted {
            order,
            meal,
            tick: self.tick,
        });
        let reward = self.config.delivery_reward;
        self.wallet.add(reward);
        self.emit_money(i64::from(reward));

        let catalog = Arc::clone(&self.catalog);
        let unlocked = self.ranks.record_delivery(&catalog);
        self.apply_rank_unlocks(&unlocked, true);
    }

    fn try_trash(&mut self) -> Result<(), Rejection> {
        if let Some(plate_id) = self.inventory.held_plate() {
            self.plates.remove(plate_id);
            self.inventory.set_held_plate(None);
            return Ok(());
        }
        if self.inventory.selected().is_empty() {
            return Err(Rejection::NothingToTake);
        }
        self.inventory.take_selected();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal: progression, thoughts, events
    // -----------------------------------------------------------------------

    /// Apply unlock effects: new meals join the order pool and the order
    /// cap follows the rank.
    pub(crate) fn apply_rank_unlocks(&mut self, ranks: &[RankId], announce: bool) {
        let catalog = Arc::clone(&self.catalog);
        for &rank in ranks {
            let Some(def) = catalog.get_rank(rank) else {
                continue;
            };
            for &meal in &def.meals {
                self.orders.add_unlocked_meal(meal);
            }
            if def.max_orders_active > 0 {
                self.orders.set_max_active(def.max_orders_active);
            }
            if announce {
                self.event_bus.emit(Event::RankUnlocked {
                    rank,
                    tick: self.tick,
                });
            }
        }
    }

    /// Show a thought for the configured duration.
    fn say(&mut self, text: String) {
        if let Some(task) = self.thought_task.take() {
            self.scheduler.cancel(task);
        }
        self.thought = Some(text);
        self.thought_task = Some(
            self.scheduler
                .schedule(self.thought_duration, Deferred::ClearThought),
        );
    }

    fn reject(&mut self, rejection: Rejection) -> Rejection {
        let thought = rejection.thought(&self.catalog);
        debug!(?rejection, "action rejected");
        self.say(thought.clone());
        self.event_bus.emit(Event::ActionRejected {
            rejection,
            thought,
            tick: self.tick,
        });
        rejection
    }

    fn apply_result(&mut self, station: StationId, result: ProcessResult) {
        let tick = self.tick;
        for recipe in result.completed {
            self.event_bus.emit(Event::RecipeCompleted {
                station,
                recipe,
                tick,
            });
            if self.cookbook.record(&self.catalog, recipe) {
                self.event_bus
                    .emit(Event::RecipeDiscovered { recipe, tick });
            }
        }
        if let Some(step) = result.step {
            self.event_bus.emit(Event::ProcessingStep {
                station,
                progress: step.progress,
                steps: step.steps,
                colors: step.colors,
                tick,
            });
        }
        if let Some(item) = result.washed {
            self.event_bus
                .emit(Event::IngredientWashed { station, item, tick });
        }
        if result.aborted {
            self.event_bus
                .emit(Event::ProcessingAborted { station, tick });
        }
    }

    fn emit_added(&mut self, station: StationId, item: ItemId, amount: u32) {
        self.event_bus.emit(Event::IngredientAdded {
            station,
            item,
            amount,
            tick: self.tick,
        });
    }

    fn emit_removed(&mut self, station: StationId, item: ItemId, amount: u32) {
        self.event_bus.emit(Event::IngredientRemoved {
            station,
            item,
            amount,
            tick: self.tick,
        });
    }

    fn emit_money(&mut self, delta: i64) {
        self.event_bus.emit(Event::MoneyChanged {
            money: self.wallet.money(),
            delta,
            tick: self.tick,
        });
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::fixed::secs;
    use crate::processing::{CookState, ProcessingState};
    use crate::test_utils::*;

    fn kitchen() -> Kitchen {
        Kitchen::new(Arc::new(sample_catalog()), test_config()).unwrap()
    }

    fn cook_state(kitchen: &Kitchen, id: StationId) -> CookState {
        match kitchen.station(id).unwrap().processing() {
            ProcessingState::Cooking(m) => m.state,
            other => panic!("not a cooking station: {other:?}"),
        }
    }

    #[test]
    fn starting_rank_unlocks_its_meals() {
        let k = kitchen();
        assert_eq!(k.ranks().current(), Some(apprentice()));
        assert_eq!(k.orders().unlocked_meals(), &[omelet_plate()]);
        assert_eq!(k.orders().max_active(), 2);
        assert_eq!(k.event_bus.buffered_count(EventKind::RankUnlocked), 1);
    }

    #[test]
    fn first_step_spawns_an_order() {
        let mut k = kitchen();
        k.step(secs(0.1));
        assert_eq!(k.orders().orders().len(), 1);
        assert_eq!(k.orders().orders()[0].meal(), omelet_plate());
    }

    #[test]
    fn rejection_sets_thought_until_it_expires() {
        let mut k = kitchen();
        let board = k.add_station(StationKind::Cutting, 1, Pose::default());
        k.pick_up(cheese(), 1, false).unwrap();
        assert_eq!(
            k.interact(board),
            Err(Rejection::WrongStation { item: cheese() })
        );
        assert_eq!(k.thought(), Some("Hmm... I don't think this will work here."));

        k.step(secs(1.0));
        assert!(k.thought().is_some());
        k.step(secs(1.5));
        assert!(k.thought().is_none());
    }

    #[test]
    fn raw_egg_cooks_into_omelet() {
        let mut k = kitchen();
        let pan = k.add_station(StationKind::FryingPan, 3, Pose::default());
        k.pick_up(raw_egg(), 1, false).unwrap();
        k.interact(pan).unwrap();

        let station = k.station(pan).unwrap();
        assert_eq!(station.occupants()[0].item(), Some(cracked_egg()));
        assert!(k.inventory().selected().is_empty());

        // One step to start frying, ten to cook.
        for _ in 0..12 {
            k.step(secs(0.5));
        }
        assert_eq!(k.station(pan).unwrap().occupants()[0].item(), Some(omelet()));
        assert_eq!(cook_state(&k, pan), CookState::Finished);
        assert!(k.cookbook().is_discovered(omelet_recipe()));
    }

    #[test]
    fn empty_hand_takes_back_from_pan() {
        let mut k = kitchen();
        let pan = k.add_station(StationKind::FryingPan, 3, Pose::default());
        k.pick_up(cracked_egg(), 2, false).unwrap();
        k.interact(pan).unwrap();
        assert!(k.inventory().selected().is_empty());

        k.interact(pan).unwrap();
        assert_eq!(k.inventory().count(cracked_egg()), 2);
        assert!(k.station(pan).unwrap().is_empty());
        assert_eq!(cook_state(&k, pan), CookState::Idle);
    }

    #[test]
    fn mixer_refuses_items_that_lead_nowhere() {
        let mut k = kitchen();
        let mixer = k.add_station(StationKind::Mixing, 3, Pose::default());
        k.pick_up(tomato(), 1, false).unwrap();
        assert_eq!(
            k.interact(mixer),
            Err(Rejection::WontCombine {
                kind: StationKind::Mixing
            })
        );
        assert_eq!(
            k.thought(),
            Some("This ingredient won't mix into anything useful...")
        );
    }

    #[test]
    fn cutting_takes_three_steps() {
        let mut k = kitchen();
        let board = k.add_station(StationKind::Cutting, 1, Pose::default());
        k.pick_up(tomato(), 1, false).unwrap();
        k.interact(board).unwrap();
        for _ in 0..3 {
            k.interact_alternate(board).unwrap();
        }
        assert_eq!(
            k.station(board).unwrap().occupants()[0].item(),
            Some(sliced_tomato())
        );
        assert_eq!(k.event_bus.buffered_count(EventKind::ProcessingStep), 3);
    }

    #[test]
    fn plate_on_counter_collects_ingredients() {
        let mut k = kitchen();
        let counter = k.add_station(StationKind::None, 2, Pose::default());
        let plate = k.take_plate(plate_item()).unwrap();
        k.interact(counter).unwrap();
        assert!(k.inventory().held_plate().is_none());

        k.pick_up(bread(), 2, false).unwrap();
        k.interact(counter).unwrap();
        assert_eq!(k.plate(plate).unwrap().item_ids(), vec![bread()]);
        assert_eq!(k.inventory().count(bread()), 1);

        // Alternate pulls the ingredient back off the plate.
        k.interact_alternate(counter).unwrap();
        assert!(k.plate(plate).unwrap().is_empty());
        assert_eq!(k.inventory().count(bread()), 2);

        // Empty hands pick the plate back up.
        k.select_slot(5);
        k.interact(counter).unwrap();
        assert_eq!(k.inventory().held_plate(), Some(plate));
    }

    #[test]
    fn delivery_pays_and_counts() {
        let mut k = kitchen();
        k.step(secs(0.1));
        let order = k.orders().orders()[0].id();

        k.take_plate(plate_item()).unwrap();
        k.pick_up(omelet(), 1, false).unwrap();
        assert_eq!(k.held_plate().unwrap().item_ids(), vec![omelet()]);

        assert_eq!(k.deliver(), Ok(order));
        assert_eq!(k.wallet().money(), 250);
        assert_eq!(k.ranks().delivered(), 1);
        assert!(k.inventory().held_plate().is_none());
        assert!(k.orders().orders().is_empty());
    }

    #[test]
    fn failed_delivery_keeps_the_plate() {
        let mut k = kitchen();
        k.step(secs(0.1));
        let plate = k.take_plate(plate_item()).unwrap();
        k.pick_up(bread(), 1, false).unwrap();

        assert_eq!(
            k.deliver(),
            Err(Rejection::Plate(crate::rejection::PlateMismatch::MissingItem(omelet())))
        );
        assert_eq!(k.inventory().held_plate(), Some(plate));
        assert_eq!(k.orders().orders().len(), 1);
        assert_eq!(k.thought(), Some("I need to add an Omelet before serving."));
    }

    #[test]
    fn purchase_spends_or_refuses() {
        let mut k = kitchen();
        assert!(k.purchase_station(StationKind::Oven, 2, Pose::default(), 150).is_ok());
        assert_eq!(k.wallet().money(), 50);
        assert_eq!(
            k.purchase_station(StationKind::Oven, 2, Pose::default(), 150),
            Err(Rejection::NotEnoughMoney { cost: 150 })
        );
        assert_eq!(k.stations().count(), 1);
    }

    #[test]
    fn queued_commands_run_on_step() {
        let mut k = kitchen();
        let pan = k.add_station(StationKind::FryingPan, 1, Pose::default());
        k.submit(Command::PickUp {
            item: raw_egg(),
            amount: 1,
            dirty: false,
        });
        k.submit(Command::Interact { station: pan });
        assert!(k.station(pan).unwrap().is_empty());

        k.step(secs(0.1));
        assert_eq!(k.station(pan).unwrap().occupants().len(), 1);
        assert!(k.commands().is_empty());
    }

    #[test]
    fn trash_prefers_held_plate() {
        let mut k = kitchen();
        k.pick_up(flour(), 3, false).unwrap();
        let plate = k.take_plate(plate_item()).unwrap();
        k.trash().unwrap();
        assert!(k.plate(plate).is_none());
        assert_eq!(k.inventory().count(flour()), 3);
        k.trash().unwrap();
        assert_eq!(k.inventory().count(flour()), 0);
        assert_eq!(k.trash(), Err(Rejection::NothingToTake));
    }

    #[test]
    fn unknown_station_is_rejected() {
        let mut k = kitchen();
        let id = k.add_station(StationKind::None, 1, Pose::default());
        k.stations.remove(id);
        assert_eq!(k.interact(id), Err(Rejection::UnknownStation));
    }

    #[test]
    fn full_inventory_refuses_takes_without_moving_anything() {
        let config = KitchenConfig {
            inventory_slots: 2,
            ..test_config()
        };
        let mut k = Kitchen::new(Arc::new(sample_catalog()), config).unwrap();
        let shelf = k.add_station(StationKind::None, 1, Pose::default());
        let counter = k.add_station(StationKind::None, 1, Pose::default());

        k.pick_up(bread(), 1, false).unwrap();
        k.interact(shelf).unwrap();
        k.take_plate(plate_item()).unwrap();
        k.interact(counter).unwrap();
        k.pick_up(cheese(), 1, false).unwrap();
        k.interact(counter).unwrap();
        let plate = k.station(counter).unwrap().occupants()[0].plate_id().unwrap();

        k.pick_up(flour(), 1, false).unwrap();
        k.pick_up(water(), 1, false).unwrap();
        let inventory = k.inventory().clone();
        assert_eq!(k.event_bus.buffered_count(EventKind::ActionRejected), 0);

        // The shelf cannot hold the selected flour, so interacting takes.
        assert_eq!(k.interact(shelf), Err(Rejection::InventoryFull));
        let occupants = k.station(shelf).unwrap().occupants();
        assert_eq!(occupants.len(), 1);
        assert_eq!(occupants[0].item(), Some(bread()));
        assert_eq!(occupants[0].amount(), 1);
        assert_eq!(k.inventory(), &inventory);
        assert_eq!(k.event_bus.buffered_count(EventKind::ActionRejected), 1);

        assert_eq!(k.interact_alternate(counter), Err(Rejection::InventoryFull));
        assert_eq!(k.plate(plate).unwrap().item_ids(), vec![cheese()]);
        assert_eq!(k.inventory(), &inventory);
        assert_eq!(k.event_bus.buffered_count(EventKind::ActionRejected), 2);
        assert_eq!(k.thought(), Some("I need to free up some space in my inventory."));
    }
}

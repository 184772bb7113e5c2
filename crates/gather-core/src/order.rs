//! Timed meal orders.
//!
//! The [`MealOrderEngine`] owns the active orders, the meals they may be
//! drawn from, and the RNG that picks meals, intervals and time windows.
//! Each tick advances every order first, sweeps finished orders, and only
//! then considers spawning a new one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::{ConfigError, OrderConfig, OrderTiming};
use crate::fixed::{Seconds, fixed64_to_f64, percent_of};
use crate::id::{MealId, OrderId};
use crate::plate::Plate;
use crate::rejection::PlateMismatch;
use crate::rng::SimRng;

// ---------------------------------------------------------------------------
// Active orders
// ---------------------------------------------------------------------------

/// A time threshold crossed by an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderMilestone {
    /// Half the time is gone.
    Halfway,
    /// A quarter remains.
    HurryUp,
    /// A tenth remains.
    Critical,
    Expired,
}

impl OrderMilestone {
    /// Milestones in firing order with the remaining percentage that fires them.
    const SCHEDULE: [(OrderMilestone, u8); 4] = [
        (OrderMilestone::Halfway, 50),
        (OrderMilestone::HurryUp, 25),
        (OrderMilestone::Critical, 10),
        (OrderMilestone::Expired, 0),
    ];
}

/// A customer order in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveOrder {
    id: OrderId,
    meal: MealId,
    remaining: Seconds,
    total: Seconds,
    completed: bool,
    fired: [bool; 4],
}

impl ActiveOrder {
    pub fn new(id: OrderId, meal: MealId, total: Seconds) -> Self {
        Self {
            id,
            meal,
            remaining: total,
            total,
            completed: false,
            fired: [false; 4],
        }
    }

    /// Rebuild a saved order. Milestones already behind it are marked as
    /// fired so they are not announced twice.
    pub fn restore(id: OrderId, meal: MealId, total: Seconds, remaining: Seconds) -> Self {
        let mut order = Self::new(id, meal, total);
        order.remaining = remaining.min(total);
        for (i, (_, fraction)) in OrderMilestone::SCHEDULE.iter().enumerate() {
            order.fired[i] = order.remaining <= order.threshold(*fraction);
        }
        order
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn meal(&self) -> MealId {
        self.meal
    }

    pub fn remaining(&self) -> Seconds {
        self.remaining
    }

    pub fn total(&self) -> Seconds {
        self.total
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_expired(&self) -> bool {
        self.fired[3]
    }

    /// Completed or expired; no further events.
    pub fn is_finished(&self) -> bool {
        self.completed || self.is_expired()
    }

    fn threshold(&self, percent: u8) -> Seconds {
        percent_of(self.total, percent)
    }

    /// Count down and report the milestones crossed, in order, each once.
    pub fn advance(&mut self, dt: Seconds) -> Vec<OrderMilestone> {
        if self.is_finished() {
            return Vec::new();
        }
        self.remaining = (self.remaining - dt).max(Seconds::ZERO);
        let mut crossed = Vec::new();
        for (i, (milestone, percent)) in OrderMilestone::SCHEDULE.iter().enumerate() {
            if !self.fired[i] && self.remaining <= self.threshold(*percent) {
                self.fired[i] = true;
                crossed.push(*milestone);
            }
        }
        crossed
    }

    /// Mark delivered. Has no effect on a finished order.
    pub fn complete(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.completed = true;
        true
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// What one engine tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderTick {
    pub milestones: Vec<(OrderId, MealId, OrderMilestone)>,
    /// Orders swept because they were completed or expired.
    pub removed: Vec<OrderId>,
    pub created: Option<(OrderId, MealId, Seconds)>,
}

/// Generates, times and fulfils meal orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealOrderEngine {
    timing: OrderTiming,
    orders: Vec<ActiveOrder>,
    unlocked: Vec<MealId>,
    max_active: u32,
    next_order_in: Seconds,
    next_id: u64,
    rng: SimRng,
}

impl MealOrderEngine {
    /// Fails when a time setting does not fit the simulation's seconds.
    pub fn new(config: &OrderConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            timing: config.timing()?,
            max_active: config.max_active,
            rng: SimRng::new(config.seed),
            orders: Vec::new(),
            unlocked: Vec::new(),
            next_order_in: Seconds::ZERO,
            next_id: 0,
        })
    }

    pub fn orders(&self) -> &[ActiveOrder] {
        &self.orders
    }

    pub fn order(&self, id: OrderId) -> Option<&ActiveOrder> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn unlocked_meals(&self) -> &[MealId] {
        &self.unlocked
    }

    pub fn max_active(&self) -> u32 {
        self.max_active
    }

    pub fn next_order_in(&self) -> Seconds {
        self.next_order_in
    }

    pub fn rng(&self) -> &SimRng {
        &self.rng
    }

    /// Add a meal to the unlocked pool. Returns false if already present.
    pub fn add_unlocked_meal(&mut self, meal: MealId) -> bool {
        if self.unlocked.contains(&meal) {
            return false;
        }
        self.unlocked.push(meal);
        true
    }

    pub fn set_max_active(&mut self, max: u32) {
        self.max_active = max;
    }

    /// Drop every order; the next tick may spawn immediately.
    pub fn reset(&mut self) {
        self.orders.clear();
        self.next_order_in = Seconds::ZERO;
    }

    /// Advance all orders, sweep finished ones, then maybe spawn.
    ///
    /// `rank_pool` holds the current rank's meals; it is preferred with the
    /// configured weight when non-empty.
    pub fn tick(&mut self, dt: Seconds, rank_pool: &[MealId]) -> OrderTick {
        let mut result = OrderTick::default();

        for order in &mut self.orders {
            for milestone in order.advance(dt) {
                result.milestones.push((order.id, order.meal, milestone));
            }
        }

        result.removed = self
            .orders
            .iter()
            .filter(|o| o.is_finished())
            .map(|o| o.id)
            .collect();
        if !result.removed.is_empty() {
            self.orders.retain(|o| !o.is_finished());
        }

        if self.next_order_in > Seconds::ZERO {
            self.next_order_in -= dt;
        }
        let below_cap = (self.orders.len() as u32) < self.max_active;
        if (below_cap && self.next_order_in <= Seconds::ZERO) || self.orders.is_empty() {
            result.created = self.generate(rank_pool);
            let (min, max) = self.timing.interval;
            self.next_order_in = self.rng.range(min, max);
        }
        result
    }

    fn generate(&mut self, rank_pool: &[MealId]) -> Option<(OrderId, MealId, Seconds)> {
        if self.orders.len() as u32 >= self.max_active {
            return None;
        }
        let use_rank = !rank_pool.is_empty() && self.rng.chance(self.timing.rank_weight);
        let pool = if use_rank { rank_pool } else { &self.unlocked };
        if pool.is_empty() {
            return None;
        }
        let meal = pool[self.rng.index(pool.len())];
        let (min, max) = self.timing.window;
        let total = self.rng.range(min, max);
        let id = self.allocate_id();
        debug!(order = id.0, meal = meal.0, seconds = fixed64_to_f64(total), "order created");
        self.orders.push(ActiveOrder::new(id, meal, total));
        Some((id, meal, total))
    }

    fn allocate_id(&mut self) -> OrderId {
        let id = OrderId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Fulfil the first live order whose meal the plate satisfies. On
    /// failure nothing changes and the last mismatch is reported.
    pub fn deliver(&mut self, catalog: &Catalog, plate: &Plate) -> Result<(OrderId, MealId), PlateMismatch> {
        let mut mismatch = PlateMismatch::NoActiveOrders;
        let mut found = None;
        for (index, order) in self.orders.iter().enumerate() {
            if order.is_finished() {
                continue;
            }
            let Some(meal) = catalog.get_meal(order.meal) else {
                continue;
            };
            match plate.matches_meal(catalog, meal) {
                Ok(()) => {
                    found = Some(index);
                    break;
                }
                Err(e) => mismatch = e,
            }
        }
        let index = found.ok_or(mismatch)?;
        Ok(self.complete_at(index))
    }

    /// Complete the oldest live order regardless of plate.
    pub fn complete_first(&mut self) -> Option<(OrderId, MealId)> {
        let index = self.orders.iter().position(|o| !o.is_finished())?;
        Some(self.complete_at(index))
    }

    fn complete_at(&mut self, index: usize) -> (OrderId, MealId) {
        let mut order = self.orders.remove(index);
        order.complete();
        debug!(order = order.id.0, meal = order.meal.0, "order completed");
        (order.id, order.meal)
    }

    /// Re-add a saved order.
    pub fn restore_order(&mut self, meal: MealId, total: Seconds, remaining: Seconds) -> OrderId {
        let id = self.allocate_id();
        self.orders.push(ActiveOrder::restore(id, meal, total, remaining));
        id
    }

    pub(crate) fn restore_timing(&mut self, next_order_in: Seconds, rng: SimRng) {
        self.next_order_in = next_order_in;
        self.rng = rng;
    }
}

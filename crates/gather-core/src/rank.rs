//! Rank progression driven by delivered meals.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::id::{MealId, RankId};

/// Tracks delivered meals and which ranks they have unlocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTracker {
    delivered: u32,
    unlocked: Vec<RankId>,
}

impl RankTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    pub fn unlocked(&self) -> &[RankId] {
        &self.unlocked
    }

    /// The most recently unlocked rank.
    pub fn current(&self) -> Option<RankId> {
        self.unlocked.last().copied()
    }

    /// Meals of the current rank, preferred when spawning orders.
    pub fn current_meals<'c>(&self, catalog: &'c Catalog) -> &'c [MealId] {
        self.current()
            .and_then(|id| catalog.get_rank(id))
            .map(|rank| rank.meals.as_slice())
            .unwrap_or_default()
    }

    /// Count one delivery and unlock whatever it reaches.
    pub fn record_delivery(&mut self, catalog: &Catalog) -> Vec<RankId> {
        self.delivered += 1;
        self.unlock_reached(catalog)
    }

    /// Unlock, once each and in catalog order, every rank whose threshold
    /// is met.
    pub fn unlock_reached(&mut self, catalog: &Catalog) -> Vec<RankId> {
        let mut newly = Vec::new();
        for id in catalog.rank_ids() {
            let Some(rank) = catalog.get_rank(id) else {
                continue;
            };
            if self.delivered >= rank.min_meals_delivered && !self.unlocked.contains(&id) {
                debug!(rank = %rank.name, delivered = self.delivered, "rank unlocked");
                self.unlocked.push(id);
                newly.push(id);
            }
        }
        newly
    }

    /// Restore a saved count and the first `unlocked_count` ranks. Returns
    /// the ranks whose effects must be re-applied.
    pub fn restore(&mut self, catalog: &Catalog, delivered: u32, unlocked_count: usize) -> Vec<RankId> {
        self.delivered = delivered;
        let mut newly = Vec::new();
        for id in catalog.rank_ids().take(unlocked_count) {
            if !self.unlocked.contains(&id) {
                self.unlocked.push(id);
                newly.push(id);
            }
        }
        newly
    }
}

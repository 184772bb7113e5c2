//! Gather Core -- the kitchen simulation behind a cooking-and-farming game.
//!
//! This crate decides which recipe a set of ingredients satisfies, how
//! ingredients accumulate on stations and plates, how frying, cutting,
//! mixing and washing advance over time, and how a plate is matched
//! against timed meal orders. Rendering, audio, input and file parsing
//! live elsewhere; the core only consumes an immutable catalog and
//! discrete player commands, and emits typed events.
//!
//! # Step Pipeline
//!
//! Each call to [`kitchen::Kitchen::step`] advances the kitchen by `dt`
//! seconds through the following phases:
//!
//! 1. **Commands** -- Apply queued player actions in submission order.
//! 2. **Orders** -- Advance order timers, sweep finished orders, maybe spawn.
//! 3. **Stations** -- Advance every processing machine.
//! 4. **Deferred** -- Fire scheduled tasks (thought bubbles) that came due.
//! 5. **Delivery** -- Hand buffered events to listeners.
//!
//! All timers use [`fixed::Fixed64`] seconds and every random choice
//! comes from a seeded [`rng::SimRng`], so a kitchen replays bit-for-bit.
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Immutable items, recipes, meals and ranks,
//!   frozen by [`catalog::CatalogBuilder::build`].
//! - [`slot::Slot`] -- The owned unit of (item, amount, dirty) moved between
//!   inventory, stations and plates.
//! - [`matcher::find_match`] -- Sort-and-compare recipe matching with
//!   single-input substitution.
//! - [`station::Station`] -- Occupant stack plus a
//!   [`processing::ProcessingState`] machine.
//! - [`plate::Plate`] -- Up to four ingredients matched against a meal.
//! - [`order::MealOrderEngine`] -- Timed orders with one-shot milestones.
//! - [`kitchen::Kitchen`] -- Owns everything and runs the pipeline.
//! - [`event::EventBus`] -- Subscription-based event bus with buffered delivery.
//! - [`serialize`] -- Versioned save games via bitcode.

pub mod catalog;
pub mod command;
pub mod config;
pub mod cookbook;
pub mod economy;
pub mod event;
pub mod fixed;
pub mod id;
pub mod inventory;
pub mod kitchen;
pub mod matcher;
pub mod order;
pub mod plate;
pub mod processing;
pub mod rank;
pub mod rejection;
pub mod rng;
pub mod scheduler;
pub mod serialize;
pub mod slot;
pub mod station;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

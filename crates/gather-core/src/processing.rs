//! Station processing state machines.
//!
//! Every processing station kind shares one shape: something gates a
//! transition (a countdown or a counter of player actions), and when it
//! fires the matched recipe's output overwrites the first occupant.
//!
//! - **Cooking** (frying pan, oven, pot): `Idle -> Frying -> Finished ->
//!   Burnt -> Idle`. Remaining time is mirrored onto every occupant slot so
//!   an ingredient carried away mid-cook resumes where it stopped.
//! - **Cutting**: one step per alternate interaction up to the recipe's
//!   `progress_steps`.
//! - **Washing**: one step per alternate interaction up to a fixed
//!   threshold; clears the first occupant's dirty flag.
//! - **Mixing**: a countdown that only starts when every input line is
//!   present in full; consumes inputs and appends outputs.
//!
//! A running machine whose recipe no longer matches the occupants aborts
//! back to idle without producing anything.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{Catalog, RecipeDef, Rgba, StationKind};
use crate::fixed::Seconds;
use crate::id::{ItemId, RecipeId};
use crate::matcher::find_match;
use crate::slot::Slot;
use crate::station::{StationSlotStack, placed_payload};

// ---------------------------------------------------------------------------
// Machine types
// ---------------------------------------------------------------------------

/// Stage of a cooking machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CookState {
    #[default]
    Idle,
    Frying,
    Finished,
    Burnt,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CookingMachine {
    pub state: CookState,
    pub recipe: Option<RecipeId>,
    pub timer: Seconds,
    /// Recipes applied since the last fresh ingredient; bounds chaining.
    applied: Vec<RecipeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuttingMachine {
    pub progress: u32,
    pub recipe: Option<RecipeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WashingMachine {
    pub progress: u32,
    pub threshold: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MixerMachine {
    pub timer: Seconds,
    pub recipe: Option<RecipeId>,
}

/// Per-station processing state. Dispatches via enum match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProcessingState {
    PassThrough,
    Cooking(CookingMachine),
    Cutting(CuttingMachine),
    Washing(WashingMachine),
    Mixing(MixerMachine),
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One cut or wash increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepProgress {
    pub progress: u32,
    pub steps: u32,
    pub colors: Option<[Rgba; 2]>,
}

/// What happened during one machine update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessResult {
    /// Recipes whose output was produced.
    pub completed: Vec<RecipeId>,
    pub step: Option<StepProgress>,
    /// Item whose dirty flag was washed off.
    pub washed: Option<ItemId>,
    /// A running machine was reset because its recipe stopped matching.
    pub aborted: bool,
    pub state_changed: bool,
}

/// Progress values written to and read from saves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessingSnapshot {
    pub progress: u32,
    pub timer: Seconds,
    pub recipe: Option<RecipeId>,
    pub cook_state: CookState,
}

// ---------------------------------------------------------------------------
// ProcessingState dispatch
// ---------------------------------------------------------------------------

impl ProcessingState {
    pub fn for_kind(kind: StationKind, washing_threshold: u32) -> Self {
        match kind {
            StationKind::None => ProcessingState::PassThrough,
            StationKind::FryingPan | StationKind::Oven | StationKind::Pot => {
                ProcessingState::Cooking(CookingMachine::default())
            }
            StationKind::Cutting => ProcessingState::Cutting(CuttingMachine::default()),
            StationKind::Washing => ProcessingState::Washing(WashingMachine {
                progress: 0,
                threshold: washing_threshold.max(1),
            }),
            StationKind::Mixing => ProcessingState::Mixing(MixerMachine::default()),
        }
    }

    /// Advance time-driven machines by `dt`.
    pub fn tick(
        &mut self,
        stack: &mut StationSlotStack,
        catalog: &Catalog,
        recipes: &[RecipeId],
        dt: Seconds,
    ) -> ProcessResult {
        match self {
            ProcessingState::Cooking(m) => m.tick(stack, catalog, recipes, dt),
            ProcessingState::Mixing(m) => m.tick(stack, catalog, recipes, dt),
            ProcessingState::Cutting(m) => m.validate(stack, catalog, recipes),
            ProcessingState::PassThrough | ProcessingState::Washing(_) => ProcessResult::default(),
        }
    }

    /// React to a successful ingredient add.
    pub fn on_added(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> ProcessResult {
        match self {
            ProcessingState::Cooking(m) => {
                m.applied.clear();
                m.rearm(stack, catalog, recipes)
            }
            ProcessingState::Cutting(m) => m.rematch(stack, catalog, recipes),
            ProcessingState::Mixing(m) => m.try_start(stack, catalog, recipes),
            ProcessingState::Washing(m) => m.reset_if_empty(stack),
            ProcessingState::PassThrough => ProcessResult::default(),
        }
    }

    /// React to an occupant being taken away.
    pub fn on_removed(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> ProcessResult {
        match self {
            ProcessingState::Cooking(m) => {
                let running = m.is_running();
                let mut result = m.rearm(stack, catalog, recipes);
                result.aborted = running && m.recipe.is_none() && !stack.is_empty();
                result
            }
            ProcessingState::Cutting(m) => m.rematch(stack, catalog, recipes),
            ProcessingState::Mixing(m) => m.revalidate(stack, catalog, recipes),
            ProcessingState::Washing(m) => m.reset_if_empty(stack),
            ProcessingState::PassThrough => ProcessResult::default(),
        }
    }

    /// Alternate interaction. `None` when the machine has no alternate action.
    pub fn alternate(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> Option<ProcessResult> {
        match self {
            ProcessingState::Cutting(m) => Some(m.cut(stack, catalog, recipes)),
            ProcessingState::Washing(m) => Some(m.wash(stack, catalog)),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        match self {
            ProcessingState::Cooking(m) => m.is_running(),
            ProcessingState::Mixing(m) => m.timer > Seconds::ZERO,
            ProcessingState::Cutting(m) => m.progress > 0,
            ProcessingState::Washing(m) => m.progress > 0,
            ProcessingState::PassThrough => false,
        }
    }

    pub fn recipe(&self) -> Option<RecipeId> {
        match self {
            ProcessingState::Cooking(m) => m.recipe,
            ProcessingState::Cutting(m) => m.recipe,
            ProcessingState::Mixing(m) => m.recipe,
            ProcessingState::PassThrough | ProcessingState::Washing(_) => None,
        }
    }

    pub fn snapshot(&self) -> ProcessingSnapshot {
        match self {
            ProcessingState::Cooking(m) => ProcessingSnapshot {
                progress: 0,
                timer: m.timer,
                recipe: m.recipe,
                cook_state: m.state,
            },
            ProcessingState::Cutting(m) => ProcessingSnapshot {
                progress: m.progress,
                recipe: m.recipe,
                ..Default::default()
            },
            ProcessingState::Washing(m) => ProcessingSnapshot {
                progress: m.progress,
                ..Default::default()
            },
            ProcessingState::Mixing(m) => ProcessingSnapshot {
                timer: m.timer,
                recipe: m.recipe,
                ..Default::default()
            },
            ProcessingState::PassThrough => ProcessingSnapshot::default(),
        }
    }

    /// Restore saved progress onto freshly placed occupants.
    pub fn restore(
        &mut self,
        snapshot: ProcessingSnapshot,
        stack: &mut StationSlotStack,
        catalog: &Catalog,
        recipes: &[RecipeId],
    ) {
        match self {
            // The saved stage only applies while the occupants still match
            // the saved recipe; otherwise start over from the slot timers.
            ProcessingState::Cooking(m) => {
                let current = occupant_match(stack, catalog, recipes);
                if current.is_some() && current == snapshot.recipe {
                    m.recipe = current;
                    m.state = snapshot.cook_state;
                    m.timer = snapshot.timer;
                } else {
                    m.rearm(stack, catalog, recipes);
                }
            }
            ProcessingState::Cutting(m) => {
                m.recipe = snapshot.recipe;
                m.progress = snapshot.progress;
            }
            ProcessingState::Washing(m) => m.progress = snapshot.progress.min(m.threshold),
            ProcessingState::Mixing(m) => {
                m.recipe = snapshot.recipe;
                m.timer = snapshot.timer;
            }
            ProcessingState::PassThrough => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Overwrite the first occupant with the recipe's primary output and drop
/// every other occupant.
fn apply_output(stack: &mut StationSlotStack, catalog: &Catalog, recipe: &RecipeDef) {
    let Some(output) = recipe.primary_output() else {
        return;
    };
    if let Some(first) = stack.first_mut() {
        first.set_item(output.item, output.amount);
        first.set_payload(placed_payload(catalog, output.item));
        first.set_timer(Seconds::ZERO);
    }
    stack.truncate(1);
}

fn occupant_match(stack: &StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> Option<RecipeId> {
    find_match(catalog, &stack.item_types(), recipes)
}

/// Every input line has a single occupant holding at least its amount.
fn inputs_satisfied(stack: &StationSlotStack, recipe: &RecipeDef) -> bool {
    recipe.inputs.iter().all(|line| {
        stack
            .slots()
            .iter()
            .any(|slot| slot.item() == Some(line.item) && slot.amount() >= line.amount)
    })
}

// ---------------------------------------------------------------------------
// Cooking
// ---------------------------------------------------------------------------

impl CookingMachine {
    pub fn is_running(&self) -> bool {
        matches!(self.state, CookState::Frying | CookState::Finished)
    }

    fn reset(&mut self, stack: &mut StationSlotStack) {
        self.state = CookState::Idle;
        self.recipe = None;
        self.timer = Seconds::ZERO;
        stack.set_all_timers(Seconds::ZERO);
    }

    /// Re-match after the occupants changed and pick up the newest
    /// occupant's remaining time, or start a full cook for it.
    fn rearm(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> ProcessResult {
        let mut result = ProcessResult {
            state_changed: self.state != CookState::Idle,
            ..Default::default()
        };
        if stack.is_empty() {
            self.reset(stack);
            return result;
        }
        self.state = CookState::Idle;
        self.recipe = occupant_match(stack, catalog, recipes);
        let cook_time = self
            .recipe
            .and_then(|id| catalog.get_recipe(id))
            .map(|r| r.cook_time);
        let Some(last) = stack.last_mut() else {
            return result;
        };
        match cook_time {
            Some(cook_time) if last.timer() <= Seconds::ZERO => {
                last.set_timer(cook_time);
                self.timer = cook_time;
            }
            _ => self.timer = last.timer(),
        }
        result.state_changed |= self.recipe.is_some();
        result
    }

    fn tick(
        &mut self,
        stack: &mut StationSlotStack,
        catalog: &Catalog,
        recipes: &[RecipeId],
        dt: Seconds,
    ) -> ProcessResult {
        let mut result = ProcessResult::default();
        if stack.is_empty() {
            if self.state != CookState::Idle || self.recipe.is_some() {
                self.reset(stack);
                result.state_changed = true;
            }
            return result;
        }
        if self.is_running() && occupant_match(stack, catalog, recipes) != self.recipe {
            debug!(recipe = ?self.recipe, "cooking aborted, recipe no longer matches");
            self.reset(stack);
            result.aborted = true;
            result.state_changed = true;
            return result;
        }
        let Some(recipe_id) = self.recipe else {
            return result;
        };
        let Some(recipe) = catalog.get_recipe(recipe_id) else {
            self.reset(stack);
            return result;
        };

        match self.state {
            CookState::Idle => {
                let first = stack.first().and_then(Slot::item);
                if first != recipe.primary_output().map(|o| o.item) {
                    self.state = CookState::Frying;
                    result.state_changed = true;
                }
            }
            CookState::Frying => {
                self.timer -= dt;
                stack.set_all_timers(self.timer.max(Seconds::ZERO));
                if self.timer <= Seconds::ZERO {
                    apply_output(stack, catalog, recipe);
                    result.completed.push(recipe_id);
                    result.state_changed = true;
                    self.applied.push(recipe_id);
                    stack.set_all_timers(Seconds::ZERO);
                    self.chain(stack, catalog, recipes);
                }
            }
            CookState::Finished => {
                self.timer -= dt;
                stack.set_all_timers(self.timer.max(Seconds::ZERO));
                if self.timer <= Seconds::ZERO {
                    apply_output(stack, catalog, recipe);
                    self.applied.push(recipe_id);
                    self.state = CookState::Burnt;
                    result.state_changed = true;
                }
            }
            CookState::Burnt => {
                self.timer = Seconds::ZERO;
                stack.set_all_timers(Seconds::ZERO);
                self.state = CookState::Idle;
                result.state_changed = true;
            }
        }
        result
    }

    /// After a cook completes, look for a follow-up recipe on the new
    /// occupant. Its cook time becomes the hold before burning.
    fn chain(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) {
        let next = occupant_match(stack, catalog, recipes);
        match next.and_then(|id| catalog.get_recipe(id).map(|r| (id, r.cook_time))) {
            Some((id, hold)) if !self.applied.contains(&id) => {
                self.recipe = Some(id);
                self.timer = hold;
                self.state = CookState::Finished;
            }
            Some((id, _)) => {
                debug!(recipe = ?id, "cooking chain revisits a recipe, stopping");
                self.recipe = None;
                self.timer = Seconds::ZERO;
                self.state = CookState::Idle;
            }
            None => {
                self.recipe = None;
                self.timer = Seconds::ZERO;
                self.state = CookState::Idle;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Cutting
// ---------------------------------------------------------------------------

impl CuttingMachine {
    fn rematch(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> ProcessResult {
        let mut result = ProcessResult::default();
        let current = occupant_match(stack, catalog, recipes);
        if current.is_none() {
            result.aborted = self.progress > 0;
            result.state_changed = self.recipe.is_some() || self.progress > 0;
            self.progress = 0;
        }
        self.recipe = current;
        result
    }

    fn validate(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> ProcessResult {
        if self.recipe.is_some() && occupant_match(stack, catalog, recipes) != self.recipe {
            return self.rematch(stack, catalog, recipes);
        }
        ProcessResult::default()
    }

    fn cut(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> ProcessResult {
        let mut result = ProcessResult::default();
        if stack.is_empty() {
            return result;
        }
        if self.recipe.is_none() {
            self.recipe = occupant_match(stack, catalog, recipes);
        }
        let Some((recipe_id, recipe)) = self
            .recipe
            .and_then(|id| catalog.get_recipe(id).map(|r| (id, r)))
        else {
            return result;
        };

        self.progress += 1;
        result.step = Some(StepProgress {
            progress: self.progress,
            steps: recipe.progress_steps,
            colors: recipe.vfx_colors,
        });
        if self.progress >= recipe.progress_steps {
            self.progress = 0;
            apply_output(stack, catalog, recipe);
            result.completed.push(recipe_id);
            result.state_changed = true;
            self.recipe = occupant_match(stack, catalog, recipes);
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Washing
// ---------------------------------------------------------------------------

impl WashingMachine {
    fn reset_if_empty(&mut self, stack: &StationSlotStack) -> ProcessResult {
        if stack.is_empty() && self.progress > 0 {
            self.progress = 0;
            return ProcessResult {
                state_changed: true,
                ..Default::default()
            };
        }
        ProcessResult::default()
    }

    fn wash(&mut self, stack: &mut StationSlotStack, catalog: &Catalog) -> ProcessResult {
        let mut result = ProcessResult::default();
        let Some(first) = stack.first_mut() else {
            return result;
        };
        if !first.is_dirty() {
            return result;
        }
        self.progress += 1;
        result.step = Some(StepProgress {
            progress: self.progress,
            steps: self.threshold,
            colors: None,
        });
        if self.progress >= self.threshold {
            self.progress = 0;
            first.set_dirty(catalog, false);
            result.washed = first.item();
            result.state_changed = true;
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Mixing
// ---------------------------------------------------------------------------

impl MixerMachine {
    fn reset(&mut self) {
        self.timer = Seconds::ZERO;
        self.recipe = None;
    }

    /// Match the occupants and start the countdown once every input line
    /// is present in full. A running mix of the same recipe keeps going.
    fn try_start(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> ProcessResult {
        let mut result = ProcessResult::default();
        let candidate = occupant_match(stack, catalog, recipes);
        if candidate == self.recipe && self.timer > Seconds::ZERO {
            return result;
        }
        result.state_changed = self.timer > Seconds::ZERO;
        self.recipe = candidate;
        self.timer = Seconds::ZERO;
        if let Some(recipe) = candidate.and_then(|id| catalog.get_recipe(id))
            && inputs_satisfied(stack, recipe)
        {
            self.timer = recipe.cook_time.max(Seconds::DELTA);
            result.state_changed = true;
        }
        result
    }

    fn revalidate(&mut self, stack: &mut StationSlotStack, catalog: &Catalog, recipes: &[RecipeId]) -> ProcessResult {
        let mut result = ProcessResult::default();
        let current = occupant_match(stack, catalog, recipes);
        let satisfied = current
            .and_then(|id| catalog.get_recipe(id))
            .is_some_and(|r| inputs_satisfied(stack, r));
        if self.timer > Seconds::ZERO && (current != self.recipe || !satisfied) {
            debug!(recipe = ?self.recipe, "mixing aborted, inputs no longer present");
            result.aborted = true;
            result.state_changed = true;
            self.timer = Seconds::ZERO;
        }
        if self.timer <= Seconds::ZERO {
            self.recipe = current;
        }
        result
    }

    fn tick(
        &mut self,
        stack: &mut StationSlotStack,
        catalog: &Catalog,
        recipes: &[RecipeId],
        dt: Seconds,
    ) -> ProcessResult {
        if self.timer <= Seconds::ZERO {
            return ProcessResult::default();
        }
        let result = self.revalidate(stack, catalog, recipes);
        if result.aborted {
            return result;
        }
        let Some((recipe_id, recipe)) = self
            .recipe
            .and_then(|id| catalog.get_recipe(id).map(|r| (id, r)))
        else {
            self.reset();
            return ProcessResult {
                aborted: true,
                state_changed: true,
                ..Default::default()
            };
        };

        self.timer -= dt;
        if self.timer > Seconds::ZERO {
            return result;
        }

        for line in &recipe.inputs {
            if let Some(slot) = stack
                .slots_mut()
                .iter_mut()
                .find(|slot| slot.item() == Some(line.item))
            {
                slot.remove_amount(line.amount);
            }
        }
        stack.retain_occupied();
        for line in &recipe.outputs {
            let slot = Slot::new(line.item, line.amount).with_payload(placed_payload(catalog, line.item));
            if !stack.push(slot) {
                warn!(item = ?line.item, "mixer output dropped, station is full");
            }
        }
        self.reset();
        ProcessResult {
            completed: vec![recipe_id],
            state_changed: true,
            ..Default::default()
        }
    }
}

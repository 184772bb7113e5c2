//! Typed event system with pre-allocated ring buffers.
//!
//! Events are emitted while a kitchen step runs (and by direct player
//! actions between steps) and delivered in batch at the end of the next
//! [`crate::kitchen::Kitchen::step`]. Each event kind has its own
//! [`EventBuffer`] with a configurable capacity.
//!
//! Listeners are read-only: they observe the kitchen, they never mutate
//! it, and nothing they do can fail a step.
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventBus::suppress`], which prevents
//! any allocation or recording for that kind.

use crate::catalog::{Rgba, StationKind};
use crate::fixed::{Seconds, Ticks};
use crate::id::*;
use crate::order::OrderMilestone;
use crate::rejection::Rejection;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A kitchen event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // -- Orders --
    OrderCreated {
        order: OrderId,
        meal: MealId,
        time_limit: Seconds,
        tick: Ticks,
    },
    OrderCompleted {
        order: OrderId,
        meal: MealId,
        tick: Ticks,
    },
    OrderMilestone {
        order: OrderId,
        meal: MealId,
        milestone: OrderMilestone,
        tick: Ticks,
    },

    // -- Stations --
    IngredientAdded {
        station: StationId,
        item: ItemId,
        amount: u32,
        tick: Ticks,
    },
    IngredientRemoved {
        station: StationId,
        item: ItemId,
        amount: u32,
        tick: Ticks,
    },
    RecipeCompleted {
        station: StationId,
        recipe: RecipeId,
        tick: Ticks,
    },
    /// One cut or wash.
    ProcessingStep {
        station: StationId,
        progress: u32,
        steps: u32,
        colors: Option<[Rgba; 2]>,
        tick: Ticks,
    },
    IngredientWashed {
        station: StationId,
        item: ItemId,
        tick: Ticks,
    },
    ProcessingAborted {
        station: StationId,
        tick: Ticks,
    },
    StationPlaced {
        station: StationId,
        kind: StationKind,
        tick: Ticks,
    },

    // -- Player and progression --
    ActionRejected {
        rejection: Rejection,
        thought: String,
        tick: Ticks,
    },
    RankUnlocked {
        rank: RankId,
        tick: Ticks,
    },
    RecipeDiscovered {
        recipe: RecipeId,
        tick: Ticks,
    },
    MoneyChanged {
        money: u32,
        delta: i64,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    OrderCreated,
    OrderCompleted,
    OrderMilestone,
    IngredientAdded,
    IngredientRemoved,
    RecipeCompleted,
    ProcessingStep,
    IngredientWashed,
    ProcessingAborted,
    StationPlaced,
    ActionRejected,
    RankUnlocked,
    RecipeDiscovered,
    MoneyChanged,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 14;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::OrderCreated { .. } => EventKind::OrderCreated,
            Event::OrderCompleted { .. } => EventKind::OrderCompleted,
            Event::OrderMilestone { .. } => EventKind::OrderMilestone,
            Event::IngredientAdded { .. } => EventKind::IngredientAdded,
            Event::IngredientRemoved { .. } => EventKind::IngredientRemoved,
            Event::RecipeCompleted { .. } => EventKind::RecipeCompleted,
            Event::ProcessingStep { .. } => EventKind::ProcessingStep,
            Event::IngredientWashed { .. } => EventKind::IngredientWashed,
            Event::ProcessingAborted { .. } => EventKind::ProcessingAborted,
            Event::StationPlaced { .. } => EventKind::StationPlaced,
            Event::ActionRejected { .. } => EventKind::ActionRejected,
            Event::RankUnlocked { .. } => EventKind::RankUnlocked,
            Event::RecipeDiscovered { .. } => EventKind::RecipeDiscovered,
            Event::MoneyChanged { .. } => EventKind::MoneyChanged,
        }
    }
}

impl EventKind {
    /// Convert to usize index for array lookups.
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer: pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event into the ring buffer. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events that were dropped because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Iterate over events in order from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        // Once full, head points at the oldest entry.
        let start = if self.len < self.capacity() { 0 } else { self.head };
        let capacity = self.capacity();
        (0..self.len).filter_map(move |offset| self.events[(start + offset) % capacity].as_ref())
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// Subscribers
// ---------------------------------------------------------------------------

/// A listener receives events read-only.
pub type Listener = Box<dyn FnMut(&Event)>;

/// Optional predicate that filters events for a subscriber.
pub type EventFilter = Box<dyn Fn(&Event) -> bool>;

/// Priority level for event subscribers. Lower priorities run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriberPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

/// Handle returned by [`EventBus::subscribe`]; pass it to
/// [`EventBus::unsubscribe`] to stop receiving events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct SubscriberEntry {
    id: SubscriptionId,
    listener: Listener,
    priority: SubscriberPriority,
    filter: Option<EventFilter>,
}

impl std::fmt::Debug for SubscriberEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberEntry")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// The central event bus. Holds one ring buffer per event kind, subscriber
/// lists, and suppression flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    subscribers: [Vec<SubscriberEntry>; EVENT_KIND_COUNT],
    default_capacity: usize,
    /// Ids double as insertion order for stable sorting.
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a new event bus with the given default buffer capacity per kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            subscribers: std::array::from_fn(|_| Vec::new()),
            default_capacity,
            next_id: 0,
        }
    }

    /// Suppress an event kind. Suppressed events are never allocated or buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Buffer an event for the next delivery. No-op if its kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Listen to one event kind with Normal priority and no filter.
    pub fn on(&mut self, kind: EventKind, listener: Listener) -> SubscriptionId {
        self.subscribe(kind, SubscriberPriority::Normal, None, listener)
    }

    /// Listen to one event kind with explicit priority and optional filter.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        priority: SubscriberPriority,
        filter: Option<EventFilter>,
        listener: Listener,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers[kind.index()].push(SubscriberEntry {
            id,
            listener,
            priority,
            filter,
        });
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for list in &mut self.subscribers {
            if let Some(pos) = list.iter().position(|entry| entry.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.iter().map(Vec::len).sum()
    }

    /// Deliver all buffered events to subscribers, then clear the buffers.
    ///
    /// For each event kind, subscribers run in `(priority, subscription
    /// order)`, each seeing events oldest-to-newest and skipping those its
    /// filter rejects.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            let Some(buffer) = self.buffers[idx].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }
            let events: Vec<Event> = buffer.iter().cloned().collect();
            buffer.clear();

            let subscribers = &mut self.subscribers[idx];
            subscribers.sort_by_key(|entry| (entry.priority, entry.id));
            for entry in subscribers.iter_mut() {
                for event in &events {
                    if let Some(filter) = &entry.filter
                        && !filter(event)
                    {
                        continue;
                    }
                    (entry.listener)(event);
                }
            }
        }
    }

    /// Get the event buffer for a specific event kind (read-only).
    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Events of a kind waiting for delivery.
    pub fn pending(&self, kind: EventKind) -> Vec<Event> {
        self.buffer(kind)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffer(kind).map_or(0, EventBuffer::len)
    }

    /// Total events ever emitted for a kind (including dropped).
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffer(kind).map_or(0, EventBuffer::total_written)
    }

    /// Clear all buffers. Does not remove subscribers or suppression settings.
    pub fn clear_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

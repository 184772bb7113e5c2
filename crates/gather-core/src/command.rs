//! Player input commands.
//!
//! The game client queues commands as the player acts; the kitchen drains
//! the queue at the start of each step so every mutation happens at a step
//! boundary, in submission order.

use crate::fixed::Ticks;
use crate::id::{ItemId, StationId};

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Primary interaction: put the held item into a station, or take from it.
    Interact { station: StationId },
    /// Secondary interaction: cut, wash, or shuffle plate contents.
    InteractAlternate { station: StationId },
    /// Change the selected inventory slot.
    SelectSlot { index: usize },
    /// Pick up a fresh, empty plate of the given item.
    TakePlate { plate_item: ItemId },
    /// Pick up loose items from the world (supply crates, the garden).
    PickUp {
        item: ItemId,
        amount: u32,
        dirty: bool,
    },
    /// Hand the held plate to the order window.
    Deliver,
    /// Throw away the selected slot, or the held plate.
    Trash,
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// A queue of commands waiting for the next step boundary.
///
/// Supports optional history tracking for replay and debugging.
#[derive(Debug)]
pub struct CommandQueue {
    pending: Vec<Command>,
    /// Executed commands: (tick, command).
    history: Vec<(Ticks, Command)>,
    /// 0 = no history.
    max_history: usize,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::with_max_history(0)
    }

    /// Create a queue that retains up to `max_history` executed commands.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            pending: Vec::new(),
            history: Vec::new(),
            max_history,
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Drain all pending commands, recording them in history at `tick`.
    /// Returns the drained commands in submission order.
    pub fn drain(&mut self, tick: Ticks) -> Vec<Command> {
        let commands: Vec<Command> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            self.history
                .extend(commands.iter().map(|cmd| (tick, cmd.clone())));
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        commands
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(Ticks, Command)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pick_up(item: u32) -> Command {
        Command::PickUp {
            item: ItemId(item),
            amount: 1,
            dirty: false,
        }
    }

    #[test]
    fn drain_preserves_submission_order() {
        let mut queue = CommandQueue::new();
        queue.push(pick_up(0));
        queue.push_batch([Command::SelectSlot { index: 2 }, Command::Trash]);
        assert_eq!(queue.pending_count(), 3);

        let drained = queue.drain(0);
        assert_eq!(
            drained,
            vec![pick_up(0), Command::SelectSlot { index: 2 }, Command::Trash]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn no_history_by_default() {
        let mut queue = CommandQueue::new();
        queue.push(Command::Deliver);
        queue.drain(4);
        assert!(queue.history().is_empty());
    }

    #[test]
    fn history_is_trimmed_to_limit() {
        let mut queue = CommandQueue::with_max_history(2);
        queue.push(pick_up(0));
        queue.drain(1);
        queue.push(pick_up(1));
        queue.push(pick_up(2));
        queue.drain(2);

        assert_eq!(queue.history(), &[(2, pick_up(1)), (2, pick_up(2))]);
        queue.clear_history();
        assert!(queue.history().is_empty());
    }
}

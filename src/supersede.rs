//! Request supersession for one logical search slot.
//!
//! Every new search takes a ticket from the slot. When a result arrives it
//! is only accepted if its ticket is still the newest one; otherwise a later
//! search has been issued and the stale result is dropped.
//!
//! ```rust
//! use cardvault_sdk::SearchSlot;
//!
//! let slot = SearchSlot::new();
//! let first = slot.issue();
//! let second = slot.issue();
//!
//! assert_eq!(slot.accept(second, "second"), Some("second"));
//! assert_eq!(slot.accept(first, "first"), None);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifies one issued search within a [`SearchSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

impl SearchTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// A generation counter shared by everything that searches into the same
/// displayed result. Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct SearchSlot {
    generation: Arc<AtomicU64>,
}

impl SearchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search, superseding every earlier ticket.
    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether no newer ticket has been issued since `ticket`.
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Hand back `value` if `ticket` is still current, otherwise drop it.
    pub fn accept<T>(&self, ticket: SearchTicket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }

    /// Supersede any in-flight search without starting a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

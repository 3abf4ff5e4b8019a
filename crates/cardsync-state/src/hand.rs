//! Local hand ordering and reconciliation.
//!
//! The server declares WHICH cards are in the player's hand; the player
//! decides the ORDER they sit in. [`LocalHand`] keeps the ordered view
//! and merges each authoritative set into it without disturbing any
//! arrangement the user has already made: survivors keep their relative
//! order, new cards go to the end in server order.

use std::collections::HashSet;

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandOutcome {
    /// The hand was empty and took the server order verbatim. The driver
    /// surfaces this to presentation exactly once per population.
    Initialized,
    /// The authoritative set was merged into the existing order.
    Merged,
}

/// The player's locally-ordered hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalHand {
    order: Vec<String>,
}

impl LocalHand {
    /// Creates an empty hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current order, for presentation.
    pub fn cards(&self) -> &[String] {
        &self.order
    }

    /// Merges an authoritative card set into the local order.
    ///
    /// Cards no longer present are removed, preserving the relative order
    /// of the survivors; cards not yet present are appended in the order
    /// the server gave them. After this call the hand holds exactly the
    /// authoritative set.
    pub fn reconcile(&mut self, authoritative: &[String]) -> HandOutcome {
        if self.order.is_empty() {
            self.order = authoritative.to_vec();
            return HandOutcome::Initialized;
        }

        let fresh: HashSet<&str> =
            authoritative.iter().map(String::as_str).collect();
        let existing: HashSet<String> = self.order.iter().cloned().collect();

        self.order.retain(|card| fresh.contains(card.as_str()));
        for card in authoritative {
            if !existing.contains(card) {
                self.order.push(card.clone());
            }
        }

        HandOutcome::Merged
    }

    /// Moves a card from one position to another. This is the external
    /// manual-reorder mutation; reconciliation never undoes it as long as
    /// the card stays in the authoritative set. Out-of-range indices are
    /// ignored.
    pub fn move_card(&mut self, from: usize, to: usize) {
        if from >= self.order.len() || to >= self.order.len() {
            tracing::debug!(from, to, len = self.order.len(), "ignoring out-of-range move");
            return;
        }
        let card = self.order.remove(from);
        self.order.insert(to, card);
    }
}

// =========================================================================
// Tests
// =========================================================================

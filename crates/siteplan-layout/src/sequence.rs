//! Reorderable item sequence backing manual-mode layout.
//!
//! The order of items is the only mutable state driving manual placement.
//! It changes through two operations, both best-effort:
//!
//! - **Move to position**: take the source out and reinsert it at the index the
//!   target occupied before removal (the list-reorder `array_move`).
//! - **Move to end**: used when a drag ends over no drop target.
//!
//! Operations that reference ids not in the sequence leave it unchanged and
//! report why; a stale gesture racing a configuration reset never fails.
//!
//! # Invariants
//!
//! 1. No duplicate ids. Expansion generates unique ids and every operation is
//!    a permutation.
//! 2. The sequence is replaced wholesale on every quantity change; no manual
//!    order survives re-expansion.

use std::collections::BTreeSet;
use std::sync::Arc;

use siteplan_core::{Catalog, QuantityConfig};

use crate::PlacementItem;

/// A reorder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOperation {
    /// Move `source` to the slot currently held by `target`.
    MoveToPosition { source: String, target: String },
    /// Move `source` to the end.
    MoveToEnd { source: String },
}

/// Why an operation left the sequence untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoopReason {
    SelfMove,
    AlreadyLast,
    UnknownSource,
    UnknownTarget,
    /// Reordering is disabled for the current mode.
    Locked,
}

/// Result of applying a [`SequenceOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    Moved { from: usize, to: usize },
    Unchanged(NoopReason),
}

impl SequenceOutcome {
    #[must_use]
    pub const fn is_moved(self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Ordered list of placement items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemSequence {
    items: Vec<PlacementItem>,
}

impl ItemSequence {
    /// Expand quantities into items, in catalog order.
    ///
    /// Ids are `"{unit_id}-{ordinal}"` with ordinals counted from zero.
    #[must_use]
    pub fn expand(catalog: &Catalog, quantities: &QuantityConfig) -> Self {
        let mut items = Vec::with_capacity(quantities.total_items(catalog));
        for unit in catalog.iter() {
            for ordinal in 0..quantities.get(&unit.id) {
                items.push(PlacementItem::new(
                    format!("{}-{ordinal}", unit.id),
                    Arc::clone(unit),
                ));
            }
        }
        Self { items }
    }

    /// Wrap pre-built items, dropping any later duplicate ids.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = PlacementItem>) -> Self {
        let mut seen = BTreeSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[PlacementItem] {
        &self.items
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Apply a reorder request.
    pub fn apply(&mut self, operation: &SequenceOperation) -> SequenceOutcome {
        match operation {
            SequenceOperation::MoveToPosition { source, target } => {
                self.move_to_position(source, target)
            }
            SequenceOperation::MoveToEnd { source } => self.move_to_end(source),
        }
    }

    /// Remove `source` and reinsert it at `target`'s index.
    pub fn move_to_position(&mut self, source: &str, target: &str) -> SequenceOutcome {
        if source == target {
            return SequenceOutcome::Unchanged(NoopReason::SelfMove);
        }
        let Some(from) = self.position(source) else {
            return SequenceOutcome::Unchanged(NoopReason::UnknownSource);
        };
        let Some(to) = self.position(target) else {
            return SequenceOutcome::Unchanged(NoopReason::UnknownTarget);
        };

        let moved = self.items.remove(from);
        self.items.insert(to, moved);
        SequenceOutcome::Moved { from, to }
    }

    /// Remove `source` and append it.
    pub fn move_to_end(&mut self, source: &str) -> SequenceOutcome {
        let Some(from) = self.position(source) else {
            return SequenceOutcome::Unchanged(NoopReason::UnknownSource);
        };
        let last = self.items.len() - 1;
        if from == last {
            return SequenceOutcome::Unchanged(NoopReason::AlreadyLast);
        }

        let moved = self.items.remove(from);
        self.items.push(moved);
        SequenceOutcome::Moved { from, to: last }
    }

    /// Reorder to match a persisted id list.
    ///
    /// Listed ids that exist come first, in listed order; unknown and repeated
    /// ids are skipped. Items not listed keep their relative order after them.
    /// Returns how many listed ids were matched.
    pub fn apply_order<S: AsRef<str>>(&mut self, order: &[S]) -> usize {
        let mut remaining: Vec<Option<PlacementItem>> =
            std::mem::take(&mut self.items).into_iter().map(Some).collect();
        let mut reordered = Vec::with_capacity(remaining.len());

        for id in order {
            let id = id.as_ref();
            if let Some(slot) = remaining
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|item| item.id == id))
                && let Some(item) = slot.take()
            {
                reordered.push(item);
            }
        }
        let matched = reordered.len();
        reordered.extend(remaining.into_iter().flatten());
        self.items = reordered;
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sequence_of(ids: &[&str]) -> ItemSequence {
        let catalog = Catalog::standard();
        let unit = catalog.get("powerpack").expect("powerpack");
        ItemSequence::from_items(ids.iter().map(|id| PlacementItem::new(*id, Arc::clone(unit))))
    }

    fn order(sequence: &ItemSequence) -> Vec<&str> {
        sequence.ids().collect()
    }

    #[test]
    fn expansion_follows_catalog_order() {
        let catalog = Catalog::standard();
        let quantities =
            QuantityConfig::from_pairs(&catalog, [("powerpack", 2), ("megapack-xl", 1)])
                .expect("known units");
        let sequence = ItemSequence::expand(&catalog, &quantities);
        assert_eq!(
            order(&sequence),
            ["megapack-xl-0", "powerpack-0", "powerpack-1", "transformer-0"]
        );
    }

    #[test]
    fn expansion_of_empty_config_is_empty() {
        let catalog = Catalog::standard();
        let sequence = ItemSequence::expand(&catalog, &QuantityConfig::new());
        assert!(sequence.is_empty());
    }

    #[test]
    fn move_forward_lands_at_target_slot() {
        let mut sequence = sequence_of(&["a", "b", "c", "d"]);
        let outcome = sequence.move_to_position("a", "c");
        assert_eq!(outcome, SequenceOutcome::Moved { from: 0, to: 2 });
        assert_eq!(order(&sequence), ["b", "c", "a", "d"]);
    }

    #[test]
    fn move_backward_lands_before_target() {
        let mut sequence = sequence_of(&["a", "b", "c", "d"]);
        let outcome = sequence.move_to_position("d", "b");
        assert_eq!(outcome, SequenceOutcome::Moved { from: 3, to: 1 });
        assert_eq!(order(&sequence), ["a", "d", "b", "c"]);
    }

    #[test]
    fn self_move_is_noop() {
        let mut sequence = sequence_of(&["a", "b", "c"]);
        let before = sequence.clone();
        assert_eq!(
            sequence.move_to_position("b", "b"),
            SequenceOutcome::Unchanged(NoopReason::SelfMove)
        );
        assert_eq!(sequence, before);
    }

    #[test]
    fn unknown_ids_are_noops() {
        let mut sequence = sequence_of(&["a", "b", "c"]);
        let before = sequence.clone();
        assert_eq!(
            sequence.move_to_position("zzz", "a"),
            SequenceOutcome::Unchanged(NoopReason::UnknownSource)
        );
        assert_eq!(
            sequence.move_to_position("a", "zzz"),
            SequenceOutcome::Unchanged(NoopReason::UnknownTarget)
        );
        assert_eq!(
            sequence.move_to_end("zzz"),
            SequenceOutcome::Unchanged(NoopReason::UnknownSource)
        );
        assert_eq!(sequence, before);
    }

    #[test]
    fn move_to_end_appends() {
        let mut sequence = sequence_of(&["a", "b", "c"]);
        assert_eq!(
            sequence.move_to_end("a"),
            SequenceOutcome::Moved { from: 0, to: 2 }
        );
        assert_eq!(order(&sequence), ["b", "c", "a"]);
    }

    #[test]
    fn move_to_end_of_last_is_noop() {
        let mut sequence = sequence_of(&["a", "b", "c"]);
        let before = sequence.clone();
        assert_eq!(
            sequence.move_to_end("c"),
            SequenceOutcome::Unchanged(NoopReason::AlreadyLast)
        );
        assert_eq!(sequence, before);
    }

    #[test]
    fn apply_dispatches_operations() {
        let mut sequence = sequence_of(&["a", "b", "c"]);
        let moved = sequence.apply(&SequenceOperation::MoveToEnd { source: "b".into() });
        assert!(moved.is_moved());
        let moved = sequence.apply(&SequenceOperation::MoveToPosition {
            source: "b".into(),
            target: "a".into(),
        });
        assert!(moved.is_moved());
        assert_eq!(order(&sequence), ["b", "a", "c"]);
    }

    #[test]
    fn apply_order_restores_and_tolerates_drift() {
        let mut sequence = sequence_of(&["a", "b", "c", "d"]);
        let matched = sequence.apply_order(&["c", "ghost", "a", "c"]);
        assert_eq!(matched, 2);
        assert_eq!(order(&sequence), ["c", "a", "b", "d"]);
    }

    #[test]
    fn from_items_drops_duplicate_ids() {
        let sequence = sequence_of(&["a", "b", "a"]);
        assert_eq!(order(&sequence), ["a", "b"]);
    }

    proptest! {
        #[test]
        fn operations_are_permutations(
            len in 1usize..20,
            moves in prop::collection::vec((0usize..25, 0usize..25, any::<bool>()), 0..30),
        ) {
            let names: Vec<String> = (0..len).map(|i| format!("item-{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut sequence = sequence_of(&refs);

            for (source, target, to_end) in moves {
                let source = format!("item-{source}");
                if to_end {
                    let _ = sequence.move_to_end(&source);
                } else {
                    let _ = sequence.move_to_position(&source, &format!("item-{target}"));
                }
            }

            let mut ids: Vec<_> = sequence.ids().map(str::to_string).collect();
            ids.sort();
            let mut expected = names.clone();
            expected.sort();
            prop_assert_eq!(ids, expected);
        }

        #[test]
        fn moved_item_lands_at_reported_index(
            len in 2usize..20,
            source in 0usize..20,
            target in 0usize..20,
        ) {
            prop_assume!(source < len && target < len);
            let names: Vec<String> = (0..len).map(|i| format!("item-{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut sequence = sequence_of(&refs);

            let outcome = sequence.move_to_position(&names[source], &names[target]);
            if source == target {
                prop_assert_eq!(outcome, SequenceOutcome::Unchanged(NoopReason::SelfMove));
            } else {
                prop_assert_eq!(outcome, SequenceOutcome::Moved { from: source, to: target });
                prop_assert_eq!(sequence.position(&names[source]), Some(target));
            }
        }
    }
}

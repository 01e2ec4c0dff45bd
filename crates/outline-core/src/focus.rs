//! Where input focus lands after a command.
//!
//! Navigation works on what the user sees: the current sort order with
//! collapsed descendants removed. The "new item" input sits after the last
//! visible item.

use crate::items::{Item, ItemId};
use crate::outline::{Draft, FocusTarget};
use crate::sort::{order_for, visible_of};
use std::collections::{BTreeMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Prev,
    Next,
}

/// Visible items in display order for the draft's current state.
pub(crate) fn visible_order(draft: &Draft) -> Vec<ItemId> {
    let order = order_for(draft.sort_type, &draft.order, &draft.items);
    visible_of(&order, &draft.items)
}

/// Nearest visible item before or after `id`.
///
/// `id` itself may be hidden under a collapsed ancestor, so the search walks the
/// full display order and skips anything not visible.
pub(crate) fn visible_neighbor(
    display: &[ItemId],
    items: &BTreeMap<ItemId, Item>,
    id: ItemId,
    direction: Direction,
) -> Option<ItemId> {
    let visible: HashSet<ItemId> = visible_of(display, items).into_iter().collect();
    let position = display.iter().position(|candidate| *candidate == id)?;
    match direction {
        Direction::Prev => display[..position]
            .iter()
            .rev()
            .find(|candidate| visible.contains(candidate))
            .copied(),
        Direction::Next => display[position + 1..]
            .iter()
            .find(|candidate| visible.contains(candidate))
            .copied(),
    }
}

/// Focus target reached by moving one step from `from`.
pub(crate) fn step(draft: &Draft, from: FocusTarget, direction: Direction) -> FocusTarget {
    let display = order_for(draft.sort_type, &draft.order, &draft.items);
    match (from, direction) {
        (FocusTarget::Item(id), _) => {
            match visible_neighbor(&display, &draft.items, id, direction) {
                Some(neighbor) => FocusTarget::Item(neighbor),
                None if direction == Direction::Next => FocusTarget::NewItem,
                None => FocusTarget::Item(id),
            }
        }
        (FocusTarget::NewItem, Direction::Prev) => visible_of(&display, &draft.items)
            .last()
            .map_or(FocusTarget::NewItem, |id| FocusTarget::Item(*id)),
        (FocusTarget::NewItem, Direction::Next) => FocusTarget::NewItem,
        (FocusTarget::None, _) => FocusTarget::None,
    }
}

/// Focus after removing the item displayed at `display_position` of `before`:
/// the previous item still visible with the caret at its end, otherwise the
/// next one with the caret at its start, otherwise the new-item input.
///
/// Visibility is judged on the edited draft, since lifting the children of a
/// collapsed item reveals them.
pub(crate) fn after_removal(
    before: &[ItemId],
    display_position: usize,
    draft: &Draft,
) -> (FocusTarget, Option<usize>) {
    let visible: HashSet<ItemId> = visible_order(draft).into_iter().collect();
    let survives = |id: &&ItemId| visible.contains(*id);
    if let Some(prev) = before[..display_position].iter().rev().find(survives) {
        return (FocusTarget::Item(*prev), None);
    }
    if let Some(next) = before[display_position..].iter().find(survives) {
        return (FocusTarget::Item(*next), Some(0));
    }
    (FocusTarget::NewItem, None)
}

//! Parent/child relationships derived from the indent-encoded manual order.

use crate::error::{OutlineError, Result};
use crate::items::{Item, ItemId};
use crate::outline::OutlineList;
use crate::sort::display_order;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

/// Tree view over a flat pre-order list. Positions index into the manual order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutlineIndex {
    positions: HashMap<ItemId, usize>,
    parent_by_position: Vec<Option<usize>>,
    subtree_end_by_position: Vec<usize>,
}

impl OutlineIndex {
    pub fn build(order: &[ItemId], items: &BTreeMap<ItemId, Item>) -> Self {
        let len = order.len();
        let mut positions = HashMap::with_capacity(len);
        let mut parent_by_position = vec![None; len];
        let mut subtree_end_by_position: Vec<usize> = (1..=len).collect();

        let indent_of = |ix: usize| items.get(&order[ix]).map_or(0, |item| item.indent);
        let mut stack: Vec<usize> = Vec::new();

        for (ix, id) in order.iter().enumerate() {
            positions.insert(*id, ix);
            let indent = indent_of(ix);
            while let Some(&top) = stack.last() {
                if indent_of(top) >= indent {
                    subtree_end_by_position[top] = ix;
                    stack.pop();
                } else {
                    break;
                }
            }
            parent_by_position[ix] = stack.last().copied();
            stack.push(ix);
        }
        for top in stack {
            subtree_end_by_position[top] = len;
        }

        Self {
            positions,
            parent_by_position,
            subtree_end_by_position,
        }
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn parent_position(&self, position: usize) -> Option<usize> {
        self.parent_by_position.get(position).copied().flatten()
    }

    /// Ancestors of `position`, nearest first.
    pub fn ancestor_positions(&self, position: usize) -> Vec<usize> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_position(position);
        while let Some(ix) = current {
            ancestors.push(ix);
            current = self.parent_position(ix);
        }
        ancestors
    }

    /// Positions of the descendant block that directly follows `position`.
    pub fn descendant_range(&self, position: usize) -> Range<usize> {
        match self.subtree_end_by_position.get(position) {
            Some(&end) => position + 1..end,
            None => position..position,
        }
    }

    /// The item together with its descendants.
    pub fn subtree_range(&self, position: usize) -> Range<usize> {
        let descendants = self.descendant_range(position);
        position..descendants.end.max(position)
    }

    pub fn has_children(&self, position: usize) -> bool {
        !self.descendant_range(position).is_empty()
    }
}

/// The id the next created item will receive.
///
/// Starts at `max(id) + 1` (0 for an empty list) and only ever grows, so an id
/// freed by a delete is never handed out again.
pub fn new_item_id(list: &OutlineList) -> ItemId {
    ItemId(list.next_item_id())
}

/// Parents of `id` in the manual order, nearest first.
pub fn parent_ids(list: &OutlineList, id: ItemId) -> Result<Vec<ItemId>> {
    let index = list.index();
    let position = index.position(id).ok_or(OutlineError::ItemNotFound(id))?;
    Ok(index
        .ancestor_positions(position)
        .into_iter()
        .map(|ix| list.item_order()[ix])
        .collect())
}

/// The descendant block of `id` in the manual order.
pub fn children_ids(list: &OutlineList, id: ItemId) -> Result<Vec<ItemId>> {
    let index = list.index();
    let position = index.position(id).ok_or(OutlineError::ItemNotFound(id))?;
    Ok(list.item_order()[index.descendant_range(position)].to_vec())
}

/// Indent of the item displayed right before `id` in the current sort order, or
/// `-1` when `id` is displayed first.
pub fn previous_item_indent(list: &OutlineList, id: ItemId) -> Result<i64> {
    list.require(id)?;
    let order = display_order(list);
    Ok(previous_indent_in(&order, list.items(), id))
}

pub(crate) fn previous_indent_in(
    order: &[ItemId],
    items: &BTreeMap<ItemId, Item>,
    id: ItemId,
) -> i64 {
    order
        .iter()
        .position(|candidate| *candidate == id)
        .and_then(|ix| ix.checked_sub(1))
        .and_then(|prev| items.get(&order[prev]))
        .map_or(-1, |item| item.indent as i64)
}

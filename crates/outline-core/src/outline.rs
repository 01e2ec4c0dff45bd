//! The outline snapshot handed to and returned from every command.
//!
//! A snapshot is never edited in place. Commands copy it into a [`Draft`],
//! rework the draft and seal it again with [`Draft::finish`], which also
//! restores the cross-field invariants (new-item indent cap, dangling focus,
//! stale drag state).

use crate::error::{OutlineError, Result};
use crate::hierarchy::OutlineIndex;
use crate::items::{clamp_indent, Item, ItemId, MAX_INDENT};
use crate::settings::OutlineSettings;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    #[default]
    Default,
    State,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    #[default]
    None,
    NewItem,
    Item(ItemId),
}

impl FocusTarget {
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            FocusTarget::Item(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragTarget {
    #[default]
    None,
    NewItem,
    Item(ItemId),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DragState {
    pub dragged_parent: Option<ItemId>,
    /// Descendant block of `dragged_parent` in the manual order when the drag started.
    pub dragged_children: Vec<ItemId>,
    pub dragged_over: DragTarget,
    pub drop_indent: u8,
}

impl DragState {
    pub fn is_active(&self) -> bool {
        self.dragged_parent.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct OutlineList {
    item_order: Vec<ItemId>,
    items: BTreeMap<ItemId, Item>,
    sort_type: SortType,
    new_item_input_indent: u8,
    focus: FocusTarget,
    caret_position_on_focus: Option<usize>,
    drag: DragState,
    next_item_id: u64,
    index: OnceCell<OutlineIndex>,
}

impl OutlineList {
    pub fn new(sort_type: SortType) -> Self {
        Self {
            item_order: Vec::new(),
            items: BTreeMap::new(),
            sort_type,
            new_item_input_indent: 0,
            focus: FocusTarget::None,
            caret_position_on_focus: None,
            drag: DragState::default(),
            next_item_id: 0,
            index: OnceCell::new(),
        }
    }

    pub fn with_settings(settings: &OutlineSettings) -> Self {
        Self::new(settings.default_sort_type)
    }

    /// Builds a list in manual order, assigning ids `0..n`.
    ///
    /// Indents are normalized so the first item sits at the top level and no
    /// item is nested more than one level below its predecessor.
    pub fn from_items(sort_type: SortType, items: Vec<Item>) -> Self {
        let mut draft = Draft::from_list(&Self::new(sort_type));
        let mut prev_indent: Option<u8> = None;
        for mut item in items {
            let cap = prev_indent.map_or(0, |indent| (indent + 1).min(MAX_INDENT));
            item.indent = item.indent.min(cap);
            prev_indent = Some(item.indent);
            let id = draft.allocate_id();
            draft.order.push(id);
            draft.items.insert(id, item);
        }
        draft.finish()
    }

    pub fn item_order(&self) -> &[ItemId] {
        &self.item_order
    }

    pub fn items(&self) -> &BTreeMap<ItemId, Item> {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn require(&self, id: ItemId) -> Result<&Item> {
        self.items.get(&id).ok_or(OutlineError::ItemNotFound(id))
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.item_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_order.is_empty()
    }

    pub fn sort_type(&self) -> SortType {
        self.sort_type
    }

    pub fn new_item_input_indent(&self) -> u8 {
        self.new_item_input_indent
    }

    pub fn focus(&self) -> FocusTarget {
        self.focus
    }

    /// Caret offset in characters; `None` means "end of text / unspecified".
    pub fn caret_position_on_focus(&self) -> Option<usize> {
        self.caret_position_on_focus
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub(crate) fn next_item_id(&self) -> u64 {
        self.next_item_id
    }

    /// Built on first use and cached for the lifetime of the snapshot.
    pub fn index(&self) -> &OutlineIndex {
        self.index
            .get_or_init(|| OutlineIndex::build(&self.item_order, &self.items))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Item)> + '_ {
        self.item_order
            .iter()
            .filter_map(|id| self.items.get(id).map(|item| (*id, item)))
    }
}

impl Default for OutlineList {
    fn default() -> Self {
        Self::new(SortType::Default)
    }
}

impl PartialEq for OutlineList {
    fn eq(&self, other: &Self) -> bool {
        self.item_order == other.item_order
            && self.items == other.items
            && self.sort_type == other.sort_type
            && self.new_item_input_indent == other.new_item_input_indent
            && self.focus == other.focus
            && self.caret_position_on_focus == other.caret_position_on_focus
            && self.drag == other.drag
            && self.next_item_id == other.next_item_id
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Draft {
    pub(crate) order: Vec<ItemId>,
    pub(crate) items: BTreeMap<ItemId, Item>,
    pub(crate) sort_type: SortType,
    pub(crate) new_item_input_indent: u8,
    pub(crate) focus: FocusTarget,
    pub(crate) caret: Option<usize>,
    pub(crate) drag: DragState,
    next_item_id: u64,
}

impl Draft {
    pub(crate) fn from_list(list: &OutlineList) -> Self {
        Self {
            order: list.item_order.clone(),
            items: list.items.clone(),
            sort_type: list.sort_type,
            new_item_input_indent: list.new_item_input_indent,
            focus: list.focus,
            caret: list.caret_position_on_focus,
            drag: list.drag.clone(),
            next_item_id: list.next_item_id,
        }
    }

    pub(crate) fn allocate_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        id
    }

    pub(crate) fn item(&self, id: ItemId) -> Result<&Item> {
        self.items.get(&id).ok_or(OutlineError::ItemNotFound(id))
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Result<&mut Item> {
        self.items.get_mut(&id).ok_or(OutlineError::ItemNotFound(id))
    }

    pub(crate) fn indent_at(&self, position: usize) -> Option<u8> {
        self.order
            .get(position)
            .and_then(|id| self.items.get(id))
            .map(|item| item.indent)
    }

    pub(crate) fn index(&self) -> OutlineIndex {
        OutlineIndex::build(&self.order, &self.items)
    }

    pub(crate) fn focus_on(&mut self, target: FocusTarget, caret: Option<usize>) {
        self.focus = target;
        self.caret = caret;
    }

    pub(crate) fn shift_indents(&mut self, ids: &[ItemId], delta: i64) {
        if delta == 0 {
            return;
        }
        for id in ids {
            if let Some(item) = self.items.get_mut(id) {
                item.indent = clamp_indent(item.indent as i64 + delta);
            }
        }
    }

    pub(crate) fn expand_ancestors(&mut self, id: ItemId) {
        let index = self.index();
        let Some(position) = index.position(id) else {
            return;
        };
        for ancestor in index.ancestor_positions(position) {
            if let Some(item) = self.items.get_mut(&self.order[ancestor]) {
                item.is_expanded = true;
            }
        }
    }

    pub(crate) fn reset_drag(&mut self) {
        self.drag = DragState::default();
    }

    pub(crate) fn finish(mut self) -> OutlineList {
        let cap = self
            .order
            .last()
            .and_then(|id| self.items.get(id))
            .map_or(0, |item| (item.indent + 1).min(MAX_INDENT));
        self.new_item_input_indent = self.new_item_input_indent.min(cap);

        if let FocusTarget::Item(id) = self.focus {
            if !self.items.contains_key(&id) {
                self.focus = FocusTarget::None;
                self.caret = None;
            }
        }
        if let Some(parent) = self.drag.dragged_parent {
            if !self.items.contains_key(&parent) {
                self.drag = DragState::default();
            }
        }

        OutlineList {
            item_order: self.order,
            items: self.items,
            sort_type: self.sort_type,
            new_item_input_indent: self.new_item_input_indent,
            focus: self.focus,
            caret_position_on_focus: self.caret,
            drag: self.drag,
            next_item_id: self.next_item_id,
            index: OnceCell::new(),
        }
    }
}

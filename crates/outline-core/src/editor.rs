//! Command processor for the outline.
//!
//! Every command takes a snapshot and yields a new one; the input is never
//! touched. Validation happens against a private draft, so a rejected command
//! leaves nothing half-applied.

use crate::error::{OutlineError, Result};
use crate::focus::{self, Direction};
use crate::hierarchy::OutlineIndex;
use crate::items::{clamp_indent, Item, ItemId, ItemPatch, ItemState, MAX_INDENT};
use crate::outline::{Draft, DragState, DragTarget, FocusTarget, OutlineList, SortType};
use crate::settings::OutlineSettings;
use crate::sort::order_for;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddPosition {
    After(ItemId),
    At(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTarget {
    Before(ItemId),
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentTarget {
    Item(ItemId),
    NewItem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentChange {
    Increase,
    Decrease,
    To(i64),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Add {
        position: AddPosition,
        text: String,
        #[serde(default)]
        indent: i64,
        #[serde(default)]
        state: Option<ItemState>,
        #[serde(default)]
        commentary: Option<String>,
    },
    Update {
        id: ItemId,
        fields: ItemPatch,
    },
    Delete {
        id: ItemId,
        #[serde(default = "default_true")]
        set_focus: bool,
        #[serde(default)]
        delete_children: bool,
    },
    Split {
        id: ItemId,
        before: String,
        after: String,
    },
    MergeWithPrev {
        id: ItemId,
    },
    MergeWithNext {
        id: ItemId,
    },
    StartDrag {
        id: ItemId,
    },
    DragOver {
        target: DragTarget,
        drop_indent: i64,
    },
    EndDrag,
    MoveItems {
        moved_id: ItemId,
        target: MoveTarget,
        drop_indent: i64,
    },
    SetIndent {
        target: IndentTarget,
        change: IndentChange,
    },
    FocusPrev {
        from: FocusTarget,
        #[serde(default)]
        caret_position_on_focus: Option<usize>,
    },
    FocusNext {
        from: FocusTarget,
        #[serde(default)]
        caret_position_on_focus: Option<usize>,
    },
    SetFocus {
        target: FocusTarget,
        #[serde(default)]
        caret_position_on_focus: Option<usize>,
    },
    ClearFocus,
    SetSortType {
        sort_type: SortType,
    },
}

fn default_true() -> bool {
    true
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::Split { .. } => "split",
            Command::MergeWithPrev { .. } => "merge_with_prev",
            Command::MergeWithNext { .. } => "merge_with_next",
            Command::StartDrag { .. } => "start_drag",
            Command::DragOver { .. } => "drag_over",
            Command::EndDrag => "end_drag",
            Command::MoveItems { .. } => "move_items",
            Command::SetIndent { .. } => "set_indent",
            Command::FocusPrev { .. } => "focus_prev",
            Command::FocusNext { .. } => "focus_next",
            Command::SetFocus { .. } => "set_focus",
            Command::ClearFocus => "clear_focus",
            Command::SetSortType { .. } => "set_sort_type",
        }
    }

    fn requires_default_order(&self) -> bool {
        matches!(
            self,
            Command::StartDrag { .. }
                | Command::DragOver { .. }
                | Command::MoveItems { .. }
                | Command::SetIndent { .. }
        )
    }

    fn reshapes_outline(&self) -> bool {
        match self {
            Command::Add { .. }
            | Command::Delete { .. }
            | Command::Split { .. }
            | Command::MergeWithPrev { .. }
            | Command::MergeWithNext { .. }
            | Command::SetIndent {
                target: IndentTarget::Item(_),
                ..
            } => true,
            Command::Update { fields, .. } => fields.indent.is_some(),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Engine {
    settings: OutlineSettings,
}

impl Engine {
    pub fn new(settings: OutlineSettings) -> Self {
        Self { settings }
    }

    pub fn apply(&self, list: &OutlineList, command: Command) -> Result<OutlineList> {
        let kind = command.kind();
        match self.run(list, command) {
            Ok(next) => {
                debug!(command = kind, items = next.len(), "applied outline command");
                Ok(next)
            }
            Err(err) => {
                warn!(command = kind, error = %err, "rejected outline command");
                Err(err)
            }
        }
    }

    /// Applies commands in order, stopping at the first failure.
    pub fn apply_all(
        &self,
        list: &OutlineList,
        commands: impl IntoIterator<Item = Command>,
    ) -> Result<OutlineList> {
        let mut current = list.clone();
        for command in commands {
            current = self.apply(&current, command)?;
        }
        Ok(current)
    }

    fn run(&self, list: &OutlineList, command: Command) -> Result<OutlineList> {
        if command.requires_default_order() && list.sort_type() != SortType::Default {
            return Err(OutlineError::RequiresDefaultOrder {
                command: command.kind(),
            });
        }

        let mut draft = Draft::from_list(list);
        // a drag snapshots its block, so any edit to the tree ends it
        if command.reshapes_outline() && draft.drag.is_active() {
            trace!(command = command.kind(), "outline edit cancels drag");
            draft.reset_drag();
        }
        match command {
            Command::Add {
                position,
                text,
                indent,
                state,
                commentary,
            } => {
                let item = Item {
                    text,
                    state: state.unwrap_or(self.settings.default_item_state),
                    commentary: commentary.unwrap_or_default(),
                    indent: 0,
                    is_expanded: true,
                };
                add(&mut draft, position, item, indent)?;
            }
            Command::Update { id, fields } => update(&mut draft, id, &fields)?,
            Command::Delete {
                id,
                set_focus,
                delete_children,
            } => delete(&mut draft, id, set_focus, delete_children)?,
            Command::Split { id, before, after } => split(&mut draft, id, before, after)?,
            Command::MergeWithPrev { id } => merge_with_prev(&mut draft, id)?,
            Command::MergeWithNext { id } => merge_with_next(&mut draft, id)?,
            Command::StartDrag { id } => start_drag(&mut draft, id)?,
            Command::DragOver {
                target,
                drop_indent,
            } => drag_over(&mut draft, target, drop_indent)?,
            Command::EndDrag => draft.reset_drag(),
            Command::MoveItems {
                moved_id,
                target,
                drop_indent,
            } => move_items(&mut draft, moved_id, target, drop_indent)?,
            Command::SetIndent { target, change } => set_indent(&mut draft, target, change)?,
            Command::FocusPrev {
                from,
                caret_position_on_focus,
            } => move_focus(&mut draft, from, Direction::Prev, caret_position_on_focus)?,
            Command::FocusNext {
                from,
                caret_position_on_focus,
            } => move_focus(&mut draft, from, Direction::Next, caret_position_on_focus)?,
            Command::SetFocus {
                target,
                caret_position_on_focus,
            } => {
                if let Some(id) = target.item_id() {
                    draft.item(id)?;
                }
                draft.focus_on(target, caret_position_on_focus);
            }
            Command::ClearFocus => draft.focus_on(FocusTarget::None, None),
            Command::SetSortType { sort_type } => {
                draft.sort_type = sort_type;
                draft.reset_drag();
            }
        }
        Ok(draft.finish())
    }
}

/// Applies one command with default settings.
pub fn apply(list: &OutlineList, command: Command) -> Result<OutlineList> {
    Engine::default().apply(list, command)
}

fn position_of(index: &OutlineIndex, id: ItemId) -> Result<usize> {
    index.position(id).ok_or(OutlineError::ItemNotFound(id))
}

fn indent_bounds(prev: Option<u8>, next: Option<u8>) -> (u8, u8) {
    let upper = prev.map_or(0, |indent| (indent + 1).min(MAX_INDENT));
    let lower = next.map_or(0, |indent| indent.saturating_sub(1));
    (lower.min(upper), upper)
}

fn add(draft: &mut Draft, position: AddPosition, mut item: Item, indent: i64) -> Result<()> {
    let len = draft.order.len();
    let insert_at = match position {
        AddPosition::After(reference) => position_of(&draft.index(), reference)? + 1,
        AddPosition::At(position) if position <= len => position,
        AddPosition::At(position) => {
            return Err(OutlineError::PositionOutOfRange { position, len });
        }
    };

    let prev = insert_at.checked_sub(1).and_then(|ix| draft.indent_at(ix));
    let (lower, upper) = indent_bounds(prev, draft.indent_at(insert_at));
    item.indent = clamp_indent(indent).max(lower).min(upper);

    let caret = item.text_len();
    let new_indent = item.indent;
    let id = draft.allocate_id();
    draft.order.insert(insert_at, id);
    draft.items.insert(id, item);
    draft.expand_ancestors(id);
    if insert_at == len {
        draft.new_item_input_indent = new_indent;
    }
    draft.focus_on(FocusTarget::Item(id), Some(caret));
    Ok(())
}

fn update(draft: &mut Draft, id: ItemId, fields: &ItemPatch) -> Result<()> {
    fields.apply_fields(draft.item_mut(id)?);
    if let Some(indent) = fields.indent {
        reindent(draft, id, indent)?;
    }
    Ok(())
}

fn reindent(draft: &mut Draft, id: ItemId, requested: i64) -> Result<()> {
    let index = draft.index();
    let position = position_of(&index, id)?;
    let old = draft.item(id)?.indent;
    let subtree = index.subtree_range(position);

    let prev = position.checked_sub(1).and_then(|ix| draft.indent_at(ix));
    let upper = prev.map_or(0, |indent| (indent + 1).min(MAX_INDENT));
    // the item after the block must stay within one level of the block's last item
    let last_depth = draft
        .indent_at(subtree.end - 1)
        .map_or(0, |indent| indent.saturating_sub(old));
    let lower = draft
        .indent_at(subtree.end)
        .map_or(0, |indent| indent.saturating_sub(1).saturating_sub(last_depth));
    let new = clamp_indent(requested).max(lower.min(upper)).min(upper);

    let block = draft.order[subtree].to_vec();
    draft.shift_indents(&block, new as i64 - old as i64);
    Ok(())
}

fn delete(draft: &mut Draft, id: ItemId, set_focus: bool, delete_children: bool) -> Result<()> {
    let index = draft.index();
    let position = position_of(&index, id)?;
    let descendants = draft.order[index.descendant_range(position)].to_vec();

    let display = order_for(draft.sort_type, &draft.order, &draft.items);
    let display_position = display
        .iter()
        .position(|candidate| *candidate == id)
        .unwrap_or(0);

    let mut removed = HashSet::from([id]);
    if delete_children {
        removed.extend(descendants);
    } else {
        draft.shift_indents(&descendants, -1);
    }
    draft.order.retain(|candidate| !removed.contains(candidate));
    draft.items.retain(|candidate, _| !removed.contains(candidate));

    if set_focus {
        let (target, caret) = focus::after_removal(&display, display_position, draft);
        draft.focus_on(target, caret);
    }
    Ok(())
}

fn split(draft: &mut Draft, id: ItemId, before: String, after: String) -> Result<()> {
    let position = position_of(&draft.index(), id)?;
    let original = draft.item(id)?.clone();

    let first_id = draft.allocate_id();
    let second_id = draft.allocate_id();
    let first = Item {
        text: before,
        is_expanded: true,
        ..original.clone()
    };
    // the second half inherits the original's children, and with them its fold state
    let second = Item {
        text: after,
        ..original
    };

    draft
        .order
        .splice(position..position + 1, [first_id, second_id]);
    draft.items.remove(&id);
    draft.items.insert(first_id, first);
    draft.items.insert(second_id, second);
    draft.focus_on(FocusTarget::Item(second_id), Some(0));
    Ok(())
}

fn merge_with_prev(draft: &mut Draft, id: ItemId) -> Result<()> {
    draft.item(id)?;
    let display = order_for(draft.sort_type, &draft.order, &draft.items);
    match focus::visible_neighbor(&display, &draft.items, id, Direction::Prev) {
        Some(prev) => merge(draft, prev, id),
        None => {
            trace!(%id, "nothing before item to merge with");
            draft.focus_on(FocusTarget::Item(id), Some(0));
            Ok(())
        }
    }
}

fn merge_with_next(draft: &mut Draft, id: ItemId) -> Result<()> {
    let caret = draft.item(id)?.text_len();
    let display = order_for(draft.sort_type, &draft.order, &draft.items);
    match focus::visible_neighbor(&display, &draft.items, id, Direction::Next) {
        Some(next) => merge(draft, id, next),
        None => {
            trace!(%id, "nothing after item to merge with");
            draft.focus_on(FocusTarget::Item(id), Some(caret));
            Ok(())
        }
    }
}

/// `second`'s descendants stay where they are, lifted just enough to hang off
/// whatever now precedes them.
fn merge(draft: &mut Draft, first: ItemId, second: ItemId) -> Result<()> {
    let index = draft.index();
    let first_position = position_of(&index, first)?;
    let second_position = position_of(&index, second)?;
    let keeper = draft.item(first)?.clone();
    let absorbed = draft.item(second)?.clone();
    let orphans = draft.order[index.descendant_range(second_position)].to_vec();

    let caret = keeper.text_len();
    let merged_id = draft.allocate_id();
    let merged = Item {
        text: format!("{}{}", keeper.text, absorbed.text),
        ..keeper
    };

    draft.order[first_position] = merged_id;
    draft.order.remove(second_position);
    draft.items.remove(&first);
    draft.items.remove(&second);
    draft.items.insert(merged_id, merged);

    if let Some(first_orphan) = orphans.first() {
        let orphan_position = draft
            .order
            .iter()
            .position(|candidate| candidate == first_orphan)
            .unwrap_or(0);
        let pred = orphan_position
            .checked_sub(1)
            .and_then(|ix| draft.indent_at(ix))
            .map_or(-1, |indent| indent as i64);
        let delta = (pred - absorbed.indent as i64).min(0);
        draft.shift_indents(&orphans, delta);
    }

    draft.focus_on(FocusTarget::Item(merged_id), Some(caret));
    Ok(())
}

fn start_drag(draft: &mut Draft, id: ItemId) -> Result<()> {
    let index = draft.index();
    let position = position_of(&index, id)?;
    draft.drag = DragState {
        dragged_parent: Some(id),
        dragged_children: draft.order[index.descendant_range(position)].to_vec(),
        dragged_over: DragTarget::None,
        drop_indent: draft.item(id)?.indent,
    };
    Ok(())
}

fn drag_over(draft: &mut Draft, target: DragTarget, drop_indent: i64) -> Result<()> {
    if !draft.drag.is_active() {
        return Err(OutlineError::NoActiveDrag);
    }
    if let DragTarget::Item(id) = target {
        draft.item(id)?;
    }
    draft.drag.dragged_over = target;
    draft.drag.drop_indent = clamp_indent(drop_indent);
    Ok(())
}

fn move_items(draft: &mut Draft, moved: ItemId, target: MoveTarget, drop_indent: i64) -> Result<()> {
    let index = draft.index();
    let position = position_of(&index, moved)?;
    if let MoveTarget::Before(target_id) = target {
        position_of(&index, target_id)?;
    }
    let old = draft.item(moved)?.indent;
    let block = draft.order[index.subtree_range(position)].to_vec();
    let in_block: HashSet<ItemId> = block.iter().copied().collect();

    if let MoveTarget::Before(target_id) = target {
        if in_block.contains(&target_id) {
            trace!(%moved, %target_id, "dropped onto itself");
            draft.reset_drag();
            return Ok(());
        }
    }

    let mut remaining: Vec<ItemId> = draft
        .order
        .iter()
        .filter(|candidate| !in_block.contains(candidate))
        .copied()
        .collect();
    let insert_at = match target {
        MoveTarget::Before(target_id) => remaining
            .iter()
            .position(|candidate| *candidate == target_id)
            .unwrap_or(remaining.len()),
        MoveTarget::End => remaining.len(),
    };

    let indent_of = |id: &ItemId| draft.items.get(id).map(|item| item.indent);
    let prev = insert_at
        .checked_sub(1)
        .and_then(|ix| remaining.get(ix))
        .and_then(indent_of);
    let next = remaining.get(insert_at).and_then(indent_of);
    let (lower, upper) = indent_bounds(prev, next);
    let new = clamp_indent(drop_indent).max(lower).min(upper);

    remaining.splice(insert_at..insert_at, block.iter().copied());
    draft.order = remaining;
    draft.shift_indents(&block, new as i64 - old as i64);
    draft.expand_ancestors(moved);
    draft.reset_drag();
    Ok(())
}

fn set_indent(draft: &mut Draft, target: IndentTarget, change: IndentChange) -> Result<()> {
    match target {
        IndentTarget::Item(id) => {
            let current = draft.item(id)?.indent as i64;
            reindent(draft, id, requested_indent(current, change))?;
            draft.expand_ancestors(id);
            let caret = draft.caret;
            draft.focus_on(FocusTarget::Item(id), caret);
        }
        IndentTarget::NewItem => {
            let current = draft.new_item_input_indent as i64;
            let upper = draft
                .order
                .last()
                .and_then(|id| draft.items.get(id))
                .map_or(0, |item| (item.indent + 1).min(MAX_INDENT));
            draft.new_item_input_indent = clamp_indent(requested_indent(current, change)).min(upper);
            let caret = draft.caret;
            draft.focus_on(FocusTarget::NewItem, caret);
        }
    }
    Ok(())
}

fn requested_indent(current: i64, change: IndentChange) -> i64 {
    match change {
        IndentChange::Increase => current + 1,
        IndentChange::Decrease => current - 1,
        IndentChange::To(indent) => indent,
    }
}

fn move_focus(
    draft: &mut Draft,
    from: FocusTarget,
    direction: Direction,
    caret: Option<usize>,
) -> Result<()> {
    if let Some(id) = from.item_id() {
        draft.item(id)?;
    }
    let target = focus::step(draft, from, direction);
    draft.focus_on(target, caret);
    Ok(())
}

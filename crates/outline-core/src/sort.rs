use crate::items::{Item, ItemId};
use crate::outline::{OutlineList, SortType};
use std::collections::BTreeMap;

pub fn default_order(list: &OutlineList) -> Vec<ItemId> {
    list.item_order().to_vec()
}

/// Sibling groups reordered by state priority, each item's descendant block
/// kept directly beneath it.
pub fn state_order(list: &OutlineList) -> Vec<ItemId> {
    state_order_of(list.item_order(), list.items())
}

/// The linearization selected by the list's sort type.
pub fn display_order(list: &OutlineList) -> Vec<ItemId> {
    order_for(list.sort_type(), list.item_order(), list.items())
}

/// Items in display order, minus those hidden under a collapsed ancestor.
pub fn sorted_ids(list: &OutlineList) -> Vec<ItemId> {
    visible_of(&display_order(list), list.items())
}

pub(crate) fn order_for(
    sort_type: SortType,
    order: &[ItemId],
    items: &BTreeMap<ItemId, Item>,
) -> Vec<ItemId> {
    match sort_type {
        SortType::Default => order.to_vec(),
        SortType::State => state_order_of(order, items),
    }
}

pub(crate) fn state_order_of(order: &[ItemId], items: &BTreeMap<ItemId, Item>) -> Vec<ItemId> {
    let indent_of = |id: &ItemId| items.get(id).map_or(0, |item| item.indent);

    // (head, sorted descendant block) per top-level item of this segment
    let mut groups: Vec<(ItemId, Vec<ItemId>)> = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let head_indent = indent_of(&order[start]);
        let mut end = start + 1;
        while end < order.len() && indent_of(&order[end]) > head_indent {
            end += 1;
        }
        let head = order[start];
        groups.push((head, state_order_of(&order[start + 1..end], items)));
        start = end;
    }

    groups.sort_by_key(|(head, _)| items.get(head).map_or(0, |item| item.state.priority()));

    let mut sorted = Vec::with_capacity(order.len());
    for (head, block) in groups {
        sorted.push(head);
        sorted.extend(block);
    }
    sorted
}

pub(crate) fn visible_of(order: &[ItemId], items: &BTreeMap<ItemId, Item>) -> Vec<ItemId> {
    let mut visible = Vec::with_capacity(order.len());
    let mut collapsed_frontier: Option<u8> = None;
    for id in order {
        let Some(item) = items.get(id) else {
            continue;
        };
        if let Some(frontier) = collapsed_frontier {
            if item.indent > frontier {
                continue;
            }
        }
        collapsed_frontier = None;
        visible.push(*id);
        if !item.is_expanded {
            collapsed_frontier = Some(item.indent);
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::{default_order, display_order, sorted_ids, state_order};
    use crate::items::{Item, ItemId, ItemState};
    use crate::outline::{OutlineList, SortType};

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId).collect()
    }

    #[test]
    fn state_order_keeps_children_attached() {
        let list = OutlineList::from_items(
            SortType::State,
            vec![
                Item::new("A", 0),
                Item::new("B", 1).with_state(ItemState::Completed),
                Item::new("C", 0).with_state(ItemState::Optional),
            ],
        );
        assert_eq!(state_order(&list), ids(&[0, 1, 2]));
    }

    #[test]
    fn state_order_sorts_each_level_recursively() {
        let list = OutlineList::from_items(
            SortType::State,
            vec![
                Item::new("done", 0).with_state(ItemState::Completed),
                Item::new("done/cancelled", 1).with_state(ItemState::Cancelled),
                Item::new("done/active", 1),
                Item::new("done/active/optional", 2).with_state(ItemState::Optional),
                Item::new("done/active/active", 2),
                Item::new("active", 0),
                Item::new("optional", 0).with_state(ItemState::Optional),
            ],
        );
        assert_eq!(state_order(&list), ids(&[5, 6, 0, 2, 4, 3, 1]));
    }

    #[test]
    fn state_order_is_stable_within_a_state() {
        let list = OutlineList::from_items(
            SortType::State,
            vec![
                Item::new("x", 0).with_state(ItemState::Completed),
                Item::new("y", 0),
                Item::new("z", 0).with_state(ItemState::Completed),
                Item::new("w", 0),
            ],
        );
        assert_eq!(state_order(&list), ids(&[1, 3, 0, 2]));
    }

    #[test]
    fn display_order_follows_sort_type() {
        let items = vec![
            Item::new("x", 0).with_state(ItemState::Cancelled),
            Item::new("y", 0),
        ];
        let manual = OutlineList::from_items(SortType::Default, items.clone());
        let grouped = OutlineList::from_items(SortType::State, items);
        assert_eq!(display_order(&manual), ids(&[0, 1]));
        assert_eq!(display_order(&grouped), ids(&[1, 0]));
        assert_eq!(default_order(&grouped), ids(&[0, 1]));
    }

    #[test]
    fn sorted_ids_hide_collapsed_descendants() {
        let list = OutlineList::from_items(
            SortType::Default,
            vec![
                Item::new("a", 0).collapsed(),
                Item::new("b", 1),
                Item::new("c", 2),
                Item::new("d", 1),
                Item::new("e", 0),
                Item::new("f", 1).collapsed(),
                Item::new("g", 2),
                Item::new("h", 1),
            ],
        );
        assert_eq!(sorted_ids(&list), ids(&[0, 4, 5, 7]));
    }

    #[test]
    fn sorted_ids_handle_nested_collapse() {
        let list = OutlineList::from_items(
            SortType::Default,
            vec![
                Item::new("a", 0),
                Item::new("b", 1).collapsed(),
                Item::new("c", 2).collapsed(),
                Item::new("d", 3),
                Item::new("e", 2),
                Item::new("f", 1),
            ],
        );
        assert_eq!(sorted_ids(&list), ids(&[0, 1, 5]));
    }
}

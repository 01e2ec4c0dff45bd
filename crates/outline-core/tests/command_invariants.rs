use outline_core::sort::{display_order, sorted_ids};
use outline_core::{
    apply, AddPosition, Command, FocusTarget, IndentChange, IndentTarget, Item, ItemPatch,
    ItemState, MoveTarget, OutlineList, SortType, MAX_INDENT,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
enum Op {
    Add { pick: usize, indent: i64, at_end: bool },
    Delete { pick: usize, children: bool },
    Split { pick: usize, cut: usize },
    MergePrev { pick: usize },
    MergeNext { pick: usize },
    Indent { pick: usize, indent: i64 },
    IndentNewItem { increase: bool },
    Move { pick: usize, target: usize, to_end: bool, indent: i64 },
    Fold { pick: usize, expanded: bool },
    SetState { pick: usize, state: u8 },
    Drag { pick: usize },
    EndDrag,
    FocusNext { pick: usize },
    ToggleSort,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<usize>(), -2i64..8, any::<bool>())
            .prop_map(|(pick, indent, at_end)| Op::Add { pick, indent, at_end }),
        1 => (any::<usize>(), any::<bool>())
            .prop_map(|(pick, children)| Op::Delete { pick, children }),
        1 => (any::<usize>(), 0usize..8).prop_map(|(pick, cut)| Op::Split { pick, cut }),
        1 => any::<usize>().prop_map(|pick| Op::MergePrev { pick }),
        1 => any::<usize>().prop_map(|pick| Op::MergeNext { pick }),
        2 => (any::<usize>(), -2i64..8).prop_map(|(pick, indent)| Op::Indent { pick, indent }),
        1 => any::<bool>().prop_map(|increase| Op::IndentNewItem { increase }),
        2 => (any::<usize>(), any::<usize>(), any::<bool>(), -2i64..8).prop_map(
            |(pick, target, to_end, indent)| Op::Move { pick, target, to_end, indent }
        ),
        1 => (any::<usize>(), any::<bool>())
            .prop_map(|(pick, expanded)| Op::Fold { pick, expanded }),
        1 => (any::<usize>(), 0u8..4).prop_map(|(pick, state)| Op::SetState { pick, state }),
        1 => any::<usize>().prop_map(|pick| Op::Drag { pick }),
        1 => Just(Op::EndDrag),
        1 => any::<usize>().prop_map(|pick| Op::FocusNext { pick }),
        1 => Just(Op::ToggleSort),
    ]
}

fn state_from(raw: u8) -> ItemState {
    match raw {
        0 => ItemState::Active,
        1 => ItemState::Optional,
        2 => ItemState::Completed,
        _ => ItemState::Cancelled,
    }
}

fn to_command(list: &OutlineList, op: &Op) -> Option<Command> {
    let order = list.item_order();
    if let Op::Add { at_end: true, indent, .. } = op {
        return Some(Command::Add {
            position: AddPosition::At(order.len()),
            text: "new".to_string(),
            indent: *indent,
            state: None,
            commentary: None,
        });
    }
    if let Op::IndentNewItem { increase } = op {
        let change = if *increase {
            IndentChange::Increase
        } else {
            IndentChange::Decrease
        };
        return Some(Command::SetIndent {
            target: IndentTarget::NewItem,
            change,
        });
    }
    if let Op::EndDrag = op {
        return Some(Command::EndDrag);
    }
    if let Op::ToggleSort = op {
        let sort_type = match list.sort_type() {
            SortType::Default => SortType::State,
            SortType::State => SortType::Default,
        };
        return Some(Command::SetSortType { sort_type });
    }
    if order.is_empty() {
        return None;
    }
    let pick = |raw: usize| order[raw % order.len()];

    let command = match op {
        Op::Add { pick: raw, indent, .. } => Command::Add {
            position: AddPosition::After(pick(*raw)),
            text: "child".to_string(),
            indent: *indent,
            state: None,
            commentary: None,
        },
        Op::Delete { pick: raw, children } => Command::Delete {
            id: pick(*raw),
            set_focus: true,
            delete_children: *children,
        },
        Op::Split { pick: raw, cut } => {
            let id = pick(*raw);
            let chars: Vec<char> = list.item(id)?.text.chars().collect();
            let cut = cut % (chars.len() + 1);
            Command::Split {
                id,
                before: chars[..cut].iter().collect(),
                after: chars[cut..].iter().collect(),
            }
        }
        Op::MergePrev { pick: raw } => Command::MergeWithPrev { id: pick(*raw) },
        Op::MergeNext { pick: raw } => Command::MergeWithNext { id: pick(*raw) },
        Op::Indent { pick: raw, indent } => Command::SetIndent {
            target: IndentTarget::Item(pick(*raw)),
            change: IndentChange::To(*indent),
        },
        Op::Move {
            pick: raw,
            target,
            to_end,
            indent,
        } => Command::MoveItems {
            moved_id: pick(*raw),
            target: if *to_end {
                MoveTarget::End
            } else {
                MoveTarget::Before(pick(*target))
            },
            drop_indent: *indent,
        },
        Op::Fold { pick: raw, expanded } => Command::Update {
            id: pick(*raw),
            fields: ItemPatch::expanded(*expanded),
        },
        Op::SetState { pick: raw, state } => Command::Update {
            id: pick(*raw),
            fields: ItemPatch::state(state_from(*state)),
        },
        Op::Drag { pick: raw } => Command::StartDrag { id: pick(*raw) },
        Op::FocusNext { pick: raw } => Command::FocusNext {
            from: FocusTarget::Item(pick(*raw)),
            caret_position_on_focus: None,
        },
        Op::IndentNewItem { .. } | Op::EndDrag | Op::ToggleSort => return None,
    };
    Some(command)
}

fn assert_invariants(list: &OutlineList) -> Result<(), TestCaseError> {
    let order = list.item_order();
    let unique: BTreeSet<_> = order.iter().copied().collect();
    prop_assert_eq!(unique.len(), order.len(), "duplicate ids in order");
    let keys: BTreeSet<_> = list.items().keys().copied().collect();
    prop_assert_eq!(&unique, &keys, "order is not a permutation of items");

    let mut prev: Option<u8> = None;
    for (id, item) in list.iter() {
        prop_assert!(item.indent <= MAX_INDENT, "indent out of range on {}", id);
        match prev {
            None => prop_assert_eq!(item.indent, 0, "first item must be top level"),
            Some(prev) => prop_assert!(item.indent <= prev + 1, "orphan indent on {}", id),
        }
        prev = Some(item.indent);
    }
    let cap = prev.map_or(0, |indent| indent + 1);
    prop_assert!(list.new_item_input_indent() <= cap);

    let displayed: BTreeSet<_> = display_order(list).into_iter().collect();
    prop_assert_eq!(&displayed, &keys, "display order lost items");
    prop_assert!(sorted_ids(list).iter().all(|id| keys.contains(id)));

    if let FocusTarget::Item(id) = list.focus() {
        prop_assert!(list.contains(id), "focus on a removed item");
    }
    if let Some(parent) = list.drag().dragged_parent {
        prop_assert!(list.contains(parent), "drag on a removed item");
    }
    Ok(())
}

fn seed() -> OutlineList {
    OutlineList::from_items(
        SortType::Default,
        vec![
            Item::new("alpha", 0),
            Item::new("beta", 1),
            Item::new("gamma", 2).with_state(ItemState::Completed),
            Item::new("delta", 1).with_state(ItemState::Optional),
            Item::new("epsilon", 0).with_state(ItemState::Cancelled),
            Item::new("zeta", 1),
        ],
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariants_hold_after_every_command(ops in prop::collection::vec(op(), 1..40)) {
        let mut list = seed();
        assert_invariants(&list)?;
        for op in &ops {
            let Some(command) = to_command(&list, op) else {
                continue;
            };
            match apply(&list, command) {
                Ok(next) => {
                    assert_invariants(&next)?;
                    list = next;
                }
                Err(_) => assert_invariants(&list)?,
            }
        }
    }

    #[test]
    fn split_then_merge_round_trips(pick in 0usize..6, cut in 0usize..8) {
        let list = seed();
        let id = list.item_order()[pick];
        let original = list.item(id).cloned().expect("item");
        let chars: Vec<char> = original.text.chars().collect();
        let cut = cut % (chars.len() + 1);

        let split = apply(&list, Command::Split {
            id,
            before: chars[..cut].iter().collect(),
            after: chars[cut..].iter().collect(),
        }).expect("split");
        let first = split.item_order()[pick];
        let merged = apply(&split, Command::MergeWithNext { id: first }).expect("merge");

        let merged_id = merged.item_order()[pick];
        let item = merged.item(merged_id).expect("merged");
        prop_assert_eq!(&item.text, &original.text);
        prop_assert_eq!(item.state, original.state);
        prop_assert_eq!(&item.commentary, &original.commentary);
        prop_assert_eq!(item.indent, original.indent);
        prop_assert_ne!(merged_id, id);
        prop_assert_eq!(merged.len(), list.len());
    }
}

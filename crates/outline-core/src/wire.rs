//! Backend representation of a to-do list.
//!
//! `item_number` carries the manual order. Fold state, focus and drag state
//! are client-only and are not part of the payload.

use crate::error::Result;
use crate::items::{Item, ItemState};
use crate::outline::{OutlineList, SortType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListData {
    #[serde(default)]
    pub sort_type: SortType,
    #[serde(default)]
    pub items: Vec<TodoItemRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItemRecord {
    pub item_number: usize,
    pub item_text: String,
    #[serde(default)]
    pub item_state: ItemState,
    #[serde(default)]
    pub commentary: String,
    #[serde(default)]
    pub indent: u8,
}

pub fn parse_todo_list(raw: &str) -> Result<TodoListData> {
    Ok(serde_json::from_str(raw)?)
}

pub fn to_json(data: &TodoListData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

impl OutlineList {
    /// Loads a backend payload. Records are ordered by `item_number`; ids are
    /// reassigned `0..n` and every item starts expanded.
    pub fn from_data(data: &TodoListData) -> Self {
        let mut records: Vec<&TodoItemRecord> = data.items.iter().collect();
        records.sort_by_key(|record| record.item_number);
        let items = records
            .into_iter()
            .map(|record| {
                Item::new(record.item_text.clone(), record.indent)
                    .with_state(record.item_state)
                    .with_commentary(record.commentary.clone())
            })
            .collect();
        OutlineList::from_items(data.sort_type, items)
    }

    pub fn to_data(&self) -> TodoListData {
        TodoListData {
            sort_type: self.sort_type(),
            items: self
                .iter()
                .enumerate()
                .map(|(item_number, (_, item))| TodoItemRecord {
                    item_number,
                    item_text: item.text.clone(),
                    item_state: item.state,
                    commentary: item.commentary.clone(),
                    indent: item.indent,
                })
                .collect(),
        }
    }
}

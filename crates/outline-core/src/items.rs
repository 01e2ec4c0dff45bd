use serde::{Deserialize, Serialize};
use std::fmt;

/// Deepest nesting level an item can have.
pub const MAX_INDENT: u8 = 5;

pub fn clamp_indent(indent: i64) -> u8 {
    indent.clamp(0, MAX_INDENT as i64) as u8
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    #[default]
    Active,
    Optional,
    Completed,
    Cancelled,
}

impl ItemState {
    /// Rank used by the state-grouped order; lower sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            ItemState::Active => 0,
            ItemState::Optional => 1,
            ItemState::Completed => 2,
            ItemState::Cancelled => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub text: String,
    pub state: ItemState,
    pub commentary: String,
    pub indent: u8,
    pub is_expanded: bool,
}

impl Item {
    pub fn new(text: impl Into<String>, indent: u8) -> Self {
        Self {
            text: text.into(),
            state: ItemState::Active,
            commentary: String::new(),
            indent: indent.min(MAX_INDENT),
            is_expanded: true,
        }
    }

    pub fn with_state(mut self, state: ItemState) -> Self {
        self.state = state;
        self
    }

    pub fn with_commentary(mut self, commentary: impl Into<String>) -> Self {
        self.commentary = commentary.into();
        self
    }

    pub fn collapsed(mut self) -> Self {
        self.is_expanded = false;
        self
    }

    /// Caret offset at the end of the text, in characters.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Field-level replacement applied by `update`. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ItemState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
}

impl ItemPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn state(state: ItemState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn expanded(is_expanded: bool) -> Self {
        Self {
            is_expanded: Some(is_expanded),
            ..Self::default()
        }
    }

    /// Applies every field except `indent`, which needs the surrounding outline to clamp.
    pub(crate) fn apply_fields(&self, item: &mut Item) {
        if let Some(text) = &self.text {
            item.text = text.clone();
        }
        if let Some(state) = self.state {
            item.state = state;
        }
        if let Some(commentary) = &self.commentary {
            item.commentary = commentary.clone();
        }
        if let Some(is_expanded) = self.is_expanded {
            item.is_expanded = is_expanded;
        }
    }
}

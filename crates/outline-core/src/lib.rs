//! Editing engine for hierarchical to-do lists.
//!
//! The outline is stored as a flat manual order plus a per-item indent; the
//! tree is implied by the indents. [`editor::apply`] turns a snapshot and a
//! [`editor::Command`] into a new snapshot, [`sort`] derives what is displayed
//! and [`hierarchy`] answers parent/child questions.

pub mod editor;
pub mod error;
mod focus;
pub mod hierarchy;
pub mod items;
pub mod outline;
pub mod settings;
pub mod sort;
pub mod wire;

pub use editor::{apply, AddPosition, Command, Engine, IndentChange, IndentTarget, MoveTarget};
pub use error::{OutlineError, Result};
pub use items::{Item, ItemId, ItemPatch, ItemState, MAX_INDENT};
pub use outline::{DragState, DragTarget, FocusTarget, OutlineList, SortType};
pub use settings::{OutlineSettings, SettingsStore};

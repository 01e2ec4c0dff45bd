use crate::items::ItemId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("item {0} does not exist")]
    ItemNotFound(ItemId),
    #[error("{command} is only available in the manual order")]
    RequiresDefaultOrder { command: &'static str },
    #[error("no drag in progress")]
    NoActiveDrag,
    #[error("position {position} is past the end of a list of {len} items")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no configuration directory available")]
    ProjectDir,
}

pub type Result<T> = std::result::Result<T, OutlineError>;

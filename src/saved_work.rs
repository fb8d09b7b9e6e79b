use crate::action::Action;
use crate::error::EngineError;
use crate::geometry::fold::FoldMode;
use crate::paper::{DEFAULT_PAPER_COLOR, PaperType};
use serde::{Deserialize, Serialize};

/// The externally persisted unit: mode selectors plus the full action
/// history.
///
/// `{paper_type, paper_color, fold_mode, actions}` alone reconstructs the
/// scene. The undo cursor is normalized before saving, so no pending redo
/// is ever persisted. Identity and title belong to the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedWork {
    pub id: Option<String>,
    pub title: Option<String>,
    pub paper_type: PaperType,
    pub paper_color: u32,
    pub date: i64,
    pub fold_mode: FoldMode,
    pub actions: Vec<Action>,
    /// PNG-encoded thumbnail of the preview surface, when one was bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<Vec<u8>>,
}

impl Default for SavedWork {
    fn default() -> Self {
        Self {
            id: None,
            title: None,
            paper_type: PaperType::default(),
            paper_color: DEFAULT_PAPER_COLOR,
            date: 0,
            fold_mode: FoldMode::default(),
            actions: Vec::new(),
            preview_image: None,
        }
    }
}

impl SavedWork {
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self).map_err(|e| EngineError::InvalidActionSequence(e.to_string()))
    }

    /// Decodes a persisted work; unknown tool/mode/kind codes are rejected
    /// here rather than silently misinterpreted.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidActionSequence(e.to_string()))
    }
}

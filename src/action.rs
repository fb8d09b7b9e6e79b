use crate::error::WireCodeError;
use crate::util::time;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 2D coordinate in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_sq(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

/// What a committed action did to the paper.
///
/// Serialized as the persisted numeric code (0 = cut, 1 = stroke); unknown
/// codes are rejected when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ActionKind {
    Cut,
    Stroke,
}

impl From<ActionKind> for u8 {
    fn from(kind: ActionKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for ActionKind {
    type Error = WireCodeError;

    fn try_from(code: u8) -> Result<Self, WireCodeError> {
        match code {
            0 => Ok(ActionKind::Cut),
            1 => Ok(ActionKind::Stroke),
            _ => Err(WireCodeError::new("action kind", code)),
        }
    }
}

/// The tool that captured a gesture.
///
/// Wire codes: 0 = scissors, 1 = bezier, 2 = draft pen, 3 = draft eraser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ToolMode {
    #[default]
    Scissors,
    Bezier,
    DraftPen,
    DraftEraser,
}

impl ToolMode {
    /// Scissors produce cuts; the three drawing tools produce strokes.
    pub fn action_kind(self) -> ActionKind {
        match self {
            ToolMode::Scissors => ActionKind::Cut,
            ToolMode::Bezier | ToolMode::DraftPen | ToolMode::DraftEraser => ActionKind::Stroke,
        }
    }
}

impl From<ToolMode> for u8 {
    fn from(tool: ToolMode) -> u8 {
        tool as u8
    }
}

impl TryFrom<u8> for ToolMode {
    type Error = WireCodeError;

    fn try_from(code: u8) -> Result<Self, WireCodeError> {
        match code {
            0 => Ok(ToolMode::Scissors),
            1 => Ok(ToolMode::Bezier),
            2 => Ok(ToolMode::DraftPen),
            3 => Ok(ToolMode::DraftEraser),
            _ => Err(WireCodeError::new("tool mode", code)),
        }
    }
}

/// An immutable record of one completed cut or stroke gesture.
///
/// Created exactly once at gesture completion and never mutated afterwards;
/// the id stays stable across undo/redo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub tool: ToolMode,
    pub points: Vec<Point>,
    pub timestamp: i64,
}

impl Action {
    pub fn new(tool: ToolMode, points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: tool.action_kind(),
            tool,
            points,
            timestamp: time::timestamp_millis(),
        }
    }

    /// Actions with fewer than two points replay as no-ops.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }
}

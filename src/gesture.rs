use crate::action::{Action, Point, ToolMode};
use crate::error::EngineError;

/// Points closer than this to the previous buffered point are dropped, so a
/// slow drag does not flood the buffer.
pub const MIN_POINT_SPACING: f32 = 10.0;

/// Mutable point buffer for the gesture being drawn.
#[derive(Debug, Clone)]
pub struct GestureBuffer {
    tool: ToolMode,
    points: Vec<Point>,
}

impl GestureBuffer {
    fn new(tool: ToolMode, first: Point) -> Self {
        let mut points = Vec::new();
        if first.is_finite() {
            points.push(first);
        }
        Self { tool, points }
    }

    /// Buffers a point, dropping non-finite coordinates and points within
    /// [`MIN_POINT_SPACING`] of the previous one.
    pub fn add_point(&mut self, p: Point) {
        if !p.is_finite() {
            return;
        }
        if let Some(last) = self.points.last() {
            if last.distance_sq(p) < MIN_POINT_SPACING * MIN_POINT_SPACING {
                return;
            }
        }
        self.points.push(p);
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_action(self) -> Action {
        Action::new(self.tool, self.points)
    }
}

/// The gesture state machine: idle, or buffering points for one tool.
///
/// Only one gesture may be open at a time, and mode changes are rejected
/// while one is.
#[derive(Debug, Default)]
pub enum ToolState {
    #[default]
    Idle,
    Gesturing(GestureBuffer),
}

impl ToolState {
    pub fn is_gesturing(&self) -> bool {
        matches!(self, ToolState::Gesturing(_))
    }

    /// Opens a gesture buffering its first point.
    pub fn begin(&mut self, tool: ToolMode, first: Point) -> Result<(), EngineError> {
        if self.is_gesturing() {
            return Err(EngineError::GestureAlreadyOpen);
        }
        *self = ToolState::Gesturing(GestureBuffer::new(tool, first));
        Ok(())
    }

    /// Buffers a point into the open gesture; silently ignored when idle.
    pub fn add_point(&mut self, p: Point) {
        if let ToolState::Gesturing(buffer) = self {
            buffer.add_point(p);
        }
    }

    /// Closes the gesture and hands back its buffer; `None` when idle.
    pub fn take_finished(&mut self) -> Option<GestureBuffer> {
        match std::mem::take(self) {
            ToolState::Idle => None,
            ToolState::Gesturing(buffer) => Some(buffer),
        }
    }

    /// Discards any open gesture without committing it.
    pub fn cancel(&mut self) {
        *self = ToolState::Idle;
    }

    pub fn buffer(&self) -> Option<&GestureBuffer> {
        match self {
            ToolState::Idle => None,
            ToolState::Gesturing(buffer) => Some(buffer),
        }
    }
}

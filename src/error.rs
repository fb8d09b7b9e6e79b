use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Degenerate gestures, redundant undo/redo and out-of-range zoom are
/// normalized silently and never reach this enum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A drawing gesture is already buffering points.
    #[error("a drawing gesture is already open")]
    GestureAlreadyOpen,
    /// Mode changes are rejected while a gesture is open.
    #[error("tool is busy: {0}")]
    ToolBusy(&'static str),
    /// The cut path does not enclose any area after closing.
    #[error("cut path does not enclose any area")]
    DegenerateCut,
    /// The cut would remove the entire remaining paper.
    #[error("cut would remove the entire paper")]
    EmptyResult,
    /// `set_actions` was given a sequence that does not replay.
    #[error("action sequence does not replay: {0}")]
    InvalidActionSequence(String),
    /// A render target was used before being bound.
    #[error("surface not initialized")]
    SurfaceNotInitialized,
    /// A surface was bound with a zero dimension.
    #[error("invalid surface size {0}x{1}")]
    InvalidSurfaceSize(u32, u32),
    /// Encoding the preview image failed.
    #[error("preview encoding failed: {0}")]
    PreviewEncoding(String),
}

/// A persisted numeric code that does not map to any enum variant.
///
/// Raised at the deserialization boundary so corrupt or foreign data is
/// rejected instead of silently misinterpreted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} code {code}")]
pub struct WireCodeError {
    pub kind: &'static str,
    pub code: u8,
}

impl WireCodeError {
    pub fn new(kind: &'static str, code: u8) -> Self {
        Self { kind, code }
    }
}

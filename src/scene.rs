//! The derived scene: paper pieces plus the stroke overlay.
//!
//! The scene is a pure function of the paper selectors, the fold mode and
//! the committed action prefix. It is recomputed by replay and never edited
//! in place, so any cached value is bit-for-bit what a full replay produces.

use crate::action::{Action, ActionKind, Point, ToolMode};
use crate::error::EngineError;
use crate::geometry::fold::FoldMode;
use crate::geometry::polygon::{self, Piece};
use crate::geometry::stroke::{self, ERASER_RADIUS};
use crate::paper::Paper;

/// One committed stroke polyline, already expanded through the fold
/// symmetry. Kept in commit order.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStroke {
    pub tool: ToolMode,
    pub points: Vec<Point>,
}

/// The visible paper after all committed cuts, plus drawn strokes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub pieces: Vec<Piece>,
    pub overlay: Vec<OverlayStroke>,
}

impl Shape {
    pub fn blank(paper: &Paper, fold: FoldMode) -> Self {
        Self {
            pieces: paper.blank_shape(fold),
            overlay: Vec::new(),
        }
    }

    pub fn paper_area(&self) -> f32 {
        polygon::total_area(&self.pieces)
    }
}

/// Applies one action to a shape, returning the successor shape.
///
/// Degenerate actions (fewer than two points) are replayed as no-ops. Cut
/// failures leave the input untouched and bubble up to the caller.
pub fn apply_action(shape: &Shape, action: &Action, fold: FoldMode) -> Result<Shape, EngineError> {
    if action.is_degenerate() {
        return Ok(shape.clone());
    }
    let center = Paper::center(fold);
    match action.kind {
        ActionKind::Cut => {
            let pieces = polygon::subtract_cut_path(&shape.pieces, &action.points, fold, center)?;
            Ok(Shape {
                pieces,
                overlay: shape.overlay.clone(),
            })
        }
        ActionKind::Stroke => match action.tool {
            ToolMode::DraftEraser => {
                let mut overlay = shape.overlay.clone();
                for eraser_copy in fold.expand_path(&action.points, center) {
                    overlay = overlay
                        .into_iter()
                        .flat_map(|entry| {
                            let tool = entry.tool;
                            stroke::erase_overlap(&entry.points, &eraser_copy, ERASER_RADIUS)
                                .into_iter()
                                .map(move |points| OverlayStroke { tool, points })
                        })
                        .collect();
                }
                Ok(Shape {
                    pieces: shape.pieces.clone(),
                    overlay,
                })
            }
            tool => {
                let tessellated = stroke::tessellate_stroke(&action.points, tool);
                let mut overlay = shape.overlay.clone();
                for copy in fold.expand_path(&tessellated, center) {
                    overlay.push(OverlayStroke { tool, points: copy });
                }
                Ok(Shape {
                    pieces: shape.pieces.clone(),
                    overlay,
                })
            }
        },
    }
}

/// Full replay from the blank sheet through `actions`, in order.
pub fn recompute(paper: &Paper, fold: FoldMode, actions: &[Action]) -> Result<Shape, EngineError> {
    let mut shape = Shape::blank(paper, fold);
    for action in actions {
        shape = apply_action(&shape, action, fold)?;
    }
    Ok(shape)
}

use crate::action::Point;
use crate::error::WireCodeError;
use crate::geometry::fold::FoldMode;
use crate::geometry::polygon::Piece;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Side length of the square model canvas all action coordinates live in.
/// Surfaces of any size map onto it through the view transform.
pub const CANVAS_SIZE: f32 = 2048.0;
/// Paper radius as a fraction of the canvas size.
pub const PAPER_RADIUS_RATIO: f32 = 0.40;
/// Default paper red.
pub const DEFAULT_PAPER_COLOR: u32 = 0xFFC4_161C;
/// Beige canvas background.
pub const BACKGROUND_COLOR: u32 = 0xFFFD_F6E3;
/// Segments used to approximate the circular paper outline.
const CIRCLE_SEGMENTS: u32 = 64;

/// The blank sheet the user starts from.
///
/// Wire codes: 0 = circle, 1 = square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PaperType {
    #[default]
    Circle,
    Square,
}

impl From<PaperType> for u8 {
    fn from(kind: PaperType) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for PaperType {
    type Error = WireCodeError;

    fn try_from(code: u8) -> Result<Self, WireCodeError> {
        match code {
            0 => Ok(PaperType::Circle),
            1 => Ok(PaperType::Square),
            _ => Err(WireCodeError::new("paper type", code)),
        }
    }
}

/// Paper selectors recorded per work: sheet outline and fill color (ARGB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paper {
    pub kind: PaperType,
    pub color: u32,
}

impl Default for Paper {
    fn default() -> Self {
        Self {
            kind: PaperType::default(),
            color: DEFAULT_PAPER_COLOR,
        }
    }
}

impl Paper {
    pub fn radius() -> f32 {
        CANVAS_SIZE * PAPER_RADIUS_RATIO
    }

    /// Paper center in canvas space. The unfolded sheet sits at the canvas
    /// center; a folded sheet rests on the bottom edge so the sector opens
    /// upward.
    pub fn center(fold: FoldMode) -> Point {
        if fold.is_full_paper() {
            Point::new(CANVAS_SIZE * 0.5, CANVAS_SIZE * 0.5)
        } else {
            Point::new(CANVAS_SIZE * 0.5, CANVAS_SIZE - Self::radius())
        }
    }

    /// The uncut sheet as a single piece.
    pub fn blank_shape(&self, fold: FoldMode) -> Vec<Piece> {
        let center = Self::center(fold);
        let r = Self::radius();
        let outer = match self.kind {
            PaperType::Circle => (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let angle = TAU * i as f32 / CIRCLE_SEGMENTS as f32;
                    Point::new(center.x + r * angle.cos(), center.y + r * angle.sin())
                })
                .collect(),
            PaperType::Square => vec![
                Point::new(center.x - r, center.y - r),
                Point::new(center.x + r, center.y - r),
                Point::new(center.x + r, center.y + r),
                Point::new(center.x - r, center.y + r),
            ],
        };
        vec![Piece {
            outer,
            holes: Vec::new(),
        }]
    }
}

use crate::action::Point;
use crate::error::WireCodeError;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

/// How the paper is folded before cutting.
///
/// Fold mode N splits the paper into N + 1 kaleidoscope sectors around the
/// paper center; authored points live in the sector straddling the upward
/// axis and are expanded into the remaining sectors. Serialized as the
/// persisted numeric code 0..=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FoldMode {
    Zero,
    One,
    Two,
    Three,
    #[default]
    Four,
    Five,
    Six,
    Seven,
    Eight,
}

impl FoldMode {
    pub fn sector_count(self) -> u32 {
        self as u32 + 1
    }

    pub fn sector_angle(self) -> f32 {
        TAU / self.sector_count() as f32
    }

    /// Mode zero is the unfolded full paper: no symmetry applies.
    pub fn is_full_paper(self) -> bool {
        matches!(self, FoldMode::Zero)
    }

    /// Expands one authored point into its symmetric copies about `center`.
    ///
    /// Copy 0 is the point itself; even copies are rotations by multiples of
    /// the sector angle, odd copies are reflections across the sector
    /// boundaries. Reflections are involutions, so expanding a mirrored copy
    /// again yields the original set.
    pub fn expand(self, p: Point, center: Point) -> Vec<Point> {
        let theta = self.sector_angle();
        let dx = p.x - center.x;
        let dy = p.y - center.y;
        (0..self.sector_count())
            .map(|i| {
                let (x, y) = if i % 2 == 0 {
                    rotate(dx, dy, i as f32 * theta)
                } else {
                    let boundary = -FRAC_PI_2 + ((i + 1) / 2) as f32 * theta;
                    reflect(dx, dy, boundary)
                };
                Point::new(x + center.x, y + center.y)
            })
            .collect()
    }

    /// Expands a whole path: one transformed copy of the path per sector,
    /// each copy preserving the authored point order.
    pub fn expand_path(self, points: &[Point], center: Point) -> Vec<Vec<Point>> {
        let count = self.sector_count() as usize;
        let mut copies = vec![Vec::with_capacity(points.len()); count];
        for p in points {
            for (i, copy) in self.expand(*p, center).into_iter().enumerate() {
                copies[i].push(copy);
            }
        }
        copies
    }
}

impl From<FoldMode> for u8 {
    fn from(mode: FoldMode) -> u8 {
        mode as u8
    }
}

impl TryFrom<u8> for FoldMode {
    type Error = WireCodeError;

    fn try_from(code: u8) -> Result<Self, WireCodeError> {
        match code {
            0 => Ok(FoldMode::Zero),
            1 => Ok(FoldMode::One),
            2 => Ok(FoldMode::Two),
            3 => Ok(FoldMode::Three),
            4 => Ok(FoldMode::Four),
            5 => Ok(FoldMode::Five),
            6 => Ok(FoldMode::Six),
            7 => Ok(FoldMode::Seven),
            8 => Ok(FoldMode::Eight),
            _ => Err(WireCodeError::new("fold mode", code)),
        }
    }
}

fn rotate(x: f32, y: f32, angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Reflect across the line through the origin at `axis` radians.
fn reflect(x: f32, y: f32, axis: f32) -> (f32, f32) {
    let (sin, cos) = (2.0 * axis).sin_cos();
    (x * cos + y * sin, x * sin - y * cos)
}

//! Stroke tessellation for the drawing tools.

use crate::action::{Point, ToolMode};

/// Catmull-Rom sampling density per control-point span.
const SPLINE_SEGMENTS: usize = 16;

/// Half-width of the eraser's effect, in canvas units.
pub const ERASER_RADIUS: f32 = 4.0;

/// Turns captured gesture points into a drawable polyline.
///
/// The bezier tool fits a smooth curve through all points in order; the
/// draft pen keeps the raw polyline. The eraser also keeps the raw polyline,
/// but its output marks removal (see [`erase_overlap`]) instead of ink.
pub fn tessellate_stroke(raw_points: &[Point], tool: ToolMode) -> Vec<Point> {
    match tool {
        ToolMode::Bezier => catmull_rom(raw_points),
        _ => raw_points.to_vec(),
    }
}

/// Centripetal-free Catmull-Rom through all input points, open ended.
fn catmull_rom(points: &[Point]) -> Vec<Point> {
    if points.len() < 2 {
        return points.to_vec();
    }

    // duplicate the end points so the curve spans first..=last
    let mut pts = Vec::with_capacity(points.len() + 2);
    pts.push(points[0]);
    pts.extend_from_slice(points);
    pts.push(points[points.len() - 1]);

    let mut result = Vec::with_capacity((pts.len() - 3) * (SPLINE_SEGMENTS + 1));
    for i in 1..pts.len() - 2 {
        let p0 = pts[i - 1];
        let p1 = pts[i];
        let p2 = pts[i + 1];
        let p3 = pts[i + 2];

        for t in 0..=SPLINE_SEGMENTS {
            let t_norm = t as f32 / SPLINE_SEGMENTS as f32;
            let t2 = t_norm * t_norm;
            let t3 = t2 * t_norm;

            let x = 0.5
                * ((2.0 * p1.x)
                    + (-p0.x + p2.x) * t_norm
                    + (2.0 * p0.x - 5.0 * p1.x + 4.0 * p2.x - p3.x) * t2
                    + (-p0.x + 3.0 * p1.x - 3.0 * p2.x + p3.x) * t3);
            let y = 0.5
                * ((2.0 * p1.y)
                    + (-p0.y + p2.y) * t_norm
                    + (2.0 * p0.y - 5.0 * p1.y + 4.0 * p2.y - p3.y) * t2
                    + (-p0.y + 3.0 * p1.y - 3.0 * p2.y + p3.y) * t3);

            result.push(Point::new(x, y));
        }
    }

    result
}

/// Removes the parts of `polyline` that pass within `radius` of the eraser
/// path. Surviving runs come back as separate polylines, in order; runs
/// shorter than two points are dropped.
pub fn erase_overlap(polyline: &[Point], eraser: &[Point], radius: f32) -> Vec<Vec<Point>> {
    if polyline.len() < 2 {
        return Vec::new();
    }
    if eraser.len() < 2 {
        return vec![polyline.to_vec()];
    }

    let radius_sq = radius * radius;
    let erased: Vec<bool> = polyline
        .windows(2)
        .map(|seg| {
            eraser
                .windows(2)
                .any(|es| segment_distance_sq(seg[0], seg[1], es[0], es[1]) <= radius_sq)
        })
        .collect();

    let mut runs = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    for (i, seg_erased) in erased.iter().enumerate() {
        if *seg_erased {
            if current.len() >= 2 {
                runs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        } else {
            if current.is_empty() {
                current.push(polyline[i]);
            }
            current.push(polyline[i + 1]);
        }
    }
    if current.len() >= 2 {
        runs.push(current);
    }
    runs
}

fn point_segment_distance_sq(p: Point, a: Point, b: Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq <= f32::EPSILON {
        return p.distance_sq(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance_sq(Point::new(a.x + t * abx, a.y + t * aby))
}

fn segments_cross(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let orient = |a: Point, b: Point, c: Point| -> f32 {
        (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
    };
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn segment_distance_sq(a1: Point, a2: Point, b1: Point, b2: Point) -> f32 {
    if segments_cross(a1, a2, b1, b2) {
        return 0.0;
    }
    point_segment_distance_sq(a1, b1, b2)
        .min(point_segment_distance_sq(a2, b1, b2))
        .min(point_segment_distance_sq(b1, a1, a2))
        .min(point_segment_distance_sq(b2, a1, a2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pen_keeps_raw_points() {
        let raw = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert_eq!(tessellate_stroke(&raw, ToolMode::DraftPen), raw);
    }

    #[test]
    fn bezier_curve_passes_through_input_points() {
        let raw = vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 80.0),
            Point::new(100.0, 0.0),
        ];
        let curve = tessellate_stroke(&raw, ToolMode::Bezier);
        assert!(curve.len() > raw.len());
        for p in &raw {
            let hit = curve.iter().any(|c| c.distance_sq(*p) < 1.0);
            assert!(hit, "curve must pass through {p:?}");
        }
    }

    #[test]
    fn eraser_splits_a_polyline() {
        let line: Vec<Point> = (0..11).map(|i| Point::new(i as f32 * 10.0, 0.0)).collect();
        let eraser = vec![Point::new(50.0, -20.0), Point::new(50.0, 20.0)];
        let runs = erase_overlap(&line, &eraser, ERASER_RADIUS);
        assert_eq!(runs.len(), 2);
        assert!(runs[0].last().is_some_and(|p| p.x <= 50.0));
        assert!(runs[1].first().is_some_and(|p| p.x >= 50.0));
    }

    #[test]
    fn eraser_missing_the_line_keeps_it_whole() {
        let line = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let eraser = vec![Point::new(0.0, 50.0), Point::new(100.0, 50.0)];
        let runs = erase_overlap(&line, &eraser, ERASER_RADIUS);
        assert_eq!(runs, vec![line]);
    }
}

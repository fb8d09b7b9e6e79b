//! Polygon boolean subtraction for cut actions.
//!
//! The paper is a set of disjoint pieces, each an outer loop with zero or
//! more holes that are strictly interior and pairwise disjoint. Cuts remove
//! the union of all enclosed simple loops of the authored path, expanded
//! through the fold symmetry. Self-intersecting paths are normalized by
//! splitting them into simple loops at each crossing; every enclosed lobe is
//! removed (a figure-eight removes both lobes), and paper fully surrounded
//! by a removed region is disconnected and falls away with it.

use crate::action::Point;
use crate::error::EngineError;
use crate::geometry::fold::FoldMode;
use cavalier_contours::polyline::{
    BooleanOp, PlineSource, PlineSourceMut, PlineVertex, Polyline,
};

/// Minimum enclosed area for a cut loop to count, in square canvas units.
pub const MIN_CUT_AREA: f32 = 1.0;
/// A cut must leave at least this much paper behind.
pub const MIN_PAPER_AREA: f32 = 1.0;
/// Boolean results below this area are numeric slivers and are dropped.
const CRUMB_AREA: f32 = 0.5;
/// Consecutive vertices closer than this are collapsed before boolean ops.
const DEDUPE_TOLERANCE_SQ: f32 = 1e-6;
/// Loop-splitting bail-out for pathological input.
const MAX_SIMPLE_LOOPS: usize = 256;

/// One connected piece of paper.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Piece {
    pub outer: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

/// Removes the region enclosed by `raw_points` (auto-closed, expanded through
/// the fold symmetry about `center`) from the paper.
///
/// Fails with `DegenerateCut` when no simple loop of the path encloses area,
/// and with `EmptyResult` when the subtraction would blank the paper; the
/// input pieces are untouched in both cases.
pub fn subtract_cut_path(
    pieces: &[Piece],
    raw_points: &[Point],
    fold: FoldMode,
    center: Point,
) -> Result<Vec<Piece>, EngineError> {
    let mut removed: Vec<Vec<Point>> = Vec::new();
    for simple in split_simple_loops(raw_points) {
        if loop_area(&simple) < MIN_CUT_AREA {
            continue;
        }
        for copy in fold.expand_path(&simple, center) {
            removed = union_into(removed, copy);
        }
    }
    if removed.is_empty() {
        return Err(EngineError::DegenerateCut);
    }

    let result = subtract_region(pieces, &removed);
    if total_area(&result) < MIN_PAPER_AREA {
        return Err(EngineError::EmptyResult);
    }
    Ok(result)
}

/// Signed area of a closed loop (positive for counter-clockwise winding).
pub fn signed_area(points: &[Point]) -> f32 {
    let mut sum = 0.0f64;
    for i in 0..points.len() {
        let p1 = points[i];
        let p2 = points[(i + 1) % points.len()];
        sum += p1.x as f64 * p2.y as f64 - p2.x as f64 * p1.y as f64;
    }
    (sum * 0.5) as f32
}

pub fn loop_area(points: &[Point]) -> f32 {
    signed_area(points).abs()
}

pub fn piece_area(piece: &Piece) -> f32 {
    let holes: f32 = piece.holes.iter().map(|h| loop_area(h)).sum();
    loop_area(&piece.outer) - holes
}

pub fn total_area(pieces: &[Piece]) -> f32 {
    pieces.iter().map(piece_area).sum()
}

/// Even-odd ray cast.
pub fn point_in_loop(p: Point, poly: &[Point]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (pi, pj) = (poly[i], poly[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pi.x + (p.y - pi.y) * (pj.x - pi.x) / (pj.y - pi.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Splits a closed (auto-closing) path into simple loops at each proper
/// self-crossing. Loops that never cross come back unchanged.
pub fn split_simple_loops(raw: &[Point]) -> Vec<Vec<Point>> {
    let mut stack = vec![raw.to_vec()];
    let mut out = Vec::new();
    while let Some(poly) = stack.pop() {
        if poly.len() < 3 {
            continue;
        }
        if out.len() + stack.len() > MAX_SIMPLE_LOOPS {
            out.push(poly);
            continue;
        }
        match first_self_crossing(&poly) {
            None => out.push(poly),
            Some((i, j, x)) => {
                // pinch the loop between segments i and j off at the crossing
                let mut outer_rest = Vec::with_capacity(i + 2 + poly.len().saturating_sub(j + 1));
                outer_rest.extend_from_slice(&poly[..=i]);
                outer_rest.push(x);
                outer_rest.extend_from_slice(&poly[j + 1..]);
                let mut pinched = Vec::with_capacity(j - i + 1);
                pinched.push(x);
                pinched.extend_from_slice(&poly[i + 1..=j]);
                stack.push(outer_rest);
                stack.push(pinched);
            }
        }
    }
    out
}

fn first_self_crossing(poly: &[Point]) -> Option<(usize, usize, Point)> {
    let n = poly.len();
    for i in 0..n {
        for j in (i + 2)..n {
            // adjacent segments share an endpoint, including the closing pair
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a1, a2) = (poly[i], poly[(i + 1) % n]);
            let (b1, b2) = (poly[j], poly[(j + 1) % n]);
            if let Some(x) = proper_crossing(a1, a2, b1, b2) {
                return Some((i, j, x));
            }
        }
    }
    None
}

fn orient(a: Point, b: Point, c: Point) -> f64 {
    let abx = (b.x - a.x) as f64;
    let aby = (b.y - a.y) as f64;
    let acx = (c.x - a.x) as f64;
    let acy = (c.y - a.y) as f64;
    abx * acy - aby * acx
}

/// Intersection point of two properly crossing segments (endpoint touches
/// do not count).
fn proper_crossing(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);
    let straddles =
        ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0));
    if !straddles {
        return None;
    }
    let t = d1 / (d1 - d2);
    Some(Point::new(
        a1.x + (t as f32) * (a2.x - a1.x),
        a1.y + (t as f32) * (a2.y - a1.y),
    ))
}

fn bbox(points: &[Point]) -> (f32, f32, f32, f32) {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    (min_x, min_y, max_x, max_y)
}

fn bbox_overlap(a: &[Point], b: &[Point]) -> bool {
    let (ax0, ay0, ax1, ay1) = bbox(a);
    let (bx0, by0, bx1, by1) = bbox(b);
    ax0 <= bx1 && bx0 <= ax1 && ay0 <= by1 && by0 <= ay1
}

fn any_crossing(a: &[Point], b: &[Point]) -> bool {
    let (n, m) = (a.len(), b.len());
    for i in 0..n {
        for j in 0..m {
            let (a1, a2) = (a[i], a[(i + 1) % n]);
            let (b1, b2) = (b[j], b[(j + 1) % m]);
            if proper_crossing(a1, a2, b1, b2).is_some() {
                return true;
            }
        }
    }
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interaction {
    Disjoint,
    Crosses,
    AInsideB,
    BInsideA,
}

fn classify(a: &[Point], b: &[Point]) -> Interaction {
    if a.len() < 3 || b.len() < 3 || !bbox_overlap(a, b) {
        return Interaction::Disjoint;
    }
    if any_crossing(a, b) {
        return Interaction::Crosses;
    }
    // Non-crossing loops are nested or disjoint. Vertices exactly on the
    // other boundary (loops pinched off at a shared crossing) ray-cast
    // arbitrarily, so containment is decided by majority vote.
    if majority_inside(a, b) {
        return Interaction::AInsideB;
    }
    if majority_inside(b, a) {
        return Interaction::BInsideA;
    }
    Interaction::Disjoint
}

fn majority_inside(a: &[Point], b: &[Point]) -> bool {
    let votes = a.iter().filter(|p| point_in_loop(**p, b)).count();
    votes * 2 > a.len()
}

/// Prepares a loop for boolean ops: collapse duplicate vertices, drop a
/// repeated closing vertex and enforce counter-clockwise orientation.
fn to_pline(points: &[Point]) -> Polyline<f64> {
    let mut clean: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if clean
            .last()
            .is_none_or(|last| last.distance_sq(*p) > DEDUPE_TOLERANCE_SQ)
        {
            clean.push(*p);
        }
    }
    if clean.len() > 1 {
        if let (Some(first), Some(last)) = (clean.first().copied(), clean.last().copied()) {
            if first.distance_sq(last) <= DEDUPE_TOLERANCE_SQ {
                clean.pop();
            }
        }
    }
    if signed_area(&clean) < 0.0 {
        clean.reverse();
    }

    let mut pline = Polyline::new();
    for p in &clean {
        pline.add_vertex(PlineVertex::new(p.x as f64, p.y as f64, 0.0));
    }
    pline.set_is_closed(true);
    pline
}

fn from_pline(pline: &Polyline<f64>) -> Vec<Point> {
    pline
        .vertex_data
        .iter()
        .map(|v| Point::new(v.x as f32, v.y as f32))
        .collect()
}

/// Subtracts one removed loop from one outer loop. Returns the surviving
/// outer loops plus any hole created strictly inside them. The boolean
/// library is only consulted when the loops genuinely cross.
fn subtract_from_loop(outer: &[Point], removed: &[Point]) -> (Vec<Vec<Point>>, Vec<Vec<Point>>) {
    match classify(outer, removed) {
        Interaction::Disjoint => (vec![outer.to_vec()], Vec::new()),
        Interaction::BInsideA => (vec![outer.to_vec()], vec![removed.to_vec()]),
        Interaction::AInsideB => (Vec::new(), Vec::new()),
        Interaction::Crosses => {
            let result = to_pline(outer).boolean(&to_pline(removed), BooleanOp::Not);
            let pos = result
                .pos_plines
                .iter()
                .map(|r| from_pline(&r.pline))
                .filter(|l| loop_area(l) > CRUMB_AREA)
                .collect();
            let neg = result
                .neg_plines
                .iter()
                .map(|r| from_pline(&r.pline))
                .filter(|l| loop_area(l) > CRUMB_AREA)
                .collect();
            (pos, neg)
        }
    }
}

/// Union of two crossing loops. Enclosed gaps are dropped: paper fully
/// surrounded by a removed region falls away with it.
fn union_crossing(a: &[Point], b: &[Point]) -> Vec<Vec<Point>> {
    let result = to_pline(a).boolean(&to_pline(b), BooleanOp::Or);
    result
        .pos_plines
        .iter()
        .map(|r| from_pline(&r.pline))
        .filter(|l| loop_area(l) > CRUMB_AREA)
        .collect()
}

/// Adds `incoming` to a set of pairwise disjoint loops, merging it with any
/// loop it touches so the set stays disjoint.
fn union_into(mut disjoint: Vec<Vec<Point>>, incoming: Vec<Point>) -> Vec<Vec<Point>> {
    let mut pending = vec![incoming];
    while let Some(mut current) = pending.pop() {
        if current.len() < 3 {
            continue;
        }
        let mut absorbed = false;
        let mut i = 0;
        while i < disjoint.len() {
            match classify(&current, &disjoint[i]) {
                Interaction::Disjoint => i += 1,
                Interaction::AInsideB => {
                    absorbed = true;
                    break;
                }
                Interaction::BInsideA => {
                    disjoint.swap_remove(i);
                }
                Interaction::Crosses => {
                    let other = disjoint.swap_remove(i);
                    let mut parts = union_crossing(&current, &other);
                    match parts.pop() {
                        Some(grown) => {
                            current = grown;
                            pending.extend(parts);
                            i = 0;
                        }
                        None => {
                            absorbed = true;
                            break;
                        }
                    }
                }
            }
        }
        if !absorbed {
            disjoint.push(current);
        }
    }
    disjoint
}

/// Removes a set of disjoint loops from every piece.
fn subtract_region(pieces: &[Piece], removed: &[Vec<Point>]) -> Vec<Piece> {
    let mut out = Vec::new();
    for piece in pieces {
        // Fold the piece's holes into the removed set where they touch it,
        // keeping the removed region a set of disjoint loops.
        let mut region: Vec<Vec<Point>> = removed.to_vec();
        let mut kept_holes: Vec<Vec<Point>> = Vec::new();
        for hole in &piece.holes {
            let touches = region
                .iter()
                .any(|m| classify(hole, m) != Interaction::Disjoint);
            if touches {
                region = union_into(region, hole.clone());
            } else {
                kept_holes.push(hole.clone());
            }
        }

        let mut frontier: Vec<Vec<Point>> = vec![piece.outer.clone()];
        let mut new_holes: Vec<Vec<Point>> = Vec::new();
        for m in &region {
            let mut next = Vec::new();
            for outer in &frontier {
                let (pos, neg) = subtract_from_loop(outer, m);
                next.extend(pos);
                new_holes.extend(neg);
            }
            frontier = next;
            if frontier.is_empty() {
                break;
            }
        }

        for outer in frontier {
            let holes: Vec<Vec<Point>> = kept_holes
                .iter()
                .chain(new_holes.iter())
                .filter(|h| h.first().is_some_and(|p| point_in_loop(*p, &outer)))
                .cloned()
                .collect();
            out.push(Piece { outer, holes });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f32, cy: f32, half: f32) -> Vec<Point> {
        vec![
            Point::new(cx - half, cy - half),
            Point::new(cx + half, cy - half),
            Point::new(cx + half, cy + half),
            Point::new(cx - half, cy + half),
        ]
    }

    #[test]
    fn point_in_loop_basics() {
        let sq = square(0.0, 0.0, 10.0);
        assert!(point_in_loop(Point::new(0.0, 0.0), &sq));
        assert!(!point_in_loop(Point::new(20.0, 0.0), &sq));
    }

    #[test]
    fn bowtie_splits_into_two_loops() {
        // self-crossing "bowtie": (0,0) -> (10,10) -> (10,0) -> (0,10)
        let bowtie = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ];
        let loops = split_simple_loops(&bowtie);
        assert_eq!(loops.len(), 2);
        for l in &loops {
            assert!(loop_area(l) > MIN_CUT_AREA);
        }
    }

    #[test]
    fn interior_cut_becomes_hole() {
        let paper = vec![Piece {
            outer: square(0.0, 0.0, 100.0),
            holes: Vec::new(),
        }];
        let result =
            subtract_cut_path(&paper, &square(0.0, 0.0, 10.0), FoldMode::Zero, Point::default())
                .expect("cut should apply");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes.len(), 1);
        let expected = 200.0 * 200.0 - 20.0 * 20.0;
        assert!((total_area(&result) - expected).abs() < 1.0);
    }

    #[test]
    fn edge_cut_reshapes_outline() {
        let paper = vec![Piece {
            outer: square(0.0, 0.0, 100.0),
            holes: Vec::new(),
        }];
        // square straddling the right edge
        let result =
            subtract_cut_path(&paper, &square(100.0, 0.0, 20.0), FoldMode::Zero, Point::default())
                .expect("cut should apply");
        assert_eq!(result.len(), 1);
        assert!(result[0].holes.is_empty());
        let expected = 200.0 * 200.0 - 20.0 * 40.0;
        assert!((total_area(&result) - expected).abs() < 1.0);
    }

    #[test]
    fn collinear_cut_is_degenerate() {
        let paper = vec![Piece {
            outer: square(0.0, 0.0, 100.0),
            holes: Vec::new(),
        }];
        let line = vec![
            Point::new(-50.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
        ];
        let err = subtract_cut_path(&paper, &line, FoldMode::Zero, Point::default());
        assert_eq!(err, Err(EngineError::DegenerateCut));
    }

    #[test]
    fn over_cut_is_rejected() {
        let paper = vec![Piece {
            outer: square(0.0, 0.0, 100.0),
            holes: Vec::new(),
        }];
        let err = subtract_cut_path(&paper, &square(0.0, 0.0, 300.0), FoldMode::Zero, Point::default());
        assert_eq!(err, Err(EngineError::EmptyResult));
    }

    #[test]
    fn overlapping_cuts_merge_into_one_hole() {
        let paper = vec![Piece {
            outer: square(0.0, 0.0, 100.0),
            holes: Vec::new(),
        }];
        let first =
            subtract_cut_path(&paper, &square(-5.0, 0.0, 10.0), FoldMode::Zero, Point::default())
                .expect("first cut");
        let second =
            subtract_cut_path(&first, &square(5.0, 0.0, 10.0), FoldMode::Zero, Point::default())
                .expect("second cut");
        // the two overlapping squares merge into a single 30x20 hole
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].holes.len(), 1);
        let expected = 200.0 * 200.0 - 30.0 * 20.0;
        assert!((total_area(&second) - expected).abs() < 1.0);
    }

    #[test]
    fn cut_splitting_paper_yields_two_pieces() {
        let paper = vec![Piece {
            outer: square(0.0, 0.0, 100.0),
            holes: Vec::new(),
        }];
        // band across the middle, wider than the paper
        let band = vec![
            Point::new(-150.0, -10.0),
            Point::new(150.0, -10.0),
            Point::new(150.0, 10.0),
            Point::new(-150.0, 10.0),
        ];
        let result = subtract_cut_path(&paper, &band, FoldMode::Zero, Point::default())
            .expect("band cut");
        assert_eq!(result.len(), 2);
        let expected = 200.0 * 200.0 - 200.0 * 20.0;
        assert!((total_area(&result) - expected).abs() < 1.0);
    }
}

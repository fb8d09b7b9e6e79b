//! CPU rasterization of the scene onto bound surfaces.
//!
//! Each surface is an engine-owned pixmap the host copies pixels out of;
//! the main and preview targets share the scene but carry independent view
//! transforms. Stroke widths are in model-canvas units, matching how the
//! overlay coordinates are authored.

use crate::action::{Point, ToolMode};
use crate::error::EngineError;
use crate::gesture::GestureBuffer;
use crate::geometry::fold::FoldMode;
use crate::geometry::polygon::Piece;
use crate::paper::{BACKGROUND_COLOR, CANVAS_SIZE, Paper};
use crate::scene::Shape;
use std::f32::consts::FRAC_PI_2;
use tiny_skia::{FillRule, LineCap, Paint, Path, PathBuilder, Pixmap, Transform};

pub const MIN_ZOOM: f32 = 0.2;
pub const MAX_ZOOM: f32 = 8.0;
/// Base magnification applied on top of the user zoom.
pub const VIEW_SCALE: f32 = 1.2;

const PENCIL_COLOR: u32 = 0xFFFF_FFFF;
const PENCIL_WIDTH: f32 = 3.0;
const BEZIER_COLOR: u32 = 0xFFFF_D700;
const BEZIER_WIDTH: f32 = 5.0;
const ERASER_PREVIEW_COLOR: u32 = 0x80FF_FFFF;
const ERASER_PREVIEW_WIDTH: f32 = 8.0;
const CUT_PREVIEW_COLOR: u32 = 0x59FF_D700;
const GUIDE_COLOR: u32 = 0x8000_0000;
const GUIDE_WIDTH: f32 = 2.0;

/// Zoom/pan/rotation/flip; affects rendering only, never geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    zoom: f32,
    pub pan: Point,
    pub rotation: f32,
    pub flipped: bool,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::default(),
            rotation: 0.0,
            flipped: false,
        }
    }
}

impl ViewTransform {
    /// Out-of-range zoom is clamped, not rejected.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }
}

/// One bindable output surface plus its view transform.
#[derive(Debug, Default)]
pub struct RenderTarget {
    pixmap: Option<Pixmap>,
    pub view: ViewTransform,
}

impl RenderTarget {
    /// Binds (or rebinds) the pixel buffer. Rebinding with the current
    /// dimensions keeps the existing buffer, so the call is idempotent.
    pub fn bind(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        if self
            .pixmap
            .as_ref()
            .is_some_and(|p| p.width() == width && p.height() == height)
        {
            return Ok(());
        }
        self.pixmap =
            Some(Pixmap::new(width, height).ok_or(EngineError::InvalidSurfaceSize(width, height))?);
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.pixmap.is_some()
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }
}

/// Rasterizes the scene onto `target`: paper fill, stroke overlay, the live
/// gesture if one is open, and fold guides for the interactive surface.
pub fn render(
    target: &mut RenderTarget,
    shape: &Shape,
    paper: &Paper,
    fold: FoldMode,
    live: Option<&GestureBuffer>,
    draw_guides: bool,
) -> Result<(), EngineError> {
    let view = target.view;
    let pixmap = target
        .pixmap
        .as_mut()
        .ok_or(EngineError::SurfaceNotInitialized)?;

    pixmap.fill(color(BACKGROUND_COLOR));
    let ts = model_to_surface(&view, pixmap.width(), pixmap.height(), Paper::center(fold));

    for piece in &shape.pieces {
        if let Some(path) = piece_path(piece) {
            let mut paint = Paint::default();
            set_color(&mut paint, paper.color);
            pixmap.fill_path(&path, &paint, FillRule::EvenOdd, ts, None);
        }
    }

    for entry in &shape.overlay {
        match entry.tool {
            ToolMode::DraftPen => {
                stroke_polyline(pixmap, &entry.points, PENCIL_COLOR, PENCIL_WIDTH, true, ts)
            }
            ToolMode::Bezier => {
                stroke_polyline(pixmap, &entry.points, BEZIER_COLOR, BEZIER_WIDTH, false, ts)
            }
            // cuts and erasures never reach the overlay
            _ => {}
        }
    }

    if let Some(buffer) = live {
        draw_live_gesture(pixmap, buffer, ts);
    }

    if draw_guides {
        draw_fold_guides(pixmap, paper, fold, ts);
    }

    Ok(())
}

/// Encodes a surface as PNG for `SavedWork` preview images.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, EngineError> {
    let image = image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec())
        .ok_or_else(|| EngineError::PreviewEncoding("pixel buffer size mismatch".into()))?;
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| EngineError::PreviewEncoding(e.to_string()))?;
    Ok(out.into_inner())
}

/// Maps model-canvas coordinates onto the surface: fit the square canvas to
/// the surface, then zoom/pan/rotate/flip about the paper center.
fn model_to_surface(view: &ViewTransform, width: u32, height: u32, center: Point) -> Transform {
    let u = width.min(height) as f32 / CANVAS_SIZE;
    let s = VIEW_SCALE * view.zoom;
    let fx = if view.flipped { -1.0 } else { 1.0 };
    let (sin, cos) = view.rotation.sin_cos();
    let (px, py) = (view.pan.x, view.pan.y);
    let (cx, cy) = (center.x, center.y);

    let sx = u * cos * fx * s;
    let kx = -u * sin * s;
    let ky = u * sin * fx * s;
    let sy = u * cos * s;
    let tx = u * (cos * fx * s * (px - cx) - sin * s * (py - cy) + cx);
    let ty = u * (sin * fx * s * (px - cx) + cos * s * (py - cy) + cy);
    Transform::from_row(sx, ky, kx, sy, tx, ty)
}

fn color(argb: u32) -> tiny_skia::Color {
    let (a, r, g, b) = split_argb(argb);
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn set_color(paint: &mut Paint<'_>, argb: u32) {
    let (a, r, g, b) = split_argb(argb);
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
}

fn split_argb(argb: u32) -> (u8, u8, u8, u8) {
    (
        (argb >> 24) as u8,
        (argb >> 16) as u8,
        (argb >> 8) as u8,
        argb as u8,
    )
}

fn add_loop(pb: &mut PathBuilder, points: &[Point]) {
    if points.len() < 3 {
        return;
    }
    pb.move_to(points[0].x, points[0].y);
    for p in &points[1..] {
        pb.line_to(p.x, p.y);
    }
    pb.close();
}

/// Outer loop plus holes in one path; even-odd fill leaves the holes empty.
fn piece_path(piece: &Piece) -> Option<Path> {
    let mut pb = PathBuilder::new();
    add_loop(&mut pb, &piece.outer);
    for hole in &piece.holes {
        add_loop(&mut pb, hole);
    }
    pb.finish()
}

fn polyline_path(points: &[Point], close: bool) -> Option<Path> {
    if points.len() < 2 {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(points[0].x, points[0].y);
    for p in &points[1..] {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

/// Pencil smoothing: quadratic segments through successive midpoints.
fn smooth_path(points: &[Point]) -> Option<Path> {
    if points.len() < 2 {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(points[0].x, points[0].y);
    if points.len() == 2 {
        pb.line_to(points[1].x, points[1].y);
    } else {
        for i in 1..points.len() - 1 {
            let xc = (points[i].x + points[i + 1].x) * 0.5;
            let yc = (points[i].y + points[i + 1].y) * 0.5;
            pb.quad_to(points[i].x, points[i].y, xc, yc);
        }
        let last = points[points.len() - 1];
        pb.line_to(last.x, last.y);
    }
    pb.finish()
}

fn stroke_polyline(
    pixmap: &mut Pixmap,
    points: &[Point],
    argb: u32,
    width: f32,
    smooth: bool,
    ts: Transform,
) {
    let path = if smooth {
        smooth_path(points)
    } else {
        polyline_path(points, false)
    };
    if let Some(path) = path {
        let mut paint = Paint::default();
        set_color(&mut paint, argb);
        let stroke = tiny_skia::Stroke {
            width,
            line_cap: LineCap::Round,
            ..tiny_skia::Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, ts, None);
    }
}

fn draw_live_gesture(pixmap: &mut Pixmap, buffer: &GestureBuffer, ts: Transform) {
    let points = buffer.points();
    match buffer.tool() {
        ToolMode::Scissors => {
            if let Some(path) = polyline_path(points, true) {
                let mut paint = Paint::default();
                set_color(&mut paint, CUT_PREVIEW_COLOR);
                pixmap.fill_path(&path, &paint, FillRule::EvenOdd, ts, None);
            }
        }
        ToolMode::Bezier => {
            stroke_polyline(pixmap, points, BEZIER_COLOR, BEZIER_WIDTH, true, ts)
        }
        ToolMode::DraftPen => stroke_polyline(pixmap, points, PENCIL_COLOR, PENCIL_WIDTH, true, ts),
        ToolMode::DraftEraser => stroke_polyline(
            pixmap,
            points,
            ERASER_PREVIEW_COLOR,
            ERASER_PREVIEW_WIDTH,
            true,
            ts,
        ),
    }
}

/// Blank-sheet outline plus the sector boundary rays, drawn over everything.
fn draw_fold_guides(pixmap: &mut Pixmap, paper: &Paper, fold: FoldMode, ts: Transform) {
    if let Some(piece) = paper.blank_shape(fold).first() {
        stroke_closed(pixmap, &piece.outer, ts);
    }
    if fold.is_full_paper() {
        return;
    }
    let center = Paper::center(fold);
    let r = Paper::radius();
    let theta = fold.sector_angle();
    for i in 0..fold.sector_count() {
        let angle = -FRAC_PI_2 - theta * 0.5 + i as f32 * theta;
        let tip = Point::new(center.x + r * angle.cos(), center.y + r * angle.sin());
        stroke_open(pixmap, &[center, tip], ts);
    }
}

fn stroke_closed(pixmap: &mut Pixmap, points: &[Point], ts: Transform) {
    if let Some(path) = polyline_path(points, true) {
        guide_stroke(pixmap, &path, ts);
    }
}

fn stroke_open(pixmap: &mut Pixmap, points: &[Point], ts: Transform) {
    if let Some(path) = polyline_path(points, false) {
        guide_stroke(pixmap, &path, ts);
    }
}

fn guide_stroke(pixmap: &mut Pixmap, path: &Path, ts: Transform) {
    let mut paint = Paint::default();
    set_color(&mut paint, GUIDE_COLOR);
    let stroke = tiny_skia::Stroke {
        width: GUIDE_WIDTH,
        ..tiny_skia::Stroke::default()
    };
    pixmap.stroke_path(path, &paint, &stroke, ts, None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped() {
        let mut view = ViewTransform::default();
        view.set_zoom(100.0);
        assert_eq!(view.zoom(), MAX_ZOOM);
        view.set_zoom(0.0);
        assert_eq!(view.zoom(), MIN_ZOOM);
        view.set_zoom(f32::NAN);
        assert_eq!(view.zoom(), MIN_ZOOM);
    }

    #[test]
    fn rebind_with_same_size_is_idempotent() {
        let mut target = RenderTarget::default();
        target.bind(64, 64).expect("bind");
        target.bind(64, 64).expect("rebind");
        assert!(target.is_bound());
        assert!(target.bind(0, 10).is_err());
    }

    #[test]
    fn blank_paper_renders_paper_color_at_center() {
        let paper = Paper::default();
        let fold = FoldMode::Four;
        let shape = Shape::blank(&paper, fold);
        let mut target = RenderTarget::default();
        target.bind(256, 256).expect("bind");
        render(&mut target, &shape, &paper, fold, None, true).expect("render");

        let pixmap = target.pixmap().expect("bound");
        // sample mid-sector, above the center so no guide ray crosses it
        let u = 256.0 / CANVAS_SIZE;
        let center = Paper::center(fold);
        let x = (u * center.x) as u32;
        let y = (u * (VIEW_SCALE * -300.0 + center.y)) as u32;
        let idx = ((y * pixmap.width() + x) * 4) as usize;
        let data = pixmap.data();
        // default paper red, fully opaque
        assert_eq!(data[idx], 0xC4);
        assert_eq!(data[idx + 3], 0xFF);
    }
}

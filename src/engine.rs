//! The engine facade: the only surface exposed to external collaborators.
//!
//! Engine state (log, gesture, scene) lives behind one `RwLock`; every
//! mutating operation takes the write lock, so mutations are serialized and
//! partial gesture state can never interleave. Rendering and `get_actions`
//! take the read lock and snapshot a consistent scene. Each render target
//! has its own mutex, so drawing to the main surface never blocks the
//! preview surface.

use crate::action::{Action, Point, ToolMode};
use crate::error::EngineError;
use crate::gesture::ToolState;
use crate::geometry::fold::FoldMode;
use crate::history::ActionLog;
use crate::paper::{CANVAS_SIZE, Paper, PaperType};
use crate::render::{self, RenderTarget, VIEW_SCALE};
use crate::saved_work::SavedWork;
use crate::scene::{self, Shape};
use crate::util::time;
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

struct EngineState {
    paper: Paper,
    fold: FoldMode,
    tool: ToolMode,
    log: ActionLog,
    gesture: ToolState,
    /// Cached replay of the committed prefix; always bit-for-bit what
    /// `scene::recompute` would produce.
    shape: Shape,
}

impl EngineState {
    fn new() -> Self {
        let paper = Paper::default();
        let fold = FoldMode::default();
        Self {
            shape: Shape::blank(&paper, fold),
            paper,
            fold,
            tool: ToolMode::default(),
            log: ActionLog::new(),
            gesture: ToolState::default(),
        }
    }

    fn recompute(&self) -> Result<Shape, EngineError> {
        scene::recompute(&self.paper, self.fold, self.log.committed())
    }
}

fn ensure_idle(state: &EngineState, what: &'static str) -> Result<(), EngineError> {
    if state.gesture.is_gesturing() {
        return Err(EngineError::ToolBusy(what));
    }
    Ok(())
}

/// One engine instance owns one work in progress. Constructed explicitly
/// and handed to whatever owns the UI surfaces; there is no ambient global.
pub struct PaperCutEngine {
    state: RwLock<EngineState>,
    main: Mutex<RenderTarget>,
    preview: Mutex<RenderTarget>,
}

impl Default for PaperCutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperCutEngine {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(EngineState::new()),
            main: Mutex::new(RenderTarget::default()),
            preview: Mutex::new(RenderTarget::default()),
        }
    }

    // ---- surface binding ----

    /// Binds the main interactive surface. Safe to call again when the host
    /// recreates its surface.
    pub fn initialize(&self, width: u32, height: u32) -> Result<(), EngineError> {
        debug!("binding main surface {width}x{height}");
        self.main.lock().bind(width, height)
    }

    /// Binds the independent preview surface.
    pub fn set_preview_surface(&self, width: u32, height: u32) -> Result<(), EngineError> {
        debug!("binding preview surface {width}x{height}");
        self.preview.lock().bind(width, height)
    }

    // ---- gesture ----

    pub fn start_drawing(&self, x: f32, y: f32) -> Result<(), EngineError> {
        let mut state = self.state.write();
        let tool = state.tool;
        state.gesture.begin(tool, Point::new(x, y))
    }

    /// Buffers a point into the open gesture. Silently ignored when no
    /// gesture is open; any finite coordinate is accepted.
    pub fn add_point(&self, x: f32, y: f32) {
        self.state.write().gesture.add_point(Point::new(x, y));
    }

    /// Commits the open gesture as an action.
    ///
    /// A buffer with fewer than two points commits as a degenerate no-op
    /// action. A cut that fails geometrically commits nothing: the log and
    /// scene stay at their pre-call state and the gesture is discarded so
    /// the user can retry.
    pub fn finish_drawing(&self) -> Result<(), EngineError> {
        let mut state = self.state.write();
        let Some(buffer) = state.gesture.take_finished() else {
            return Ok(());
        };
        let action = buffer.into_action();
        if action.is_degenerate() {
            debug!("committing degenerate {:?} gesture as a no-op", action.tool);
            state.log.push(action);
            return Ok(());
        }
        match scene::apply_action(&state.shape, &action, state.fold) {
            Ok(shape) => {
                debug!(
                    "committed {:?} action with {} points",
                    action.tool,
                    action.points.len()
                );
                state.shape = shape;
                state.log.push(action);
                Ok(())
            }
            Err(err) => {
                warn!("gesture rejected: {err}");
                Err(err)
            }
        }
    }

    /// Discards the open gesture without committing anything.
    pub fn cancel_drawing(&self) {
        self.state.write().gesture.cancel();
    }

    // ---- modes (idle only) ----

    pub fn set_tool_mode(&self, tool: ToolMode) -> Result<(), EngineError> {
        let mut state = self.state.write();
        ensure_idle(&state, "tool change during open gesture")?;
        state.tool = tool;
        Ok(())
    }

    /// Changes the fold mode. Past actions are never rewritten, but the
    /// scene is re-derived under the new symmetry; if the existing history
    /// does not replay under it, the change is rolled back and the error
    /// surfaced.
    pub fn set_fold_mode(&self, fold: FoldMode) -> Result<(), EngineError> {
        let mut state = self.state.write();
        ensure_idle(&state, "fold change during open gesture")?;
        if state.fold == fold {
            return Ok(());
        }
        let previous = state.fold;
        state.fold = fold;
        match state.recompute() {
            Ok(shape) => {
                state.shape = shape;
                Ok(())
            }
            Err(err) => {
                state.fold = previous;
                warn!("fold change rejected, history does not replay: {err}");
                Err(err)
            }
        }
    }

    pub fn set_paper_type(&self, kind: PaperType) -> Result<(), EngineError> {
        let mut state = self.state.write();
        ensure_idle(&state, "paper change during open gesture")?;
        if state.paper.kind == kind {
            return Ok(());
        }
        let previous = state.paper.kind;
        state.paper.kind = kind;
        match state.recompute() {
            Ok(shape) => {
                state.shape = shape;
                Ok(())
            }
            Err(err) => {
                state.paper.kind = previous;
                warn!("paper change rejected, history does not replay: {err}");
                Err(err)
            }
        }
    }

    /// Paper color affects rendering only, never geometry.
    pub fn set_paper_color(&self, argb: u32) -> Result<(), EngineError> {
        let mut state = self.state.write();
        ensure_idle(&state, "color change during open gesture")?;
        state.paper.color = argb;
        Ok(())
    }

    // ---- history ----

    /// Steps the cursor back one action; a no-op at the start of history.
    pub fn undo(&self) {
        let mut state = self.state.write();
        if !state.log.undo() {
            return;
        }
        match state.recompute() {
            Ok(shape) => state.shape = shape,
            Err(err) => {
                // a committed prefix always replays; restore the cursor
                state.log.redo();
                warn!("undo replay failed: {err}");
            }
        }
    }

    /// Steps the cursor forward one action; a no-op at the end of history.
    pub fn redo(&self) {
        let mut state = self.state.write();
        if !state.log.redo() {
            return;
        }
        match state.recompute() {
            Ok(shape) => state.shape = shape,
            Err(err) => {
                state.log.undo();
                warn!("redo replay failed: {err}");
            }
        }
    }

    /// Discards the whole history and returns to the blank sheet. The only
    /// way to start over after cuts have been committed.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.log.clear();
        state.gesture.cancel();
        state.shape = Shape::blank(&state.paper, state.fold);
        debug!("history cleared");
    }

    /// The committed prefix only; undone-but-redoable actions are not
    /// exposed for persistence.
    pub fn get_actions(&self) -> Vec<Action> {
        self.state.read().log.committed().to_vec()
    }

    /// Replaces the whole history, validating it by full replay first. On
    /// failure the prior state is left untouched.
    pub fn set_actions(&self, actions: Vec<Action>) -> Result<(), EngineError> {
        let mut state = self.state.write();
        ensure_idle(&state, "history restore during open gesture")?;
        match scene::recompute(&state.paper, state.fold, &actions) {
            Ok(shape) => {
                debug!("restored {} actions", actions.len());
                state.log.replace_all(actions);
                state.shape = shape;
                Ok(())
            }
            Err(err) => {
                warn!("rejecting action sequence: {err}");
                Err(EngineError::InvalidActionSequence(err.to_string()))
            }
        }
    }

    // ---- view ----

    pub fn set_zoom(&self, zoom: f32) {
        self.main.lock().view.set_zoom(zoom);
    }

    pub fn set_pan(&self, x: f32, y: f32) {
        let p = Point::new(x, y);
        if p.is_finite() {
            self.main.lock().view.pan = p;
        }
    }

    pub fn set_rotation(&self, radians: f32) {
        if radians.is_finite() {
            self.main.lock().view.rotation = radians;
        }
    }

    pub fn set_flip(&self, flipped: bool) {
        self.main.lock().view.flipped = flipped;
    }

    pub fn set_preview_zoom(&self, zoom: f32) {
        self.preview.lock().view.set_zoom(zoom);
    }

    pub fn zoom(&self) -> f32 {
        self.main.lock().view.zoom()
    }

    // ---- rendering ----

    /// Draws the scene, the live gesture and the fold guides onto the main
    /// surface.
    pub fn render(&self) -> Result<(), EngineError> {
        let state = self.state.read();
        let mut target = self.main.lock();
        render::render(
            &mut target,
            &state.shape,
            &state.paper,
            state.fold,
            state.gesture.buffer(),
            true,
        )
    }

    /// Draws the scene alone onto the preview surface.
    pub fn render_preview(&self) -> Result<(), EngineError> {
        let state = self.state.read();
        let mut target = self.preview.lock();
        render::render(&mut target, &state.shape, &state.paper, state.fold, None, false)
    }

    /// RGBA pixels of the main surface, for the host compositor.
    pub fn main_pixels(&self) -> Option<Vec<u8>> {
        self.main.lock().pixmap().map(|p| p.data().to_vec())
    }

    /// PNG encoding of the preview surface's last rendered frame.
    pub fn preview_png(&self) -> Result<Vec<u8>, EngineError> {
        let target = self.preview.lock();
        let pixmap = target.pixmap().ok_or(EngineError::SurfaceNotInitialized)?;
        render::encode_png(pixmap)
    }

    // ---- coordinate conversion ----

    /// Maps a main-surface coordinate into canvas space under the current
    /// zoom and pan (rotation and flip are not part of input mapping).
    pub fn screen_to_model(&self, x: f32, y: f32) -> Point {
        let fold = self.state.read().fold;
        let target = self.main.lock();
        let (w, h) = target
            .pixmap()
            .map(|p| (p.width(), p.height()))
            .unwrap_or((CANVAS_SIZE as u32, CANVAS_SIZE as u32));
        let u = w.min(h) as f32 / CANVAS_SIZE;
        let s = VIEW_SCALE * target.view.zoom();
        let c = Paper::center(fold);
        Point::new(
            (x / u - c.x) / s + c.x - target.view.pan.x,
            (y / u - c.y) / s + c.y - target.view.pan.y,
        )
    }

    pub fn model_to_screen(&self, x: f32, y: f32) -> Point {
        let fold = self.state.read().fold;
        let target = self.main.lock();
        let (w, h) = target
            .pixmap()
            .map(|p| (p.width(), p.height()))
            .unwrap_or((CANVAS_SIZE as u32, CANVAS_SIZE as u32));
        let u = w.min(h) as f32 / CANVAS_SIZE;
        let s = VIEW_SCALE * target.view.zoom();
        let c = Paper::center(fold);
        Point::new(
            u * (s * (x - c.x + target.view.pan.x) + c.x),
            u * (s * (y - c.y + target.view.pan.y) + c.y),
        )
    }

    // ---- snapshots ----

    pub fn shape(&self) -> Shape {
        self.state.read().shape.clone()
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.state.read().tool
    }

    pub fn fold_mode(&self) -> FoldMode {
        self.state.read().fold
    }

    pub fn paper_type(&self) -> PaperType {
        self.state.read().paper.kind
    }

    pub fn paper_color(&self) -> u32 {
        self.state.read().paper.color
    }

    pub fn is_drawing(&self) -> bool {
        self.state.read().gesture.is_gesturing()
    }

    // ---- persistence boundary ----

    /// Snapshots the work for the external store, rendering a preview
    /// thumbnail when a preview surface is bound.
    pub fn to_saved_work(&self, title: Option<String>) -> SavedWork {
        let (paper, fold, actions) = {
            let state = self.state.read();
            (state.paper, state.fold, state.log.committed().to_vec())
        };
        let preview_image = if self.preview.lock().is_bound() {
            self.render_preview()
                .ok()
                .and_then(|_| self.preview_png().ok())
        } else {
            None
        };
        SavedWork {
            id: None,
            title,
            paper_type: paper.kind,
            paper_color: paper.color,
            date: time::timestamp_millis(),
            fold_mode: fold,
            actions,
            preview_image,
        }
    }

    /// Restores a saved work. The sequence is validated by full replay
    /// before anything is adopted, so a corrupt work leaves the current
    /// state untouched.
    pub fn load_saved_work(&self, work: &SavedWork) -> Result<(), EngineError> {
        let mut state = self.state.write();
        ensure_idle(&state, "restore during open gesture")?;
        let paper = Paper {
            kind: work.paper_type,
            color: work.paper_color,
        };
        let shape = scene::recompute(&paper, work.fold_mode, &work.actions)
            .map_err(|e| EngineError::InvalidActionSequence(e.to_string()))?;
        state.paper = paper;
        state.fold = work.fold_mode;
        state.log.replace_all(work.actions.clone());
        state.shape = shape;
        debug!("loaded saved work with {} actions", work.actions.len());
        Ok(())
    }
}

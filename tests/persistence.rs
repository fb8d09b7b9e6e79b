use papercut::action::{Action, ActionKind, Point, ToolMode};
use papercut::engine::PaperCutEngine;
use papercut::error::EngineError;
use papercut::geometry::fold::FoldMode;
use papercut::paper::{Paper, PaperType};
use papercut::saved_work::SavedWork;

fn draw(engine: &PaperCutEngine, points: &[(f32, f32)]) {
    let (first, rest) = points.split_first().expect("at least one point");
    engine.start_drawing(first.0, first.1).expect("start");
    for p in rest {
        engine.add_point(p.0, p.1);
    }
    engine.finish_drawing().expect("finish");
}

fn sector_cut(engine: &PaperCutEngine, offset_y: f32, half: f32) {
    let c = Paper::center(engine.fold_mode());
    draw(
        engine,
        &[
            (c.x - half, c.y - offset_y - half),
            (c.x + half, c.y - offset_y - half),
            (c.x + half, c.y - offset_y + half),
            (c.x - half, c.y - offset_y + half),
        ],
    );
}

#[test]
fn saved_work_round_trips_through_json() {
    let engine = PaperCutEngine::new();
    engine.set_fold_mode(FoldMode::Two).expect("idle");
    engine.set_paper_type(PaperType::Square).expect("idle");
    engine.set_paper_color(0xFF12_3456).expect("idle");
    sector_cut(&engine, 300.0, 40.0);

    let work = engine.to_saved_work(Some("window flower".into()));
    let json = work.to_json().expect("encode");
    let decoded = SavedWork::from_json(&json).expect("decode");
    assert_eq!(decoded, work);

    let restored = PaperCutEngine::new();
    restored.load_saved_work(&decoded).expect("restore");
    assert_eq!(restored.shape(), engine.shape());
    assert_eq!(restored.fold_mode(), FoldMode::Two);
    assert_eq!(restored.paper_type(), PaperType::Square);
    assert_eq!(restored.paper_color(), 0xFF12_3456);
}

#[test]
fn wire_format_uses_numeric_codes_and_camel_case() {
    let engine = PaperCutEngine::new();
    sector_cut(&engine, 300.0, 40.0);
    let work = engine.to_saved_work(None);
    let json = work.to_json().expect("encode");

    assert!(json.contains("\"paperType\":0"));
    assert!(json.contains("\"foldMode\":4"));
    assert!(json.contains("\"type\":0"));
    assert!(json.contains("\"tool\":0"));
}

#[test]
fn unknown_wire_codes_are_rejected() {
    let json = r#"{
        "paperType": 0,
        "paperColor": 4290840092,
        "date": 0,
        "foldMode": 4,
        "actions": [{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "type": 0,
            "tool": 9,
            "points": [{"x": 0.0, "y": 0.0}],
            "timestamp": 0
        }]
    }"#;
    let err = SavedWork::from_json(json);
    assert!(matches!(err, Err(EngineError::InvalidActionSequence(_))));

    let bad_fold = r#"{"foldMode": 42}"#;
    assert!(SavedWork::from_json(bad_fold).is_err());
}

#[test]
fn undone_actions_are_not_persisted() {
    let engine = PaperCutEngine::new();
    sector_cut(&engine, 300.0, 40.0);
    sector_cut(&engine, 450.0, 30.0);
    engine.undo();

    let work = engine.to_saved_work(None);
    assert_eq!(work.actions.len(), 1);
}

#[test]
fn invalid_sequence_leaves_prior_state_untouched() {
    let engine = PaperCutEngine::new();
    sector_cut(&engine, 300.0, 40.0);
    let shape_before = engine.shape();
    let actions_before = engine.get_actions();

    // a cut swallowing the whole sheet cannot replay
    let c = Paper::center(engine.fold_mode());
    let blanking = Action::new(
        ToolMode::Scissors,
        vec![
            Point::new(c.x - 900.0, c.y - 900.0),
            Point::new(c.x + 900.0, c.y - 900.0),
            Point::new(c.x + 900.0, c.y + 900.0),
            Point::new(c.x - 900.0, c.y + 900.0),
        ],
    );
    let err = engine.set_actions(vec![blanking]);
    assert!(matches!(err, Err(EngineError::InvalidActionSequence(_))));
    assert_eq!(engine.shape(), shape_before);
    assert_eq!(engine.get_actions(), actions_before);
}

#[test]
fn degenerate_actions_replay_when_restored() {
    // single-point actions are no-ops but still part of the record
    let tap = Action::new(ToolMode::Scissors, vec![Point::new(500.0, 500.0)]);
    let pen_kind = tap.kind;
    assert_eq!(pen_kind, ActionKind::Cut);

    let engine = PaperCutEngine::new();
    engine.set_actions(vec![tap]).expect("degenerate replay");
    assert_eq!(engine.get_actions().len(), 1);
    assert_eq!(engine.shape(), PaperCutEngine::new().shape());
}

#[test]
fn foreign_bezier_cuts_replay_by_kind() {
    // some producers commit closed bezier outlines as cuts; kind wins over tool
    let c = Paper::center(FoldMode::Four);
    let mut cut = Action::new(ToolMode::Bezier, vec![
        Point::new(c.x - 40.0, c.y - 340.0),
        Point::new(c.x + 40.0, c.y - 340.0),
        Point::new(c.x + 40.0, c.y - 260.0),
        Point::new(c.x - 40.0, c.y - 260.0),
    ]);
    cut.kind = ActionKind::Cut;

    let engine = PaperCutEngine::new();
    engine.set_actions(vec![cut]).expect("replay");
    let shape = engine.shape();
    assert!(shape.overlay.is_empty());
    assert!(shape.paper_area() < PaperCutEngine::new().shape().paper_area());
}

use super::*;
use crate::frame::{Data, Frame};
use crate::services::dispatch::Action;
use crate::state::test_helpers::test_app_state;
use crate::stroke::StrokeInput;
use tokio::sync::mpsc;
use uuid::Uuid;

#[test]
fn closed_hub_maps_to_service_unavailable() {
    assert_eq!(hub_error_to_status(&HubError::Closed), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn empty_canvas_reports_zero_counters() {
    let state = test_app_state();
    let Json(stats) = get_canvas(State(state)).await.unwrap();
    assert_eq!(stats, CanvasStats { participants: 0, strokes: 0, redo_depth: 0 });
}

#[tokio::test]
async fn reset_empties_history() {
    let state = test_app_state();
    let session_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(16);
    state.hub.connect(session_id, tx).await.unwrap();
    let input = StrokeInput { x0: 0.1, y0: 0.1, x1: 0.2, y1: 0.2, color: "#123456".into(), width: 3.0 };
    state
        .hub
        .act(session_id, Action::Draw(input), Frame::request("stroke:draw", Data::new()))
        .await
        .unwrap();

    let Json(before) = get_canvas(State(state.clone())).await.unwrap();
    assert_eq!(before.strokes, 1);
    assert_eq!(before.participants, 1);

    assert_eq!(reset_canvas(State(state.clone())).await, StatusCode::NO_CONTENT);
    let Json(after) = get_canvas(State(state)).await.unwrap();
    assert_eq!(after.strokes, 0);
    assert_eq!(after.participants, 1);
}

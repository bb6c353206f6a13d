use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tera::Context;

use crate::casework::{self, ModalTaskOutcome, TaskCreateOutcome, TaskView};
use crate::db::{CaseRecord, TaskRecord, TaskStatus};
use crate::forms::{FieldErrors, Form as _, FormData, TaskForm};
use crate::web::server::AppState;
use crate::web::types::{TaskCreatedEvent, ViewQuery};

use super::{HX_TRIGGER, HandlerResult, casework_error, html, hx_trigger};

const MODAL_MODE_CREATE: &str = "create";

/// Initial values for an empty task form.
fn task_defaults() -> FormData {
    [("status", TaskStatus::default().as_str())]
        .into_iter()
        .collect()
}

fn task_list(state: &AppState, tasks: &[TaskRecord]) -> HandlerResult {
    let mut ctx = Context::new();
    ctx.insert("tasks", tasks);
    html(state, StatusCode::OK, "partials/task_list.html", &ctx)
}

fn task_form(
    state: &AppState,
    case: &CaseRecord,
    data: &FormData,
    errors: &FieldErrors,
) -> HandlerResult {
    let mut ctx = Context::new();
    ctx.insert("case", case);
    ctx.insert("form", &TaskForm::bind(data, errors));
    html(state, StatusCode::OK, "partials/task_form.html", &ctx)
}

fn modal_form(
    state: &AppState,
    status: StatusCode,
    case: &CaseRecord,
    view: TaskView,
    data: &FormData,
    errors: &FieldErrors,
) -> HandlerResult {
    let mut ctx = Context::new();
    ctx.insert("case", case);
    ctx.insert("form", &TaskForm::bind(data, errors));
    ctx.insert("view_mode", view.as_str());
    ctx.insert("mode", MODAL_MODE_CREATE);
    html(state, status, "partials/task_modal_form.html", &ctx)
}

pub(crate) async fn task_list_handler(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<i64>,
    Query(query): Query<ViewQuery>,
) -> HandlerResult {
    let view = TaskView::parse(query.view.as_deref());
    let tasks = casework::list_tasks_for_view(state.db.as_ref(), case_id, view)
        .await
        .map_err(casework_error)?;
    task_list(&state, &tasks)
}

pub(crate) async fn task_form_handler(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<i64>,
) -> HandlerResult {
    let case = casework::require_case(state.db.as_ref(), case_id)
        .await
        .map_err(casework_error)?;
    task_form(&state, &case, &task_defaults(), &FieldErrors::default())
}

/// Plain create answers 201 with a `task-created` event; the page decides
/// how to refresh.
pub(crate) async fn task_create_handler(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<i64>,
    Form(data): Form<FormData>,
) -> HandlerResult {
    match casework::create_task(state.db.as_ref(), case_id, &data)
        .await
        .map_err(casework_error)?
    {
        TaskCreateOutcome::Created(created) => {
            let trigger = hx_trigger(
                "task-created",
                &TaskCreatedEvent {
                    id: created.id,
                    case_id: created.case_id,
                },
            )?;
            Ok((StatusCode::CREATED, [(HX_TRIGGER, trigger)]).into_response())
        }
        TaskCreateOutcome::Invalid { case, errors } => task_form(&state, &case, &data, &errors),
    }
}

pub(crate) async fn task_modal_form_handler(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<i64>,
    Query(query): Query<ViewQuery>,
) -> HandlerResult {
    let case = casework::require_case(state.db.as_ref(), case_id)
        .await
        .map_err(casework_error)?;
    let view = TaskView::parse(query.view.as_deref());
    modal_form(
        &state,
        StatusCode::OK,
        &case,
        view,
        &task_defaults(),
        &FieldErrors::default(),
    )
}

/// Modal create swaps in the refreshed list for the active view, or sends the
/// modal back with a 400.
pub(crate) async fn task_modal_create_handler(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<i64>,
    Query(query): Query<ViewQuery>,
    Form(data): Form<FormData>,
) -> HandlerResult {
    let view = TaskView::parse(query.view.as_deref());
    match casework::create_task_in_modal(state.db.as_ref(), case_id, &data, view)
        .await
        .map_err(casework_error)?
    {
        ModalTaskOutcome::Created { tasks, .. } => task_list(&state, &tasks),
        ModalTaskOutcome::Invalid { case, errors } => modal_form(
            &state,
            StatusCode::BAD_REQUEST,
            &case,
            view,
            &data,
            &errors,
        ),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::testing::{seed_case, test_state};

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }

    fn task(summary: &str, end: &str, status: &str) -> FormData {
        [
            ("task_type", "Filing"),
            ("summary", summary),
            ("start_time", "2025-04-01T09:00"),
            ("end_time", end),
            ("status", status),
        ]
        .into_iter()
        .collect()
    }

    fn view(value: &str) -> Query<ViewQuery> {
        Query(ViewQuery {
            view: Some(value.to_string()),
        })
    }

    #[tokio::test]
    async fn plain_create_returns_201_with_event() {
        let (state, _dir) = test_state().await;
        let case = seed_case(state.db.as_ref(), "alpha").await;

        let response = task_create_handler(
            State(Arc::clone(&state)),
            Path(case.id),
            Form(task("Draft motion", "2025-04-02T17:00", "not_started")),
        )
        .await
        .expect("create");
        assert_eq!(response.status(), StatusCode::CREATED);
        let trigger = response
            .headers()
            .get(HX_TRIGGER)
            .expect("hx-trigger")
            .to_str()
            .expect("ascii")
            .to_string();
        let event: serde_json::Value = serde_json::from_str(&trigger).expect("json");
        assert_eq!(event["task-created"]["case_id"], case.id);
        let id = event["task-created"]["id"].as_i64().expect("id");
        assert!(state.db.get_task(id).await.expect("get").is_some());
    }

    #[tokio::test]
    async fn plain_create_rerenders_invalid_form() {
        let (state, _dir) = test_state().await;
        let case = seed_case(state.db.as_ref(), "alpha").await;

        let response = task_create_handler(
            State(state),
            Path(case.id),
            Form(task("", "2025-04-02T17:00", "")),
        )
        .await
        .expect("invalid");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(HX_TRIGGER).is_none());
        assert!(body_text(response).await.contains("This field is required."));
    }

    #[tokio::test]
    async fn modal_create_swaps_in_active_view() {
        let (state, _dir) = test_state().await;
        let case = seed_case(state.db.as_ref(), "alpha").await;
        task_create_handler(
            State(Arc::clone(&state)),
            Path(case.id),
            Form(task("still open", "2025-04-03T17:00", "in_progress")),
        )
        .await
        .expect("seed");

        let response = task_modal_create_handler(
            State(Arc::clone(&state)),
            Path(case.id),
            view("complete"),
            Form(task("wrapped up", "2025-04-04T17:00", "complete")),
        )
        .await
        .expect("modal");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("wrapped up"));
        assert!(!body.contains("still open"));
    }

    #[tokio::test]
    async fn modal_create_invalid_is_400_with_modal() {
        let (state, _dir) = test_state().await;
        let case = seed_case(state.db.as_ref(), "alpha").await;

        let response = task_modal_create_handler(
            State(state),
            Path(case.id),
            view("complete"),
            Form(task("x", "not a time", "complete")),
        )
        .await
        .expect("modal");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains("data-mode=\"create\""));
        // "/" is entity-escaped by the template engine.
        assert!(body.contains("Enter a valid date&#x2F;time."));
        assert!(body.contains("view=complete"));
    }

    #[tokio::test]
    async fn task_routes_404_for_missing_case() {
        let (state, _dir) = test_state().await;
        let err = task_list_handler(State(Arc::clone(&state)), Path(9), view("todo"))
            .await
            .expect_err("missing");
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        let err = task_form_handler(State(Arc::clone(&state)), Path(9))
            .await
            .expect_err("missing");
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        let err = task_modal_form_handler(State(state), Path(9), view("todo"))
            .await
            .expect_err("missing");
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}

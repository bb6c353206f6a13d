use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use tera::Context;

use crate::casework::{self, IntakeOutcome, NoteOutcome};
use crate::forms::{
    CaseIntakeForm, DEFENSE_LAWYER_FIELD, FieldErrors, Form as _, FormData, PLAINTIFF_LAWYER_FIELD,
};
use crate::web::server::AppState;
use crate::web::types::{NoteForm, TaskFilterQuery};

use super::{HandlerResult, casework_error, context_from, html};

pub(crate) async fn home_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    let overview = casework::load_overview(state.db.as_ref())
        .await
        .map_err(casework_error)?;
    html(&state, StatusCode::OK, "home.html", &context_from(&overview)?)
}

pub(crate) async fn case_list_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    let cases = casework::list_all_cases(state.db.as_ref())
        .await
        .map_err(casework_error)?;
    let mut ctx = Context::new();
    ctx.insert("cases", &cases);
    html(&state, StatusCode::OK, "case_list.html", &ctx)
}

pub(crate) async fn case_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<i64>,
    Query(query): Query<TaskFilterQuery>,
) -> HandlerResult {
    let detail =
        casework::load_case_detail(state.db.as_ref(), case_id, query.task_filter.as_deref())
            .await
            .map_err(casework_error)?;
    html(&state, StatusCode::OK, "case.html", &context_from(&detail)?)
}

fn intake_context(data: &FormData, errors: &FieldErrors) -> Context {
    let mut ctx = Context::new();
    ctx.insert("form", &CaseIntakeForm::bind(data, errors));
    ctx.insert(
        "plaintiff_lawyer",
        data.get(PLAINTIFF_LAWYER_FIELD).unwrap_or_default(),
    );
    ctx.insert(
        "defense_lawyer",
        data.get(DEFENSE_LAWYER_FIELD).unwrap_or_default(),
    );
    ctx.insert("plaintiff_lawyer_errors", errors.get(PLAINTIFF_LAWYER_FIELD));
    ctx.insert("defense_lawyer_errors", errors.get(DEFENSE_LAWYER_FIELD));
    ctx
}

pub(crate) async fn intake_form_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    let ctx = intake_context(&CaseIntakeForm::initial(), &FieldErrors::default());
    html(&state, StatusCode::OK, "intake_form.html", &ctx)
}

/// Create the case and go to the case list, or show the form again with
/// every problem marked.
pub(crate) async fn intake_submit_handler(
    State(state): State<Arc<AppState>>,
    Form(data): Form<FormData>,
) -> HandlerResult {
    match casework::submit_intake(state.db.as_ref(), &data)
        .await
        .map_err(casework_error)?
    {
        IntakeOutcome::Created(_) => Ok(Redirect::to("/cases/").into_response()),
        IntakeOutcome::Invalid(errors) => html(
            &state,
            StatusCode::OK,
            "intake_form.html",
            &intake_context(&data, &errors),
        ),
    }
}

pub(crate) async fn note_create_handler(
    State(state): State<Arc<AppState>>,
    Path(case_id): Path<i64>,
    Form(form): Form<NoteForm>,
) -> HandlerResult {
    match casework::add_case_note(state.db.as_ref(), case_id, form.note_text.as_deref())
        .await
        .map_err(casework_error)?
    {
        NoteOutcome::Created(note) => {
            let mut ctx = Context::new();
            ctx.insert("note", &note);
            html(&state, StatusCode::OK, "partials/note_single.html", &ctx)
        }
        NoteOutcome::NoContent => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tera::Context;

use crate::casework::{self, LawyerCreateOutcome, LawyerSide};
use crate::forms::{FieldErrors, Form as _, FormData, LawyerInlineForm};
use crate::web::server::AppState;
use crate::web::types::{LawyerCreatedEvent, LawyerSearchQuery, SideQuery};

use super::{HX_TRIGGER, HandlerError, HandlerResult, casework_error, html, hx_trigger};

fn parse_side(query: &SideQuery) -> Result<LawyerSide, HandlerError> {
    LawyerSide::parse(query.side.as_deref()).map_err(|message| {
        tracing::debug!(side = ?query.side, "Unknown lawyer side");
        (StatusCode::BAD_REQUEST, message)
    })
}

fn lawyer_form_context(side: LawyerSide, data: &FormData, errors: &FieldErrors) -> Context {
    let mut ctx = Context::new();
    ctx.insert("form", &LawyerInlineForm::bind(data, errors));
    ctx.insert("side", side.as_str());
    ctx
}

pub(crate) async fn lawyer_form_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SideQuery>,
) -> HandlerResult {
    let side = parse_side(&query)?;
    let ctx = lawyer_form_context(side, &FormData::default(), &FieldErrors::default());
    html(&state, StatusCode::OK, "partials/lawyer_form.html", &ctx)
}

/// Create the lawyer, then hand the page a confirmation fragment and a
/// `lawyer-created` event naming the picker to update.
pub(crate) async fn lawyer_create_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SideQuery>,
    Form(data): Form<FormData>,
) -> HandlerResult {
    let side = parse_side(&query)?;
    let created = match casework::create_inline_lawyer(state.db.as_ref(), &data, side)
        .await
        .map_err(casework_error)?
    {
        LawyerCreateOutcome::Created(created) => created,
        LawyerCreateOutcome::Invalid(errors) => {
            let ctx = lawyer_form_context(side, &data, &errors);
            return html(&state, StatusCode::OK, "partials/lawyer_form.html", &ctx);
        }
    };

    let trigger = hx_trigger(
        "lawyer-created",
        &LawyerCreatedEvent {
            id: created.id,
            name: created.name.clone(),
            side: created.side.as_str(),
            select_name: created.side.select_name(),
        },
    )?;
    let mut ctx = Context::new();
    ctx.insert("lawyer", &created);
    ctx.insert("select_name", created.side.select_name());
    let mut response = html(&state, StatusCode::OK, "partials/lawyer_created.html", &ctx)?;
    response.headers_mut().insert(HX_TRIGGER, trigger);
    Ok(response.into_response())
}

pub(crate) async fn lawyer_autocomplete_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LawyerSearchQuery>,
) -> HandlerResult {
    let search = casework::search_lawyers(
        state.db.as_ref(),
        query.plaintiff_lawyer_search.as_deref(),
        query.defense_lawyer_search.as_deref(),
    )
    .await
    .map_err(casework_error)?;
    let mut ctx = Context::new();
    ctx.insert("lawyers", &search.lawyers);
    ctx.insert("input_id", search.input_id);
    html(
        &state,
        StatusCode::OK,
        "partials/lawyer_autocomplete_results.html",
        &ctx,
    )
}

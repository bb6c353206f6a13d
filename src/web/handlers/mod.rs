//! Request handlers.
//!
//! Each handler extracts the request data, calls one case-work operation and
//! picks the template and status code for its outcome. Errors are returned as
//! `(StatusCode, String)` pairs.

mod cases;
mod lawyers;
mod tasks;

pub(crate) use cases::{
    case_detail_handler, case_list_handler, home_handler, intake_form_handler,
    intake_submit_handler, note_create_handler,
};
pub(crate) use lawyers::{lawyer_autocomplete_handler, lawyer_create_handler, lawyer_form_handler};
pub(crate) use tasks::{
    task_create_handler, task_form_handler, task_list_handler, task_modal_create_handler,
    task_modal_form_handler,
};

use std::fmt::Write as _;

use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tera::Context;

use crate::error::{CaseworkError, RenderError};
use crate::web::server::AppState;

pub(crate) type HandlerError = (StatusCode, String);
pub(crate) type HandlerResult = Result<Response, HandlerError>;

/// Client-side event header understood by htmx.
pub(crate) const HX_TRIGGER: HeaderName = HeaderName::from_static("hx-trigger");

const INTERNAL_ERROR: &str = "Internal server error";

pub(crate) fn casework_error(err: CaseworkError) -> HandlerError {
    match err {
        CaseworkError::NotFound { .. } => {
            tracing::debug!(error = %err, "Lookup failed");
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CaseworkError::Invalid { .. } => {
            tracing::debug!(error = %err, "Rejected input");
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CaseworkError::Database(err) => {
            tracing::error!(error = %err, "Database error");
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string())
        }
    }
}

fn render_error(err: RenderError) -> HandlerError {
    tracing::error!(error = %err, "Template error");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string())
}

/// Build a template context from any serializable value.
pub(crate) fn context_from<T: Serialize>(value: &T) -> Result<Context, HandlerError> {
    Context::from_serialize(value).map_err(|source| {
        render_error(RenderError {
            template: "<context>".to_string(),
            source,
        })
    })
}

/// Render `template` as an HTML response with the given status.
pub(crate) fn html(
    state: &AppState,
    status: StatusCode,
    template: &str,
    context: &Context,
) -> HandlerResult {
    let body = state
        .templates
        .render(template, context)
        .map_err(render_error)?;
    Ok((
        status,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response())
}

/// `HX-Trigger` value carrying `{"<event>": <detail>}`.
pub(crate) fn hx_trigger<T: Serialize>(event: &str, detail: &T) -> Result<HeaderValue, HandlerError> {
    let detail = serde_json::to_value(detail).map_err(|e| {
        tracing::error!(error = %e, event, "Failed to encode client event");
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string())
    })?;
    let mut payload = serde_json::Map::new();
    payload.insert(event.to_string(), detail);
    let text = serde_json::Value::Object(payload).to_string();

    HeaderValue::from_str(&ascii_json(&text)).map_err(|e| {
        tracing::error!(error = %e, event, "Client event is not a valid header value");
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR.to_string())
    })
}

/// Escape everything outside printable ASCII as `\uXXXX`. Only valid for
/// serialized JSON, where such characters can only occur inside strings.
fn ascii_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() && ch != '\u{7f}' {
            out.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                let _ = write!(out, "\\u{unit:04x}");
            }
        }
    }
    out
}

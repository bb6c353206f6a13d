//! Page and fragment rendering.
//!
//! Templates are compiled into the binary and parsed once at startup.

use std::collections::HashMap;

use tera::{Context, Tera, Value};

use crate::error::RenderError;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("templates/base.html")),
    ("home.html", include_str!("templates/home.html")),
    ("case_list.html", include_str!("templates/case_list.html")),
    ("case.html", include_str!("templates/case.html")),
    ("intake_form.html", include_str!("templates/intake_form.html")),
    (
        "partials/form_fields.html",
        include_str!("templates/partials/form_fields.html"),
    ),
    (
        "partials/lawyer_form.html",
        include_str!("templates/partials/lawyer_form.html"),
    ),
    (
        "partials/lawyer_created.html",
        include_str!("templates/partials/lawyer_created.html"),
    ),
    (
        "partials/lawyer_autocomplete_results.html",
        include_str!("templates/partials/lawyer_autocomplete_results.html"),
    ),
    (
        "partials/note_single.html",
        include_str!("templates/partials/note_single.html"),
    ),
    (
        "partials/task_list.html",
        include_str!("templates/partials/task_list.html"),
    ),
    (
        "partials/task_form.html",
        include_str!("templates/partials/task_form.html"),
    ),
    (
        "partials/task_modal_form.html",
        include_str!("templates/partials/task_modal_form.html"),
    ),
];

/// The compiled template set.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())
            .map_err(|source| RenderError {
                template: "<embedded>".to_string(),
                source,
            })?;
        tera.register_filter("choice_label", choice_label_filter);
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, RenderError> {
        self.tera.render(name, context).map_err(|source| RenderError {
            template: name.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("count", &TEMPLATES.len())
            .finish()
    }
}

/// `{{ case.stage | choice_label(kind="stage") }}`. Values with no label
/// pass through unchanged.
fn choice_label_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let kind = args
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg("choice_label requires a `kind` argument"))?;
    let label = value
        .as_str()
        .and_then(|stored| crate::db::choice_label(kind, stored));
    Ok(match label {
        Some(label) => Value::String(label.to_string()),
        None => value.clone(),
    })
}

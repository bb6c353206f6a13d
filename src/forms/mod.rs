//! Form binding and validation.
//!
//! A form is a declared list of [`FieldSpec`]s plus a `clean` step that turns
//! submitted [`FormData`] into a typed value or a set of [`FieldErrors`].
//! Each field is checked independently so every problem is reported at once.
//! Checks that need the database (uniqueness, id lookups) live with the
//! operation that owns the write, not here.

mod case_intake;
mod lawyer;
mod task;

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub use case_intake::{
    CaseIntakeForm, CaseIntakeInput, DEFENSE_LAWYER_FIELD, LawyerRefs, PLAINTIFF_LAWYER_FIELD,
};
pub use lawyer::{LawyerInlineForm, LawyerInput};
pub use task::{TaskForm, TaskInput};

pub const REQUIRED_MESSAGE: &str = "This field is required.";

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
const DATETIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Submitted form fields, as decoded from an urlencoded body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FormData(HashMap<String, String>);

impl FormData {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// What a field's value must parse as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    DateTime,
    Choice,
}

/// Presentation hint for templates. Never affects validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Text,
    Textarea,
    Date,
    DateTimeLocal,
    Select,
}

impl Widget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Date => "date",
            Self::DateTimeLocal => "datetime-local",
            Self::Select => "select",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Maximum length in characters, after trimming.
    pub max_len: Option<usize>,
    pub choices: &'static [(&'static str, &'static str)],
    pub widget: Widget,
}

impl FieldSpec {
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            required: true,
            max_len: None,
            choices: &[],
            widget: Widget::Text,
        }
    }

    pub const fn date(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::Date,
            widget: Widget::Date,
            ..Self::text(name, label)
        }
    }

    pub const fn datetime(name: &'static str, label: &'static str) -> Self {
        Self {
            kind: FieldKind::DateTime,
            widget: Widget::DateTimeLocal,
            ..Self::text(name, label)
        }
    }

    pub const fn choice(
        name: &'static str,
        label: &'static str,
        choices: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            kind: FieldKind::Choice,
            choices,
            widget: Widget::Select,
            ..Self::text(name, label)
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    pub const fn max_len(self, max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..self
        }
    }

    pub const fn textarea(self) -> Self {
        Self {
            widget: Widget::Textarea,
            ..self
        }
    }
}

/// Validation messages keyed by field name, plus form-wide messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
        self.non_field.extend(other.non_field);
    }
}

/// A declared form: its fields and how to turn submitted data into `Output`.
pub trait Form {
    type Output;

    const FIELDS: &'static [FieldSpec];

    fn clean(data: &FormData) -> Result<Self::Output, FieldErrors>;

    /// The form ready for display: submitted values plus any errors.
    fn bind(data: &FormData, errors: &FieldErrors) -> BoundForm {
        BoundForm::new(Self::FIELDS, data, errors)
    }

    /// The empty form, with `initial` values pre-filled.
    fn unbound(initial: &FormData) -> BoundForm {
        BoundForm::new(Self::FIELDS, initial, &FieldErrors::default())
    }
}

/// Template-facing view of a form.
#[derive(Debug, Clone, Serialize)]
pub struct BoundForm {
    pub fields: Vec<BoundField>,
    pub non_field_errors: Vec<String>,
    pub has_errors: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundField {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: &'static str,
    pub required: bool,
    pub max_len: Option<usize>,
    pub value: String,
    pub choices: Vec<BoundChoice>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundChoice {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl BoundForm {
    fn new(specs: &[FieldSpec], data: &FormData, errors: &FieldErrors) -> Self {
        let fields = specs
            .iter()
            .map(|spec| {
                let value = data.get(spec.name).unwrap_or_default().to_string();
                let choices = spec
                    .choices
                    .iter()
                    .map(|(stored, label)| BoundChoice {
                        value: *stored,
                        label: *label,
                        selected: value.trim() == *stored,
                    })
                    .collect();
                BoundField {
                    name: spec.name,
                    label: spec.label,
                    widget: spec.widget.as_str(),
                    required: spec.required,
                    max_len: spec.max_len,
                    value,
                    choices,
                    errors: errors.get(spec.name).to_vec(),
                }
            })
            .collect();
        Self {
            fields,
            non_field_errors: errors.non_field().to_vec(),
            has_errors: !errors.is_empty(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&BoundField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Accumulates per-field validation results over one submission.
pub(crate) struct Cleaner<'a> {
    data: &'a FormData,
    errors: FieldErrors,
}

impl<'a> Cleaner<'a> {
    pub(crate) fn new(data: &'a FormData) -> Self {
        Self {
            data,
            errors: FieldErrors::default(),
        }
    }

    /// Trimmed value of `spec` after the checks its kind requires. `None`
    /// when blank (reporting an error if required) or invalid.
    fn check(&mut self, spec: &FieldSpec) -> Option<String> {
        let data = self.data;
        let value = data.get(spec.name).unwrap_or_default().trim();
        if value.is_empty() {
            if spec.required {
                self.errors.add(spec.name, REQUIRED_MESSAGE);
            }
            return None;
        }

        if let Some(max_len) = spec.max_len {
            let len = value.chars().count();
            if len > max_len {
                self.errors.add(
                    spec.name,
                    format!("Ensure this value has at most {max_len} characters (it has {len})."),
                );
                return None;
            }
        }

        let valid = match spec.kind {
            FieldKind::Text => true,
            FieldKind::Date => parse_date_input(value).is_some(),
            FieldKind::DateTime => parse_datetime_input(value).is_some(),
            FieldKind::Choice => spec.choices.iter().any(|(stored, _)| *stored == value),
        };
        if !valid {
            let message = match spec.kind {
                FieldKind::Date => "Enter a valid date.".to_string(),
                FieldKind::DateTime => "Enter a valid date/time.".to_string(),
                _ => format!(
                    "Select a valid choice. {value} is not one of the available choices."
                ),
            };
            self.errors.add(spec.name, message);
            return None;
        }

        Some(value.to_string())
    }

    pub(crate) fn text(&mut self, spec: &FieldSpec) -> Option<String> {
        self.check(spec)
    }

    pub(crate) fn date(&mut self, spec: &FieldSpec) -> Option<NaiveDate> {
        self.check(spec).and_then(|value| parse_date_input(&value))
    }

    pub(crate) fn datetime(&mut self, spec: &FieldSpec) -> Option<NaiveDateTime> {
        self.check(spec)
            .and_then(|value| parse_datetime_input(&value))
    }

    pub(crate) fn choice<T>(
        &mut self,
        spec: &FieldSpec,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Option<T> {
        self.check(spec).and_then(|value| parse(&value))
    }

    pub(crate) fn finish(self) -> FieldErrors {
        self.errors
    }
}

pub fn parse_date_input(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_INPUT_FORMAT).ok()
}

pub fn parse_datetime_input(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Blank-as-absent for optional free-text inputs.
pub fn optional_trimmed(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

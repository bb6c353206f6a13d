use crate::db::{CaseRecord, Database};
use crate::error::{CaseworkError, DatabaseError};
use crate::forms::{
    CaseIntakeForm, DEFENSE_LAWYER_FIELD, FieldErrors, Form, FormData, PLAINTIFF_LAWYER_FIELD,
};

const SHORT_NAME_TAKEN: &str = "Case with this Short name already exists.";
const CASE_NUMBER_TAKEN: &str = "Case with this Case number already exists.";
const UNKNOWN_LAWYER: &str = "Select a valid choice. That choice is not one of the available choices.";

#[derive(Debug)]
pub enum IntakeOutcome {
    Created(CaseRecord),
    /// Nothing was written.
    Invalid(FieldErrors),
}

/// Validate an intake submission and create the case.
pub async fn submit_intake(
    db: &dyn Database,
    data: &FormData,
) -> Result<IntakeOutcome, CaseworkError> {
    let cleaned = CaseIntakeForm::clean(data);
    let mut errors = match &cleaned {
        Ok(_) => FieldErrors::default(),
        Err(errors) => errors.clone(),
    };

    check_unique(db, data, &mut errors).await?;

    let refs = CaseIntakeForm::lawyer_refs(data);
    let plaintiff_lawyer_id =
        resolve_lawyer(db, PLAINTIFF_LAWYER_FIELD, refs.plaintiff.as_deref(), &mut errors).await?;
    let defense_lawyer_id =
        resolve_lawyer(db, DEFENSE_LAWYER_FIELD, refs.defense.as_deref(), &mut errors).await?;

    let input = match cleaned {
        Ok(input) if errors.is_empty() => input,
        _ => {
            tracing::debug!(fields = ?errors, "Case intake rejected");
            return Ok(IntakeOutcome::Invalid(errors));
        }
    };

    match db
        .create_case(&input.into_params(plaintiff_lawyer_id, defense_lawyer_id))
        .await
    {
        Ok(case) => {
            tracing::info!(case_id = case.id, short_name = %case.short_name, "Case created");
            Ok(IntakeOutcome::Created(case))
        }
        // Another submission took the value between the check and the insert.
        Err(err) if err.is_unique_violation() => {
            report_unique_violation(&err, &mut errors);
            tracing::debug!(error = %err, "Case intake lost a uniqueness race");
            Ok(IntakeOutcome::Invalid(errors))
        }
        Err(err) => Err(err.into()),
    }
}

/// Uniqueness of the identifying fields, checked for values that passed
/// field validation.
async fn check_unique(
    db: &dyn Database,
    data: &FormData,
    errors: &mut FieldErrors,
) -> Result<(), DatabaseError> {
    if let Some(short_name) = checkable(data, "short_name", errors)
        && db.case_short_name_exists(short_name).await?
    {
        errors.add("short_name", SHORT_NAME_TAKEN);
    }
    if let Some(case_number) = checkable(data, "case_number", errors)
        && db.case_number_exists(case_number).await?
    {
        errors.add("case_number", CASE_NUMBER_TAKEN);
    }
    Ok(())
}

fn checkable<'a>(data: &'a FormData, field: &str, errors: &FieldErrors) -> Option<&'a str> {
    if errors.has(field) {
        return None;
    }
    data.get(field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Blank is no lawyer; anything else must be the id of an existing lawyer.
async fn resolve_lawyer(
    db: &dyn Database,
    field: &str,
    raw: Option<&str>,
    errors: &mut FieldErrors,
) -> Result<Option<i64>, DatabaseError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let Ok(id) = raw.parse::<i64>() else {
        errors.add(field, UNKNOWN_LAWYER);
        return Ok(None);
    };
    match db.get_lawyer(id).await? {
        Some(lawyer) => Ok(Some(lawyer.id)),
        None => {
            errors.add(field, UNKNOWN_LAWYER);
            Ok(None)
        }
    }
}

fn report_unique_violation(err: &DatabaseError, errors: &mut FieldErrors) {
    match err.unique_violation_column().as_deref() {
        Some("cases.short_name") => errors.add("short_name", SHORT_NAME_TAKEN),
        Some("cases.case_number") => errors.add("case_number", CASE_NUMBER_TAKEN),
        _ => errors.add_non_field("A case with these details already exists."),
    }
}

use chrono::NaiveDate;

use crate::db::{CaseStage, CaseType, CreateCaseParams, DEFAULT_CASE_STATUS, HiredBy};

use super::{Cleaner, FieldErrors, FieldSpec, Form, FormData, optional_trimmed};

const SUMMARY: FieldSpec = FieldSpec::text("summary", "Summary").optional().textarea();
const SHORT_NAME: FieldSpec = FieldSpec::text("short_name", "Short name").max_len(100);
const CASE_NUMBER: FieldSpec = FieldSpec::text("case_number", "Case number").max_len(100);
const CASE_TYPE: FieldSpec = FieldSpec::choice("case_type", "Case type", CaseType::CHOICES);
const DATE_OF_CASE: FieldSpec = FieldSpec::date("date_of_case", "Date of case");
const PLAINTIFF: FieldSpec = FieldSpec::text("plaintiff", "Plaintiff").max_len(255);
const DEFENDANT: FieldSpec = FieldSpec::text("defendant", "Defendant").max_len(255);
const HIRED_BY: FieldSpec = FieldSpec::choice("hired_by", "Hired by", HiredBy::CHOICES);
const STAGE: FieldSpec = FieldSpec::choice("stage", "Stage", CaseStage::CHOICES);

/// Lawyer ids submitted outside the declared field list.
pub const PLAINTIFF_LAWYER_FIELD: &str = "plaintiff_lawyer";
pub const DEFENSE_LAWYER_FIELD: &str = "defense_lawyer";

/// New-case intake.
pub struct CaseIntakeForm;

/// A cleaned intake submission, minus the lawyer references.
#[derive(Debug, Clone)]
pub struct CaseIntakeInput {
    pub summary: Option<String>,
    pub short_name: String,
    pub case_number: String,
    pub case_type: CaseType,
    pub date_of_case: NaiveDate,
    pub plaintiff: String,
    pub defendant: String,
    pub hired_by: HiredBy,
    pub stage: CaseStage,
}

/// Raw side-channel lawyer references, blank as absent. They need the store
/// to validate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LawyerRefs {
    pub plaintiff: Option<String>,
    pub defense: Option<String>,
}

impl CaseIntakeForm {
    /// Pre-selected values for an empty intake form.
    pub fn initial() -> FormData {
        [
            (HIRED_BY.name, HiredBy::default().as_str()),
            (STAGE.name, CaseStage::default().as_str()),
        ]
        .into_iter()
        .collect()
    }

    pub fn lawyer_refs(data: &FormData) -> LawyerRefs {
        LawyerRefs {
            plaintiff: optional_trimmed(data.get(PLAINTIFF_LAWYER_FIELD)),
            defense: optional_trimmed(data.get(DEFENSE_LAWYER_FIELD)),
        }
    }
}

impl CaseIntakeInput {
    pub fn into_params(
        self,
        plaintiff_lawyer_id: Option<i64>,
        defense_lawyer_id: Option<i64>,
    ) -> CreateCaseParams {
        CreateCaseParams {
            summary: self.summary,
            short_name: self.short_name,
            case_number: self.case_number,
            case_type: self.case_type,
            hired_by: self.hired_by,
            date_of_case: self.date_of_case,
            plaintiff: self.plaintiff,
            defendant: self.defendant,
            plaintiff_lawyer_id,
            defense_lawyer_id,
            status: DEFAULT_CASE_STATUS.to_string(),
            stage: self.stage,
            last_worked_on: None,
        }
    }
}

impl Form for CaseIntakeForm {
    type Output = CaseIntakeInput;

    const FIELDS: &'static [FieldSpec] = &[
        SUMMARY,
        SHORT_NAME,
        CASE_NUMBER,
        CASE_TYPE,
        DATE_OF_CASE,
        PLAINTIFF,
        DEFENDANT,
        HIRED_BY,
        STAGE,
    ];

    fn clean(data: &FormData) -> Result<CaseIntakeInput, FieldErrors> {
        let mut cleaner = Cleaner::new(data);
        let summary = cleaner.text(&SUMMARY);
        let short_name = cleaner.text(&SHORT_NAME);
        let case_number = cleaner.text(&CASE_NUMBER);
        let case_type = cleaner.choice(&CASE_TYPE, CaseType::from_db_value);
        let date_of_case = cleaner.date(&DATE_OF_CASE);
        let plaintiff = cleaner.text(&PLAINTIFF);
        let defendant = cleaner.text(&DEFENDANT);
        let hired_by = cleaner.choice(&HIRED_BY, HiredBy::from_db_value);
        let stage = cleaner.choice(&STAGE, CaseStage::from_db_value);
        let errors = cleaner.finish();

        match (
            short_name,
            case_number,
            case_type,
            date_of_case,
            plaintiff,
            defendant,
            hired_by,
            stage,
        ) {
            (
                Some(short_name),
                Some(case_number),
                Some(case_type),
                Some(date_of_case),
                Some(plaintiff),
                Some(defendant),
                Some(hired_by),
                Some(stage),
            ) if errors.is_empty() => Ok(CaseIntakeInput {
                summary,
                short_name,
                case_number,
                case_type,
                date_of_case,
                plaintiff,
                defendant,
                hired_by,
                stage,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::REQUIRED_MESSAGE;

    fn valid() -> Vec<(&'static str, &'static str)> {
        vec![
            ("short_name", " Acme v. Initech "),
            ("case_number", "2025-CV-001"),
            ("case_type", "chapter11"),
            ("date_of_case", "2025-01-15"),
            ("plaintiff", "Acme Corp"),
            ("defendant", "Initech"),
            ("hired_by", "defendant"),
            ("stage", "discovery"),
        ]
    }

    #[test]
    fn valid_submission_trims_and_parses_choices() {
        let data: FormData = valid().into_iter().collect();
        let input = CaseIntakeForm::clean(&data).expect("valid");
        assert_eq!(input.short_name, "Acme v. Initech");
        assert_eq!(input.case_type, CaseType::Chapter11);
        assert_eq!(input.hired_by, HiredBy::Defendant);
        assert_eq!(input.stage, CaseStage::Discovery);
        assert_eq!(input.summary, None);
        assert_eq!(CaseIntakeForm::lawyer_refs(&data), LawyerRefs::default());

        let params = input.into_params(Some(3), None);
        assert_eq!(params.status, "Open");
        assert_eq!(params.plaintiff_lawyer_id, Some(3));
    }

    #[test]
    fn every_missing_required_field_is_reported() {
        let data: FormData = [("summary", "notes only")].into_iter().collect();
        let errors = CaseIntakeForm::clean(&data).expect_err("invalid");
        for field in [
            "short_name",
            "case_number",
            "case_type",
            "date_of_case",
            "plaintiff",
            "defendant",
            "hired_by",
            "stage",
        ] {
            assert_eq!(errors.get(field), [REQUIRED_MESSAGE], "{field}");
        }
        assert!(!errors.has("summary"));
    }

    #[test]
    fn blank_hired_by_and_stage_are_required_not_defaulted() {
        let mut pairs = valid();
        pairs.retain(|(k, _)| *k != "hired_by" && *k != "stage");
        pairs.push(("hired_by", "  "));
        pairs.push(("stage", ""));
        let data: FormData = pairs.into_iter().collect();

        let errors = CaseIntakeForm::clean(&data).expect_err("invalid");
        assert_eq!(errors.get("hired_by"), [REQUIRED_MESSAGE]);
        assert_eq!(errors.get("stage"), [REQUIRED_MESSAGE]);
    }

    #[test]
    fn bad_choice_and_date_are_field_errors() {
        let mut pairs = valid();
        pairs.retain(|(k, _)| *k != "date_of_case" && *k != "hired_by");
        pairs.push(("hired_by", "nobody"));
        pairs.push(("date_of_case", "15/01/2025"));
        let data: FormData = pairs.into_iter().collect();

        let errors = CaseIntakeForm::clean(&data).expect_err("invalid");
        assert!(errors.has("hired_by"));
        assert_eq!(errors.get("date_of_case"), ["Enter a valid date.".to_string()]);
    }

    #[test]
    fn side_channel_lawyer_refs_are_read_outside_the_field_list() {
        let data: FormData = [("plaintiff_lawyer", " 12 "), ("defense_lawyer", "   ")]
            .into_iter()
            .collect();

        let refs = CaseIntakeForm::lawyer_refs(&data);
        assert_eq!(refs.plaintiff.as_deref(), Some("12"));
        assert_eq!(refs.defense, None);
        assert!(CaseIntakeForm::FIELDS.iter().all(|f| f.name != "plaintiff_lawyer"));
    }

    #[test]
    fn bound_form_lists_fields_in_declared_order() {
        let bound = CaseIntakeForm::unbound(&FormData::default());
        let names: Vec<&str> = bound.fields.iter().map(|f| f.name).collect();
        assert_eq!(names[0], "summary");
        assert_eq!(names[8], "stage");
        assert_eq!(bound.field("date_of_case").map(|f| f.widget), Some("date"));
        assert!(!bound.has_errors);
    }

    #[test]
    fn initial_form_preselects_default_choices() {
        let bound = CaseIntakeForm::unbound(&CaseIntakeForm::initial());
        assert_eq!(bound.field("hired_by").map(|f| f.value.as_str()), Some("other"));
        assert_eq!(bound.field("stage").map(|f| f.value.as_str()), Some("initial"));
    }
}

use crate::db::CreateLawyerParams;

use super::{Cleaner, FieldErrors, FieldSpec, Form, FormData};

const NAME: FieldSpec = FieldSpec::text("name", "Name").max_len(255);
const TITLE: FieldSpec = FieldSpec::text("title", "Title").optional().max_len(255);
const LAW_FIRM_NAME: FieldSpec = FieldSpec::text("law_firm_name", "Law firm")
    .optional()
    .max_len(255);

/// Quick-add lawyer form shown beside the intake lawyer pickers.
pub struct LawyerInlineForm;

#[derive(Debug, Clone)]
pub struct LawyerInput {
    pub name: String,
    pub title: Option<String>,
    /// Firm to look up by exact name (or create) and attach.
    pub law_firm_name: Option<String>,
}

impl LawyerInput {
    pub fn to_params(&self) -> CreateLawyerParams {
        CreateLawyerParams {
            name: self.name.clone(),
            title: self.title.clone(),
            ..CreateLawyerParams::default()
        }
    }
}

impl Form for LawyerInlineForm {
    type Output = LawyerInput;

    const FIELDS: &'static [FieldSpec] = &[NAME, TITLE, LAW_FIRM_NAME];

    fn clean(data: &FormData) -> Result<LawyerInput, FieldErrors> {
        let mut cleaner = Cleaner::new(data);
        let name = cleaner.text(&NAME);
        let title = cleaner.text(&TITLE);
        let law_firm_name = cleaner.text(&LAW_FIRM_NAME);
        let errors = cleaner.finish();

        match name {
            Some(name) if errors.is_empty() => Ok(LawyerInput {
                name,
                title,
                law_firm_name,
            }),
            _ => Err(errors),
        }
    }
}

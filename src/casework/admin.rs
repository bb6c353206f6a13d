//! Office back-room maintenance: the records the pages never edit directly.
//!
//! Firms, companies, case events, document references and notes on any
//! entity can be added here, and any top-level row deleted. Deletes follow
//! the schema's cascade and null-out rules.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::{
    CaseEventRecord, CompanyRecord, CreateCaseEventParams, CreateDocumentReferenceParams,
    Database, DocumentReferenceRecord, DocumentType, LawFirmRecord, LawyerRecord, NoteKind,
    NoteRecord,
};
use crate::error::CaseworkError;
use crate::forms::REQUIRED_MESSAGE;

use super::require_case;

const NAME_MAX_LEN: usize = 255;

/// A top-level row that can be deleted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    LawFirm,
    Lawyer,
    Company,
    Case,
    Task,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LawFirm => "law_firm",
            Self::Lawyer => "lawyer",
            Self::Company => "company",
            Self::Case => "case",
            Self::Task => "task",
        }
    }
}

/// What a document listing is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOwner {
    Case(i64),
    Task(i64),
}

#[derive(Debug, Clone, Serialize)]
pub struct FirmAdded {
    pub firm: LawFirmRecord,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FirmListing {
    pub firm: LawFirmRecord,
    pub lawyers: Vec<LawyerRecord>,
}

/// A document reference to add, before validation.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub document_type: DocumentType,
    pub title: String,
    pub source: Option<String>,
    pub date: Option<NaiveDate>,
    pub case_id: Option<i64>,
    pub task_id: Option<i64>,
    pub description: Option<String>,
}

fn invalid(field: &'static str, message: impl Into<String>) -> CaseworkError {
    CaseworkError::Invalid {
        field,
        message: message.into(),
    }
}

fn required_text(field: &'static str, value: &str, max_len: usize) -> Result<String, CaseworkError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(field, REQUIRED_MESSAGE));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(invalid(
            field,
            format!("Ensure this value has at most {max_len} characters (it has {len})."),
        ));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn not_found(entity: &'static str, id: i64) -> CaseworkError {
    CaseworkError::NotFound { entity, id }
}

/// Firm by exact name, created when missing.
pub async fn add_law_firm(db: &dyn Database, name: &str) -> Result<FirmAdded, CaseworkError> {
    let name = required_text("name", name, NAME_MAX_LEN)?;
    let (firm, created) = db.get_or_create_law_firm(&name).await?;
    if created {
        tracing::info!(law_firm_id = firm.id, "Law firm added");
    }
    Ok(FirmAdded { firm, created })
}

pub async fn find_law_firm(
    db: &dyn Database,
    name: &str,
) -> Result<Option<LawFirmRecord>, CaseworkError> {
    Ok(db.find_law_firm_by_name(name.trim()).await?)
}

/// Every firm with the lawyers that belong to it.
pub async fn list_law_firms(db: &dyn Database) -> Result<Vec<FirmListing>, CaseworkError> {
    let firms = db.list_law_firms().await?;
    let mut out = Vec::with_capacity(firms.len());
    for firm in firms {
        let lawyers = db.list_lawyers_for_firm(firm.id).await?;
        out.push(FirmListing { firm, lawyers });
    }
    Ok(out)
}

pub async fn add_company(
    db: &dyn Database,
    name: &str,
    owner: Option<&str>,
) -> Result<CompanyRecord, CaseworkError> {
    let name = required_text("name", name, NAME_MAX_LEN)?;
    let owner = optional_text(owner);
    if let Some(owner) = owner.as_deref() {
        required_text("owner", owner, NAME_MAX_LEN)?;
    }
    let company = db.create_company(&name, owner.as_deref()).await?;
    tracing::info!(company_id = company.id, "Company added");
    Ok(company)
}

pub async fn list_companies(db: &dyn Database) -> Result<Vec<CompanyRecord>, CaseworkError> {
    Ok(db.list_companies().await?)
}

pub async fn add_case_event(
    db: &dyn Database,
    case_id: i64,
    event_name: &str,
    event_date: NaiveDate,
    notes: Option<&str>,
) -> Result<CaseEventRecord, CaseworkError> {
    let case = require_case(db, case_id).await?;
    let event_name = required_text("event_name", event_name, NAME_MAX_LEN)?;
    let event = db
        .create_case_event(
            case.id,
            &CreateCaseEventParams {
                event_name,
                event_date,
                notes: optional_text(notes),
            },
        )
        .await?;
    tracing::info!(case_id = case.id, event_id = event.id, "Case event added");
    Ok(event)
}

/// Record a document reference. It may hang off a case, a task, both, or
/// neither; any id given must exist.
pub async fn add_document_reference(
    db: &dyn Database,
    document: NewDocument,
) -> Result<DocumentReferenceRecord, CaseworkError> {
    let title = required_text("title", &document.title, NAME_MAX_LEN)?;
    let source = optional_text(document.source.as_deref());
    if let Some(source) = source.as_deref() {
        required_text("source", source, NAME_MAX_LEN)?;
    }
    if let Some(case_id) = document.case_id {
        require_case(db, case_id).await?;
    }
    if let Some(task_id) = document.task_id {
        db.get_task(task_id)
            .await?
            .ok_or_else(|| not_found("task", task_id))?;
    }

    let record = db
        .create_document_reference(&CreateDocumentReferenceParams {
            document_type: document.document_type,
            title,
            source,
            date: document.date,
            case_id: document.case_id,
            task_id: document.task_id,
            description: optional_text(document.description.as_deref()),
        })
        .await?;
    tracing::info!(document_id = record.id, "Document reference added");
    Ok(record)
}

pub async fn list_documents(
    db: &dyn Database,
    owner: DocumentOwner,
) -> Result<Vec<DocumentReferenceRecord>, CaseworkError> {
    match owner {
        DocumentOwner::Case(case_id) => {
            require_case(db, case_id).await?;
            Ok(db.list_case_documents(case_id).await?)
        }
        DocumentOwner::Task(task_id) => {
            db.get_task(task_id)
                .await?
                .ok_or_else(|| not_found("task", task_id))?;
            Ok(db.list_task_documents(task_id).await?)
        }
    }
}

async fn note_parent_exists(
    db: &dyn Database,
    kind: NoteKind,
    parent_id: i64,
) -> Result<bool, CaseworkError> {
    let exists = match kind {
        NoteKind::LawFirm => db.get_law_firm(parent_id).await?.is_some(),
        NoteKind::Lawyer => db.get_lawyer(parent_id).await?.is_some(),
        NoteKind::Company => db.get_company(parent_id).await?.is_some(),
        NoteKind::Case => db.get_case(parent_id).await?.is_some(),
        NoteKind::Task => db.get_task(parent_id).await?.is_some(),
    };
    Ok(exists)
}

/// Attach a note to any entity. Unlike the case page, a blank body is an
/// error here rather than a silent no-op.
pub async fn add_note(
    db: &dyn Database,
    kind: NoteKind,
    parent_id: i64,
    text: &str,
) -> Result<NoteRecord, CaseworkError> {
    if !note_parent_exists(db, kind, parent_id).await? {
        return Err(not_found(kind.as_str(), parent_id));
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(invalid("note_text", REQUIRED_MESSAGE));
    }
    let note = db.create_note(kind, parent_id, text).await?;
    tracing::info!(kind = kind.as_str(), parent_id, note_id = note.id, "Note added");
    Ok(note)
}

pub async fn list_notes(
    db: &dyn Database,
    kind: NoteKind,
    parent_id: i64,
) -> Result<Vec<NoteRecord>, CaseworkError> {
    if !note_parent_exists(db, kind, parent_id).await? {
        return Err(not_found(kind.as_str(), parent_id));
    }
    Ok(db.list_notes(kind, parent_id).await?)
}

/// Delete one row. Children cascade or are detached as the schema says.
pub async fn delete_record(
    db: &dyn Database,
    kind: RecordKind,
    id: i64,
) -> Result<(), CaseworkError> {
    let deleted = match kind {
        RecordKind::LawFirm => db.delete_law_firm(id).await?,
        RecordKind::Lawyer => db.delete_lawyer(id).await?,
        RecordKind::Company => db.delete_company(id).await?,
        RecordKind::Case => db.delete_case(id).await?,
        RecordKind::Task => db.delete_task(id).await?,
    };
    if !deleted {
        return Err(not_found(kind.as_str(), id));
    }
    tracing::info!(kind = kind.as_str(), id, "Record deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::db::{CreateLawyerParams, CreateTaskParams, TaskStatus};
    use crate::testing::{seed_case, test_db};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn at(day: u32) -> NaiveDateTime {
        date(2025, 3, day).and_hms_opt(9, 0, 0).expect("valid time")
    }

    fn document(title: &str) -> NewDocument {
        NewDocument {
            document_type: DocumentType::Invoice,
            title: title.to_string(),
            source: None,
            date: None,
            case_id: None,
            task_id: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn firms_are_reused_by_name_and_list_their_lawyers() {
        let (db, _dir) = test_db().await;
        let added = add_law_firm(db.as_ref(), "  Acme Legal ").await.expect("firm");
        assert!(added.created);
        assert_eq!(added.firm.name, "Acme Legal");
        let again = add_law_firm(db.as_ref(), "Acme Legal").await.expect("firm");
        assert!(!again.created);
        assert_eq!(again.firm.id, added.firm.id);

        db.create_lawyer_in_firm(
            &CreateLawyerParams {
                name: "Jane Roe".to_string(),
                ..CreateLawyerParams::default()
            },
            Some("Acme Legal"),
        )
        .await
        .expect("lawyer");

        let listing = list_law_firms(db.as_ref()).await.expect("list");
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].lawyers.len(), 1);
        assert_eq!(listing[0].lawyers[0].name, "Jane Roe");

        let found = find_law_firm(db.as_ref(), "Acme Legal").await.expect("find");
        assert_eq!(found.map(|f| f.id), Some(added.firm.id));
        assert!(find_law_firm(db.as_ref(), "Nobody LLP").await.expect("find").is_none());

        let err = add_law_firm(db.as_ref(), "   ").await.expect_err("blank");
        assert!(matches!(err, CaseworkError::Invalid { field: "name", .. }));
    }

    #[tokio::test]
    async fn companies_validate_and_list() {
        let (db, _dir) = test_db().await;
        let company = add_company(db.as_ref(), "Initech", Some("  "))
            .await
            .expect("company");
        assert_eq!(company.owner, None);
        add_company(db.as_ref(), "Acme Corp", Some("Wile E."))
            .await
            .expect("company");
        assert_eq!(list_companies(db.as_ref()).await.expect("list").len(), 2);

        let long = "x".repeat(256);
        let err = add_company(db.as_ref(), &long, None).await.expect_err("long");
        let CaseworkError::Invalid { field, message } = err else {
            panic!("expected invalid");
        };
        assert_eq!(field, "name");
        assert!(message.contains("at most 255"));
    }

    #[tokio::test]
    async fn case_events_need_a_case_and_a_name() {
        let (db, _dir) = test_db().await;
        let case = seed_case(db.as_ref(), "alpha").await;

        let event = add_case_event(db.as_ref(), case.id, "Filed", date(2025, 2, 1), Some(" "))
            .await
            .expect("event");
        assert_eq!(event.case_id, case.id);
        assert_eq!(event.notes, None);
        assert_eq!(db.list_case_events(case.id).await.expect("events").len(), 1);

        let err = add_case_event(db.as_ref(), 99, "Filed", date(2025, 2, 1), None)
            .await
            .expect_err("missing case");
        assert!(matches!(err, CaseworkError::NotFound { entity: "case", id: 99 }));
        let err = add_case_event(db.as_ref(), case.id, "", date(2025, 2, 1), None)
            .await
            .expect_err("blank name");
        assert!(matches!(err, CaseworkError::Invalid { field: "event_name", .. }));
    }

    #[tokio::test]
    async fn documents_check_their_owners_and_list_by_owner() {
        let (db, _dir) = test_db().await;
        let case = seed_case(db.as_ref(), "alpha").await;
        let task = db
            .create_task(
                case.id,
                &CreateTaskParams {
                    task_type: "Review".to_string(),
                    summary: "Review invoices".to_string(),
                    start_time: at(1),
                    end_time: at(2),
                    status: TaskStatus::NotStarted,
                },
            )
            .await
            .expect("task");

        let doc = add_document_reference(
            db.as_ref(),
            NewDocument {
                case_id: Some(case.id),
                task_id: Some(task.id),
                source: Some("Subpoena".to_string()),
                ..document("Invoice 42")
            },
        )
        .await
        .expect("document");
        add_document_reference(db.as_ref(), document("Loose check"))
            .await
            .expect("unattached document");

        let by_case = list_documents(db.as_ref(), DocumentOwner::Case(case.id))
            .await
            .expect("case docs");
        let by_task = list_documents(db.as_ref(), DocumentOwner::Task(task.id))
            .await
            .expect("task docs");
        assert_eq!(by_case.len(), 1);
        assert_eq!(by_task.len(), 1);
        assert_eq!(by_task[0].id, doc.id);

        let err = add_document_reference(
            db.as_ref(),
            NewDocument {
                task_id: Some(777),
                ..document("Orphan")
            },
        )
        .await
        .expect_err("missing task");
        assert!(matches!(err, CaseworkError::NotFound { entity: "task", id: 777 }));
        assert!(matches!(
            list_documents(db.as_ref(), DocumentOwner::Case(5)).await,
            Err(CaseworkError::NotFound { entity: "case", .. })
        ));
    }

    #[tokio::test]
    async fn notes_attach_to_any_existing_entity() {
        let (db, _dir) = test_db().await;
        let company = add_company(db.as_ref(), "Initech", None).await.expect("company");
        let firm = add_law_firm(db.as_ref(), "Acme Legal").await.expect("firm").firm;

        add_note(db.as_ref(), NoteKind::Company, company.id, " Key client ")
            .await
            .expect("company note");
        add_note(db.as_ref(), NoteKind::LawFirm, firm.id, "Opposing counsel")
            .await
            .expect("firm note");

        let notes = list_notes(db.as_ref(), NoteKind::Company, company.id)
            .await
            .expect("notes");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].note_text, "Key client");

        let err = add_note(db.as_ref(), NoteKind::Lawyer, 12, "hello")
            .await
            .expect_err("missing lawyer");
        assert!(matches!(err, CaseworkError::NotFound { entity: "lawyer", id: 12 }));
        let err = add_note(db.as_ref(), NoteKind::Company, company.id, "  ")
            .await
            .expect_err("blank");
        assert!(matches!(err, CaseworkError::Invalid { field: "note_text", .. }));
    }

    #[tokio::test]
    async fn delete_reports_missing_rows_and_cascades() {
        let (db, _dir) = test_db().await;
        let case = seed_case(db.as_ref(), "alpha").await;
        add_case_event(db.as_ref(), case.id, "Filed", date(2025, 2, 1), None)
            .await
            .expect("event");

        delete_record(db.as_ref(), RecordKind::Case, case.id)
            .await
            .expect("delete");
        assert!(db.get_case(case.id).await.expect("get").is_none());
        assert!(db.list_case_events(case.id).await.expect("events").is_empty());

        for kind in [
            RecordKind::LawFirm,
            RecordKind::Lawyer,
            RecordKind::Company,
            RecordKind::Case,
            RecordKind::Task,
        ] {
            let err = delete_record(db.as_ref(), kind, case.id)
                .await
                .expect_err("already gone");
            assert!(
                matches!(err, CaseworkError::NotFound { entity, .. } if entity == kind.as_str())
            );
        }
    }
}

use serde::Serialize;

use crate::db::{
    CaseEventRecord, CaseRecord, Database, DocumentReferenceRecord, LawyerRecord, NoteKind,
    NoteRecord, TaskOrder, TaskRecord,
};
use crate::error::CaseworkError;

use super::{TaskView, require_case};

/// Everything the case page shows.
#[derive(Debug, Clone, Serialize)]
pub struct CaseDetail {
    pub case: CaseRecord,
    pub notes: Vec<NoteRecord>,
    pub tasks: Vec<TaskRecord>,
    /// The filter as requested, echoed back for the tab state.
    pub task_filter: String,
    pub events: Vec<CaseEventRecord>,
    pub plaintiff_lawyer: Option<LawyerRecord>,
    pub defense_lawyer: Option<LawyerRecord>,
    pub documents: Vec<DocumentReferenceRecord>,
}

pub async fn load_case_detail(
    db: &dyn Database,
    case_id: i64,
    task_filter: Option<&str>,
) -> Result<CaseDetail, CaseworkError> {
    let case = require_case(db, case_id).await?;
    let view = TaskView::parse(task_filter);

    let notes = db.list_notes(NoteKind::Case, case.id).await?;
    let tasks = db
        .list_case_tasks(case.id, view.status_filter(), TaskOrder::Stored)
        .await?;
    let events = db.list_case_events(case.id).await?;
    let plaintiff_lawyer = match case.plaintiff_lawyer_id {
        Some(id) => db.get_lawyer(id).await?,
        None => None,
    };
    let defense_lawyer = match case.defense_lawyer_id {
        Some(id) => db.get_lawyer(id).await?,
        None => None,
    };
    let documents = db.list_case_documents(case.id).await?;

    Ok(CaseDetail {
        case,
        notes,
        tasks,
        task_filter: task_filter.unwrap_or(TaskView::Todo.as_str()).to_string(),
        events,
        plaintiff_lawyer,
        defense_lawyer,
        documents,
    })
}

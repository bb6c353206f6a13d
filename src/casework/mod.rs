//! Case-work operations.
//!
//! One function per user-facing action. Each takes the store and already
//! extracted request data, performs its reads and writes, and returns a
//! structured outcome; choosing a status code or template is the web layer's
//! job.

mod admin;
mod case_detail;
mod intake;
mod lawyers;
mod notes;
mod overview;
mod tasks;

pub use admin::{
    DocumentOwner, FirmAdded, FirmListing, NewDocument, RecordKind, add_case_event, add_company,
    add_document_reference, add_law_firm, add_note, delete_record, find_law_firm, list_companies,
    list_documents, list_law_firms, list_notes,
};
pub use case_detail::{CaseDetail, load_case_detail};
pub use intake::{IntakeOutcome, submit_intake};
pub use lawyers::{
    CreatedLawyer, LAWYER_SEARCH_LIMIT, LawyerCreateOutcome, LawyerSearch, LawyerSide,
    create_inline_lawyer, search_lawyers,
};
pub use notes::{NoteOutcome, add_case_note};
pub use overview::{Overview, RECENT_CASES_LIMIT, list_all_cases, load_overview};
pub use tasks::{
    CreatedTask, ModalTaskOutcome, TaskCreateOutcome, create_task, create_task_in_modal,
    list_tasks_for_view,
};

use crate::db::{CaseRecord, Database, TaskOrder, TaskStatus, TaskStatusFilter};
use crate::error::CaseworkError;

/// Which half of a case's tasks is shown: open work or finished work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskView {
    #[default]
    Todo,
    Complete,
}

impl TaskView {
    /// "complete" selects finished tasks; anything else, or nothing, is todo.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("complete") => Self::Complete,
            _ => Self::Todo,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Complete => "complete",
        }
    }

    pub fn status_filter(self) -> TaskStatusFilter {
        match self {
            Self::Todo => TaskStatusFilter::Except(TaskStatus::Complete),
            Self::Complete => TaskStatusFilter::Only(TaskStatus::Complete),
        }
    }

    /// Todo lists soonest deadline first; complete lists most recent first.
    pub fn list_order(self) -> TaskOrder {
        match self {
            Self::Todo => TaskOrder::EndTimeAsc,
            Self::Complete => TaskOrder::EndTimeDesc,
        }
    }
}

pub(crate) async fn require_case(
    db: &dyn Database,
    case_id: i64,
) -> Result<CaseRecord, CaseworkError> {
    db.get_case(case_id)
        .await?
        .ok_or(CaseworkError::NotFound {
            entity: "case",
            id: case_id,
        })
}

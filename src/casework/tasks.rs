use serde::Serialize;

use crate::db::{CaseRecord, CreateTaskParams, Database, TaskRecord};
use crate::error::CaseworkError;
use crate::forms::{FieldErrors, Form, FormData, TaskForm};

use super::{TaskView, require_case};

/// The case's tasks for one view, ordered by deadline.
pub async fn list_tasks_for_view(
    db: &dyn Database,
    case_id: i64,
    view: TaskView,
) -> Result<Vec<TaskRecord>, CaseworkError> {
    let case = require_case(db, case_id).await?;
    Ok(view_tasks(db, &case, view).await?)
}

async fn view_tasks(
    db: &dyn Database,
    case: &CaseRecord,
    view: TaskView,
) -> Result<Vec<TaskRecord>, crate::error::DatabaseError> {
    db.list_case_tasks(case.id, view.status_filter(), view.list_order())
        .await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreatedTask {
    pub id: i64,
    pub case_id: i64,
}

#[derive(Debug)]
pub enum TaskCreateOutcome {
    Created(CreatedTask),
    Invalid {
        case: CaseRecord,
        errors: FieldErrors,
    },
}

#[derive(Debug)]
pub enum ModalTaskOutcome {
    /// The task was saved; `tasks` is the refreshed list for the active view.
    Created {
        task: TaskRecord,
        tasks: Vec<TaskRecord>,
    },
    Invalid {
        case: CaseRecord,
        errors: FieldErrors,
    },
}

async fn insert_task(
    db: &dyn Database,
    case: &CaseRecord,
    data: &FormData,
) -> Result<Result<TaskRecord, FieldErrors>, CaseworkError> {
    let input = match TaskForm::clean(data) {
        Ok(input) => input,
        Err(errors) => {
            tracing::debug!(case_id = case.id, fields = ?errors, "Task rejected");
            return Ok(Err(errors));
        }
    };
    let task = db
        .create_task(case.id, &CreateTaskParams::from(input))
        .await?;
    tracing::info!(case_id = case.id, task_id = task.id, "Task created");
    Ok(Ok(task))
}

pub async fn create_task(
    db: &dyn Database,
    case_id: i64,
    data: &FormData,
) -> Result<TaskCreateOutcome, CaseworkError> {
    let case = require_case(db, case_id).await?;
    Ok(match insert_task(db, &case, data).await? {
        Ok(task) => TaskCreateOutcome::Created(CreatedTask {
            id: task.id,
            case_id: task.case_id,
        }),
        Err(errors) => TaskCreateOutcome::Invalid { case, errors },
    })
}

pub async fn create_task_in_modal(
    db: &dyn Database,
    case_id: i64,
    data: &FormData,
    view: TaskView,
) -> Result<ModalTaskOutcome, CaseworkError> {
    let case = require_case(db, case_id).await?;
    match insert_task(db, &case, data).await? {
        Ok(task) => {
            let tasks = view_tasks(db, &case, view).await?;
            Ok(ModalTaskOutcome::Created { task, tasks })
        }
        Err(errors) => Ok(ModalTaskOutcome::Invalid { case, errors }),
    }
}

use chrono::Utc;
use libsql::{Value, params};

use crate::db::{
    CreateDocumentReferenceParams, CreateTaskParams, DocumentReferenceRecord,
    DocumentReferenceStore, DocumentType, TaskOrder, TaskRecord, TaskStatus, TaskStatusFilter,
    TaskStore,
};
use crate::error::DatabaseError;

use super::{
    LibSqlBackend, fmt_date, fmt_datetime, fmt_ts, get_i64, get_opt_i64, get_opt_text, get_text,
    opt_i64, opt_text, parse_date_opt, parse_datetime, parse_timestamp,
};

const TASK_COLUMNS: &str = "id, case_id, task_type, summary, start_time, end_time, status, created_at";
const DOCUMENT_COLUMNS: &str =
    "id, document_type, title, source, date, case_id, task_id, description, created_at";

fn row_to_task_record(row: &libsql::Row) -> Result<TaskRecord, DatabaseError> {
    let status_raw = get_text(row, 6);
    let status = TaskStatus::from_db_value(&status_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid task status '{}'", status_raw))
    })?;
    Ok(TaskRecord {
        id: get_i64(row, 0),
        case_id: get_i64(row, 1),
        task_type: get_text(row, 2),
        summary: get_text(row, 3),
        start_time: parse_datetime(&get_text(row, 4))?,
        end_time: parse_datetime(&get_text(row, 5))?,
        status,
        created_at: parse_timestamp(&get_text(row, 7))?,
    })
}

fn row_to_document_record(row: &libsql::Row) -> Result<DocumentReferenceRecord, DatabaseError> {
    let type_raw = get_text(row, 1);
    let document_type = DocumentType::from_db_value(&type_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid document type '{}'", type_raw))
    })?;
    Ok(DocumentReferenceRecord {
        id: get_i64(row, 0),
        document_type,
        title: get_text(row, 2),
        source: get_opt_text(row, 3),
        date: parse_date_opt(get_opt_text(row, 4))?,
        case_id: get_opt_i64(row, 5),
        task_id: get_opt_i64(row, 6),
        description: get_opt_text(row, 7),
        created_at: parse_timestamp(&get_text(row, 8))?,
    })
}

/// WHERE fragment and bound status for a task filter. The case id is `?1`.
fn status_clause(filter: TaskStatusFilter) -> (&'static str, Option<Value>) {
    match filter {
        TaskStatusFilter::All => ("", None),
        TaskStatusFilter::Only(status) => (
            " AND status = ?2",
            Some(Value::Text(status.as_str().to_string())),
        ),
        TaskStatusFilter::Except(status) => (
            " AND status <> ?2",
            Some(Value::Text(status.as_str().to_string())),
        ),
    }
}

fn order_clause(order: TaskOrder) -> &'static str {
    match order {
        TaskOrder::Stored => "id ASC",
        TaskOrder::EndTimeAsc => "end_time ASC, id ASC",
        TaskOrder::EndTimeDesc => "end_time DESC, id DESC",
    }
}

#[async_trait::async_trait]
impl TaskStore for LibSqlBackend {
    async fn create_task(
        &self,
        case_id: i64,
        input: &CreateTaskParams,
    ) -> Result<TaskRecord, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "INSERT INTO tasks (case_id, task_type, summary, start_time, end_time, status, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING {TASK_COLUMNS}"
                ),
                params![
                    case_id,
                    input.task_type.as_str(),
                    input.summary.as_str(),
                    fmt_datetime(input.start_time),
                    fmt_datetime(input.end_time),
                    input.status.as_str(),
                    fmt_ts(&Utc::now()),
                ],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created task".to_string()))?;
        row_to_task_record(&row)
    }

    async fn get_task(&self, id: i64) -> Result<Option<TaskRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 LIMIT 1"),
                params![id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_task_record(&row)).transpose()
    }

    async fn list_case_tasks(
        &self,
        case_id: i64,
        filter: TaskStatusFilter,
        order: TaskOrder,
    ) -> Result<Vec<TaskRecord>, DatabaseError> {
        let (where_status, status_value) = status_clause(filter);
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE case_id = ?1{where_status} ORDER BY {}",
            order_clause(order)
        );

        let conn = self.connect().await?;
        let mut rows = match status_value {
            Some(status) => conn.query(&sql, params![case_id, status]).await?,
            None => conn.query(&sql, params![case_id]).await?,
        };
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_task_record(&row)?);
        }
        Ok(out)
    }

    async fn delete_task(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait::async_trait]
impl DocumentReferenceStore for LibSqlBackend {
    async fn create_document_reference(
        &self,
        input: &CreateDocumentReferenceParams,
    ) -> Result<DocumentReferenceRecord, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "INSERT INTO document_references \
                     (document_type, title, source, date, case_id, task_id, description, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING {DOCUMENT_COLUMNS}"
                ),
                params![
                    input.document_type.as_str(),
                    input.title.as_str(),
                    opt_text(input.source.as_deref()),
                    opt_text(input.date.map(fmt_date).as_deref()),
                    opt_i64(input.case_id),
                    opt_i64(input.task_id),
                    opt_text(input.description.as_deref()),
                    fmt_ts(&Utc::now()),
                ],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| {
                DatabaseError::Query("failed to load created document reference".to_string())
            })?;
        row_to_document_record(&row)
    }

    async fn get_document_reference(
        &self,
        id: i64,
    ) -> Result<Option<DocumentReferenceRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM document_references WHERE id = ?1 LIMIT 1"),
                params![id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_document_record(&row)).transpose()
    }

    async fn list_case_documents(
        &self,
        case_id: i64,
    ) -> Result<Vec<DocumentReferenceRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM document_references WHERE case_id = ?1 ORDER BY id ASC"
                ),
                params![case_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_document_record(&row)?);
        }
        Ok(out)
    }

    async fn list_task_documents(
        &self,
        task_id: i64,
    ) -> Result<Vec<DocumentReferenceRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {DOCUMENT_COLUMNS} FROM document_references WHERE task_id = ?1 ORDER BY id ASC"
                ),
                params![task_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_document_record(&row)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::db::{
        CaseStage, CaseStore, CaseType, CreateCaseParams, DEFAULT_CASE_STATUS, Database, HiredBy,
    };

    struct TestBackend {
        backend: LibSqlBackend,
        _tmpdir: tempfile::TempDir,
    }

    async fn setup_backend() -> TestBackend {
        let tmpdir = tempfile::tempdir().expect("tempdir");
        let backend = LibSqlBackend::new_local(&tmpdir.path().join("tasks_test.db"))
            .await
            .expect("local backend should initialize");
        backend
            .run_migrations()
            .await
            .expect("migrations should succeed");
        TestBackend {
            backend,
            _tmpdir: tmpdir,
        }
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .expect("valid datetime")
    }

    async fn seed_case(db: &LibSqlBackend, short_name: &str) -> i64 {
        db.create_case(&CreateCaseParams {
            summary: None,
            short_name: short_name.to_string(),
            case_number: format!("{short_name}-no"),
            case_type: CaseType::Litigation,
            hired_by: HiredBy::Plaintiff,
            date_of_case: NaiveDate::from_ymd_opt(2025, 4, 1).expect("date"),
            plaintiff: "P".to_string(),
            defendant: "D".to_string(),
            plaintiff_lawyer_id: None,
            defense_lawyer_id: None,
            status: DEFAULT_CASE_STATUS.to_string(),
            stage: CaseStage::Discovery,
            last_worked_on: None,
        })
        .await
        .expect("case")
        .id
    }

    async fn seed_task(
        db: &LibSqlBackend,
        case_id: i64,
        summary: &str,
        end_day: u32,
        status: TaskStatus,
    ) -> TaskRecord {
        db.create_task(
            case_id,
            &CreateTaskParams {
                task_type: "Filing".to_string(),
                summary: summary.to_string(),
                start_time: at(1, 9),
                end_time: at(end_day, 17),
                status,
            },
        )
        .await
        .expect("task")
    }

    fn summaries(tasks: &[TaskRecord]) -> Vec<&str> {
        tasks.iter().map(|t| t.summary.as_str()).collect()
    }

    #[tokio::test]
    async fn todo_and_complete_partition_a_case_and_order_by_end_time() {
        let fixture = setup_backend().await;
        let db = &fixture.backend;
        let case_id = seed_case(db, "alpha").await;
        let other_case = seed_case(db, "beta").await;

        seed_task(db, case_id, "late todo", 20, TaskStatus::InProgress).await;
        seed_task(db, case_id, "early todo", 5, TaskStatus::NotStarted).await;
        seed_task(db, case_id, "old done", 3, TaskStatus::Complete).await;
        seed_task(db, case_id, "recent done", 15, TaskStatus::Complete).await;
        seed_task(db, other_case, "elsewhere", 1, TaskStatus::NotStarted).await;

        let todo = db
            .list_case_tasks(
                case_id,
                TaskStatusFilter::Except(TaskStatus::Complete),
                TaskOrder::EndTimeAsc,
            )
            .await
            .expect("todo");
        assert_eq!(summaries(&todo), vec!["early todo", "late todo"]);

        let complete = db
            .list_case_tasks(
                case_id,
                TaskStatusFilter::Only(TaskStatus::Complete),
                TaskOrder::EndTimeDesc,
            )
            .await
            .expect("complete");
        assert_eq!(summaries(&complete), vec!["recent done", "old done"]);

        let all = db
            .list_case_tasks(case_id, TaskStatusFilter::All, TaskOrder::Stored)
            .await
            .expect("all");
        assert_eq!(
            summaries(&all),
            vec!["late todo", "early todo", "old done", "recent done"]
        );
    }

    #[tokio::test]
    async fn task_round_trips_times_and_status() {
        let fixture = setup_backend().await;
        let db = &fixture.backend;
        let case_id = seed_case(db, "alpha").await;
        let created = seed_task(db, case_id, "prepare", 9, TaskStatus::WaitingDocs).await;

        let loaded = db.get_task(created.id).await.expect("get").expect("exists");
        assert_eq!(loaded.case_id, case_id);
        assert_eq!(loaded.start_time, at(1, 9));
        assert_eq!(loaded.end_time, at(9, 17));
        assert_eq!(loaded.status, TaskStatus::WaitingDocs);

        assert!(db.delete_task(created.id).await.expect("delete"));
        assert!(db.get_task(created.id).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn deleting_task_detaches_its_documents() {
        let fixture = setup_backend().await;
        let db = &fixture.backend;
        let case_id = seed_case(db, "alpha").await;
        let task = seed_task(db, case_id, "collect", 9, TaskStatus::NotStarted).await;

        let doc = db
            .create_document_reference(&CreateDocumentReferenceParams {
                document_type: DocumentType::BankStmt,
                title: "March statement".to_string(),
                source: Some("First Bank".to_string()),
                date: NaiveDate::from_ymd_opt(2025, 3, 31),
                case_id: Some(case_id),
                task_id: Some(task.id),
                description: None,
            })
            .await
            .expect("document");
        assert_eq!(db.list_task_documents(task.id).await.expect("docs").len(), 1);

        db.delete_task(task.id).await.expect("delete");

        let doc = db
            .get_document_reference(doc.id)
            .await
            .expect("get")
            .expect("document survives");
        assert_eq!(doc.task_id, None);
        assert_eq!(doc.case_id, Some(case_id));
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(db.list_case_documents(case_id).await.expect("docs").len(), 1);
    }
}

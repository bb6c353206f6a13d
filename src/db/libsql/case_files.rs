use chrono::Utc;
use libsql::params;

use crate::db::{
    CaseEventRecord, CaseEventStore, CaseRecord, CaseStage, CaseStore, CaseType,
    CreateCaseEventParams, CreateCaseParams, HiredBy, NoteKind, NoteRecord, NoteStore,
};
use crate::error::DatabaseError;

use super::{
    LibSqlBackend, fmt_date, fmt_ts, get_i64, get_opt_i64, get_opt_text, get_text, opt_i64,
    opt_text, parse_date, parse_date_opt, parse_timestamp,
};

const CASE_COLUMNS: &str = "id, summary, short_name, case_number, case_type, hired_by, \
     date_of_case, plaintiff, defendant, plaintiff_lawyer_id, defense_lawyer_id, status, stage, \
     last_worked_on, created_at";
const CASE_EVENT_COLUMNS: &str = "id, case_id, event_name, event_date, notes, created_at";

fn row_to_case_record(row: &libsql::Row) -> Result<CaseRecord, DatabaseError> {
    let case_type_raw = get_text(row, 4);
    let case_type = CaseType::from_db_value(&case_type_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid case type '{}'", case_type_raw))
    })?;
    let hired_by_raw = get_text(row, 5);
    let hired_by = HiredBy::from_db_value(&hired_by_raw).ok_or_else(|| {
        DatabaseError::Serialization(format!("invalid hired_by '{}'", hired_by_raw))
    })?;
    let stage_raw = get_text(row, 12);
    let stage = CaseStage::from_db_value(&stage_raw)
        .ok_or_else(|| DatabaseError::Serialization(format!("invalid stage '{}'", stage_raw)))?;

    Ok(CaseRecord {
        id: get_i64(row, 0),
        summary: get_opt_text(row, 1),
        short_name: get_text(row, 2),
        case_number: get_text(row, 3),
        case_type,
        hired_by,
        date_of_case: parse_date(&get_text(row, 6))?,
        plaintiff: get_text(row, 7),
        defendant: get_text(row, 8),
        plaintiff_lawyer_id: get_opt_i64(row, 9),
        defense_lawyer_id: get_opt_i64(row, 10),
        status: get_text(row, 11),
        stage,
        last_worked_on: parse_date_opt(get_opt_text(row, 13))?,
        created_at: parse_timestamp(&get_text(row, 14))?,
    })
}

fn row_to_case_event_record(row: &libsql::Row) -> Result<CaseEventRecord, DatabaseError> {
    Ok(CaseEventRecord {
        id: get_i64(row, 0),
        case_id: get_i64(row, 1),
        event_name: get_text(row, 2),
        event_date: parse_date(&get_text(row, 3))?,
        notes: get_opt_text(row, 4),
        created_at: parse_timestamp(&get_text(row, 5))?,
    })
}

fn row_to_note_record(kind: NoteKind, row: &libsql::Row) -> Result<NoteRecord, DatabaseError> {
    Ok(NoteRecord {
        id: get_i64(row, 0),
        kind,
        parent_id: get_i64(row, 1),
        note_text: get_text(row, 2),
        created_at: parse_timestamp(&get_text(row, 3))?,
    })
}

#[async_trait::async_trait]
impl CaseStore for LibSqlBackend {
    async fn create_case(&self, input: &CreateCaseParams) -> Result<CaseRecord, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "INSERT INTO cases (summary, short_name, case_number, case_type, hired_by, \
                     date_of_case, plaintiff, defendant, plaintiff_lawyer_id, defense_lawyer_id, \
                     status, stage, last_worked_on, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
                     RETURNING {CASE_COLUMNS}"
                ),
                params![
                    opt_text(input.summary.as_deref()),
                    input.short_name.as_str(),
                    input.case_number.as_str(),
                    input.case_type.as_str(),
                    input.hired_by.as_str(),
                    fmt_date(input.date_of_case),
                    input.plaintiff.as_str(),
                    input.defendant.as_str(),
                    opt_i64(input.plaintiff_lawyer_id),
                    opt_i64(input.defense_lawyer_id),
                    input.status.as_str(),
                    input.stage.as_str(),
                    opt_text(input.last_worked_on.map(fmt_date).as_deref()),
                    fmt_ts(&Utc::now()),
                ],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created case".to_string()))?;
        row_to_case_record(&row)
    }

    async fn get_case(&self, id: i64) -> Result<Option<CaseRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1 LIMIT 1"),
                params![id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_case_record(&row)).transpose()
    }

    async fn list_cases(&self) -> Result<Vec<CaseRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {CASE_COLUMNS} FROM cases ORDER BY date_of_case DESC, id DESC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_case_record(&row)?);
        }
        Ok(out)
    }

    async fn list_recent_cases(&self, limit: usize) -> Result<Vec<CaseRecord>, DatabaseError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CASE_COLUMNS} FROM cases \
                     ORDER BY created_at DESC, id DESC LIMIT ?1"
                ),
                params![limit],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_case_record(&row)?);
        }
        Ok(out)
    }

    async fn count_cases(&self) -> Result<i64, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query("SELECT COUNT(*) FROM cases", ())
            .await?
            .next()
            .await?;
        Ok(row.map(|row| get_i64(&row, 0)).unwrap_or(0))
    }

    async fn case_short_name_exists(&self, short_name: &str) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT 1 FROM cases WHERE short_name = ?1 LIMIT 1",
                params![short_name],
            )
            .await?
            .next()
            .await?;
        Ok(row.is_some())
    }

    async fn case_number_exists(&self, case_number: &str) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT 1 FROM cases WHERE case_number = ?1 LIMIT 1",
                params![case_number],
            )
            .await?
            .next()
            .await?;
        Ok(row.is_some())
    }

    async fn delete_case(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM cases WHERE id = ?1", params![id])
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait::async_trait]
impl CaseEventStore for LibSqlBackend {
    async fn create_case_event(
        &self,
        case_id: i64,
        input: &CreateCaseEventParams,
    ) -> Result<CaseEventRecord, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "INSERT INTO case_events (case_id, event_name, event_date, notes, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {CASE_EVENT_COLUMNS}"
                ),
                params![
                    case_id,
                    input.event_name.as_str(),
                    fmt_date(input.event_date),
                    opt_text(input.notes.as_deref()),
                    fmt_ts(&Utc::now()),
                ],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created case event".to_string()))?;
        row_to_case_event_record(&row)
    }

    async fn list_case_events(&self, case_id: i64) -> Result<Vec<CaseEventRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CASE_EVENT_COLUMNS} FROM case_events WHERE case_id = ?1 \
                     ORDER BY event_date ASC, id ASC"
                ),
                params![case_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_case_event_record(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl NoteStore for LibSqlBackend {
    async fn create_note(
        &self,
        kind: NoteKind,
        parent_id: i64,
        note_text: &str,
    ) -> Result<NoteRecord, DatabaseError> {
        let table = kind.table();
        let parent = kind.parent_column();
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "INSERT INTO {table} ({parent}, note_text, created_at) VALUES (?1, ?2, ?3) \
                     RETURNING id, {parent}, note_text, created_at"
                ),
                params![parent_id, note_text, fmt_ts(&Utc::now())],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| {
                DatabaseError::Query(format!("failed to load created {} note", kind.as_str()))
            })?;
        row_to_note_record(kind, &row)
    }

    async fn list_notes(
        &self,
        kind: NoteKind,
        parent_id: i64,
    ) -> Result<Vec<NoteRecord>, DatabaseError> {
        let table = kind.table();
        let parent = kind.parent_column();
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT id, {parent}, note_text, created_at FROM {table} \
                     WHERE {parent} = ?1 ORDER BY id ASC"
                ),
                params![parent_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_note_record(kind, &row)?);
        }
        Ok(out)
    }
}

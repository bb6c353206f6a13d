//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use crate::db::libsql::LibSqlBackend;
use crate::db::{
    CaseRecord, CaseStage, CaseType, CreateCaseParams, DEFAULT_CASE_STATUS, Database, HiredBy,
};
use crate::web::server::AppState;
use crate::web::Templates;

/// A migrated libSQL database in a fresh temp directory. Keep the `TempDir`
/// alive for as long as the database is used.
pub async fn test_db() -> (Arc<dyn Database>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = LibSqlBackend::new_local(&dir.path().join("test.db"))
        .await
        .expect("local backend");
    backend.run_migrations().await.expect("migrations");
    (Arc::new(backend), dir)
}

pub fn case_params(short_name: &str, case_number: &str) -> CreateCaseParams {
    CreateCaseParams {
        summary: None,
        short_name: short_name.to_string(),
        case_number: case_number.to_string(),
        case_type: CaseType::Civil,
        hired_by: HiredBy::Plaintiff,
        date_of_case: NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date"),
        plaintiff: "Acme Corp".to_string(),
        defendant: "Initech".to_string(),
        plaintiff_lawyer_id: None,
        defense_lawyer_id: None,
        status: DEFAULT_CASE_STATUS.to_string(),
        stage: CaseStage::Initial,
        last_worked_on: None,
    }
}

pub async fn seed_case(db: &dyn Database, short_name: &str) -> CaseRecord {
    db.create_case(&case_params(short_name, &format!("{short_name}-number")))
        .await
        .expect("seed case")
}

/// Web state over a fresh [`test_db`].
pub async fn test_state() -> (Arc<AppState>, TempDir) {
    let (db, dir) = test_db().await;
    let templates = Templates::new().expect("templates");
    (Arc::new(AppState::new(db, templates)), dir)
}

use serde::Serialize;

use crate::db::{CaseRecord, Database};
use crate::error::CaseworkError;

pub const RECENT_CASES_LIMIT: usize = 5;

/// Landing page summary.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub case_count: i64,
    pub recent_cases: Vec<CaseRecord>,
}

pub async fn load_overview(db: &dyn Database) -> Result<Overview, CaseworkError> {
    Ok(Overview {
        case_count: db.count_cases().await?,
        recent_cases: db.list_recent_cases(RECENT_CASES_LIMIT).await?,
    })
}

pub async fn list_all_cases(db: &dyn Database) -> Result<Vec<CaseRecord>, CaseworkError> {
    Ok(db.list_cases().await?)
}

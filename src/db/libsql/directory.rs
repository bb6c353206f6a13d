use chrono::Utc;
use libsql::{Connection, params};

use crate::db::{
    CompanyRecord, CompanyStore, CreateLawyerParams, LawFirmRecord, LawFirmStore, LawyerRecord,
    LawyerStore, LawyerWithFirm,
};
use crate::error::DatabaseError;

use super::{
    LibSqlBackend, fmt_ts, get_i64, get_opt_i64, get_opt_text, get_text, opt_i64, opt_text,
    parse_timestamp,
};

const LAW_FIRM_COLUMNS: &str = "id, name, created_at";
const LAWYER_COLUMNS: &str = "id, name, title, email, phone_number, law_firm_id, created_at";
const COMPANY_COLUMNS: &str = "id, name, owner, created_at";

fn row_to_law_firm_record(row: &libsql::Row) -> Result<LawFirmRecord, DatabaseError> {
    Ok(LawFirmRecord {
        id: get_i64(row, 0),
        name: get_text(row, 1),
        created_at: parse_timestamp(&get_text(row, 2))?,
    })
}

fn row_to_lawyer_record(row: &libsql::Row) -> Result<LawyerRecord, DatabaseError> {
    Ok(LawyerRecord {
        id: get_i64(row, 0),
        name: get_text(row, 1),
        title: get_opt_text(row, 2),
        email: get_opt_text(row, 3),
        phone: get_opt_text(row, 4),
        law_firm_id: get_opt_i64(row, 5),
        created_at: parse_timestamp(&get_text(row, 6))?,
    })
}

fn row_to_company_record(row: &libsql::Row) -> Result<CompanyRecord, DatabaseError> {
    Ok(CompanyRecord {
        id: get_i64(row, 0),
        name: get_text(row, 1),
        owner: get_opt_text(row, 2),
        created_at: parse_timestamp(&get_text(row, 3))?,
    })
}

async fn insert_law_firm(conn: &Connection, name: &str) -> Result<LawFirmRecord, DatabaseError> {
    let row = conn
        .query(
            &format!(
                "INSERT INTO law_firms (name, created_at) VALUES (?1, ?2) RETURNING {LAW_FIRM_COLUMNS}"
            ),
            params![name, fmt_ts(&Utc::now())],
        )
        .await?
        .next()
        .await?
        .ok_or_else(|| DatabaseError::Query("failed to load created law firm".to_string()))?;
    row_to_law_firm_record(&row)
}

async fn find_law_firm(conn: &Connection, name: &str) -> Result<Option<LawFirmRecord>, DatabaseError> {
    let row = conn
        .query(
            &format!("SELECT {LAW_FIRM_COLUMNS} FROM law_firms WHERE name = ?1 ORDER BY id ASC LIMIT 1"),
            params![name],
        )
        .await?
        .next()
        .await?;
    row.map(|row| row_to_law_firm_record(&row)).transpose()
}

async fn insert_lawyer(
    conn: &Connection,
    input: &CreateLawyerParams,
    law_firm_id: Option<i64>,
) -> Result<LawyerRecord, DatabaseError> {
    let row = conn
        .query(
            &format!(
                "INSERT INTO lawyers (name, title, email, phone_number, law_firm_id, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING {LAWYER_COLUMNS}"
            ),
            params![
                input.name.as_str(),
                opt_text(input.title.as_deref()),
                opt_text(input.email.as_deref()),
                opt_text(input.phone.as_deref()),
                opt_i64(law_firm_id),
                fmt_ts(&Utc::now()),
            ],
        )
        .await?
        .next()
        .await?
        .ok_or_else(|| DatabaseError::Query("failed to load created lawyer".to_string()))?;
    row_to_lawyer_record(&row)
}

#[async_trait::async_trait]
impl LawFirmStore for LibSqlBackend {
    async fn create_law_firm(&self, name: &str) -> Result<LawFirmRecord, DatabaseError> {
        let conn = self.connect().await?;
        insert_law_firm(&conn, name).await
    }

    async fn get_law_firm(&self, id: i64) -> Result<Option<LawFirmRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {LAW_FIRM_COLUMNS} FROM law_firms WHERE id = ?1 LIMIT 1"),
                params![id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_law_firm_record(&row)).transpose()
    }

    async fn find_law_firm_by_name(
        &self,
        name: &str,
    ) -> Result<Option<LawFirmRecord>, DatabaseError> {
        let conn = self.connect().await?;
        find_law_firm(&conn, name).await
    }

    async fn get_or_create_law_firm(
        &self,
        name: &str,
    ) -> Result<(LawFirmRecord, bool), DatabaseError> {
        let conn = self.connect().await?;
        conn.execute("BEGIN IMMEDIATE", ()).await?;
        let result = async {
            if let Some(existing) = find_law_firm(&conn, name).await? {
                return Ok((existing, false));
            }
            Ok((insert_law_firm(&conn, name).await?, true))
        }
        .await;

        match result {
            Ok(found) => {
                conn.execute("COMMIT", ()).await?;
                Ok(found)
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(err)
            }
        }
    }

    async fn list_law_firms(&self) -> Result<Vec<LawFirmRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {LAW_FIRM_COLUMNS} FROM law_firms ORDER BY name ASC, id ASC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_law_firm_record(&row)?);
        }
        Ok(out)
    }

    async fn delete_law_firm(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM law_firms WHERE id = ?1", params![id])
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait::async_trait]
impl LawyerStore for LibSqlBackend {
    async fn create_lawyer(
        &self,
        input: &CreateLawyerParams,
    ) -> Result<LawyerRecord, DatabaseError> {
        let conn = self.connect().await?;
        insert_lawyer(&conn, input, input.law_firm_id).await
    }

    async fn create_lawyer_in_firm(
        &self,
        input: &CreateLawyerParams,
        firm_name: Option<&str>,
    ) -> Result<LawyerWithFirm, DatabaseError> {
        let Some(firm_name) = firm_name else {
            let conn = self.connect().await?;
            let lawyer = insert_lawyer(&conn, input, input.law_firm_id).await?;
            return Ok(LawyerWithFirm {
                lawyer,
                firm: None,
                firm_created: false,
            });
        };

        let conn = self.connect().await?;
        conn.execute("BEGIN IMMEDIATE", ()).await?;
        let result = async {
            let (firm, firm_created) = match find_law_firm(&conn, firm_name).await? {
                Some(existing) => (existing, false),
                None => (insert_law_firm(&conn, firm_name).await?, true),
            };
            let lawyer = insert_lawyer(&conn, input, Some(firm.id)).await?;
            Ok(LawyerWithFirm {
                lawyer,
                firm: Some(firm),
                firm_created,
            })
        }
        .await;

        match result {
            Ok(created) => {
                conn.execute("COMMIT", ()).await?;
                Ok(created)
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(err)
            }
        }
    }

    async fn get_lawyer(&self, id: i64) -> Result<Option<LawyerRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {LAWYER_COLUMNS} FROM lawyers WHERE id = ?1 LIMIT 1"),
                params![id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_lawyer_record(&row)).transpose()
    }

    async fn search_lawyers(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LawyerRecord>, DatabaseError> {
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let needle = query.to_lowercase();

        let conn = self.connect().await?;
        // SQLite's lower() folds ASCII only, so matching happens here with
        // full Unicode case folding.
        let mut rows = conn
            .query(
                &format!("SELECT {LAWYER_COLUMNS} FROM lawyers ORDER BY name ASC, id ASC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            if !get_text(&row, 1).to_lowercase().contains(&needle) {
                continue;
            }
            out.push(row_to_lawyer_record(&row)?);
            if out.len() == limit {
                break;
            }
        }
        Ok(out)
    }

    async fn list_lawyers_for_firm(
        &self,
        law_firm_id: i64,
    ) -> Result<Vec<LawyerRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {LAWYER_COLUMNS} FROM lawyers WHERE law_firm_id = ?1 ORDER BY name ASC, id ASC"
                ),
                params![law_firm_id],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_lawyer_record(&row)?);
        }
        Ok(out)
    }

    async fn delete_lawyer(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM lawyers WHERE id = ?1", params![id])
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait::async_trait]
impl CompanyStore for LibSqlBackend {
    async fn create_company(
        &self,
        name: &str,
        owner: Option<&str>,
    ) -> Result<CompanyRecord, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "INSERT INTO companies (name, owner, created_at) VALUES (?1, ?2, ?3) \
                     RETURNING {COMPANY_COLUMNS}"
                ),
                params![name, opt_text(owner), fmt_ts(&Utc::now())],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created company".to_string()))?;
        row_to_company_record(&row)
    }

    async fn get_company(&self, id: i64) -> Result<Option<CompanyRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1 LIMIT 1"),
                params![id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_company_record(&row)).transpose()
    }

    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name ASC, id ASC"),
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_company_record(&row)?);
        }
        Ok(out)
    }

    async fn delete_company(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM companies WHERE id = ?1", params![id])
            .await?;
        Ok(deleted > 0)
    }
}

//! Database abstraction layer.
//!
//! Provides a backend-agnostic `Database` trait that unifies all persistence
//! operations for the practice: firms, lawyers, companies, cases and
//! everything hanging off a case. The libSQL backend (embedded SQLite, with an
//! optional remote replica) is the implementation.
//!
//! Identifiers and `created_at` timestamps are assigned by the backend at
//! insert time; callers never supply them.

pub mod libsql;
pub mod libsql_migrations;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// Create a database backend from configuration, run migrations, and return it.
pub async fn connect_from_config(
    config: &crate::config::DatabaseConfig,
) -> Result<Arc<dyn Database>, DatabaseError> {
    use secrecy::ExposeSecret as _;

    let default_path = crate::config::default_libsql_path();
    let db_path = config.libsql_path.as_deref().unwrap_or(&default_path);

    let backend = if let Some(ref url) = config.libsql_url {
        let token = config.libsql_auth_token.as_ref().ok_or_else(|| {
            DatabaseError::Pool("LIBSQL_AUTH_TOKEN required when LIBSQL_URL is set".to_string())
        })?;
        libsql::LibSqlBackend::new_remote_replica(db_path, url, token.expose_secret()).await?
    } else {
        libsql::LibSqlBackend::new_local(db_path).await?
    };
    backend.run_migrations().await?;
    tracing::info!(path = %db_path.display(), "Database ready");
    Ok(Arc::new(backend))
}

/// Kind of legal matter a case represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Civil,
    Litigation,
    Tax,
    Accounting,
    Chapter7,
    Chapter11,
    Chapter13,
    Other,
    Monitorship,
    Receivership,
}

impl CaseType {
    pub const CHOICES: &'static [(&'static str, &'static str)] = &[
        ("civil", "Civil"),
        ("litigation", "Litigation"),
        ("tax", "Tax"),
        ("accounting", "Accounting"),
        ("chapter7", "Chapter 7"),
        ("chapter11", "Chapter 11"),
        ("chapter13", "Chapter 13"),
        ("other", "Other"),
        ("monitorship", "Monitorship"),
        ("receivership", "Receivership"),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Civil => "civil",
            Self::Litigation => "litigation",
            Self::Tax => "tax",
            Self::Accounting => "accounting",
            Self::Chapter7 => "chapter7",
            Self::Chapter11 => "chapter11",
            Self::Chapter13 => "chapter13",
            Self::Other => "other",
            Self::Monitorship => "monitorship",
            Self::Receivership => "receivership",
        }
    }

    /// Accepts stored values case-insensitively so rows written with the
    /// capitalized legacy spellings (`Accounting`, `Chapter7`, ...) still load.
    pub fn from_db_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "civil" => Some(Self::Civil),
            "litigation" => Some(Self::Litigation),
            "tax" => Some(Self::Tax),
            "accounting" => Some(Self::Accounting),
            "chapter7" => Some(Self::Chapter7),
            "chapter11" => Some(Self::Chapter11),
            "chapter13" => Some(Self::Chapter13),
            "other" => Some(Self::Other),
            "monitorship" => Some(Self::Monitorship),
            "receivership" => Some(Self::Receivership),
            _ => None,
        }
    }
}

/// Which side of the matter retained the practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiredBy {
    Plaintiff,
    Defendant,
    #[default]
    Other,
}

impl HiredBy {
    pub const CHOICES: &'static [(&'static str, &'static str)] = &[
        ("plaintiff", "Plaintiff"),
        ("defendant", "Defendant"),
        ("other", "Other"),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plaintiff => "plaintiff",
            Self::Defendant => "defendant",
            Self::Other => "other",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            // "plantiff" is the misspelled value older intake forms submitted.
            "plaintiff" | "plantiff" => Some(Self::Plaintiff),
            "defendant" => Some(Self::Defendant),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Workflow position of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStage {
    #[default]
    Initial,
    Discovery,
    Analysis,
    Trial,
    Closed,
}

impl CaseStage {
    pub const CHOICES: &'static [(&'static str, &'static str)] = &[
        ("initial", "Initial Intake"),
        ("discovery", "Discovery"),
        ("analysis", "Analysis"),
        ("trial", "Trial Preparation"),
        ("closed", "Closed"),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Discovery => "discovery",
            Self::Analysis => "analysis",
            Self::Trial => "trial",
            Self::Closed => "closed",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "initial" => Some(Self::Initial),
            "discovery" => Some(Self::Discovery),
            "analysis" => Some(Self::Analysis),
            "trial" => Some(Self::Trial),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Case task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    WaitingDocs,
    WaitingNext,
    Complete,
}

impl TaskStatus {
    pub const CHOICES: &'static [(&'static str, &'static str)] = &[
        ("not_started", "Not Started"),
        ("in_progress", "In Progress"),
        ("waiting_docs", "Waiting for Documents"),
        ("waiting_next", "Waiting for Next Steps"),
        ("complete", "Complete"),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::WaitingDocs => "waiting_docs",
            Self::WaitingNext => "waiting_next",
            Self::Complete => "complete",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "waiting_docs" => Some(Self::WaitingDocs),
            "waiting_next" => Some(Self::WaitingNext),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }
}

/// Kind of external document a reference describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    BankStmt,
    Check,
    Invoice,
    Excel,
    Other,
}

impl DocumentType {
    pub const CHOICES: &'static [(&'static str, &'static str)] = &[
        ("bank_stmt", "Bank Statement"),
        ("check", "Check"),
        ("invoice", "Invoice"),
        ("excel", "Excel Table"),
        ("other", "Other"),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BankStmt => "bank_stmt",
            Self::Check => "check",
            Self::Invoice => "invoice",
            Self::Excel => "excel",
            Self::Other => "other",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "bank_stmt" => Some(Self::BankStmt),
            "check" => Some(Self::Check),
            "invoice" => Some(Self::Invoice),
            "excel" => Some(Self::Excel),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Display label for a stored choice value, keyed by choice set name.
pub fn choice_label(kind: &str, value: &str) -> Option<&'static str> {
    let choices = match kind {
        "case_type" => CaseType::CHOICES,
        "hired_by" => HiredBy::CHOICES,
        "stage" => CaseStage::CHOICES,
        "task_status" => TaskStatus::CHOICES,
        "document_type" => DocumentType::CHOICES,
        _ => return None,
    };
    choices
        .iter()
        .find(|(stored, _)| *stored == value)
        .map(|(_, label)| *label)
}

/// Entity a note row is attached to. Each kind has its own table and
/// cascades with its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    LawFirm,
    Lawyer,
    Company,
    Case,
    Task,
}

impl NoteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LawFirm => "law_firm",
            Self::Lawyer => "lawyer",
            Self::Company => "company",
            Self::Case => "case",
            Self::Task => "task",
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::LawFirm => "law_firm_notes",
            Self::Lawyer => "lawyer_notes",
            Self::Company => "company_notes",
            Self::Case => "case_notes",
            Self::Task => "task_notes",
        }
    }

    pub(crate) fn parent_column(self) -> &'static str {
        match self {
            Self::LawFirm => "law_firm_id",
            Self::Lawyer => "lawyer_id",
            Self::Company => "company_id",
            Self::Case => "case_id",
            Self::Task => "task_id",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawFirmRecord {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawyerRecord {
    pub id: i64,
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub law_firm_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateLawyerParams {
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub law_firm_id: Option<i64>,
}

/// A lawyer created together with the firm it was attached to.
#[derive(Debug, Clone)]
pub struct LawyerWithFirm {
    pub lawyer: LawyerRecord,
    pub firm: Option<LawFirmRecord>,
    pub firm_created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: i64,
    pub name: String,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: i64,
    pub summary: Option<String>,
    pub short_name: String,
    pub case_number: String,
    pub case_type: CaseType,
    pub hired_by: HiredBy,
    pub date_of_case: NaiveDate,
    pub plaintiff: String,
    pub defendant: String,
    pub plaintiff_lawyer_id: Option<i64>,
    pub defense_lawyer_id: Option<i64>,
    pub status: String,
    pub stage: CaseStage,
    pub last_worked_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_CASE_STATUS: &str = "Open";

#[derive(Debug, Clone)]
pub struct CreateCaseParams {
    pub summary: Option<String>,
    pub short_name: String,
    pub case_number: String,
    pub case_type: CaseType,
    pub hired_by: HiredBy,
    pub date_of_case: NaiveDate,
    pub plaintiff: String,
    pub defendant: String,
    pub plaintiff_lawyer_id: Option<i64>,
    pub defense_lawyer_id: Option<i64>,
    pub status: String,
    pub stage: CaseStage,
    pub last_worked_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseEventRecord {
    pub id: i64,
    pub case_id: i64,
    pub event_name: String,
    pub event_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCaseEventParams {
    pub event_name: String,
    pub event_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: i64,
    pub kind: NoteKind,
    pub parent_id: i64,
    pub note_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub case_id: i64,
    pub task_type: String,
    pub summary: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTaskParams {
    pub task_type: String,
    pub summary: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: TaskStatus,
}

/// Status predicate for listing a case's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatusFilter {
    All,
    Only(TaskStatus),
    Except(TaskStatus),
}

/// Ordering for listing a case's tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrder {
    /// Insertion order.
    Stored,
    EndTimeAsc,
    EndTimeDesc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReferenceRecord {
    pub id: i64,
    pub document_type: DocumentType,
    pub title: String,
    pub source: Option<String>,
    pub date: Option<NaiveDate>,
    pub case_id: Option<i64>,
    pub task_id: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDocumentReferenceParams {
    pub document_type: DocumentType,
    pub title: String,
    pub source: Option<String>,
    pub date: Option<NaiveDate>,
    pub case_id: Option<i64>,
    pub task_id: Option<i64>,
    pub description: Option<String>,
}

// ==================== Sub-traits ====================
//
// Each sub-trait groups related persistence methods. The `Database` supertrait
// combines them all; leaf consumers can depend on a specific sub-trait.

#[async_trait]
pub trait LawFirmStore: Send + Sync {
    async fn create_law_firm(&self, name: &str) -> Result<LawFirmRecord, DatabaseError>;
    async fn get_law_firm(&self, id: i64) -> Result<Option<LawFirmRecord>, DatabaseError>;
    /// Exact (case-sensitive) name match; the oldest row wins when names repeat.
    async fn find_law_firm_by_name(
        &self,
        name: &str,
    ) -> Result<Option<LawFirmRecord>, DatabaseError>;
    /// Returns the firm and whether it was created by this call.
    async fn get_or_create_law_firm(
        &self,
        name: &str,
    ) -> Result<(LawFirmRecord, bool), DatabaseError>;
    async fn list_law_firms(&self) -> Result<Vec<LawFirmRecord>, DatabaseError>;
    async fn delete_law_firm(&self, id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait LawyerStore: Send + Sync {
    async fn create_lawyer(
        &self,
        input: &CreateLawyerParams,
    ) -> Result<LawyerRecord, DatabaseError>;
    /// Resolve (or create) the firm named `firm_name` and insert the lawyer
    /// attached to it, in one transaction. `input.law_firm_id` is ignored when
    /// a firm name is given.
    async fn create_lawyer_in_firm(
        &self,
        input: &CreateLawyerParams,
        firm_name: Option<&str>,
    ) -> Result<LawyerWithFirm, DatabaseError>;
    async fn get_lawyer(&self, id: i64) -> Result<Option<LawyerRecord>, DatabaseError>;
    /// Case-insensitive substring match on name, ordered by name.
    async fn search_lawyers(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LawyerRecord>, DatabaseError>;
    async fn list_lawyers_for_firm(
        &self,
        law_firm_id: i64,
    ) -> Result<Vec<LawyerRecord>, DatabaseError>;
    async fn delete_lawyer(&self, id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn create_company(
        &self,
        name: &str,
        owner: Option<&str>,
    ) -> Result<CompanyRecord, DatabaseError>;
    async fn get_company(&self, id: i64) -> Result<Option<CompanyRecord>, DatabaseError>;
    async fn list_companies(&self) -> Result<Vec<CompanyRecord>, DatabaseError>;
    async fn delete_company(&self, id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn create_case(&self, input: &CreateCaseParams) -> Result<CaseRecord, DatabaseError>;
    async fn get_case(&self, id: i64) -> Result<Option<CaseRecord>, DatabaseError>;
    /// All cases, most recent `date_of_case` first.
    async fn list_cases(&self) -> Result<Vec<CaseRecord>, DatabaseError>;
    async fn list_recent_cases(&self, limit: usize) -> Result<Vec<CaseRecord>, DatabaseError>;
    async fn count_cases(&self) -> Result<i64, DatabaseError>;
    async fn case_short_name_exists(&self, short_name: &str) -> Result<bool, DatabaseError>;
    async fn case_number_exists(&self, case_number: &str) -> Result<bool, DatabaseError>;
    async fn delete_case(&self, id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait CaseEventStore: Send + Sync {
    async fn create_case_event(
        &self,
        case_id: i64,
        input: &CreateCaseEventParams,
    ) -> Result<CaseEventRecord, DatabaseError>;
    /// Events ordered by `event_date`, then insertion.
    async fn list_case_events(&self, case_id: i64) -> Result<Vec<CaseEventRecord>, DatabaseError>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create_note(
        &self,
        kind: NoteKind,
        parent_id: i64,
        note_text: &str,
    ) -> Result<NoteRecord, DatabaseError>;
    /// Notes in insertion order.
    async fn list_notes(
        &self,
        kind: NoteKind,
        parent_id: i64,
    ) -> Result<Vec<NoteRecord>, DatabaseError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(
        &self,
        case_id: i64,
        input: &CreateTaskParams,
    ) -> Result<TaskRecord, DatabaseError>;
    async fn get_task(&self, id: i64) -> Result<Option<TaskRecord>, DatabaseError>;
    async fn list_case_tasks(
        &self,
        case_id: i64,
        filter: TaskStatusFilter,
        order: TaskOrder,
    ) -> Result<Vec<TaskRecord>, DatabaseError>;
    async fn delete_task(&self, id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait DocumentReferenceStore: Send + Sync {
    async fn create_document_reference(
        &self,
        input: &CreateDocumentReferenceParams,
    ) -> Result<DocumentReferenceRecord, DatabaseError>;
    async fn get_document_reference(
        &self,
        id: i64,
    ) -> Result<Option<DocumentReferenceRecord>, DatabaseError>;
    async fn list_case_documents(
        &self,
        case_id: i64,
    ) -> Result<Vec<DocumentReferenceRecord>, DatabaseError>;
    async fn list_task_documents(
        &self,
        task_id: i64,
    ) -> Result<Vec<DocumentReferenceRecord>, DatabaseError>;
}

/// Backend-agnostic database supertrait.
#[async_trait]
pub trait Database:
    LawFirmStore
    + LawyerStore
    + CompanyStore
    + CaseStore
    + CaseEventStore
    + NoteStore
    + TaskStore
    + DocumentReferenceStore
    + Send
    + Sync
{
    /// Run schema migrations for this backend.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;
}

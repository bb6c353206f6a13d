//! Command-line surface of the `casedesk` binary.
//!
//! `serve` and `migrate` run the site; the remaining subcommands maintain
//! the records the pages do not edit, printing JSON.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::casework::{self, DocumentOwner, FirmAdded, FirmListing, NewDocument, RecordKind};
use crate::db::{
    CaseEventRecord, CompanyRecord, Database, DocumentReferenceRecord, DocumentType,
    LawFirmRecord, NoteKind, NoteRecord,
};
use crate::error::CaseworkError;

#[derive(Debug, Parser)]
#[command(name = "casedesk", version, about = "Case management for a legal practice")]
pub struct Cli {
    /// Settings file (default: ~/.casedesk/settings.toml).
    #[arg(long, global = true, env = "CASEDESK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server (default).
    Serve {
        /// Address to listen on; overrides settings and CASEDESK_BIND.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Apply database migrations and exit.
    Migrate,
    #[command(flatten)]
    Admin(AdminCommand),
}

/// Record maintenance.
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Law firms
    Firm {
        #[command(subcommand)]
        command: FirmCommand,
    },
    /// Client companies
    Company {
        #[command(subcommand)]
        command: CompanyCommand,
    },
    /// Dated case milestones
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    /// Document references
    Document {
        #[command(subcommand)]
        command: DocumentCommand,
    },
    /// Notes on firms, lawyers, companies, cases or tasks
    Note {
        #[command(subcommand)]
        command: NoteCommand,
    },
    /// Delete a firm, lawyer, company, case or task
    Delete {
        #[arg(value_parser = parse_record_kind)]
        kind: RecordKind,
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum FirmCommand {
    /// Add a firm, or report the existing one with that exact name
    Add { name: String },
    /// Look a firm up by exact name
    Find { name: String },
    /// List firms with their lawyers
    List,
}

#[derive(Debug, Subcommand)]
pub enum CompanyCommand {
    Add {
        name: String,
        #[arg(long)]
        owner: Option<String>,
    },
    List,
}

#[derive(Debug, Subcommand)]
pub enum EventCommand {
    Add {
        case_id: i64,
        name: String,
        /// YYYY-MM-DD
        date: NaiveDate,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum DocumentCommand {
    Add {
        #[arg(long = "type", value_parser = parse_document_type)]
        document_type: DocumentType,
        #[arg(long)]
        title: String,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long = "case")]
        case_id: Option<i64>,
        #[arg(long = "task")]
        task_id: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Documents attached to one case or one task
    List {
        #[arg(long = "case", conflicts_with = "task_id", required_unless_present = "task_id")]
        case_id: Option<i64>,
        #[arg(long = "task")]
        task_id: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    Add {
        #[arg(value_parser = parse_note_kind)]
        kind: NoteKind,
        parent_id: i64,
        text: String,
    },
    List {
        #[arg(value_parser = parse_note_kind)]
        kind: NoteKind,
        parent_id: i64,
    },
}

fn parse_document_type(raw: &str) -> Result<DocumentType, String> {
    DocumentType::from_db_value(raw).ok_or_else(|| {
        let known: Vec<&str> = DocumentType::CHOICES.iter().map(|(v, _)| *v).collect();
        format!("expected one of: {}", known.join(", "))
    })
}

fn parse_note_kind(raw: &str) -> Result<NoteKind, String> {
    match raw {
        "law_firm" | "firm" => Ok(NoteKind::LawFirm),
        "lawyer" => Ok(NoteKind::Lawyer),
        "company" => Ok(NoteKind::Company),
        "case" => Ok(NoteKind::Case),
        "task" => Ok(NoteKind::Task),
        _ => Err("expected one of: firm, lawyer, company, case, task".to_string()),
    }
}

fn parse_record_kind(raw: &str) -> Result<RecordKind, String> {
    match raw {
        "law_firm" | "firm" => Ok(RecordKind::LawFirm),
        "lawyer" => Ok(RecordKind::Lawyer),
        "company" => Ok(RecordKind::Company),
        "case" => Ok(RecordKind::Case),
        "task" => Ok(RecordKind::Task),
        _ => Err("expected one of: firm, lawyer, company, case, task".to_string()),
    }
}

/// Result of an admin command, printed as JSON.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AdminOutput {
    Firm(FirmAdded),
    FirmLookup(Option<LawFirmRecord>),
    Firms(Vec<FirmListing>),
    Company(CompanyRecord),
    Companies(Vec<CompanyRecord>),
    Event(CaseEventRecord),
    Document(DocumentReferenceRecord),
    Documents(Vec<DocumentReferenceRecord>),
    Note(NoteRecord),
    Notes(Vec<NoteRecord>),
    Deleted { deleted: &'static str, id: i64 },
}

pub async fn run_admin(
    db: &dyn Database,
    command: AdminCommand,
) -> Result<AdminOutput, CaseworkError> {
    let output = match command {
        AdminCommand::Firm { command } => match command {
            FirmCommand::Add { name } => AdminOutput::Firm(casework::add_law_firm(db, &name).await?),
            FirmCommand::Find { name } => {
                AdminOutput::FirmLookup(casework::find_law_firm(db, &name).await?)
            }
            FirmCommand::List => AdminOutput::Firms(casework::list_law_firms(db).await?),
        },
        AdminCommand::Company { command } => match command {
            CompanyCommand::Add { name, owner } => {
                AdminOutput::Company(casework::add_company(db, &name, owner.as_deref()).await?)
            }
            CompanyCommand::List => AdminOutput::Companies(casework::list_companies(db).await?),
        },
        AdminCommand::Event {
            command:
                EventCommand::Add {
                    case_id,
                    name,
                    date,
                    notes,
                },
        } => AdminOutput::Event(
            casework::add_case_event(db, case_id, &name, date, notes.as_deref()).await?,
        ),
        AdminCommand::Document { command } => match command {
            DocumentCommand::Add {
                document_type,
                title,
                source,
                date,
                case_id,
                task_id,
                description,
            } => AdminOutput::Document(
                casework::add_document_reference(
                    db,
                    NewDocument {
                        document_type,
                        title,
                        source,
                        date,
                        case_id,
                        task_id,
                        description,
                    },
                )
                .await?,
            ),
            DocumentCommand::List { case_id, task_id } => {
                let owner = match (case_id, task_id) {
                    (Some(case_id), _) => DocumentOwner::Case(case_id),
                    (None, Some(task_id)) => DocumentOwner::Task(task_id),
                    (None, None) => {
                        return Err(CaseworkError::Invalid {
                            field: "case",
                            message: "give --case or --task".to_string(),
                        });
                    }
                };
                AdminOutput::Documents(casework::list_documents(db, owner).await?)
            }
        },
        AdminCommand::Note { command } => match command {
            NoteCommand::Add {
                kind,
                parent_id,
                text,
            } => AdminOutput::Note(casework::add_note(db, kind, parent_id, &text).await?),
            NoteCommand::List { kind, parent_id } => {
                AdminOutput::Notes(casework::list_notes(db, kind, parent_id).await?)
            }
        },
        AdminCommand::Delete { kind, id } => {
            casework::delete_record(db, kind, id).await?;
            AdminOutput::Deleted {
                deleted: kind.as_str(),
                id,
            }
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_case, test_db};

    fn admin(args: &[&str]) -> AdminCommand {
        let cli = Cli::try_parse_from(std::iter::once("casedesk").chain(args.iter().copied()))
            .expect("parse");
        match cli.command {
            Some(Command::Admin(command)) => command,
            other => panic!("expected admin command, got {other:?}"),
        }
    }

    #[test]
    fn serve_and_migrate_still_parse() {
        let cli = Cli::try_parse_from(["casedesk", "serve", "--bind", "127.0.0.1:9000"])
            .expect("parse");
        assert!(matches!(cli.command, Some(Command::Serve { bind: Some(_) })));
        let cli = Cli::try_parse_from(["casedesk"]).expect("parse");
        assert!(cli.command.is_none());
        let cli = Cli::try_parse_from(["casedesk", "migrate"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Migrate)));
    }

    #[test]
    fn bad_values_are_rejected_at_parse_time() {
        for args in [
            vec!["casedesk", "delete", "judge", "1"],
            vec!["casedesk", "note", "add", "court", "1", "hi"],
            vec!["casedesk", "document", "add", "--type", "memo", "--title", "x"],
            vec!["casedesk", "event", "add", "1", "Filed", "01/02/2025"],
            vec!["casedesk", "document", "list"],
            vec!["casedesk", "document", "list", "--case", "1", "--task", "2"],
        ] {
            assert!(Cli::try_parse_from(args.iter().copied()).is_err(), "{args:?}");
        }
    }

    #[tokio::test]
    async fn commands_drive_the_store() {
        let (db, _dir) = test_db().await;
        let case = seed_case(db.as_ref(), "alpha").await;
        let case_ref = case.id.to_string();

        let AdminOutput::Company(company) =
            run_admin(db.as_ref(), admin(&["company", "add", "Initech", "--owner", "Bill"]))
                .await
                .expect("company")
        else {
            panic!("expected company");
        };
        assert_eq!(company.owner.as_deref(), Some("Bill"));

        let company_ref = company.id.to_string();
        run_admin(
            db.as_ref(),
            admin(&["note", "add", "company", &company_ref, "Pays late"]),
        )
        .await
        .expect("note");
        let AdminOutput::Notes(notes) =
            run_admin(db.as_ref(), admin(&["note", "list", "company", &company_ref]))
                .await
                .expect("notes")
        else {
            panic!("expected notes");
        };
        assert_eq!(notes.len(), 1);

        run_admin(
            db.as_ref(),
            admin(&["event", "add", &case_ref, "Filed", "2025-02-01"]),
        )
        .await
        .expect("event");
        assert_eq!(db.list_case_events(case.id).await.expect("events").len(), 1);

        run_admin(
            db.as_ref(),
            admin(&[
                "document", "add", "--type", "bank_stmt", "--title", "March", "--case", &case_ref,
            ]),
        )
        .await
        .expect("document");
        let AdminOutput::Documents(docs) =
            run_admin(db.as_ref(), admin(&["document", "list", "--case", &case_ref]))
                .await
                .expect("documents")
        else {
            panic!("expected documents");
        };
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].document_type, DocumentType::BankStmt);

        let output = run_admin(db.as_ref(), admin(&["delete", "company", &company_ref]))
            .await
            .expect("delete");
        let json = serde_json::to_value(&output).expect("json");
        assert_eq!(json["deleted"], "company");
        assert!(db.get_company(company.id).await.expect("get").is_none());

        let err = run_admin(db.as_ref(), admin(&["delete", "company", &company_ref]))
            .await
            .expect_err("gone");
        assert!(matches!(err, CaseworkError::NotFound { entity: "company", .. }));
    }

    #[tokio::test]
    async fn firm_lookup_serializes_as_plain_json() {
        let (db, _dir) = test_db().await;
        run_admin(db.as_ref(), admin(&["firm", "add", "Acme Legal"]))
            .await
            .expect("firm");

        let found = run_admin(db.as_ref(), admin(&["firm", "find", "Acme Legal"]))
            .await
            .expect("find");
        let json = serde_json::to_value(&found).expect("json");
        assert_eq!(json["name"], "Acme Legal");

        let missing = run_admin(db.as_ref(), admin(&["firm", "find", "Nobody"]))
            .await
            .expect("find");
        assert_eq!(serde_json::to_value(&missing).expect("json"), serde_json::Value::Null);

        let listing = run_admin(db.as_ref(), admin(&["firm", "list"]))
            .await
            .expect("list");
        let json = serde_json::to_value(&listing).expect("json");
        assert_eq!(json[0]["firm"]["name"], "Acme Legal");
        assert_eq!(json[0]["lawyers"], serde_json::json!([]));
    }
}

//! libSQL schema.
//!
//! Every statement is idempotent so `run_migrations` can be applied on each
//! startup. Parent deletion semantics live in the foreign keys: notes, events
//! and tasks cascade with their parent; lawyer/firm/case/task references that
//! are optional are set to NULL.

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS law_firms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_law_firms_name ON law_firms(name);

CREATE TABLE IF NOT EXISTS law_firm_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    law_firm_id INTEGER NOT NULL REFERENCES law_firms(id) ON DELETE CASCADE,
    note_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lawyers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    title TEXT,
    email TEXT,
    phone_number TEXT,
    law_firm_id INTEGER REFERENCES law_firms(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_lawyers_name ON lawyers(name);

CREATE TABLE IF NOT EXISTS lawyer_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lawyer_id INTEGER NOT NULL REFERENCES lawyers(id) ON DELETE CASCADE,
    note_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS companies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    owner TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS company_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    note_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    summary TEXT,
    short_name TEXT NOT NULL UNIQUE,
    case_number TEXT NOT NULL UNIQUE,
    case_type TEXT NOT NULL,
    hired_by TEXT NOT NULL DEFAULT 'other',
    date_of_case TEXT NOT NULL,
    plaintiff TEXT NOT NULL,
    defendant TEXT NOT NULL,
    plaintiff_lawyer_id INTEGER REFERENCES lawyers(id) ON DELETE SET NULL,
    defense_lawyer_id INTEGER REFERENCES lawyers(id) ON DELETE SET NULL,
    status TEXT NOT NULL DEFAULT 'Open',
    stage TEXT NOT NULL DEFAULT 'initial',
    last_worked_on TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS case_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id INTEGER NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
    event_name TEXT NOT NULL,
    event_date TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_case_events_case ON case_events(case_id, event_date);

CREATE TABLE IF NOT EXISTS case_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id INTEGER NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
    note_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_case_notes_case ON case_notes(case_id);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    case_id INTEGER NOT NULL REFERENCES cases(id) ON DELETE CASCADE,
    task_type TEXT NOT NULL,
    summary TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'not_started',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_case_status ON tasks(case_id, status);

CREATE TABLE IF NOT EXISTS task_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    note_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS document_references (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_type TEXT NOT NULL,
    title TEXT NOT NULL,
    source TEXT,
    date TEXT,
    case_id INTEGER REFERENCES cases(id) ON DELETE SET NULL,
    task_id INTEGER REFERENCES tasks(id) ON DELETE SET NULL,
    description TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_document_references_case ON document_references(case_id);
CREATE INDEX IF NOT EXISTS idx_document_references_task ON document_references(task_id);
"#;

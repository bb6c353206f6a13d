//! Query strings, form bodies and JSON payloads for the web layer.

use serde::{Deserialize, Serialize};

// --- Query strings ---

#[derive(Debug, Default, Deserialize)]
pub struct TaskFilterQuery {
    pub task_filter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub view: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SideQuery {
    pub side: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LawyerSearchQuery {
    pub plaintiff_lawyer_search: Option<String>,
    pub defense_lawyer_search: Option<String>,
}

// --- Form bodies ---

#[derive(Debug, Default, Deserialize)]
pub struct NoteForm {
    pub note_text: Option<String>,
}

// --- Client events ---

/// Detail of the `lawyer-created` client event.
#[derive(Debug, Serialize)]
pub struct LawyerCreatedEvent {
    pub id: i64,
    pub name: String,
    pub side: &'static str,
    pub select_name: &'static str,
}

/// Detail of the `task-created` client event.
#[derive(Debug, Serialize)]
pub struct TaskCreatedEvent {
    pub id: i64,
    pub case_id: i64,
}

// --- Health ---

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
